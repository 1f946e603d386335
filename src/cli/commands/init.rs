//! `spwd init`: create the secret key and an empty password store.

use std::fs;

use crate::cli::output;
use crate::cli::{load_settings, vault_for, Cli};
use crate::crypto::key::SECRET_KEY_ENV;
use crate::crypto::{EnvKeySource, JsonFileKeySource};
use crate::errors::Result;

/// Execute the `init` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let (data_dir, settings) = load_settings(cli)?;

    // 1. Create the data directory if it doesn't exist.
    if !data_dir.exists() {
        fs::create_dir_all(&data_dir)?;
        output::info(&format!("Created data directory: {}", data_dir.display()));
    }

    // 2. Write a fresh key; refuses to replace an existing one.
    let key_path = settings.key_path(&data_dir);
    JsonFileKeySource::new(&key_path).create()?;
    output::success(&format!("Secret key written to {}", key_path.display()));

    // 3. Create the store and its bucket.
    let vault = vault_for(&data_dir, &settings);
    vault.initialize()?;
    output::success(&format!("Password store ready at {}", vault.path().display()));

    if EnvKeySource::default().is_set() {
        output::warning(&format!(
            "{SECRET_KEY_ENV} is set and takes precedence over the new key file."
        ));
    }

    output::tip("Keep a backup of the key file. Stored passwords cannot be read without it.");
    output::tip("Run `spwd generate -m strong -l 14` to create a password.");

    Ok(())
}
