//! `spwd generate`: create a password, store it, and print it.

use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::{load_settings, vault_for, Cli};
use crate::config::Settings;
use crate::errors::Result;
use crate::policy::{Generator, Mode, RngKind};

/// Execute the `generate` command.
pub fn execute(cli: &Cli, mode: Option<&str>, length: Option<usize>) -> Result<()> {
    let (data_dir, settings) = load_settings(cli)?;

    // Validate before anything touches the store.
    let mode = match mode {
        Some(m) => Mode::parse(m)?,
        None => settings.mode()?,
    };
    let length = length.unwrap_or_else(|| default_length_for(mode, &settings));

    let password = Zeroizing::new(match settings.rng {
        RngKind::ClockSeeded => Generator::clock_seeded().generate_for(mode, length)?,
        RngKind::Os => Generator::from_os().generate_for(mode, length)?,
    });

    let id = vault_for(&data_dir, &settings).save(&password)?;

    output::success(&format!(
        "Generated {mode} password (ID: {id}): {}",
        password.as_str()
    ));

    Ok(())
}

/// The configured default length if the mode allows it, else the mode's minimum.
fn default_length_for(mode: Mode, settings: &Settings) -> usize {
    let range = mode.length_range();
    if range.contains(&settings.default_length) {
        settings.default_length
    } else {
        *range.start()
    }
}
