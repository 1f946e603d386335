//! CLI module: Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::Parser;
use clap_complete::Shell;
use tracing_subscriber::EnvFilter;

use crate::config::Settings;
use crate::crypto::{EnvKeySource, JsonFileKeySource, KeySource};
use crate::errors::{Result, SpwdError};
use crate::vault::Vault;

/// spwd CLI: password generator with an encrypted local vault.
#[derive(Parser)]
#[command(
    name = "spwd",
    about = "Password generator with an encrypted local vault",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding passwords.db, config.json and spwd.toml
    /// (default: the directory of the spwd executable)
    #[arg(long, env = "SPWD_DATA_DIR", global = true)]
    pub data_dir: Option<String>,

    /// Print debug diagnostics to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a new secret key and an empty password store
    Init,

    /// Generate a password, store it encrypted, and print it
    Generate {
        /// Strength mode: very-weak (vw), weak (w), medium (m), strong (s),
        /// very-strong (vs), unbreakable (xb)
        #[arg(short, long)]
        mode: Option<String>,

        /// Password length (must fit the mode's range)
        #[arg(short, long)]
        length: Option<usize>,
    },

    /// Show all stored passwords, decrypted
    List,

    /// Show a single stored password
    Show {
        /// Password ID
        id: u64,
    },

    /// Delete a stored password
    Delete {
        /// Password ID
        id: u64,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Attach a note to a stored password (empty text clears it)
    Note {
        /// Password ID
        id: u64,
        /// Note text
        text: String,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins if set; otherwise only warnings are shown, or debug
/// output for spwd itself with `--verbose`.
pub fn init_logging(verbose: bool) {
    let default_directive = if verbose { "spwd=debug,warn" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    // Ignore the error if a subscriber is already installed (e.g. in tests).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Resolve the data directory: `--data-dir` / `SPWD_DATA_DIR`, else the
/// directory containing the running executable.
pub fn data_dir(cli: &Cli) -> Result<PathBuf> {
    if let Some(dir) = &cli.data_dir {
        return Ok(PathBuf::from(dir));
    }

    let exe = std::env::current_exe()?;
    exe.parent().map(|p| p.to_path_buf()).ok_or_else(|| {
        SpwdError::ConfigError(format!(
            "cannot determine the directory of {}",
            exe.display()
        ))
    })
}

/// Resolve the data directory and load `spwd.toml` from it.
pub fn load_settings(cli: &Cli) -> Result<(PathBuf, Settings)> {
    let dir = data_dir(cli)?;
    let settings = Settings::load(&dir)?;
    Ok((dir, settings))
}

/// Pick the key source: `SPWD_SECRET_KEY` if set, else the key file.
pub fn key_source(settings: &Settings, data_dir: &std::path::Path) -> Box<dyn KeySource> {
    let env = EnvKeySource::default();
    if env.is_set() {
        tracing::debug!("using secret key from environment");
        Box::new(env)
    } else {
        Box::new(JsonFileKeySource::new(settings.key_path(data_dir)))
    }
}

/// Build the vault handle from the CLI arguments and settings.
pub fn open_vault(cli: &Cli) -> Result<Vault<Box<dyn KeySource>>> {
    let (dir, settings) = load_settings(cli)?;
    Ok(vault_for(&dir, &settings))
}

/// Build the vault handle for an already-resolved data directory.
pub fn vault_for(data_dir: &std::path::Path, settings: &Settings) -> Vault<Box<dyn KeySource>> {
    Vault::new(
        settings.database_path(data_dir),
        key_source(settings, data_dir),
    )
    .with_lock_timeout(settings.lock_timeout())
}
