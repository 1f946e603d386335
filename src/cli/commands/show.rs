//! `spwd show`: retrieve and print a single password.

use crate::cli::{open_vault, Cli};
use crate::errors::Result;

/// Execute the `show` command.
pub fn execute(cli: &Cli, id: u64) -> Result<()> {
    let vault = open_vault(cli)?;
    let entry = vault.get(id)?;

    // Password alone on stdout so it can be piped.
    println!("{}", entry.password.as_str());

    Ok(())
}
