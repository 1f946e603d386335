//! `spwd list`: display all stored passwords in a table.

use crate::cli::output;
use crate::cli::{open_vault, Cli};
use crate::errors::Result;

/// Execute the `list` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let vault = open_vault(cli)?;

    let mut entries = vault.list_all()?;
    entries.sort_by_key(|e| e.id);

    output::info(&format!("{} stored password(s)", entries.len()));
    output::print_passwords_table(&entries);

    Ok(())
}
