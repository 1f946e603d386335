//! `spwd note`: attach a note to a stored password.

use crate::cli::output;
use crate::cli::{open_vault, Cli};
use crate::errors::Result;

/// Execute the `note` command.
pub fn execute(cli: &Cli, id: u64, text: &str) -> Result<()> {
    let vault = open_vault(cli)?;
    vault.annotate(id, text)?;

    if text.is_empty() {
        output::success(&format!("Note cleared on password {id}"));
    } else {
        output::success(&format!("Note added to password {id}"));
        output::tip("Notes are stored unencrypted.");
    }

    Ok(())
}
