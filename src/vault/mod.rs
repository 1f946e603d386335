//! Vault module: encrypted password storage.
//!
//! This module provides:
//! - `StoredEntry` and `PasswordEntry` record types (`entry`)
//! - The `Vault` handle with save / list / delete / annotate (`store`)

pub mod entry;
pub mod store;

// Re-export the most commonly used items.
pub use entry::{PasswordEntry, StoredEntry, TIMESTAMP_FORMAT};
pub use store::{Vault, BUCKET};
