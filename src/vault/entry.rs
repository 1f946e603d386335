//! Records stored in the vault.
//!
//! `StoredEntry` is what lives on disk: the password only as a cipher
//! blob. `PasswordEntry` is what the vault hands back after decryption.

use std::fmt;

use chrono::Local;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Format of `created_at`, e.g. `2024-05-01 14:03:59` (local time).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The serialized form of one password, keyed by its decimal id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEntry {
    /// Store-assigned id; never 0.
    pub id: u64,

    /// Base64 `nonce || sealed` blob. Older records call this `password`.
    #[serde(alias = "password")]
    pub ciphertext: String,

    /// Human-readable creation time.
    pub created_at: String,

    /// Free-form note. Stored in plaintext.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl StoredEntry {
    /// A new entry stamped with the current local time and no note.
    pub fn new(id: u64, ciphertext: String) -> Self {
        Self {
            id,
            ciphertext,
            created_at: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            note: None,
        }
    }

    /// The bucket key for an id: its decimal string.
    pub fn key_for(id: u64) -> Vec<u8> {
        id.to_string().into_bytes()
    }
}

/// A decrypted vault entry. `Debug` output never shows the password.
#[derive(Clone)]
pub struct PasswordEntry {
    pub id: u64,

    /// The plaintext password, wiped from memory on drop.
    pub password: Zeroizing<String>,

    pub created_at: String,

    pub note: Option<String>,
}

impl PasswordEntry {
    pub(crate) fn from_stored(stored: StoredEntry, password: String) -> Self {
        Self {
            id: stored.id,
            password: Zeroizing::new(password),
            created_at: stored.created_at,
            note: stored.note,
        }
    }
}

impl fmt::Debug for PasswordEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordEntry")
            .field("id", &self.id)
            .field("password", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .field("note", &self.note)
            .finish()
    }
}
