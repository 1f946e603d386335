//! High-level vault operations used by CLI commands.
//!
//! `Vault` ties the storage engine and the crypto layer together so that
//! the rest of the application can work with simple calls like
//! `vault.save("s3cr3t")` or `vault.list_all()`.
//!
//! Every operation opens the store, does all of its work (bucket setup,
//! key loading, encryption, reads and writes) inside one exclusive
//! transaction and closes the store again before returning. The key is
//! loaded from the `KeySource` by each operation that needs it; nothing
//! is cached between calls.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::crypto::{decrypt, encrypt, KeyMaterial, KeySource};
use crate::errors::{Result, SpwdError};
use crate::storage::{Bucket, Db, DEFAULT_LOCK_TIMEOUT};

use super::entry::{PasswordEntry, StoredEntry};

/// Name of the one bucket the vault uses.
pub const BUCKET: &str = "Passwords";

/// Counter key some older stores kept alongside the entries.
const LEGACY_COUNTER_KEY: &[u8] = b"lastID";

/// The vault handle: where the store lives and where the key comes from.
pub struct Vault<K> {
    /// Path to the store file.
    db_path: PathBuf,

    /// Supplies the encoded key on every encrypt/decrypt operation.
    key_source: K,

    /// How long to wait for another process holding the store lock.
    lock_timeout: Duration,
}

impl<K: KeySource> Vault<K> {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Create a handle. Nothing is opened until an operation runs.
    pub fn new(db_path: impl Into<PathBuf>, key_source: K) -> Self {
        Self {
            db_path: db_path.into(),
            key_source,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// Override how long operations wait for the store lock.
    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    /// Create the store file and bucket if they do not exist yet.
    pub fn initialize(&self) -> Result<()> {
        self.open()?
            .update(|tx| tx.create_bucket_if_not_exists(BUCKET).map(drop))
    }

    // ------------------------------------------------------------------
    // Password operations
    // ------------------------------------------------------------------

    /// Encrypt `plaintext` and store it under a fresh id.
    ///
    /// Ids come from the bucket sequence, so they start at 1 and are
    /// never reused, even after the entry is deleted. The key is loaded
    /// and the password sealed while the store lock is held.
    pub fn save(&self, plaintext: &str) -> Result<u64> {
        let id = self.open()?.update(|tx| {
            let bucket = tx.create_bucket_if_not_exists(BUCKET)?;

            let key = KeyMaterial::load(&self.key_source)?;
            let ciphertext = encrypt(plaintext, &key)?;

            let id = bucket.next_sequence()?;
            let entry = StoredEntry::new(id, ciphertext);
            bucket.put(&StoredEntry::key_for(id), &encode(&entry)?)?;
            Ok(id)
        })?;

        info!(id, "password stored");
        Ok(id)
    }

    /// Decrypt and return every readable entry, in store order.
    ///
    /// An entry that cannot be decoded, carries id 0, or fails to decrypt
    /// is skipped with a warning; the rest are still returned. A key that
    /// cannot be loaded fails the whole listing.
    pub fn list_all(&self) -> Result<Vec<PasswordEntry>> {
        let entries = self.open()?.view(|tx| {
            let key = KeyMaterial::load(&self.key_source)?;

            let mut entries = Vec::new();
            if let Some(bucket) = tx.bucket(BUCKET)? {
                bucket.for_each(|k, v| {
                    if let Some(entry) = open_record(k, v, &key) {
                        entries.push(entry);
                    }
                    Ok(())
                })?;
            }
            Ok(entries)
        })?;

        debug!(count = entries.len(), "listed passwords");
        Ok(entries)
    }

    /// Decrypt and return a single entry.
    pub fn get(&self, id: u64) -> Result<PasswordEntry> {
        self.open()?.view(|tx| {
            let key = KeyMaterial::load(&self.key_source)?;

            let bucket = tx.bucket(BUCKET)?.ok_or(SpwdError::NotFound(id))?;
            let stored = read_entry(&bucket, id)?;
            let password = decrypt(&stored.ciphertext, &key)?;

            Ok(PasswordEntry::from_stored(stored, password))
        })
    }

    /// Remove an entry. Deleting an id that is not present succeeds.
    pub fn delete(&self, id: u64) -> Result<()> {
        let removed = self.open()?.update(|tx| {
            tx.create_bucket_if_not_exists(BUCKET)?
                .delete(&StoredEntry::key_for(id))
        })?;

        if removed {
            info!(id, "password deleted");
        } else {
            debug!(id, "nothing to delete");
        }
        Ok(())
    }

    /// Replace an entry's note, leaving everything else untouched.
    ///
    /// An empty `note` clears it. Fails with `NotFound` for unknown ids.
    pub fn annotate(&self, id: u64, note: &str) -> Result<()> {
        self.open()?.update(|tx| {
            let bucket = tx.create_bucket_if_not_exists(BUCKET)?;
            let mut entry = read_entry(&bucket, id)?;
            entry.note = (!note.is_empty()).then(|| note.to_string());
            bucket.put(&StoredEntry::key_for(id), &encode(&entry)?)
        })?;

        info!(id, "note updated");
        Ok(())
    }

    /// Returns the path to the store file.
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn open(&self) -> Result<Db> {
        debug!(path = %self.db_path.display(), "using database");
        Db::open_with_timeout(&self.db_path, self.lock_timeout)
    }
}

fn read_entry(bucket: &Bucket<'_>, id: u64) -> Result<StoredEntry> {
    let data = bucket
        .get(&StoredEntry::key_for(id))?
        .ok_or(SpwdError::NotFound(id))?;

    serde_json::from_slice(&data)
        .map_err(|e| SpwdError::SerializationError(format!("entry {id}: {e}")))
}

fn encode(entry: &StoredEntry) -> Result<Vec<u8>> {
    serde_json::to_vec(entry)
        .map_err(|e| SpwdError::SerializationError(format!("entry {}: {e}", entry.id)))
}

/// Decode and decrypt one raw record, or explain why it is skipped.
fn open_record(key: &[u8], value: &[u8], material: &KeyMaterial) -> Option<PasswordEntry> {
    let key_str = String::from_utf8_lossy(key);

    if key == LEGACY_COUNTER_KEY {
        debug!(key = %key_str, "skipping legacy counter key");
        return None;
    }

    let stored: StoredEntry = match serde_json::from_slice(value) {
        Ok(stored) => stored,
        Err(e) => {
            warn!(key = %key_str, error = %e, "skipping unreadable password entry");
            return None;
        }
    };

    if stored.id == 0 {
        warn!(key = %key_str, "skipping corrupted password entry with ID 0");
        return None;
    }

    match decrypt(&stored.ciphertext, material) {
        Ok(password) => Some(PasswordEntry::from_stored(stored, password)),
        Err(e) => {
            warn!(id = stored.id, error = %e, "skipping corrupted password entry");
            None
        }
    }
}
