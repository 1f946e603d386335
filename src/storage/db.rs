//! Bucketed key-value store on top of a single SQLite file.
//!
//! The model is a small embedded KV engine:
//!
//! - A **bucket** is a named namespace of byte keys to byte values.
//! - Each bucket owns a monotonically increasing **sequence** counter
//!   (`next_sequence`), which is never decremented, so ids handed out
//!   from it are never reused even after their keys are deleted.
//! - Keys iterate in byte order (`memcmp`), so `"10"` sorts before `"2"`.
//!
//! Every `view`/`update` runs inside an `EXCLUSIVE` SQLite transaction.
//! The file lock is held for the whole closure and released when the
//! transaction commits or rolls back, including on every error path.
//! A second process waits up to the lock timeout and then fails.
//!
//! Schema:
//!
//! ```text
//! buckets (name TEXT PRIMARY KEY, sequence INTEGER)
//! entries (bucket TEXT, key BLOB, value BLOB, PRIMARY KEY (bucket, key))
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use tracing::{debug, info};

use crate::errors::{Result, SpwdError};

/// How long to wait for another process to release the file lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(1);

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS buckets (
        name     TEXT PRIMARY KEY NOT NULL,
        sequence INTEGER NOT NULL DEFAULT 0
    );
    CREATE TABLE IF NOT EXISTS entries (
        bucket TEXT NOT NULL,
        key    BLOB NOT NULL,
        value  BLOB NOT NULL,
        PRIMARY KEY (bucket, key)
    ) WITHOUT ROWID;
";

fn storage(context: &'static str) -> impl Fn(rusqlite::Error) -> SpwdError {
    move |e| SpwdError::Storage(format!("{context}: {e}"))
}

/// An open store file. Dropping it closes the connection.
pub struct Db {
    conn: Connection,
    path: PathBuf,
}

impl Db {
    /// Open (or create) the store at `path` with the default lock timeout.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, DEFAULT_LOCK_TIMEOUT)
    }

    /// Open (or create) the store at `path`.
    ///
    /// A missing file is created, along with its parent directories, with
    /// owner-only permissions on Unix. An existing file is left as is, even
    /// if another process created it a moment ago.
    pub fn open_with_timeout(path: &Path, lock_timeout: Duration) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "database file not found, creating");
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
        }

        // Another process may create the file first; never truncate it.
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(false);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        options.open(path)?;

        let mut conn = Connection::open(path).map_err(storage("open database"))?;
        conn.busy_timeout(lock_timeout)
            .map_err(storage("set lock timeout"))?;

        let setup = conn
            .transaction_with_behavior(TransactionBehavior::Exclusive)
            .map_err(storage("begin schema setup"))?;
        setup
            .execute_batch(SCHEMA)
            .map_err(storage("initialize schema"))?;
        setup.commit().map_err(storage("commit schema setup"))?;

        debug!(path = %path.display(), "database opened");
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` in a read-write transaction.
    ///
    /// Commits if `f` returns `Ok`, rolls back otherwise.
    pub fn update<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&Tx<'_>) -> Result<T>,
    {
        self.run(true, f)
    }

    /// Run `f` in a read-only transaction. Writes inside it fail.
    pub fn view<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&Tx<'_>) -> Result<T>,
    {
        self.run(false, f)
    }

    fn run<T, F>(&mut self, writable: bool, f: F) -> Result<T>
    where
        F: FnOnce(&Tx<'_>) -> Result<T>,
    {
        let inner = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Exclusive)
            .map_err(storage("begin transaction"))?;
        let tx = Tx { inner, writable };

        // On error the transaction is dropped, which rolls it back.
        let value = f(&tx)?;

        if writable {
            tx.inner.commit().map_err(storage("commit"))?;
        } else {
            tx.inner.rollback().map_err(storage("end read transaction"))?;
        }
        Ok(value)
    }
}

/// A transaction handed to `Db::view` / `Db::update` closures.
pub struct Tx<'db> {
    inner: Transaction<'db>,
    writable: bool,
}

impl Tx<'_> {
    /// Returns `true` inside `Db::update`.
    pub fn writable(&self) -> bool {
        self.writable
    }

    /// Return the bucket called `name`, creating it first if needed.
    pub fn create_bucket_if_not_exists(&self, name: &str) -> Result<Bucket<'_>> {
        if !self.writable {
            return Err(SpwdError::Storage(format!(
                "cannot create bucket '{name}' in a read-only transaction"
            )));
        }

        let created = self
            .inner
            .execute(
                "INSERT OR IGNORE INTO buckets (name, sequence) VALUES (?1, 0)",
                params![name],
            )
            .map_err(storage("create bucket"))?;
        if created > 0 {
            info!(bucket = name, "created bucket");
        }

        Ok(self.handle(name))
    }

    /// Return the bucket called `name`, or `None` if it was never created.
    pub fn bucket(&self, name: &str) -> Result<Option<Bucket<'_>>> {
        let exists = self
            .inner
            .query_row(
                "SELECT 1 FROM buckets WHERE name = ?1",
                params![name],
                |_| Ok(()),
            )
            .optional()
            .map_err(storage("look up bucket"))?
            .is_some();

        Ok(exists.then(|| self.handle(name)))
    }

    fn handle(&self, name: &str) -> Bucket<'_> {
        Bucket {
            conn: &self.inner,
            name: name.to_string(),
            writable: self.writable,
        }
    }
}

/// A namespace of keys inside a transaction.
pub struct Bucket<'tx> {
    conn: &'tx Connection,
    name: String,
    writable: bool,
}

impl Bucket<'_> {
    /// Advance the bucket's sequence and return the new value (first call returns 1).
    pub fn next_sequence(&self) -> Result<u64> {
        self.ensure_writable("advance sequence")?;
        self.conn
            .execute(
                "UPDATE buckets SET sequence = sequence + 1 WHERE name = ?1",
                params![self.name],
            )
            .map_err(storage("advance sequence"))?;
        self.sequence()
    }

    /// Current sequence value without advancing it.
    pub fn sequence(&self) -> Result<u64> {
        let seq: i64 = self
            .conn
            .query_row(
                "SELECT sequence FROM buckets WHERE name = ?1",
                params![self.name],
                |row| row.get(0),
            )
            .map_err(storage("read sequence"))?;

        u64::try_from(seq).map_err(|_| {
            SpwdError::Storage(format!(
                "bucket '{}' has a negative sequence {seq}",
                self.name
            ))
        })
    }

    /// Fetch the value stored under `key`.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.conn
            .query_row(
                "SELECT value FROM entries WHERE bucket = ?1 AND key = ?2",
                params![self.name, key],
                |row| row.get(0),
            )
            .optional()
            .map_err(storage("read entry"))
    }

    /// Insert or overwrite the value under `key`.
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.ensure_writable("write entry")?;
        self.conn
            .execute(
                "INSERT OR REPLACE INTO entries (bucket, key, value) VALUES (?1, ?2, ?3)",
                params![self.name, key, value],
            )
            .map_err(storage("write entry"))?;
        Ok(())
    }

    /// Remove `key`. Returns whether it existed; a missing key is not an error.
    pub fn delete(&self, key: &[u8]) -> Result<bool> {
        self.ensure_writable("delete entry")?;
        let removed = self
            .conn
            .execute(
                "DELETE FROM entries WHERE bucket = ?1 AND key = ?2",
                params![self.name, key],
            )
            .map_err(storage("delete entry"))?;
        Ok(removed > 0)
    }

    /// Number of keys in the bucket.
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM entries WHERE bucket = ?1",
                params![self.name],
                |row| row.get(0),
            )
            .map_err(storage("count entries"))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Call `f` for every key/value pair in key order.
    ///
    /// Stops at, and returns, the first error `f` returns.
    pub fn for_each<F>(&self, mut f: F) -> Result<()>
    where
        F: FnMut(&[u8], &[u8]) -> Result<()>,
    {
        let mut stmt = self
            .conn
            .prepare("SELECT key, value FROM entries WHERE bucket = ?1 ORDER BY key")
            .map_err(storage("prepare iteration"))?;
        let mut rows = stmt
            .query(params![self.name])
            .map_err(storage("iterate entries"))?;

        while let Some(row) = rows.next().map_err(storage("iterate entries"))? {
            let key: Vec<u8> = row.get(0).map_err(storage("read key"))?;
            let value: Vec<u8> = row.get(1).map_err(storage("read value"))?;
            f(&key, &value)?;
        }
        Ok(())
    }

    fn ensure_writable(&self, action: &str) -> Result<()> {
        if self.writable {
            Ok(())
        } else {
            Err(SpwdError::Storage(format!(
                "cannot {action} in bucket '{}' during a read-only transaction",
                self.name
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_db() -> (TempDir, Db) {
        let dir = TempDir::new().unwrap();
        let db = Db::open(&dir.path().join("test.db")).unwrap();
        (dir, db)
    }

    #[test]
    fn open_creates_missing_file_and_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a").join("b").join("store.db");

        let db = Db::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(db.path(), path);
    }

    #[cfg(unix)]
    #[test]
    fn created_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let (dir, _db) = temp_db();
        let mode = fs::metadata(dir.path().join("test.db"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn bucket_is_none_until_created() {
        let (_dir, mut db) = temp_db();

        let missing = db.view(|tx| Ok(tx.bucket("things")?.is_none())).unwrap();
        assert!(missing);

        db.update(|tx| tx.create_bucket_if_not_exists("things").map(|_| ()))
            .unwrap();

        let present = db.view(|tx| Ok(tx.bucket("things")?.is_some())).unwrap();
        assert!(present);
    }

    #[test]
    fn create_bucket_is_idempotent_and_keeps_data() {
        let (_dir, mut db) = temp_db();

        db.update(|tx| {
            let b = tx.create_bucket_if_not_exists("b")?;
            b.put(b"k", b"v")?;
            b.next_sequence().map(|_| ())
        })
        .unwrap();

        let (value, seq) = db
            .update(|tx| {
                let b = tx.create_bucket_if_not_exists("b")?;
                Ok((b.get(b"k")?, b.sequence()?))
            })
            .unwrap();
        assert_eq!(value.as_deref(), Some(&b"v"[..]));
        assert_eq!(seq, 1);
    }

    #[test]
    fn sequence_survives_reopen_and_deletes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("seq.db");

        {
            let mut db = Db::open(&path).unwrap();
            db.update(|tx| {
                let b = tx.create_bucket_if_not_exists("b")?;
                assert_eq!(b.next_sequence()?, 1);
                assert_eq!(b.next_sequence()?, 2);
                b.put(b"2", b"x")?;
                b.delete(b"2").map(|_| ())
            })
            .unwrap();
        }

        let mut db = Db::open(&path).unwrap();
        let next = db
            .update(|tx| tx.create_bucket_if_not_exists("b")?.next_sequence())
            .unwrap();
        assert_eq!(next, 3);
    }

    #[test]
    fn buckets_are_isolated() {
        let (_dir, mut db) = temp_db();

        db.update(|tx| {
            tx.create_bucket_if_not_exists("one")?.put(b"k", b"1")?;
            tx.create_bucket_if_not_exists("two")?.put(b"k", b"2")?;
            assert_eq!(tx.create_bucket_if_not_exists("one")?.next_sequence()?, 1);
            assert_eq!(tx.create_bucket_if_not_exists("two")?.sequence()?, 0);
            Ok(())
        })
        .unwrap();

        let one = db
            .view(|tx| tx.bucket("one")?.map_or(Ok(None), |b| b.get(b"k")))
            .unwrap();
        assert_eq!(one.as_deref(), Some(&b"1"[..]));
    }

    #[test]
    fn put_overwrites_and_delete_reports_presence() {
        let (_dir, mut db) = temp_db();

        db.update(|tx| {
            let b = tx.create_bucket_if_not_exists("b")?;
            b.put(b"k", b"old")?;
            b.put(b"k", b"new")?;
            assert_eq!(b.get(b"k")?.as_deref(), Some(&b"new"[..]));
            assert_eq!(b.count()?, 1);

            assert!(b.delete(b"k")?);
            assert!(!b.delete(b"k")?);
            assert!(b.get(b"k")?.is_none());
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn for_each_visits_keys_in_byte_order() {
        let (_dir, mut db) = temp_db();

        db.update(|tx| {
            let b = tx.create_bucket_if_not_exists("b")?;
            for key in ["2", "10", "1", "3"] {
                b.put(key.as_bytes(), b"v")?;
            }
            Ok(())
        })
        .unwrap();

        let keys = db
            .view(|tx| {
                let mut keys = Vec::new();
                if let Some(b) = tx.bucket("b")? {
                    b.for_each(|k, _| {
                        keys.push(String::from_utf8_lossy(k).into_owned());
                        Ok(())
                    })?;
                }
                Ok(keys)
            })
            .unwrap();
        assert_eq!(keys, vec!["1", "10", "2", "3"]);
    }

    #[test]
    fn for_each_stops_on_callback_error() {
        let (_dir, mut db) = temp_db();

        db.update(|tx| {
            let b = tx.create_bucket_if_not_exists("b")?;
            b.put(b"a", b"1")?;
            b.put(b"b", b"2")
        })
        .unwrap();

        let mut visited = 0;
        let result = db.view(|tx| {
            let b = tx.bucket("b")?.expect("bucket exists");
            b.for_each(|_, _| {
                visited += 1;
                Err(SpwdError::CommandFailed("stop".into()))
            })
        });
        assert!(result.is_err());
        assert_eq!(visited, 1);
    }

    #[test]
    fn failed_update_rolls_back() {
        let (_dir, mut db) = temp_db();
        db.update(|tx| tx.create_bucket_if_not_exists("b").map(|_| ()))
            .unwrap();

        let result: Result<()> = db.update(|tx| {
            let b = tx.create_bucket_if_not_exists("b")?;
            b.next_sequence()?;
            b.put(b"k", b"v")?;
            Err(SpwdError::CommandFailed("abort".into()))
        });
        assert!(result.is_err());

        let (value, seq) = db
            .view(|tx| {
                let b = tx.bucket("b")?.expect("bucket exists");
                Ok((b.get(b"k")?, b.sequence()?))
            })
            .unwrap();
        assert!(value.is_none());
        assert_eq!(seq, 0);
    }

    #[test]
    fn view_rejects_writes() {
        let (_dir, mut db) = temp_db();
        db.update(|tx| tx.create_bucket_if_not_exists("b").map(|_| ()))
            .unwrap();

        let result = db.view(|tx| {
            let b = tx.bucket("b")?.expect("bucket exists");
            assert!(!tx.writable());
            b.put(b"k", b"v")
        });
        assert!(matches!(result, Err(SpwdError::Storage(_))));

        assert!(db.view(|tx| tx.create_bucket_if_not_exists("c").map(|_| ())).is_err());
    }

    #[test]
    fn second_handle_is_locked_out_during_update() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("locked.db");
        let mut db = Db::open(&path).unwrap();

        let contended = db
            .update(|_tx| {
                let blocked = Db::open_with_timeout(&path, Duration::from_millis(50))
                    .and_then(|mut other| other.view(|_| Ok(())));
                Ok(blocked.is_err())
            })
            .unwrap();
        assert!(contended, "a concurrent handle must not get in while locked");

        // Lock is released once the update returns.
        let mut other = Db::open(&path).unwrap();
        assert!(other.view(|_| Ok(())).is_ok());
    }

    #[test]
    fn reopening_never_truncates_existing_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kept.db");

        let mut first = Db::open(&path).unwrap();
        first
            .update(|tx| tx.create_bucket_if_not_exists("b")?.put(b"k", b"v"))
            .unwrap();

        // A second handle opened while the first is still alive.
        let mut second = Db::open(&path).unwrap();
        let value = second
            .view(|tx| tx.bucket("b")?.expect("bucket exists").get(b"k"))
            .unwrap();
        assert_eq!(value.as_deref(), Some(&b"v"[..]));
    }

    #[test]
    fn concurrent_first_opens_keep_every_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fresh.db");

        let handles: Vec<_> = (0..8u8)
            .map(|i| {
                let path = path.clone();
                std::thread::spawn(move || {
                    let mut db = Db::open_with_timeout(&path, Duration::from_secs(10))?;
                    db.update(|tx| tx.create_bucket_if_not_exists("b")?.put(&[i], &[i]))
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        let count = Db::open(&path)
            .unwrap()
            .view(|tx| tx.bucket("b")?.expect("bucket exists").count())
            .unwrap();
        assert_eq!(count, 8);
    }
}
