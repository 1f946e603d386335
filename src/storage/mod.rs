//! Embedded storage engine.
//!
//! A single-file, bucketed key-value store with per-bucket sequences and
//! exclusive-lock transactions (`db`).

pub mod db;

pub use db::{Bucket, Db, Tx, DEFAULT_LOCK_TIMEOUT};
