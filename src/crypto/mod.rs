//! Cryptographic primitives for spwd.
//!
//! This module provides:
//! - The 32-byte vault key and the sources it is loaded from (`key`)
//! - XSalsa20-Poly1305 encryption and decryption of single strings (`cipher`)

pub mod cipher;
pub mod key;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{encrypt, decrypt, KeyMaterial, ...};
pub use cipher::{decrypt, encrypt};
pub use key::{EnvKeySource, JsonFileKeySource, KeyMaterial, KeySource, StaticKeySource};
