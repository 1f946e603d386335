//! Key material and where it comes from.
//!
//! The vault key is a 32-byte secret stored base64-encoded in a single
//! `secret_key` field, usually in `config.json`:
//!
//! ```json
//! { "secret_key": "q83vEjRWeJq83vEjRWeJq83vEjRWeJq83vEjRWeJq8s=" }
//! ```
//!
//! A [`KeySource`] only produces the encoded field. [`KeyMaterial::load`]
//! decodes and validates it. The key is loaded fresh for every vault
//! operation, so a missing or broken config fails every operation the
//! same way; there is no fallback key.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use crypto_secretbox::aead::{KeyInit, OsRng};
use crypto_secretbox::XSalsa20Poly1305;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::errors::{Result, SpwdError};

/// Length of the symmetric key in bytes (256 bits).
pub const KEY_LEN: usize = 32;

/// Environment variable consulted by [`EnvKeySource::default`].
pub const SECRET_KEY_ENV: &str = "SPWD_SECRET_KEY";

/// Anything that can hand over the base64-encoded secret key.
pub trait KeySource {
    /// Return the encoded key field.
    ///
    /// Failing to reach or parse the underlying config is
    /// [`SpwdError::ConfigUnavailable`].
    fn encoded_key(&self) -> Result<Zeroizing<String>>;
}

impl<T: KeySource + ?Sized> KeySource for Box<T> {
    fn encoded_key(&self) -> Result<Zeroizing<String>> {
        (**self).encoded_key()
    }
}

impl<T: KeySource + ?Sized> KeySource for &T {
    fn encoded_key(&self) -> Result<Zeroizing<String>> {
        (**self).encoded_key()
    }
}

/// On-disk shape of the key config file.
#[derive(Serialize, Deserialize)]
struct KeyConfig {
    secret_key: String,
}

impl Drop for KeyConfig {
    fn drop(&mut self) {
        self.secret_key.zeroize();
    }
}

/// Reads `secret_key` from a JSON config file.
#[derive(Debug, Clone)]
pub struct JsonFileKeySource {
    path: PathBuf,
}

impl JsonFileKeySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a freshly generated key to a new config file.
    ///
    /// Refuses to overwrite an existing file: replacing the key would make
    /// every stored entry undecryptable. On Unix the file is created with
    /// owner-only permissions.
    pub fn create(&self) -> Result<KeyMaterial> {
        if self.path.exists() {
            return Err(SpwdError::ConfigError(format!(
                "key file already exists at {}",
                self.path.display()
            )));
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let key = KeyMaterial::generate();
        let config = KeyConfig {
            secret_key: key.to_base64().to_string(),
        };
        let json = Zeroizing::new(
            serde_json::to_string_pretty(&config)
                .map_err(|e| SpwdError::SerializationError(format!("key config: {e}")))?,
        );

        fs::write(&self.path, json.as_bytes())?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }

        Ok(key)
    }
}

impl KeySource for JsonFileKeySource {
    fn encoded_key(&self) -> Result<Zeroizing<String>> {
        let contents = Zeroizing::new(fs::read_to_string(&self.path).map_err(|e| {
            SpwdError::ConfigUnavailable(format!(
                "failed to open {}: {e}",
                self.path.display()
            ))
        })?);

        let config: KeyConfig = serde_json::from_str(&contents).map_err(|e| {
            SpwdError::ConfigUnavailable(format!(
                "failed to parse {}: {e}",
                self.path.display()
            ))
        })?;

        Ok(Zeroizing::new(config.secret_key.clone()))
    }
}

/// Reads the encoded key from an environment variable at call time.
#[derive(Debug, Clone)]
pub struct EnvKeySource {
    var: String,
}

impl EnvKeySource {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    /// Returns `true` if the variable is set to a non-empty value.
    pub fn is_set(&self) -> bool {
        std::env::var(&self.var).is_ok_and(|v| !v.is_empty())
    }
}

impl Default for EnvKeySource {
    fn default() -> Self {
        Self::new(SECRET_KEY_ENV)
    }
}

impl KeySource for EnvKeySource {
    fn encoded_key(&self) -> Result<Zeroizing<String>> {
        match std::env::var(&self.var) {
            Ok(value) if !value.is_empty() => Ok(Zeroizing::new(value)),
            _ => Err(SpwdError::ConfigUnavailable(format!(
                "environment variable {} is not set",
                self.var
            ))),
        }
    }
}

/// An in-memory encoded key.
#[derive(Clone)]
pub struct StaticKeySource {
    encoded: Zeroizing<String>,
}

impl StaticKeySource {
    pub fn new(encoded: impl Into<String>) -> Self {
        Self {
            encoded: Zeroizing::new(encoded.into()),
        }
    }

    /// Wrap already-loaded key material.
    pub fn from_key(key: &KeyMaterial) -> Self {
        Self {
            encoded: key.to_base64(),
        }
    }
}

impl KeySource for StaticKeySource {
    fn encoded_key(&self) -> Result<Zeroizing<String>> {
        Ok(self.encoded.clone())
    }
}

/// A validated 32-byte symmetric key, zeroed on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial {
    bytes: [u8; KEY_LEN],
}

impl KeyMaterial {
    /// Wrap raw key bytes.
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Fetch the encoded key from `source` and validate it.
    pub fn load<S: KeySource + ?Sized>(source: &S) -> Result<Self> {
        let encoded = source.encoded_key()?;
        Self::from_base64(&encoded)
    }

    /// Decode a base64 key, requiring exactly [`KEY_LEN`] bytes.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let decoded = Zeroizing::new(BASE64.decode(encoded.trim()).map_err(|e| {
            SpwdError::InvalidKeyMaterial(format!("failed to decode base64 secret key: {e}"))
        })?);

        let bytes: [u8; KEY_LEN] = decoded.as_slice().try_into().map_err(|_| {
            SpwdError::InvalidKeyMaterial(format!(
                "invalid secret key length: {}; expected {KEY_LEN}",
                decoded.len()
            ))
        })?;

        Ok(Self { bytes })
    }

    /// A fresh random key from the operating system.
    pub fn generate() -> Self {
        let key = XSalsa20Poly1305::generate_key(&mut OsRng);
        let mut bytes = [0u8; KEY_LEN];
        bytes.copy_from_slice(key.as_slice());
        Self { bytes }
    }

    /// Base64 form suitable for the `secret_key` field.
    pub fn to_base64(&self) -> Zeroizing<String> {
        Zeroizing::new(BASE64.encode(self.bytes))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyMaterial([REDACTED])")
    }
}
