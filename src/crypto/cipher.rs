//! XSalsa20-Poly1305 authenticated encryption of single strings.
//!
//! Each call to `encrypt` generates a fresh random 24-byte nonce and
//! prepends it to the sealed payload. The result is base64 text:
//!
//! ```text
//! base64( [ 24-byte nonce | 16-byte Poly1305 tag | ciphertext ] )
//! ```
//!
//! The payload layout is NaCl `secretbox`, so blobs written by other
//! secretbox implementations under the same key open here unchanged.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use crypto_secretbox::aead::{Aead, AeadCore, KeyInit, OsRng};
use crypto_secretbox::{Key, Nonce, XSalsa20Poly1305};
use zeroize::Zeroize;

use super::key::KeyMaterial;
use crate::errors::{Result, SpwdError};

/// Size of the XSalsa20 nonce in bytes.
pub const NONCE_LEN: usize = 24;

/// Encrypt `plaintext` under `key` and return the base64 blob.
pub fn encrypt(plaintext: &str, key: &KeyMaterial) -> Result<String> {
    let cipher = XSalsa20Poly1305::new(Key::from_slice(key.as_bytes()));
    let nonce = XSalsa20Poly1305::generate_nonce(&mut OsRng);

    let sealed = cipher
        .encrypt(&nonce, plaintext.as_bytes())
        .map_err(|e| SpwdError::EncryptionFailed(format!("seal error: {e}")))?;

    let mut blob = Vec::with_capacity(NONCE_LEN + sealed.len());
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&sealed);
    Ok(BASE64.encode(blob))
}

/// Decrypt a blob produced by `encrypt`.
///
/// A wrong key, a flipped bit and deliberate tampering all surface as the
/// same [`SpwdError::AuthenticationFailed`].
pub fn decrypt(blob: &str, key: &KeyMaterial) -> Result<String> {
    if blob.is_empty() {
        return Err(SpwdError::EmptyInput);
    }

    let data = BASE64
        .decode(blob)
        .map_err(|e| SpwdError::MalformedBlob(format!("failed to decode base64: {e}")))?;

    if data.len() < NONCE_LEN {
        return Err(SpwdError::MalformedBlob(format!(
            "{} bytes is shorter than the {NONCE_LEN}-byte nonce",
            data.len()
        )));
    }

    let (nonce_bytes, sealed) = data.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher = XSalsa20Poly1305::new(Key::from_slice(key.as_bytes()));
    let plaintext = cipher
        .decrypt(nonce, sealed)
        .map_err(|_| SpwdError::AuthenticationFailed)?;

    String::from_utf8(plaintext).map_err(|e| {
        let mut bad_bytes = e.into_bytes();
        bad_bytes.zeroize();
        SpwdError::MalformedBlob("decrypted value is not valid UTF-8".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(byte: u8) -> KeyMaterial {
        KeyMaterial::new([byte; 32])
    }

    #[test]
    fn roundtrip() {
        let k = key(0x42);
        let blob = encrypt("hunter2", &k).unwrap();
        assert_eq!(decrypt(&blob, &k).unwrap(), "hunter2");
    }

    #[test]
    fn empty_plaintext_roundtrips() {
        let k = key(0x01);
        let blob = encrypt("", &k).unwrap();
        assert_eq!(decrypt(&blob, &k).unwrap(), "");
    }

    #[test]
    fn blob_layout_is_nonce_tag_ciphertext() {
        let blob = encrypt("abcd", &key(0x05)).unwrap();
        let raw = BASE64.decode(blob).unwrap();
        assert_eq!(raw.len(), NONCE_LEN + 16 + 4);
    }

    #[test]
    fn nonce_is_fresh_per_call() {
        let k = key(0x07);
        let a = BASE64.decode(encrypt("same", &k).unwrap()).unwrap();
        let b = BASE64.decode(encrypt("same", &k).unwrap()).unwrap();
        assert_ne!(a[..NONCE_LEN], b[..NONCE_LEN]);
    }

    #[test]
    fn empty_blob_is_empty_input() {
        assert!(matches!(decrypt("", &key(1)), Err(SpwdError::EmptyInput)));
    }

    #[test]
    fn short_blob_is_malformed() {
        let short = BASE64.encode([0u8; NONCE_LEN - 1]);
        assert!(matches!(
            decrypt(&short, &key(1)),
            Err(SpwdError::MalformedBlob(_))
        ));
    }

    #[test]
    fn invalid_base64_is_malformed() {
        assert!(matches!(
            decrypt("%%% not base64 %%%", &key(1)),
            Err(SpwdError::MalformedBlob(_))
        ));
    }

    #[test]
    fn nonce_only_blob_fails_authentication() {
        let nonce_only = BASE64.encode([0u8; NONCE_LEN]);
        assert!(matches!(
            decrypt(&nonce_only, &key(1)),
            Err(SpwdError::AuthenticationFailed)
        ));
    }

    #[test]
    fn wrong_key_fails_authentication() {
        let blob = encrypt("secret", &key(0x11)).unwrap();
        assert!(matches!(
            decrypt(&blob, &key(0x22)),
            Err(SpwdError::AuthenticationFailed)
        ));
    }
}
