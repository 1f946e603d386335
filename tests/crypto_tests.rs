//! Integration tests for the spwd crypto module.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use spwd::crypto::cipher::NONCE_LEN;
use spwd::crypto::{decrypt, encrypt, KeyMaterial, StaticKeySource};
use spwd::errors::SpwdError;

fn key() -> KeyMaterial {
    KeyMaterial::new([0xABu8; 32])
}

// ---------------------------------------------------------------------------
// Encryption round-trip
// ---------------------------------------------------------------------------

#[test]
fn encrypt_decrypt_roundtrip() {
    let key = key();
    let plaintexts = [
        "a",
        "correct horse battery staple",
        "!@#$%^&*()_-+=<>?{}[]:;,.<>~`|",
        "пароль-密码-🔑",
    ];

    for plaintext in plaintexts {
        let blob = encrypt(plaintext, &key).expect("encrypt should succeed");
        let recovered = decrypt(&blob, &key).expect("decrypt should succeed");
        assert_eq!(recovered, plaintext);
    }
}

#[test]
fn roundtrip_with_generated_key() {
    let key = KeyMaterial::generate();
    let blob = encrypt("fresh key", &key).unwrap();
    assert_eq!(decrypt(&blob, &key).unwrap(), "fresh key");
}

#[test]
fn encrypt_produces_different_blob_each_time() {
    let key = key();

    let b1 = encrypt("same input", &key).expect("encrypt 1");
    let b2 = encrypt("same input", &key).expect("encrypt 2");

    // Because each call generates a new random nonce, the output must differ.
    assert_ne!(b1, b2, "two encryptions of the same plaintext must differ");
}

#[test]
fn blob_is_base64_of_nonce_and_sealed_payload() {
    let blob = encrypt("hello", &key()).unwrap();
    let raw = BASE64.decode(&blob).expect("blob must be standard base64");

    // nonce + 16-byte Poly1305 tag + plaintext bytes
    assert_eq!(raw.len(), NONCE_LEN + 16 + "hello".len());
}

// ---------------------------------------------------------------------------
// Tamper sensitivity
// ---------------------------------------------------------------------------

#[test]
fn flipping_any_byte_fails_authentication() {
    let key = key();
    let blob = encrypt("tamper me", &key).unwrap();
    let raw = BASE64.decode(&blob).unwrap();

    for i in 0..raw.len() {
        let mut tampered = raw.clone();
        tampered[i] ^= 0x01;
        let result = decrypt(&BASE64.encode(&tampered), &key);
        assert!(
            matches!(result, Err(SpwdError::AuthenticationFailed)),
            "flipping byte {i} must fail authentication, got {result:?}"
        );
    }
}

#[test]
fn truncated_payload_fails_authentication() {
    let key = key();
    let raw = BASE64.decode(encrypt("truncate", &key).unwrap()).unwrap();
    let truncated = BASE64.encode(&raw[..raw.len() - 1]);

    assert!(matches!(
        decrypt(&truncated, &key),
        Err(SpwdError::AuthenticationFailed)
    ));
}

#[test]
fn decrypt_with_wrong_key_fails() {
    let blob = encrypt("TOP_SECRET", &KeyMaterial::new([0x11; 32])).unwrap();
    let result = decrypt(&blob, &KeyMaterial::new([0x22; 32]));

    assert!(matches!(result, Err(SpwdError::AuthenticationFailed)));
}

// ---------------------------------------------------------------------------
// Malformed input
// ---------------------------------------------------------------------------

#[test]
fn decrypt_empty_input() {
    assert!(matches!(decrypt("", &key()), Err(SpwdError::EmptyInput)));
}

#[test]
fn decrypt_shorter_than_nonce() {
    let short = BASE64.encode([0u8; 23]);
    assert!(matches!(
        decrypt(&short, &key()),
        Err(SpwdError::MalformedBlob(_))
    ));
}

#[test]
fn decrypt_non_base64() {
    assert!(matches!(
        decrypt("this is *not* base64", &key()),
        Err(SpwdError::MalformedBlob(_))
    ));
}

// ---------------------------------------------------------------------------
// Key material
// ---------------------------------------------------------------------------

#[test]
fn key_loads_from_static_source() {
    let encoded = BASE64.encode([0x33u8; 32]);
    let key = KeyMaterial::load(&StaticKeySource::new(encoded)).unwrap();
    assert_eq!(key.as_bytes(), &[0x33u8; 32]);
}

#[test]
fn key_with_wrong_length_is_rejected() {
    let encoded = BASE64.encode([0x33u8; 16]);
    let result = KeyMaterial::load(&StaticKeySource::new(encoded));
    assert!(matches!(result, Err(SpwdError::InvalidKeyMaterial(_))));
}
