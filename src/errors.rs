use thiserror::Error;

/// All errors that can occur in spwd.
#[derive(Debug, Error)]
pub enum SpwdError {
    // --- Policy errors ---
    #[error("Invalid mode '{0}'; expected one of: very-weak (vw), weak (w), medium (m), strong (s), very-strong (vs), unbreakable (xb)")]
    InvalidMode(String),

    #[error("Invalid length {length} for {mode} password; must be between {min} and {max}")]
    InvalidLength {
        mode: &'static str,
        length: usize,
        min: usize,
        max: usize,
    },

    #[error("Cannot generate a password from an empty character set")]
    EmptyCharset,

    // --- Key material errors ---
    #[error("Invalid key material: {0}")]
    InvalidKeyMaterial(String),

    #[error("Key configuration unavailable: {0}")]
    ConfigUnavailable(String),

    // --- Cipher errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Empty encrypted data")]
    EmptyInput,

    #[error("Malformed encrypted data: {0}")]
    MalformedBlob(String),

    #[error("Decryption failed: wrong key or corrupted data")]
    AuthenticationFailed,

    // --- Vault errors ---
    #[error("Password with ID {0} not found")]
    NotFound(u64),

    #[error("Storage error: {0}")]
    Storage(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("User cancelled operation")]
    UserCancelled,
}

/// Convenience type alias for spwd results.
pub type Result<T> = std::result::Result<T, SpwdError>;
