use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Deliberately carries no detail: wrong key, bad padding, bad length and
    /// tampering all look the same to the caller.
    #[error("Decryption failed (wrong encryption password or corrupted data)")]
    DecryptionFailed,

    #[error("Malformed encrypted record: {0}")]
    MalformedRecord(String),

    #[error("Random number generation failed: {0}")]
    RngFailed(String),
}
