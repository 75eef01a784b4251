use secretgate_crypto::CryptoError;
use thiserror::Error;

/// Coarse classification callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    PassphraseRequired,
    MalformedRecord,
    DecryptionFailed,
    Rng,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SecretError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Passphrase required for identity {identity}")]
    PassphraseRequired { identity: String },

    #[error("Malformed encrypted record: {0}")]
    MalformedRecord(String),

    #[error("Decryption failed (wrong encryption password or corrupted data)")]
    DecryptionFailed,

    #[error("Random number generation failed: {0}")]
    RngFailed(String),
}

impl SecretError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SecretError::InvalidInput(_) => ErrorKind::InvalidInput,
            SecretError::PassphraseRequired { .. } => ErrorKind::PassphraseRequired,
            SecretError::MalformedRecord(_) => ErrorKind::MalformedRecord,
            SecretError::DecryptionFailed => ErrorKind::DecryptionFailed,
            SecretError::RngFailed(_) => ErrorKind::Rng,
        }
    }

    pub(crate) fn passphrase_required(identity: &str) -> Self {
        SecretError::PassphraseRequired {
            identity: identity.to_string(),
        }
    }
}

impl From<CryptoError> for SecretError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::InvalidInput(msg) => SecretError::InvalidInput(msg),
            CryptoError::DecryptionFailed => SecretError::DecryptionFailed,
            CryptoError::MalformedRecord(msg) => SecretError::MalformedRecord(msg),
            CryptoError::RngFailed(msg) => SecretError::RngFailed(msg),
        }
    }
}

pub type Result<T> = std::result::Result<T, SecretError>;
