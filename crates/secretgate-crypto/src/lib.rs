//! Password-derived secret encryption primitives.
//!
//! Key chain: `identity:passphrase` → master key material → per-record key (per random salt).
//! Records are AES-256-CBC with PKCS#7 padding, serialized as JSON with base64 fields.

pub mod base64;
pub mod cipher;
pub mod error;
pub mod kdf;
pub mod record;
pub mod types;

pub use base64::{base64_decode, base64_encode};
pub use cipher::{decrypt, encrypt};
pub use error::CryptoError;
pub use kdf::{derive_master_key_material, derive_per_record_key, generate_iv, generate_salt};
pub use record::{
    is_encrypted_record, parse, serialize, EncryptedRecord, LegacyEncryptedRecord, ParsedRecord,
};
pub use types::{KeyMaterial, BLOCK_SIZE, IV_LENGTH, KEY_LENGTH, PBKDF2_ITERATIONS, SALT_LENGTH};
