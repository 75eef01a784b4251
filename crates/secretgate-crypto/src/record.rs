//! Encrypted record wire format.
//!
//! Current (written and read):
//! `{"encrypted": b64(ciphertext), "iv": b64(16 bytes), "salt": b64(32 bytes)}`
//!
//! Legacy (read only): `{"encrypted": b64(salt || iv || ciphertext), "iv": b64(..)}`
//! The combined blob is sliced positionally: the first `LEGACY_KEY_WORDS` words
//! are the salt, the next `LEGACY_IV_WORDS` words the IV, the rest ciphertext.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::base64::{base64_decode, base64_encode};
use crate::error::CryptoError;
use crate::types::{IV_LENGTH, LEGACY_IV_WORDS, LEGACY_KEY_WORDS, SALT_LENGTH, WORD_SIZE};

const LEGACY_SALT_END: usize = LEGACY_KEY_WORDS * WORD_SIZE;
const LEGACY_IV_END: usize = LEGACY_SALT_END + LEGACY_IV_WORDS * WORD_SIZE;

/// A record in the current three-field format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedRecord {
    pub ciphertext: Vec<u8>,
    pub iv: [u8; IV_LENGTH],
    pub salt: [u8; SALT_LENGTH],
}

/// A record written before the explicit salt field existed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyEncryptedRecord {
    /// Combined `salt || iv || ciphertext` blob.
    pub blob: Vec<u8>,
    /// The separately stored `iv` field, kept verbatim. Decryption uses the
    /// IV embedded in the blob.
    pub declared_iv: String,
}

impl LegacyEncryptedRecord {
    /// Slice the combined blob into `(salt, iv, ciphertext)`.
    pub fn split(&self) -> (&[u8], &[u8], &[u8]) {
        let (salt, rest) = self.blob.split_at(LEGACY_SALT_END);
        let (iv, ciphertext) = rest.split_at(LEGACY_IV_END - LEGACY_SALT_END);
        (salt, iv, ciphertext)
    }
}

/// Output of [`parse`]: the format is decided once, here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedRecord {
    Current(EncryptedRecord),
    Legacy(LegacyEncryptedRecord),
}

#[derive(Serialize)]
struct WireRecord<'a> {
    encrypted: &'a str,
    iv: &'a str,
    salt: &'a str,
}

/// Read an optional string field. Missing and `null` are both absent.
fn string_field(map: &Map<String, Value>, name: &str) -> Result<Option<String>, CryptoError> {
    match map.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(CryptoError::MalformedRecord(format!(
            "field '{}' must be a string",
            name
        ))),
    }
}

fn decode_field(name: &str, value: &str) -> Result<Vec<u8>, CryptoError> {
    base64_decode(value)
        .map_err(|e| CryptoError::MalformedRecord(format!("field '{}' is not base64: {}", name, e)))
}

fn decode_fixed<const N: usize>(name: &str, value: &str) -> Result<[u8; N], CryptoError> {
    let bytes = decode_field(name, value)?;
    let got = bytes.len();
    bytes.try_into().map_err(|_| {
        CryptoError::MalformedRecord(format!("field '{}' must be {} bytes, got {}", name, N, got))
    })
}

/// Serialize a record as JSON with base64 fields. Always the current format.
pub fn serialize(record: &EncryptedRecord) -> Result<String, CryptoError> {
    let encrypted = base64_encode(&record.ciphertext);
    let iv = base64_encode(&record.iv);
    let salt = base64_encode(&record.salt);
    serde_json::to_string(&WireRecord {
        encrypted: &encrypted,
        iv: &iv,
        salt: &salt,
    })
    .map_err(|e| CryptoError::MalformedRecord(e.to_string()))
}

/// Parse a stored record, detecting the legacy two-field shape.
pub fn parse(raw: &str) -> Result<ParsedRecord, CryptoError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| CryptoError::MalformedRecord(format!("not a JSON record: {}", e)))?;
    let Value::Object(map) = value else {
        return Err(CryptoError::MalformedRecord(
            "record must be a JSON object".into(),
        ));
    };

    let (encrypted, iv) = match (string_field(&map, "encrypted")?, string_field(&map, "iv")?) {
        (Some(encrypted), Some(iv)) => (encrypted, iv),
        _ => {
            return Err(CryptoError::MalformedRecord(
                "missing 'encrypted' or 'iv' field".into(),
            ))
        }
    };

    match string_field(&map, "salt")? {
        Some(salt) => Ok(ParsedRecord::Current(EncryptedRecord {
            ciphertext: decode_field("encrypted", &encrypted)?,
            iv: decode_fixed("iv", &iv)?,
            salt: decode_fixed("salt", &salt)?,
        })),
        None => {
            let blob = decode_field("encrypted", &encrypted)?;
            if blob.len() <= LEGACY_IV_END {
                return Err(CryptoError::MalformedRecord(format!(
                    "legacy blob too short: {} bytes",
                    blob.len()
                )));
            }
            Ok(ParsedRecord::Legacy(LegacyEncryptedRecord {
                blob,
                declared_iv: iv,
            }))
        }
    }
}

/// Whether `raw` looks like an encrypted record in either format.
pub fn is_encrypted_record(raw: &str) -> bool {
    parse(raw).is_ok()
}
