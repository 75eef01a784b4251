//! PBKDF2-HMAC-SHA256 key derivation.
//!
//! Two stages:
//! 1. master = PBKDF2(password = "{identity}:{passphrase}", salt = identity)
//! 2. per-record key = PBKDF2(password = master, salt = random 32-byte record salt)
//!
//! Both stages use `PBKDF2_ITERATIONS` and a 32-byte output.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::CryptoError;
use crate::types::{KeyMaterial, IV_LENGTH, KEY_LENGTH, PBKDF2_ITERATIONS, SALT_LENGTH};

fn pbkdf2_sha256(password: &[u8], salt: &[u8]) -> KeyMaterial {
    let mut out = [0u8; KEY_LENGTH];
    pbkdf2_hmac::<Sha256>(password, salt, PBKDF2_ITERATIONS, &mut out);
    let key = KeyMaterial::from_bytes(out);
    zeroize::Zeroize::zeroize(&mut out);
    key
}

/// Derive the per-identity master key material.
///
/// Deterministic. Fails with `InvalidInput` if either argument is empty.
pub fn derive_master_key_material(
    identity: &str,
    passphrase: &str,
) -> Result<KeyMaterial, CryptoError> {
    if identity.is_empty() {
        return Err(CryptoError::InvalidInput("identity must not be empty".into()));
    }
    if passphrase.is_empty() {
        return Err(CryptoError::InvalidInput("passphrase must not be empty".into()));
    }

    let combined = Zeroizing::new(format!("{}:{}", identity, passphrase));
    Ok(pbkdf2_sha256(combined.as_bytes(), identity.as_bytes()))
}

/// Derive the AES key for a single record from the master key material.
///
/// # Arguments
/// * `master` - Output of [`derive_master_key_material`]
/// * `salt` - The record's salt (exactly 32 bytes)
pub fn derive_per_record_key(master: &KeyMaterial, salt: &[u8]) -> Result<KeyMaterial, CryptoError> {
    if salt.len() != SALT_LENGTH {
        return Err(CryptoError::InvalidInput(format!(
            "salt must be {} bytes, got {}",
            SALT_LENGTH,
            salt.len()
        )));
    }
    Ok(pbkdf2_sha256(master.as_bytes(), salt))
}

/// Generate a random 32-byte record salt.
pub fn generate_salt() -> Result<[u8; SALT_LENGTH], CryptoError> {
    let mut salt = [0u8; SALT_LENGTH];
    getrandom::getrandom(&mut salt).map_err(|e| CryptoError::RngFailed(e.to_string()))?;
    Ok(salt)
}

/// Generate a random 16-byte CBC IV.
pub fn generate_iv() -> Result<[u8; IV_LENGTH], CryptoError> {
    let mut iv = [0u8; IV_LENGTH];
    getrandom::getrandom(&mut iv).map_err(|e| CryptoError::RngFailed(e.to_string()))?;
    Ok(iv)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE_MASTER: &str = "4af3572b4140500db89615cd78cac6d5afd65e6705af176fccf4920da3b2334c";

    #[test]
    fn master_key_known_vector() {
        let master = derive_master_key_material("alice@example.com", "correct-horse-battery").unwrap();
        assert_eq!(hex::encode(master.as_bytes()), ALICE_MASTER);
    }

    #[test]
    fn per_record_key_known_vector() {
        let master = derive_master_key_material("alice@example.com", "correct-horse-battery").unwrap();
        let key = derive_per_record_key(&master, &[7u8; 32]).unwrap();
        assert_eq!(
            hex::encode(key.as_bytes()),
            "e62d3680f4404ab55ee7fe51b3413002537041c2f8efb642aff2dab20c2a4d56"
        );
    }

    #[test]
    fn master_key_is_deterministic() {
        let a = derive_master_key_material("bob", "hunter2").unwrap();
        let b = derive_master_key_material("bob", "hunter2").unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn same_passphrase_different_identities() {
        let a = derive_master_key_material("alice@example.com", "shared").unwrap();
        let b = derive_master_key_material("bob@example.com", "shared").unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn different_salts_different_keys() {
        let master = derive_master_key_material("bob", "hunter2").unwrap();
        let a = derive_per_record_key(&master, &[1u8; 32]).unwrap();
        let b = derive_per_record_key(&master, &[2u8; 32]).unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn per_record_key_differs_from_master() {
        let master = derive_master_key_material("bob", "hunter2").unwrap();
        let key = derive_per_record_key(&master, &[1u8; 32]).unwrap();
        assert_ne!(master.as_bytes(), key.as_bytes());
    }

    #[test]
    fn empty_identity_rejected() {
        let err = derive_master_key_material("", "pass").unwrap_err();
        assert!(matches!(err, CryptoError::InvalidInput(_)));
    }

    #[test]
    fn empty_passphrase_rejected() {
        let err = derive_master_key_material("alice", "").unwrap_err();
        assert!(matches!(err, CryptoError::InvalidInput(_)));
    }

    #[test]
    fn wrong_salt_length_rejected() {
        let master = derive_master_key_material("bob", "hunter2").unwrap();
        assert!(matches!(
            derive_per_record_key(&master, &[0u8; 16]),
            Err(CryptoError::InvalidInput(_))
        ));
        assert!(matches!(
            derive_per_record_key(&master, &[0u8; 33]),
            Err(CryptoError::InvalidInput(_))
        ));
    }

    #[test]
    fn random_values_are_unique() {
        assert_ne!(generate_salt().unwrap(), generate_salt().unwrap());
        assert_ne!(generate_iv().unwrap(), generate_iv().unwrap());
    }
}
