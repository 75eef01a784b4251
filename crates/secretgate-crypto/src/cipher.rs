//! AES-256-CBC with PKCS#7 padding.
//!
//! CBC carries no authentication tag. A wrong key is detected only through
//! padding validation or invalid UTF-8, so every decrypt failure collapses into
//! the single `DecryptionFailed` signal.

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::Aes256;
use zeroize::Zeroize;

use crate::error::CryptoError;
use crate::types::{KeyMaterial, BLOCK_SIZE, IV_LENGTH};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Encrypt a UTF-8 string.
///
/// Returns the raw ciphertext (a non-zero multiple of 16 bytes).
pub fn encrypt(plaintext: &str, key: &KeyMaterial, iv: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if iv.len() != IV_LENGTH {
        return Err(CryptoError::InvalidInput(format!(
            "iv must be {} bytes, got {}",
            IV_LENGTH,
            iv.len()
        )));
    }
    let cipher = Aes256CbcEnc::new_from_slices(key.as_bytes(), iv)
        .map_err(|e| CryptoError::InvalidInput(e.to_string()))?;
    Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes()))
}

/// Decrypt ciphertext produced by [`encrypt`].
pub fn decrypt(ciphertext: &[u8], key: &KeyMaterial, iv: &[u8]) -> Result<String, CryptoError> {
    if iv.len() != IV_LENGTH {
        return Err(CryptoError::DecryptionFailed);
    }
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(CryptoError::DecryptionFailed);
    }

    let cipher = Aes256CbcDec::new_from_slices(key.as_bytes(), iv)
        .map_err(|_| CryptoError::DecryptionFailed)?;
    let plaintext = cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CryptoError::DecryptionFailed)?;

    String::from_utf8(plaintext).map_err(|e| {
        e.into_bytes().zeroize();
        CryptoError::DecryptionFailed
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn random_key() -> KeyMaterial {
        let mut key = [0u8; 32];
        getrandom::getrandom(&mut key).unwrap();
        KeyMaterial::from_bytes(key)
    }

    fn fixed_key() -> KeyMaterial {
        let bytes: [u8; 32] =
            hex::decode("e62d3680f4404ab55ee7fe51b3413002537041c2f8efb642aff2dab20c2a4d56")
                .unwrap()
                .try_into()
                .unwrap();
        KeyMaterial::from_bytes(bytes)
    }

    #[test]
    fn known_vector() {
        let ct = encrypt("sk_live_12345", &fixed_key(), &[9u8; 16]).unwrap();
        assert_eq!(hex::encode(&ct), "ed14cf1ea510080ab1ad80d5291e624a");
        assert_eq!(decrypt(&ct, &fixed_key(), &[9u8; 16]).unwrap(), "sk_live_12345");
    }

    #[test]
    fn empty_plaintext_is_one_padding_block() {
        let key = KeyMaterial::from_bytes([0x42; 32]);
        let ct = encrypt("", &key, &[9u8; 16]).unwrap();
        assert_eq!(hex::encode(&ct), "18f824b6630788ed7fa8cc5866089ef0");
        assert_eq!(decrypt(&ct, &key, &[9u8; 16]).unwrap(), "");
    }

    #[test]
    fn round_trip_multi_block_unicode() {
        let key = random_key();
        let iv = [3u8; 16];
        let plaintext = "ключ-🔑-".repeat(40);
        let ct = encrypt(&plaintext, &key, &iv).unwrap();
        assert_eq!(ct.len() % BLOCK_SIZE, 0);
        assert_eq!(decrypt(&ct, &key, &iv).unwrap(), plaintext);
    }

    #[test]
    fn exact_block_gets_full_padding_block() {
        let key = random_key();
        let ct = encrypt(&"a".repeat(16), &key, &[0u8; 16]).unwrap();
        assert_eq!(ct.len(), 32);
    }

    #[test]
    fn encrypt_rejects_bad_iv_length() {
        let err = encrypt("x", &random_key(), &[0u8; 12]).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidInput(_)));
    }

    #[test]
    fn wrong_key_fails() {
        let iv = [5u8; 16];
        let ct = encrypt("sk_live_12345", &random_key(), &iv).unwrap();
        // A wrong key occasionally yields valid padding; the UTF-8 check catches
        // most of the rest. Over many keys, every result must be an error or
        // never equal the original plaintext.
        for _ in 0..32 {
            match decrypt(&ct, &random_key(), &iv) {
                Err(e) => assert_eq!(e, CryptoError::DecryptionFailed),
                Ok(pt) => assert_ne!(pt, "sk_live_12345"),
            }
        }
    }

    #[test]
    fn failure_causes_are_indistinguishable() {
        let key = fixed_key();
        let iv = [9u8; 16];
        let ct = encrypt("sk_live_12345", &key, &iv).unwrap();

        let bad_iv = decrypt(&ct, &key, &[0u8; 8]).unwrap_err();
        let bad_len = decrypt(&ct[..15], &key, &iv).unwrap_err();
        let empty = decrypt(&[], &key, &iv).unwrap_err();
        let mut tampered = ct.clone();
        tampered[15] ^= 0xff;
        let bad_pad = decrypt(&tampered, &key, &iv).unwrap_err();

        for err in [&bad_iv, &bad_len, &empty, &bad_pad] {
            assert_eq!(*err, CryptoError::DecryptionFailed);
            assert_eq!(err.to_string(), bad_iv.to_string());
        }
    }
}
