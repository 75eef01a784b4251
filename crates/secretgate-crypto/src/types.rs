use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

/// AES key length in bytes (256 bits). Also the PBKDF2 output length.
pub const KEY_LENGTH: usize = 32;

/// AES-CBC IV length in bytes (128 bits).
pub const IV_LENGTH: usize = 16;

/// Per-record key-derivation salt length in bytes (256 bits).
pub const SALT_LENGTH: usize = 32;

/// AES block size in bytes.
pub const BLOCK_SIZE: usize = 16;

/// PBKDF2 iteration count for both derivation stages.
///
/// Changing this breaks decryption of every record already written.
pub const PBKDF2_ITERATIONS: u32 = 10_000;

/// Legacy blob layout, in 32-bit words: salt occupies the key size (8 words),
/// the IV the block size (4 words), ciphertext the remainder.
pub const LEGACY_KEY_WORDS: usize = 8;
pub const LEGACY_IV_WORDS: usize = 4;

/// Size of a 32-bit word in bytes.
pub(crate) const WORD_SIZE: usize = 4;

/// Derived 256-bit key material. Zeroized on drop and never printed.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial([u8; KEY_LENGTH]);

impl KeyMaterial {
    pub fn from_bytes(bytes: [u8; KEY_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.0
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyMaterial(<redacted>)")
    }
}
