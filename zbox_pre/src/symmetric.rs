//! single-use AEAD cipher
//!
//! Key and nonce both come from one H2 output, so a given key material must
//! seal exactly one plaintext.

use aes_gcm::{
    aead::{consts::U12, Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};

use crate::error::{Error, Result};

pub const KEY_SIZE: usize = 32;
pub const NONCE_SIZE: usize = 12;
pub const TAG_SIZE: usize = 16;

/// Seals `plaintext` with empty associated data. Output is ciphertext ‖ tag.
pub(crate) fn seal(key_material: &[u8; 64], plaintext: &[u8]) -> Result<Vec<u8>> {
    cipher(key_material)
        .encrypt(nonce(key_material), plaintext)
        .map_err(|_| Error::Encrypt)
}

/// Opens a sealed blob, failing with [`Error::AuthFailed`] if the tag does not verify.
pub(crate) fn open(key_material: &[u8; 64], sealed: &[u8]) -> Result<Vec<u8>> {
    cipher(key_material)
        .decrypt(nonce(key_material), sealed)
        .map_err(|_| Error::AuthFailed)
}

fn cipher(key_material: &[u8; 64]) -> Aes256Gcm {
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_material[..KEY_SIZE]))
}

fn nonce(key_material: &[u8; 64]) -> &Nonce<U12> {
    Nonce::from_slice(&key_material[KEY_SIZE..KEY_SIZE + NONCE_SIZE])
}
