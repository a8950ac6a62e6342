//! Field cipher: AES-128-CBC with PKCS#7 padding.
//!
//! Every protected field gets its own [`FieldKeyMaterial`]; it is never reused
//! across fields or across protect calls.

use aes::Aes128;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use getrandom::getrandom;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CryptoOp, Error, Result, Scope};
use crate::wire::{FIELD_KEY_BYTES, IV_BYTES};

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;

/// One-time key + IV for a single field.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct FieldKeyMaterial {
    key: [u8; FIELD_KEY_BYTES],
    iv: [u8; IV_BYTES],
}

impl FieldKeyMaterial {
    /// Draw a fresh key and IV from the OS CSPRNG.
    pub fn generate(scope: &Scope) -> Result<Self> {
        let mut material = Self {
            key: [0u8; FIELD_KEY_BYTES],
            iv: [0u8; IV_BYTES],
        };
        getrandom(&mut material.key).map_err(|_| Error::crypto(CryptoOp::Randomness, scope.clone()))?;
        getrandom(&mut material.iv).map_err(|_| Error::crypto(CryptoOp::Randomness, scope.clone()))?;
        Ok(material)
    }

    pub fn key(&self) -> &[u8; FIELD_KEY_BYTES] {
        &self.key
    }

    pub fn iv(&self) -> &[u8; IV_BYTES] {
        &self.iv
    }
}

/// Encrypt path. The cipher borrows the key in place.
pub fn encrypt(material: &FieldKeyMaterial, plaintext: &[u8], scope: &Scope) -> Result<Vec<u8>> {
    let cipher = Aes128CbcEnc::new_from_slices(&material.key, &material.iv)
        .map_err(|_| Error::crypto(CryptoOp::Encrypt, scope.clone()))?;
    Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

/// Decrypt path. Wrong key sizes and bad padding both surface as a crypto error.
pub fn decrypt(key: &[u8], iv: &[u8], ciphertext: &[u8], scope: &Scope) -> Result<Vec<u8>> {
    let cipher = Aes128CbcDec::new_from_slices(key, iv)
        .map_err(|_| Error::crypto(CryptoOp::Decrypt, scope.clone()))?;
    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| Error::crypto(CryptoOp::Decrypt, scope.clone()))
}
