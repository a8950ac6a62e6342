//! RSA primitives: key wrap (public encrypt / private decrypt) and
//! seal (private-key transform / public-key recovery).
//!
//! Wrap:   RSAES-PKCS1-v1_5, randomized type-2 padding.
//! Seal:   EM = 0x00 || 0x01 || 0xFF.. (>= 8) || 0x00 || payload,  s = EM^d mod n
//! Unseal: EM = s^e mod n, then strict type-1 padding removal.
//!
//! Sealing authenticates a short payload (digest, timestamp) to any holder of
//! the issuer's public key; it does not hide it.

use rand_core::OsRng;
use rsa::hazmat::rsa_encrypt;
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, Pkcs1v15Encrypt, Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use zeroize::Zeroizing;

use crate::error::{CryptoOp, Error, Result, Scope};
use crate::wire::PKCS1_MIN_PS_BYTES;

/// Wrap `bytes` (a field key) for the holder of `recipient`'s private key.
pub fn wrap(recipient: &RsaPublicKey, bytes: &[u8], scope: &Scope) -> Result<Vec<u8>> {
    recipient
        .encrypt(&mut OsRng, Pkcs1v15Encrypt, bytes)
        .map_err(|_| Error::crypto(CryptoOp::Wrap, scope.clone()))
}

/// Recover wrapped bytes. Fails on a wrong key or corrupted ciphertext.
pub fn unwrap(recipient: &RsaPrivateKey, wrapped: &[u8], scope: &Scope) -> Result<Zeroizing<Vec<u8>>> {
    recipient
        .decrypt(Pkcs1v15Encrypt, wrapped)
        .map(Zeroizing::new)
        .map_err(|_| Error::crypto(CryptoOp::Unwrap, scope.clone()))
}

/// Transform `payload` with the issuer's private key.
pub fn seal(issuer: &RsaPrivateKey, payload: &[u8], scope: &Scope) -> Result<Vec<u8>> {
    issuer
        .sign_with_rng(&mut OsRng, Pkcs1v15Sign::new_unprefixed(), payload)
        .map_err(|_| Error::crypto(CryptoOp::Seal, scope.clone()))
}

/// Recover a sealed payload with the issuer's public key.
///
/// Any length, range or padding defect is reported as an unseal failure; a
/// wrong public key produces a padding defect.
pub fn unseal(issuer: &RsaPublicKey, sealed: &[u8], scope: &Scope) -> Result<Vec<u8>> {
    let fail = || Error::crypto(CryptoOp::Unseal, scope.clone());

    let k = issuer.size();
    if sealed.len() != k {
        return Err(fail());
    }

    let s = BigUint::from_bytes_be(sealed);
    if &s >= issuer.n() {
        return Err(fail());
    }

    let m = rsa_encrypt(issuer, &s).map_err(|_| fail())?;
    let m_bytes = m.to_bytes_be();
    if m_bytes.len() > k {
        return Err(fail());
    }

    let mut em = vec![0u8; k - m_bytes.len()];
    em.extend_from_slice(&m_bytes);

    strip_type1_padding(&em).map(<[u8]>::to_vec).ok_or_else(fail)
}

fn strip_type1_padding(em: &[u8]) -> Option<&[u8]> {
    if em.len() < 2 + PKCS1_MIN_PS_BYTES + 1 || em[0] != 0x00 || em[1] != 0x01 {
        return None;
    }
    let ps_len = em[2..].iter().take_while(|&&b| b == 0xFF).count();
    let sep = 2 + ps_len;
    if ps_len < PKCS1_MIN_PS_BYTES || sep >= em.len() || em[sep] != 0x00 {
        return None;
    }
    Some(&em[sep + 1..])
}
