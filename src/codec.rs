//! Versioned authenticated encryption of cookie values
//!
//! Values are sealed with AES-GCM under a 128, 192 or 256-bit key. The text
//! form is the version tag `v01` followed by the standard base64 encoding of
//! `nonce || ciphertext || tag`:
//!
//! ```text
//! v01 + base64(nonce[12] || ciphertext || tag[16])
//! ```
//!
//! A fresh nonce is drawn from the operating system RNG for every call, so the
//! same plaintext never produces the same text twice.

use aes_gcm::aead::consts::U12;
use aes_gcm::aead::{Aead, KeyInit, Nonce};
use aes_gcm::aes::Aes192;
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm};
use base64::{engine::general_purpose, Engine as _};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

type Aes192Gcm = AesGcm<Aes192, U12>;

/// Version tag prefixed to every encrypted value
pub const VERSION_TAG: &str = "v01";

/// AES-GCM nonce length in bytes
pub const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length in bytes
const TAG_LEN: usize = 16;

/// Errors produced while sealing or opening a value
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("invalid key size {0} (expected 16, 24 or 32 bytes)")]
    InvalidKeySize(usize),

    #[error("key is not valid hex")]
    InvalidKeyHex,

    #[error("invalid value: missing {VERSION_TAG} version tag")]
    InvalidValue,

    #[error("base64 decode error: {0}")]
    Base64(String),

    #[error("encrypted value too short ({0} bytes)")]
    Truncated(usize),

    #[error("authentication failed (wrong key or tampered data)")]
    Authentication,

    #[error("sealing value failed")]
    Seal,
}

impl From<base64::DecodeError> for CodecError {
    fn from(err: base64::DecodeError) -> Self {
        Self::Base64(err.to_string())
    }
}

/// AES variant selected by key length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeySize {
    Aes128,
    Aes192,
    Aes256,
}

impl KeySize {
    fn of(key: &[u8]) -> Result<Self, CodecError> {
        match key.len() {
            16 => Ok(Self::Aes128),
            24 => Ok(Self::Aes192),
            32 => Ok(Self::Aes256),
            n => Err(CodecError::InvalidKeySize(n)),
        }
    }
}

fn seal<C: KeyInit + Aead>(key: &[u8], nonce: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CodecError> {
    let cipher = C::new_from_slice(key).map_err(|_| CodecError::InvalidKeySize(key.len()))?;
    cipher
        .encrypt(Nonce::<C>::from_slice(nonce), plaintext)
        .map_err(|_| CodecError::Seal)
}

fn open<C: KeyInit + Aead>(key: &[u8], nonce: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CodecError> {
    let cipher = C::new_from_slice(key).map_err(|_| CodecError::InvalidKeySize(key.len()))?;
    cipher
        .decrypt(Nonce::<C>::from_slice(nonce), ciphertext)
        .map_err(|_| CodecError::Authentication)
}

/// Encrypt `plaintext` under `key`, returning the versioned text form
pub fn encrypt(plaintext: &[u8], key: &[u8]) -> Result<String, CodecError> {
    let size = KeySize::of(key)?;

    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    let sealed = match size {
        KeySize::Aes128 => seal::<Aes128Gcm>(key, &nonce, plaintext)?,
        KeySize::Aes192 => seal::<Aes192Gcm>(key, &nonce, plaintext)?,
        KeySize::Aes256 => seal::<Aes256Gcm>(key, &nonce, plaintext)?,
    };

    let mut payload = Vec::with_capacity(NONCE_LEN + sealed.len());
    payload.extend_from_slice(&nonce);
    payload.extend_from_slice(&sealed);

    let mut text = String::with_capacity(VERSION_TAG.len() + (payload.len() + 2) / 3 * 4);
    text.push_str(VERSION_TAG);
    general_purpose::STANDARD.encode_string(&payload, &mut text);
    Ok(text)
}

/// Decrypt a value produced by [`encrypt`]
///
/// Never returns data that failed authentication.
pub fn decrypt(text: &str, key: &[u8]) -> Result<Vec<u8>, CodecError> {
    let encoded = text
        .strip_prefix(VERSION_TAG)
        .ok_or(CodecError::InvalidValue)?;
    let size = KeySize::of(key)?;

    let payload = general_purpose::STANDARD.decode(encoded)?;
    if payload.len() < NONCE_LEN + TAG_LEN {
        return Err(CodecError::Truncated(payload.len()));
    }
    let (nonce, ciphertext) = payload.split_at(NONCE_LEN);

    match size {
        KeySize::Aes128 => open::<Aes128Gcm>(key, nonce, ciphertext),
        KeySize::Aes192 => open::<Aes192Gcm>(key, nonce, ciphertext),
        KeySize::Aes256 => open::<Aes256Gcm>(key, nonce, ciphertext),
    }
}

/// A validated AES key, read-only once the jar is built
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionKey(Vec<u8>);

impl EncryptionKey {
    /// Wrap raw key bytes, rejecting anything but 16, 24 or 32 bytes
    pub fn new(bytes: Vec<u8>) -> Result<Self, CodecError> {
        KeySize::of(&bytes)?;
        Ok(Self(bytes))
    }

    /// Parse a hex-encoded key, ignoring surrounding whitespace
    pub fn from_hex(text: &str) -> Result<Self, CodecError> {
        let bytes = hex::decode(text.trim()).map_err(|_| CodecError::InvalidKeyHex)?;
        Self::new(bytes)
    }

    /// Generate a random key of `bits` (128, 192 or 256)
    pub fn generate(bits: u16) -> Result<Self, CodecError> {
        let mut bytes = vec![0u8; usize::from(bits / 8)];
        KeySize::of(&bytes)?;
        OsRng.fill_bytes(&mut bytes);
        Ok(Self(bytes))
    }

    /// Raw key bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Hex encoding of the key
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// SHA256 fingerprint of the key (first 12 hex chars)
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(&self.0);
        hex::encode(&digest[..6])
    }

    /// Encrypt a cookie value under this key
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CodecError> {
        encrypt(plaintext.as_bytes(), &self.0)
    }

    /// Decrypt a cookie value under this key
    pub fn decrypt(&self, text: &str) -> Result<String, CodecError> {
        let plain = decrypt(text, &self.0)?;
        String::from_utf8(plain).map_err(|_| CodecError::InvalidValue)
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncryptionKey({} bits, {})", self.0.len() * 8, self.fingerprint())
    }
}

impl Drop for EncryptionKey {
    fn drop(&mut self) {
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(len: usize, fill: u8) -> Vec<u8> {
        vec![fill; len]
    }

    #[test]
    fn roundtrip_all_key_sizes() {
        let plaintexts: [&[u8]; 4] = [b"", b"a", b"session=abc123; not really a cookie", &[0, 255, 7]];
        for len in [16, 24, 32] {
            let k = key(len, 0x42);
            for plaintext in plaintexts {
                let text = encrypt(plaintext, &k).unwrap();
                assert!(text.starts_with(VERSION_TAG));
                assert_eq!(decrypt(&text, &k).unwrap(), plaintext);
            }
        }
    }

    #[test]
    fn fresh_nonce_per_call() {
        let k = key(32, 1);
        let a = encrypt(b"same", &k).unwrap();
        let b = encrypt(b"same", &k).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn wrong_key_fails_authentication() {
        let text = encrypt(b"secret", &key(32, 1)).unwrap();
        assert_eq!(decrypt(&text, &key(32, 2)), Err(CodecError::Authentication));
    }

    #[test]
    fn tampered_ciphertext_fails_authentication() {
        let k = key(16, 9);
        let text = encrypt(b"secret value", &k).unwrap();
        let mut payload = general_purpose::STANDARD.decode(&text[3..]).unwrap();
        let last = payload.len() - 1;
        payload[last] ^= 0x01;
        let tampered = format!("{}{}", VERSION_TAG, general_purpose::STANDARD.encode(&payload));
        assert_eq!(decrypt(&tampered, &k), Err(CodecError::Authentication));
    }

    #[test]
    fn missing_version_tag_is_invalid_value() {
        let k = key(32, 1);
        assert_eq!(decrypt("plain-cookie", &k), Err(CodecError::InvalidValue));
        assert_eq!(decrypt("", &k), Err(CodecError::InvalidValue));
        let text = encrypt(b"x", &k).unwrap();
        assert_eq!(decrypt(&text.replacen("v01", "v02", 1), &k), Err(CodecError::InvalidValue));
    }

    #[test]
    fn invalid_key_sizes_rejected() {
        assert_eq!(encrypt(b"x", &key(15, 0)), Err(CodecError::InvalidKeySize(15)));
        assert_eq!(encrypt(b"x", &[]), Err(CodecError::InvalidKeySize(0)));
        let text = encrypt(b"x", &key(16, 0)).unwrap();
        assert_eq!(decrypt(&text, &key(20, 0)), Err(CodecError::InvalidKeySize(20)));
    }

    #[test]
    fn malformed_payloads() {
        let k = key(16, 0);
        assert!(matches!(decrypt("v01!!!not-base64", &k), Err(CodecError::Base64(_))));
        assert_eq!(decrypt("v01AAAA", &k), Err(CodecError::Truncated(3)));
    }

    #[test]
    fn key_from_hex_and_fingerprint() {
        let hex_key = "00112233445566778899aabbccddeeff";
        let k = EncryptionKey::from_hex(&format!("  {}\n", hex_key)).unwrap();
        assert_eq!(k.as_bytes().len(), 16);
        assert_eq!(k.to_hex(), hex_key);
        assert_eq!(k.fingerprint().len(), 12);
        assert!(EncryptionKey::from_hex("abcd").is_err());
        assert_eq!(EncryptionKey::from_hex("zz"), Err(CodecError::InvalidKeyHex));
    }

    #[test]
    fn generated_keys_work() {
        for bits in [128, 192, 256] {
            let k = EncryptionKey::generate(bits).unwrap();
            assert_eq!(k.as_bytes().len() * 8, usize::from(bits));
            let text = k.encrypt("value").unwrap();
            assert_eq!(k.decrypt(&text).unwrap(), "value");
        }
        assert!(EncryptionKey::generate(64).is_err());
    }

    #[test]
    fn debug_does_not_leak_key() {
        let k = EncryptionKey::new(vec![0xAB; 32]).unwrap();
        let debug = format!("{:?}", k);
        assert!(debug.contains("256 bits"));
        assert!(!debug.contains(&"ab".repeat(32)));
    }
}
