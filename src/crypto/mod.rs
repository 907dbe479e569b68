//! Encryption capabilities used by the binder and the `lockbox` tool.
//!
//! The binder only needs a [`Decrypter`]. Concrete ciphers live in
//! [`symmetric`] and are selected by name through [`Algorithm`].

pub mod symmetric;

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

pub use symmetric::{AesGcmCrypto, ChaChaCrypto, SymmetricCrypto, KEY_LEN};

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid key length {0}; expected 32 bytes")]
    InvalidKeyLength(usize),
    #[error("key source unreadable: {0}")]
    KeySourceUnreadable(String),
    #[error("base64 decode failed: {0}")]
    Base64DecodeFailed(String),
    #[error("ciphertext too short")]
    CiphertextTooShort,
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),
    #[error("decryption failed: {0}")]
    DecryptionFailed(String),
    #[error("decrypted value is not valid utf-8: {0}")]
    Utf8(String),
    #[error("unsupported algorithm {0:?}")]
    UnsupportedAlgorithm(String),
    /// Failure reported by a decrypter implemented outside this crate.
    #[error("{0}")]
    Custom(String),
}

/// Turns ciphertext from a configuration source into plaintext.
pub trait Decrypter {
    fn decrypt(&self, ciphertext: &str) -> Result<String, CryptoError>;
}

/// Produces ciphertext that a matching [`Decrypter`] accepts.
pub trait Encrypter {
    fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError>;
}

/// Both directions of a cipher.
pub trait CryptoAlgorithm: Encrypter + Decrypter {}

impl<T: Encrypter + Decrypter + ?Sized> CryptoAlgorithm for T {}

impl<D: Decrypter + ?Sized> Decrypter for Box<D> {
    fn decrypt(&self, ciphertext: &str) -> Result<String, CryptoError> {
        (**self).decrypt(ciphertext)
    }
}

impl<E: Encrypter + ?Sized> Encrypter for Box<E> {
    fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        (**self).encrypt(plaintext)
    }
}

/// Ciphers selectable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    AesGcm,
    ChaCha20Poly1305,
}

impl Algorithm {
    pub const ALL: [Algorithm; 2] = [Algorithm::AesGcm, Algorithm::ChaCha20Poly1305];

    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::AesGcm => "aesgcm",
            Algorithm::ChaCha20Poly1305 => "chacha20poly1305",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Algorithm::AesGcm => "AES-GCM encryption with 256-bit key",
            Algorithm::ChaCha20Poly1305 => "ChaCha20-Poly1305 encryption with 256-bit key",
        }
    }

    /// Builds the cipher keyed with the raw bytes of `secret`.
    pub fn with_secret(&self, secret: &str) -> Result<Box<dyn CryptoAlgorithm + Send + Sync>, CryptoError> {
        Ok(match self {
            Algorithm::AesGcm => Box::new(AesGcmCrypto::from_secret(secret)?),
            Algorithm::ChaCha20Poly1305 => Box::new(ChaChaCrypto::from_secret(secret)?),
        })
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Algorithm::ALL
            .into_iter()
            .find(|algorithm| algorithm.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CryptoError::UnsupportedAlgorithm(s.to_string()))
    }
}
