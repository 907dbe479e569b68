//! Authenticated symmetric encryption for configuration values.
//! Values are stored as `base64(nonce || ciphertext || tag)` so they fit on a
//! single line of any key/value source.

use std::fmt;
use std::marker::PhantomData;

use aes_gcm::aead::generic_array::typenum::Unsigned;
use aes_gcm::aead::{Aead, AeadCore, KeyInit, Nonce};
use aes_gcm::Aes256Gcm;
use base64::{engine::general_purpose::STANDARD, Engine};
use chacha20poly1305::ChaCha20Poly1305;
use rand::rngs::OsRng;
use zeroize::Zeroize;

use super::{CryptoError, Decrypter, Encrypter};

/// Required key size in bytes for every supported cipher.
pub const KEY_LEN: usize = 32;

/// AEAD cipher `C` bound to a 256-bit key.
pub struct SymmetricCrypto<C> {
    key: [u8; KEY_LEN],
    cipher: PhantomData<fn() -> C>,
}

/// AES-256-GCM.
pub type AesGcmCrypto = SymmetricCrypto<Aes256Gcm>;
/// ChaCha20-Poly1305.
pub type ChaChaCrypto = SymmetricCrypto<ChaCha20Poly1305>;

impl<C> SymmetricCrypto<C>
where
    C: Aead + AeadCore + KeyInit,
{
    /// Builds a cipher from raw key bytes. The key must be exactly 32 bytes.
    pub fn from_key_bytes(key_bytes: &[u8]) -> Result<Self, CryptoError> {
        if key_bytes.len() != KEY_LEN {
            return Err(CryptoError::InvalidKeyLength(key_bytes.len()));
        }
        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(key_bytes);
        Ok(Self {
            key,
            cipher: PhantomData,
        })
    }

    /// Uses the UTF-8 bytes of a 32 byte secret string as the key.
    pub fn from_secret(secret: &str) -> Result<Self, CryptoError> {
        Self::from_key_bytes(secret.as_bytes())
    }

    /// Reads the secret string from an environment variable.
    pub fn from_env_var(var: &str) -> Result<Self, CryptoError> {
        let mut secret = std::env::var(var)
            .map_err(|e| CryptoError::KeySourceUnreadable(format!("{var}: {e}")))?;
        let crypto = Self::from_secret(&secret);
        secret.zeroize();
        crypto
    }

    /// Nonce length in bytes, which is also the minimum decodable input.
    pub fn nonce_size() -> usize {
        <<C as AeadCore>::NonceSize as Unsigned>::USIZE
    }

    fn cipher(&self) -> Result<C, CryptoError> {
        C::new_from_slice(&self.key).map_err(|_| CryptoError::InvalidKeyLength(self.key.len()))
    }
}

impl<C> Encrypter for SymmetricCrypto<C>
where
    C: Aead + AeadCore + KeyInit,
{
    fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let cipher = self.cipher()?;
        let nonce = C::generate_nonce(&mut OsRng);

        let sealed = cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| CryptoError::EncryptionFailed(format!("{e}")))?;

        let mut combined = Vec::with_capacity(nonce.len() + sealed.len());
        combined.extend_from_slice(&nonce);
        combined.extend_from_slice(&sealed);
        Ok(STANDARD.encode(combined))
    }
}

impl<C> Decrypter for SymmetricCrypto<C>
where
    C: Aead + AeadCore + KeyInit,
{
    fn decrypt(&self, ciphertext: &str) -> Result<String, CryptoError> {
        let combined = STANDARD
            .decode(ciphertext.as_bytes())
            .map_err(|e| CryptoError::Base64DecodeFailed(format!("{e}")))?;

        let nonce_size = Self::nonce_size();
        if combined.len() < nonce_size {
            return Err(CryptoError::CiphertextTooShort);
        }
        let (nonce, sealed) = combined.split_at(nonce_size);

        let plaintext = self
            .cipher()?
            .decrypt(Nonce::<C>::from_slice(nonce), sealed)
            .map_err(|e| CryptoError::DecryptionFailed(format!("{e}")))?;

        String::from_utf8(plaintext).map_err(|e| CryptoError::Utf8(format!("{e}")))
    }
}

impl<C> fmt::Debug for SymmetricCrypto<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymmetricCrypto")
            .field("cipher", &std::any::type_name::<C>())
            .field("key", &"<redacted>")
            .finish()
    }
}

impl<C> Drop for SymmetricCrypto<C> {
    fn drop(&mut self) {
        // Zero the key material on drop to reduce its lifetime in memory.
        self.key.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::{AesGcmCrypto, ChaChaCrypto};
    use crate::crypto::{CryptoError, Decrypter, Encrypter};
    use base64::{engine::general_purpose::STANDARD, Engine};

    const TEST_KEY: &str = "12345678901234567890123456789012";

    #[test]
    fn encrypts_and_decrypts_round_trip() {
        let crypto = AesGcmCrypto::from_secret(TEST_KEY).expect("key should be valid");
        let sealed = crypto
            .encrypt("super-secret-value")
            .expect("encryption should succeed");
        let plaintext = crypto.decrypt(&sealed).expect("decryption should succeed");
        assert_eq!(plaintext, "super-secret-value");
    }

    #[test]
    fn round_trips_empty_and_unicode_plaintext() {
        let crypto = ChaChaCrypto::from_secret(TEST_KEY).expect("key should be valid");
        for plaintext in ["", "pässwörd ✓", "a,b,c"] {
            let sealed = crypto.encrypt(plaintext).expect("encryption should succeed");
            assert_eq!(crypto.decrypt(&sealed).expect("decryption should succeed"), plaintext);
        }
    }

    #[test]
    fn encryption_uses_fresh_nonces() {
        let crypto = AesGcmCrypto::from_secret(TEST_KEY).expect("key should be valid");
        let first = crypto.encrypt("same").expect("encrypt");
        let second = crypto.encrypt("same").expect("encrypt");
        assert_ne!(first, second);
        assert_eq!(crypto.decrypt(&first).unwrap(), "same");
        assert_eq!(crypto.decrypt(&second).unwrap(), "same");
    }

    #[test]
    fn output_is_nonce_then_sealed_payload() {
        let crypto = AesGcmCrypto::from_secret(TEST_KEY).expect("key should be valid");
        let sealed = crypto.encrypt("abcd").expect("encrypt");
        let raw = STANDARD.decode(sealed).expect("standard base64");
        // 12 byte nonce, 4 byte payload, 16 byte tag
        assert_eq!(AesGcmCrypto::nonce_size(), 12);
        assert_eq!(raw.len(), 12 + 4 + 16);
    }

    #[test]
    fn rejects_bad_keys() {
        let err = AesGcmCrypto::from_secret("invalid-key").unwrap_err();
        assert!(matches!(err, CryptoError::InvalidKeyLength(11)));
        assert!(AesGcmCrypto::from_key_bytes(&[1u8; 33]).is_err());
        assert!(ChaChaCrypto::from_key_bytes(&[]).is_err());
    }

    #[test]
    fn rejects_invalid_base64() {
        let crypto = AesGcmCrypto::from_secret(TEST_KEY).unwrap();
        let err = crypto.decrypt("something that isn't base64").unwrap_err();
        assert!(format!("{err}").contains("base64 decode failed"));
    }

    #[test]
    fn rejects_input_shorter_than_nonce() {
        let crypto = AesGcmCrypto::from_secret(TEST_KEY).unwrap();
        let eleven_bytes = STANDARD.encode([0u8; 11]);
        for short in ["", "dGVzdA==", eleven_bytes.as_str()] {
            let err = crypto.decrypt(short).unwrap_err();
            assert!(format!("{err}").contains("ciphertext too short"), "{short}");
        }
    }

    #[test]
    fn rejects_tampered_or_foreign_ciphertext() {
        let crypto = AesGcmCrypto::from_secret(TEST_KEY).unwrap();
        let mut raw = STANDARD.decode(crypto.encrypt("payload").unwrap()).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;
        let err = crypto.decrypt(&STANDARD.encode(&raw)).unwrap_err();
        assert!(format!("{err}").contains("decryption failed"));

        let other = AesGcmCrypto::from_secret("abcdefghijklmnopqrstuvwxyz012345").unwrap();
        let sealed = crypto.encrypt("payload").unwrap();
        assert!(matches!(other.decrypt(&sealed), Err(CryptoError::DecryptionFailed(_))));
    }

    #[test]
    fn reads_secret_from_environment() {
        let var = "CONFIG_PROVIDER_TEST_SECRET";
        std::env::set_var(var, TEST_KEY);
        let crypto = AesGcmCrypto::from_env_var(var).expect("valid key");
        let sealed = crypto.encrypt("from-env").unwrap();
        assert_eq!(crypto.decrypt(&sealed).unwrap(), "from-env");

        let err = AesGcmCrypto::from_env_var("CONFIG_PROVIDER_TEST_UNSET_SECRET").unwrap_err();
        assert!(matches!(err, CryptoError::KeySourceUnreadable(_)));
    }

    #[test]
    fn debug_output_hides_the_key() {
        let crypto = AesGcmCrypto::from_secret(TEST_KEY).unwrap();
        assert!(!format!("{crypto:?}").contains(TEST_KEY));
    }
}
