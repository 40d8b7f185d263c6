//! Encryption and decryption of secure values

use crate::keys::{AesKey, DesKey};
use crate::token::{self, Token};
use crate::{Error, Result};
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use rand::RngCore;

type AesCbcEnc = cbc::Encryptor<aes::Aes128>;
type AesCbcDec = cbc::Decryptor<aes::Aes128>;
type DesCbcEnc = cbc::Encryptor<des::Des>;
type DesCbcDec = cbc::Decryptor<des::Des>;

/// Process-wide cipher for secure configuration values.
///
/// Holds the current AES key and the legacy DES key. The struct is plain
/// data: clone it or share it behind an `Arc`, it needs no locking.
#[derive(Debug, Clone)]
pub struct SecureCipher {
    aes: AesKey,
    des: DesKey,
}

impl SecureCipher {
    pub fn new(aes: AesKey, des: DesKey) -> Self {
        Self { aes, des }
    }

    /// Cipher using `aes` and the built-in legacy key.
    pub fn with_aes_key(aes: AesKey) -> Self {
        Self::new(aes, DesKey::default())
    }

    /// Cipher with a freshly generated AES key.
    pub fn generate() -> Self {
        Self::with_aes_key(AesKey::generate())
    }

    pub fn aes_key(&self) -> &AesKey {
        &self.aes
    }

    /// Encrypt `plaintext` under a random IV. The same input yields different tokens.
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let mut iv = [0u8; 16];
        rand::rng().fill_bytes(&mut iv);

        let ciphertext = AesCbcEnc::new_from_slices(self.aes.as_bytes(), &iv)
            .map_err(|e| Error::Encryption {
                message: e.to_string(),
            })?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

        Ok(Token::Aes {
            iv: iv.to_vec(),
            ciphertext,
        }
        .encode())
    }

    /// Decrypt a current or legacy token.
    pub fn decrypt(&self, raw: &str) -> Result<String> {
        let plain = match Token::parse(raw)? {
            Token::Aes { iv, ciphertext } => AesCbcDec::new_from_slices(self.aes.as_bytes(), &iv)
                .map_err(|e| Error::decryption(e.to_string()))?
                .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
                .map_err(|_| Error::decryption("bad padding, wrong key or corrupt token"))?,
            Token::Legacy { ciphertext } => {
                DesCbcDec::new_from_slices(self.des.as_bytes(), &[0u8; 8])
                    .map_err(|e| Error::decryption(e.to_string()))?
                    .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
                    .map_err(|_| Error::decryption("bad padding in legacy token"))?
            }
        };

        String::from_utf8(plain).map_err(|_| Error::decryption("plaintext is not valid UTF-8"))
    }

    /// Produce a legacy token. Only historical fixtures need this.
    pub fn encrypt_legacy(&self, plaintext: &str) -> Result<String> {
        let ciphertext = DesCbcEnc::new_from_slices(self.des.as_bytes(), &[0u8; 8])
            .map_err(|e| Error::Encryption {
                message: e.to_string(),
            })?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());
        Ok(Token::Legacy { ciphertext }.encode())
    }

    /// Re-encrypt a legacy token under the current cipher.
    ///
    /// Current tokens are returned normalized but otherwise unchanged.
    pub fn reencrypt(&self, raw: &str) -> Result<String> {
        let normalized = token::normalize(raw);
        if Token::parse(&normalized)?.is_legacy() {
            tracing::debug!("Re-encrypting legacy token");
            let plaintext = self.decrypt(&normalized)?;
            self.encrypt(&plaintext)
        } else {
            Ok(normalized)
        }
    }

    /// Compare two tokens by their plaintext.
    pub fn same_secret(&self, a: &str, b: &str) -> Result<bool> {
        Ok(self.decrypt(a)? == self.decrypt(b)?)
    }
}
