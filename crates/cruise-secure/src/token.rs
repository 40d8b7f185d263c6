//! Self-describing ciphertext envelopes

use crate::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Prefix carried by every token produced by the current cipher.
pub const AES_PREFIX: &str = "AES";

/// A parsed ciphertext token.
///
/// Current tokens have the shape `AES:<base64 iv>:<base64 ciphertext>`.
/// Legacy tokens are a bare base64 block with no prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Aes { iv: Vec<u8>, ciphertext: Vec<u8> },
    Legacy { ciphertext: Vec<u8> },
}

/// Remove whitespace and line breaks introduced by historical document formatting.
pub fn normalize(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

impl Token {
    /// Parse a raw token, stripping whitespace first.
    pub fn parse(raw: &str) -> Result<Self> {
        let token = normalize(raw);
        if token.is_empty() {
            return Err(Error::UnknownEnvelope { token });
        }

        match token.split_once(':') {
            Some((prefix, rest)) if prefix == AES_PREFIX => {
                let (iv, ciphertext) = rest
                    .split_once(':')
                    .ok_or_else(|| Error::UnknownEnvelope {
                        token: token.clone(),
                    })?;
                let iv = decode(iv)?;
                if iv.len() != 16 {
                    return Err(Error::decryption(format!(
                        "initialization vector must be 16 bytes, got {}",
                        iv.len()
                    )));
                }
                Ok(Token::Aes {
                    iv,
                    ciphertext: decode(ciphertext)?,
                })
            }
            Some(_) => Err(Error::UnknownEnvelope { token }),
            None => {
                let ciphertext = decode(&token)?;
                if ciphertext.is_empty() || ciphertext.len() % 8 != 0 {
                    return Err(Error::UnknownEnvelope { token });
                }
                Ok(Token::Legacy { ciphertext })
            }
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, Token::Legacy { .. })
    }

    /// Render the token back to its textual envelope.
    pub fn encode(&self) -> String {
        match self {
            Token::Aes { iv, ciphertext } => format!(
                "{}:{}:{}",
                AES_PREFIX,
                STANDARD.encode(iv),
                STANDARD.encode(ciphertext)
            ),
            Token::Legacy { ciphertext } => STANDARD.encode(ciphertext),
        }
    }
}

/// Returns true when `raw` looks like a legacy token, without decrypting it.
pub fn is_legacy_token(raw: &str) -> bool {
    Token::parse(raw).map(|t| t.is_legacy()).unwrap_or(false)
}

fn decode(part: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(part)
        .map_err(|e| Error::decryption(format!("invalid base64: {}", e)))
}
