//! Property tests for the secure value ciphers

use cruise_secure::{AesKey, SecureCipher};
use proptest::prelude::*;

fn cipher() -> SecureCipher {
    SecureCipher::with_aes_key(AesKey::from_hex("a1b2c3d4e5f60718293a4b5c6d7e8f90").unwrap())
}

proptest! {
    #[test]
    fn test_encrypt_decrypt_roundtrip(plaintext in "\\PC*") {
        let c = cipher();
        let token = c.encrypt(&plaintext).unwrap();
        prop_assert!(token.starts_with("AES:"));
        prop_assert_eq!(c.decrypt(&token).unwrap(), plaintext);
    }

    #[test]
    fn test_legacy_reencrypt_preserves_plaintext(plaintext in "[ -~]{0,64}") {
        let c = cipher();
        let legacy = c.encrypt_legacy(&plaintext).unwrap();
        prop_assert_eq!(c.decrypt(&legacy).unwrap(), plaintext.clone());

        let current = c.reencrypt(&legacy).unwrap();
        prop_assert!(current.starts_with("AES:"));
        prop_assert_eq!(c.decrypt(&current).unwrap(), plaintext);
    }

    #[test]
    fn test_whitespace_in_token_is_ignored(plaintext in "[a-z]{1,32}", split in 1usize..20) {
        let c = cipher();
        let token = c.encrypt(&plaintext).unwrap();
        let at = split.min(token.len() - 1);
        let mangled = format!("\n  {}\n    {}  \n", &token[..at], &token[at..]);
        prop_assert_eq!(c.decrypt(&mangled).unwrap(), plaintext);
    }
}
