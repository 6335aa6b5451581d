//! Password-based authenticated encryption of opaque blobs.
//!
//! Every call to [`encrypt`] draws a fresh 16-byte salt and 12-byte nonce, derives a
//! 256-bit key with PBKDF2-HMAC-SHA256 and seals the plaintext with ChaCha20-Poly1305.
//! The result is a single transportable token:
//!
//! ```text
//! base64(salt) "." base64(nonce) "." base64(ciphertext || tag)
//! ```
//!
//! Nothing derived from the password is ever returned or stored; callers keep the password
//! (see [`crate::vault::MasterSecret`]) and re-derive on every operation.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::Sha256;

use crate::{Error, Result};

/// Salt length in bytes.
pub const SALT_LEN: usize = 16;

/// Nonce length in bytes.
pub const NONCE_LEN: usize = 12;

/// Derived key length in bytes (256 bits).
pub const KEY_LEN: usize = 32;

/// PBKDF2 iteration count.
pub const KDF_ITERATIONS: u32 = 100_000;

const SEGMENT_DELIMITER: char = '.';

/// A key derived from a password and salt. Never serialized, never logged.
pub struct DerivedKey([u8; KEY_LEN]);

impl DerivedKey {
    fn cipher(&self) -> ChaCha20Poly1305 {
        ChaCha20Poly1305::new(Key::from_slice(&self.0))
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKey(<redacted>)")
    }
}

/// Derive a 256-bit key from `password` and `salt`.
pub fn derive_key(password: &str, salt: &[u8]) -> DerivedKey {
    let mut key = [0u8; KEY_LEN];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, KDF_ITERATIONS, &mut key);
    DerivedKey(key)
}

/// The three segments of a sealed token.
struct SealedToken {
    salt: [u8; SALT_LEN],
    nonce: [u8; NONCE_LEN],
    ciphertext: Vec<u8>,
}

impl SealedToken {
    fn encode(&self) -> String {
        format!(
            "{}{SEGMENT_DELIMITER}{}{SEGMENT_DELIMITER}{}",
            STANDARD.encode(self.salt),
            STANDARD.encode(self.nonce),
            STANDARD.encode(&self.ciphertext)
        )
    }

    fn parse(token: &str) -> Result<Self> {
        let segments: Vec<&str> = token.trim().split(SEGMENT_DELIMITER).collect();
        let [salt_b64, nonce_b64, ciphertext_b64] = segments.as_slice() else {
            return Err(Error::CorruptCiphertext(format!(
                "expected 3 segments, found {}",
                segments.len()
            )));
        };

        let salt = decode_fixed::<SALT_LEN>(salt_b64, "salt")?;
        let nonce = decode_fixed::<NONCE_LEN>(nonce_b64, "nonce")?;
        let ciphertext = STANDARD
            .decode(ciphertext_b64)
            .map_err(|e| Error::CorruptCiphertext(format!("ciphertext: {}", e)))?;

        Ok(Self {
            salt,
            nonce,
            ciphertext,
        })
    }
}

fn decode_fixed<const N: usize>(segment: &str, what: &str) -> Result<[u8; N]> {
    let bytes = STANDARD
        .decode(segment)
        .map_err(|e| Error::CorruptCiphertext(format!("{}: {}", what, e)))?;
    bytes.try_into().map_err(|bytes: Vec<u8>| {
        Error::CorruptCiphertext(format!(
            "{} must be {} bytes, got {}",
            what,
            N,
            bytes.len()
        ))
    })
}

/// Encrypt `plaintext` under `password` with a fresh salt and nonce.
pub fn encrypt(plaintext: &[u8], password: &str) -> Result<String> {
    let mut salt = [0u8; SALT_LEN];
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut salt);
    OsRng.fill_bytes(&mut nonce);

    let key = derive_key(password, &salt);
    let ciphertext = key
        .cipher()
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|e| Error::Other(format!("encryption failed: {}", e)))?;

    Ok(SealedToken {
        salt,
        nonce,
        ciphertext,
    }
    .encode())
}

/// Decrypt a token produced by [`encrypt`].
///
/// # Errors
/// - [`Error::CorruptCiphertext`] if the token is structurally malformed.
/// - [`Error::InvalidCredentials`] if authentication fails (wrong password or tampering).
pub fn decrypt(token: &str, password: &str) -> Result<Vec<u8>> {
    let sealed = SealedToken::parse(token)?;
    let key = derive_key(password, &sealed.salt);
    key.cipher()
        .decrypt(Nonce::from_slice(&sealed.nonce), sealed.ciphertext.as_slice())
        .map_err(|_| Error::InvalidCredentials)
}

/// Encrypt a UTF-8 string.
pub fn encrypt_str(plaintext: &str, password: &str) -> Result<String> {
    encrypt(plaintext.as_bytes(), password)
}

/// Decrypt a token whose plaintext is expected to be UTF-8.
pub fn decrypt_str(token: &str, password: &str) -> Result<String> {
    let bytes = decrypt(token, password)?;
    String::from_utf8(bytes)
        .map_err(|e| Error::CorruptCiphertext(format!("plaintext is not UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        for (plaintext, password) in [
            ("", "pw"),
            ("hello world", "correct horse battery staple"),
            ("{\"tasks\":[]}", "ünïcödé 🔑"),
        ] {
            let token = encrypt_str(plaintext, password).unwrap();
            assert_eq!(decrypt_str(&token, password).unwrap(), plaintext);
        }
    }

    #[test]
    fn test_wrong_password_is_invalid_credentials() {
        let token = encrypt_str("secret state", "password-one").unwrap();
        let err = decrypt_str(&token, "password-two").unwrap_err();
        assert!(matches!(err, Error::InvalidCredentials));
    }

    #[test]
    fn test_tampered_ciphertext_is_invalid_credentials() {
        let token = encrypt_str("secret state", "pw").unwrap();
        let mut parts: Vec<String> = token.split('.').map(String::from).collect();
        let mut ciphertext = STANDARD.decode(&parts[2]).unwrap();
        ciphertext[0] ^= 0x01;
        parts[2] = STANDARD.encode(ciphertext);
        let err = decrypt(&parts.join("."), "pw").unwrap_err();
        assert!(matches!(err, Error::InvalidCredentials));
    }

    #[test]
    fn test_fresh_salt_and_nonce_per_call() {
        let a = encrypt_str("same", "pw").unwrap();
        let b = encrypt_str("same", "pw").unwrap();
        assert_ne!(a, b);
        let salt_a = a.split('.').next().unwrap();
        let salt_b = b.split('.').next().unwrap();
        assert_ne!(salt_a, salt_b);
    }

    #[test]
    fn test_token_has_three_segments_with_expected_lengths() {
        let token = encrypt_str("x", "pw").unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(STANDARD.decode(parts[0]).unwrap().len(), SALT_LEN);
        assert_eq!(STANDARD.decode(parts[1]).unwrap().len(), NONCE_LEN);
    }

    #[test]
    fn test_malformed_token_is_corrupt_not_credentials() {
        for token in ["", "onlyone", "a.b", "a.b.c.d", "!!!.###.$$$"] {
            let err = decrypt(token, "pw").unwrap_err();
            assert!(
                matches!(err, Error::CorruptCiphertext(_)),
                "token {:?} gave {:?}",
                token,
                err
            );
        }
    }

    #[test]
    fn test_wrong_salt_length_rejected() {
        let token = format!(
            "{}.{}.{}",
            STANDARD.encode([0u8; 8]),
            STANDARD.encode([0u8; NONCE_LEN]),
            STANDARD.encode([0u8; 32])
        );
        assert!(matches!(
            decrypt(&token, "pw").unwrap_err(),
            Error::CorruptCiphertext(_)
        ));
    }

    #[test]
    fn test_derive_key_is_deterministic_per_salt() {
        let salt = [7u8; SALT_LEN];
        let a = derive_key("pw", &salt);
        let b = derive_key("pw", &salt);
        let c = derive_key("pw", &[8u8; SALT_LEN]);
        assert_eq!(a.0, b.0);
        assert_ne!(a.0, c.0);
    }

    #[test]
    fn test_debug_redacts_key() {
        let key = derive_key("pw", &[0u8; SALT_LEN]);
        assert_eq!(format!("{:?}", key), "DerivedKey(<redacted>)");
    }
}
