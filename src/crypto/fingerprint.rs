//! Host key fingerprints
//!
//! SHA-256 over the raw public key, rendered OpenSSH style.

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use ed25519_dalek::VerifyingKey;
use sha2::{Digest, Sha256};
use std::fmt;

/// SHA-256 fingerprint of an Ed25519 public key
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Fingerprint a public key
    pub fn of(public_key: &VerifyingKey) -> Self {
        Self(Sha256::digest(public_key.as_bytes()).into())
    }

    /// Get raw digest bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SHA256:{}", STANDARD_NO_PAD.encode(self.0))
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::SigningKey;

    #[test]
    fn test_fingerprint_format() {
        let key = SigningKey::from_bytes(&[1u8; 32]).verifying_key();
        let rendered = Fingerprint::of(&key).to_string();

        assert!(rendered.starts_with("SHA256:"));
        // 32 bytes unpadded base64 = 43 chars
        assert_eq!(rendered.len(), "SHA256:".len() + 43);
        assert!(!rendered.ends_with('='));
    }

    #[test]
    fn test_fingerprint_is_sha256_of_public_key() {
        let key = SigningKey::from_bytes(&[3u8; 32]).verifying_key();
        let expected: [u8; 32] = Sha256::digest(key.as_bytes()).into();

        assert_eq!(Fingerprint::of(&key).as_bytes(), &expected);
    }

    #[test]
    fn test_fingerprint_tracks_key() {
        let a = SigningKey::from_bytes(&[1u8; 32]).verifying_key();
        let b = SigningKey::from_bytes(&[2u8; 32]).verifying_key();

        assert_eq!(Fingerprint::of(&a), Fingerprint::of(&a));
        assert_ne!(Fingerprint::of(&a), Fingerprint::of(&b));
    }
}
