//! HostKey - Durable Ed25519 host identity
//!
//! This crate gives a server process a stable identity across restarts:
//! it generates an Ed25519 key pair on first run, stores the private key in
//! a PEM container with owner-only permissions, and reloads it afterwards.

pub mod crypto;
pub mod keystore;

pub use crypto::{derive_public, generate_keypair, verify_key_pair, Fingerprint, KeyPair};
pub use keystore::{
    load_or_create_host_key, load_private_key, persist_private_key, CorruptKeyPolicy, KeyStore,
    KeyStoreError, PRIVATE_KEY_LABEL,
};

use ed25519_dalek::VerifyingKey;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main error type for host key operations
#[derive(Error, Debug)]
pub enum HostKeyError {
    #[error("Cryptographic error: {0}")]
    Crypto(#[from] crypto::CryptoError),

    #[error("Key store error: {0}")]
    KeyStore(#[from] keystore::KeyStoreError),
}

pub type Result<T> = std::result::Result<T, HostKeyError>;

/// Host key configuration
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct HostKeyConfig {
    /// Location of the private key container
    pub key_path: PathBuf,

    /// Behaviour when the key file exists but cannot be loaded
    pub on_corrupt: CorruptKeyPolicy,
}

impl Default for HostKeyConfig {
    fn default() -> Self {
        Self {
            key_path: PathBuf::from("./hostkey_data/host_ed25519.key"),
            on_corrupt: CorruptKeyPolicy::Regenerate,
        }
    }
}

/// The bootstrapped identity of this host
pub struct HostKey {
    keypair: KeyPair,
    path: PathBuf,
}

impl HostKey {
    /// Load the configured host key, creating it if needed
    pub fn bootstrap(config: &HostKeyConfig) -> Result<Self> {
        let store = KeyStore::from_config(config);
        let keypair = store.load_or_create()?;
        Ok(Self {
            keypair,
            path: config.key_path.clone(),
        })
    }

    pub fn key_pair(&self) -> &KeyPair {
        &self.keypair
    }

    pub fn public_key(&self) -> &VerifyingKey {
        &self.keypair.verifying_key
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.keypair.fingerprint()
    }

    /// Path the key was loaded from or written to
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sign a message with the host key
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.keypair.sign(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_bootstrap_is_stable_across_restarts() {
        let temp_dir = TempDir::new().unwrap();
        let config = HostKeyConfig {
            key_path: temp_dir.path().join("host.key"),
            ..Default::default()
        };

        let first = HostKey::bootstrap(&config).unwrap();
        let second = HostKey::bootstrap(&config).unwrap();

        assert_eq!(first.public_key(), second.public_key());
        assert_eq!(first.fingerprint(), second.fingerprint());
        assert_eq!(second.path(), config.key_path.as_path());
        assert!(verify_key_pair(
            first.public_key(),
            &second.key_pair().signing_key
        ));
    }

    #[test]
    fn test_host_key_signatures_verify() {
        use ed25519_dalek::{Signature, Verifier};

        let temp_dir = TempDir::new().unwrap();
        let config = HostKeyConfig {
            key_path: temp_dir.path().join("host.key"),
            ..Default::default()
        };
        let host = HostKey::bootstrap(&config).unwrap();

        let sig_bytes: [u8; 64] = host.sign(b"server hello").try_into().unwrap();
        let sig = Signature::from_bytes(&sig_bytes);

        assert!(host.public_key().verify(b"server hello", &sig).is_ok());
        assert!(host.public_key().verify(b"tampered", &sig).is_err());

        // a restarted host signs with the same identity
        let restarted = HostKey::bootstrap(&config).unwrap();
        assert!(restarted.public_key().verify(b"server hello", &sig).is_ok());
    }

    #[test]
    fn test_bootstrap_with_fail_policy_reports_corruption() {
        let temp_dir = TempDir::new().unwrap();
        let config = HostKeyConfig {
            key_path: temp_dir.path().join("host.key"),
            on_corrupt: CorruptKeyPolicy::Fail,
        };
        std::fs::write(&config.key_path, b"garbage").unwrap();

        let result = HostKey::bootstrap(&config);

        assert!(matches!(
            result,
            Err(HostKeyError::KeyStore(KeyStoreError::Format { .. }))
        ));
    }

    #[test]
    fn test_config_serde() {
        let config = HostKeyConfig {
            key_path: PathBuf::from("/var/lib/raven/host.key"),
            on_corrupt: CorruptKeyPolicy::Fail,
        };

        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"fail\""));

        let parsed: HostKeyConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);

        let defaulted: HostKeyConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(defaulted, HostKeyConfig::default());
    }

    #[test]
    fn test_error_display() {
        let err = HostKeyError::from(crypto::CryptoError::Generation("no entropy".to_string()));
        assert_eq!(err.to_string(), "Cryptographic error: Key generation failed: no entropy");
    }
}
