//! KeyStore Module - Durable host identity keys
//!
//! Persists a single Ed25519 private key to a PEM container on disk and
//! reloads it on later runs, so the host keeps the same identity across
//! restarts.
//!
//! Access to a key file is not locked. Concurrent `load_or_create` calls on
//! the same path race and the last writer wins; callers bootstrap once.

pub mod container;
mod fs;

pub use container::{ContainerError, PRIVATE_KEY_LABEL};

use crate::crypto::{self, CryptoError, KeyPair};
use crate::HostKeyConfig;
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeyStoreError {
    #[error("Error generating host key: {0}")]
    Generation(#[source] CryptoError),

    #[error("Error creating directory {}: {source}", .path.display())]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Error writing private key {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Error reading private key {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid private key file {}: {source}", .path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: ContainerError,
    },
}

impl KeyStoreError {
    /// True when the key file simply does not exist yet
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Read { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

/// What `load_or_create` does with a key file that exists but cannot be loaded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorruptKeyPolicy {
    /// Generate a new key and overwrite the unreadable file
    #[default]
    Regenerate,
    /// Return the load error; only a missing file triggers generation
    Fail,
}

/// Host key file at a fixed path
#[derive(Debug, Clone)]
pub struct KeyStore {
    path: PathBuf,
    policy: CorruptKeyPolicy,
}

impl KeyStore {
    /// Key store for `path` with the default corruption policy
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            policy: CorruptKeyPolicy::default(),
        }
    }

    pub fn from_config(config: &HostKeyConfig) -> Self {
        Self::new(config.key_path.clone()).with_policy(config.on_corrupt)
    }

    pub fn with_policy(mut self, policy: CorruptKeyPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn policy(&self) -> CorruptKeyPolicy {
        self.policy
    }

    /// Generate a fresh key pair. No I/O.
    pub fn generate() -> Result<KeyPair, KeyStoreError> {
        Self::generate_from(&mut OsRng)
    }

    fn generate_from(rng: &mut impl RngCore) -> Result<KeyPair, KeyStoreError> {
        crypto::generate_keypair_from(rng).map_err(KeyStoreError::Generation)
    }

    /// Write `signing_key` to this store's path, replacing any existing file
    pub fn persist(&self, signing_key: &SigningKey) -> Result<(), KeyStoreError> {
        persist_private_key(signing_key, &self.path)
    }

    /// Read and decode the private key at this store's path
    pub fn load(&self) -> Result<SigningKey, KeyStoreError> {
        load_private_key(&self.path)
    }

    /// Load the existing host key, or generate and persist a new one.
    ///
    /// A successfully loaded file is never rewritten. A missing file always
    /// leads to generation; any other load failure is handled per
    /// [`CorruptKeyPolicy`].
    pub fn load_or_create(&self) -> Result<KeyPair, KeyStoreError> {
        self.load_or_create_with(&mut OsRng)
    }

    /// [`KeyStore::load_or_create`] drawing any new key from `rng`
    pub fn load_or_create_with(&self, rng: &mut impl RngCore) -> Result<KeyPair, KeyStoreError> {
        match self.load() {
            Ok(signing_key) => {
                let keypair = KeyPair::from_signing_key(signing_key);
                tracing::info!(
                    "Loaded host key {} from {}",
                    keypair.fingerprint(),
                    self.path.display()
                );
                return Ok(keypair);
            }
            Err(e) if e.is_not_found() => {
                tracing::debug!("No host key at {}", self.path.display());
            }
            Err(e) => match self.policy {
                CorruptKeyPolicy::Fail => return Err(e),
                CorruptKeyPolicy::Regenerate => {
                    tracing::warn!("Replacing unreadable host key: {}", e);
                }
            },
        }

        let keypair = Self::generate_from(rng)?;
        self.persist(&keypair.signing_key)?;
        tracing::info!(
            "Generated host key {} at {}",
            keypair.fingerprint(),
            self.path.display()
        );
        Ok(keypair)
    }
}

/// Save `signing_key` as a PEM container at `path`.
///
/// Missing parent directories are created `0700`; the file is written `0600`.
pub fn persist_private_key(signing_key: &SigningKey, path: &Path) -> Result<(), KeyStoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tracing::debug!("Ensuring key directory {}", parent.display());
        fs::create_private_dir_all(parent).map_err(|source| KeyStoreError::DirectoryCreate {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let encoded = container::encode(signing_key);
    fs::write_private_file(path, encoded.as_bytes()).map_err(|source| KeyStoreError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!("Wrote private key to {}", path.display());
    Ok(())
}

/// Load a private key from the PEM container at `path`
pub fn load_private_key(path: &Path) -> Result<SigningKey, KeyStoreError> {
    let data = fs::read_file(path).map_err(|source| KeyStoreError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    container::decode(&data).map_err(|source| KeyStoreError::Format {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the host key at `path`, creating it on first run
pub fn load_or_create_host_key(path: &Path) -> Result<KeyPair, KeyStoreError> {
    KeyStore::new(path).load_or_create()
}
