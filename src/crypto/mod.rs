//! Cryptography Module - Ed25519 host key primitive
//!
//! Provides key generation from the OS random source, public key derivation
//! and pair verification. The scheme is fixed to Ed25519.

mod fingerprint;

pub use fingerprint::Fingerprint;

use ed25519_dalek::{SigningKey, VerifyingKey, KEYPAIR_LENGTH, SECRET_KEY_LENGTH};
use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Key generation failed: {0}")]
    Generation(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

/// Ed25519 host key pair
#[derive(Clone)]
pub struct KeyPair {
    pub signing_key: SigningKey,
    pub verifying_key: VerifyingKey,
}

impl KeyPair {
    /// Build a pair from a private key, deriving its public half
    pub fn from_signing_key(signing_key: SigningKey) -> Self {
        let verifying_key = derive_public(&signing_key);
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Build a pair from raw private key bytes.
    ///
    /// Accepts the 32-byte seed or the 64-byte `seed || public` encoding.
    /// For the latter the embedded public key must match the derived one.
    pub fn from_private_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let signing_key = match bytes.len() {
            SECRET_KEY_LENGTH => {
                let mut seed = [0u8; SECRET_KEY_LENGTH];
                seed.copy_from_slice(bytes);
                SigningKey::from_bytes(&seed)
            }
            KEYPAIR_LENGTH => {
                let mut keypair = [0u8; KEYPAIR_LENGTH];
                keypair.copy_from_slice(bytes);
                SigningKey::from_keypair_bytes(&keypair)
                    .map_err(|e| CryptoError::InvalidKey(e.to_string()))?
            }
            n => {
                return Err(CryptoError::InvalidKey(format!(
                    "expected {} or {} bytes, got {}",
                    SECRET_KEY_LENGTH, KEYPAIR_LENGTH, n
                )))
            }
        };
        Ok(Self::from_signing_key(signing_key))
    }

    /// Get the public key bytes
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.verifying_key.to_bytes()
    }

    /// Get the secret seed bytes
    pub fn secret_key_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// Check that the public half is the one derived from the private half
    pub fn is_consistent(&self) -> bool {
        verify_key_pair(&self.verifying_key, &self.signing_key)
    }

    /// Fingerprint of the public key, safe to log
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of(&self.verifying_key)
    }

    /// Sign a message
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        use ed25519_dalek::Signer;
        self.signing_key.sign(message).to_bytes().to_vec()
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("fingerprint", &self.fingerprint())
            .finish_non_exhaustive()
    }
}

/// Generate a fresh key pair from the OS random source
pub fn generate_keypair() -> Result<KeyPair, CryptoError> {
    generate_keypair_from(&mut OsRng)
}

/// Generate a fresh key pair from a caller-supplied random source
pub fn generate_keypair_from(rng: &mut impl RngCore) -> Result<KeyPair, CryptoError> {
    let mut seed = [0u8; SECRET_KEY_LENGTH];
    rng.try_fill_bytes(&mut seed)
        .map_err(|e| CryptoError::Generation(e.to_string()))?;

    Ok(KeyPair::from_signing_key(SigningKey::from_bytes(&seed)))
}

/// Derive the public key of a private key
pub fn derive_public(signing_key: &SigningKey) -> VerifyingKey {
    signing_key.verifying_key()
}

/// Check whether `public_key` is the public half of `signing_key`
pub fn verify_key_pair(public_key: &VerifyingKey, signing_key: &SigningKey) -> bool {
    derive_public(signing_key).as_bytes() == public_key.as_bytes()
}

/// Random source that always fails, for exercising generation errors
#[cfg(test)]
pub(crate) struct FailingRng;

#[cfg(test)]
impl RngCore for FailingRng {
    fn next_u32(&mut self) -> u32 {
        0
    }

    fn next_u64(&mut self) -> u64 {
        0
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        dest.fill(0);
    }

    fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
        Err(rand::Error::new("entropy source unavailable"))
    }
}
