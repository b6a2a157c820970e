//! Encoded key container
//!
//! PEM wrapper around the 64-byte `seed || public` Ed25519 encoding:
//!
//! ```text
//! -----BEGIN ED25519 PRIVATE KEY-----
//! <base64, 64 columns>
//! -----END ED25519 PRIVATE KEY-----
//! ```

use crate::crypto::{CryptoError, KeyPair};
use ed25519_dalek::SigningKey;
use pem::{EncodeConfig, LineEnding, Pem};
use thiserror::Error;

/// Label every host key container must carry
pub const PRIVATE_KEY_LABEL: &str = "ED25519 PRIVATE KEY";

#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("malformed PEM: {0}")]
    Pem(#[from] pem::PemError),

    #[error("unexpected PEM label {found:?}, expected {:?}", PRIVATE_KEY_LABEL)]
    Label { found: String },

    #[error("bad key material: {0}")]
    Key(#[from] CryptoError),
}

/// Encode a private key into its container text
pub fn encode(signing_key: &SigningKey) -> String {
    let block = Pem::new(PRIVATE_KEY_LABEL, signing_key.to_keypair_bytes().to_vec());
    pem::encode_config(&block, EncodeConfig::new().set_line_ending(LineEnding::LF))
}

/// Decode container text back into a private key
pub fn decode(data: &[u8]) -> Result<SigningKey, ContainerError> {
    let block = pem::parse(data)?;
    if block.tag() != PRIVATE_KEY_LABEL {
        return Err(ContainerError::Label {
            found: block.tag().to_string(),
        });
    }

    let keypair = KeyPair::from_private_bytes(block.contents())?;
    Ok(keypair.signing_key)
}
