//! Key material loading.
//!
//! # Security
//! - Keys are decrypted once at startup and held only in memory
//! - Keys are never logged or serialized
//! - `Debug` prints the address, nothing else

use std::fs;
use std::path::Path;

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use serde::Deserialize;

use crate::blockchain::types::{BlockchainError, BlockchainResult};

/// Plaintext keystore record.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaintextKeystore {
    /// Optional; checked against the key when present.
    #[serde(default)]
    address: Option<Address>,
    private_key: String,
}

/// The node's signing identity.
#[derive(Clone)]
pub struct KeyMaterial {
    signer: PrivateKeySigner,
}

impl KeyMaterial {
    /// Create key material from a hex-encoded private key string.
    ///
    /// # Arguments
    /// * `private_key_hex` - Hex string (with or without 0x prefix)
    pub fn from_private_key(private_key_hex: &str) -> BlockchainResult<Self> {
        let key_hex = private_key_hex.trim();
        let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| BlockchainError::Keystore(format!("Invalid private key format: {}", e)))?;

        Ok(Self { signer })
    }

    /// Load a keystore file.
    ///
    /// An empty passphrase means the file holds a plaintext record
    /// (`{"address": .., "privateKey": ..}`); otherwise it must be an
    /// encrypted V3 keystore.
    pub fn load(path: &Path, passphrase: &str) -> BlockchainResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            BlockchainError::Keystore(format!("cannot read {}: {}", path.display(), e))
        })?;

        let key = if passphrase.is_empty() {
            Self::from_plaintext_json(&content)?
        } else {
            serde_json::from_str::<serde_json::Value>(&content).map_err(|e| {
                BlockchainError::Keystore(format!("{} is not JSON: {}", path.display(), e))
            })?;
            let signer = PrivateKeySigner::decrypt_keystore(path, passphrase)
                .map_err(|e| BlockchainError::KeystoreDecrypt(e.to_string()))?;
            Self { signer }
        };

        tracing::info!(address = %key.address(), "Keystore loaded");
        Ok(key)
    }

    fn from_plaintext_json(content: &str) -> BlockchainResult<Self> {
        let record: PlaintextKeystore = serde_json::from_str(content)
            .map_err(|e| BlockchainError::Keystore(format!("invalid keystore record: {}", e)))?;

        let key = Self::from_private_key(&record.private_key)?;
        if let Some(expected) = record.address {
            if expected != key.address() {
                return Err(BlockchainError::Keystore(format!(
                    "keystore address {} does not match key address {}",
                    expected,
                    key.address()
                )));
            }
        }
        Ok(key)
    }

    /// Get the address derived from the key.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }

    /// Transaction-signing wallet for providers.
    pub fn wallet(&self) -> EthereumWallet {
        EthereumWallet::from(self.signer.clone())
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}
