//! Chain-specific types and error definitions.

use thiserror::Error;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// Errors that can occur during blockchain operations.
#[derive(Debug, Error)]
pub enum BlockchainError {
    /// Keystore file missing, unreadable or not a key record.
    #[error("cannot load keystore: {0}")]
    Keystore(String),

    /// Encrypted keystore could not be opened with the passphrase.
    #[error("cannot decrypt keystore: {0}")]
    KeystoreDecrypt(String),

    /// Network name has no default RPC endpoint.
    #[error("cannot connect to {0}: unsupported")]
    UnsupportedNetwork(String),

    /// Network name has no default registry address.
    #[error("no default contract address on {0}")]
    NoDefaultAddress(String),

    /// The RPC endpoint could not be reached.
    #[error("cannot connect to ethereum: {0}")]
    Connection(String),

    /// A contract could not be bound at its address.
    #[error("cannot bind to {contract}: {reason}")]
    ContractBind { contract: &'static str, reason: String },

    /// RPC request failed after binding.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),
}

/// Result type for blockchain operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_id_conversion() {
        let chain_id = ChainId::from(42u64);
        assert_eq!(chain_id.0, 42);
        assert_eq!(u64::from(chain_id), 42);
    }

    #[test]
    fn test_error_display() {
        let err = BlockchainError::UnsupportedNetwork("mainnet".to_string());
        assert_eq!(err.to_string(), "cannot connect to mainnet: unsupported");

        let err = BlockchainError::NoDefaultAddress("local".to_string());
        assert_eq!(err.to_string(), "no default contract address on local");

        let err = BlockchainError::ContractBind {
            contract: "ledger",
            reason: "no code".to_string(),
        };
        assert_eq!(err.to_string(), "cannot bind to ledger: no code");
    }
}
