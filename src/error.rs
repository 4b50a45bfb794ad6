use alloy::primitives::{TxHash, U256};
use thiserror::Error;

use crate::chain::NetworkId;

/// Failures talking to a network through the chain client.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("{0} has no RPC endpoint configured")]
    NoRpc(NetworkId),
    #[error("rpc error: {0}")]
    Rpc(String),
    #[error("{0}")]
    Contract(String),
    #[error("confirmation failed: {0}")]
    Confirmation(String),
}

impl From<alloy::transports::TransportError> for ChainError {
    fn from(err: alloy::transports::TransportError) -> Self {
        Self::Rpc(err.to_string())
    }
}

impl From<alloy::contract::Error> for ChainError {
    fn from(err: alloy::contract::Error) -> Self {
        Self::Contract(err.to_string())
    }
}

/// Why a single bridge attempt did not succeed. Any of these ends the run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("insufficient balance on {network}: required {required} wei, available {available} wei")]
    InsufficientBalance {
        network: NetworkId,
        required: U256,
        available: U256,
    },
    #[error("bridge tx {hash} reverted on {network}")]
    Reverted { network: NetworkId, hash: TxHash },
    #[error(transparent)]
    Chain(#[from] ChainError),
}

/// Rejected cycle-count input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UserInputError {
    #[error("operation cancelled")]
    Cancelled,
    #[error("invalid input {0:?}, expected a positive number")]
    NotPositiveInteger(String),
}
