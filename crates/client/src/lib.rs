//! JSON-RPC client plumbing.
//!
//! Owns the long-lived [`Connection`] to the remote node and the
//! [`ContractCaller`] seam the query layer talks through.

mod connection;

use alloy_primitives::{Address, Bytes, U256};
use alloy_network::Ethereum;
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_transport::TransportError;
pub use connection::Connection;
use std::future::Future;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Error parsing or validating URLs
    #[error("Invalid RPC URL: {0}")]
    InvalidUrl(String),

    /// Error connecting to the RPC endpoint
    #[error("Connection error: {0}")]
    Connection(String),

    /// Transport failure or malformed JSON-RPC response
    #[error("RPC transport error: {0}")]
    Transport(String),

    /// The node answered with a JSON-RPC error, e.g. an execution revert
    #[error("RPC error {code}: {message}")]
    Node { code: i64, message: String },
}

impl From<TransportError> for ClientError {
    fn from(err: TransportError) -> Self {
        match err.as_error_resp() {
            Some(payload) => Self::Node {
                code: payload.code,
                message: payload.message.to_string(),
            },
            None => Self::Transport(err.to_string()),
        }
    }
}

/// Read-only access to a node.
///
/// Implementations must be safe to share between concurrent requests.
pub trait ContractCaller: Send + Sync {
    /// Execute `eth_call` against `target` with `payload` as input data at the
    /// latest block, returning the raw result bytes.
    fn call(
        &self,
        target: Address,
        payload: Bytes,
    ) -> impl Future<Output = Result<Bytes, ClientError>> + Send;

    /// Native balance of `address` in wei at the latest block.
    fn native_balance(
        &self,
        address: Address,
    ) -> impl Future<Output = Result<U256, ClientError>> + Send;
}

/// Convenience function to create an ethereum rpc provider from url.
///
/// Read-only, so no transaction fillers are installed.
pub fn create_provider(rpc_url: &str) -> Result<DynProvider<Ethereum>, ClientError> {
    let url = rpc_url
        .parse()
        .map_err(|e| ClientError::InvalidUrl(format!("{}", e)))?;
    let provider = ProviderBuilder::new()
        .disable_recommended_fillers()
        .connect_http(url)
        .erased();

    Ok(provider)
}
