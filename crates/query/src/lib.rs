//! Read-only token queries against an EVM chain.
//!
//! This crate answers three questions: ERC20 token metadata, a wallet's
//! ERC20 balance, and a wallet's native balance. Every query runs under a
//! [`CallContext`] that bounds it with a deadline and a cancellation token.

pub mod context;
pub mod service;

pub use context::CallContext;
pub use service::TokenService;

use alloy_primitives::{hex, Address, U256};
use binding::AbiError;
use client::ClientError;
use serde::{Deserialize, Serialize};
use std::{future::Future, time::Duration};
use thiserror::Error;

/// ERC20 token metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    /// Token name
    pub name: String,
    /// Token symbol
    pub symbol: String,
    /// Number of decimals
    pub decimals: u8,
    /// Total supply in the token's smallest unit
    #[serde(with = "decimal")]
    pub total_supply: U256,
    /// Token contract address
    pub address: Address,
}

/// ERC20 balance of a wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceInfo {
    /// Wallet address
    pub address: Address,
    /// Token contract address
    pub token_address: Address,
    /// Balance in the token's smallest unit
    #[serde(with = "decimal")]
    pub balance: U256,
    /// Number of decimals of the token
    pub decimals: u8,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// Malformed address at the boundary
    #[error("Invalid address {input:?}: {reason}")]
    Validation { input: String, reason: String },

    /// Encoding or decoding failure
    #[error(transparent)]
    Abi(#[from] AbiError),

    /// Transport or node failure, including reverts
    #[error(transparent)]
    Rpc(#[from] ClientError),

    /// The caller cancelled the query
    #[error("Query cancelled")]
    Cancelled,

    /// The query did not finish within its deadline
    #[error("Deadline exceeded after {0:?}")]
    DeadlineExceeded(Duration),
}

/// Coarse classification of a [`QueryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input address
    Validation,
    /// Function missing from the interface description
    UnknownFunction,
    /// Arguments rejected by the encoder
    ArgumentMismatch,
    /// Result bytes inconsistent with the declared outputs
    Decode,
    /// Transport or node failure
    Rpc,
    /// Query cancelled by its caller
    Cancelled,
    /// Query ran past its deadline
    DeadlineExceeded,
}

impl ErrorKind {
    /// Stable snake_case label, used for metrics.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::UnknownFunction => "unknown_function",
            Self::ArgumentMismatch => "argument_mismatch",
            Self::Decode => "decode",
            Self::Rpc => "rpc",
            Self::Cancelled => "cancelled",
            Self::DeadlineExceeded => "deadline_exceeded",
        }
    }
}

impl QueryError {
    /// Classify the error. A broken interface description counts as an unknown function.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Abi(AbiError::UnknownFunction(_) | AbiError::InvalidInterface(_)) => {
                ErrorKind::UnknownFunction
            }
            Self::Abi(AbiError::ArgumentMismatch { .. }) => ErrorKind::ArgumentMismatch,
            Self::Abi(AbiError::Decode { .. }) => ErrorKind::Decode,
            Self::Rpc(_) => ErrorKind::Rpc,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::DeadlineExceeded(_) => ErrorKind::DeadlineExceeded,
        }
    }
}

/// The three token questions, as consumed by the HTTP layer.
pub trait TokenQuery: Send + Sync {
    /// Name, symbol, decimals and total supply of `token`.
    fn token_info(
        &self,
        token: &str,
        ctx: &CallContext,
    ) -> impl Future<Output = Result<TokenInfo, QueryError>> + Send;

    /// Balance of `wallet` in `token`.
    fn token_balance(
        &self,
        token: &str,
        wallet: &str,
        ctx: &CallContext,
    ) -> impl Future<Output = Result<BalanceInfo, QueryError>> + Send;

    /// Native balance of `address` in wei.
    fn native_balance(
        &self,
        address: &str,
        ctx: &CallContext,
    ) -> impl Future<Output = Result<U256, QueryError>> + Send;
}

/// Parse a `0x`-prefixed, 40 hex character address (any case).
pub fn parse_address(input: &str) -> Result<Address, QueryError> {
    let invalid = |reason: String| QueryError::Validation {
        input: input.to_string(),
        reason,
    };

    let digits = input
        .strip_prefix("0x")
        .ok_or_else(|| invalid("missing 0x prefix".to_string()))?;

    if digits.len() != 40 {
        return Err(invalid(format!(
            "expected 40 hex characters, got {}",
            digits.len()
        )));
    }

    let bytes = hex::decode(digits).map_err(|e| invalid(e.to_string()))?;

    Ok(Address::from_slice(&bytes))
}

/// Serde helpers writing `U256` as a base-10 string.
mod decimal {
    use alloy_primitives::U256;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let s = String::deserialize(deserializer)?;
        U256::from_str_radix(&s, 10).map_err(D::Error::custom)
    }
}
