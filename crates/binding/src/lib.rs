//! Contract bindings and ABI codec for the ERC-20 interface.
//!
//! - [`token`] holds the static `sol!` binding of the read-only ERC-20 surface.
//! - [`codec`] holds the runtime interface description used to encode calls
//!   and decode results by function name.

pub mod codec;
pub mod token;

pub use alloy_dyn_abi::DynSolValue;
pub use codec::{AbiError, Erc20Abi, ERC20_ABI_JSON};
