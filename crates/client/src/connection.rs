//! Long-lived handle to the remote JSON-RPC endpoint.

use crate::{create_provider, ClientError, ContractCaller};
use alloy_network::Ethereum;
use alloy_primitives::{Address, Bytes, U256};
use alloy_provider::{DynProvider, Provider};
use alloy_rpc_types_eth::{BlockId, TransactionRequest};
use tracing::{debug, info};

/// Connection to a node, opened once at startup and closed once at shutdown.
///
/// The underlying HTTP transport tags every request with its own id, so the
/// handle can be shared by concurrent requests without cross-talk.
pub struct Connection {
    provider: DynProvider<Ethereum>,
    chain_id: u64,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("chain_id", &self.chain_id)
            .finish()
    }
}

impl Connection {
    /// Open a connection and check that the endpoint speaks JSON-RPC.
    ///
    /// The probe is an `eth_chainId` request; any failure there means the
    /// endpoint is unreachable or incompatible.
    pub async fn open(rpc_url: &str) -> Result<Self, ClientError> {
        Self::connect(create_provider(rpc_url)?).await
    }

    /// Wrap an existing provider after the same `eth_chainId` probe as [`Connection::open`].
    pub async fn connect(provider: DynProvider<Ethereum>) -> Result<Self, ClientError> {
        let chain_id = provider
            .get_chain_id()
            .await
            .map_err(|e| ClientError::Connection(e.to_string()))?;

        info!(chain_id, "Connected to RPC endpoint");

        Ok(Self { provider, chain_id })
    }

    /// Chain id reported by the node when the connection was opened.
    pub const fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Release the connection.
    pub fn close(self) {
        info!(chain_id = self.chain_id, "Closing RPC connection");
    }
}

impl ContractCaller for Connection {
    async fn call(&self, target: Address, payload: Bytes) -> Result<Bytes, ClientError> {
        debug!(%target, len = payload.len(), "eth_call");

        let tx = TransactionRequest::default().to(target).input(payload.into());
        let result = self.provider.call(tx).block(BlockId::latest()).await?;

        Ok(result)
    }

    async fn native_balance(&self, address: Address) -> Result<U256, ClientError> {
        debug!(%address, "eth_getBalance");

        let balance = self
            .provider
            .get_balance(address)
            .block_id(BlockId::latest())
            .await?;

        Ok(balance)
    }
}
