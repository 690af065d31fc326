use crate::{parse_address, BalanceInfo, CallContext, QueryError, TokenInfo, TokenQuery};
use alloy_primitives::{Address, U256};
use binding::{AbiError, DynSolValue, Erc20Abi};
use client::ContractCaller;
use std::sync::Arc;
use tracing::debug;

/// Conversion of a single decoded output into a Rust value.
pub trait FromAbiOutput: Sized {
    fn from_output(function: &str, value: DynSolValue) -> Result<Self, AbiError>;
}

fn unexpected(function: &str, expected: &str, value: &DynSolValue) -> AbiError {
    AbiError::Decode {
        function: function.to_string(),
        reason: format!("expected {expected}, got {value:?}"),
    }
}

impl FromAbiOutput for String {
    fn from_output(function: &str, value: DynSolValue) -> Result<Self, AbiError> {
        match value {
            DynSolValue::String(s) => Ok(s),
            other => Err(unexpected(function, "string", &other)),
        }
    }
}

impl FromAbiOutput for U256 {
    fn from_output(function: &str, value: DynSolValue) -> Result<Self, AbiError> {
        match value {
            DynSolValue::Uint(v, _) => Ok(v),
            other => Err(unexpected(function, "uint", &other)),
        }
    }
}

impl FromAbiOutput for u8 {
    fn from_output(function: &str, value: DynSolValue) -> Result<Self, AbiError> {
        match value {
            DynSolValue::Uint(v, _) => Self::try_from(v).map_err(|e| AbiError::Decode {
                function: function.to_string(),
                reason: e.to_string(),
            }),
            other => Err(unexpected(function, "uint8", &other)),
        }
    }
}

/// Token query service over a [`ContractCaller`].
pub struct TokenService<C> {
    caller: C,
    abi: Arc<Erc20Abi>,
}

impl<C> TokenService<C>
where
    C: ContractCaller,
{
    pub const fn new(caller: C, abi: Arc<Erc20Abi>) -> Self {
        Self { caller, abi }
    }

    /// Give the caller back, e.g. to close the connection at shutdown.
    pub fn into_caller(self) -> C {
        self.caller
    }

    /// Encode `function(args)`, call it on `target` and decode its single output.
    ///
    /// Callers:
    /// - `name()`, `symbol()` -> `String`
    /// - `decimals()` -> `u8`
    /// - `totalSupply()`, `balanceOf(address)` -> `U256`
    async fn call<T: FromAbiOutput>(
        &self,
        target: Address,
        function: &str,
        args: &[DynSolValue],
        ctx: &CallContext,
    ) -> Result<T, QueryError> {
        let payload = self.abi.encode(function, args)?;

        let raw = ctx
            .run(async { self.caller.call(target, payload).await.map_err(QueryError::from) })
            .await?;

        let mut values = self.abi.decode(function, &raw)?;
        if values.len() != 1 {
            return Err(AbiError::Decode {
                function: function.to_string(),
                reason: format!("expected a single output, got {}", values.len()),
            }
            .into());
        }

        let value = values.remove(0);
        Ok(T::from_output(function, value)?)
    }
}

impl<C> TokenQuery for TokenService<C>
where
    C: ContractCaller,
{
    async fn token_info(&self, token: &str, ctx: &CallContext) -> Result<TokenInfo, QueryError> {
        let address = parse_address(token)?;
        debug!("Querying token info: token={}", address);

        let name: String = self.call(address, "name", &[], ctx).await?;
        let symbol: String = self.call(address, "symbol", &[], ctx).await?;
        let decimals: u8 = self.call(address, "decimals", &[], ctx).await?;
        let total_supply: U256 = self.call(address, "totalSupply", &[], ctx).await?;

        Ok(TokenInfo {
            name,
            symbol,
            decimals,
            total_supply,
            address,
        })
    }

    async fn token_balance(
        &self,
        token: &str,
        wallet: &str,
        ctx: &CallContext,
    ) -> Result<BalanceInfo, QueryError> {
        let token = parse_address(token)?;
        let wallet = parse_address(wallet)?;
        debug!("Querying erc20 {} balance: address={}", token, wallet);

        let balance: U256 = self
            .call(token, "balanceOf", &[DynSolValue::Address(wallet)], ctx)
            .await?;
        let decimals: u8 = self.call(token, "decimals", &[], ctx).await?;

        Ok(BalanceInfo {
            address: wallet,
            token_address: token,
            balance,
            decimals,
        })
    }

    async fn native_balance(&self, address: &str, ctx: &CallContext) -> Result<U256, QueryError> {
        let address = parse_address(address)?;
        debug!("Querying native balance: address={}", address);

        ctx.run(async {
            self.caller
                .native_balance(address)
                .await
                .map_err(QueryError::from)
        })
        .await
    }
}
