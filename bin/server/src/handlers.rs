//! Request handlers.
//!
//! Handlers only check that path parameters are present, run the query under
//! a fresh [`CallContext`] and wrap the outcome in the [`Response`] envelope.

use crate::routes::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response as HttpResponse},
    Json,
};
use query::{
    parse_address, BalanceInfo, CallContext, ErrorKind, QueryError, TokenInfo, TokenQuery,
};
use serde::{Deserialize, Serialize};
use std::{
    future::Future,
    time::{Instant, SystemTime, UNIX_EPOCH},
};
use tracing::warn;

/// Name reported by the health check.
pub const SERVICE_NAME: &str = "web3-search";

/// Response envelope shared by every route.
#[derive(Debug, Serialize, Deserialize)]
pub struct Response<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Response<T> {
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Health check payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub timestamp: u64,
    pub service: String,
}

/// Native balance payload. `address` is the checksummed form of the request path.
#[derive(Debug, Serialize, Deserialize)]
pub struct NativeBalance {
    pub address: String,
    pub balance: String,
    pub unit: String,
}

/// Failure carried back to the client as a JSON envelope.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn missing(message: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.to_string(),
        }
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        let status = match err.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Decode | ErrorKind::Rpc => StatusCode::BAD_GATEWAY,
            ErrorKind::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
            ErrorKind::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::UnknownFunction | ErrorKind::ArgumentMismatch => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> HttpResponse {
        let body = Response::<()> {
            success: false,
            data: None,
            error: Some(self.message),
        };

        (self.status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<Response<T>>, ApiError>;

/// Run a query under the configured deadline and record its outcome.
async fn observe<Q, T, F, Fut>(state: &AppState<Q>, route: &'static str, query: F) -> ApiResult<T>
where
    F: FnOnce(CallContext) -> Fut,
    Fut: Future<Output = Result<T, QueryError>>,
{
    let started = Instant::now();
    let result = query(CallContext::with_timeout(state.timeout)).await;

    state.metrics.record_request(
        route,
        result.as_ref().err().map(QueryError::kind),
        started.elapsed(),
    );

    match result {
        Ok(data) => Ok(Json(Response::ok(data))),
        Err(err) => {
            warn!(route, error = %err, "Query failed");
            Err(err.into())
        }
    }
}

pub async fn health() -> Json<Response<Health>> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default();

    Json(Response::ok(Health {
        status: "healthy".to_string(),
        timestamp,
        service: SERVICE_NAME.to_string(),
    }))
}

pub async fn token_info<Q: TokenQuery + 'static>(
    State(state): State<AppState<Q>>,
    Path(address): Path<String>,
) -> ApiResult<TokenInfo> {
    if address.trim().is_empty() {
        return Err(ApiError::missing("Token address is required"));
    }

    let query = state.query.clone();
    observe(&state, "token_info", |ctx| async move {
        query.token_info(&address, &ctx).await
    })
    .await
}

pub async fn token_balance<Q: TokenQuery + 'static>(
    State(state): State<AppState<Q>>,
    Path((token_address, wallet_address)): Path<(String, String)>,
) -> ApiResult<BalanceInfo> {
    if token_address.trim().is_empty() || wallet_address.trim().is_empty() {
        return Err(ApiError::missing(
            "Both token address and wallet address are required",
        ));
    }

    let query = state.query.clone();
    observe(&state, "token_balance", |ctx| async move {
        query
            .token_balance(&token_address, &wallet_address, &ctx)
            .await
    })
    .await
}

pub async fn native_balance<Q: TokenQuery + 'static>(
    State(state): State<AppState<Q>>,
    Path(address): Path<String>,
) -> ApiResult<NativeBalance> {
    if address.trim().is_empty() {
        return Err(ApiError::missing("Address is required"));
    }

    let query = state.query.clone();
    observe(&state, "native_balance", |ctx| async move {
        let balance = query.native_balance(&address, &ctx).await?;

        Ok(NativeBalance {
            address: parse_address(&address)?.to_string(),
            balance: balance.to_string(),
            unit: "wei".to_string(),
        })
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn status_of(err: QueryError) -> StatusCode {
        ApiError::from(err).status
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            status_of(QueryError::Validation {
                input: "0x".into(),
                reason: "too short".into()
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(QueryError::DeadlineExceeded(Duration::from_secs(30))),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status_of(QueryError::Cancelled),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(QueryError::Rpc(client::ClientError::Transport(
                "connection refused".into()
            ))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(QueryError::Abi(binding::AbiError::UnknownFunction(
                "transfer".into()
            ))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_failure_envelope_omits_data() {
        let body = Response::<()> {
            success: false,
            data: None,
            error: Some("boom".to_string()),
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({"success": false, "error": "boom"}));
    }
}
