//! API route definitions.
//!
//! Maps HTTP paths to handler functions.

use crate::{handlers, metrics::Metrics};
use axum::{
    http::{header, Method, StatusCode},
    routing::get,
    Router,
};
use query::TokenQuery;
use std::{sync::Arc, time::Duration};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// State shared by every request.
pub struct AppState<Q> {
    /// Query service, shared by all workers
    pub query: Arc<Q>,
    /// Deadline applied to each query
    pub timeout: Duration,
    pub metrics: Metrics,
}

impl<Q> Clone for AppState<Q> {
    fn clone(&self) -> Self {
        Self {
            query: self.query.clone(),
            timeout: self.timeout,
            metrics: self.metrics.clone(),
        }
    }
}

impl<Q> AppState<Q> {
    pub const fn new(query: Arc<Q>, timeout: Duration, metrics: Metrics) -> Self {
        Self {
            query,
            timeout,
            metrics,
        }
    }
}

/// Builds the axum router with all API routes.
///
/// Routes:
/// - `GET /`: redirect to the health check
/// - `GET /api/v1/health`: health check
/// - `GET /api/v1/token/:address`: ERC20 token metadata
/// - `GET /api/v1/token/:token_address/balance/:wallet_address`: ERC20 balance
/// - `GET /api/v1/eth/balance/:address`: native balance in wei
pub fn build_router<Q>(state: AppState<Q>, cors: bool) -> Router
where
    Q: TokenQuery + 'static,
{
    let api = Router::new()
        .route("/health", get(handlers::health))
        .route("/token/:address", get(handlers::token_info::<Q>))
        .route(
            "/token/:token_address/balance/:wallet_address",
            get(handlers::token_balance::<Q>),
        )
        .route("/eth/balance/:address", get(handlers::native_balance::<Q>));

    let mut router = Router::new()
        .route(
            "/",
            get(|| async { (StatusCode::FOUND, [(header::LOCATION, "/api/v1/health")]) }),
        )
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http());

    if cors {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE]),
        );
    }

    router.with_state(state)
}
