pub mod config;
pub mod handlers;
pub mod metrics;
pub mod routes;

pub use routes::{build_router, AppState};
