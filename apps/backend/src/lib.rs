#![deny(clippy::wildcard_imports)]
#![cfg_attr(test, allow(clippy::wildcard_imports))]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod errors;
pub mod extractors;
pub mod infra;
pub mod logging;
pub mod middleware;
pub mod repos;
pub mod routes;
pub mod services;
pub mod state;
pub mod trace_ctx;
pub mod ws;

#[doc(hidden)]
pub mod test_support;

// Re-exports for public API
pub use adapters::hosted_rest::HostedRestBackend;
pub use config::game::GameConfig;
pub use config::hosted::HostedServiceConfig;
pub use error::AppError;
pub use extractors::auth_token::AuthToken;
pub use extractors::current_user::CurrentUser;
pub use infra::state::{build_state, StateBuilder};
pub use middleware::cors::cors_middleware;
pub use middleware::request_trace::RequestTrace;
pub use middleware::structured_logger::StructuredLogger;
pub use middleware::trace_span::TraceSpan;
pub use repos::{PointsBackend, SharedPointsBackend};
pub use services::GameTimerController;
pub use state::app_state::AppState;

// Auto-initialize logging for unit tests
#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    backend_test_support::logging::init();
}
