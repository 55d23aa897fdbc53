//! HTTP surface for the triage service.
//!
//! Routes are nested under `/api/`. Every request passes through the
//! audit logger; responses carry `Cache-Control: no-store` and CORS
//! headers for the local front end.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{start_api_server, ApiServer, ApiSession};
pub use types::ApiContext;
