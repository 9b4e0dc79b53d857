//! HTTP API over the service layer

pub mod http_server;

pub use http_server::{router, start_server, ApiError, AppState};
