//! HTTP API layer

pub mod auth;
pub mod server;
pub mod state;

pub use auth::{HmacSessions, Sessions};
pub use server::{ApiServer, ApiServerConfig};
pub use state::AppState;
