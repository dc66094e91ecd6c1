// edadmin-api: Async Rust client for the email delivery platform's admin REST API

pub mod auth;
pub mod client;
pub mod endpoints;
pub mod error;
pub mod models;
pub mod transport;

pub use auth::{Session, is_admin_endpoint};
pub use client::ApiClient;
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
