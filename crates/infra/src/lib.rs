//! Runtime wiring: configuration loading and the HTTP JSON-RPC transport.

pub mod client;
pub mod config;

pub use client::{HttpConnector, HttpSession};
pub use config::{ConfigError, ConnectorConfig};
