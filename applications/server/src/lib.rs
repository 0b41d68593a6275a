//! Radio Server Library
//!
//! Thin HTTP proxy in front of the music server's manifest, plus the manifest
//! tooling used to publish it.
//!
//! This library exposes the core components for testing purposes.

pub mod api;
pub mod config;
pub mod error;
pub mod manifest_cli;
pub mod state;

// Re-export commonly used types for convenience
pub use api::create_router;
pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use state::AppState;
