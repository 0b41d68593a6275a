//! Radio Player Catalog
//!
//! Client for the static music server that hosts the song manifest and the
//! audio files.
//!
//! # Features
//!
//! - **Languages**: list the languages the manifest offers
//! - **Tracks**: expand a language selection into playable, percent-encoded URLs
//! - **Tooling**: generate and validate `manifest.json` from an audio directory
//!
//! # Server layout
//!
//! ```text
//! {BASE_URL}/manifest.json                      {"languages": {"English": ["Song", ...]}}
//! {BASE_URL}/audio/{language}/{title}.{ext}
//! ```
//!
//! # Example
//!
//! ```ignore
//! use radio_catalog::{CatalogClient, CatalogConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = CatalogClient::new(CatalogConfig::new("https://music.example.com"))?;
//!
//!     let languages = client.list_languages().await?;
//!     println!("{} languages", languages.len());
//!
//!     let tracks = client.list_tracks(&["English".to_string()]).await?;
//!     println!("{} tracks", tracks.len());
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
pub mod manifest;
mod urls;

pub use client::CatalogClient;
pub use config::{CatalogConfig, MUSIC_SERVER_URL_ENV};
pub use error::{CatalogError, Result};
pub use manifest::{Manifest, ManifestEntry, ManifestReport};
pub use urls::{audio_url, manifest_url};
