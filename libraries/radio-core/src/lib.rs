//! Radio Player Core
//!
//! Platform-agnostic types, traits, and error handling shared by every
//! radio player crate.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Track`, `LanguageOption`, `SessionSnapshot`
//! - **Core Traits**: `CatalogSource` (where tracks come from) and
//!   `SessionPersistence` (where session state survives reloads)
//! - **Error Handling**: the unified `RadioError` taxonomy and `Result`
//!
//! # Example
//!
//! ```rust
//! use radio_core::{Track, TrackId};
//!
//! let track = Track::new("English", "Morning Light", "https://music.example.com/audio/English/Morning%20Light.mp3");
//! assert_eq!(track.id, TrackId::from_parts("English", "Morning Light"));
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod traits;
pub mod types;

pub use error::{NoticeLevel, RadioError, Result};
pub use traits::{CatalogSource, SessionPersistence};
pub use types::{LanguageOption, PlaybackSnapshot, SessionSnapshot, Track, TrackId};
