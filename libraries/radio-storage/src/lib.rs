//! Radio Player Storage
//!
//! Durable session state for the radio player.
//!
//! This crate provides:
//! - **Key-value stores**: [`MemoryStore`] and the `SQLite`-backed [`SqliteStore`]
//! - **Session bridge**: [`SessionBridge`] maps a
//!   [`SessionSnapshot`](radio_core::SessionSnapshot) onto namespaced keys and
//!   implements [`SessionPersistence`](radio_core::SessionPersistence)
//!
//! # Example
//!
//! ```rust,no_run
//! use radio_core::SessionPersistence;
//! use radio_storage::{SessionBridge, SqliteStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SqliteStore::open("session.db").await?;
//! let writer = store.writer();
//! let bridge = SessionBridge::new(store);
//!
//! // Missing or stale entries come back as defaults
//! let snapshot = bridge.load()?;
//! println!("volume: {}", snapshot.volume);
//!
//! // Saves are committed in the background
//! writer.sync().await?;
//! # Ok(())
//! # }
//! ```

mod error;
pub mod session;
pub mod store;

pub use error::{Result, StorageError};
pub use session::{SessionBridge, DEFAULT_NAMESPACE};
pub use store::{KeyValueStore, MemoryStore, SqliteStore, SqliteWriter};
