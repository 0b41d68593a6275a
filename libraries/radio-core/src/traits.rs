/// Core traits for the radio player
use crate::error::Result;
use crate::types::{LanguageOption, SessionSnapshot, Track};
use async_trait::async_trait;

/// Where the catalog comes from
///
/// Implemented by the HTTP catalog client; tests substitute in-memory
/// catalogs.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// List every language the music server offers
    async fn list_languages(&self) -> Result<Vec<LanguageOption>>;

    /// Resolve the playable tracks for a language selection
    ///
    /// An empty selection returns an empty list without touching the network.
    async fn list_tracks(&self, languages: &[String]) -> Result<Vec<Track>>;
}

/// Durable session storage
///
/// The orchestrator mirrors state through this trait and reads it back once
/// at startup.
pub trait SessionPersistence: Send {
    /// Read the stored session
    ///
    /// Missing entries come back as defaults; a stale playback entry comes back
    /// as `None`.
    fn load(&self) -> Result<SessionSnapshot>;

    /// Overwrite the stored session
    fn save(&mut self, snapshot: &SessionSnapshot) -> Result<()>;
}
