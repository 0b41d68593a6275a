//! Domain types for the radio player

use serde::{Deserialize, Serialize};
use std::fmt;

/// Track identifier
///
/// Derived from language and title, so it is stable across manifest reloads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    /// Create a track ID from a raw string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Build the canonical ID for a title within a language
    ///
    /// The form is `{language}/{title}`. `%` and `/` inside the language are
    /// percent-escaped, so the first `/` always ends the language.
    pub fn from_parts(language: &str, title: &str) -> Self {
        let language = language.replace('%', "%25").replace('/', "%2F");
        Self(format!("{language}/{title}"))
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TrackId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// One playable song resolved to a streamable URL
///
/// Immutable once built by the catalog; everything else holds clones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Unique identifier (language + title)
    pub id: TrackId,

    /// Display title (file name without extension)
    pub title: String,

    /// Language the track is filed under
    pub language: String,

    /// Primary audio URL
    pub url: String,

    /// Alternative codec URL, tried once if the primary fails to load
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate_url: Option<String>,
}

impl Track {
    /// Create a track without an alternate URL
    pub fn new(language: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        let language = language.into();
        let title = title.into();
        Self {
            id: TrackId::from_parts(&language, &title),
            title,
            language,
            url: url.into(),
            alternate_url: None,
        }
    }

    /// Attach an alternate codec URL
    #[must_use]
    pub fn with_alternate_url(mut self, url: impl Into<String>) -> Self {
        self.alternate_url = Some(url.into());
        self
    }
}

/// Language the listener can select
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageOption {
    pub id: String,
    pub name: String,
}

impl LanguageOption {
    /// Manifest keys double as both id and display name
    pub fn from_manifest_key(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            id: key.clone(),
            name: key,
        }
    }
}

/// Playback position captured for restoration after a reload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSnapshot {
    /// Track that was current when the snapshot was taken
    pub track_id: TrackId,

    /// Whether audio was audible at that moment
    pub was_playing: bool,

    /// Position within the track
    pub position_seconds: f64,

    /// Wall-clock time of the snapshot (Unix epoch, milliseconds)
    pub saved_at_epoch_ms: i64,
}

/// Everything that survives a page reload
///
/// Absent entries fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub selected_languages: Vec<String>,

    /// Volume level (0-100)
    pub volume: u8,

    /// Tracks already played in the current no-repeat cycle
    pub played_ids: Vec<TrackId>,

    /// Now-playing position, if one was saved and is still fresh
    pub playback: Option<PlaybackSnapshot>,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            selected_languages: Vec::new(),
            volume: 80,
            played_ids: Vec::new(),
            playback: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_id_combines_language_and_title() {
        let track = Track::new("Spanish", "La Noche", "https://x/audio/Spanish/La%20Noche.mp3");
        assert_eq!(track.id.as_str(), "Spanish/La Noche");
        assert!(track.alternate_url.is_none());
    }

    #[test]
    fn track_ids_do_not_collide_across_the_separator() {
        assert_ne!(
            TrackId::from_parts("A-B", "c"),
            TrackId::from_parts("A", "B-c")
        );
        assert_ne!(
            TrackId::from_parts("A/B", "c"),
            TrackId::from_parts("A", "B/c")
        );
        assert_ne!(
            TrackId::from_parts("A%2FB", "c"),
            TrackId::from_parts("A/B", "c")
        );
        assert_eq!(TrackId::from_parts("A/B", "c").as_str(), "A%2FB/c");
    }

    #[test]
    fn track_serializes_camel_case() {
        let track = Track::new("English", "a", "https://x/a.mp3").with_alternate_url("https://x/a.ogg");
        let json = serde_json::to_value(&track).unwrap();
        assert_eq!(json["id"], "English/a");
        assert_eq!(json["alternateUrl"], "https://x/a.ogg");
    }

    #[test]
    fn default_snapshot_is_empty() {
        let snapshot = SessionSnapshot::default();
        assert!(snapshot.selected_languages.is_empty());
        assert_eq!(snapshot.volume, 80);
        assert!(snapshot.playback.is_none());
    }
}
