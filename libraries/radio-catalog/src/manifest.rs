//! The `manifest.json` contract.
//!
//! ```json
//! {
//!   "languages": {
//!     "English": ["Morning Light", {"title": "Nocturne", "ext": "ogg", "fallback": "mp3"}]
//!   }
//! }
//! ```
//!
//! Titles never carry the file extension. Besides the typed [`Manifest`] this
//! module has the tolerant reader the client uses (one malformed language must
//! not sink the others) and the generator/validator behind the CLI.

use crate::error::{CatalogError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// One song entry under a language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ManifestEntry {
    /// Bare title, played with the default extension
    Title(String),
    /// Title with its own extension and an optional fallback codec
    Detailed {
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ext: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fallback: Option<String>,
    },
}

impl ManifestEntry {
    pub fn title(&self) -> &str {
        match self {
            Self::Title(title) | Self::Detailed { title, .. } => title,
        }
    }

    /// Extension to request, falling back to `default`
    pub fn extension<'a>(&'a self, default: &'a str) -> &'a str {
        match self {
            Self::Detailed { ext: Some(ext), .. } => ext,
            _ => default,
        }
    }

    /// Alternate codec extension, if one is declared
    pub fn fallback(&self) -> Option<&str> {
        match self {
            Self::Detailed { fallback, .. } => fallback.as_deref(),
            Self::Title(_) => None,
        }
    }
}

/// Typed manifest, used when generating or re-reading a well-formed file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub languages: BTreeMap<String, Vec<ManifestEntry>>,
}

impl Manifest {
    /// Parse a well-formed manifest.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Pretty JSON, matching what gets uploaded to the music server.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn total_tracks(&self) -> usize {
        self.languages.values().map(Vec::len).sum()
    }
}

/// What a requested language looks like in a fetched manifest.
#[derive(Debug)]
pub(crate) enum LanguageEntries {
    Missing,
    Malformed(String),
    Entries(Vec<ManifestEntry>),
}

/// Manifest as fetched, validated only at the top level.
#[derive(Debug)]
pub(crate) struct RemoteManifest {
    languages: Map<String, Value>,
}

impl RemoteManifest {
    /// Require a non-empty `languages` object; per-language lists are checked lazily.
    pub(crate) fn parse(value: Value) -> Result<Self> {
        let Value::Object(mut root) = value else {
            return Err(CatalogError::InvalidManifest(
                "manifest must be a JSON object".into(),
            ));
        };

        match root.remove("languages") {
            Some(Value::Object(languages)) if !languages.is_empty() => Ok(Self { languages }),
            Some(Value::Object(_)) => Err(CatalogError::InvalidManifest(
                "'languages' is empty".into(),
            )),
            Some(_) => Err(CatalogError::InvalidManifest(
                "'languages' should be an object".into(),
            )),
            None => Err(CatalogError::InvalidManifest(
                "missing 'languages' key".into(),
            )),
        }
    }

    pub(crate) fn language_keys(&self) -> impl Iterator<Item = &String> {
        self.languages.keys()
    }

    pub(crate) fn entries(&self, language: &str) -> LanguageEntries {
        match self.languages.get(language) {
            None => LanguageEntries::Missing,
            Some(value) => match Vec::<ManifestEntry>::deserialize(value) {
                Ok(entries) => LanguageEntries::Entries(entries),
                Err(e) => LanguageEntries::Malformed(e.to_string()),
            },
        }
    }
}

/// Outcome of [`validate_json`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ManifestReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Check a raw manifest document without stopping at the first problem.
pub fn validate_json(value: &Value, extension: &str) -> ManifestReport {
    let mut report = ManifestReport::default();

    let Some(languages) = value.get("languages") else {
        report.errors.push("manifest is missing 'languages' key".into());
        return report;
    };
    let Some(languages) = languages.as_object() else {
        report.errors.push("'languages' should be an object".into());
        return report;
    };

    let suffix = format!(".{extension}");
    for (language, songs) in languages {
        let Some(songs) = songs.as_array() else {
            report
                .errors
                .push(format!("songs for '{language}' should be an array"));
            continue;
        };
        if songs.is_empty() {
            report
                .warnings
                .push(format!("no songs found for language '{language}'"));
            continue;
        }

        for song in songs {
            match ManifestEntry::deserialize(song) {
                Ok(entry) if entry.title().ends_with(&suffix) => report.warnings.push(format!(
                    "song '{}' includes file extension (should be title only)",
                    entry.title()
                )),
                Ok(_) => {}
                Err(_) => report
                    .errors
                    .push(format!("song entry under '{language}' is not a title: {song}")),
            }
        }
    }

    report
}

/// Build a manifest from `<audio_dir>/<language>/*.<extension>`.
///
/// Non-directories at the top level are skipped, as are languages with no
/// matching files. Titles are sorted.
pub fn generate_from_dir(audio_dir: &Path, extension: &str) -> Result<Manifest> {
    if !audio_dir.is_dir() {
        return Err(CatalogError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} is not a directory", audio_dir.display()),
        )));
    }

    let mut language_dirs: Vec<_> = std::fs::read_dir(audio_dir)?
        .collect::<std::result::Result<Vec<_>, _>>()?
        .into_iter()
        .map(|entry| entry.path())
        .collect();
    language_dirs.sort();

    let mut manifest = Manifest::default();
    for dir in language_dirs {
        let Some(language) = dir.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            continue;
        };
        if !dir.is_dir() {
            debug!(path = %dir.display(), "Skipping non-directory");
            continue;
        }

        let mut titles: Vec<String> = std::fs::read_dir(&dir)?
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .and_then(|e| e.to_str())
                        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
            })
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect();

        if titles.is_empty() {
            warn!(language = %language, "No audio files found");
            continue;
        }
        titles.sort();

        debug!(language = %language, songs = titles.len(), "Found songs");
        manifest
            .languages
            .insert(language, titles.into_iter().map(ManifestEntry::Title).collect());
    }

    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn entries_accept_titles_and_objects() {
        let manifest = Manifest::from_json(
            r#"{"languages": {"English": ["a", {"title": "b", "ext": "ogg", "fallback": "mp3"}]}}"#,
        )
        .unwrap();
        let entries = &manifest.languages["English"];
        assert_eq!(entries[0].title(), "a");
        assert_eq!(entries[0].extension("mp3"), "mp3");
        assert_eq!(entries[1].extension("mp3"), "ogg");
        assert_eq!(entries[1].fallback(), Some("mp3"));
        assert_eq!(manifest.total_tracks(), 2);
    }

    #[test]
    fn remote_requires_non_empty_languages() {
        assert!(RemoteManifest::parse(json!({"languages": {"English": []}})).is_ok());
        assert!(matches!(
            RemoteManifest::parse(json!({"languages": {}})),
            Err(CatalogError::InvalidManifest(_))
        ));
        assert!(matches!(
            RemoteManifest::parse(json!({"songs": []})),
            Err(CatalogError::InvalidManifest(_))
        ));
        assert!(matches!(
            RemoteManifest::parse(json!(["English"])),
            Err(CatalogError::InvalidManifest(_))
        ));
    }

    #[test]
    fn remote_flags_malformed_language_only() {
        let remote = RemoteManifest::parse(json!({
            "languages": {"English": ["a"], "French": "not-a-list", "German": [1, 2]}
        }))
        .unwrap();
        assert!(matches!(remote.entries("English"), LanguageEntries::Entries(e) if e.len() == 1));
        assert!(matches!(remote.entries("French"), LanguageEntries::Malformed(_)));
        assert!(matches!(remote.entries("German"), LanguageEntries::Malformed(_)));
        assert!(matches!(remote.entries("Klingon"), LanguageEntries::Missing));
    }

    #[test]
    fn validation_reports_errors_and_warnings() {
        let report = validate_json(
            &json!({"languages": {"English": ["a.mp3", "b"], "French": [], "German": "x", "Dutch": [3]}}),
            "mp3",
        );
        assert!(!report.is_valid());
        assert_eq!(report.errors.len(), 2);
        assert_eq!(report.warnings.len(), 2);

        let missing = validate_json(&json!({}), "mp3");
        assert_eq!(missing.errors, vec!["manifest is missing 'languages' key".to_string()]);
    }

    #[test]
    fn generate_scans_language_directories() {
        let dir = tempfile::tempdir().unwrap();
        let english = dir.path().join("English");
        let empty = dir.path().join("Empty");
        std::fs::create_dir(&english).unwrap();
        std::fs::create_dir(&empty).unwrap();
        std::fs::write(english.join("b.mp3"), b"").unwrap();
        std::fs::write(english.join("a.mp3"), b"").unwrap();
        std::fs::write(english.join("notes.txt"), b"").unwrap();
        std::fs::write(dir.path().join("stray.mp3"), b"").unwrap();

        let manifest = generate_from_dir(dir.path(), "mp3").unwrap();
        assert_eq!(manifest.languages.len(), 1);
        assert_eq!(
            manifest.languages["English"],
            vec![
                ManifestEntry::Title("a".into()),
                ManifestEntry::Title("b".into())
            ]
        );

        let round_trip = Manifest::from_json(&manifest.to_json_pretty().unwrap()).unwrap();
        assert_eq!(round_trip, manifest);
    }

    #[test]
    fn generate_rejects_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let result = generate_from_dir(&dir.path().join("nope"), "mp3");
        assert!(matches!(result, Err(CatalogError::Io(_))));
    }
}
