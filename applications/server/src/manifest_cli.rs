/// Manifest tooling behind `radio-server manifest ...`
use crate::error::{Result, ServerError};
use radio_catalog::manifest::{generate_from_dir, validate_json, ManifestReport};
use std::path::Path;

/// Counts written by [`generate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateSummary {
    pub languages: usize,
    pub tracks: usize,
}

/// Scan `audio_dir` and write the manifest to `output`
pub fn generate(audio_dir: &Path, output: &Path, extension: &str) -> Result<GenerateSummary> {
    let manifest = generate_from_dir(audio_dir, extension)?;
    if manifest.languages.is_empty() {
        return Err(ServerError::BadRequest(format!(
            "no .{extension} files found under {}",
            audio_dir.display()
        )));
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output, manifest.to_json_pretty()?)?;

    let summary = GenerateSummary {
        languages: manifest.languages.len(),
        tracks: manifest.total_tracks(),
    };
    tracing::info!(
        output = %output.display(),
        languages = summary.languages,
        tracks = summary.tracks,
        "Manifest written"
    );
    Ok(summary)
}

/// Read and check a manifest file
///
/// Unreadable JSON is reported as an error inside the report, not as `Err`.
pub fn validate(file: &Path, extension: &str) -> Result<ManifestReport> {
    let text = std::fs::read_to_string(file)?;
    match serde_json::from_str(&text) {
        Ok(value) => Ok(validate_json(&value, extension)),
        Err(e) => Ok(ManifestReport {
            errors: vec![format!("invalid JSON: {e}")],
            warnings: Vec::new(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"").unwrap();
    }

    #[test]
    fn generate_then_validate() {
        let dir = TempDir::new().unwrap();
        let audio = dir.path().join("audio");
        touch(&audio.join("English").join("Morning Light.mp3"));
        touch(&audio.join("English").join("Nocturne.mp3"));
        touch(&audio.join("Hindi").join("Baarish.mp3"));
        touch(&audio.join("Hindi").join("cover.jpg"));
        let output = dir.path().join("out").join("manifest.json");

        let summary = generate(&audio, &output, "mp3").unwrap();
        assert_eq!(
            summary,
            GenerateSummary {
                languages: 2,
                tracks: 3
            }
        );

        let report = validate(&output, "mp3").unwrap();
        assert!(report.is_valid());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn empty_audio_dir_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = generate(dir.path(), &dir.path().join("manifest.json"), "mp3");
        assert!(matches!(result, Err(ServerError::BadRequest(_))));
    }

    #[test]
    fn broken_json_is_reported() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("manifest.json");
        std::fs::write(&file, "{\"languages\": ").unwrap();

        let report = validate(&file, "mp3").unwrap();
        assert!(!report.is_valid());
    }
}
