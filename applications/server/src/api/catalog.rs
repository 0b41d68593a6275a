/// Catalog proxy routes
use crate::{
    error::{Result, ServerError},
    state::AppState,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use radio_core::{LanguageOption, Track};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct LanguagesResponse {
    pub success: bool,
    pub languages: Vec<LanguageOption>,
}

#[derive(Debug, Deserialize)]
pub struct SongsRequest {
    pub languages: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SongsResponse {
    pub success: bool,
    pub songs: Vec<Track>,
}

/// GET /api/languages - Languages offered by the music server
pub async fn list_languages(State(state): State<AppState>) -> Result<Json<LanguagesResponse>> {
    let languages = state.catalog.list_languages().await?;
    tracing::debug!(count = languages.len(), "Listed languages");

    Ok(Json(LanguagesResponse {
        success: true,
        languages,
    }))
}

/// POST /api/songs - Playable tracks for a language selection
pub async fn list_songs(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SongsRequest>, JsonRejection>,
) -> Result<Json<SongsResponse>> {
    let Json(request) = payload.map_err(|rejection| {
        ServerError::BadRequest(format!(
            "expected {{\"languages\": [..]}}: {}",
            rejection.body_text()
        ))
    })?;

    if request.languages.iter().all(|language| language.trim().is_empty()) {
        return Err(ServerError::BadRequest(
            "languages must be a non-empty array".to_string(),
        ));
    }

    let songs = state.catalog.list_tracks(&request.languages).await?;
    tracing::debug!(
        languages = ?request.languages,
        count = songs.len(),
        "Listed songs"
    );

    Ok(Json(SongsResponse {
        success: true,
        songs,
    }))
}
