/// Server error types
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use radio_catalog::CatalogError;
use radio_core::RadioError;
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Catalog(#[from] RadioError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CatalogError> for ServerError {
    fn from(err: CatalogError) -> Self {
        ServerError::Catalog(err.into())
    }
}

impl ServerError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Catalog(err) => match err {
                RadioError::Config(_) | RadioError::Unreachable(_) => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                RadioError::EmptyResult => StatusCode::NOT_FOUND,
                _ => StatusCode::BAD_GATEWAY,
            },
            ServerError::Config(_) | ServerError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match self {
            ServerError::BadRequest(msg) => msg,
            ServerError::Catalog(ref err) => {
                if status == StatusCode::NOT_FOUND {
                    tracing::debug!(error = %err, "Empty catalog selection");
                } else {
                    tracing::warn!(error = %err, "Catalog request failed");
                }
                err.user_message()
            }
            ServerError::Config(ref msg) => {
                tracing::error!("Config error: {}", msg);
                "Configuration error".to_string()
            }
            ServerError::Io(ref e) => {
                tracing::error!("IO error: {:?}", e);
                "IO error".to_string()
            }
        };

        let body = Json(json!({
            "success": false,
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_errors_map_to_gateway_statuses() {
        let cases = [
            (RadioError::config("unset"), StatusCode::SERVICE_UNAVAILABLE),
            (
                RadioError::Unreachable("refused".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                RadioError::Server {
                    status: 500,
                    message: "boom".into(),
                },
                StatusCode::BAD_GATEWAY,
            ),
            (RadioError::format("no languages"), StatusCode::BAD_GATEWAY),
            (RadioError::EmptyResult, StatusCode::NOT_FOUND),
        ];

        for (err, status) in cases {
            assert_eq!(ServerError::from(err).status(), status);
        }
        assert_eq!(
            ServerError::BadRequest("nope".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
