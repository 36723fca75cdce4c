use axum::{http::StatusCode, response::IntoResponse, Json};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid wallet address: {0}")]
    InvalidAddress(String),

    #[error("Failed to store score on-chain: {0}")]
    CommitFailed(String),

    #[error("Failed to get score from chain: {0}")]
    ReadFailed(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Indexer error: {0}")]
    Indexer(String),

    #[error("Scoring model error: {0}")]
    Model(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::InvalidAddress(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = serde_json::json!({
            "error": self.to_string(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_error_kind() {
        let cases = [
            (AppError::InvalidAddress("0x12".into()), StatusCode::BAD_REQUEST),
            (AppError::NotFound("none".into()), StatusCode::NOT_FOUND),
            (AppError::ReadFailed("both accessors".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::Config("bad key".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
