use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::assets::AssetError;
use crate::completion::CompletionError;
use crate::render::RenderError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
/// Bodies are plain text; the status code carries the category.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),
}

impl AppError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            AppError::Asset(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to load static content: {e}"),
            ),
            AppError::Completion(CompletionError::Timeout) => (
                StatusCode::GATEWAY_TIMEOUT,
                "The completion service did not respond in time".to_string(),
            ),
            AppError::Completion(CompletionError::Network(_)) => (
                StatusCode::BAD_GATEWAY,
                "The completion service could not be reached".to_string(),
            ),
            AppError::Completion(CompletionError::Status { status, .. }) => (
                StatusCode::BAD_GATEWAY,
                format!("The completion service rejected the request (status {status})"),
            ),
            AppError::Completion(CompletionError::Malformed(_)) => (
                StatusCode::BAD_GATEWAY,
                "The completion service returned an unreadable response".to_string(),
            ),
            AppError::Completion(CompletionError::EmptyChoices) => (
                StatusCode::BAD_GATEWAY,
                "The completion service returned no completion".to_string(),
            ),
            AppError::Render(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to render the persona document".to_string(),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        tracing::error!("{self}");

        (status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_asset_errors_are_server_errors_with_path() {
        let err = AppError::Asset(AssetError::Read {
            path: PathBuf::from("data/social_media_outputs.json"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        });
        let (status, message) = err.status_and_message();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(message.contains("social_media_outputs.json"));
    }

    #[test]
    fn test_completion_failures_are_distinct() {
        let cases = [
            AppError::Completion(CompletionError::Timeout),
            AppError::Completion(CompletionError::Status {
                status: 429,
                message: "slow down".to_string(),
            }),
            AppError::Completion(CompletionError::Malformed("eof".to_string())),
            AppError::Completion(CompletionError::EmptyChoices),
        ];
        let messages: Vec<String> = cases.iter().map(|e| e.status_and_message().1).collect();
        for (i, a) in messages.iter().enumerate() {
            for b in &messages[i + 1..] {
                assert_ne!(a, b);
            }
        }

        assert_eq!(cases[0].status_and_message().0, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(cases[1].status_and_message().0, StatusCode::BAD_GATEWAY);
        assert!(messages[1].contains("429"));
    }
}
