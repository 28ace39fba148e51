// src/errors.rs
use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeMachineError {
    #[error("Unreadable file: {0}")]
    UnreadableFile(String),

    /// Carries the message shown to the user verbatim.
    #[error("{0}")]
    TransformationFailed(String),

    #[error("Unknown era: {0}")]
    UnknownEra(String),

    #[error("A transformation is already in progress")]
    SessionBusy,

    #[error("Nothing to download: {0}")]
    NothingToDownload(String),

    #[error("Invalid embedded image: {0}")]
    InvalidEmbeddedImage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl TimeMachineError {
    fn kind(&self) -> &'static str {
        match self {
            TimeMachineError::UnreadableFile(_) => "Unreadable file",
            TimeMachineError::TransformationFailed(_) => "Transformation failed",
            TimeMachineError::UnknownEra(_) => "Unknown era",
            TimeMachineError::SessionBusy => "Session busy",
            TimeMachineError::NothingToDownload(_) => "Not found",
            TimeMachineError::InvalidEmbeddedImage(_) => "Image data error",
            TimeMachineError::Config(_) => "Configuration error",
        }
    }
}

impl ResponseError for TimeMachineError {
    fn status_code(&self) -> StatusCode {
        match self {
            TimeMachineError::UnreadableFile(_) | TimeMachineError::UnknownEra(_) => {
                StatusCode::BAD_REQUEST
            }
            TimeMachineError::TransformationFailed(_) => StatusCode::BAD_GATEWAY,
            TimeMachineError::SessionBusy => StatusCode::CONFLICT,
            TimeMachineError::NothingToDownload(_) => StatusCode::NOT_FOUND,
            TimeMachineError::InvalidEmbeddedImage(_) | TimeMachineError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.kind(),
            "message": self.to_string()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transformation_failed_displays_bare_message() {
        let err = TimeMachineError::TransformationFailed("no image returned".to_string());
        assert_eq!(err.to_string(), "no image returned");
    }

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(
            TimeMachineError::UnreadableFile("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(TimeMachineError::SessionBusy.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            TimeMachineError::TransformationFailed("x".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            TimeMachineError::NothingToDownload("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
    }
}
