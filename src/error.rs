// src/error.rs
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    MethodNotAllowed(&'static str),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("invalid upstream url: {0}")]
    UpstreamUrl(#[from] url::ParseError),

    #[error("credential is not a valid header value")]
    InvalidCredential(#[from] reqwest::header::InvalidHeaderValue),
}

pub const METHOD_NOT_ALLOWED: &str = "Method not allowed";
pub const INTERNAL_SERVER_ERROR: &str = "Internal server error";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::MethodNotAllowed(message) => (StatusCode::METHOD_NOT_ALLOWED, *message),
            // Causes are logged by the handler, inside its request span.
            AppError::Upstream(_) | AppError::UpstreamUrl(_) | AppError::InvalidCredential(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_SERVER_ERROR)
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
