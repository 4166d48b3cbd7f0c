use crate::errors::Error;
use axum::{http::StatusCode, response::IntoResponse};
use log::error;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub message: String,
    pub kind: &'static str,
}

impl ApiError {
    pub fn new(message: impl Into<String>, kind: &'static str) -> Self {
        ApiError {
            message: message.into(),
            kind,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        error!("API request failed: {self}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            axum::Json(ApiError::new(self.to_string(), self.kind())),
        )
            .into_response()
    }
}
