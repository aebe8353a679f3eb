use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Result type for room rate operations
pub type Result<T> = std::result::Result<T, RoomRatesError>;

/// Errors that can occur in the room rates service
#[derive(Error, Debug)]
pub enum RoomRatesError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No route matched the request")]
    NotFound,

    #[error("Method not allowed for route")]
    MethodNotAllowed,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid route pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl RoomRatesError {
    /// HTTP status reported to the caller for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            RoomRatesError::Validation(_) => StatusCode::BAD_REQUEST,
            RoomRatesError::NotFound => StatusCode::NOT_FOUND,
            RoomRatesError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            RoomRatesError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Caller-facing message. Upstream and internal details stay in the logs.
    pub fn public_message(&self) -> &str {
        match self {
            RoomRatesError::Validation(msg) => msg,
            RoomRatesError::NotFound => "404 page not found",
            RoomRatesError::MethodNotAllowed => "Method Not Allowed",
            RoomRatesError::RateLimited => "Too Many Requests",
            RoomRatesError::Upstream(_) => "Error fetching room data",
            _ => "Internal Server Error",
        }
    }
}

impl IntoResponse for RoomRatesError {
    fn into_response(self) -> Response {
        (
            self.status_code(),
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.public_message().to_string(),
        )
            .into_response()
    }
}
