//! The resource error returned across the framework boundary.

use http::StatusCode;
use thiserror::Error;

/// Message used when a render could not be started.
pub const RENDER_FAILED_MESSAGE: &str =
    "A runtime error occurred while rendering. See server logs for additional information.";

/// Message used when a render reported an error while streaming.
pub const STREAM_FAILED_MESSAGE: &str =
    "A stream error occurred while rendering. See server logs for additional information.";

/// An error carrying an HTTP status and a message that is safe to show to clients.
///
/// Anything that fails inside the framework is reduced to a `ResourceError`
/// before it reaches the caller. Underlying library errors are logged
/// server-side and never stored here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{status}: {message}")]
pub struct ResourceError {
    status: StatusCode,
    message: String,
}

impl ResourceError {
    /// Create a new resource error.
    pub fn new(message: impl Into<String>, status: StatusCode) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Create a 500 Internal Server Error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Create a 404 Not Found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::NOT_FOUND)
    }

    /// Create a 400 Bad Request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::BAD_REQUEST)
    }

    /// The render never produced a stream.
    pub fn render_failed() -> Self {
        Self::internal(RENDER_FAILED_MESSAGE)
    }

    /// The render produced a stream but reported an error while doing so.
    pub fn stream_failed() -> Self {
        Self::internal(STREAM_FAILED_MESSAGE)
    }

    /// A raw byte stream was returned where a response was expected.
    pub fn unsupported_stream() -> Self {
        Self::internal(
            "Keywork cannot infer the 'Content-Type' for a byte stream. Instead, wrap this value in a `Response`",
        )
    }

    /// A value of the given runtime type cannot become a response.
    pub fn unsupported_type(type_name: &str) -> Self {
        Self::internal(format!(
            "Keywork could not infer the appropriate `Response` constructor for type {}.",
            type_name
        ))
    }

    /// HTTP status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Client-safe message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<http::Error> for ResourceError {
    fn from(_: http::Error) -> Self {
        ResourceError::internal("Failed to build the HTTP response")
    }
}

impl From<http::header::InvalidHeaderValue> for ResourceError {
    fn from(_: http::header::InvalidHeaderValue) -> Self {
        ResourceError::internal("Invalid header value")
    }
}
