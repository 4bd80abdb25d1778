//! Canonical response constructors.

use std::error::Error;

use http::header::{HeaderValue, CONTENT_TYPE, ETAG};
use http::StatusCode;
use keywork_core::ResourceError;
use serde::Serialize;

use crate::body::{Body, Response};

/// Content types set by the response constructors.
pub mod content_types {
    /// HTML documents.
    pub const HTML: &str = "text/html; charset=utf-8";
    /// JSON payloads.
    pub const JSON: &str = "application/json; charset=utf-8";
    /// Plain text, matching what edge runtimes infer for string bodies.
    pub const TEXT: &str = "text/plain;charset=UTF-8";
}

fn with_status(status: StatusCode, content_type: Option<&'static str>, body: Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    if let Some(content_type) = content_type {
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    }
    response
}

/// A 200 response with an HTML body.
pub fn html_response(body: impl Into<Body>) -> Response {
    with_status(StatusCode::OK, Some(content_types::HTML), body.into())
}

/// A 200 response with a plain-text body.
pub fn text_response(body: impl Into<Body>) -> Response {
    with_status(StatusCode::OK, Some(content_types::TEXT), body.into())
}

/// A 200 response with the JSON serialization of `value`.
pub fn json_response<T: Serialize + ?Sized>(value: &T) -> Result<Response, ResourceError> {
    let bytes = serde_json::to_vec(value)
        .map_err(|_| ResourceError::internal("Failed to serialize the JSON response body"))?;
    Ok(json_bytes_response(bytes))
}

/// A 200 response around already-serialized JSON.
pub fn json_bytes_response(bytes: Vec<u8>) -> Response {
    with_status(StatusCode::OK, Some(content_types::JSON), Body::Full(bytes))
}

/// A 204 response with no body.
pub fn no_content_response() -> Response {
    with_status(StatusCode::NO_CONTENT, None, Body::Empty)
}

/// An error response derived from `error`.
///
/// A [`ResourceError`] supplies its own status and message. Any other error
/// becomes a 500 whose body is the canonical reason phrase, so internal error
/// text never reaches the client.
pub fn error_response(error: &(dyn Error + 'static)) -> Response {
    let (status, message) = match error.downcast_ref::<ResourceError>() {
        Some(resource_error) => (resource_error.status(), resource_error.message().to_string()),
        None => {
            let status = StatusCode::INTERNAL_SERVER_ERROR;
            (status, status.canonical_reason().unwrap_or_default().to_string())
        }
    };

    with_status(status, Some(content_types::TEXT), Body::from(message))
}

/// A 304 response carrying the matched ETag.
pub fn not_modified_response(etag: Option<&str>) -> Result<Response, ResourceError> {
    let mut response = with_status(StatusCode::NOT_MODIFIED, None, Body::Empty);
    if let Some(etag) = etag {
        response
            .headers_mut()
            .insert(ETAG, HeaderValue::from_str(etag)?);
    }
    Ok(response)
}
