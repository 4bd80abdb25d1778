//! Converting handler return values into canonical responses.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use keywork_core::{FetchEvent, ResourceError};
use keywork_http::{
    error_response, html_response, json_bytes_response, no_content_response, text_response, Body,
    BodyStream, Response,
};
use keywork_ssr::{render_jsx_to_stream, Element, RenderOptions};
use serde::Serialize;
use serde_json::Value;

/// Prefix that marks a string as a full HTML document.
pub const DOCTYPE_PREFIX: &str = "<!DOCTYPE";

/// A value that serializes to a JSON response body.
pub trait JsonBody: Send {
    /// Serialize to JSON bytes.
    fn to_json_bytes(&self) -> serde_json::Result<Vec<u8>>;
}

impl<T: Serialize + Send> JsonBody for T {
    fn to_json_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// Anything a handler may return in place of a [`Response`].
pub enum ResponseLike {
    /// An already-built response.
    Response(Response),
    /// A page to render.
    Element(Element),
    /// A value sent as JSON.
    Json(Box<dyn JsonBody>),
    /// No value.
    Empty,
    /// An error to report to the client.
    Error(Box<dyn Error + Send + Sync>),
    /// Text, or an HTML document when it starts with `<!DOCTYPE`.
    Text(String),
    /// A raw byte stream without a content type.
    Stream(BodyStream),
    /// A value of a type with no response mapping, by type name.
    Unsupported(String),
}

/// Variant tag of a [`ResponseLike`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseKind {
    Response,
    Error,
    Stream,
    Empty,
    Text,
    Element,
    Json,
    Unsupported,
}

impl ResponseKind {
    /// Order in which values are classified; the first match wins.
    pub const PRIORITY: [ResponseKind; 8] = [
        ResponseKind::Response,
        ResponseKind::Error,
        ResponseKind::Stream,
        ResponseKind::Empty,
        ResponseKind::Text,
        ResponseKind::Element,
        ResponseKind::Json,
        ResponseKind::Unsupported,
    ];
}

impl ResponseLike {
    /// Wrap a serializable value.
    pub fn json(value: impl Serialize + Send + 'static) -> Self {
        Self::Json(Box::new(value))
    }

    /// Wrap an error.
    pub fn error(error: impl Error + Send + Sync + 'static) -> Self {
        Self::Error(Box::new(error))
    }

    /// Accept a response built over another body type.
    ///
    /// Status, headers, version and body are kept.
    pub fn from_response<B: Into<Body>>(response: http::Response<B>) -> Self {
        Self::Response(response.map(Into::into))
    }

    /// A value of a type with no response mapping.
    pub fn unsupported(type_name: impl Into<String>) -> Self {
        Self::Unsupported(type_name.into())
    }

    /// Classify a dynamic JSON value.
    ///
    /// `null` is empty, strings are text, arrays and objects are JSON; booleans
    /// and numbers have no response mapping.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Null => Self::Empty,
            Value::String(text) => Self::Text(text),
            Value::Array(_) | Value::Object(_) => Self::Json(Box::new(value)),
            Value::Bool(_) => Self::unsupported("boolean"),
            Value::Number(_) => Self::unsupported("number"),
        }
    }

    /// Variant tag.
    pub fn kind(&self) -> ResponseKind {
        match self {
            Self::Response(_) => ResponseKind::Response,
            Self::Element(_) => ResponseKind::Element,
            Self::Json(_) => ResponseKind::Json,
            Self::Empty => ResponseKind::Empty,
            Self::Error(_) => ResponseKind::Error,
            Self::Text(_) => ResponseKind::Text,
            Self::Stream(_) => ResponseKind::Stream,
            Self::Unsupported(_) => ResponseKind::Unsupported,
        }
    }
}

impl fmt::Debug for ResponseLike {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Response(response) => f.debug_tuple("Response").field(&response.status()).finish(),
            Self::Element(element) => f.debug_tuple("Element").field(element).finish(),
            Self::Json(_) => f.write_str("Json(..)"),
            Self::Empty => f.write_str("Empty"),
            Self::Error(error) => f.debug_tuple("Error").field(&error.to_string()).finish(),
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
            Self::Unsupported(type_name) => f.debug_tuple("Unsupported").field(type_name).finish(),
        }
    }
}

impl From<Response> for ResponseLike {
    fn from(response: Response) -> Self {
        Self::Response(response)
    }
}

impl From<Element> for ResponseLike {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

impl From<ResourceError> for ResponseLike {
    fn from(error: ResourceError) -> Self {
        Self::error(error)
    }
}

impl From<anyhow::Error> for ResponseLike {
    fn from(error: anyhow::Error) -> Self {
        match error.downcast::<ResourceError>() {
            Ok(resource_error) => Self::error(resource_error),
            Err(error) => Self::Error(error.into()),
        }
    }
}

impl From<String> for ResponseLike {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for ResponseLike {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<()> for ResponseLike {
    fn from(_: ()) -> Self {
        Self::Empty
    }
}

impl<T: Into<ResponseLike>> From<Option<T>> for ResponseLike {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => value.into(),
            None => Self::Empty,
        }
    }
}

impl From<BodyStream> for ResponseLike {
    fn from(stream: BodyStream) -> Self {
        Self::Stream(stream)
    }
}

impl From<Value> for ResponseLike {
    fn from(value: Value) -> Self {
        Self::from_value(value)
    }
}

/// Turn a handler's return value into a response.
///
/// Errors are reported as error responses rather than failures. The only
/// failures are values that cannot be sent safely: raw streams, values of
/// unsupported types, JSON that fails to serialize, and pages that fail to
/// render.
pub async fn cast_to_response(
    value: impl Into<ResponseLike>,
    event: Arc<FetchEvent>,
    options: Option<&RenderOptions>,
) -> Result<Response, ResourceError> {
    let value = value.into();

    tracing::debug!(
        kind = ?value.kind(),
        request_id = %event.request_id(),
        "casting value to response"
    );

    match value {
        ResponseLike::Response(response) => Ok(response),
        ResponseLike::Error(error) => Ok(error_response(&*error)),
        ResponseLike::Stream(_) => Err(ResourceError::unsupported_stream()),
        ResponseLike::Empty => Ok(no_content_response()),
        ResponseLike::Text(text) if text.starts_with(DOCTYPE_PREFIX) => Ok(html_response(text)),
        ResponseLike::Text(text) => Ok(text_response(text)),
        ResponseLike::Element(element) => {
            let stream = render_jsx_to_stream(event, element, options).await?;
            Ok(html_response(Body::stream(stream)))
        }
        ResponseLike::Json(body) => match body.to_json_bytes() {
            Ok(bytes) => Ok(json_bytes_response(bytes)),
            Err(error) => {
                tracing::warn!(error = %error, "failed to serialize JSON response body");
                Err(ResourceError::internal(
                    "Failed to serialize the JSON response body",
                ))
            }
        },
        ResponseLike::Unsupported(type_name) => Err(ResourceError::unsupported_type(&type_name)),
    }
}
