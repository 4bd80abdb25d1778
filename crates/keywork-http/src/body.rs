//! Response bodies.

use std::fmt;
use std::pin::Pin;

use futures::stream::{self, Stream, StreamExt};
use keywork_core::ResourceError;

/// A streamed body. An `Err` item means production failed after some
/// bytes may already have been sent; the transport should abort.
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, ResourceError>> + Send>>;

/// The canonical response delivered to the platform.
pub type Response = http::Response<Body>;

/// Body of a canonical [`Response`].
#[derive(Default)]
pub enum Body {
    /// No body.
    #[default]
    Empty,
    /// A fully buffered body.
    Full(Vec<u8>),
    /// A body produced incrementally.
    Stream(BodyStream),
}

impl Body {
    /// Create an empty body.
    pub fn empty() -> Self {
        Self::Empty
    }

    /// Create a streaming body.
    pub fn stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Vec<u8>, ResourceError>> + Send + 'static,
    {
        Self::Stream(Box::pin(stream))
    }

    /// Whether the body is known to carry no bytes.
    ///
    /// Streams are never considered empty since their length is unknown.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Full(bytes) => bytes.is_empty(),
            Self::Stream(_) => false,
        }
    }

    /// Whether the body is streamed.
    pub fn is_stream(&self) -> bool {
        matches!(self, Self::Stream(_))
    }

    /// The buffered bytes, if the body is not streamed.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Empty => Some(&[]),
            Self::Full(bytes) => Some(bytes),
            Self::Stream(_) => None,
        }
    }

    /// Convert into a stream regardless of variant.
    pub fn into_stream(self) -> BodyStream {
        match self {
            Self::Empty => Box::pin(stream::empty()),
            Self::Full(bytes) => Box::pin(stream::once(async move { Ok(bytes) })),
            Self::Stream(stream) => stream,
        }
    }

    /// Read the whole body, draining a stream if necessary.
    pub async fn collect(self) -> Result<Vec<u8>, ResourceError> {
        match self {
            Self::Empty => Ok(Vec::new()),
            Self::Full(bytes) => Ok(bytes),
            Self::Stream(mut stream) => {
                let mut bytes = Vec::new();
                while let Some(chunk) = stream.next().await {
                    bytes.extend_from_slice(&chunk?);
                }
                Ok(bytes)
            }
        }
    }

    /// Read the whole body as UTF-8 text.
    pub async fn text(self) -> Result<String, ResourceError> {
        let bytes = self.collect().await?;
        String::from_utf8(bytes).map_err(|_| ResourceError::internal("Body is not valid UTF-8"))
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Body::Empty"),
            Self::Full(bytes) => f.debug_tuple("Body::Full").field(&bytes.len()).finish(),
            Self::Stream(_) => f.write_str("Body::Stream(..)"),
        }
    }
}

impl From<()> for Body {
    fn from(_: ()) -> Self {
        Self::Empty
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Self::Full(s.into_bytes())
    }
}

impl From<&str> for Body {
    fn from(s: &str) -> Self {
        Self::Full(s.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Full(bytes)
    }
}

impl From<&[u8]> for Body {
    fn from(bytes: &[u8]) -> Self {
        Self::Full(bytes.to_vec())
    }
}

impl From<BodyStream> for Body {
    fn from(stream: BodyStream) -> Self {
        Self::Stream(stream)
    }
}
