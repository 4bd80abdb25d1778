//! The inbound fetch event with typed parameters.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use http::{HeaderMap, Method, Request, Uri};

/// Unique request identifier for log correlation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(pub String);

static REQUEST_COUNTER: AtomicU64 = AtomicU64::new(0);

impl RequestId {
    /// Generate a new request ID.
    pub fn generate() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let sequence = REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed);

        Self(format!("{:x}-{:x}", nanos, sequence))
    }

    /// Create from an existing ID string.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Extracted route parameters (e.g., `:id` from `/products/:id`).
pub type RouteParams = HashMap<String, String>;

/// An inbound request as seen by application handlers.
///
/// The same shape is used on every edge runtime, so handlers and page
/// components never touch platform request types directly.
#[derive(Debug)]
pub struct FetchEvent {
    request: Request<()>,
    request_id: RequestId,
    params: RouteParams,
}

impl FetchEvent {
    /// Create a new event for the given request.
    pub fn new(request: Request<()>) -> Self {
        Self {
            request,
            request_id: RequestId::generate(),
            params: HashMap::new(),
        }
    }

    /// Create a GET event for a path, mostly useful in tests.
    pub fn get(uri: &str) -> Self {
        let mut request = Request::new(());
        if let Ok(uri) = uri.parse::<Uri>() {
            *request.uri_mut() = uri;
        }
        Self::new(request)
    }

    /// Use an existing request ID (e.g. one forwarded by the platform).
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    /// Attach a route parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// The underlying request.
    pub fn request(&self) -> &Request<()> {
        &self.request
    }

    /// Request ID for this event.
    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    /// HTTP method.
    pub fn method(&self) -> &Method {
        self.request.method()
    }

    /// Request path.
    pub fn path(&self) -> &str {
        self.request.uri().path()
    }

    /// Request headers.
    pub fn headers(&self) -> &HeaderMap {
        self.request.headers()
    }

    /// Get a header value by name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.request
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
    }

    /// Get a route parameter by name.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(|s| s.as_str())
    }

    /// Get a query parameter by name.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.request.uri().query().and_then(|query| {
            query.split('&').find_map(|pair| {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                (key == name).then_some(value)
            })
        })
    }
}
