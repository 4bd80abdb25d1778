//! Client-side caching: `Cache-Control` directives and ETag validation.

use std::time::Duration;

use http::header::{HeaderMap, HeaderName, HeaderValue, CACHE_CONTROL, CONTENT_TYPE, ETAG, IF_NONE_MATCH};
use http::{Request, StatusCode};
use keywork_core::ResourceError;
use serde::{Deserialize, Serialize};

use crate::body::{Body, Response};
use crate::responses::not_modified_response;

/// Cache scope determining who can cache the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheScope {
    /// Cacheable by CDN and browser (shared cache).
    Public,
    /// Cacheable by browser only (private cache).
    Private,
    /// No caching.
    #[default]
    None,
}

impl CacheScope {
    /// Get the Cache-Control directive for this scope.
    pub fn cache_control_directive(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::None => "no-store",
        }
    }
}

/// Directives used to build a `Cache-Control` header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheControlDirectives {
    /// Cache scope.
    pub scope: CacheScope,
    /// `max-age`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age: Option<Duration>,
    /// `s-maxage`, for shared caches only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s_max_age: Option<Duration>,
    /// Stale-while-revalidate window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stale_while_revalidate: Option<Duration>,
    /// Stale-if-error window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stale_if_error: Option<Duration>,
    /// Require revalidation with the origin on every use.
    pub no_cache: bool,
    /// Forbid serving stale content once expired.
    pub must_revalidate: bool,
    /// The body never changes for this URL.
    pub immutable: bool,
}

impl CacheControlDirectives {
    /// Directives that forbid caching.
    pub fn none() -> Self {
        Self::default()
    }

    /// Create public directives.
    pub fn public(max_age: Duration) -> Self {
        Self {
            scope: CacheScope::Public,
            max_age: Some(max_age),
            ..Default::default()
        }
    }

    /// Create private directives.
    pub fn private(max_age: Duration) -> Self {
        Self {
            scope: CacheScope::Private,
            max_age: Some(max_age),
            ..Default::default()
        }
    }

    /// Set the shared-cache max age.
    pub fn with_s_max_age(mut self, duration: Duration) -> Self {
        self.s_max_age = Some(duration);
        self
    }

    /// Set stale-while-revalidate window.
    pub fn with_swr(mut self, duration: Duration) -> Self {
        self.stale_while_revalidate = Some(duration);
        self
    }

    /// Set stale-if-error window.
    pub fn with_stale_if_error(mut self, duration: Duration) -> Self {
        self.stale_if_error = Some(duration);
        self
    }

    /// Require revalidation on every use.
    pub fn with_no_cache(mut self) -> Self {
        self.no_cache = true;
        self
    }

    /// Forbid stale responses after expiry.
    pub fn with_must_revalidate(mut self) -> Self {
        self.must_revalidate = true;
        self
    }

    /// Mark the response immutable.
    pub fn with_immutable(mut self) -> Self {
        self.immutable = true;
        self
    }

    /// Generate the `Cache-Control` header value.
    pub fn cache_control_header(&self) -> String {
        if self.scope == CacheScope::None {
            return "no-store".to_string();
        }

        let mut parts = vec![self.scope.cache_control_directive().to_string()];

        if self.no_cache {
            parts.push("no-cache".to_string());
        }

        if let Some(max_age) = self.max_age {
            parts.push(format!("max-age={}", max_age.as_secs()));
        }

        if let Some(s_max_age) = self.s_max_age {
            parts.push(format!("s-maxage={}", s_max_age.as_secs()));
        }

        if let Some(swr) = self.stale_while_revalidate {
            parts.push(format!("stale-while-revalidate={}", swr.as_secs()));
        }

        if let Some(sie) = self.stale_if_error {
            parts.push(format!("stale-if-error={}", sie.as_secs()));
        }

        if self.must_revalidate {
            parts.push("must-revalidate".to_string());
        }

        if self.immutable {
            parts.push("immutable".to_string());
        }

        parts.join(", ")
    }
}

/// Build a `Cache-Control` header pair from directives.
pub fn create_cache_control_header(directives: &CacheControlDirectives) -> (HeaderName, HeaderValue) {
    let value = HeaderValue::from_str(&directives.cache_control_header())
        .unwrap_or_else(|_| HeaderValue::from_static("no-store"));
    (CACHE_CONTROL, value)
}

/// Generate a quoted ETag from content.
pub fn generate_etag(content: &[u8]) -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    format!("\"{:x}\"", hasher.finish())
}

fn strip_weak(tag: &str) -> &str {
    tag.strip_prefix("W/").unwrap_or(tag)
}

/// Whether the request's `If-None-Match` header matches `etag`.
///
/// Comparison is weak: `W/"a"` matches `"a"`. A `*` matches any ETag.
pub fn is_etag_match(headers: &HeaderMap, etag: Option<&str>) -> bool {
    let Some(etag) = etag else {
        return false;
    };
    let etag = strip_weak(etag.trim());

    headers
        .get_all(IF_NONE_MATCH)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .any(|candidate| candidate == "*" || strip_weak(candidate) == etag)
}

/// A response that honours client-side caching.
///
/// When a request is supplied and its `If-None-Match` matches the ETag,
/// [`build`](Self::build) returns a 304 Not Modified instead of the body.
#[derive(Debug)]
pub struct CachableResponse<'a> {
    body: Body,
    request_headers: Option<&'a HeaderMap>,
    etag: Option<String>,
    cache_control: Option<CacheControlDirectives>,
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl<'a> CachableResponse<'a> {
    /// Create a cachable response for a body.
    pub fn new(body: impl Into<Body>) -> Self {
        Self {
            body: body.into(),
            request_headers: None,
            etag: None,
            cache_control: None,
            headers: Vec::new(),
        }
    }

    /// Check the given request for ETag headers.
    pub fn with_request<B>(mut self, request: &'a Request<B>) -> Self {
        self.request_headers = Some(request.headers());
        self
    }

    /// Set the ETag for the body.
    pub fn with_etag(mut self, etag: impl Into<String>) -> Self {
        self.etag = Some(etag.into());
        self
    }

    /// Set the `Cache-Control` directives.
    pub fn with_cache_control(mut self, directives: CacheControlDirectives) -> Self {
        self.cache_control = Some(directives);
        self
    }

    /// Add an extra header.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.push((name, value));
        self
    }

    /// Set the content type.
    pub fn with_content_type(self, content_type: &'static str) -> Self {
        self.with_header(CONTENT_TYPE, HeaderValue::from_static(content_type))
    }

    /// Build the response.
    pub fn build(self) -> Result<Response, ResourceError> {
        if let Some(headers) = self.request_headers {
            if is_etag_match(headers, self.etag.as_deref()) {
                return not_modified_response(self.etag.as_deref());
            }
        }

        let mut response = Response::new(self.body);
        *response.status_mut() = StatusCode::OK;

        let headers = response.headers_mut();
        for (name, value) in self.headers {
            headers.insert(name, value);
        }

        let (name, value) = create_cache_control_header(&self.cache_control.unwrap_or_default());
        headers.insert(name, value);

        if let Some(etag) = &self.etag {
            headers.insert(ETAG, HeaderValue::from_str(etag)?);
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with(if_none_match: &str) -> Request<()> {
        Request::builder()
            .uri("/")
            .header(IF_NONE_MATCH, if_none_match)
            .body(())
            .unwrap()
    }

    // === Cache-Control Tests ===

    #[test]
    fn test_cache_control_none() {
        assert_eq!(CacheControlDirectives::none().cache_control_header(), "no-store");
    }

    #[test]
    fn test_cache_control_public_full() {
        let directives = CacheControlDirectives::public(Duration::from_secs(300))
            .with_s_max_age(Duration::from_secs(600))
            .with_swr(Duration::from_secs(60))
            .with_stale_if_error(Duration::from_secs(3600))
            .with_must_revalidate();

        assert_eq!(
            directives.cache_control_header(),
            "public, max-age=300, s-maxage=600, stale-while-revalidate=60, stale-if-error=3600, must-revalidate"
        );
    }

    #[test]
    fn test_cache_control_private_immutable() {
        let directives = CacheControlDirectives::private(Duration::from_secs(31_536_000))
            .with_immutable();

        assert_eq!(
            directives.cache_control_header(),
            "private, max-age=31536000, immutable"
        );
    }

    #[test]
    fn test_cache_control_no_cache() {
        let directives = CacheControlDirectives::public(Duration::from_secs(0)).with_no_cache();
        assert_eq!(directives.cache_control_header(), "public, no-cache, max-age=0");
    }

    #[test]
    fn test_create_cache_control_header() {
        let (name, value) =
            create_cache_control_header(&CacheControlDirectives::public(Duration::from_secs(5)));
        assert_eq!(name, CACHE_CONTROL);
        assert_eq!(value, "public, max-age=5");
    }

    // === ETag Tests ===

    #[test]
    fn test_generate_etag_is_quoted_and_stable() {
        let a = generate_etag(b"hello");
        let b = generate_etag(b"hello");
        let c = generate_etag(b"world");

        assert!(a.starts_with('"') && a.ends_with('"'));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_is_etag_match_exact() {
        let request = request_with("\"abc\"");
        assert!(is_etag_match(request.headers(), Some("\"abc\"")));
        assert!(!is_etag_match(request.headers(), Some("\"def\"")));
    }

    #[test]
    fn test_is_etag_match_list_and_weak() {
        let request = request_with("\"x\", W/\"abc\"");
        assert!(is_etag_match(request.headers(), Some("\"abc\"")));
    }

    #[test]
    fn test_is_etag_match_wildcard() {
        let request = request_with("*");
        assert!(is_etag_match(request.headers(), Some("\"anything\"")));
    }

    #[test]
    fn test_is_etag_match_without_etag() {
        let request = request_with("*");
        assert!(!is_etag_match(request.headers(), None));
    }

    // === CachableResponse Tests ===

    #[test]
    fn test_cachable_response_sets_headers() {
        let response = CachableResponse::new("body")
            .with_etag("\"v1\"")
            .with_cache_control(CacheControlDirectives::public(Duration::from_secs(60)))
            .with_content_type("text/plain")
            .build()
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(ETAG).unwrap(), "\"v1\"");
        assert_eq!(response.headers().get(CACHE_CONTROL).unwrap(), "public, max-age=60");
        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "text/plain");
    }

    #[test]
    fn test_cachable_response_defaults_to_no_store() {
        let response = CachableResponse::new("body").build().unwrap();
        assert_eq!(response.headers().get(CACHE_CONTROL).unwrap(), "no-store");
        assert!(response.headers().get(ETAG).is_none());
    }

    #[test]
    fn test_cachable_response_not_modified() {
        let request = request_with("\"v1\"");
        let response = CachableResponse::new("body")
            .with_request(&request)
            .with_etag("\"v1\"")
            .build()
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        assert!(response.body().is_empty());
        assert_eq!(response.headers().get(ETAG).unwrap(), "\"v1\"");
    }

    #[test]
    fn test_cachable_response_stale_etag_sends_body() {
        let request = request_with("\"v0\"");
        let response = CachableResponse::new("body")
            .with_request(&request)
            .with_etag("\"v1\"")
            .build()
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body().as_bytes(), Some(&b"body"[..]));
    }
}
