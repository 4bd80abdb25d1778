//! HTTP responses for the Keywork edge framework.
//!
//! This crate provides:
//! - `Body` / `BodyStream` - Response bodies, buffered or streamed
//! - `Response` - The canonical response delivered to the platform
//! - Response constructors for HTML, JSON, text, errors and 304s
//! - `CachableResponse` - ETag and `Cache-Control` aware responses
//!
//! # Example
//!
//! ```ignore
//! use keywork_http::{CachableResponse, CacheControlDirectives};
//!
//! let response = CachableResponse::new("<h1>Hello</h1>")
//!     .with_request(event.request())
//!     .with_etag(generate_etag(b"<h1>Hello</h1>"))
//!     .with_cache_control(CacheControlDirectives::public(Duration::from_secs(300)))
//!     .build()?;
//! ```

mod body;
mod cache;
mod responses;

pub use body::*;
pub use cache::*;
pub use responses::*;
