//! Keywork: response normalization and streaming server-side rendering for
//! edge runtimes.
//!
//! Handlers return anything convertible into a [`ResponseLike`]; the
//! framework turns it into a canonical [`Response`](keywork_http::Response)
//! with [`cast_to_response`]:
//!
//! ```ignore
//! use keywork::prelude::*;
//!
//! async fn handle(event: Arc<FetchEvent>) -> Result<Response, ResourceError> {
//!     let page = Element::from_fn(|cx| {
//!         let title = cx.static_prop("title").and_then(|v| v.as_str()).unwrap_or("Home");
//!         Ok(Node::element("h1", Node::text(title)))
//!     })
//!     .with_static_props(&json!({ "title": "Home" }))
//!     .map_err(|_| ResourceError::internal("Invalid static props"))?;
//!
//!     let options = KeyworkConfig::load("keywork.toml")
//!         .map(|config| config.render_options())
//!         .unwrap_or_default();
//!
//!     cast_to_response(page, event, Some(&options)).await
//! }
//! ```

pub use keywork_core;
pub use keywork_http;
pub use keywork_observability;
pub use keywork_ssr;

mod config;
mod convert;

pub use config::*;
pub use convert::*;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::*;
    pub use crate::convert::*;
    pub use keywork_core::*;
    pub use keywork_http::*;
    pub use keywork_observability::*;
    pub use keywork_ssr::*;
}
