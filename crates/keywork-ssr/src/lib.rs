//! Streaming server-side rendering for Keywork.
//!
//! A page [`Element`] is assembled into a full document tree and handed to a
//! [`StreamRenderer`], which writes markup to a [`RenderStream`] as the tree
//! is walked:
//! - `Node` / `Component` - The renderable tree
//! - `RenderContext` - Per-render data visible to every component
//! - `DocumentShell` / `Providers` - Pluggable document and app wrappers
//! - `FlushPolicy` - When buffered markup becomes a chunk
//! - `render_jsx_to_stream` - The render orchestrator
//!
//! # Example
//!
//! ```ignore
//! let page = Element::from_fn(|cx| {
//!     let title = cx.static_prop("title").and_then(|v| v.as_str()).unwrap_or("Home");
//!     Ok(Node::element("h1", Node::text(title)))
//! })
//! .with_static_props(&json!({ "title": "Home" }))?;
//!
//! let stream = render_jsx_to_stream(event, page, None).await?;
//! ```

mod assembly;
mod context;
mod document;
mod embed;
mod flush;
mod node;
mod options;
mod render;
mod stream;

pub use assembly::*;
pub use context::*;
pub use document::*;
pub use embed::*;
pub use flush::*;
pub use node::*;
pub use options::*;
pub use render::*;
pub use stream::*;
