//! Core abstractions for the Keywork edge framework.
//!
//! This crate provides the fundamental types shared by every other crate:
//! - `ResourceError` - The single error kind returned to callers
//! - `FetchEvent` - The inbound request and its per-request data
//! - `RequestId` - Request identifier used for log correlation

mod error;
mod event;

pub use error::*;
pub use event::*;
