//! Observability infrastructure for the Keywork edge framework.
//!
//! This crate provides:
//! - `LogLevel` - Verbosity levels shared by the logger and render options
//! - `KeyworkLogger` - Structured logging scoped to a component and request
//! - `LogCapture` - In-memory log collection for tests and local debugging

mod logging;

pub use logging::*;

// Re-export RequestId from keywork-core for convenience
pub use keywork_core::RequestId;
