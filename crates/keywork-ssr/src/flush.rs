//! Explicit flush control for streamed markup.

use serde::Deserialize;

/// Default number of bytes buffered before a flush at the next boundary.
pub const DEFAULT_MAX_BUFFER: usize = 8192;

/// When buffered markup becomes a chunk on the stream.
///
/// Markup is only ever flushed at a component boundary (before a component
/// renders) or when the render finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlushPolicy {
    /// Flush the shell at the first boundary, then whenever the buffer fills.
    #[default]
    AfterShell,
    /// Flush at every component boundary.
    AfterEachComponent,
    /// Flush only when the render finishes.
    Manual,
}

impl FlushPolicy {
    /// Check if the shell is flushed before the first component renders.
    pub fn flush_after_shell(&self) -> bool {
        matches!(self, Self::AfterShell | Self::AfterEachComponent)
    }

    /// Check if every component boundary flushes.
    pub fn flush_after_component(&self) -> bool {
        matches!(self, Self::AfterEachComponent)
    }
}

/// Controller for managing flush behavior.
#[derive(Debug)]
pub struct FlushController {
    policy: FlushPolicy,
    pending_bytes: usize,
    /// Maximum bytes to buffer (0 = flush at every boundary).
    max_buffer: usize,
    shell_flushed: bool,
}

impl FlushController {
    /// Create a new flush controller with given policy.
    pub fn new(policy: FlushPolicy) -> Self {
        Self {
            policy,
            pending_bytes: 0,
            max_buffer: DEFAULT_MAX_BUFFER,
            shell_flushed: false,
        }
    }

    /// Set maximum buffer size before auto-flush.
    pub fn with_max_buffer(mut self, bytes: usize) -> Self {
        self.max_buffer = bytes;
        self
    }

    /// Record bytes added to buffer.
    pub fn add_bytes(&mut self, count: usize) {
        self.pending_bytes += count;
    }

    /// Bytes buffered since the last flush.
    pub fn pending_bytes(&self) -> usize {
        self.pending_bytes
    }

    /// Check if a flush is needed at a component boundary.
    pub fn should_flush_at_boundary(&self) -> bool {
        if self.pending_bytes == 0 {
            return false;
        }

        match self.policy {
            FlushPolicy::AfterShell => {
                !self.shell_flushed || self.max_buffer == 0 || self.pending_bytes >= self.max_buffer
            }
            FlushPolicy::AfterEachComponent => true,
            FlushPolicy::Manual => false,
        }
    }

    /// Reset pending byte count after flush.
    pub fn reset(&mut self) {
        self.pending_bytes = 0;
        self.shell_flushed = true;
    }

    /// Get current policy.
    pub fn policy(&self) -> FlushPolicy {
        self.policy
    }

    /// Get the buffer limit.
    pub fn max_buffer(&self) -> usize {
        self.max_buffer
    }
}

impl Default for FlushController {
    fn default() -> Self {
        Self::new(FlushPolicy::default())
    }
}
