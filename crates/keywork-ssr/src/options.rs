//! Per-call render configuration.

use std::fmt;
use std::sync::Arc;

use keywork_observability::{KeyworkLogger, LogLevel, DEFAULT_LOG_LEVEL};

use crate::context::{ErrorSink, RENDERER_SCOPE};
use crate::document::{DocumentShell, KeyworkHtmlDocument, KeyworkProviders, Providers};
use crate::stream::{DefaultStreamRenderer, StreamRenderer};

/// Options for a single render.
///
/// Every field is optional; unset fields fall back to defaults built when the
/// render starts.
#[derive(Clone, Default)]
pub struct RenderOptions {
    stream_renderer: Option<Arc<dyn StreamRenderer>>,
    document: Option<Arc<dyn DocumentShell>>,
    providers: Option<Arc<dyn Providers>>,
    log_level: Option<LogLevel>,
    logger: Option<KeyworkLogger>,
    on_error: Option<ErrorSink>,
}

impl RenderOptions {
    /// Create empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom stream renderer.
    pub fn with_stream_renderer(mut self, renderer: impl StreamRenderer + 'static) -> Self {
        self.stream_renderer = Some(Arc::new(renderer));
        self
    }

    /// Use a custom document shell.
    pub fn with_document(mut self, document: impl DocumentShell + 'static) -> Self {
        self.document = Some(Arc::new(document));
        self
    }

    /// Use a custom provider wrapper.
    pub fn with_providers(mut self, providers: impl Providers + 'static) -> Self {
        self.providers = Some(Arc::new(providers));
        self
    }

    /// Set the log level.
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = Some(level);
        self
    }

    /// Use a logger. Its output and format are kept; scope and level are set
    /// per render.
    pub fn with_logger(mut self, logger: KeyworkLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Forward every error reported during a render to `f`.
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&anyhow::Error) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(f));
        self
    }

    /// Selected stream renderer.
    pub fn stream_renderer(&self) -> Arc<dyn StreamRenderer> {
        match &self.stream_renderer {
            Some(renderer) => renderer.clone(),
            None => Arc::new(DefaultStreamRenderer::default()),
        }
    }

    /// Selected document shell.
    pub fn document(&self) -> Arc<dyn DocumentShell> {
        match &self.document {
            Some(document) => document.clone(),
            None => Arc::new(KeyworkHtmlDocument::default()),
        }
    }

    /// Selected provider wrapper.
    pub fn providers(&self) -> Arc<dyn Providers> {
        match &self.providers {
            Some(providers) => providers.clone(),
            None => Arc::new(KeyworkProviders),
        }
    }

    /// Selected log level.
    pub fn log_level(&self) -> LogLevel {
        self.log_level.unwrap_or(DEFAULT_LOG_LEVEL)
    }

    /// Selected logger.
    pub fn logger(&self) -> KeyworkLogger {
        match &self.logger {
            Some(logger) => logger.clone(),
            None => KeyworkLogger::new(RENDERER_SCOPE),
        }
    }

    /// External error sink, if any.
    pub fn error_sink(&self) -> Option<ErrorSink> {
        self.on_error.clone()
    }
}

impl fmt::Debug for RenderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderOptions")
            .field("stream_renderer", &self.stream_renderer.is_some())
            .field("document", &self.document.is_some())
            .field("providers", &self.providers.is_some())
            .field("log_level", &self.log_level)
            .field("logger", &self.logger)
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}
