//! Per-render context visible to every component.

use std::fmt;
use std::sync::Arc;

use keywork_core::FetchEvent;
use keywork_observability::{KeyworkLogger, LogLevel, DEFAULT_LOG_LEVEL};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::document::{DocumentShell, KeyworkHtmlDocument, KeyworkProviders, Providers};

/// Scope used by the renderer's logger.
pub const RENDERER_SCOPE: &str = "Stream Renderer";

/// Receives every error reported while a page streams.
pub type ErrorSink = Arc<dyn Fn(&anyhow::Error) + Send + Sync>;

/// Data for a single render.
///
/// Built once before the tree is assembled and then shared read-only (behind
/// an `Arc`) with the stream renderer and every component of that render.
/// It is never reused for another request.
pub struct RenderContext {
    event: Arc<FetchEvent>,
    document: Arc<dyn DocumentShell>,
    providers: Arc<dyn Providers>,
    log_level: LogLevel,
    static_props: Option<Value>,
    logger: KeyworkLogger,
    error_sink: Option<ErrorSink>,
}

impl RenderContext {
    /// Create a context with the default document and providers.
    pub fn new(event: Arc<FetchEvent>) -> Self {
        let logger = KeyworkLogger::new(RENDERER_SCOPE).with_request_id(event.request_id().clone());

        Self {
            event,
            document: Arc::new(KeyworkHtmlDocument::default()),
            providers: Arc::new(KeyworkProviders),
            log_level: DEFAULT_LOG_LEVEL,
            static_props: None,
            logger,
            error_sink: None,
        }
    }

    /// Use a document shell.
    pub fn with_document(mut self, document: Arc<dyn DocumentShell>) -> Self {
        self.document = document;
        self
    }

    /// Use a provider wrapper.
    pub fn with_providers(mut self, providers: Arc<dyn Providers>) -> Self {
        self.providers = providers;
        self
    }

    /// Set the log level exposed to components.
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// Attach the page's static props.
    pub fn with_static_props(mut self, props: Option<Value>) -> Self {
        self.static_props = props;
        self
    }

    /// Use a logger.
    pub fn with_logger(mut self, logger: KeyworkLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Forward stream errors to a sink.
    pub fn with_error_sink(mut self, sink: Option<ErrorSink>) -> Self {
        self.error_sink = sink;
        self
    }

    /// The inbound event.
    pub fn event(&self) -> &FetchEvent {
        &self.event
    }

    /// Selected document shell.
    pub fn document(&self) -> &Arc<dyn DocumentShell> {
        &self.document
    }

    /// Selected provider wrapper.
    pub fn providers(&self) -> &Arc<dyn Providers> {
        &self.providers
    }

    /// Log level for this render.
    pub fn log_level(&self) -> LogLevel {
        self.log_level
    }

    /// The page's static props.
    pub fn static_props(&self) -> Option<&Value> {
        self.static_props.as_ref()
    }

    /// A single static prop by key.
    pub fn static_prop(&self, key: &str) -> Option<&Value> {
        self.static_props.as_ref().and_then(|props| props.get(key))
    }

    /// Deserialize the static props into a typed value.
    pub fn static_props_as<T: DeserializeOwned>(&self) -> Option<serde_json::Result<T>> {
        self.static_props
            .as_ref()
            .map(|props| T::deserialize(props))
    }

    /// Request-scoped logger.
    pub fn logger(&self) -> &KeyworkLogger {
        &self.logger
    }

    /// External error sink, if any.
    pub fn error_sink(&self) -> Option<&ErrorSink> {
        self.error_sink.as_ref()
    }
}

impl fmt::Debug for RenderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderContext")
            .field("request_id", self.event.request_id())
            .field("path", &self.event.path())
            .field("log_level", &self.log_level)
            .field("static_props", &self.static_props)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct HomeProps {
        title: String,
    }

    fn context() -> RenderContext {
        RenderContext::new(Arc::new(FetchEvent::get("/home")))
    }

    #[test]
    fn test_render_context_defaults() {
        let cx = context();

        assert_eq!(cx.event().path(), "/home");
        assert_eq!(cx.log_level(), DEFAULT_LOG_LEVEL);
        assert!(cx.static_props().is_none());
        assert!(cx.error_sink().is_none());
        assert_eq!(cx.logger().scope(), RENDERER_SCOPE);
    }

    #[test]
    fn test_render_context_static_prop() {
        let cx = context().with_static_props(Some(json!({ "title": "Home" })));

        assert_eq!(cx.static_prop("title"), Some(&json!("Home")));
        assert_eq!(cx.static_prop("missing"), None);
    }

    #[test]
    fn test_render_context_static_props_as() {
        let cx = context().with_static_props(Some(json!({ "title": "Home" })));

        let props: HomeProps = cx.static_props_as().unwrap().unwrap();
        assert_eq!(props, HomeProps { title: "Home".to_string() });
    }

    #[test]
    fn test_render_context_static_props_as_mismatch() {
        let cx = context().with_static_props(Some(json!({ "heading": 1 })));
        assert!(cx.static_props_as::<HomeProps>().unwrap().is_err());
    }

    #[test]
    fn test_render_context_log_level() {
        let cx = context().with_log_level(LogLevel::Debug);
        assert_eq!(cx.log_level(), LogLevel::Debug);
    }
}
