//! The render orchestrator.

use std::sync::Arc;

use keywork_core::{FetchEvent, ResourceError};

use crate::assembly::assemble;
use crate::context::{RenderContext, RENDERER_SCOPE};
use crate::node::{Element, Node};
use crate::options::RenderOptions;
use crate::stream::RenderStream;

/// Render `page` for `event` as a stream of HTML.
///
/// Fails with a generic [`ResourceError`] when the renderer cannot produce a
/// stream, or when a component fails before the shell is ready. Details are
/// logged server-side only. A component failing after this returns makes the
/// stream end with an `Err` item.
pub async fn render_jsx_to_stream(
    event: Arc<FetchEvent>,
    page: Element,
    options: Option<&RenderOptions>,
) -> Result<RenderStream, ResourceError> {
    let defaults = RenderOptions::default();
    let options = options.unwrap_or(&defaults);

    let log_level = options.log_level();
    let logger = options
        .logger()
        .scoped(RENDERER_SCOPE)
        .with_request_id(event.request_id().clone())
        .with_min_level(log_level);

    let (component, static_props) = page.into_parts();

    let cx = RenderContext::new(event)
        .with_document(options.document())
        .with_providers(options.providers())
        .with_log_level(log_level)
        .with_static_props(static_props)
        .with_logger(logger)
        .with_error_sink(options.error_sink());

    let tree = assemble(Node::Component(component), &cx);
    let cx = Arc::new(cx);

    let result = match options
        .stream_renderer()
        .render_to_stream(tree, cx.clone())
        .await
    {
        Ok(result) => result,
        Err(error) => {
            cx.logger()
                .error_builder("Stream renderer failed")
                .field("error", format!("{:#}", error))
                .emit();
            return Err(ResourceError::render_failed());
        }
    };

    if let Some(error) = result.error() {
        cx.logger()
            .error_builder("Render failed before the shell was ready")
            .field("error", format!("{:#}", error))
            .emit();
        result.cancellation.cancel();
        return Err(ResourceError::stream_failed());
    }

    tracing::debug!(
        request_id = %cx.event().request_id(),
        path = cx.event().path(),
        "render streaming"
    );

    Ok(result.stream)
}
