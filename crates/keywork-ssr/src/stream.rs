//! Stream rendering: walks the document tree and produces markup chunks.

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, OnceLock};
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures::future::{poll_fn, AbortHandle, AbortRegistration, Abortable, BoxFuture};
use futures::{FutureExt, Stream};
use keywork_core::ResourceError;

use crate::context::RenderContext;
use crate::flush::{FlushController, FlushPolicy, DEFAULT_MAX_BUFFER};
use crate::node::{escape_html, Node};

/// Single-assignment cell holding the first error of a render.
///
/// Shared between the producer, which writes it, and the orchestrator and
/// the stream, which read it.
#[derive(Clone, Default)]
pub struct ErrorCell {
    inner: Arc<OnceLock<anyhow::Error>>,
}

impl ErrorCell {
    /// Create an empty cell.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `error` unless an error is already stored; otherwise hand it back.
    pub fn set(&self, error: anyhow::Error) -> Result<(), anyhow::Error> {
        self.inner.set(error)
    }

    /// The stored error.
    pub fn get(&self) -> Option<&anyhow::Error> {
        self.inner.get()
    }

    /// Check if an error is stored.
    pub fn is_set(&self) -> bool {
        self.inner.get().is_some()
    }
}

impl fmt::Debug for ErrorCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(error) => f.debug_tuple("ErrorCell").field(&format!("{:#}", error)).finish(),
            None => f.write_str("ErrorCell(<empty>)"),
        }
    }
}

/// Stops production of a render's stream.
#[derive(Debug, Clone)]
pub struct CancellationHandle {
    abort: AbortHandle,
}

impl CancellationHandle {
    /// Create a handle and the registration the producer is bound to.
    pub fn new() -> (Self, AbortRegistration) {
        let (abort, registration) = AbortHandle::new_pair();
        (Self { abort }, registration)
    }

    /// Signal the producer to stop. Idempotent.
    pub fn cancel(&self) {
        self.abort.abort();
    }

    /// Check if cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.abort.is_aborted()
    }
}

/// Byte stream of a render.
///
/// Production happens as the stream is polled; no task is spawned. If a
/// component fails after the stream was handed out, the stream ends with a
/// single `Err` item instead of ending cleanly.
pub struct RenderStream {
    producer: Option<BoxFuture<'static, ()>>,
    chunks: UnboundedReceiver<Vec<u8>>,
    buffered: VecDeque<Vec<u8>>,
    error: ErrorCell,
    cancellation: CancellationHandle,
    error_emitted: bool,
}

impl RenderStream {
    /// Create a stream from a producer that sends chunks on `chunks`.
    ///
    /// The producer should already be bound to `cancellation`'s registration.
    pub fn new(
        producer: BoxFuture<'static, ()>,
        chunks: UnboundedReceiver<Vec<u8>>,
        error: ErrorCell,
        cancellation: CancellationHandle,
    ) -> Self {
        Self {
            producer: Some(producer),
            chunks,
            buffered: VecDeque::new(),
            error,
            cancellation,
            error_emitted: false,
        }
    }

    /// Wait until the first chunk is available or production has finished.
    pub async fn shell_ready(&mut self) {
        poll_fn(|cx| {
            self.drive(cx);
            if !self.buffered.is_empty() || self.producer.is_none() {
                Poll::Ready(())
            } else {
                Poll::Pending
            }
        })
        .await
    }

    /// Handle that stops production.
    pub fn cancellation_handle(&self) -> &CancellationHandle {
        &self.cancellation
    }

    /// Error cell shared with the producer.
    pub fn error_cell(&self) -> &ErrorCell {
        &self.error
    }

    /// First error captured so far.
    pub fn error(&self) -> Option<&anyhow::Error> {
        self.error.get()
    }

    /// Check if the producer is still running.
    pub fn is_producing(&self) -> bool {
        self.producer.is_some()
    }

    fn drive(&mut self, cx: &mut Context<'_>) {
        if let Some(producer) = self.producer.as_mut() {
            if producer.as_mut().poll(cx).is_ready() {
                self.producer = None;
            }
        }

        while let Ok(Some(chunk)) = self.chunks.try_next() {
            self.buffered.push_back(chunk);
        }
    }
}

impl Stream for RenderStream {
    type Item = Result<Vec<u8>, ResourceError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if this.cancellation.is_cancelled() {
            this.producer = None;
            this.buffered.clear();
            return Poll::Ready(None);
        }

        if this.buffered.is_empty() {
            this.drive(cx);
        }

        if let Some(chunk) = this.buffered.pop_front() {
            return Poll::Ready(Some(Ok(chunk)));
        }

        if this.producer.is_some() {
            return Poll::Pending;
        }

        if this.error.is_set() && !this.error_emitted {
            this.error_emitted = true;
            return Poll::Ready(Some(Err(ResourceError::stream_failed())));
        }

        Poll::Ready(None)
    }
}

impl fmt::Debug for RenderStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderStream")
            .field("producing", &self.producer.is_some())
            .field("buffered", &self.buffered.len())
            .field("error", &self.error)
            .field("cancelled", &self.cancellation.is_cancelled())
            .finish()
    }
}

/// Output of a [`StreamRenderer`].
#[derive(Debug)]
pub struct StreamRenderResult {
    /// The byte stream, possibly still producing.
    pub stream: RenderStream,
    /// First error captured while rendering.
    pub error: ErrorCell,
    /// Stops production.
    pub cancellation: CancellationHandle,
}

impl StreamRenderResult {
    /// Create a result sharing the stream's error cell and cancellation handle.
    pub fn new(stream: RenderStream) -> Self {
        let error = stream.error_cell().clone();
        let cancellation = stream.cancellation_handle().clone();
        Self {
            stream,
            error,
            cancellation,
        }
    }

    /// First error captured so far.
    pub fn error(&self) -> Option<&anyhow::Error> {
        self.error.get()
    }
}

/// Turns an assembled tree into a byte stream.
#[async_trait]
pub trait StreamRenderer: Send + Sync {
    /// Start rendering `tree`.
    ///
    /// Returns once the stream is usable; production may still be running
    /// and may still capture an error afterwards. `Err` means no stream could
    /// be produced at all.
    async fn render_to_stream(
        &self,
        tree: Node,
        cx: Arc<RenderContext>,
    ) -> anyhow::Result<StreamRenderResult>;
}

/// Built-in stream renderer.
#[derive(Debug, Clone, Copy)]
pub struct DefaultStreamRenderer {
    flush: FlushPolicy,
    max_buffer: usize,
}

impl Default for DefaultStreamRenderer {
    fn default() -> Self {
        Self::new(FlushPolicy::default())
    }
}

impl DefaultStreamRenderer {
    /// Create a renderer with a flush policy.
    pub fn new(flush: FlushPolicy) -> Self {
        Self {
            flush,
            max_buffer: DEFAULT_MAX_BUFFER,
        }
    }

    /// Set maximum buffer size before auto-flush.
    pub fn with_max_buffer(mut self, bytes: usize) -> Self {
        self.max_buffer = bytes;
        self
    }

    /// Flush policy in use.
    pub fn flush_policy(&self) -> FlushPolicy {
        self.flush
    }
}

#[async_trait]
impl StreamRenderer for DefaultStreamRenderer {
    async fn render_to_stream(
        &self,
        tree: Node,
        cx: Arc<RenderContext>,
    ) -> anyhow::Result<StreamRenderResult> {
        let (cancellation, registration) = CancellationHandle::new();
        let (tx, rx) = mpsc::unbounded();
        let errors = ErrorCell::new();

        let mut out = MarkupWriter::new(
            tx,
            FlushController::new(self.flush).with_max_buffer(self.max_buffer),
        );
        let producer_errors = errors.clone();
        let producer = async move {
            walk(tree, &cx, &mut out, &producer_errors).await;
            out.finish();
        };

        let producer = Abortable::new(producer, registration).map(|_| ()).boxed();
        let mut stream = RenderStream::new(producer, rx, errors, cancellation);
        stream.shell_ready().await;

        tracing::debug!(
            flush = ?self.flush,
            producing = stream.is_producing(),
            failed = stream.error_cell().is_set(),
            "stream shell ready"
        );

        Ok(StreamRenderResult::new(stream))
    }
}

/// Buffers markup and sends chunks when the flush controller allows.
struct MarkupWriter {
    tx: UnboundedSender<Vec<u8>>,
    buffer: Vec<u8>,
    controller: FlushController,
}

impl MarkupWriter {
    fn new(tx: UnboundedSender<Vec<u8>>, controller: FlushController) -> Self {
        Self {
            tx,
            buffer: Vec::new(),
            controller,
        }
    }

    fn write(&mut self, markup: &str) {
        self.buffer.extend_from_slice(markup.as_bytes());
        self.controller.add_bytes(markup.len());
    }

    fn boundary(&mut self) {
        if self.controller.should_flush_at_boundary() {
            self.flush();
        }
    }

    fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        // The receiver is gone once the stream is dropped; nothing to deliver.
        let _ = self.tx.unbounded_send(std::mem::take(&mut self.buffer));
        self.controller.reset();
    }

    fn finish(mut self) {
        self.flush();
    }
}

fn walk<'a>(
    node: Node,
    cx: &'a RenderContext,
    out: &'a mut MarkupWriter,
    errors: &'a ErrorCell,
) -> BoxFuture<'a, ()> {
    async move {
        match node {
            Node::Empty => {}
            Node::Text(text) => out.write(&escape_html(&text)),
            Node::Raw(markup) => out.write(&markup),
            Node::Fragment(children) => {
                for child in children {
                    walk(child, cx, out, errors).await;
                }
            }
            Node::Component(component) => match component.render(cx).await {
                Ok(tree) => {
                    out.boundary();
                    walk(tree, cx, out, errors).await;
                }
                Err(error) => report(cx, errors, component.name(), error),
            },
        }
    }
    .boxed()
}

/// Log a component error, forward it to the sink and capture it if first.
fn report(cx: &RenderContext, errors: &ErrorCell, component: &str, error: anyhow::Error) {
    cx.logger()
        .error_builder("Component failed to render")
        .field("component", component)
        .field("error", format!("{:#}", error))
        .emit();

    if let Some(sink) = cx.error_sink() {
        sink(&error);
    }

    if let Err(error) = errors.set(error) {
        cx.logger()
            .warn_builder("Additional render error not captured")
            .field("component", component)
            .field("error", format!("{:#}", error))
            .emit();
    }
}
