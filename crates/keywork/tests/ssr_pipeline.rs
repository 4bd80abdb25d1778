//! End-to-end tests: handler values through `cast_to_response`, including
//! streamed page renders.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::StreamExt;
use http::header::CONTENT_TYPE;
use http::StatusCode;
use keywork::prelude::*;
use serde::Serialize;
use serde_json::json;

#[derive(Serialize)]
struct ProductProps {
    name: String,
    price_cents: u64,
}

/// Renders the product name from static props, after yielding once.
struct ProductPage;

#[async_trait]
impl Component for ProductPage {
    async fn render(&self, cx: &RenderContext) -> anyhow::Result<Node> {
        tokio::task::yield_now().await;
        let name = cx
            .static_prop("name")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string();
        Ok(Node::element("h1", Node::text(name)))
    }
}

/// Fails after yielding, so the shell is already out when it errors.
struct FlakyReviews;

#[async_trait]
impl Component for FlakyReviews {
    async fn render(&self, _cx: &RenderContext) -> anyhow::Result<Node> {
        tokio::task::yield_now().await;
        anyhow::bail!("reviews service timed out at 10.0.0.12:7000")
    }
}

fn event(path: &str) -> Arc<FetchEvent> {
    Arc::new(FetchEvent::get(path))
}

fn quiet_options() -> (RenderOptions, LogCapture) {
    let capture = LogCapture::new();
    let options =
        RenderOptions::new().with_logger(KeyworkLogger::new("Test").with_capture(capture.clone()));
    (options, capture)
}

fn product(name: &str) -> Element {
    Element::new(ProductPage)
        .with_static_props(&ProductProps {
            name: name.to_string(),
            price_cents: 1999,
        })
        .unwrap()
}

#[tokio::test]
async fn test_page_renders_html_document() {
    let (options, _) = quiet_options();

    let response = cast_to_response(product("Lamp"), event("/products/lamp"), Some(&options))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(CONTENT_TYPE).unwrap(),
        content_types::HTML
    );
    assert!(response.body().is_stream());

    let html = response.into_body().text().await.unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<h1>Lamp</h1>"));
    assert!(html.ends_with("</html>"));
}

#[tokio::test]
async fn test_static_props_embedded_exactly_once() {
    let (options, _) = quiet_options();
    let page = Element::new(ProductPage)
        .with_static_props(&json!({ "title": "Home" }))
        .unwrap();

    let response = cast_to_response(page, event("/"), Some(&options))
        .await
        .unwrap();
    let html = response.into_body().text().await.unwrap();

    let embed = r#"<script id="__KEYWORK_STATIC_PROPS__" type="application/json">{"title":"Home"}</script>"#;
    assert_eq!(html.matches(embed).count(), 1);
}

#[tokio::test]
async fn test_custom_document_and_providers() {
    struct Minimal;

    impl DocumentShell for Minimal {
        fn wrap(&self, _cx: &RenderContext, children: Node) -> Node {
            Node::fragment([Node::raw("<!DOCTYPE html><body>"), children, Node::raw("</body>")])
        }
    }

    struct Theme;

    impl Providers for Theme {
        fn wrap(&self, _cx: &RenderContext, children: Node) -> Node {
            Node::fragment([children, Node::raw("<!-- theme: dark -->")])
        }
    }

    let (options, _) = quiet_options();
    let options = options.with_document(Minimal).with_providers(Theme);

    let response = cast_to_response(product("Chair"), event("/"), Some(&options))
        .await
        .unwrap();
    let html = response.into_body().text().await.unwrap();

    assert!(html.starts_with("<!DOCTYPE html><body><h1>Chair</h1><script"));
    assert!(html.ends_with("</body><!-- theme: dark -->"));
}

#[tokio::test]
async fn test_early_page_error_fails_without_leaking() {
    let (options, capture) = quiet_options();
    let page = Element::from_fn(|_cx| anyhow::bail!("SELECT * FROM users failed"));

    let err = cast_to_response(page, event("/"), Some(&options))
        .await
        .unwrap_err();

    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(err.message(), STREAM_FAILED_MESSAGE);
    assert!(!err.to_string().contains("SELECT"));

    let logged = capture.at_level(LogLevel::Error);
    assert!(logged
        .iter()
        .any(|entry| entry.fields["error"].as_str().unwrap_or_default().contains("SELECT")));
}

#[tokio::test]
async fn test_late_error_ends_stream_with_error() {
    let (options, _) = quiet_options();
    let page = Element::from_fn(|_cx| {
        Ok(Node::fragment([
            Node::element("h1", "Reviews"),
            Node::component(FlakyReviews),
        ]))
    });

    let response = cast_to_response(page, event("/"), Some(&options))
        .await
        .unwrap();

    let mut stream = response.into_body().into_stream();
    let mut html = String::new();
    let mut failure = None;
    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(bytes) => html.push_str(&String::from_utf8(bytes).unwrap()),
            Err(err) => failure = Some(err),
        }
    }

    assert!(html.starts_with("<!DOCTYPE html>"));
    let failure = failure.expect("stream should end with an error");
    assert_eq!(failure, ResourceError::stream_failed());
    assert!(!failure.message().contains("10.0.0.12"));
}

#[tokio::test]
async fn test_strategy_failure_is_generic() {
    struct Unavailable;

    #[async_trait]
    impl StreamRenderer for Unavailable {
        async fn render_to_stream(
            &self,
            _tree: Node,
            _cx: Arc<RenderContext>,
        ) -> anyhow::Result<StreamRenderResult> {
            anyhow::bail!("renderer pool exhausted")
        }
    }

    let (options, _) = quiet_options();
    let options = options.with_stream_renderer(Unavailable);

    let err = cast_to_response(product("Desk"), event("/"), Some(&options))
        .await
        .unwrap_err();

    assert_eq!(err, ResourceError::render_failed());
}

#[tokio::test]
async fn test_error_captured_by_strategy_fails_render() {
    /// Delegates to the default renderer, then reports an error of its own.
    struct Auditing;

    #[async_trait]
    impl StreamRenderer for Auditing {
        async fn render_to_stream(
            &self,
            tree: Node,
            cx: Arc<RenderContext>,
        ) -> anyhow::Result<StreamRenderResult> {
            let result = DefaultStreamRenderer::default()
                .render_to_stream(tree, cx)
                .await?;
            let _ = result.error.set(anyhow::anyhow!("audit failed"));
            Ok(result)
        }
    }

    let (options, _) = quiet_options();
    let options = options.with_stream_renderer(Auditing);

    let err = cast_to_response(product("Desk"), event("/"), Some(&options))
        .await
        .unwrap_err();

    assert_eq!(err, ResourceError::stream_failed());
    assert!(!err.message().contains("audit"));
}

#[tokio::test]
async fn test_on_error_sees_every_error() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();

    let (options, _) = quiet_options();
    let options = options.on_error(move |error| sink.lock().unwrap().push(error.to_string()));

    let page = Element::from_fn(|_cx| {
        Ok(Node::fragment([
            Node::component(component_fn(|_cx| anyhow::bail!("first"))),
            Node::component(component_fn(|_cx| anyhow::bail!("second"))),
        ]))
    });

    let err = cast_to_response(page, event("/"), Some(&options))
        .await
        .unwrap_err();

    assert_eq!(err, ResourceError::stream_failed());
    assert_eq!(*seen.lock().unwrap(), vec!["first", "second"]);
}

#[tokio::test]
async fn test_concurrent_renders_do_not_share_props() {
    let mut handles = Vec::new();

    for i in 0..16 {
        handles.push(tokio::spawn(async move {
            let (options, _) = quiet_options();
            let name = format!("product-{}", i);
            let response = cast_to_response(product(&name), event("/"), Some(&options))
                .await
                .unwrap();
            (name, response.into_body().text().await.unwrap())
        }));
    }

    for handle in handles {
        let (name, html) = handle.await.unwrap();

        assert!(html.contains(&format!("<h1>{}</h1>", name)));
        assert!(html.contains(&format!(r#""name":"{}""#, name)));
        assert_eq!(html.matches("product-").count(), 2);
    }
}

#[tokio::test]
async fn test_cancellation_stops_production() {
    let (options, _) = quiet_options();
    let page = Element::from_fn(|_cx| {
        Ok(Node::fragment([
            Node::element("h1", "Shell"),
            Node::component(ProductPage),
        ]))
    });

    let mut stream = render_jsx_to_stream(event("/"), page, Some(&options))
        .await
        .unwrap();

    let first = stream.next().await.unwrap().unwrap();
    assert!(String::from_utf8(first).unwrap().starts_with("<!DOCTYPE html>"));

    stream.cancellation_handle().cancel();
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn test_cacheable_json_response() {
    let request = http::Request::builder()
        .uri("/api/products")
        .header(http::header::IF_NONE_MATCH, "W/\"v1\"")
        .body(())
        .unwrap();

    let response = CachableResponse::new(r#"{"items":[]}"#)
        .with_request(&request)
        .with_etag("\"v1\"")
        .with_content_type(content_types::JSON)
        .build()
        .unwrap();

    let response = cast_to_response(response, event("/api/products"), None)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
}
