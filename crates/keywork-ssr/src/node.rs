//! The renderable tree.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::context::RenderContext;

/// A node in the render tree.
pub enum Node {
    /// Renders nothing.
    Empty,
    /// Text, escaped on output.
    Text(String),
    /// Trusted markup written verbatim.
    Raw(String),
    /// Children rendered in order.
    Fragment(Vec<Node>),
    /// A component rendered when the walker reaches it.
    Component(Arc<dyn Component>),
}

impl Node {
    /// Create an escaped text node.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Create a raw markup node.
    pub fn raw(markup: impl Into<String>) -> Self {
        Self::Raw(markup.into())
    }

    /// Create a fragment.
    pub fn fragment(children: impl IntoIterator<Item = Node>) -> Self {
        Self::Fragment(children.into_iter().collect())
    }

    /// Create a component node.
    pub fn component(component: impl Component + 'static) -> Self {
        Self::Component(Arc::new(component))
    }

    /// Wrap children in an HTML tag without attributes.
    pub fn element(tag: &str, children: impl Into<Node>) -> Self {
        Self::Fragment(vec![
            Self::Raw(format!("<{}>", tag)),
            children.into(),
            Self::Raw(format!("</{}>", tag)),
        ])
    }
}

impl From<String> for Node {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Vec<Node>> for Node {
    fn from(children: Vec<Node>) -> Self {
        Self::Fragment(children)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Raw(markup) => f.debug_tuple("Raw").field(markup).finish(),
            Self::Fragment(children) => f.debug_tuple("Fragment").field(children).finish(),
            Self::Component(component) => f.debug_tuple("Component").field(&component.name()).finish(),
        }
    }
}

/// A unit of UI that renders to a subtree.
///
/// Rendering may await (e.g. to load data). Returning an error does not stop
/// the render: the error is reported and the walker moves on to the next
/// node.
#[async_trait]
pub trait Component: Send + Sync {
    /// Render this component.
    async fn render(&self, cx: &RenderContext) -> anyhow::Result<Node>;

    /// Name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// A component backed by a synchronous closure.
pub struct FnComponent<F> {
    f: F,
}

#[async_trait]
impl<F> Component for FnComponent<F>
where
    F: Fn(&RenderContext) -> anyhow::Result<Node> + Send + Sync,
{
    async fn render(&self, cx: &RenderContext) -> anyhow::Result<Node> {
        (self.f)(cx)
    }
}

/// Create a component from a closure.
pub fn component_fn<F>(f: F) -> FnComponent<F>
where
    F: Fn(&RenderContext) -> anyhow::Result<Node> + Send + Sync,
{
    FnComponent { f }
}

/// A page element: the component for a page plus the static props it was
/// created with.
#[derive(Clone)]
pub struct Element {
    component: Arc<dyn Component>,
    static_props: Option<Value>,
}

impl Element {
    /// Create an element for a component.
    pub fn new(component: impl Component + 'static) -> Self {
        Self::from_arc(Arc::new(component))
    }

    /// Create an element for a shared component.
    pub fn from_arc(component: Arc<dyn Component>) -> Self {
        Self {
            component,
            static_props: None,
        }
    }

    /// Create an element from a closure.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&RenderContext) -> anyhow::Result<Node> + Send + Sync + 'static,
    {
        Self::new(component_fn(f))
    }

    /// Attach static props, serialized to JSON.
    pub fn with_static_props<T: Serialize + ?Sized>(
        mut self,
        props: &T,
    ) -> Result<Self, serde_json::Error> {
        self.static_props = Some(serde_json::to_value(props)?);
        Ok(self)
    }

    /// Attach already-serialized static props.
    pub fn with_static_props_value(mut self, props: Value) -> Self {
        self.static_props = Some(props);
        self
    }

    /// Static props attached to this element.
    pub fn static_props(&self) -> Option<&Value> {
        self.static_props.as_ref()
    }

    /// The page component.
    pub fn component(&self) -> &Arc<dyn Component> {
        &self.component
    }

    /// Split into component and static props.
    pub fn into_parts(self) -> (Arc<dyn Component>, Option<Value>) {
        (self.component, self.static_props)
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("component", &self.component.name())
            .field("static_props", &self.static_props)
            .finish()
    }
}

/// Escape text for HTML element content and attribute values.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Heading;

    #[async_trait]
    impl Component for Heading {
        async fn render(&self, _cx: &RenderContext) -> anyhow::Result<Node> {
            Ok(Node::element("h1", "Hello"))
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_node_element_wraps_children() {
        let node = Node::element("p", "hi");
        match node {
            Node::Fragment(children) => {
                assert_eq!(children.len(), 3);
                assert!(matches!(&children[0], Node::Raw(m) if m == "<p>"));
                assert!(matches!(&children[1], Node::Text(t) if t == "hi"));
                assert!(matches!(&children[2], Node::Raw(m) if m == "</p>"));
            }
            other => panic!("expected fragment, got {:?}", other),
        }
    }

    #[test]
    fn test_component_name_is_type_name() {
        assert!(Heading.name().ends_with("Heading"));
    }

    #[test]
    fn test_element_static_props() {
        let element = Element::new(Heading)
            .with_static_props(&json!({ "title": "Home" }))
            .unwrap();

        assert_eq!(element.static_props(), Some(&json!({ "title": "Home" })));
    }

    #[test]
    fn test_element_without_static_props() {
        let element = Element::new(Heading);
        assert!(element.static_props().is_none());

        let (_component, props) = element.into_parts();
        assert!(props.is_none());
    }

    #[test]
    fn test_element_debug_shows_component_name() {
        let element = Element::new(Heading);
        assert!(format!("{:?}", element).contains("Heading"));
    }
}
