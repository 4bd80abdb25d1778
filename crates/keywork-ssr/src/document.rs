//! Document shell and provider wrappers.

use crate::context::RenderContext;
use crate::node::{escape_html, Node};

/// Renders the `<html>`/`<head>`/`<body>` boilerplate around the page.
pub trait DocumentShell: Send + Sync {
    /// Wrap the page (and its static props embed) in a full document.
    fn wrap(&self, cx: &RenderContext, children: Node) -> Node;
}

/// Wraps the whole document with application-level context (theme, state).
pub trait Providers: Send + Sync {
    /// Wrap the document.
    fn wrap(&self, cx: &RenderContext, children: Node) -> Node;
}

/// Default provider wrapper; renders its children unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyworkProviders;

impl Providers for KeyworkProviders {
    fn wrap(&self, _cx: &RenderContext, children: Node) -> Node {
        children
    }
}

/// Head content for the document.
#[derive(Debug, Clone, Default)]
pub struct HeadContent {
    /// Page title.
    pub title: Option<String>,
    /// Meta tags.
    pub meta: Vec<(String, String)>,
    /// Link tags (stylesheets, etc.).
    pub links: Vec<String>,
    /// Inline scripts in head.
    pub scripts: Vec<String>,
}

impl HeadContent {
    /// Create new head content with a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    /// Add a meta tag.
    pub fn with_meta(mut self, name: &str, content: &str) -> Self {
        self.meta.push((name.to_string(), content.to_string()));
        self
    }

    /// Add a stylesheet link.
    pub fn with_stylesheet(mut self, href: &str) -> Self {
        self.links.push(format!(
            r#"<link rel="stylesheet" href="{}">"#,
            escape_html(href)
        ));
        self
    }

    /// Add inline CSS styles.
    pub fn with_style(mut self, css: &str) -> Self {
        self.links.push(format!("<style>{}</style>", css));
        self
    }

    /// Add an inline script.
    pub fn with_script(mut self, js: &str) -> Self {
        self.scripts.push(js.to_string());
        self
    }

    /// Render head content to HTML.
    pub fn render(&self) -> String {
        let mut html = String::new();

        if let Some(title) = &self.title {
            html.push_str(&format!("<title>{}</title>\n", escape_html(title)));
        }

        for (name, content) in &self.meta {
            html.push_str(&format!(
                r#"<meta name="{}" content="{}">"#,
                escape_html(name),
                escape_html(content)
            ));
            html.push('\n');
        }

        for link in &self.links {
            html.push_str(link);
            html.push('\n');
        }

        for script in &self.scripts {
            html.push_str(&format!("<script>{}</script>\n", script));
        }

        html
    }
}

/// Default document shell.
#[derive(Debug, Clone)]
pub struct KeyworkHtmlDocument {
    /// Document language.
    pub lang: String,
    /// Head content.
    pub head: HeadContent,
    /// HTML after `<body>` and before the page.
    pub body_start: String,
    /// HTML after the page and before `</body>`.
    pub body_end: String,
}

impl Default for KeyworkHtmlDocument {
    fn default() -> Self {
        Self::new(HeadContent::default())
    }
}

impl KeyworkHtmlDocument {
    /// Create a document with the given head.
    pub fn new(head: HeadContent) -> Self {
        Self {
            lang: "en".to_string(),
            head,
            body_start: String::new(),
            body_end: String::new(),
        }
    }

    /// Set the document language.
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    /// Set custom body start HTML.
    pub fn with_body_start(mut self, html: impl Into<String>) -> Self {
        self.body_start = html.into();
        self
    }

    /// Set custom body end HTML.
    pub fn with_body_end(mut self, html: impl Into<String>) -> Self {
        self.body_end = html.into();
        self
    }

    /// Render the markup before the page.
    pub fn render_opening(&self) -> String {
        let mut html = String::from("<!DOCTYPE html>\n");

        html.push_str(&format!(r#"<html lang="{}">"#, escape_html(&self.lang)));
        html.push_str("\n<head>\n");
        html.push_str("<meta charset=\"utf-8\">\n");
        html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
        html.push_str(&self.head.render());
        html.push_str("</head>\n<body>\n");
        html.push_str(&self.body_start);

        html
    }

    /// Render the markup after the page.
    pub fn render_closing(&self) -> String {
        format!("{}\n</body>\n</html>", self.body_end)
    }
}

impl DocumentShell for KeyworkHtmlDocument {
    fn wrap(&self, _cx: &RenderContext, children: Node) -> Node {
        Node::Fragment(vec![
            Node::Raw(self.render_opening()),
            children,
            Node::Raw(self.render_closing()),
        ])
    }
}
