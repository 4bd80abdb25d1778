//! Turns a page node into the full document tree.

use crate::context::RenderContext;
use crate::embed::static_props_embed;
use crate::node::Node;

/// A single assembly step.
pub type AssemblyStep = fn(Node, &RenderContext) -> Node;

/// Steps applied to the page, innermost first.
pub const ASSEMBLY_STEPS: [AssemblyStep; 3] =
    [embed_static_props, wrap_in_document, wrap_in_providers];

/// Append the static props script after the page.
pub fn embed_static_props(tree: Node, cx: &RenderContext) -> Node {
    Node::Fragment(vec![tree, static_props_embed(cx.static_props())])
}

/// Wrap in the selected document shell.
pub fn wrap_in_document(tree: Node, cx: &RenderContext) -> Node {
    cx.document().wrap(cx, tree)
}

/// Wrap in the selected providers.
pub fn wrap_in_providers(tree: Node, cx: &RenderContext) -> Node {
    cx.providers().wrap(cx, tree)
}

/// Build the document tree for `page`.
///
/// Pure over its inputs: the same page and context always give the same tree.
pub fn assemble(page: Node, cx: &RenderContext) -> Node {
    ASSEMBLY_STEPS.iter().fold(page, |tree, step| step(tree, cx))
}
