//! Static props embedded into the document for client hydration.

use serde_json::Value;

use crate::node::Node;

/// Element id of the embedded static props script.
pub const STATIC_PROPS_SCRIPT_ID: &str = "__KEYWORK_STATIC_PROPS__";

/// Escape serialized JSON so it cannot terminate the surrounding `<script>`.
///
/// The output is still valid JSON and parses to the same value.
pub fn escape_json_for_script(json: &str) -> String {
    let mut escaped = String::with_capacity(json.len());
    for c in json.chars() {
        match c {
            '<' => escaped.push_str("\\u003c"),
            '>' => escaped.push_str("\\u003e"),
            '&' => escaped.push_str("\\u0026"),
            '\u{2028}' => escaped.push_str("\\u2028"),
            '\u{2029}' => escaped.push_str("\\u2029"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Markup for the static props script, or nothing when there are no props.
pub fn static_props_embed(props: Option<&Value>) -> Node {
    match props {
        Some(props) => Node::Raw(format!(
            r#"<script id="{}" type="application/json">{}</script>"#,
            STATIC_PROPS_SCRIPT_ID,
            escape_json_for_script(&props.to_string())
        )),
        None => Node::Empty,
    }
}
