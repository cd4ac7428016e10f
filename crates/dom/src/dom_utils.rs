use crate::{Document, NodeId};

/// Indented one-line-per-node dump of the subtree under `root`, capped at `cap`
/// lines. Controls show their live value/checked/disabled state.
pub fn outline(doc: &Document, root: NodeId, cap: usize) -> Vec<String> {
    fn walk(doc: &Document, node: NodeId, depth: usize, out: &mut Vec<String>, left: &mut usize) {
        if *left == 0 {
            return;
        }
        *left -= 1;
        let indent = "  ".repeat(depth);

        if node == doc.root() {
            out.push(format!("{indent}#document"));
        } else if let Some(name) = doc.tag(node) {
            let mut line = format!("{indent}<{name}");
            if let Some(id) = doc.element_id(node) {
                line.push_str(&format!(r#" id="{id}""#));
            }
            if let Some(class) = doc.attr(node, "class").filter(|c| !c.is_empty()) {
                line.push_str(&format!(r#" class="{class}""#));
            }
            line.push('>');
            if matches!(name, "input" | "textarea" | "select") {
                let value = doc.value(node).unwrap_or("");
                if doc.input_type(node).is_checkable() {
                    line.push_str(&format!("  [checked={}]", doc.checked(node)));
                } else if !value.is_empty() {
                    line.push_str(&format!("  [value={value:?}]"));
                }
            }
            if doc.has_attr(node, "disabled") {
                line.push_str("  [disabled]");
            }
            out.push(line);
        } else {
            let t = doc.text_content(node).replace('\n', " ").trim().to_string();
            if !t.is_empty() {
                let show = if t.chars().count() > 40 {
                    format!("{}…", t.chars().take(40).collect::<String>())
                } else {
                    t
                };
                out.push(format!("{indent}\"{show}\""));
            }
            return;
        }

        for &c in doc.children(node) {
            walk(doc, c, depth + 1, out, left);
        }
    }

    let mut out = Vec::new();
    let mut left = cap;
    walk(doc, root, 0, &mut out, &mut left);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Node;

    #[test]
    fn outline_shows_ids_classes_and_control_state() {
        let doc = Document::load(Node::document(vec![Node::element("body").child(
            Node::element("form").id("f").class("card").children([
                Node::element("input").attr("name", "a").attr("value", "x"),
                Node::element("input").attr("type", "checkbox").flag("checked"),
                Node::element("p").child(Node::text("hello\nthere")),
            ]),
        )]));

        let lines = outline(&doc, doc.root(), 100);
        assert_eq!(
            lines,
            vec![
                "#document".to_string(),
                "  <body>".to_string(),
                r#"    <form id="f" class="card">"#.to_string(),
                r#"      <input>  [value="x"]"#.to_string(),
                "      <input>  [checked=true]".to_string(),
                "      <p>".to_string(),
                "        \"hello there\"".to_string(),
            ]
        );
    }

    #[test]
    fn outline_respects_cap() {
        let doc = Document::new();
        assert_eq!(outline(&doc, doc.root(), 1), vec!["#document".to_string()]);
    }
}
