use std::sync::Arc;

/// Handle to a node inside a [`Document`](crate::Document) arena.
///
/// Handles are never reused: a removed node keeps its slot, so a stale handle
/// can be detected with [`Document::is_connected`](crate::Document::is_connected).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

pub type Attribute = (Arc<str>, Option<String>);

/// Declarative node tree.
///
/// Trees are loaded into a [`Document`](crate::Document) with
/// [`Document::load`](crate::Document::load) or grafted onto an existing one
/// with [`Document::append_tree`](crate::Document::append_tree).
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Document {
        children: Vec<Node>,
    },
    Element {
        name: Arc<str>,
        attributes: Vec<Attribute>,
        style: Vec<(String, String)>,
        children: Vec<Node>,
    },
    Text {
        text: String,
    },
    Comment {
        text: String,
    },
}

impl Node {
    pub fn document(children: Vec<Node>) -> Self {
        Node::Document { children }
    }

    pub fn element(name: &str) -> Self {
        Node::Element {
            name: Arc::from(name.to_ascii_lowercase()),
            attributes: Vec::new(),
            style: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Node::Text { text: text.into() }
    }

    /// Adds `name="value"`. No-op on non-element nodes.
    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        if let Node::Element { attributes, .. } = &mut self {
            attributes.push((Arc::from(name), Some(value.into())));
        }
        self
    }

    /// Adds a boolean (value-less) attribute such as `required`.
    pub fn flag(mut self, name: &str) -> Self {
        if let Node::Element { attributes, .. } = &mut self {
            attributes.push((Arc::from(name), None));
        }
        self
    }

    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    pub fn class(self, class: &str) -> Self {
        self.attr("class", class)
    }

    pub fn child(mut self, node: Node) -> Self {
        match &mut self {
            Node::Element { children, .. } | Node::Document { children } => children.push(node),
            _ => {}
        }
        self
    }

    pub fn children(mut self, nodes: impl IntoIterator<Item = Node>) -> Self {
        match &mut self {
            Node::Element { children, .. } | Node::Document { children } => children.extend(nodes),
            _ => {}
        }
        self
    }

    pub fn style(mut self, property: &str, value: &str) -> Self {
        if let Node::Element { style, .. } = &mut self {
            style.push((property.to_string(), value.to_string()));
        }
        self
    }

    pub fn children_ref(&self) -> &[Node] {
        match self {
            Node::Document { children } | Node::Element { children, .. } => children,
            _ => &[],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputControlType {
    Text,
    Checkbox,
    Radio,
    Other,
}

impl InputControlType {
    pub fn from_type_attr(ty: Option<&str>) -> Self {
        match ty.map(str::trim).filter(|s| !s.is_empty()) {
            None => InputControlType::Text, // missing type defaults to text
            Some(t) if t.eq_ignore_ascii_case("checkbox") => InputControlType::Checkbox,
            Some(t) if t.eq_ignore_ascii_case("radio") => InputControlType::Radio,
            Some(t)
                if t.eq_ignore_ascii_case("submit")
                    || t.eq_ignore_ascii_case("reset")
                    || t.eq_ignore_ascii_case("button")
                    || t.eq_ignore_ascii_case("image")
                    || t.eq_ignore_ascii_case("file") =>
            {
                InputControlType::Other
            }
            // Every remaining input type (email, tel, number, date, ...) edits a string value.
            Some(_) => InputControlType::Text,
        }
    }

    pub fn is_checkable(self) -> bool {
        matches!(self, InputControlType::Checkbox | InputControlType::Radio)
    }
}
