use crate::selector::Selector;
use crate::types::{Attribute, InputControlType, Node, NodeId};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),
    #[error("node {0:?} cannot have children")]
    InvalidParent(NodeId),
    #[error("appending {child:?} to {parent:?} would create a cycle")]
    CycleDetected { parent: NodeId, child: NodeId },
    #[error("the document root cannot be removed")]
    RootRemoval,
    #[error("a document node cannot be nested inside another document")]
    NestedDocument,
}

#[derive(Clone, Debug)]
pub struct ElementData {
    name: Arc<str>,
    attributes: Vec<Attribute>,
    style: Vec<(String, String)>,
    control: Option<ControlState>,
}

/// Live state of a form control, separate from its default-carrying attributes.
#[derive(Clone, Debug, Default)]
struct ControlState {
    value: String,
    checked: bool,
}

impl ElementData {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_deref().unwrap_or(""))
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|v| v.split_ascii_whitespace().any(|c| c == class))
    }

    fn set_attr(&mut self, name: &str, value: Option<String>) {
        if let Some(slot) = self
            .attributes
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            slot.1 = value;
        } else {
            self.attributes.push((Arc::from(name), value));
        }
    }

    fn remove_attr(&mut self, name: &str) -> bool {
        let before = self.attributes.len();
        self.attributes.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        before != self.attributes.len()
    }

    fn is_control(&self) -> bool {
        matches!(&*self.name, "input" | "textarea" | "select")
    }
}

#[derive(Clone, Debug)]
enum NodeKind {
    Document,
    Element(ElementData),
    Text(String),
    Comment(String),
}

#[derive(Clone, Debug)]
struct NodeRecord {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl NodeRecord {
    fn allows_children(&self) -> bool {
        matches!(self.kind, NodeKind::Document | NodeKind::Element(_))
    }
}

/// Mutable document arena.
///
/// Nodes are addressed by [`NodeId`]; the document node is always
/// [`NodeId::ROOT`]. Removed subtrees stay allocated but are no longer
/// connected, so handles held by listeners or timers degrade to no-ops.
#[derive(Clone, Debug)]
pub struct Document {
    nodes: Vec<NodeRecord>,
    body: NodeId,
    active: Option<NodeId>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self::load(Node::document(Vec::new()))
    }

    /// Builds a document from a declarative tree. A `body` element is created
    /// under the root when the tree has none.
    pub fn load(tree: Node) -> Self {
        let mut doc = Self {
            nodes: vec![NodeRecord {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
            body: NodeId::ROOT,
            active: None,
        };

        let children = match tree {
            Node::Document { children } => children,
            other => vec![other],
        };
        for child in children {
            if let Err(err) = doc.append_tree(NodeId::ROOT, child) {
                log::warn!(target: "dom", "skipping subtree while loading document: {err}");
            }
        }

        doc.body = match doc.find_first(NodeId::ROOT, |el| el.name() == "body") {
            Some(body) => body,
            None => {
                let body = doc.alloc(NodeKind::Element(new_element("body", Vec::new(), Vec::new())));
                doc.link(NodeId::ROOT, body);
                body
            }
        };
        doc
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    // ---------------------------------------------------------------------
    // Structure
    // ---------------------------------------------------------------------

    /// Materializes `tree` and appends it as the last child of `parent`.
    pub fn append_tree(&mut self, parent: NodeId, tree: Node) -> Result<NodeId, DomError> {
        self.ensure_container(parent)?;
        let id = self.insert_tree(tree)?;
        self.link(parent, id);
        Ok(id)
    }

    pub fn create_element(&mut self, name: &str) -> NodeId {
        let el = new_element(&name.to_ascii_lowercase(), Vec::new(), Vec::new());
        let id = self.alloc(NodeKind::Element(el));
        self.init_control(id);
        id
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeKind::Text(text.to_string()))
    }

    /// Moves `child` (detaching it from any current parent) to the end of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.ensure_container(parent)?;
        self.ensure_exists(child)?;
        if child == NodeId::ROOT {
            return Err(DomError::NestedDocument);
        }
        if self.contains(child, parent) {
            return Err(DomError::CycleDetected { parent, child });
        }
        self.unlink(child);
        self.link(parent, child);
        Ok(())
    }

    /// Detaches `node` (and its subtree) from the document. Removing an already
    /// detached node is a no-op.
    pub fn remove(&mut self, node: NodeId) -> Result<(), DomError> {
        self.ensure_exists(node)?;
        if node == NodeId::ROOT {
            return Err(DomError::RootRemoval);
        }
        if let Some(active) = self.active
            && self.contains(node, active)
        {
            self.active = None;
        }
        self.unlink(node);
        Ok(())
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.record(node).and_then(|r| r.parent)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.record(node).map(|r| r.children.as_slice()).unwrap_or(&[])
    }

    /// Inclusive containment: a node contains itself.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    pub fn is_connected(&self, node: NodeId) -> bool {
        self.record(node).is_some() && self.contains(NodeId::ROOT, node)
    }

    /// Element descendants of `root` in document (pre-)order, excluding `root`.
    pub fn descendant_elements(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            if self.element(current).is_some() {
                out.push(current);
            }
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    // ---------------------------------------------------------------------
    // Selectors
    // ---------------------------------------------------------------------

    pub fn matches(&self, node: NodeId, selector: &Selector) -> bool {
        self.element(node).is_some_and(|el| selector.matches(el))
    }

    /// Nearest inclusive ancestor matching `selector`.
    pub fn closest(&self, node: NodeId, selector: &Selector) -> Option<NodeId> {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if self.matches(current, selector) {
                return Some(current);
            }
            cursor = self.parent(current);
        }
        None
    }

    pub fn query_selector(&self, root: NodeId, selector: &Selector) -> Option<NodeId> {
        self.find_first(root, |el| selector.matches(el))
    }

    pub fn query_selector_all(&self, root: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendant_elements(root)
            .into_iter()
            .filter(|&id| self.matches(id, selector))
            .collect()
    }

    /// First connected element whose `id` attribute equals `id`.
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.find_first(NodeId::ROOT, |el| el.attr("id") == Some(id))
    }

    /// `id` lookup scoped to `root`'s subtree.
    pub fn find_by_id_within(&self, root: NodeId, id: &str) -> Option<NodeId> {
        self.find_first(root, |el| el.attr("id") == Some(id))
    }

    fn find_first(&self, root: NodeId, pred: impl Fn(&ElementData) -> bool) -> Option<NodeId> {
        let mut stack: Vec<NodeId> = self.children(root).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            if self.element(current).is_some_and(&pred) {
                return Some(current);
            }
            stack.extend(self.children(current).iter().rev().copied());
        }
        None
    }

    // ---------------------------------------------------------------------
    // Elements, attributes, classes, style
    // ---------------------------------------------------------------------

    pub fn element(&self, node: NodeId) -> Option<&ElementData> {
        match &self.record(node)?.kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes.get_mut(node.index())?.kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(ElementData::name)
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)?.attr(name)
    }

    pub fn has_attr(&self, node: NodeId, name: &str) -> bool {
        self.element(node).is_some_and(|el| el.has_attr(name))
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(el) = self.element_mut(node) {
            el.set_attr(name, Some(value.to_string()));
        }
    }

    pub fn set_flag(&mut self, node: NodeId, name: &str, on: bool) {
        if let Some(el) = self.element_mut(node) {
            if on {
                el.set_attr(name, None);
            } else {
                el.remove_attr(name);
            }
        }
    }

    pub fn remove_attr(&mut self, node: NodeId, name: &str) -> bool {
        self.element_mut(node).is_some_and(|el| el.remove_attr(name))
    }

    /// Non-empty `id` attribute.
    pub fn element_id(&self, node: NodeId) -> Option<&str> {
        self.attr(node, "id").filter(|v| !v.is_empty())
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.element(node).is_some_and(|el| el.has_class(class))
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) {
        self.toggle_class(node, class, true);
    }

    pub fn remove_class(&mut self, node: NodeId, class: &str) {
        self.toggle_class(node, class, false);
    }

    pub fn toggle_class(&mut self, node: NodeId, class: &str, on: bool) {
        let Some(el) = self.element_mut(node) else {
            return;
        };
        let mut classes: Vec<String> = el
            .attr("class")
            .map(|v| v.split_ascii_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        let present = classes.iter().any(|c| c == class);
        match (on, present) {
            (true, false) => classes.push(class.to_string()),
            (false, true) => classes.retain(|c| c != class),
            _ => return,
        }
        el.set_attr("class", Some(classes.join(" ")));
    }

    pub fn style(&self, node: NodeId, property: &str) -> Option<&str> {
        self.element(node)?
            .style
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(property))
            .map(|(_, v)| v.as_str())
    }

    /// Sets an inline style property; an empty value removes it.
    pub fn set_style(&mut self, node: NodeId, property: &str, value: &str) {
        let Some(el) = self.element_mut(node) else {
            return;
        };
        el.style.retain(|(k, _)| !k.eq_ignore_ascii_case(property));
        if !value.is_empty() {
            el.style.push((property.to_string(), value.to_string()));
        }
    }

    // ---------------------------------------------------------------------
    // Text
    // ---------------------------------------------------------------------

    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        let Some(record) = self.record(node) else {
            return;
        };
        match &record.kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Comment(_) => {}
            NodeKind::Document | NodeKind::Element(_) => {
                for &child in &record.children {
                    self.collect_text(child, out);
                }
            }
        }
    }

    pub fn clear_children(&mut self, node: NodeId) {
        for child in self.children(node).to_vec() {
            self.unlink(child);
        }
    }

    pub fn set_text_content(&mut self, node: NodeId, text: &str) {
        self.clear_children(node);
        if !text.is_empty() && self.record(node).is_some_and(NodeRecord::allows_children) {
            let t = self.create_text(text);
            self.link(node, t);
        }
    }

    // ---------------------------------------------------------------------
    // Form controls
    // ---------------------------------------------------------------------

    pub fn input_type(&self, node: NodeId) -> InputControlType {
        match self.tag(node) {
            Some("input") => InputControlType::from_type_attr(self.attr(node, "type")),
            Some("textarea") | Some("select") => InputControlType::Text,
            _ => InputControlType::Other,
        }
    }

    /// Lower-cased `type` attribute of an `input` (defaulting to `text`), or the
    /// tag name for other controls.
    pub fn control_type(&self, node: NodeId) -> String {
        match self.tag(node) {
            Some("input") => self
                .attr(node, "type")
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .unwrap_or("text")
                .to_ascii_lowercase(),
            Some("button") => self
                .attr(node, "type")
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .unwrap_or("submit")
                .to_ascii_lowercase(),
            Some(tag) => tag.to_string(),
            None => String::new(),
        }
    }

    pub fn value(&self, node: NodeId) -> Option<&str> {
        let el = self.element(node)?;
        match &el.control {
            Some(state) => Some(state.value.as_str()),
            None => el.attr("value"),
        }
    }

    /// Sets the live value of a control. Returns `false` for non-controls.
    pub fn set_value(&mut self, node: NodeId, value: &str) -> bool {
        match self.element_mut(node).and_then(|el| el.control.as_mut()) {
            Some(state) => {
                state.value = value.to_string();
                true
            }
            None => false,
        }
    }

    pub fn checked(&self, node: NodeId) -> bool {
        self.element(node)
            .and_then(|el| el.control.as_ref())
            .is_some_and(|s| s.checked)
    }

    /// Returns `true` if the checked state changed. Checking a radio unchecks
    /// the other radios of the same group in the same form.
    pub fn set_checked(&mut self, node: NodeId, checked: bool) -> bool {
        let Some(state) = self.element_mut(node).and_then(|el| el.control.as_mut()) else {
            return false;
        };
        let changed = state.checked != checked;
        state.checked = checked;

        if checked && self.input_type(node) == InputControlType::Radio {
            for other in self.radio_group(node) {
                if other != node
                    && let Some(state) = self.element_mut(other).and_then(|el| el.control.as_mut())
                {
                    state.checked = false;
                }
            }
        }
        changed
    }

    /// Radios sharing `radio`'s name within the same form (or the document when
    /// it has no form ancestor), including `radio` itself.
    pub fn radio_group(&self, radio: NodeId) -> Vec<NodeId> {
        let Some(name) = self.attr(radio, "name").filter(|n| !n.is_empty()) else {
            return vec![radio];
        };
        let scope = self.form_owner(radio).unwrap_or(NodeId::ROOT);
        self.descendant_elements(scope)
            .into_iter()
            .filter(|&id| {
                self.input_type(id) == InputControlType::Radio
                    && self.attr(id, "name") == Some(name)
                    && self.form_owner(id).unwrap_or(NodeId::ROOT) == scope
            })
            .collect()
    }

    pub fn form_owner(&self, node: NodeId) -> Option<NodeId> {
        let mut cursor = self.parent(node);
        while let Some(current) = cursor {
            if self.tag(current) == Some("form") {
                return Some(current);
            }
            cursor = self.parent(current);
        }
        None
    }

    /// `disabled` on the element itself or on an enclosing `fieldset`.
    pub fn is_disabled(&self, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if self.has_attr(current, "disabled")
                && (current == node || self.tag(current) == Some("fieldset"))
            {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    pub fn set_disabled(&mut self, node: NodeId, disabled: bool) {
        self.set_flag(node, "disabled", disabled);
    }

    /// Listed form elements of `form` in document order.
    pub fn form_elements(&self, form: NodeId) -> Vec<NodeId> {
        self.descendant_elements(form)
            .into_iter()
            .filter(|&id| {
                matches!(
                    self.tag(id),
                    Some("input" | "textarea" | "select" | "button" | "fieldset" | "output")
                )
            })
            .collect()
    }

    /// First control of `form` whose `name` is `name`.
    pub fn named_element(&self, form: NodeId, name: &str) -> Option<NodeId> {
        self.form_elements(form)
            .into_iter()
            .find(|&id| self.attr(id, "name") == Some(name))
    }

    /// Restores every control of `form` to the value carried by its markup.
    pub fn reset_form(&mut self, form: NodeId) {
        for id in self.form_elements(form) {
            self.init_control(id);
        }
    }

    // ---------------------------------------------------------------------
    // Focus
    // ---------------------------------------------------------------------

    pub fn active_element(&self) -> Option<NodeId> {
        self.active.filter(|&id| self.is_connected(id))
    }

    /// Raw focus bookkeeping; event dispatch is the host's job.
    pub fn set_active_element(&mut self, node: Option<NodeId>) {
        self.active = node.filter(|&id| self.is_connected(id));
    }

    pub fn is_focusable(&self, node: NodeId) -> bool {
        if !self.is_connected(node) || self.is_disabled(node) {
            return false;
        }
        match self.tag(node) {
            Some("input") => self.control_type(node) != "hidden",
            Some("textarea" | "select" | "button") => true,
            Some("a") => self.has_attr(node, "href"),
            Some(_) => self.has_attr(node, "tabindex"),
            None => false,
        }
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    fn record(&self, node: NodeId) -> Option<&NodeRecord> {
        self.nodes.get(node.index())
    }

    fn ensure_exists(&self, node: NodeId) -> Result<(), DomError> {
        self.record(node)
            .map(|_| ())
            .ok_or(DomError::UnknownNode(node))
    }

    fn ensure_container(&self, node: NodeId) -> Result<(), DomError> {
        let record = self.record(node).ok_or(DomError::UnknownNode(node))?;
        if !record.allows_children() {
            return Err(DomError::InvalidParent(node));
        }
        Ok(())
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeRecord {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn link(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.index()].children.push(child);
        self.nodes[child.index()].parent = Some(parent);
    }

    fn unlink(&mut self, child: NodeId) {
        if let Some(parent) = self.nodes[child.index()].parent.take() {
            self.nodes[parent.index()].children.retain(|&c| c != child);
        }
    }

    fn insert_tree(&mut self, tree: Node) -> Result<NodeId, DomError> {
        let (kind, children) = match tree {
            Node::Document { .. } => return Err(DomError::NestedDocument),
            Node::Element {
                name,
                attributes,
                style,
                children,
            } => (
                NodeKind::Element(new_element(&name, attributes, style)),
                children,
            ),
            Node::Text { text } => (NodeKind::Text(text), Vec::new()),
            Node::Comment { text } => (NodeKind::Comment(text), Vec::new()),
        };

        let id = self.alloc(kind);
        for child in children {
            let child_id = self.insert_tree(child)?;
            self.link(id, child_id);
        }
        self.init_control(id);
        Ok(id)
    }

    /// (Re)derives a control's live state from its markup defaults.
    fn init_control(&mut self, node: NodeId) {
        let Some(el) = self.element(node) else {
            return;
        };
        if !el.is_control() {
            return;
        }
        let state = match el.name() {
            "textarea" => {
                let mut initial = normalize_textarea_newlines(&self.text_content(node));
                // HTML textarea parsing: if the first character is a newline, strip it.
                if initial.starts_with('\n') {
                    initial.remove(0);
                }
                ControlState {
                    value: initial,
                    checked: false,
                }
            }
            "select" => ControlState {
                value: self.default_select_value(node),
                checked: false,
            },
            _ => ControlState {
                value: el.attr("value").unwrap_or("").to_string(),
                checked: el.has_attr("checked"),
            },
        };
        if let Some(el) = self.element_mut(node) {
            el.control = Some(state);
        }
    }

    fn default_select_value(&self, select: NodeId) -> String {
        let options: Vec<NodeId> = self
            .descendant_elements(select)
            .into_iter()
            .filter(|&id| self.tag(id) == Some("option"))
            .collect();
        let chosen = options
            .iter()
            .copied()
            .find(|&id| self.has_attr(id, "selected"))
            .or_else(|| options.first().copied());
        match chosen {
            Some(option) => match self.attr(option, "value") {
                Some(v) => v.to_string(),
                None => self.text_content(option).trim().to_string(),
            },
            None => String::new(),
        }
    }
}

fn new_element(
    name: &str,
    attributes: Vec<Attribute>,
    style: Vec<(String, String)>,
) -> ElementData {
    ElementData {
        name: Arc::from(name.to_ascii_lowercase()),
        attributes,
        style,
        control: None,
    }
}

fn normalize_textarea_newlines(s: &str) -> String {
    // Normalize CRLF/CR to LF. (Browsers store textarea values with LF newlines.)
    if !s.contains('\r') {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut it = s.chars().peekable();
    while let Some(ch) = it.next() {
        match ch {
            '\r' => {
                if it.peek() == Some(&'\n') {
                    let _ = it.next();
                }
                out.push('\n');
            }
            _ => out.push(ch),
        }
    }
    out
}
