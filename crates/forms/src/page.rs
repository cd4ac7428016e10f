//! A loaded page: window, event routes and the forms engine, driven by
//! simulated user interaction.

use crate::confirmation;
use crate::controller::{self, FormsController};
use crate::mask::InputMask;
use crate::notify::{self, Notifications, TimerTask};
use bus::{DispatchHost, Dispatcher, Event};
use core_types::{EventKind, Millis};
use dom::{Document, DomError, InputControlType, Node, NodeId, dom_utils};
use platform::{Storage, Window};
use url::Url;

pub struct Page {
    pub(crate) window: Window<TimerTask>,
    pub(crate) bus: Dispatcher<Page>,
    pub(crate) controller: FormsController,
    pub(crate) notifications: Notifications,
    pub(crate) mask: Option<Box<dyn InputMask>>,
    /// Control whose value was edited since it gained focus; `change` fires on blur.
    edited: Option<NodeId>,
    native_submissions: Vec<NodeId>,
}

impl DispatchHost for Page {
    fn document(&self) -> &Document {
        &self.window.document
    }

    fn dispatcher(&self) -> &Dispatcher<Self> {
        &self.bus
    }
}

impl Page {
    pub fn new(
        document: Document,
        url: Url,
        storage: Box<dyn Storage>,
        controller: FormsController,
    ) -> Self {
        Self {
            window: Window::new(document, url, storage),
            bus: Dispatcher::new(),
            controller,
            notifications: Notifications::default(),
            mask: None,
            edited: None,
            native_submissions: Vec::new(),
        }
    }

    pub fn with_input_mask(mut self, mask: impl InputMask + 'static) -> Self {
        self.mask = Some(Box::new(mask));
        self
    }

    /// DOM-ready: initializes the forms engine, then looks for an order
    /// confirmation in the URL. Safe to call more than once.
    pub fn load(&mut self) {
        controller::initialize(self);
        confirmation::check(self);
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    pub fn document(&self) -> &Document {
        &self.window.document
    }

    pub fn window(&self) -> &Window<TimerTask> {
        &self.window
    }

    pub fn location(&self) -> &Url {
        self.window.location()
    }

    pub fn storage(&self) -> &dyn Storage {
        self.window.storage()
    }

    pub fn controller(&self) -> &FormsController {
        &self.controller
    }

    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    pub fn listener_count(&self) -> usize {
        self.bus.len()
    }

    pub fn listeners_labelled(&self, label: &str) -> usize {
        self.bus.count_labelled(label)
    }

    /// Forms whose `submit` was not prevented.
    pub fn native_submissions(&self) -> &[NodeId] {
        &self.native_submissions
    }

    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.window.document.get_element_by_id(id)
    }

    pub fn messages_for(&self, field: NodeId) -> Vec<String> {
        self.controller.messages_for(&self.window.document, field)
    }

    pub fn outline(&self, cap: usize) -> Vec<String> {
        dom_utils::outline(&self.window.document, self.window.document.root(), cap)
    }

    /// Grafts `tree` under `parent` after load, the way a script inserts
    /// markup. Document-level routes cover it without re-binding.
    pub fn insert(&mut self, parent: NodeId, tree: Node) -> Result<NodeId, DomError> {
        self.window.document.append_tree(parent, tree)
    }

    // ---------------------------------------------------------------------
    // User interaction
    // ---------------------------------------------------------------------

    fn fire(&mut self, kind: EventKind, target: NodeId) -> bool {
        bus::dispatch(self, &mut Event::new(kind, target))
    }

    pub(crate) fn fire_synthetic(&mut self, kind: EventKind, target: NodeId) -> bool {
        bus::dispatch(self, &mut Event::synthetic(kind, target))
    }

    /// Moves focus to `node`, blurring the previously focused element first.
    pub fn focus(&mut self, node: NodeId) -> bool {
        if !self.window.document.is_focusable(node) {
            return false;
        }
        if self.window.document.active_element() == Some(node) {
            return true;
        }
        self.blur();
        self.window.document.set_active_element(Some(node));
        self.fire(EventKind::Focus, node);
        true
    }

    /// Blurs the focused element, committing a pending `change` first.
    pub fn blur(&mut self) -> Option<NodeId> {
        let active = self.window.document.active_element()?;
        if self.edited.take() == Some(active) {
            self.fire(EventKind::Change, active);
        }
        self.window.document.set_active_element(None);
        self.fire(EventKind::Blur, active);
        Some(active)
    }

    /// Forgets an uncommitted edit, so the next blur fires no `change`.
    pub(crate) fn discard_pending_change(&mut self) {
        self.edited = None;
    }

    /// Focuses `field` and replaces its value with `text`, firing `input`.
    pub fn type_text(&mut self, field: NodeId, text: &str) -> bool {
        let doc = &self.window.document;
        if doc.is_disabled(field) || doc.has_attr(field, "readonly") || doc.input_type(field).is_checkable() {
            return false;
        }
        self.focus(field);
        if !self.window.document.set_value(field, text) {
            return false;
        }
        self.edited = Some(field);
        self.fire(EventKind::Input, field);
        true
    }

    /// Picks a `select` value, firing `input` and `change`.
    pub fn select_option(&mut self, select: NodeId, value: &str) -> bool {
        if self.window.document.tag(select) != Some("select") || self.window.document.is_disabled(select) {
            return false;
        }
        self.focus(select);
        self.window.document.set_value(select, value);
        self.fire(EventKind::Input, select);
        self.fire(EventKind::Change, select);
        true
    }

    /// Clicks `node` and performs the default action unless a handler
    /// prevented it: toggling checkables, submitting the owner form from a
    /// submit button. Disabled controls swallow the click.
    pub fn click(&mut self, node: NodeId) -> bool {
        let doc = &self.window.document;
        if !doc.is_connected(node) {
            return false;
        }
        if matches!(doc.tag(node), Some("input" | "button" | "select" | "textarea")) && doc.is_disabled(node) {
            return false;
        }
        if doc.is_focusable(node) {
            self.focus(node);
        } else {
            self.blur();
        }

        if !self.fire(EventKind::Click, node) {
            return false;
        }
        self.click_default_action(node);
        true
    }

    fn click_default_action(&mut self, node: NodeId) {
        let doc = &mut self.window.document;
        match doc.input_type(node) {
            InputControlType::Checkbox => {
                let now = !doc.checked(node);
                doc.set_checked(node, now);
                self.fire(EventKind::Input, node);
                self.fire(EventKind::Change, node);
            }
            InputControlType::Radio => {
                if doc.set_checked(node, true) {
                    self.fire(EventKind::Input, node);
                    self.fire(EventKind::Change, node);
                }
            }
            _ => {
                let submits = matches!(doc.tag(node), Some("button" | "input"))
                    && doc.control_type(node) == "submit";
                if submits && let Some(form) = doc.form_owner(node) {
                    self.submit(form);
                }
            }
        }
    }

    /// Sets a checkbox or radio to `checked` by clicking it if needed.
    pub fn set_checked(&mut self, node: NodeId, checked: bool) -> bool {
        if self.window.document.checked(node) == checked {
            return true;
        }
        self.click(node) && self.window.document.checked(node) == checked
    }

    /// Fires `submit` at `form`; an unprevented submit counts as a native
    /// submission.
    pub fn submit(&mut self, form: NodeId) -> bool {
        if self.window.document.tag(form) != Some("form") {
            return false;
        }
        let allowed = self.fire(EventKind::Submit, form);
        if allowed {
            log::info!(target: "forms.submit", "native submission of {form:?}");
            self.native_submissions.push(form);
        }
        allowed
    }

    /// Runs every timer due within the next `ms` milliseconds, in order.
    pub fn advance(&mut self, ms: Millis) {
        let until = self.window.now().saturating_add(ms);
        while let Some((_, task)) = self.window.timers_mut().pop_due(until) {
            notify::run_timer(self, task);
        }
        self.window.timers_mut().set_now(until);
    }

    /// Clicks the close button of the newest notification.
    pub fn close_notification(&mut self) -> bool {
        match self.notifications.live().last() {
            Some(n) => {
                let button = n.close_button;
                self.click(button)
            }
            None => false,
        }
    }
}
