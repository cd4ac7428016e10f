//! Form lifecycle: validation rendering, draft capture and restore, consent
//! gating, the submission pipeline and the post-submit reset.

use crate::a11y::{self, ErrorBindings};
use crate::config::{ConfigError, FormsConfig, Selectors};
use crate::confirmation;
use crate::draft::{self, DraftStore, DraftValue};
use crate::notify;
use crate::page::Page;
use crate::validity::{check_field, is_required, will_validate};
use bus::{Event, Matcher};
use core_types::{EventKind, Phase};
use dom::{Document, InputControlType, Node, NodeId};
use std::collections::BTreeMap;

/// Per-page controller. The flags make initialization, event binding and the
/// order confirmation one-shot.
#[derive(Debug)]
pub struct FormsController {
    config: FormsConfig,
    selectors: Selectors,
    drafts: DraftStore,
    bindings: ErrorBindings,
    initialized: bool,
    events_bound: bool,
    order_alert_shown: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Validation failed; focus moved to this field.
    Invalid(NodeId),
    Sent,
    /// An order: the confirmation URL was pushed and the confirmation ran.
    Ordered,
}

impl FormsController {
    pub fn new(config: FormsConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let selectors = Selectors::compile(&config.selectors)?;
        Ok(Self {
            drafts: DraftStore::new(config.storage.clone()),
            config,
            selectors,
            bindings: ErrorBindings::default(),
            initialized: false,
            events_bound: false,
            order_alert_shown: false,
        })
    }

    pub fn config(&self) -> &FormsConfig {
        &self.config
    }

    pub fn selectors(&self) -> &Selectors {
        &self.selectors
    }

    pub fn drafts(&self) -> &DraftStore {
        &self.drafts
    }

    pub fn bindings(&self) -> &ErrorBindings {
        &self.bindings
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn events_bound(&self) -> bool {
        self.events_bound
    }

    /// Returns `true` only on the first call.
    fn begin_init(&mut self) -> bool {
        !std::mem::replace(&mut self.initialized, true)
    }

    fn begin_bind(&mut self) -> bool {
        !std::mem::replace(&mut self.events_bound, true)
    }

    /// Takes the confirmation guard. Returns `false` if it is already held.
    pub fn claim_order_alert(&mut self) -> bool {
        !std::mem::replace(&mut self.order_alert_shown, true)
    }

    pub fn reset_order_alert(&mut self) {
        self.order_alert_shown = false;
    }

    /// Messages for every violation `field` currently has.
    pub fn messages_for(&self, doc: &Document, field: NodeId) -> Vec<String> {
        let (constraints, validity) = check_field(doc, field);
        self.config.messages.messages_for(validity, &constraints)
    }
}

/// Runs once per page: binds the document routes (validation, draft capture,
/// submit), wires accessibility, restores drafts, attaches input masks and
/// consent gating.
pub fn initialize(page: &mut Page) -> bool {
    if !page.controller.begin_init() {
        log::debug!(target: "forms", "already initialized");
        return false;
    }

    bind_events(page);

    page.controller.bindings = a11y::bind_accessibility(
        &mut page.window.document,
        &page.controller.selectors,
        &page.controller.config.storage.error_id_fallback,
    );

    let doc = &page.window.document;
    let forms = doc.query_selector_all(doc.root(), &page.controller.selectors.form);
    for &form in &forms {
        restore_draft(page, form);
    }
    bind_input_masks(page);
    for &form in &forms {
        bind_consent(page, form);
    }

    log::info!(target: "forms", "initialized {} forms", forms.len());
    true
}

fn bind_events(page: &mut Page) {
    if !page.controller.begin_bind() {
        return;
    }
    let forms = Matcher::Closest(page.controller.selectors.form.clone());
    page.bus
        .on(EventKind::Focus, Phase::Capture, forms.clone(), "forms.focus", on_focus);
    page.bus
        .on(EventKind::Blur, Phase::Capture, forms.clone(), "forms.blur", on_blur);
    page.bus
        .on(EventKind::Change, Phase::Bubble, forms.clone(), "forms.change", on_blur);
    for kind in [EventKind::Input, EventKind::Change] {
        page.bus
            .on(kind, Phase::Bubble, forms.clone(), "forms.draft", on_draft_event);
    }
    page.bus
        .on(EventKind::Submit, Phase::Bubble, Matcher::Anywhere, "forms.submit", on_submit);
}

fn on_focus(page: &mut Page, ev: &mut Event) {
    let doc = &mut page.window.document;
    if !is_required(doc, ev.target) {
        return;
    }
    clear_field(doc, &page.controller.bindings, ev.target);
}

// Shared by blur and change.
fn on_blur(page: &mut Page, ev: &mut Event) {
    if !is_required(page.document(), ev.target) {
        return;
    }
    validate_field(&mut page.window.document, &page.controller, ev.target);
}

fn on_submit(page: &mut Page, ev: &mut Event) {
    if !page.document().matches(ev.target, &page.controller.selectors.form) {
        return;
    }
    ev.prevent_default();
    let outcome = submit_form(page, ev.target);
    log::debug!(target: "forms.submit", "{:?} -> {outcome:?}", ev.target);
}

/// Validates `field` and renders the result: `is-valid`/`is-invalid`,
/// `aria-invalid` and one `span.form-error` per message.
pub fn validate_field(doc: &mut Document, controller: &FormsController, field: NodeId) -> bool {
    let messages = controller.messages_for(doc, field);
    let valid = messages.is_empty();
    doc.set_attr(field, "aria-invalid", if valid { "false" } else { "true" });
    doc.toggle_class(field, "is-valid", valid);
    doc.toggle_class(field, "is-invalid", !valid);
    render_errors(doc, &controller.bindings, field, &messages);
    valid
}

fn clear_field(doc: &mut Document, bindings: &ErrorBindings, field: NodeId) {
    doc.remove_class(field, "is-valid");
    doc.remove_class(field, "is-invalid");
    doc.set_attr(field, "aria-invalid", "false");
    render_errors(doc, bindings, field, &[]);
}

fn render_errors(doc: &mut Document, bindings: &ErrorBindings, field: NodeId, messages: &[String]) {
    let target = bindings.target(field).or_else(|| {
        doc.attr(field, "aria-errormessage")
            .and_then(|id| doc.get_element_by_id(id))
    });
    let Some(target) = target.filter(|&t| doc.is_connected(t)) else {
        return;
    };
    doc.clear_children(target);
    for msg in messages {
        let span = Node::element("span").class("form-error").child(Node::text(msg.as_str()));
        if let Err(err) = doc.append_tree(target, span) {
            log::warn!(target: "forms", "rendering error message: {err}");
        }
    }
}

// ---------------------------------------------------------------------------
// Drafts
// ---------------------------------------------------------------------------

fn on_draft_event(page: &mut Page, ev: &mut Event) {
    let Some(form) = ev.current_target else {
        return;
    };
    let doc = &page.window.document;
    let Some(name) = doc.attr(ev.target, "name").filter(|n| !n.is_empty()) else {
        return;
    };
    let name = name.to_string();

    let drafts = &page.controller.drafts;
    let mut record = drafts.load(page.window.storage(), doc, form);
    if doc.input_type(ev.target) == InputControlType::Checkbox {
        record.insert(name, DraftValue::Checked(doc.checked(ev.target)));
    } else {
        let cleaned = draft::normalize_input(doc.value(ev.target).unwrap_or(""));
        if cleaned.is_empty() {
            record.remove(&name);
        } else {
            record.insert(name, DraftValue::Text(cleaned));
        }
    }

    let key = drafts.storage_key(doc, form);
    log::trace!(target: "forms.draft", "{} on {:?} updates {key}", ev.kind.as_str(), ev.target);
    let (doc, storage) = page.window.document_and_storage();
    page.controller.drafts.save(storage, doc, form, &record);
}

fn restore_draft(page: &mut Page, form: NodeId) {
    let record = page
        .controller
        .drafts
        .load(page.window.storage(), &page.window.document, form);
    if record.is_empty() {
        return;
    }
    log::debug!(target: "forms.draft", "restoring {} fields into {form:?}", record.len());

    for (name, value) in record {
        let doc = &mut page.window.document;
        let Some(field) = doc.named_element(form, &name) else {
            log::debug!(target: "forms.draft", "no field named `{name}`");
            continue;
        };
        match doc.input_type(field) {
            InputControlType::Checkbox => {
                doc.set_checked(field, value.is_truthy());
                page.fire_synthetic(EventKind::Change, field);
            }
            InputControlType::Radio => {
                let wanted = value.as_text();
                let radio = doc
                    .radio_group(field)
                    .into_iter()
                    .find(|&r| doc.value(r) == Some(wanted.as_str()));
                if let Some(radio) = radio {
                    doc.set_checked(radio, true);
                }
            }
            _ => {
                doc.set_value(field, &value.as_text());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Collaborators: input masks and consent gating
// ---------------------------------------------------------------------------

fn bind_input_masks(page: &mut Page) {
    if page.mask.is_none() {
        return;
    }
    let doc = &page.window.document;
    let fields = doc.query_selector_all(doc.root(), &page.controller.selectors.phone);
    for field in fields {
        // Capture, so draft capture further down the route list sees the masked value.
        page.bus.on(
            EventKind::Input,
            Phase::Capture,
            Matcher::Within(field),
            "forms.mask",
            move |page, _| {
                let Some(mask) = page.mask.as_ref() else {
                    return;
                };
                let raw = page.window.document.value(field).unwrap_or("");
                let masked = mask.apply(raw);
                if masked != raw {
                    page.window.document.set_value(field, &masked);
                }
            },
        );
    }
}

fn bind_consent(page: &mut Page, form: NodeId) {
    let doc = &mut page.window.document;
    let selectors = &page.controller.selectors;
    let (Some(policy), Some(submit)) = (
        doc.query_selector(form, &selectors.policy_checkbox),
        doc.query_selector(form, &selectors.submit_control),
    ) else {
        return;
    };

    let checked = doc.checked(policy);
    doc.set_disabled(submit, !checked);
    page.bus.on(
        EventKind::Change,
        Phase::Bubble,
        Matcher::Within(policy),
        "forms.consent",
        move |page, _| {
            let doc = &mut page.window.document;
            let checked = doc.checked(policy);
            doc.set_disabled(submit, !checked);
        },
    );
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

/// The three order fields, when `form` is an order form with all of them
/// filled. An explicit `data-js-form-role` decides on its own: `order` keeps
/// the form eligible, any other role opts it out.
fn order_fields(doc: &Document, cfg: &FormsConfig, form: NodeId) -> Option<[(String, String); 3]> {
    if let Some(role) = doc.attr(form, "data-js-form-role")
        && !role.eq_ignore_ascii_case("order")
    {
        return None;
    }
    let c = &cfg.confirmation;
    let field = |id: &String| -> Option<(String, String)> {
        let node = doc.find_by_id_within(form, id)?;
        let value = doc.value(node).filter(|v| !v.is_empty())?;
        Some((id.clone(), value.to_string()))
    };
    let fields = [field(&c.city), field(&c.venue), field(&c.datetime)];
    match fields {
        [Some(city), Some(venue), Some(datetime)] => Some([city, venue, datetime]),
        _ => {
            if doc.has_attr(form, "data-js-form-role") {
                log::warn!(target: "forms.submit", "order form {form:?} is missing concert fields");
            }
            None
        }
    }
}

/// Validate every candidate field; on success clean the draft, push the order
/// URL for order forms, delete the draft and reset the form.
pub fn submit_form(page: &mut Page, form: NodeId) -> SubmitOutcome {
    let doc = &page.window.document;
    let fields: Vec<NodeId> = doc
        .form_elements(form)
        .into_iter()
        .filter(|&f| will_validate(doc, f))
        .collect();

    let mut first_invalid = None;
    for field in fields {
        let valid = validate_field(&mut page.window.document, &page.controller, field);
        if !valid && first_invalid.is_none() {
            first_invalid = Some(field);
        }
    }
    if let Some(field) = first_invalid {
        log::debug!(target: "forms.submit", "{form:?} invalid, focusing {field:?}");
        page.focus(field);
        return SubmitOutcome::Invalid(field);
    }

    let doc = &page.window.document;
    let mut cleaned: BTreeMap<String, String> = page
        .controller
        .drafts
        .load(page.window.storage(), doc, form)
        .into_iter()
        .map(|(k, v)| {
            let v = match v {
                DraftValue::Text(s) => draft::clean_submitted(&s),
                DraftValue::Checked(b) => b.to_string(),
            };
            (k, v)
        })
        .collect();

    let outcome = match order_fields(doc, &page.controller.config, form) {
        Some(order) => {
            cleaned.extend(order);
            let query = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(cleaned.iter())
                .finish();
            let target = format!("{}?{query}", page.controller.config.confirmation.path);
            if let Err(err) = page.window.push_state(&target) {
                log::error!(target: "forms.submit", "pushState {target}: {err}");
            }
            page.controller.reset_order_alert();
            confirmation::check(page);
            SubmitOutcome::Ordered
        }
        None => SubmitOutcome::Sent,
    };

    let (doc, storage) = page.window.document_and_storage();
    page.controller.drafts.remove(storage, doc, form);
    reset_form(page, form);

    if outcome == SubmitOutcome::Sent {
        let lines = vec![success_message(&page.controller.config, &cleaned)];
        if let Err(err) = notify::show(page, form, lines) {
            log::error!(target: "forms.submit", "cannot show success notification: {err}");
        }
    }
    log::info!(target: "forms.submit", "{form:?} submitted ({outcome:?})");
    outcome
}

fn success_message(cfg: &FormsConfig, cleaned: &BTreeMap<String, String>) -> String {
    let n = &cfg.notifications;
    match cleaned.get(&n.name_field).filter(|v| !v.is_empty()) {
        Some(name) => n
            .success_named
            .replace("{name}", name)
            .replace("{email}", cleaned.get(&n.email_field).map_or("", String::as_str)),
        None => n.success_default.clone(),
    }
}

/// Restores defaults, clears validation state, re-checks the policy box,
/// closes the enclosing popup and overlay, unlocks the body and drops focus.
pub fn reset_form(page: &mut Page, form: NodeId) {
    page.window.document.reset_form(form);
    page.discard_pending_change();

    let doc = &page.window.document;
    let selectors = &page.controller.selectors;
    if let Some(button) = doc.query_selector(form, &selectors.submit_button)
        && doc.active_element() == Some(button)
    {
        page.blur();
    }

    let doc = &mut page.window.document;
    let selectors = &page.controller.selectors;
    let required: Vec<NodeId> = doc
        .descendant_elements(form)
        .into_iter()
        .filter(|&el| doc.has_attr(el, "required"))
        .collect();
    for field in required {
        clear_field(doc, &page.controller.bindings, field);
    }

    if let Some(policy) = doc.query_selector(form, &selectors.policy_checkbox) {
        doc.set_checked(policy, true);
    }

    if let Some(popup) = doc.closest(form, &selectors.popup) {
        for class in ["is-visible", "is-active", "is-open"] {
            doc.remove_class(popup, class);
        }
        doc.set_attr(popup, "aria-hidden", "true");
    }

    if let Some(overlay) = doc.query_selector(doc.root(), &selectors.overlay) {
        doc.remove_class(overlay, "is-visible");
        doc.remove_class(overlay, "active");
        doc.set_style(overlay, "display", "none");
        doc.set_attr(overlay, "aria-hidden", "true");
    }

    let body = doc.body();
    doc.remove_class(body, "popup-open");
    doc.set_style(body, "overflow", "");
    doc.set_style(body, "touch-action", "");

    page.blur();
}
