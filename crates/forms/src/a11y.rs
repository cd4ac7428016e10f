//! Wiring between required fields and the elements their messages render into.

use crate::config::Selectors;
use dom::{Document, NodeId};
use std::collections::HashMap;

/// Field to error-container associations, built once per page load.
#[derive(Clone, Debug, Default)]
pub struct ErrorBindings {
    targets: HashMap<NodeId, NodeId>,
}

impl ErrorBindings {
    pub fn target(&self, field: NodeId) -> Option<NodeId> {
        self.targets.get(&field).copied()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// `name`, else `id`, else `fallback`.
pub fn form_key<'a>(doc: &'a Document, form: NodeId, fallback: &'a str) -> &'a str {
    doc.attr(form, "name")
        .filter(|v| !v.is_empty())
        .or_else(|| doc.element_id(form))
        .unwrap_or(fallback)
}

pub fn error_id(form_key: &str, field_name: &str) -> String {
    format!("{form_key}-{field_name}-error")
}

/// Resolves the error container of `field`: an element with the generated id
/// inside the form, else the errors container inside the enclosing `label`,
/// else inside the enclosing `fieldset`.
fn resolve_target(
    doc: &Document,
    selectors: &Selectors,
    form: NodeId,
    field: NodeId,
    id: &str,
) -> Option<NodeId> {
    doc.find_by_id_within(form, id)
        .or_else(|| {
            doc.closest(field, &selectors.label)
                .and_then(|label| doc.query_selector(label, &selectors.field_errors))
        })
        .or_else(|| {
            doc.closest(field, &selectors.fieldset)
                .and_then(|set| doc.query_selector(set, &selectors.field_errors))
        })
}

/// Assigns ids to error containers and points each required, named field at
/// its container through `aria-errormessage`.
pub fn bind_accessibility(doc: &mut Document, selectors: &Selectors, fallback: &str) -> ErrorBindings {
    let mut bindings = ErrorBindings::default();
    for form in doc.query_selector_all(doc.root(), &selectors.form) {
        let key = form_key(doc, form, fallback).to_string();
        let required: Vec<NodeId> = doc
            .descendant_elements(form)
            .into_iter()
            .filter(|&el| doc.has_attr(el, "required"))
            .collect();

        for field in required {
            let Some(name) = doc.attr(field, "name").filter(|n| !n.is_empty()) else {
                continue;
            };
            let generated = error_id(&key, name);
            let Some(target) = resolve_target(doc, selectors, form, field, &generated) else {
                log::debug!(target: "forms.a11y", "no error container for `{generated}`");
                continue;
            };
            let id = doc.element_id(target).map(str::to_string).unwrap_or(generated);
            doc.set_attr(target, "id", &id);
            doc.set_attr(field, "aria-errormessage", &id);
            bindings.targets.insert(field, target);
        }
    }
    log::debug!(target: "forms.a11y", "bound {} error containers", bindings.len());
    bindings
}
