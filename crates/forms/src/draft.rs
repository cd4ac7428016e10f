//! Per-form draft persistence.
//!
//! A draft is a JSON object of field name to string value or checkbox state,
//! stored under `{prefix}{formIdentity}`. The `try_*` operations expose
//! failures; the plain ones log them and degrade to "no draft".

use crate::config::StorageKeys;
use dom::{Document, NodeId};
use platform::{Storage, StorageError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DraftValue {
    Checked(bool),
    Text(String),
}

impl DraftValue {
    /// Checkbox reading of the value: a non-empty string counts as checked.
    pub fn is_truthy(&self) -> bool {
        match self {
            DraftValue::Checked(b) => *b,
            DraftValue::Text(s) => !s.is_empty(),
        }
    }

    /// Value reading: booleans render as `true`/`false`.
    pub fn as_text(&self) -> String {
        match self {
            DraftValue::Checked(b) => b.to_string(),
            DraftValue::Text(s) => s.clone(),
        }
    }
}

pub type DraftRecord = BTreeMap<String, DraftValue>;

#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("draft `{key}` is not a valid record: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("encoding draft `{key}`: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{2,}").unwrap_or_else(|err| unreachable!("{err}")));

/// Normalization applied while typing: runs of blank lines collapse to one
/// newline, then surrounding whitespace is trimmed.
pub fn normalize_input(value: &str) -> String {
    BLANK_LINES.replace_all(value, "\n").trim().to_string()
}

/// Normalization applied to drafted values at submission.
pub fn clean_submitted(value: &str) -> String {
    normalize_input(value.trim())
}

#[derive(Clone, Debug, Default)]
pub struct DraftStore {
    keys: StorageKeys,
}

impl DraftStore {
    pub fn new(keys: StorageKeys) -> Self {
        Self { keys }
    }

    /// Pure and total: `prefix` + `name` | `id` | fallback.
    pub fn storage_key(&self, doc: &Document, form: NodeId) -> String {
        let identity = doc
            .attr(form, "name")
            .filter(|v| !v.is_empty())
            .or_else(|| doc.element_id(form))
            .unwrap_or(self.keys.fallback.as_str());
        format!("{}{identity}", self.keys.prefix)
    }

    pub fn try_load(
        &self,
        storage: &dyn Storage,
        doc: &Document,
        form: NodeId,
    ) -> Result<DraftRecord, DraftError> {
        let key = self.storage_key(doc, form);
        match storage.get_item(&key)? {
            None => Ok(DraftRecord::new()),
            Some(raw) if raw.is_empty() => Ok(DraftRecord::new()),
            Some(raw) => serde_json::from_str(&raw).map_err(|source| DraftError::Decode { key, source }),
        }
    }

    pub fn load(&self, storage: &dyn Storage, doc: &Document, form: NodeId) -> DraftRecord {
        self.try_load(storage, doc, form).unwrap_or_else(|err| {
            log::error!(target: "forms.draft", "reading draft failed: {err}");
            DraftRecord::new()
        })
    }

    /// An empty record deletes the entry instead of storing `{}`.
    pub fn try_save(
        &self,
        storage: &mut dyn Storage,
        doc: &Document,
        form: NodeId,
        record: &DraftRecord,
    ) -> Result<(), DraftError> {
        let key = self.storage_key(doc, form);
        if record.is_empty() {
            storage.remove_item(&key)?;
            return Ok(());
        }
        let json = serde_json::to_string(record).map_err(|source| DraftError::Encode {
            key: key.clone(),
            source,
        })?;
        storage.set_item(&key, &json)?;
        log::trace!(target: "forms.draft", "saved {} fields under {key}", record.len());
        Ok(())
    }

    pub fn save(&self, storage: &mut dyn Storage, doc: &Document, form: NodeId, record: &DraftRecord) {
        if let Err(err) = self.try_save(storage, doc, form, record) {
            log::error!(target: "forms.draft", "writing draft failed: {err}");
        }
    }

    pub fn try_remove(&self, storage: &mut dyn Storage, doc: &Document, form: NodeId) -> Result<(), DraftError> {
        storage.remove_item(&self.storage_key(doc, form))?;
        Ok(())
    }

    pub fn remove(&self, storage: &mut dyn Storage, doc: &Document, form: NodeId) {
        if let Err(err) = self.try_remove(storage, doc, form) {
            log::error!(target: "forms.draft", "deleting draft failed: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom::Node;
    use platform::MemoryStorage;

    fn doc() -> (Document, Vec<NodeId>) {
        let doc = Document::load(Node::document(vec![Node::element("body").children([
            Node::element("form").attr("name", "order").id("order__form"),
            Node::element("form").id("contacts-form"),
            Node::element("form"),
        ])]));
        let forms = doc.descendant_elements(doc.body());
        (doc, forms)
    }

    fn record(pairs: &[(&str, DraftValue)]) -> DraftRecord {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn storage_key_prefers_name_then_id_then_fallback() {
        let (doc, forms) = doc();
        let store = DraftStore::default();
        assert_eq!(store.storage_key(&doc, forms[0]), "form-storage:order");
        assert_eq!(store.storage_key(&doc, forms[1]), "form-storage:contacts-form");
        assert_eq!(store.storage_key(&doc, forms[2]), "form-storage:default");
    }

    #[test]
    fn empty_record_deletes_entry() {
        let (doc, forms) = doc();
        let store = DraftStore::default();
        let mut storage = MemoryStorage::new();

        store.save(&mut storage, &doc, forms[0], &record(&[("name", DraftValue::Text("Olena".into()))]));
        assert_eq!(storage.peek("form-storage:order").as_deref(), Some(r#"{"name":"Olena"}"#));

        store.save(&mut storage, &doc, forms[0], &DraftRecord::new());
        assert!(store.load(&storage, &doc, forms[0]).is_empty());
        assert!(storage.is_empty());
    }

    #[test]
    fn mixed_values_round_trip_as_json_object() {
        let (doc, forms) = doc();
        let store = DraftStore::default();
        let mut storage = MemoryStorage::new();
        let draft = record(&[
            ("policy", DraftValue::Checked(false)),
            ("message", DraftValue::Text("a\nb".into())),
        ]);
        store.save(&mut storage, &doc, forms[1], &draft);
        assert_eq!(
            storage.peek("form-storage:contacts-form").as_deref(),
            Some(r#"{"message":"a\nb","policy":false}"#)
        );
        assert_eq!(store.load(&storage, &doc, forms[1]), draft);
    }

    #[test]
    fn corrupt_or_unreadable_storage_degrades_to_empty() {
        let (doc, forms) = doc();
        let store = DraftStore::default();
        let mut storage = MemoryStorage::new();
        storage.set_item("form-storage:order", "{not json").unwrap();
        assert!(matches!(
            store.try_load(&storage, &doc, forms[0]),
            Err(DraftError::Decode { .. })
        ));
        assert!(store.load(&storage, &doc, forms[0]).is_empty());

        storage.set_access_denied(true);
        assert!(matches!(
            store.try_load(&storage, &doc, forms[0]),
            Err(DraftError::Storage(StorageError::AccessDenied(_)))
        ));
        // Swallowed, not propagated.
        store.remove(&mut storage, &doc, forms[0]);
    }

    #[test]
    fn quota_failure_is_reported_by_try_save() {
        let (doc, forms) = doc();
        let store = DraftStore::default();
        let mut storage = MemoryStorage::with_quota(16);
        let draft = record(&[("message", DraftValue::Text("x".repeat(64)))]);
        assert!(matches!(
            store.try_save(&mut storage, &doc, forms[0], &draft),
            Err(DraftError::Storage(StorageError::QuotaExceeded { .. }))
        ));
        store.save(&mut storage, &doc, forms[0], &draft);
        assert!(storage.is_empty());
    }

    #[test]
    fn normalizers_collapse_blank_lines() {
        assert_eq!(normalize_input("  hello\n\n\nworld \n\n"), "hello\nworld");
        assert_eq!(normalize_input("   "), "");
        assert_eq!(clean_submitted("\n\n a \n\n\n b\n"), "a \n b");
    }
}
