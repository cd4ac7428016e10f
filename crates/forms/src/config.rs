//! Engine configuration.
//!
//! Every knob has the landing site's value as its default, so an empty TOML
//! document (or no file at all) yields the stock behavior.

use crate::messages::MessageCatalog;
use dom::{Selector, SelectorError};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing forms config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("selector `{name}` is invalid: {source}")]
    Selector {
        name: &'static str,
        #[source]
        source: SelectorError,
    },
    #[error("{0}")]
    Invalid(String),
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct FormsConfig {
    pub selectors: SelectorConfig,
    pub storage: StorageKeys,
    pub notifications: NotificationConfig,
    pub confirmation: ConfirmationConfig,
    pub messages: MessageCatalog,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct SelectorConfig {
    pub form: String,
    pub field_errors: String,
    pub policy_checkbox: String,
    pub submit_control: String,
    pub submit_button: String,
    pub popup: String,
    pub overlay: String,
    pub phone: String,
    /// Where the order confirmation is anchored; `body` when absent.
    pub order_anchor: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            form: "[data-js-form]".to_string(),
            field_errors: "[data-js-form-field-errors]".to_string(),
            policy_checkbox: ".js-policy-checkbox".to_string(),
            submit_control: "[data-js-submit]".to_string(),
            submit_button: "button[type='submit']".to_string(),
            popup: ".popup, .modal, .dialog".to_string(),
            overlay: ".popup-overlay, .modal-backdrop, .overlay".to_string(),
            phone: "[data-js-phone]".to_string(),
            order_anchor: "#order__form".to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct StorageKeys {
    pub prefix: String,
    /// Form identity used for the storage key when a form has neither `name` nor `id`.
    pub fallback: String,
    /// Form identity used for generated error ids in the same situation.
    pub error_id_fallback: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            prefix: "form-storage:".to_string(),
            fallback: "default".to_string(),
            error_id_fallback: "form".to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct NotificationConfig {
    pub timeout_ms: u64,
    pub close_label: String,
    pub close_text: String,
    pub success_default: String,
    /// `{name}` and `{email}` are substituted from the submitted draft.
    pub success_named: String,
    pub name_field: String,
    pub email_field: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5000,
            close_label: "Закрити повідомлення".to_string(),
            close_text: "×".to_string(),
            success_default: "Заявку успішно відправлено!".to_string(),
            success_named:
                "Дякуємо, {name}! Ваше повідомлення надіслано. Ми відповімо на {email}."
                    .to_string(),
            name_field: "name".to_string(),
            email_field: "e-mail".to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct ConfirmationConfig {
    /// Path pushed to history, with the order as query string, after an order submission.
    pub path: String,
    /// Used both as the order form's field ids and as query parameter names.
    pub city: String,
    pub venue: String,
    pub datetime: String,
    pub tickets: String,
    pub heading: String,
    pub city_label: String,
    pub venue_label: String,
    pub datetime_label: String,
    pub tickets_label: String,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            path: "/index.html".to_string(),
            city: "concert-city".to_string(),
            venue: "concert-venue".to_string(),
            datetime: "concert-datetime".to_string(),
            tickets: "ticket-count".to_string(),
            heading: "✅ Ваше замовлення підтверджено".to_string(),
            city_label: "Місто".to_string(),
            venue_label: "Місце".to_string(),
            datetime_label: "Дата і час".to_string(),
            tickets_label: "Кількість квитків".to_string(),
        }
    }
}

impl FormsConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: FormsConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        Selectors::compile(&self.selectors)?;
        if self.storage.prefix.is_empty() {
            return Err(ConfigError::Invalid("storage.prefix must not be empty".to_string()));
        }
        if self.confirmation.path.is_empty() {
            return Err(ConfigError::Invalid("confirmation.path must not be empty".to_string()));
        }
        Ok(())
    }
}

/// [`SelectorConfig`] parsed once.
#[derive(Clone, Debug)]
pub struct Selectors {
    pub form: Selector,
    pub field_errors: Selector,
    pub policy_checkbox: Selector,
    pub submit_control: Selector,
    pub submit_button: Selector,
    pub popup: Selector,
    pub overlay: Selector,
    pub phone: Selector,
    pub order_anchor: Selector,
    pub label: Selector,
    pub fieldset: Selector,
}

impl Selectors {
    pub fn compile(cfg: &SelectorConfig) -> Result<Self, ConfigError> {
        fn one(name: &'static str, source: &str) -> Result<Selector, ConfigError> {
            Selector::parse(source).map_err(|source| ConfigError::Selector { name, source })
        }

        Ok(Self {
            form: one("form", &cfg.form)?,
            field_errors: one("field-errors", &cfg.field_errors)?,
            policy_checkbox: one("policy-checkbox", &cfg.policy_checkbox)?,
            submit_control: one("submit-control", &cfg.submit_control)?,
            submit_button: one("submit-button", &cfg.submit_button)?,
            popup: one("popup", &cfg.popup)?,
            overlay: one("overlay", &cfg.overlay)?,
            phone: one("phone", &cfg.phone)?,
            order_anchor: one("order-anchor", &cfg.order_anchor)?,
            label: one("label", "label")?,
            fieldset: one("fieldset", "fieldset")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_site_defaults() {
        let cfg = FormsConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, FormsConfig::default());
        assert_eq!(cfg.storage.prefix, "form-storage:");
        assert_eq!(cfg.notifications.timeout_ms, 5000);
    }

    #[test]
    fn partial_sections_override_only_given_keys() {
        let cfg = FormsConfig::from_toml_str(
            r#"
            [notifications]
            timeout-ms = 1500

            [messages]
            value-missing = "Required"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.notifications.timeout_ms, 1500);
        assert_eq!(cfg.notifications.close_label, "Закрити повідомлення");
        assert_eq!(cfg.messages.value_missing, "Required");
        assert_eq!(cfg.messages.type_mismatch, "Невірний формат");
    }

    #[test]
    fn rejects_unparseable_selector() {
        let err = FormsConfig::from_toml_str(
            r#"
            [selectors]
            form = "form input"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Selector { name: "form", .. }));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = FormsConfig::load(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
