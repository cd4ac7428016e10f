use crate::validity::{Constraints, ValidityState, Violation};
use serde::Deserialize;

/// Message templates per violation.
///
/// Placeholders: `{minLength}`, `{maxLength}`, `{min}`, `{max}`, `{step}`.
/// A pattern mismatch prefers the field's `title` over its template.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct MessageCatalog {
    pub value_missing: String,
    pub type_mismatch: String,
    pub pattern_mismatch: String,
    pub too_short: String,
    pub too_long: String,
    pub range_underflow: String,
    pub range_overflow: String,
    pub step_mismatch: String,
    pub bad_input: String,
}

impl Default for MessageCatalog {
    fn default() -> Self {
        Self {
            value_missing: "Будь ласка, заповніть це поле!".to_string(),
            type_mismatch: "Невірний формат".to_string(),
            pattern_mismatch: "Невірний формат даних".to_string(),
            too_short: "Мінімум символів — {minLength}".to_string(),
            too_long: "Максимум символів — {maxLength}".to_string(),
            range_underflow: "Значення має бути не менше {min}.".to_string(),
            range_overflow: "Значення має бути не більше {max}.".to_string(),
            step_mismatch: "Значення має бути кратним {step}.".to_string(),
            bad_input: "Введено некоректне число".to_string(),
        }
    }
}

impl MessageCatalog {
    fn template(&self, violation: Violation) -> &str {
        match violation {
            Violation::ValueMissing => &self.value_missing,
            Violation::TypeMismatch => &self.type_mismatch,
            Violation::PatternMismatch => &self.pattern_mismatch,
            Violation::TooShort => &self.too_short,
            Violation::TooLong => &self.too_long,
            Violation::RangeUnderflow => &self.range_underflow,
            Violation::RangeOverflow => &self.range_overflow,
            Violation::StepMismatch => &self.step_mismatch,
            Violation::BadInput => &self.bad_input,
        }
    }

    pub fn message(&self, violation: Violation, constraints: &Constraints) -> String {
        if violation == Violation::PatternMismatch
            && let Some(title) = constraints.title.as_deref()
        {
            return title.to_string();
        }
        let number = |v: Option<usize>| v.map(|n| n.to_string()).unwrap_or_default();
        self.template(violation)
            .replace("{minLength}", &number(constraints.min_length))
            .replace("{maxLength}", &number(constraints.max_length))
            .replace("{min}", constraints.min.as_deref().unwrap_or(""))
            .replace("{max}", constraints.max.as_deref().unwrap_or(""))
            .replace("{step}", constraints.step.as_deref().unwrap_or("1"))
    }

    /// One message per violation present, in [`Violation::ALL`] order.
    pub fn messages_for(&self, validity: ValidityState, constraints: &Constraints) -> Vec<String> {
        validity
            .iter()
            .map(|v| self.message(v, constraints))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_field_has_no_messages() {
        let catalog = MessageCatalog::default();
        assert!(catalog
            .messages_for(ValidityState::valid(), &Constraints::default())
            .is_empty());
    }

    #[test]
    fn substitutes_constraint_metadata() {
        let catalog = MessageCatalog::default();
        let c = Constraints {
            min_length: Some(2),
            min: Some("1".to_string()),
            step: Some("5".to_string()),
            ..Constraints::default()
        };
        let state: ValidityState = [Violation::StepMismatch, Violation::TooShort, Violation::RangeUnderflow]
            .into_iter()
            .collect();
        assert_eq!(
            catalog.messages_for(state, &c),
            vec![
                "Мінімум символів — 2".to_string(),
                "Значення має бути не менше 1.".to_string(),
                "Значення має бути кратним 5.".to_string(),
            ]
        );
    }

    #[test]
    fn pattern_mismatch_prefers_title() {
        let catalog = MessageCatalog::default();
        let mut c = Constraints::default();
        assert_eq!(
            catalog.message(Violation::PatternMismatch, &c),
            "Невірний формат даних"
        );
        c.title = Some("Формат: +38 (0XX) XXX-XX-XX".to_string());
        assert_eq!(
            catalog.message(Violation::PatternMismatch, &c),
            "Формат: +38 (0XX) XXX-XX-XX"
        );
    }
}
