//! Constraint validation.
//!
//! [`Constraints`] captures what a control declares in markup;
//! [`Constraints::validate`] turns a value into a [`ValidityState`]. Validity
//! is always recomputed from the live document, never cached.

use dom::{Document, InputControlType, NodeId};
use regex::Regex;
use std::sync::LazyLock;

/// Constraint violations in the order their messages are reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Violation {
    ValueMissing,
    TypeMismatch,
    PatternMismatch,
    TooShort,
    TooLong,
    RangeUnderflow,
    RangeOverflow,
    StepMismatch,
    BadInput,
}

impl Violation {
    pub const ALL: [Violation; 9] = [
        Violation::ValueMissing,
        Violation::TypeMismatch,
        Violation::PatternMismatch,
        Violation::TooShort,
        Violation::TooLong,
        Violation::RangeUnderflow,
        Violation::RangeOverflow,
        Violation::StepMismatch,
        Violation::BadInput,
    ];

    fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ValidityState(u16);

impl ValidityState {
    pub fn valid() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, v: Violation) {
        self.0 |= v.bit();
    }

    pub fn contains(self, v: Violation) -> bool {
        self.0 & v.bit() != 0
    }

    pub fn is_valid(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Violation> {
        Violation::ALL.into_iter().filter(move |v| self.contains(*v))
    }
}

impl FromIterator<Violation> for ValidityState {
    fn from_iter<I: IntoIterator<Item = Violation>>(iter: I) -> Self {
        let mut state = Self::valid();
        for v in iter {
            state.insert(v);
        }
        state
    }
}

/// Declared constraints of one control.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Constraints {
    /// Lower-cased input type, or the tag name for `textarea`/`select`.
    pub control_type: String,
    pub required: bool,
    pub pattern: Option<String>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub min: Option<String>,
    pub max: Option<String>,
    pub step: Option<String>,
    pub title: Option<String>,
}

// HTML's "valid e-mail address" production.
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .unwrap_or_else(|err| unreachable!("e-mail regex: {err}"))
});

static FLOAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?(?:[0-9]+(?:\.[0-9]+)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?$")
        .unwrap_or_else(|err| unreachable!("float regex: {err}"))
});

const STEP_TOLERANCE: f64 = 1e-9;

impl Constraints {
    pub fn from_element(doc: &Document, field: NodeId) -> Self {
        let attr = |name: &str| {
            doc.attr(field, name)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        let length = |name: &str| attr(name).and_then(|v| v.parse::<usize>().ok());

        Self {
            control_type: doc.control_type(field),
            required: doc.has_attr(field, "required"),
            // An empty pattern still constrains the value to be empty.
            pattern: doc.attr(field, "pattern").map(str::to_string),
            min_length: length("minlength"),
            max_length: length("maxlength"),
            min: attr("min"),
            max: attr("max"),
            step: attr("step"),
            title: attr("title"),
        }
    }

    fn is_numeric(&self) -> bool {
        matches!(self.control_type.as_str(), "number" | "range")
    }

    fn is_temporal(&self) -> bool {
        matches!(
            self.control_type.as_str(),
            "date" | "time" | "datetime-local" | "month" | "week"
        )
    }

    /// `checked` is only consulted for checkable controls; for a radio it must
    /// reflect the whole group.
    pub fn validate(&self, value: &str, checked: bool) -> ValidityState {
        let mut state = ValidityState::valid();
        let checkable = matches!(self.control_type.as_str(), "checkbox" | "radio");

        let empty = if checkable { !checked } else { value.is_empty() };
        if self.required && empty {
            state.insert(Violation::ValueMissing);
        }
        if checkable || value.is_empty() {
            return state;
        }

        match self.control_type.as_str() {
            "email" if !EMAIL.is_match(value) => state.insert(Violation::TypeMismatch),
            "url" if url::Url::parse(value).is_err() => state.insert(Violation::TypeMismatch),
            _ => {}
        }

        if let Some(pattern) = &self.pattern {
            match Regex::new(&format!("^(?:{})$", ascii_classes(pattern))) {
                Ok(re) if !re.is_match(value) => state.insert(Violation::PatternMismatch),
                Ok(_) => {}
                Err(err) => {
                    log::warn!(target: "forms.validity", "ignoring invalid pattern `{pattern}`: {err}");
                }
            }
        }

        let len = value.chars().count();
        if self.min_length.is_some_and(|min| len < min) {
            state.insert(Violation::TooShort);
        }
        if self.max_length.is_some_and(|max| len > max) {
            state.insert(Violation::TooLong);
        }

        if self.is_numeric() {
            self.check_number(value, &mut state);
        } else if self.is_temporal() {
            if self.min.as_deref().is_some_and(|min| value < min) {
                state.insert(Violation::RangeUnderflow);
            }
            if self.max.as_deref().is_some_and(|max| value > max) {
                state.insert(Violation::RangeOverflow);
            }
        }
        state
    }

    fn check_number(&self, value: &str, state: &mut ValidityState) {
        let Some(v) = parse_float(value) else {
            state.insert(Violation::BadInput);
            return;
        };
        let min = self.min.as_deref().and_then(parse_float);
        let max = self.max.as_deref().and_then(parse_float);
        if min.is_some_and(|min| v < min) {
            state.insert(Violation::RangeUnderflow);
        }
        if max.is_some_and(|max| v > max) {
            state.insert(Violation::RangeOverflow);
        }

        let step = match self.step.as_deref() {
            Some(s) if s.eq_ignore_ascii_case("any") => None,
            Some(s) => parse_float(s).filter(|s| *s > 0.0).or(Some(1.0)),
            None => Some(1.0),
        };
        if let Some(step) = step {
            let q = (v - min.unwrap_or(0.0)) / step;
            if (q - q.round()).abs() > STEP_TOLERANCE {
                state.insert(Violation::StepMismatch);
            }
        }
    }
}

fn parse_float(s: &str) -> Option<f64> {
    if !FLOAT.is_match(s) {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// `\d` and `\w` in a `pattern` attribute are ASCII-only; the `regex` crate
/// would otherwise match any Unicode digit or word character.
fn ascii_classes(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('d') => out.push_str("[0-9]"),
            Some('D') => out.push_str("[^0-9]"),
            Some('w') => out.push_str("[0-9A-Za-z_]"),
            Some('W') => out.push_str("[^0-9A-Za-z_]"),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Whether `field` takes part in constraint validation at all.
pub fn will_validate(doc: &Document, field: NodeId) -> bool {
    let Some(tag) = doc.tag(field) else {
        return false;
    };
    if !matches!(tag, "input" | "select" | "textarea") || doc.is_disabled(field) {
        return false;
    }
    if tag != "select" && doc.has_attr(field, "readonly") {
        return false;
    }
    !matches!(
        doc.control_type(field).as_str(),
        "hidden" | "submit" | "reset" | "button" | "image"
    )
}

/// Validity of `field` as it stands in the document. Controls barred from
/// validation are always valid.
pub fn check_field(doc: &Document, field: NodeId) -> (Constraints, ValidityState) {
    let constraints = Constraints::from_element(doc, field);
    if !will_validate(doc, field) {
        return (constraints, ValidityState::valid());
    }
    let checked = match doc.input_type(field) {
        InputControlType::Radio => doc.radio_group(field).into_iter().any(|r| doc.checked(r)),
        _ => doc.checked(field),
    };
    let state = constraints.validate(doc.value(field).unwrap_or(""), checked);
    (constraints, state)
}

/// `required` as a property: only the value-carrying controls have it.
pub fn is_required(doc: &Document, field: NodeId) -> bool {
    matches!(doc.tag(field), Some("input" | "select" | "textarea")) && doc.has_attr(field, "required")
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom::Node;

    fn constraints(ty: &str) -> Constraints {
        Constraints {
            control_type: ty.to_string(),
            ..Constraints::default()
        }
    }

    fn violations(c: &Constraints, value: &str) -> Vec<Violation> {
        c.validate(value, false).iter().collect()
    }

    #[test]
    fn required_text_and_checkbox() {
        let mut text = constraints("text");
        text.required = true;
        assert_eq!(violations(&text, ""), vec![Violation::ValueMissing]);
        assert!(text.validate("x", false).is_valid());

        let mut policy = constraints("checkbox");
        policy.required = true;
        assert!(policy.validate("on", false).contains(Violation::ValueMissing));
        assert!(policy.validate("on", true).is_valid());
    }

    #[test]
    fn email_and_url_formats() {
        let email = constraints("email");
        assert!(email.validate("olena@example.com", false).is_valid());
        assert_eq!(violations(&email, "olena@"), vec![Violation::TypeMismatch]);
        assert_eq!(violations(&email, "a b@example.com"), vec![Violation::TypeMismatch]);

        let url = constraints("url");
        assert!(url.validate("https://example.com/x", false).is_valid());
        assert_eq!(violations(&url, "example.com"), vec![Violation::TypeMismatch]);
    }

    #[test]
    fn pattern_is_anchored_and_invalid_pattern_ignored() {
        let mut c = constraints("tel");
        c.pattern = Some(r"\d{3}".to_string());
        assert!(c.validate("123", false).is_valid());
        assert_eq!(violations(&c, "1234"), vec![Violation::PatternMismatch]);

        c.pattern = Some("(".to_string());
        assert!(c.validate("anything", false).is_valid());
    }

    #[test]
    fn pattern_digit_and_word_classes_are_ascii() {
        let mut c = constraints("tel");
        c.pattern = Some(r"\d{3}".to_string());
        assert_eq!(violations(&c, "١٢٣"), vec![Violation::PatternMismatch]);

        c.pattern = Some(r"[-\d]+\w".to_string());
        assert!(c.validate("12-3_", false).is_valid());
        assert_eq!(violations(&c, "12-3ї"), vec![Violation::PatternMismatch]);

        c.pattern = Some(r"\D\.\W".to_string());
        assert!(c.validate("a.!", false).is_valid());
        assert_eq!(violations(&c, "1.!"), vec![Violation::PatternMismatch]);
    }

    #[test]
    fn lengths_count_chars() {
        let mut c = constraints("text");
        c.min_length = Some(3);
        c.max_length = Some(4);
        assert_eq!(violations(&c, "ій"), vec![Violation::TooShort]);
        assert!(c.validate("їжак", false).is_valid());
        assert_eq!(violations(&c, "abcde"), vec![Violation::TooLong]);
        // Empty values are never too short.
        assert!(c.validate("", false).is_valid());
    }

    #[test]
    fn number_range_step_and_bad_input() {
        let mut c = constraints("number");
        c.min = Some("1".to_string());
        c.max = Some("10".to_string());
        assert_eq!(violations(&c, "0"), vec![Violation::RangeUnderflow]);
        assert_eq!(violations(&c, "11"), vec![Violation::RangeOverflow]);
        assert_eq!(violations(&c, "2.5"), vec![Violation::StepMismatch]);
        assert_eq!(violations(&c, "abc"), vec![Violation::BadInput]);
        assert_eq!(violations(&c, "inf"), vec![Violation::BadInput]);

        c.step = Some("0.1".to_string());
        assert!(c.validate("2.3", false).is_valid());
        c.step = Some("any".to_string());
        assert!(c.validate("2.345", false).is_valid());
    }

    #[test]
    fn step_base_is_min() {
        let mut c = constraints("number");
        c.min = Some("1".to_string());
        c.step = Some("2".to_string());
        assert!(c.validate("3", false).is_valid());
        assert_eq!(violations(&c, "4"), vec![Violation::StepMismatch]);
    }

    #[test]
    fn temporal_ranges_compare_iso_strings() {
        let mut c = constraints("datetime-local");
        c.min = Some("2024-01-01T00:00".to_string());
        assert_eq!(violations(&c, "2023-12-31T23:59"), vec![Violation::RangeUnderflow]);
        assert!(c.validate("2024-05-01T19:00", false).is_valid());
    }

    #[test]
    fn violations_iterate_in_report_order() {
        let state: ValidityState = [Violation::BadInput, Violation::ValueMissing, Violation::TooLong]
            .into_iter()
            .collect();
        assert_eq!(
            state.iter().collect::<Vec<_>>(),
            vec![Violation::ValueMissing, Violation::TooLong, Violation::BadInput]
        );
    }

    #[test]
    fn will_validate_skips_barred_controls() {
        let doc = Document::load(Node::document(vec![Node::element("body").child(
            Node::element("form").children([
                Node::element("input").id("text"),
                Node::element("input").id("hidden").attr("type", "hidden"),
                Node::element("input").id("ro").flag("readonly"),
                Node::element("input").id("off").flag("disabled"),
                Node::element("button").id("btn"),
                Node::element("select").id("sel").flag("readonly"),
            ]),
        )]));
        let by = |id: &str| doc.get_element_by_id(id).unwrap();
        assert!(will_validate(&doc, by("text")));
        assert!(!will_validate(&doc, by("hidden")));
        assert!(!will_validate(&doc, by("ro")));
        assert!(!will_validate(&doc, by("off")));
        assert!(!will_validate(&doc, by("btn")));
        assert!(will_validate(&doc, by("sel")));
    }

    #[test]
    fn required_radio_considers_whole_group() {
        let mut doc = Document::load(Node::document(vec![Node::element("body").child(
            Node::element("form").children([
                Node::element("input").id("a").attr("type", "radio").attr("name", "t").flag("required"),
                Node::element("input").id("b").attr("type", "radio").attr("name", "t"),
            ]),
        )]));
        let a = doc.get_element_by_id("a").unwrap();
        let b = doc.get_element_by_id("b").unwrap();
        assert!(check_field(&doc, a).1.contains(Violation::ValueMissing));
        doc.set_checked(b, true);
        assert!(check_field(&doc, a).1.is_valid());
    }
}
