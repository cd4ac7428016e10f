//! A deliberately small CSS selector subset.
//!
//! Supported: comma-separated groups of compound selectors made of an optional
//! tag (or `*`), `#id`, `.class`, `[attr]` and `[attr=value]` (value optionally
//! quoted). Combinators are rejected.

use crate::ElementData;
use std::fmt;
use std::iter::Peekable;
use std::str::{CharIndices, FromStr};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,
    #[error("combinators are not supported in `{0}`")]
    UnsupportedCombinator(String),
    #[error("unterminated attribute selector in `{0}`")]
    UnterminatedAttribute(String),
    #[error("unexpected character `{ch}` in `{selector}`")]
    UnexpectedChar { selector: String, ch: char },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selector {
    source: String,
    groups: Vec<Compound>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrMatch>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct AttrMatch {
    name: String,
    value: Option<String>,
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        let mut groups = Vec::new();
        for part in source.split(',') {
            groups.push(parse_compound(part.trim())?);
        }
        Ok(Self {
            source: source.trim().to_string(),
            groups,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, el: &ElementData) -> bool {
        self.groups.iter().any(|g| g.matches(el))
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Selector::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl Compound {
    fn matches(&self, el: &ElementData) -> bool {
        if let Some(tag) = &self.tag
            && !el.name().eq_ignore_ascii_case(tag)
        {
            return false;
        }
        if let Some(id) = &self.id
            && el.attr("id") != Some(id.as_str())
        {
            return false;
        }
        if !self.classes.iter().all(|c| el.has_class(c)) {
            return false;
        }
        self.attrs.iter().all(|a| match &a.value {
            None => el.has_attr(&a.name),
            Some(v) => el.attr(&a.name) == Some(v.as_str()),
        })
    }
}

fn is_ident_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '-' || ch == '_'
}

fn take_ident(chars: &mut Peekable<CharIndices<'_>>) -> String {
    let mut s = String::new();
    while let Some(&(_, ch)) = chars.peek() {
        if !is_ident_char(ch) {
            break;
        }
        s.push(ch);
        chars.next();
    }
    s
}

fn parse_compound(part: &str) -> Result<Compound, SelectorError> {
    if part.is_empty() {
        return Err(SelectorError::Empty);
    }
    if part.chars().any(char::is_whitespace) && !part.contains('[') {
        return Err(SelectorError::UnsupportedCombinator(part.to_string()));
    }

    let mut out = Compound::default();
    let mut chars = part.char_indices().peekable();

    if let Some(&(_, ch)) = chars.peek() {
        if ch == '*' {
            chars.next();
        } else if is_ident_char(ch) {
            out.tag = Some(take_ident(&mut chars).to_ascii_lowercase());
        }
    }

    while let Some((_, ch)) = chars.next() {
        match ch {
            '#' => out.id = Some(take_ident(&mut chars)),
            '.' => out.classes.push(take_ident(&mut chars)),
            '[' => {
                let mut body = String::new();
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    if c == ']' {
                        closed = true;
                        break;
                    }
                    body.push(c);
                }
                if !closed {
                    return Err(SelectorError::UnterminatedAttribute(part.to_string()));
                }
                out.attrs.push(parse_attr(&body));
            }
            c if c.is_whitespace() => {
                return Err(SelectorError::UnsupportedCombinator(part.to_string()));
            }
            c => {
                return Err(SelectorError::UnexpectedChar {
                    selector: part.to_string(),
                    ch: c,
                });
            }
        }
    }

    Ok(out)
}

fn parse_attr(body: &str) -> AttrMatch {
    match body.split_once('=') {
        None => AttrMatch {
            name: body.trim().to_ascii_lowercase(),
            value: None,
        },
        Some((name, value)) => {
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(value);
            AttrMatch {
                name: name.trim().to_ascii_lowercase(),
                value: Some(value.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_attribute_groups() {
        let sel = Selector::parse(".popup, .modal, .dialog").unwrap();
        assert_eq!(sel.groups.len(), 3);
        assert_eq!(sel.groups[1].classes, vec!["modal".to_string()]);
    }

    #[test]
    fn parses_quoted_attribute_value() {
        let sel = Selector::parse("button[type='submit']").unwrap();
        let g = &sel.groups[0];
        assert_eq!(g.tag.as_deref(), Some("button"));
        assert_eq!(g.attrs[0].name, "type");
        assert_eq!(g.attrs[0].value.as_deref(), Some("submit"));
    }

    #[test]
    fn rejects_descendant_combinator() {
        assert!(matches!(
            Selector::parse("form input"),
            Err(SelectorError::UnsupportedCombinator(_))
        ));
    }

    #[test]
    fn rejects_empty_group() {
        assert_eq!(Selector::parse("a,,b"), Err(SelectorError::Empty));
    }
}
