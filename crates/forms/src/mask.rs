//! Input masking hook for phone fields.

/// Rewrites a field's raw value while the user types.
pub trait InputMask {
    fn apply(&self, raw: &str) -> String;
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum MaskToken {
    Digit,
    Literal(char),
    /// `{..}` block: always emitted, consumed from input when the input repeats it.
    Fixed(String),
}

/// Digit mask in the `+{38} (000) 000-00-00` notation: `0` is a digit slot,
/// `{..}` a fixed prefix, anything else a literal shown once input reaches it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatternMask {
    tokens: Vec<MaskToken>,
}

impl PatternMask {
    pub fn new(pattern: &str) -> Self {
        let mut tokens = Vec::new();
        let mut chars = pattern.chars();
        while let Some(ch) = chars.next() {
            match ch {
                '0' => tokens.push(MaskToken::Digit),
                '{' => tokens.push(MaskToken::Fixed(
                    chars.by_ref().take_while(|&c| c != '}').collect(),
                )),
                c => tokens.push(MaskToken::Literal(c)),
            }
        }
        Self { tokens }
    }

    pub fn ukrainian_phone() -> Self {
        Self::new("+{38} (000) 000-00-00")
    }
}

impl InputMask for PatternMask {
    fn apply(&self, raw: &str) -> String {
        let digits: Vec<char> = raw.chars().filter(char::is_ascii_digit).collect();
        if digits.is_empty() {
            return String::new();
        }

        let mut out = String::new();
        let mut i = 0;
        for token in &self.tokens {
            match token {
                MaskToken::Fixed(fixed) => {
                    let wanted: Vec<char> = fixed.chars().filter(char::is_ascii_digit).collect();
                    if digits[i..].starts_with(&wanted) {
                        i += wanted.len();
                    }
                    out.push_str(fixed);
                }
                MaskToken::Literal(c) => {
                    if i >= digits.len() {
                        break;
                    }
                    out.push(*c);
                }
                MaskToken::Digit => match digits.get(i) {
                    Some(d) => {
                        out.push(*d);
                        i += 1;
                    }
                    None => break,
                },
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_local_and_international_input_alike() {
        let mask = PatternMask::ukrainian_phone();
        assert_eq!(mask.apply("0671234567"), "+38 (067) 123-45-67");
        assert_eq!(mask.apply("380671234567"), "+38 (067) 123-45-67");
        assert_eq!(mask.apply("+38 (067) 123-45-67"), "+38 (067) 123-45-67");
    }

    #[test]
    fn partial_input_stops_before_next_literal() {
        let mask = PatternMask::ukrainian_phone();
        assert_eq!(mask.apply("067"), "+38 (067");
        assert_eq!(mask.apply("0671"), "+38 (067) 1");
        assert_eq!(mask.apply("abc"), "");
    }

    #[test]
    fn extra_digits_are_dropped() {
        let mask = PatternMask::new("000");
        assert_eq!(mask.apply("12345"), "123");
    }
}
