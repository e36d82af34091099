//! Key path parser.
//!
//! Grammar, after whitespace removal:
//!
//! ```text
//! pattern  := "*" | path
//! path     := "#" prop
//!           | segment ("." segment)* ("[]" | ("." | "")? "#" prop)?
//! segment  := name index* | index+        (bare indices only first)
//! index    := "[" digit+ "]"
//! ```

use crate::normalize::{strip_whitespace, COMPUTED_INDICATOR};
use crate::types::{ComputedProperty, KeyPath, Pattern, Segment};
use crate::KeyPathError;

const MATCH_ALL: &str = "*";

/// Key path parser.
pub struct KeyPathParser<'a> {
    input: &'a str,
    pos: usize,
    segments: Vec<Segment>,
}

impl<'a> KeyPathParser<'a> {
    /// Parse a single key into a [`KeyPath`].
    ///
    /// `*` is rejected here; use [`KeyPathParser::parse_pattern`] for
    /// listener patterns.
    pub fn parse(key: &str) -> Result<KeyPath, KeyPathError> {
        let stripped = strip_whitespace(key);
        if stripped == MATCH_ALL {
            return Err(KeyPathError::syntax(key, "`*` only matches as a listener pattern"));
        }
        KeyPathParser::new(&stripped).parse_path()
    }

    /// Parse a listener pattern: `*` or a key path.
    pub fn parse_pattern(key: &str) -> Result<Pattern, KeyPathError> {
        let stripped = strip_whitespace(key);
        if stripped == MATCH_ALL {
            return Ok(Pattern::Any);
        }
        KeyPathParser::new(&stripped).parse_path().map(Pattern::Path)
    }

    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            segments: Vec::new(),
        }
    }

    fn parse_path(mut self) -> Result<KeyPath, KeyPathError> {
        if self.input.is_empty() {
            return Err(self.error("empty key"));
        }

        loop {
            if self.peek() == Some(COMPUTED_INDICATOR) {
                self.parse_computed()?;
                break;
            }

            let name = self.parse_name();
            if name.is_empty() {
                // Only the very first segment may start with an index.
                if !(self.segments.is_empty() && self.peek() == Some('[')) {
                    return Err(self.error("empty segment"));
                }
            } else {
                self.segments.push(Segment::Property(name.to_string()));
            }

            if self.parse_indices()? {
                break;
            }

            match self.peek() {
                None => break,
                Some('.') => {
                    self.advance();
                    if self.is_at_end() {
                        return Err(self.error("empty segment"));
                    }
                }
                Some(COMPUTED_INDICATOR) => {}
                Some(']') => return Err(self.error("unbalanced `]`")),
                Some(_) => return Err(self.error("unexpected character")),
            }
        }

        Ok(KeyPath::new(self.segments))
    }

    /// Parse `[n]*`, optionally closed by the `[]` element marker.
    ///
    /// Returns `true` if the element marker was consumed, which ends the key.
    fn parse_indices(&mut self) -> Result<bool, KeyPathError> {
        while self.peek() == Some('[') {
            self.advance();
            if self.peek() == Some(']') {
                self.advance();
                self.segments.push(Segment::Wildcard);
                if !self.is_at_end() {
                    return Err(self.error("`[]` must end the key"));
                }
                return Ok(true);
            }
            let input = self.input;
            let start = self.pos;
            while matches!(self.peek(), Some('0'..='9')) {
                self.advance();
            }
            let digits = &input[start..self.pos];
            if digits.is_empty() {
                return Err(self.error("index must be a non-negative integer"));
            }
            let index: usize = digits
                .parse()
                .map_err(|_| self.error("index out of range"))?;
            if self.peek() != Some(']') {
                return Err(self.error("unbalanced `[`"));
            }
            self.advance();
            self.segments.push(Segment::Index(index));
        }
        Ok(false)
    }

    fn parse_computed(&mut self) -> Result<(), KeyPathError> {
        self.advance();
        let name = self.parse_name();
        if name.is_empty() {
            return Err(self.error("missing computed property name"));
        }
        let prop = ComputedProperty::from_name(name)
            .ok_or_else(|| self.error("unsupported computed property"))?;
        if !self.is_at_end() {
            return Err(self.error("computed property must end the key"));
        }
        self.segments.push(Segment::Computed(prop));
        Ok(())
    }

    fn parse_name(&mut self) -> &'a str {
        let input = self.input;
        let start = self.pos;
        while let Some(c) = self.peek() {
            if matches!(c, '.' | '[' | ']' | ',' | COMPUTED_INDICATOR) {
                break;
            }
            self.advance();
        }
        &input[start..self.pos]
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn error(&self, reason: &'static str) -> KeyPathError {
        KeyPathError::syntax(self.input, reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prop(name: &str) -> Segment {
        Segment::Property(name.to_string())
    }

    #[test]
    fn test_parse_plain_and_nested() {
        let path = KeyPathParser::parse("name").unwrap();
        assert_eq!(path.segments(), &[prop("name")]);

        let path = KeyPathParser::parse("a.b.c").unwrap();
        assert_eq!(path.segments(), &[prop("a"), prop("b"), prop("c")]);
    }

    #[test]
    fn test_parse_indices() {
        let path = KeyPathParser::parse("[2]").unwrap();
        assert_eq!(path.segments(), &[Segment::Index(2)]);

        let path = KeyPathParser::parse("a[0].b[2]").unwrap();
        assert_eq!(
            path.segments(),
            &[prop("a"), Segment::Index(0), prop("b"), Segment::Index(2)]
        );

        let path = KeyPathParser::parse("arr[0][1]").unwrap();
        assert_eq!(
            path.segments(),
            &[prop("arr"), Segment::Index(0), Segment::Index(1)]
        );
    }

    #[test]
    fn test_parse_element_marker() {
        let path = KeyPathParser::parse("[]").unwrap();
        assert_eq!(path.segments(), &[Segment::Wildcard]);
        assert!(path.is_element_pattern());

        let path = KeyPathParser::parse("v1[]").unwrap();
        assert_eq!(path.segments(), &[prop("v1"), Segment::Wildcard]);
    }

    #[test]
    fn test_parse_computed() {
        let len = Segment::Computed(ComputedProperty::Length);

        let path = KeyPathParser::parse("arr#length").unwrap();
        assert_eq!(path.segments(), &[prop("arr"), len.clone()]);
        assert!(path.is_computed());

        let path = KeyPathParser::parse("arr.#length").unwrap();
        assert_eq!(path.segments(), &[prop("arr"), len.clone()]);

        let path = KeyPathParser::parse("a[0]#length").unwrap();
        assert_eq!(path.segments(), &[prop("a"), Segment::Index(0), len.clone()]);

        let path = KeyPathParser::parse("#length").unwrap();
        assert_eq!(path.segments(), &[len]);
    }

    #[test]
    fn test_parse_ignores_whitespace() {
        let path = KeyPathParser::parse(" a . b [ 1 ] ").unwrap();
        assert_eq!(path.segments(), &[prop("a"), prop("b"), Segment::Index(1)]);
    }

    #[test]
    fn test_parse_pattern_match_all() {
        assert_eq!(KeyPathParser::parse_pattern("*").unwrap(), Pattern::Any);
        assert_eq!(KeyPathParser::parse_pattern(" * ").unwrap(), Pattern::Any);
        assert!(KeyPathParser::parse("*").is_err());
    }

    #[test]
    fn test_parse_errors() {
        let cases = [
            "", "a..b", ".a", "a.", "a[", "a[1", "a]", "a[x]", "a[-1]", "a.[0]", "[]x",
            "a[].b", "arr#", "arr#size", "arr#length.x", "a,b",
        ];
        for key in cases {
            let err = KeyPathParser::parse(key).unwrap_err();
            assert!(
                matches!(err, KeyPathError::InvalidSyntax { .. }),
                "expected syntax error for {key:?}, got {err:?}"
            );
        }
    }

    #[test]
    fn test_display_is_canonical() {
        let cases = [
            ("a.b.c", "a.b.c"),
            ("a[0].b[2]", "a[0].b[2]"),
            ("[2]", "[2]"),
            ("v1[]", "v1[]"),
            ("arr#length", "arr.length"),
            ("arr.#length", "arr.length"),
            ("fum()", "fum()"),
        ];
        for (key, canonical) in cases {
            assert_eq!(KeyPathParser::parse(key).unwrap().to_string(), canonical);
        }
    }
}
