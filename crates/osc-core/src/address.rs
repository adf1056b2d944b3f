//! OSC address-pattern compilation
//!
//! Address patterns are compiled once into an anchored regular expression:
//!
//! | pattern   | matches                                  | regex      |
//! |-----------|------------------------------------------|------------|
//! | `?`       | any single character                     | `.`        |
//! | `*`       | zero or more characters                  | `.*`       |
//! | `[abc]`   | one character from the class             | `[abc]`    |
//! | `![abc]`  | one character not in the class           | `[^abc]`   |
//! | `{a,b}`   | any of the comma-separated alternatives  | `(a|b)`    |
//!
//! Every other character, `/` included, is matched literally.

use crate::{Error, Result};
use std::iter::Peekable;
use std::str::Chars;

/// Characters that turn a plain address into a pattern
const WILDCARDS: &[char] = &['?', '*', '[', ']', '{', '}'];

/// A compiled address pattern
#[derive(Debug, Clone)]
pub struct Pattern {
    raw: String,
    regex: Option<regex_lite::Regex>,
}

impl Pattern {
    /// Compile a pattern string
    pub fn compile(s: &str) -> Result<Self> {
        let regex = if is_pattern(s) {
            let regex_str = pattern_to_regex(s);
            Some(
                regex_lite::Regex::new(&regex_str)
                    .map_err(|e| Error::InvalidPattern(format!("{}: {}", s, e)))?,
            )
        } else {
            None
        };

        Ok(Self {
            raw: s.to_string(),
            regex,
        })
    }

    /// Check whether a concrete address matches this pattern
    pub fn matches(&self, address: &str) -> bool {
        match &self.regex {
            Some(regex) => regex.is_match(address),
            None => address == self.raw,
        }
    }

    /// The pattern as registered
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// True if `s` contains any wildcard syntax
pub fn is_pattern(s: &str) -> bool {
    s.contains(WILDCARDS)
}

/// Translate OSC wildcard syntax into an anchored regular expression
///
/// Brackets and braces are passed through as-is, so an unbalanced pattern
/// yields an invalid regex and fails at compile time.
pub fn pattern_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2 + 2);
    let mut chars = pattern.chars().peekable();
    let mut group_depth = 0usize;

    out.push('^');
    while let Some(c) = chars.next() {
        match c {
            '?' => out.push('.'),
            '*' => out.push_str(".*"),
            '!' if chars.peek() == Some(&'[') => {
                chars.next();
                push_class(&mut out, &mut chars, true);
            }
            '[' => push_class(&mut out, &mut chars, false),
            '{' => {
                group_depth += 1;
                out.push('(');
            }
            '}' => {
                group_depth = group_depth.saturating_sub(1);
                out.push(')');
            }
            ',' if group_depth > 0 => out.push('|'),
            other => push_literal(&mut out, other),
        }
    }
    out.push('$');
    out
}

/// Emit a character class; the opening `[` has already been consumed.
/// `[!abc]` is accepted as an alternative spelling of `![abc]`.
fn push_class(out: &mut String, chars: &mut Peekable<Chars<'_>>, mut negated: bool) {
    if !negated && chars.peek() == Some(&'!') {
        chars.next();
        negated = true;
    }

    out.push('[');
    if negated {
        out.push('^');
    }

    // A '-' is a range only between two literals; a range end cannot open another
    let mut can_open_range = false;
    while let Some(c) = chars.next() {
        match c {
            ']' => {
                out.push(']');
                return;
            }
            '-' if can_open_range && !matches!(chars.peek(), None | Some(']') | Some('-')) => {
                out.push('-');
                if let Some(end) = chars.next() {
                    push_class_literal(out, end);
                }
                can_open_range = false;
            }
            other => {
                push_class_literal(out, other);
                can_open_range = true;
            }
        }
    }
}

/// Class members additionally escape the set-operation characters
fn push_class_literal(out: &mut String, c: char) {
    if matches!(c, '&' | '~' | '-') {
        out.push('\\');
        out.push(c);
    } else {
        push_literal(out, c);
    }
}

fn push_literal(out: &mut String, c: char) {
    if regex_syntax_char(c) {
        out.push('\\');
    }
    out.push(c);
}

fn regex_syntax_char(c: char) -> bool {
    matches!(
        c,
        '\\' | '.' | '+' | '*' | '?' | '(' | ')' | '|' | '[' | ']' | '{' | '}' | '^' | '$'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translation() {
        assert_eq!(pattern_to_regex("/foo/?"), "^/foo/.$");
        assert_eq!(pattern_to_regex("/foo/*"), "^/foo/.*$");
        assert_eq!(pattern_to_regex("/a/{x,y}"), "^/a/(x|y)$");
        assert_eq!(pattern_to_regex("/a/![0-3]"), "^/a/[^0-3]$");
        assert_eq!(pattern_to_regex("/a/[!0-3]"), "^/a/[^0-3]$");
        assert_eq!(pattern_to_regex("/a.b,c"), "^/a\\.b,c$");
    }

    #[test]
    fn test_single_char_wildcard() {
        let pattern = Pattern::compile("/foo/?").unwrap();
        assert!(pattern.matches("/foo/1"));
        assert!(!pattern.matches("/foo/12"));
        assert!(!pattern.matches("/foo/"));
    }

    #[test]
    fn test_star() {
        let pattern = Pattern::compile("/foo/*").unwrap();
        assert!(pattern.matches("/foo/bar"));
        assert!(pattern.matches("/foo/"));
        assert!(!pattern.matches("/bar/foo"));
    }

    #[test]
    fn test_alternation() {
        let pattern = Pattern::compile("/a/{x,y,z}").unwrap();
        assert!(pattern.matches("/a/x"));
        assert!(pattern.matches("/a/y"));
        assert!(!pattern.matches("/a/q"));
    }

    #[test]
    fn test_classes() {
        let pattern = Pattern::compile("/ch/[1-3]").unwrap();
        assert!(pattern.matches("/ch/2"));
        assert!(!pattern.matches("/ch/4"));

        let pattern = Pattern::compile("/ch/![1-3]").unwrap();
        assert!(pattern.matches("/ch/4"));
        assert!(!pattern.matches("/ch/2"));
    }

    #[test]
    fn test_class_set_operators_are_literal() {
        let pattern = Pattern::compile("/a/[a-c&&b]").unwrap();
        assert!(pattern.matches("/a/b"));
        assert!(pattern.matches("/a/&"));
        assert!(!pattern.matches("/a/d"));

        let pattern = Pattern::compile("/a/[a~~b]").unwrap();
        assert!(pattern.matches("/a/~"));
        assert!(pattern.matches("/a/a"));
        assert!(!pattern.matches("/a/c"));

        let pattern = Pattern::compile("/a/[a--]").unwrap();
        assert!(pattern.matches("/a/-"));
        assert!(pattern.matches("/a/a"));
    }

    #[test]
    fn test_class_dash_placement() {
        assert_eq!(pattern_to_regex("/a/[a-c]"), "^/a/[a-c]$");
        assert_eq!(pattern_to_regex("/a/[-a]"), "^/a/[\\-a]$");
        assert_eq!(pattern_to_regex("/a/[a-]"), "^/a/[a\\-]$");
        assert_eq!(pattern_to_regex("/a/[a-c-e]"), "^/a/[a-c\\-e]$");

        let pattern = Pattern::compile("/a/[-x]").unwrap();
        assert!(pattern.matches("/a/-"));
        assert!(pattern.matches("/a/x"));
        assert!(!pattern.matches("/a/b"));
    }

    #[test]
    fn test_exact() {
        let pattern = Pattern::compile("/mixer/channel/0/gain").unwrap();
        assert!(pattern.matches("/mixer/channel/0/gain"));
        assert!(!pattern.matches("/mixer/channel/0/gain/x"));
    }

    #[test]
    fn test_literal_metacharacters() {
        let pattern = Pattern::compile("/a.b/*").unwrap();
        assert!(pattern.matches("/a.b/c"));
        assert!(!pattern.matches("/axb/c"));
    }

    #[test]
    fn test_invalid_patterns() {
        for bad in ["/a/{x,y", "/a/x}", "/a/[xy"] {
            assert!(
                matches!(Pattern::compile(bad), Err(Error::InvalidPattern(_))),
                "{} should not compile",
                bad
            );
        }
    }
}
