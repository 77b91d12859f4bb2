//! Minimal CSS selector support.
//!
//! Behaviors only ever locate elements by compound selectors (`a[href^="#"]`,
//! `.nav-link`, `section[id]`, `#contact-form`), optionally grouped with
//! commas. Combinators are not supported.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,
    #[error("unexpected character '{found}' at offset {offset} in '{source_text}'")]
    Unexpected {
        found: char,
        offset: usize,
        source_text: String,
    },
    #[error("unterminated attribute selector in '{0}'")]
    UnterminatedAttribute(String),
    #[error("combinators are not supported: '{0}'")]
    Combinator(String),
}

/// Anything a selector can be matched against.
pub trait SelectorSubject {
    fn local_name(&self) -> &str;
    fn attribute(&self, name: &str) -> Option<&str>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals,
    Prefix,
    Suffix,
    Substring,
    Word,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrMatcher {
    name: String,
    op: AttrOp,
    value: String,
}

impl AttrMatcher {
    fn matches(&self, actual: Option<&str>) -> bool {
        let Some(actual) = actual else {
            return false;
        };
        match self.op {
            AttrOp::Exists => true,
            AttrOp::Equals => actual == self.value,
            AttrOp::Prefix => !self.value.is_empty() && actual.starts_with(&self.value),
            AttrOp::Suffix => !self.value.is_empty() && actual.ends_with(&self.value),
            AttrOp::Substring => !self.value.is_empty() && actual.contains(&self.value),
            AttrOp::Word => actual.split_whitespace().any(|word| word == self.value),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
    attrs: Vec<AttrMatcher>,
}

impl Compound {
    fn matches<S: SelectorSubject + ?Sized>(&self, subject: &S) -> bool {
        if let Some(tag) = &self.tag
            && !subject.local_name().eq_ignore_ascii_case(tag)
        {
            return false;
        }

        if !self
            .ids
            .iter()
            .all(|id| subject.attribute("id") == Some(id.as_str()))
        {
            return false;
        }

        if !self.classes.is_empty() {
            let class_attr = subject.attribute("class").unwrap_or_default();
            if !self
                .classes
                .iter()
                .all(|class| class_attr.split_whitespace().any(|have| have == class))
            {
                return false;
            }
        }

        self.attrs
            .iter()
            .all(|attr| attr.matches(subject.attribute(&attr.name)))
    }
}

/// A parsed, comma-separated list of compound selectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    alternatives: Vec<Compound>,
}

impl Selector {
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let source = input.trim();
        if source.is_empty() {
            return Err(SelectorError::Empty);
        }

        let mut alternatives = Vec::new();
        for part in split_list(source) {
            let part = part.trim();
            if part.is_empty() {
                return Err(SelectorError::Empty);
            }
            alternatives.push(parse_compound(part)?);
        }

        Ok(Self {
            source: source.to_string(),
            alternatives,
        })
    }

    pub fn matches<S: SelectorSubject + ?Sized>(&self, subject: &S) -> bool {
        self.alternatives
            .iter()
            .any(|compound| compound.matches(subject))
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Split a selector list at commas outside brackets and quotes.
fn split_list(source: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (index, c) in source.char_indices() {
        match (quote, c) {
            (Some(open), c) if c == open => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                parts.push(&source[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    parts.push(&source[start..]);
    parts
}

/// Byte offset of the `]` closing an attribute block, skipping quoted text.
fn closing_bracket(block: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (index, c) in block.char_indices() {
        match (quote, c) {
            (Some(open), c) if c == open => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, ']') => return Some(index),
            _ => {}
        }
    }
    None
}

fn parse_compound(part: &str) -> Result<Compound, SelectorError> {
    let chars: Vec<(usize, char)> = part.char_indices().collect();
    let mut compound = Compound::default();
    let mut pos = 0;

    let read_ident = |pos: &mut usize| -> String {
        let mut ident = String::new();
        while let Some(&(_, c)) = chars.get(*pos) {
            if !is_ident_char(c) {
                break;
            }
            ident.push(c);
            *pos += 1;
        }
        ident
    };

    let unexpected = |offset: usize, found: char| SelectorError::Unexpected {
        found,
        offset,
        source_text: part.to_string(),
    };

    if let Some(&(_, c)) = chars.first() {
        if c == '*' {
            pos = 1;
        } else if is_ident_char(c) {
            compound.tag = Some(read_ident(&mut pos).to_ascii_lowercase());
        }
    }

    while let Some(&(offset, c)) = chars.get(pos) {
        match c {
            '#' | '.' => {
                pos += 1;
                let ident = read_ident(&mut pos);
                if ident.is_empty() {
                    let (bad_offset, bad) = chars.get(pos).copied().unwrap_or((offset, c));
                    return Err(unexpected(bad_offset, bad));
                }
                if c == '#' {
                    compound.ids.push(ident);
                } else {
                    compound.classes.push(ident);
                }
            }
            '[' => {
                let close = closing_bracket(&part[offset..])
                    .map(|rel| offset + rel)
                    .ok_or_else(|| SelectorError::UnterminatedAttribute(part.to_string()))?;
                compound.attrs.push(parse_attr(&part[offset + 1..close], part)?);
                pos = chars
                    .iter()
                    .position(|&(index, _)| index > close)
                    .unwrap_or(chars.len());
            }
            c if c.is_whitespace() || c == '>' || c == '+' || c == '~' => {
                return Err(SelectorError::Combinator(part.to_string()));
            }
            other => return Err(unexpected(offset, other)),
        }
    }

    Ok(compound)
}

fn parse_attr(body: &str, source: &str) -> Result<AttrMatcher, SelectorError> {
    let body = body.trim();
    let op_start = body.find(['=', '^', '$', '*', '~']);

    let Some(op_start) = op_start else {
        if body.is_empty() || !body.chars().all(is_ident_char) {
            return Err(SelectorError::UnterminatedAttribute(source.to_string()));
        }
        return Ok(AttrMatcher {
            name: body.to_string(),
            op: AttrOp::Exists,
            value: String::new(),
        });
    };

    let name = body[..op_start].trim();
    let rest = &body[op_start..];
    let (op, value) = if let Some(value) = rest.strip_prefix("^=") {
        (AttrOp::Prefix, value)
    } else if let Some(value) = rest.strip_prefix("$=") {
        (AttrOp::Suffix, value)
    } else if let Some(value) = rest.strip_prefix("*=") {
        (AttrOp::Substring, value)
    } else if let Some(value) = rest.strip_prefix("~=") {
        (AttrOp::Word, value)
    } else if let Some(value) = rest.strip_prefix('=') {
        (AttrOp::Equals, value)
    } else {
        return Err(SelectorError::UnterminatedAttribute(source.to_string()));
    };

    if name.is_empty() || !name.chars().all(is_ident_char) {
        return Err(SelectorError::UnterminatedAttribute(source.to_string()));
    }

    Ok(AttrMatcher {
        name: name.to_string(),
        op,
        value: unquote(value.trim()).to_string(),
    })
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct Fake {
        tag: &'static str,
        attrs: HashMap<&'static str, &'static str>,
    }

    impl SelectorSubject for Fake {
        fn local_name(&self) -> &str {
            self.tag
        }

        fn attribute(&self, name: &str) -> Option<&str> {
            self.attrs.get(name).copied()
        }
    }

    fn anchor(href: &'static str) -> Fake {
        Fake {
            tag: "a",
            attrs: HashMap::from([("href", href), ("class", "nav-link primary")]),
        }
    }

    #[test]
    fn prefix_attribute_matches_in_page_anchors() {
        let selector = Selector::parse(r##"a[href^="#"]"##).unwrap();
        assert!(selector.matches(&anchor("#about")));
        assert!(!selector.matches(&anchor("/about")));
    }

    #[test]
    fn classes_and_lists() {
        let selector = Selector::parse(".card, a.nav-link.primary").unwrap();
        assert!(selector.matches(&anchor("#x")));

        let selector = Selector::parse("a.secondary").unwrap();
        assert!(!selector.matches(&anchor("#x")));
    }

    #[test]
    fn commas_inside_attribute_values_do_not_split_the_list() {
        let selector = Selector::parse(r#"a[href*=","], .card"#).unwrap();
        assert_eq!(selector.alternatives.len(), 2);
        assert!(selector.matches(&anchor("/search?tags=a,b")));
        assert!(!selector.matches(&anchor("/about")));
        assert!(Selector::parse(r#"a[title="x]y"]"#).is_ok());
        assert_eq!(Selector::parse("a,"), Err(SelectorError::Empty));
    }

    #[test]
    fn rejects_combinators_and_garbage() {
        assert_eq!(
            Selector::parse("#contact-form input"),
            Err(SelectorError::Combinator("#contact-form input".into()))
        );
        assert!(matches!(Selector::parse("a[href"), Err(SelectorError::UnterminatedAttribute(_))));
        assert_eq!(Selector::parse("  "), Err(SelectorError::Empty));
    }
}
