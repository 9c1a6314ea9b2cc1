//! Candidate AST and parser
//!
//! A raw token is split into variants and a base, and the base into root,
//! value, modifier and important flag. The parser is registry-free: which
//! utility roots exist is the framework's business (an external collaborator),
//! so a purely named base stays a single static root. That choice cannot leak
//! into the canonical string, because named parts print back verbatim.
//!
//! Arbitrary text (the inside of `[...]` and `(...)`) is decoded on ingest
//! (`_` → space, `\_` → `_`, see [`crate::escape`]) and re-encoded by the
//! printer, which is what makes canonicalization idempotent.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::escape::decode_arbitrary_value;
use crate::value_parser::ValueParseError;

pub type Name = String;

/// Variant roots that nest another variant (`group-hover`, `not-first`, ...).
const COMPOUND_ROOTS: &[&str] = &["group", "peer", "not", "has", "in"];

/// Data-type hints accepted in front of an arbitrary value
/// (`text-[length:1rem]`). Unknown prefixes are part of the value itself.
const DATA_TYPES: &[&str] = &[
    "angle",
    "bg-size",
    "color",
    "family-name",
    "generic-name",
    "image",
    "integer",
    "length",
    "line-width",
    "number",
    "percentage",
    "position",
    "ratio",
    "shadow",
    "size",
    "url",
    "vector",
];

/// One utility-class token in structured form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub base: CandidateBase,
    /// Variants in source order, leftmost first.
    pub variants: Vec<Variant>,
    pub important: bool,
}

/// The part of a candidate after all variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CandidateBase {
    /// A bare root: `flex`, `gap-y-4`.
    Static { root: Name },
    /// A root with a value and/or modifier: `bg-[#0f0]`, `bg-red-500/50`.
    Functional {
        root: Name,
        value: Option<CandidateValue>,
        modifier: Option<CandidateModifier>,
    },
    /// A whole-declaration candidate: `[color:red]`.
    Arbitrary {
        property: Name,
        value: String,
        modifier: Option<CandidateModifier>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CandidateValue {
    Named {
        value: String,
    },
    Arbitrary {
        /// Decoded value text. `bg-(--x)` is stored as `var(--x)`; the
        /// printer restores the parenthesized shorthand.
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data_type: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CandidateModifier {
    Named { value: String },
    Arbitrary { value: String },
}

/// A selector-affecting prefix segment of a candidate.
///
/// Only functional and compound variants may carry a modifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Variant {
    Static {
        root: Name,
    },
    Functional {
        root: Name,
        value: Option<CandidateValue>,
        modifier: Option<CandidateModifier>,
    },
    /// A raw selector: `[&:hover]`.
    Arbitrary { selector: String },
    /// A variant wrapping another variant: `group-hover`, `not-[&:hover]`.
    Compound {
        root: Name,
        variant: Box<Variant>,
        modifier: Option<CandidateModifier>,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CandidateParseError {
    #[error("empty candidate")]
    Empty,
    #[error("candidate contains whitespace")]
    Whitespace,
    #[error("candidate does not carry the theme prefix `{prefix}`")]
    MissingPrefix { prefix: String },
    #[error("unbalanced brackets in `{text}`")]
    Unbalanced { text: String },
    #[error("arbitrary candidate `{text}` has no property")]
    MalformedProperty { text: String },
    #[error("invalid identifier `{text}`")]
    InvalidName { text: String },
    #[error("invalid modifier `{text}`")]
    InvalidModifier { text: String },
    #[error(transparent)]
    Value(#[from] ValueParseError),
}

/// Parse one raw candidate token.
///
/// When a theme `prefix` is configured, the token must start with it
/// (`tw:flex`); a token without the prefix is foreign and fails to parse.
pub fn parse_candidate(raw: &str, prefix: Option<&str>) -> Result<Candidate, CandidateParseError> {
    if raw.is_empty() {
        return Err(CandidateParseError::Empty);
    }
    if raw.chars().any(char::is_whitespace) {
        return Err(CandidateParseError::Whitespace);
    }

    let mut parts = split_top_level(raw, ':')?;
    if let Some(prefix) = prefix {
        if parts.len() < 2 || parts[0] != prefix {
            return Err(CandidateParseError::MissingPrefix { prefix: prefix.to_string() });
        }
        parts.remove(0);
    }

    let base_text = parts.pop().filter(|p| !p.is_empty()).ok_or(CandidateParseError::Empty)?;

    let mut variants = Vec::with_capacity(parts.len());
    for part in parts {
        variants.push(parse_variant(part)?);
    }

    let (base_text, important) = strip_important(base_text);
    if base_text.is_empty() {
        return Err(CandidateParseError::Empty);
    }
    let base = parse_base(base_text)?;

    Ok(Candidate { base, variants, important })
}

/// The important flag is written as a trailing `!`; a leading `!` is the
/// legacy spelling and still accepted.
fn strip_important(text: &str) -> (&str, bool) {
    if let Some(stripped) = text.strip_suffix('!') {
        (stripped, true)
    } else if let Some(stripped) = text.strip_prefix('!') {
        (stripped, true)
    } else {
        (text, false)
    }
}

fn parse_base(text: &str) -> Result<CandidateBase, CandidateParseError> {
    let (value_text, modifier) = split_modifier(text)?;
    if value_text.is_empty() {
        return Err(CandidateParseError::Empty);
    }

    // Whole-declaration form: `[color:red]`.
    if value_text.starts_with('[') {
        let inner = strip_delimiters(value_text, '[', ']')?;
        let (property, value) = inner
            .split_once(':')
            .ok_or_else(|| CandidateParseError::MalformedProperty { text: text.to_string() })?;
        if property.is_empty() || value.is_empty() || !is_valid_property(property) {
            return Err(CandidateParseError::MalformedProperty { text: text.to_string() });
        }
        return Ok(CandidateBase::Arbitrary {
            property: property.to_string(),
            value: decode_arbitrary_value(value)?,
            modifier,
        });
    }

    // Arbitrary value: `bg-[...]`, optionally typed: `text-[length:...]`.
    if value_text.ends_with(']') {
        let (root, inner) = split_arbitrary_affix(value_text, '[', ']')?;
        let (data_type, inner) = split_data_type(inner);
        if inner.is_empty() {
            return Err(CandidateParseError::Unbalanced { text: text.to_string() });
        }
        return Ok(CandidateBase::Functional {
            root: validated_name(root)?,
            value: Some(CandidateValue::Arbitrary {
                value: decode_arbitrary_value(inner)?,
                data_type,
            }),
            modifier,
        });
    }

    // Arbitrary-variable shorthand: `bg-(--x)` is sugar for `bg-[var(--x)]`.
    if value_text.ends_with(')') {
        let (root, inner) = split_arbitrary_affix(value_text, '(', ')')?;
        let (data_type, inner) = split_data_type(inner);
        if !inner.starts_with("--") {
            return Err(CandidateParseError::InvalidName { text: inner.to_string() });
        }
        return Ok(CandidateBase::Functional {
            root: validated_name(root)?,
            value: Some(CandidateValue::Arbitrary {
                value: format!("var({})", decode_arbitrary_value(inner)?),
                data_type,
            }),
            modifier,
        });
    }

    let root = validated_name(value_text)?;
    match modifier {
        Some(modifier) => Ok(CandidateBase::Functional { root, value: None, modifier: Some(modifier) }),
        None => Ok(CandidateBase::Static { root }),
    }
}

pub fn parse_variant(text: &str) -> Result<Variant, CandidateParseError> {
    if text.is_empty() {
        return Err(CandidateParseError::Empty);
    }

    if text.starts_with('[') {
        let inner = strip_delimiters(text, '[', ']')?;
        if inner.is_empty() {
            return Err(CandidateParseError::Unbalanced { text: text.to_string() });
        }
        return Ok(Variant::Arbitrary { selector: decode_arbitrary_value(inner)? });
    }

    let (value_text, modifier) = split_modifier(text)?;
    if value_text.is_empty() {
        return Err(CandidateParseError::Empty);
    }

    for root in COMPOUND_ROOTS {
        if let Some(rest) = value_text.strip_prefix(root).and_then(|r| r.strip_prefix('-')) {
            if !rest.is_empty() {
                return Ok(Variant::Compound {
                    root: (*root).to_string(),
                    variant: Box::new(parse_variant(rest)?),
                    modifier,
                });
            }
        }
    }

    if value_text.ends_with(']') {
        let (root, inner) = split_arbitrary_affix(value_text, '[', ']')?;
        return Ok(Variant::Functional {
            root: validated_name(root)?,
            value: Some(CandidateValue::Arbitrary {
                value: decode_arbitrary_value(inner)?,
                data_type: None,
            }),
            modifier,
        });
    }

    if value_text.ends_with(')') {
        let (root, inner) = split_arbitrary_affix(value_text, '(', ')')?;
        if !inner.starts_with("--") {
            return Err(CandidateParseError::InvalidName { text: inner.to_string() });
        }
        return Ok(Variant::Functional {
            root: validated_name(root)?,
            value: Some(CandidateValue::Arbitrary {
                value: format!("var({})", decode_arbitrary_value(inner)?),
                data_type: None,
            }),
            modifier,
        });
    }

    let root = validated_name(value_text)?;
    match modifier {
        Some(modifier) => Ok(Variant::Functional { root, value: None, modifier: Some(modifier) }),
        None => Ok(Variant::Static { root }),
    }
}

/// Splits off a trailing modifier at the last top-level `/`.
fn split_modifier(text: &str) -> Result<(&str, Option<CandidateModifier>), CandidateParseError> {
    let Some(at) = find_last_top_level(text, '/')? else {
        return Ok((text, None));
    };
    let (head, tail) = (&text[..at], &text[at + 1..]);
    if tail.is_empty() {
        return Err(CandidateParseError::InvalidModifier { text: text.to_string() });
    }
    let modifier = if tail.starts_with('[') {
        let inner = strip_delimiters(tail, '[', ']')?;
        if inner.is_empty() {
            return Err(CandidateParseError::InvalidModifier { text: tail.to_string() });
        }
        CandidateModifier::Arbitrary { value: decode_arbitrary_value(inner)? }
    } else if tail.starts_with('(') {
        let inner = strip_delimiters(tail, '(', ')')?;
        if !inner.starts_with("--") {
            return Err(CandidateParseError::InvalidModifier { text: tail.to_string() });
        }
        CandidateModifier::Arbitrary { value: format!("var({})", decode_arbitrary_value(inner)?) }
    } else {
        if !is_valid_name_text(tail) {
            return Err(CandidateParseError::InvalidModifier { text: tail.to_string() });
        }
        CandidateModifier::Named { value: tail.to_string() }
    };
    Ok((head, Some(modifier)))
}

/// `text-[length:1rem]` carries a data-type hint before the value.
fn split_data_type(inner: &str) -> (Option<String>, &str) {
    if let Some((prefix, rest)) = inner.split_once(':') {
        if DATA_TYPES.contains(&prefix) && !rest.is_empty() {
            return (Some(prefix.to_string()), rest);
        }
    }
    (None, inner)
}

// ============================================================================
// Token scanning helpers
// ============================================================================

/// Split at top-level occurrences of `sep`, honoring brackets, parens, quotes
/// and backslash escapes.
fn split_top_level(text: &str, sep: char) -> Result<Vec<&str>, CandidateParseError> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            _ if quote.is_some() => {
                if Some(c) == quote {
                    quote = None;
                }
            }
            '\'' | '"' => quote = Some(c),
            '[' | '(' => depth += 1,
            ']' | ')' => {
                depth -= 1;
                if depth < 0 {
                    return Err(CandidateParseError::Unbalanced { text: text.to_string() });
                }
            }
            _ if c == sep && depth == 0 => {
                parts.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    if depth != 0 || quote.is_some() {
        return Err(CandidateParseError::Unbalanced { text: text.to_string() });
    }
    parts.push(&text[start..]);
    Ok(parts)
}

/// Byte offset of the last top-level occurrence of `sep`, if any.
fn find_last_top_level(text: &str, sep: char) -> Result<Option<usize>, CandidateParseError> {
    let mut found = None;
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            _ if quote.is_some() => {
                if Some(c) == quote {
                    quote = None;
                }
            }
            '\'' | '"' => quote = Some(c),
            '[' | '(' => depth += 1,
            ']' | ')' => {
                depth -= 1;
                if depth < 0 {
                    return Err(CandidateParseError::Unbalanced { text: text.to_string() });
                }
            }
            _ if c == sep && depth == 0 => found = Some(i),
            _ => {}
        }
    }
    if depth != 0 || quote.is_some() {
        return Err(CandidateParseError::Unbalanced { text: text.to_string() });
    }
    Ok(found)
}

/// `text` must be exactly `<open>inner<close>`; returns `inner`.
fn strip_delimiters(text: &str, open: char, close: char) -> Result<&str, CandidateParseError> {
    let inner = text
        .strip_prefix(open)
        .and_then(|t| t.strip_suffix(close))
        .ok_or_else(|| CandidateParseError::Unbalanced { text: text.to_string() })?;
    // The close we stripped must be the one matching the first open.
    let mut depth = 1i32;
    for c in inner.chars() {
        if c == open || c == '[' || c == '(' {
            depth += 1;
        } else if c == close || c == ']' || c == ')' {
            depth -= 1;
            if depth == 0 {
                return Err(CandidateParseError::Unbalanced { text: text.to_string() });
            }
        }
    }
    Ok(inner)
}

/// `root-[inner]` / `root-(inner)`: returns `(root, inner)`, requiring the
/// bracketed part to close at the very end of `text`.
fn split_arbitrary_affix(
    text: &str,
    open: char,
    close: char,
) -> Result<(&str, &str), CandidateParseError> {
    let marker = format!("-{open}");
    let at = text
        .find(&marker)
        .ok_or_else(|| CandidateParseError::Unbalanced { text: text.to_string() })?;
    let root = &text[..at];
    let bracketed = &text[at + 1..];
    if !bracketed.ends_with(close) {
        return Err(CandidateParseError::Unbalanced { text: text.to_string() });
    }
    strip_delimiters(bracketed, open, close).map(|inner| (root, inner))
}

fn is_valid_property(property: &str) -> bool {
    property.starts_with("--")
        || property.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

fn is_valid_name_text(text: &str) -> bool {
    let mut chars = text.chars();
    let Some(first) = chars.next() else { return false };
    if text.starts_with("--") || text == "-" {
        return false;
    }
    let first_ok = first.is_ascii_alphanumeric() || first == '@' || first == '-';
    first_ok
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '%'))
}

fn validated_name(text: &str) -> Result<Name, CandidateParseError> {
    if is_valid_name_text(text) {
        Ok(text.to_string())
    } else {
        Err(CandidateParseError::InvalidName { text: text.to_string() })
    }
}
