//! Canonical candidate printing
//!
//! Re-serializes a parsed [`Candidate`] into the one canonical spelling used
//! as the lookup key for preservation and mangling. Inside arbitrary text the
//! printer:
//!
//! 1. drops the spaces around `+ - * /` operator words (`calc(1px + 2px)` and
//!    `calc(1px+2px)` are the same utility);
//! 2. collapses `/` and `,` separators to their bare character;
//! 3. drops leading/trailing whitespace separators;
//! 4. re-encodes spaces/underscores (see [`crate::escape`]);
//! 5. simplifies `&:is(...)` arbitrary variants to the inner selector;
//! 6. prints values that are exactly one `var(...)` call in the
//!    parenthesized shorthand (`bg-(--x)`, not `bg-[var(--x)]`).

use crate::candidate::{Candidate, CandidateBase, CandidateModifier, CandidateValue, Variant};
use crate::escape::recursively_escape;
use crate::value_parser::{self, ValueAstNode};

const OPERATORS: &[&str] = &["+", "-", "*", "/"];

/// Print the canonical string for a candidate.
pub fn print_candidate(candidate: &Candidate, prefix: Option<&str>) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(prefix) = prefix {
        parts.push(prefix.to_string());
    }
    for variant in &candidate.variants {
        parts.push(print_variant(variant));
    }

    let mut base = String::new();
    match &candidate.base {
        CandidateBase::Static { root } => base.push_str(root),
        CandidateBase::Functional { root, value, modifier } => {
            base.push_str(root);
            match value {
                Some(CandidateValue::Arbitrary { value, data_type }) => {
                    base.push('-');
                    base.push_str(&bracketed_value(value, data_type.as_deref(), true));
                }
                Some(CandidateValue::Named { value }) => {
                    base.push('-');
                    base.push_str(value);
                }
                None => {}
            }
            if let Some(modifier) = modifier {
                base.push_str(&print_modifier(modifier, true));
            }
        }
        CandidateBase::Arbitrary { property, value, modifier } => {
            base.push('[');
            base.push_str(property);
            base.push(':');
            base.push_str(&print_arbitrary_value(value));
            base.push(']');
            if let Some(modifier) = modifier {
                base.push_str(&print_modifier(modifier, true));
            }
        }
    }
    if candidate.important {
        base.push('!');
    }
    parts.push(base);
    parts.join(":")
}

pub fn print_variant(variant: &Variant) -> String {
    match variant {
        Variant::Static { root } => root.clone(),
        Variant::Arbitrary { selector } => {
            format!("[{}]", print_arbitrary_value(&simplify_arbitrary_variant(selector)))
        }
        Variant::Functional { root, value, modifier } => {
            let mut out = root.clone();
            match value {
                Some(CandidateValue::Arbitrary { value, .. }) => {
                    out.push('-');
                    out.push_str(&bracketed_value(value, None, true));
                }
                Some(CandidateValue::Named { value }) => {
                    out.push('-');
                    out.push_str(value);
                }
                None => {}
            }
            if let Some(modifier) = modifier {
                out.push_str(&print_modifier(modifier, false));
            }
            out
        }
        Variant::Compound { root, variant, modifier } => {
            let mut out = root.clone();
            out.push('-');
            out.push_str(&print_variant(variant));
            if let Some(modifier) = modifier {
                out.push_str(&print_modifier(modifier, false));
            }
            out
        }
    }
}

/// `/50`, `/[0.5]` or, for candidates only, `/(--opacity)`.
fn print_modifier(modifier: &CandidateModifier, allow_var_shorthand: bool) -> String {
    match modifier {
        CandidateModifier::Named { value } => format!("/{value}"),
        CandidateModifier::Arbitrary { value } => {
            if allow_var_shorthand {
                if let Some(inner) = unwrap_var_call(value) {
                    return format!("/({})", print_arbitrary_value(inner));
                }
            }
            format!("/[{}]", print_arbitrary_value(value))
        }
    }
}

/// `[value]`, `[type:value]`, or the `(--x)` shorthand when the value is a
/// single `var(...)` call.
fn bracketed_value(value: &str, data_type: Option<&str>, allow_var_shorthand: bool) -> String {
    let (open, close, inner) = match unwrap_var_call(value) {
        Some(inner) if allow_var_shorthand => ('(', ')', inner),
        _ => ('[', ']', value),
    };
    match data_type {
        Some(data_type) => format!("{open}{data_type}:{}{close}", print_arbitrary_value(inner)),
        None => format!("{open}{}{close}", print_arbitrary_value(inner)),
    }
}

/// `Some(inner)` when `value` is exactly one `var(inner)` call.
fn unwrap_var_call(value: &str) -> Option<&str> {
    let ast = value_parser::parse(value).ok()?;
    match ast.as_slice() {
        [ValueAstNode::Function { name, .. }] if name == "var" => {
            Some(&value["var(".len()..value.len() - 1])
        }
        _ => None,
    }
}

/// `&:is(.foo)` and `.foo` are the same selector; canonicalize to the latter.
fn simplify_arbitrary_variant(selector: &str) -> String {
    if let Ok(ast) = value_parser::parse(selector) {
        if let [ValueAstNode::Word { value: amp }, ValueAstNode::Separator { value: colon }, ValueAstNode::Function { name, nodes }] =
            ast.as_slice()
        {
            if amp == "&" && colon == ":" && name == "is" {
                return value_parser::to_css(nodes);
            }
        }
    }
    selector.to_string()
}

/// Canonicalize and re-encode one piece of arbitrary text.
pub fn print_arbitrary_value(input: &str) -> String {
    let Ok(mut ast) = value_parser::parse(input) else {
        // Stored values come from a successful parse; this is unreachable for
        // them, but printing stays total.
        return input.to_string();
    };
    canonicalize_nodes(&mut ast);
    recursively_escape(&mut ast);
    value_parser::to_css(&ast)
}

fn canonicalize_nodes(nodes: &mut Vec<ValueAstNode>) {
    let mut drop = vec![false; nodes.len()];

    // Spacing around math operators is insignificant once unambiguous.
    for i in 0..nodes.len() {
        let ValueAstNode::Word { value } = &nodes[i] else { continue };
        if !OPERATORS.contains(&value.as_str()) {
            continue;
        }
        let single_space =
            |node: &ValueAstNode| matches!(node, ValueAstNode::Separator { value } if value == " ");
        if i > 0 && i + 1 < nodes.len() && single_space(&nodes[i - 1]) && single_space(&nodes[i + 1])
        {
            drop[i - 1] = true;
            drop[i + 1] = true;
        }
    }

    let last = nodes.len().saturating_sub(1);
    for (i, node) in nodes.iter_mut().enumerate() {
        if let ValueAstNode::Separator { value } = node {
            let trimmed = value.trim();
            if trimmed == "/" {
                *value = "/".to_string();
            } else if trimmed == "," {
                *value = ",".to_string();
            } else if trimmed.is_empty() && (i == 0 || i == last) {
                drop[i] = true;
            }
        }
    }

    let mut keep = drop.iter().map(|d| !d);
    nodes.retain(|_| keep.next().unwrap_or(true));

    for node in nodes.iter_mut() {
        if let ValueAstNode::Function { nodes, .. } = node {
            canonicalize_nodes(nodes);
        }
    }
}
