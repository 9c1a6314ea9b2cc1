//! Underscore/space encoding for arbitrary value text
//!
//! Class tokens cannot contain literal spaces, so by convention `_` stands in
//! for a space and `\_` for a literal underscore. Candidate parsing decodes
//! arbitrary text into its real spelling; canonical printing re-encodes it.
//!
//! Exemptions, applied symmetrically in both directions:
//! - the argument of `url(...)` is carried verbatim (URLs may contain
//!   meaningful underscores);
//! - the first argument of `var(...)`/`theme(...)` is a custom-property or
//!   theme path and keeps its underscores;
//! - words whose first or second character is `-` (dashed idents such as
//!   `--brand-color`) keep their underscores;
//! - function names themselves are always encoded/decoded, including the
//!   `_url`/`_var`/`_theme` spellings an already-encoded name can take.

use crate::value_parser::{self, ValueAstNode, ValueParseError};

/// `_` → `\_`, then ` ` → `_`.
pub fn escape_underscore(value: &str) -> String {
    value.replace('_', "\\_").replace(' ', "_")
}

/// `\_` → `_`, and (unless skipped) `_` → ` `.
pub fn convert_underscores_to_whitespace(value: &str, skip_underscore_to_space: bool) -> String {
    let chars: Vec<char> = value.chars().collect();
    let mut out = String::with_capacity(value.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '\\' && i + 1 < chars.len() && chars[i + 1] == '_' {
            out.push('_');
            i += 2;
        } else if chars[i] == '_' && !skip_underscore_to_space {
            out.push(' ');
            i += 1;
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    out
}

fn is_dashed_word(value: &str) -> bool {
    let mut chars = value.chars();
    let first = chars.next();
    let second = chars.next();
    first == Some('-') || second == Some('-')
}

/// Decode one piece of arbitrary text (value, modifier or variant selector)
/// into its real spelling.
pub fn decode_arbitrary_value(input: &str) -> Result<String, ValueParseError> {
    let mut ast = value_parser::parse(input)?;
    recursively_decode(&mut ast);
    Ok(value_parser::to_css(&ast))
}

fn recursively_decode(nodes: &mut [ValueAstNode]) {
    for node in nodes {
        match node {
            ValueAstNode::Function { name, nodes } => {
                if name == "url" || name.ends_with("_url") {
                    *name = convert_underscores_to_whitespace(name, false);
                    continue;
                }
                if name == "var"
                    || name.ends_with("_var")
                    || name == "theme"
                    || name.ends_with("_theme")
                {
                    *name = convert_underscores_to_whitespace(name, false);
                    for (i, child) in nodes.iter_mut().enumerate() {
                        if i == 0 {
                            if let ValueAstNode::Word { value } = child {
                                *value = convert_underscores_to_whitespace(value, true);
                                continue;
                            }
                        }
                        recursively_decode(std::slice::from_mut(child));
                    }
                    continue;
                }
                *name = convert_underscores_to_whitespace(name, false);
                recursively_decode(nodes);
            }
            ValueAstNode::Separator { value } => {
                *value = convert_underscores_to_whitespace(value, false);
            }
            ValueAstNode::Word { value } => {
                let skip = is_dashed_word(value);
                *value = convert_underscores_to_whitespace(value, skip);
            }
        }
    }
}

/// Re-encode a decoded tree for printing.
pub fn recursively_escape(nodes: &mut [ValueAstNode]) {
    for node in nodes {
        match node {
            ValueAstNode::Function { name, nodes } => {
                if name == "url" || name.ends_with("_url") {
                    *name = escape_underscore(name);
                    continue;
                }
                if name == "var"
                    || name.ends_with("_var")
                    || name == "theme"
                    || name.ends_with("_theme")
                {
                    *name = escape_underscore(name);
                    for (i, child) in nodes.iter_mut().enumerate() {
                        if i == 0 && matches!(child, ValueAstNode::Word { .. }) {
                            continue;
                        }
                        recursively_escape(std::slice::from_mut(child));
                    }
                    continue;
                }
                *name = escape_underscore(name);
                recursively_escape(nodes);
            }
            ValueAstNode::Separator { value } => {
                *value = escape_underscore(value);
            }
            ValueAstNode::Word { value } => {
                if !is_dashed_word(value) {
                    *value = escape_underscore(value);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_parser::{parse, to_css};

    #[test]
    fn escape_and_convert_are_inverses_on_plain_text() {
        let decoded = "repeat(2, 1fr)";
        let encoded = escape_underscore(decoded);
        assert_eq!(encoded, "repeat(2,_1fr)");
        assert_eq!(convert_underscores_to_whitespace(&encoded, false), decoded);
    }

    #[test]
    fn escaped_underscores_survive_round_trip() {
        let encoded = r"foo\_bar_baz";
        let decoded = convert_underscores_to_whitespace(encoded, false);
        assert_eq!(decoded, "foo_bar baz");
        assert_eq!(escape_underscore(&decoded), encoded);
    }

    #[test]
    fn decode_keeps_url_arguments_verbatim() {
        let decoded = decode_arbitrary_value("url(a_b_c)").unwrap();
        assert_eq!(decoded, "url(a_b_c)");
    }

    #[test]
    fn decode_keeps_var_first_argument() {
        let decoded = decode_arbitrary_value("var(--my_var,1_2)").unwrap();
        assert_eq!(decoded, "var(--my_var,1 2)");
    }

    #[test]
    fn decode_keeps_dashed_idents() {
        let decoded = decode_arbitrary_value("--my_var").unwrap();
        assert_eq!(decoded, "--my_var");
    }

    #[test]
    fn escape_pass_mirrors_decode_exemptions() {
        let mut ast = parse("var(--my_var) theme(spacing.1)").unwrap();
        recursively_escape(&mut ast);
        assert_eq!(to_css(&ast), "var(--my_var)_theme(spacing.1)");
    }

    #[test]
    fn separators_become_underscores() {
        let mut ast = parse("200px 1fr").unwrap();
        recursively_escape(&mut ast);
        assert_eq!(to_css(&ast), "200px_1fr");
    }
}
