//! Utility-class candidate canonicalization
//!
//! A *candidate* is a single utility-class token as authored in source
//! (`gap-y-4`, `hover:bg-[calc(1px+2px)]/50`, `md:group-hover/sidebar:flex!`).
//! This crate parses candidates into a typed AST and re-serializes them into
//! one canonical spelling, so that syntactically different but semantically
//! identical tokens (whitespace, escaping, `var()` shorthand, equivalent
//! selectors) collapse to the same lookup key.
//!
//! The pipeline is:
//! - [`value_parser`]: free-form value text (the inside of `[...]`,
//!   `calc(...)`, `var(...)`) into words, separators and nested functions;
//! - [`candidate`]: a raw token into a [`Candidate`] with variants, value,
//!   modifier and important flag;
//! - [`printer`]: a [`Candidate`] back into its canonical string.
//!
//! Canonicalization is idempotent: `canonical_class_name` applied to its own
//! output is a no-op. A token that fails to parse is passed through verbatim
//! and treated as an opaque, unmangleable literal.

pub mod candidate;
pub mod escape;
pub mod printer;
pub mod value_parser;

pub use candidate::{
    parse_candidate, Candidate, CandidateBase, CandidateModifier, CandidateParseError,
    CandidateValue, Variant,
};
pub use printer::print_candidate;
pub use value_parser::{parse, to_css, walk, ValueAstNode, ValueParseError, WalkAction};

/// Canonicalize a raw candidate token.
///
/// Returns the canonical spelling on success. A token that does not parse is
/// returned unchanged: scanning has to be resilient to unrecognized or future
/// syntax, and an opaque token canonicalizes to itself.
pub fn canonical_class_name(raw: &str, prefix: Option<&str>) -> String {
    match parse_candidate(raw, prefix) {
        Ok(parsed) => print_candidate(&parsed, prefix),
        Err(error) => {
            tracing::debug!(token = raw, %error, "candidate left as opaque literal");
            raw.to_string()
        }
    }
}

/// Like [`canonical_class_name`], but `None` for tokens that do not parse.
///
/// Rewriters use this to tell "canonicalizes to itself" apart from "is not a
/// candidate at all": only the former may be mangled.
pub fn try_canonical(raw: &str, prefix: Option<&str>) -> Option<String> {
    parse_candidate(raw, prefix)
        .ok()
        .map(|parsed| print_candidate(&parsed, prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_tokens_pass_through() {
        assert_eq!(canonical_class_name("bg-[oops", None), "bg-[oops");
        assert_eq!(canonical_class_name("", None), "");
        assert!(try_canonical("bg-[oops", None).is_none());
    }

    #[test]
    fn canonicalization_is_idempotent_on_samples() {
        for raw in [
            "gap-y-4",
            "hover:bg-red-500/50",
            "bg-[calc(1px_+_2px)]",
            "md:[&:is(.foo)]:flex",
            "bg-(--brand)",
            "w-[var(--size)]",
            "grid-cols-[200px_1fr]",
        ] {
            let once = canonical_class_name(raw, None);
            let twice = canonical_class_name(&once, None);
            assert_eq!(once, twice, "not idempotent for {raw}");
        }
    }
}
