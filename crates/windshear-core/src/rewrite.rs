//! JS/TS and raw-text rewriting
//!
//! These handlers run before the utility framework expands classes: they
//! replace candidate occurrences in source text, seeding the naming context
//! as they go. Unlike parsed CSS, plain source offers no selector grammar to
//! anchor on, so replacement is anchored on scanner-reported offsets and, for
//! the raw fallback, additionally guarded by word boundaries so a name is
//! never replaced inside a longer identifier.

use windshear_candidate::try_canonical;

use crate::ctx::{Context, MangleError};
use crate::extract::CandidateExtractor;

/// Rewrite candidate occurrences in a JS/TS source.
pub fn pre_process_js(
    code: &str,
    ctx: &Context,
    id: &str,
    extractor: &dyn CandidateExtractor,
) -> Result<String, MangleError> {
    splice_candidates(code, ctx, id, extractor, false)
}

/// Conservative fallback for any other file kind.
pub fn pre_process_raw_code(
    code: &str,
    ctx: &Context,
    id: &str,
    extractor: &dyn CandidateExtractor,
) -> Result<String, MangleError> {
    splice_candidates(code, ctx, id, extractor, true)
}

fn splice_candidates(
    code: &str,
    ctx: &Context,
    id: &str,
    extractor: &dyn CandidateExtractor,
    check_boundaries: bool,
) -> Result<String, MangleError> {
    let extension = id.rsplit('.').next().unwrap_or_default();
    let theme_prefix = ctx.options().theme_prefix.clone();

    let mut edits: Vec<(usize, usize, String)> = Vec::new();
    for candidate in extractor.extract(code, extension) {
        let start = candidate.start;
        let end = start + candidate.raw.len();
        if code.get(start..end) != Some(candidate.raw.as_str()) {
            tracing::warn!(file = id, token = %candidate.raw, start, "stale scanner position");
            continue;
        }
        if check_boundaries && !at_word_boundary(code, start, end) {
            continue;
        }
        let Some(canonical) = try_canonical(&candidate.raw, theme_prefix.as_deref()) else {
            continue;
        };
        if !ctx.should_mangle(&canonical) {
            continue;
        }
        let replacement = ctx.resolve(&canonical)?;
        ctx.record_usage(&canonical, id);
        if replacement != candidate.raw {
            edits.push((start, end, replacement));
        }
    }

    Ok(apply_edits(code, edits))
}

/// A token is only replaced when it is not a proper substring of a longer
/// identifier run.
fn at_word_boundary(code: &str, start: usize, end: usize) -> bool {
    let is_ident = |c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_';
    let before_ok = code[..start].chars().next_back().map_or(true, |c| !is_ident(c));
    let after_ok = code[end..].chars().next().map_or(true, |c| !is_ident(c));
    before_ok && after_ok
}

fn apply_edits(code: &str, mut edits: Vec<(usize, usize, String)>) -> String {
    edits.sort_by_key(|(start, _, _)| *start);
    let mut out = String::with_capacity(code.len());
    let mut cursor = 0;
    for (start, end, replacement) in edits {
        if start < cursor {
            continue;
        }
        out.push_str(&code[cursor..start]);
        out.push_str(&replacement);
        cursor = end;
    }
    out.push_str(&code[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{RawCandidate, SplitExtractor};

    #[test]
    fn rewrites_scanned_candidates() {
        let ctx = Context::new();
        let code = r#"const cls = "gap-y-4 bg-red-500/50";"#;
        let out = pre_process_js(code, &ctx, "app.ts", &SplitExtractor).unwrap();
        assert_eq!(out, r#"const cls = "tw-a tw-b";"#);
        assert_eq!(ctx.existing_replacement("gap-y-4").as_deref(), Some("tw-a"));
        assert_eq!(ctx.existing_replacement("bg-red-500/50").as_deref(), Some("tw-b"));
    }

    #[test]
    fn non_utility_tokens_are_untouched() {
        let ctx = Context::new();
        let code = r#"const flex = "flex";"#;
        let out = pre_process_js(code, &ctx, "app.ts", &SplitExtractor).unwrap();
        assert_eq!(out, code);
        assert!(ctx.generated_entries().is_empty());
    }

    #[test]
    fn preserved_names_are_untouched() {
        let ctx = Context::new();
        ctx.add_preserve_class("gap-y-4");
        let code = r#"el.className = "gap-y-4";"#;
        let out = pre_process_js(code, &ctx, "app.ts", &SplitExtractor).unwrap();
        assert_eq!(out, code);
    }

    #[test]
    fn equivalent_spellings_share_one_replacement() {
        let ctx = Context::new();
        let a = pre_process_js("\"bg-[calc(1px_+_2px)]\"", &ctx, "a.ts", &SplitExtractor).unwrap();
        let b = pre_process_js("\"bg-[calc(1px+2px)]\"", &ctx, "b.ts", &SplitExtractor).unwrap();
        assert_eq!(a, "\"tw-a\"");
        assert_eq!(b, "\"tw-a\"");
        assert_eq!(ctx.generated_entries().len(), 1);
    }

    #[test]
    fn usage_is_recorded_per_consumer() {
        let ctx = Context::new();
        pre_process_js("\"gap-y-4\"", &ctx, "a.ts", &SplitExtractor).unwrap();
        pre_process_raw_code("class=\"gap-y-4\"", &ctx, "index.html", &SplitExtractor).unwrap();
        let entries = ctx.generated_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].2, vec!["a.ts".to_string(), "index.html".to_string()]);
    }

    /// An extractor reporting a token inside a longer identifier; the raw
    /// handler must refuse the splice.
    struct SubstringExtractor;

    impl CandidateExtractor for SubstringExtractor {
        fn extract(&self, content: &str, _extension: &str) -> Vec<RawCandidate> {
            let start = content.find("gap-y-4").unwrap_or(0);
            vec![RawCandidate { raw: "gap-y-4".into(), start }]
        }
    }

    #[test]
    fn raw_handler_refuses_substring_matches() {
        let ctx = Context::new();
        let code = "class=\"my-gap-y-4-widget\"";
        let out = pre_process_raw_code(code, &ctx, "index.html", &SubstringExtractor).unwrap();
        assert_eq!(out, code);
    }

    #[test]
    fn stale_positions_are_skipped() {
        struct StaleExtractor;
        impl CandidateExtractor for StaleExtractor {
            fn extract(&self, _content: &str, _extension: &str) -> Vec<RawCandidate> {
                vec![RawCandidate { raw: "gap-y-4".into(), start: 2 }]
            }
        }
        let ctx = Context::new();
        let code = "xxxxxxxxxxxx";
        let out = pre_process_js(code, &ctx, "a.ts", &StaleExtractor).unwrap();
        assert_eq!(out, code);
    }
}
