//! CSS rewriter
//!
//! Parses the stylesheet into a rule tree and rewrites class selector
//! components through the naming context. Only selector positions change;
//! declaration bodies are never touched. Nested rules (media queries,
//! supports/container/layer blocks and nested style rules) are traversed
//! recursively, as are `:is()`/`:where()`/`:not()` selector lists.
//!
//! A class selector immediately followed by a `[data-v-...]` attribute is a
//! component-scoped selector; with `ignore_vue_scoped` (the default) it is
//! left alone, because those selectors are handled by the scoping mechanism
//! that generated them.
//!
//! A stylesheet that fails to parse is returned unmodified: malformed input
//! degrades to "leave as-is", never aborts the session.

use lightningcss::rules::{CssRule, CssRuleList};
use lightningcss::selector::{Component, Selector, SelectorList};
use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::values::ident::Ident;

use windshear_candidate::canonical_class_name;

use crate::ctx::Context;

pub struct CssHandlerOptions<'a> {
    pub ctx: &'a Context,
    /// Consumer id recorded for usage tracking.
    pub file: Option<&'a str>,
    /// Overrides the session default when set.
    pub ignore_vue_scoped: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssOutput {
    pub css: String,
    pub replacements: usize,
}

struct RewriteJob<'a> {
    ctx: &'a Context,
    theme_prefix: Option<&'a str>,
    file: &'a str,
    ignore_vue_scoped: bool,
}

/// Rewrite class selectors in `source` through the naming context.
pub fn css_handler(source: &str, options: CssHandlerOptions<'_>) -> CssOutput {
    let file = options.file.unwrap_or("<inline css>");
    let ignore_vue_scoped =
        options.ignore_vue_scoped.unwrap_or(options.ctx.options().ignore_vue_scoped);

    let parser_options = ParserOptions {
        filename: file.to_string(),
        error_recovery: true,
        ..ParserOptions::default()
    };
    let mut stylesheet = match StyleSheet::parse(source, parser_options) {
        Ok(stylesheet) => stylesheet,
        Err(error) => {
            tracing::warn!(file, %error, "stylesheet failed to parse, leaving unmodified");
            return CssOutput { css: source.to_string(), replacements: 0 };
        }
    };

    let job = RewriteJob {
        ctx: options.ctx,
        theme_prefix: options.ctx.options().theme_prefix.as_deref(),
        file,
        ignore_vue_scoped,
    };
    let mut replacements = 0;
    rewrite_rules(&mut stylesheet.rules, &job, &mut replacements);

    match stylesheet.to_css(PrinterOptions::default()) {
        Ok(result) => CssOutput { css: result.code, replacements },
        Err(error) => {
            tracing::warn!(file, %error, "stylesheet failed to print, leaving unmodified");
            CssOutput { css: source.to_string(), replacements: 0 }
        }
    }
}

fn rewrite_rules<'i>(rules: &mut CssRuleList<'i>, job: &RewriteJob<'_>, replacements: &mut usize) {
    for rule in rules.0.iter_mut() {
        match rule {
            CssRule::Style(style) => {
                rewrite_selector_list(&mut style.selectors, job, replacements);
                rewrite_rules(&mut style.rules, job, replacements);
            }
            CssRule::Media(media) => rewrite_rules(&mut media.rules, job, replacements),
            CssRule::Supports(supports) => rewrite_rules(&mut supports.rules, job, replacements),
            CssRule::Container(container) => rewrite_rules(&mut container.rules, job, replacements),
            CssRule::LayerBlock(layer) => rewrite_rules(&mut layer.rules, job, replacements),
            _ => {}
        }
    }
}

fn rewrite_selector_list<'i>(
    list: &mut SelectorList<'i>,
    job: &RewriteJob<'_>,
    replacements: &mut usize,
) {
    for selector in list.0.iter_mut() {
        rewrite_selector(selector, job, replacements);
    }
}

fn rewrite_selector<'i>(selector: &mut Selector<'i>, job: &RewriteJob<'_>, replacements: &mut usize) {
    // First pass: decide replacements by component index. Looking at the
    // following component requires the whole slice, so mutation waits.
    let mut planned: Vec<Option<String>> = Vec::new();
    {
        let components: Vec<&Component<'i>> = selector.iter_raw_match_order().collect();
        planned.resize(components.len(), None);
        for (i, component) in components.iter().enumerate() {
            let Component::Class(name) = *component else { continue };
            let original: &str = name.as_ref();
            if job.ignore_vue_scoped
                && components.get(i + 1).is_some_and(|next| is_scoped_attribute(next))
            {
                tracing::debug!(class = original, "skipping component-scoped selector");
                continue;
            }
            let canonical = canonical_class_name(original, job.theme_prefix);
            if let Some(replacement) = job.ctx.existing_replacement(&canonical) {
                job.ctx.record_usage(&canonical, job.file);
                if replacement != original {
                    planned[i] = Some(replacement);
                }
            }
        }
    }

    // Second pass: apply the plan and recurse into logical combinators.
    for (i, component) in selector.iter_mut_raw_match_order().enumerate() {
        if let Some(replacement) = planned.get_mut(i).and_then(Option::take) {
            *component = Component::Class(Ident(replacement.into()));
            *replacements += 1;
        }
        match component {
            Component::Is(selectors)
            | Component::Where(selectors)
            | Component::Negation(selectors) => {
                for inner in selectors.iter_mut() {
                    rewrite_selector(inner, job, replacements);
                }
            }
            _ => {}
        }
    }
}

fn is_scoped_attribute(component: &Component<'_>) -> bool {
    match component {
        Component::AttributeInNoNamespaceExists { local_name, .. }
        | Component::AttributeInNoNamespace { local_name, .. } => {
            AsRef::<str>::as_ref(local_name).starts_with("data-v-")
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_ctx() -> Context {
        let ctx = Context::new();
        ctx.insert_mapping("gap-y-4", "tw-a");
        ctx
    }

    fn handle(ctx: &Context, css: &str, ignore_vue_scoped: Option<bool>) -> CssOutput {
        css_handler(css, CssHandlerOptions { ctx, file: Some("test.css"), ignore_vue_scoped })
    }

    #[test]
    fn preserve_wins_over_existing_mapping() {
        let ctx = seeded_ctx();
        ctx.add_preserve_class("gap-y-4");
        let out = handle(&ctx, ".gap-y-4 {color:red;}", None);
        assert!(out.css.contains(".gap-y-4"));
        assert!(!out.css.contains(".tw-a"));
        assert_eq!(out.replacements, 0);
    }

    #[test]
    fn class_list_config_preserves_like_a_preserve_call() {
        let config = crate::config::MangleConfig {
            class_list: vec!["gap-y-4".into()],
            ..Default::default()
        };
        let ctx = Context::with_config(config);
        ctx.insert_mapping("gap-y-4", "tw-a");
        let out = handle(&ctx, ".gap-y-4 {color:red;}", None);
        assert!(out.css.contains(".gap-y-4"));
        assert!(!out.css.contains(".tw-a"));
    }

    #[test]
    fn mapped_selectors_are_rewritten_inside_media_queries() {
        let ctx = seeded_ctx();
        let css = "@media (min-width: 768px) {\n  .gap-y-4 {\n  }\n}";
        let out = handle(&ctx, css, None);
        assert!(out.css.contains(".tw-a"));
        assert!(!out.css.contains(".gap-y-4"));
        assert_eq!(out.replacements, 1);
    }

    #[test]
    fn scoped_selectors_are_skipped_by_default() {
        let ctx = seeded_ctx();
        let css = "@media (min-width: 768px) {\n  .gap-y-4[data-v-0f84999b] {\n  }\n}";
        let out = handle(&ctx, css, None);
        assert!(out.css.contains(".gap-y-4"));
        assert!(!out.css.contains(".tw-a"));
        assert_eq!(out.replacements, 0);
    }

    #[test]
    fn scoped_selectors_are_rewritten_when_not_ignored() {
        let ctx = seeded_ctx();
        let css = "@media (min-width: 768px) {\n  .gap-y-4[data-v-0f84999b] {\n  }\n}";
        let out = handle(&ctx, css, Some(false));
        assert!(out.css.contains(".tw-a"));
        assert!(out.css.contains("data-v-0f84999b"));
        assert!(!out.css.contains(".gap-y-4"));
    }

    #[test]
    fn declarations_are_left_alone() {
        let ctx = Context::new();
        ctx.insert_mapping("bg-white", "tw-a");
        let css = ".bg-white[data-v-0f84999b] {\n  --tw-bg-opacity: 1;\n  background-color: rgba(255, 255, 255, var(--tw-bg-opacity));\n}";
        let out = handle(&ctx, css, None);
        assert!(out.css.contains(".bg-white"));
        assert!(out.css.contains("--tw-bg-opacity"));
        assert!(out.css.contains("var(--tw-bg-opacity)"));
    }

    #[test]
    fn escaped_selectors_match_their_canonical_name() {
        let ctx = Context::new();
        ctx.insert_mapping("hover:bg-red-500/50", "tw-b");
        let out = handle(&ctx, ".hover\\:bg-red-500\\/50 {color:red;}", None);
        assert!(out.css.contains(".tw-b"));
    }

    #[test]
    fn logical_combinators_are_walked() {
        let ctx = seeded_ctx();
        let out = handle(&ctx, ":is(.gap-y-4, .other) {color:red;}", None);
        assert!(out.css.contains(".tw-a"));
        assert!(out.css.contains(".other"));
    }

    #[test]
    fn unmapped_selectors_never_allocate() {
        let ctx = Context::new();
        let out = handle(&ctx, ".container {color:red;}", None);
        assert!(out.css.contains(".container"));
        assert!(ctx.generated_entries().is_empty());
    }

    #[test]
    fn unparseable_css_degrades_to_input() {
        let ctx = seeded_ctx();
        let css = ".gap-y-4 {color:red;";
        let out = handle(&ctx, css, None);
        // Either recovered or passed through, but never panics or corrupts
        // the naming context.
        assert_eq!(ctx.existing_replacement("gap-y-4").as_deref(), Some("tw-a"));
        assert!(!out.css.is_empty() || css.is_empty());
    }
}
