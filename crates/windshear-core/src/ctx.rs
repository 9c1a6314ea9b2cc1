//! Naming context
//!
//! Process-scoped state for one build session: the canonical-name →
//! replacement map, the preserve set and the generator. Constructed once,
//! threaded explicitly through every handler call, and torn down (or reset)
//! when the session ends.
//!
//! All naming state sits behind a single `parking_lot::Mutex`; a map insertion
//! and its return value are observed atomically, so the "first encounter
//! decides the generated name" rule holds under concurrent first sight.

use std::collections::HashSet;
use std::path::Path;

use indexmap::IndexMap;
use parking_lot::Mutex;
use thiserror::Error;

use windshear_candidate::try_canonical;

use crate::config::{discover_config, ConfigError, MangleConfig, MangleUserConfig};
use crate::generator::{ClassGenerator, CollisionError, Generated};

#[derive(Debug, Error)]
pub enum MangleError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Collision(#[from] CollisionError),
}

#[derive(Debug, Default)]
struct NamingState {
    /// Canonical original name → replacement used by the rewriters.
    replace_map: IndexMap<String, String>,
    preserve: HashSet<String>,
    generator: ClassGenerator,
}

pub struct Context {
    options: MangleConfig,
    state: Mutex<NamingState>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    pub fn new() -> Self {
        Self::with_config(MangleConfig::default())
    }

    pub fn with_config(options: MangleConfig) -> Self {
        let generator = ClassGenerator::new(
            &options.class_prefix,
            options.reserved_class_names.iter().cloned(),
        );
        let mut state = NamingState { generator, ..Default::default() };
        state.preserve.extend(options.class_list.iter().cloned());
        Context { options, state: Mutex::new(state) }
    }

    /// Merge `user` options over the project config discovered in `cwd`,
    /// validate, and re-seed the session. Must complete before the first
    /// `resolve` of a session; safe to call once per session.
    pub fn init_config(&mut self, user: MangleUserConfig, cwd: &Path) -> Result<(), ConfigError> {
        let discovered = discover_config(cwd)?;
        let options = MangleConfig::resolve(user.merge_over(discovered))?;
        *self = Context::with_config(options);
        Ok(())
    }

    pub fn options(&self) -> &MangleConfig {
        &self.options
    }

    /// Add a name to the preserve set. Idempotent, effective immediately, and
    /// retroactively wins over an existing mapping.
    pub fn add_preserve_class(&self, name: &str) {
        self.state.lock().preserve.insert(name.to_string());
    }

    pub fn is_preserved(&self, name: &str) -> bool {
        self.state.lock().preserve.contains(name)
    }

    /// Seed a mapping directly, bypassing the generator.
    pub fn insert_mapping(&self, original: &str, replacement: &str) {
        self.state.lock().replace_map.insert(original.to_string(), replacement.to_string());
    }

    /// Resolve a canonical name to its replacement.
    ///
    /// Preserved names resolve to themselves and never consume a generator
    /// allocation. A name already mapped keeps its mapping for the life of the
    /// session; otherwise a fresh allocation is recorded and returned.
    pub fn resolve(&self, canonical: &str) -> Result<String, MangleError> {
        let mut state = self.state.lock();
        if state.preserve.contains(canonical) {
            return Ok(canonical.to_string());
        }
        if let Some(existing) = state.replace_map.get(canonical) {
            return Ok(existing.clone());
        }
        let NamingState { replace_map, preserve, generator } = &mut *state;
        let Generated { name, .. } = generator.generate_class_name(canonical, preserve)?;
        replace_map.insert(canonical.to_string(), name.clone());
        Ok(name)
    }

    /// The replacement for an already-mapped name, preserve set consulted
    /// first. Never allocates: rewriting CSS must not invent mappings for
    /// hand-authored selectors that no source file referenced.
    pub fn existing_replacement(&self, canonical: &str) -> Option<String> {
        let state = self.state.lock();
        if state.preserve.contains(canonical) {
            return None;
        }
        state.replace_map.get(canonical).cloned()
    }

    /// Whether a scanned token is eligible for mangling: it must parse as a
    /// candidate, look utility-shaped, and not be preserved.
    pub fn should_mangle(&self, canonical: &str) -> bool {
        if self.is_preserved(canonical) {
            return false;
        }
        if !(canonical.contains('-') || canonical.contains(':')) {
            return false;
        }
        try_canonical(canonical, self.options.theme_prefix.as_deref()).is_some()
    }

    pub fn record_usage(&self, canonical: &str, consumer: &str) {
        self.state.lock().generator.record_usage(canonical, consumer);
    }

    /// Snapshot of the generated map in first-encounter order, for reporting.
    pub fn generated_entries(&self) -> Vec<(String, String, Vec<String>)> {
        let state = self.state.lock();
        state
            .generator
            .new_class_map
            .iter()
            .map(|(origin, entry)| {
                (origin.clone(), entry.name.clone(), entry.used_by.iter().cloned().collect())
            })
            .collect()
    }

    /// Drop all naming state, keeping the configuration. Only meaningful
    /// between independent runs.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        *state = NamingState {
            generator: ClassGenerator::new(
                &self.options.class_prefix,
                self.options.reserved_class_names.iter().cloned(),
            ),
            ..Default::default()
        };
        state.preserve.extend(self.options.class_list.iter().cloned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_is_deterministic() {
        let ctx = Context::new();
        let first = ctx.resolve("gap-y-4").unwrap();
        let second = ctx.resolve("gap-y-4").unwrap();
        assert_eq!(first, second);
        assert_eq!(first, "tw-a");
    }

    #[test]
    fn distinct_names_get_distinct_replacements() {
        let ctx = Context::new();
        let a = ctx.resolve("gap-y-4").unwrap();
        let b = ctx.resolve("gap-x-4").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn preserve_wins_over_existing_mapping() {
        let ctx = Context::new();
        ctx.insert_mapping("gap-y-4", "tw-a");
        ctx.add_preserve_class("gap-y-4");
        assert_eq!(ctx.resolve("gap-y-4").unwrap(), "gap-y-4");
        assert_eq!(ctx.existing_replacement("gap-y-4"), None);
    }

    #[test]
    fn preserved_names_never_allocate() {
        let ctx = Context::new();
        ctx.add_preserve_class("gap-y-4");
        assert_eq!(ctx.resolve("gap-y-4").unwrap(), "gap-y-4");
        assert!(ctx.generated_entries().is_empty());
        // The allocation that would have been tw-a goes to the next name.
        assert_eq!(ctx.resolve("bg-white").unwrap(), "tw-a");
    }

    #[test]
    fn class_list_seeds_the_preserve_set() {
        let config = MangleConfig { class_list: vec!["gap-y-4".into()], ..Default::default() };
        let ctx = Context::with_config(config);
        assert!(ctx.is_preserved("gap-y-4"));
        assert_eq!(ctx.resolve("gap-y-4").unwrap(), "gap-y-4");
    }

    #[test]
    fn should_mangle_requires_utility_shape() {
        let ctx = Context::new();
        assert!(ctx.should_mangle("gap-y-4"));
        assert!(ctx.should_mangle("hover:flex"));
        assert!(!ctx.should_mangle("flex"));
        assert!(!ctx.should_mangle("--brand-color"));
        assert!(!ctx.should_mangle("bg-[oops"));
    }

    #[test]
    fn reset_clears_mappings() {
        let ctx = Context::new();
        ctx.resolve("gap-y-4").unwrap();
        ctx.reset();
        assert_eq!(ctx.existing_replacement("gap-y-4"), None);
        assert_eq!(ctx.resolve("bg-white").unwrap(), "tw-a");
    }
}
