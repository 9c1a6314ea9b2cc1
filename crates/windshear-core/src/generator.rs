//! Class-name generator
//!
//! Allocates short replacement identifiers: a configurable prefix followed by
//! a bijective base-26 counter (`a`, `b`, ... `z`, `aa`, `ab`, ...). The same
//! original always yields the same generated name for the life of the
//! generator, distinct originals always yield distinct names, and outputs
//! colliding with preserved or reserved names are skipped over.

use std::collections::{BTreeSet, HashSet};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Outputs the generator refuses to produce even without configuration.
/// `ad` gets elements hidden by ad blockers.
pub const DEFAULT_RESERVED_CLASS_NAMES: &[&str] = &["ad"];

/// A fresh counter value mapping to an already-taken name means the scheme
/// itself is broken; a silent collision would corrupt unrelated class names.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("generated class name `{name}` is already taken")]
pub struct CollisionError {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassGenEntry {
    pub name: String,
    /// Consumers (file ids) that referenced the original name.
    pub used_by: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    pub name: String,
    pub is_new: bool,
}

#[derive(Debug, Default)]
pub struct ClassGenerator {
    /// Original name → generated entry, in first-encounter order.
    pub new_class_map: IndexMap<String, ClassGenEntry>,
    new_class_size: usize,
    class_prefix: String,
    reserved: HashSet<String>,
    taken: HashSet<String>,
}

impl ClassGenerator {
    pub fn new(class_prefix: &str, reserved: impl IntoIterator<Item = String>) -> Self {
        let mut all_reserved: HashSet<String> =
            DEFAULT_RESERVED_CLASS_NAMES.iter().map(|s| s.to_string()).collect();
        all_reserved.extend(reserved);
        ClassGenerator {
            new_class_map: IndexMap::new(),
            new_class_size: 0,
            class_prefix: class_prefix.to_string(),
            reserved: all_reserved,
            taken: HashSet::new(),
        }
    }

    /// The counter rendered as a bijective base-26 identifier.
    fn ident_for(mut n: usize) -> String {
        let mut chars = Vec::new();
        loop {
            chars.push((b'a' + (n % 26) as u8) as char);
            n /= 26;
            if n == 0 {
                break;
            }
            n -= 1;
        }
        chars.iter().rev().collect()
    }

    /// Allocate (or look up) the generated name for `original`.
    ///
    /// `preserved` is consulted so a generated name can never shadow a
    /// protected hand-authored class.
    pub fn generate_class_name(
        &mut self,
        original: &str,
        preserved: &HashSet<String>,
    ) -> Result<Generated, CollisionError> {
        if let Some(entry) = self.new_class_map.get(original) {
            return Ok(Generated { name: entry.name.clone(), is_new: false });
        }
        loop {
            let candidate = format!("{}{}", self.class_prefix, Self::ident_for(self.new_class_size));
            self.new_class_size += 1;
            if preserved.contains(&candidate) || self.reserved.contains(&candidate) {
                tracing::debug!(name = %candidate, "skipping protected generator output");
                continue;
            }
            if !self.taken.insert(candidate.clone()) {
                return Err(CollisionError { name: candidate });
            }
            self.new_class_map.insert(
                original.to_string(),
                ClassGenEntry { name: candidate.clone(), used_by: BTreeSet::new() },
            );
            return Ok(Generated { name: candidate, is_new: true });
        }
    }

    /// Append-only usage tracking; reporting only, never correctness.
    pub fn record_usage(&mut self, original: &str, consumer: &str) {
        if let Some(entry) = self.new_class_map.get_mut(original) {
            entry.used_by.insert(consumer.to_string());
        }
    }
}
