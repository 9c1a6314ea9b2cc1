use std::collections::HashSet;
use std::sync::Arc;

use proptest::prelude::*;
use windshear_core::Context;

fn class_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z]{1,5}-[a-z0-9]{1,5}(-[a-z0-9]{1,4})?").expect("valid regex")
}

proptest! {
    /// N distinct canonical names resolve to N distinct replacements.
    #[test]
    fn replacements_are_pairwise_distinct(names in prop::collection::hash_set(class_name_strategy(), 1..40)) {
        let ctx = Context::new();
        let mut outputs = HashSet::new();
        for name in &names {
            outputs.insert(ctx.resolve(name).unwrap());
        }
        prop_assert_eq!(outputs.len(), names.len());
    }

    /// Resolution is stable regardless of repetition and interleaving.
    #[test]
    fn resolution_is_stable(names in prop::collection::vec(class_name_strategy(), 1..40)) {
        let ctx = Context::new();
        let first: Vec<String> = names.iter().map(|n| ctx.resolve(n).unwrap()).collect();
        let second: Vec<String> = names.iter().map(|n| ctx.resolve(n).unwrap()).collect();
        prop_assert_eq!(first, second);
    }

    /// Once preserved, a name resolves to itself for the rest of the session,
    /// even if a mapping existed before, and other mappings are undisturbed.
    #[test]
    fn preserve_precedence_holds(names in prop::collection::hash_set(class_name_strategy(), 2..20)) {
        let ctx = Context::new();
        let before: std::collections::BTreeMap<String, String> =
            names.iter().map(|n| (n.clone(), ctx.resolve(n).unwrap())).collect();
        let preserved = names.iter().next().unwrap().clone();
        ctx.add_preserve_class(&preserved);
        prop_assert_eq!(ctx.resolve(&preserved).unwrap(), preserved.clone());
        for name in names.iter().filter(|n| **n != preserved) {
            prop_assert_eq!(ctx.resolve(name).unwrap(), before[name].clone());
        }
    }
}

/// Concurrent first sight of the same name must not double-allocate.
#[test]
fn concurrent_first_sight_allocates_once() {
    let ctx = Arc::new(Context::new());
    let mut handles = Vec::new();
    for _ in 0..8 {
        let ctx = Arc::clone(&ctx);
        handles.push(std::thread::spawn(move || {
            (0..100)
                .map(|i| ctx.resolve(&format!("cls-{}", i % 10)).unwrap())
                .collect::<Vec<_>>()
        }));
    }
    let results: Vec<Vec<String>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let mut replacements: HashSet<String> = HashSet::new();
    for run in &results {
        replacements.extend(run.iter().cloned());
    }
    // 10 distinct originals → exactly 10 distinct replacements across all
    // threads, and every thread saw the same mapping.
    assert_eq!(replacements.len(), 10);
    for run in &results {
        assert_eq!(run[0], ctx.resolve("cls-0").unwrap());
    }
}
