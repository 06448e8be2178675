//! Shared helpers for the integration suites.

use grouper_core::models::{PropMap, PropValue};
use grouper_core::{GroupingOutcome, PlacedGroup};

/// A property map from `(key, value)` pairs.
#[allow(dead_code)]
pub fn props(pairs: &[(&str, PropValue)]) -> PropMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// A student with just a `name` property.
#[allow(dead_code)]
pub fn named_student(name: &str) -> PropMap {
    props(&[("name", name.into())])
}

/// A group with just a `size` property.
#[allow(dead_code)]
pub fn sized_group(size: u32) -> PropMap {
    props(&[("size", size.into())])
}

/// The `name` properties of one bucket's students, sorted.
#[allow(dead_code)]
pub fn names_of(group: &PlacedGroup) -> Vec<String> {
    let mut names: Vec<String> = group
        .students
        .iter()
        .filter_map(|s| match s.get("name") {
            Some(PropValue::Str(n)) => Some(n.clone()),
            _ => None,
        })
        .collect();
    names.sort();
    names
}

/// Assert the feasible-output invariants: every student placed exactly once,
/// no bucket over its `size`, nonempty buckets at least `minsize`.
#[allow(dead_code)]
pub fn assert_placement_invariants(outcome: &GroupingOutcome, student_count: usize) {
    let groups = outcome
        .groups
        .as_ref()
        .expect("invariants only apply to feasible outcomes");

    let placed: usize = groups.iter().map(|g| g.students.len()).sum();
    assert_eq!(placed, student_count, "every student lands in exactly one bucket");

    for (i, group) in groups.iter().enumerate() {
        if let Some(PropValue::Num(size)) = group.info.get("size") {
            assert!(
                group.students.len() as f64 <= *size,
                "bucket {} exceeds its size bound",
                i
            );
        }
        if let Some(PropValue::Num(minsize)) = group.info.get("minsize") {
            if !group.students.is_empty() {
                assert!(
                    group.students.len() as f64 >= *minsize,
                    "nonempty bucket {} is below its minsize",
                    i
                );
            }
        }
    }
}
