//! Property-based tests: filter algebra laws and whole-pipeline invariants
//! across randomly generated rosters.

mod common;

use std::collections::HashSet;

use common::assert_placement_invariants;
use grouper_core::filter::{Filter, FilterOp};
use grouper_core::models::{ApiInput, PropMap, PropValue, Predicate, WILDCARD};
use grouper_core::solver::entities::build_entities;
use grouper_core::solver::model::ModelBuilder;
use grouper_core::solver::store::IndexedStore;
use proptest::prelude::*;

fn value_strategy() -> impl Strategy<Value = PropValue> {
    prop_oneof![
        Just(PropValue::Str("a".to_string())),
        Just(PropValue::Str("b".to_string())),
        Just(PropValue::Str("c".to_string())),
        Just(PropValue::Str(WILDCARD.to_string())),
        Just(PropValue::Num(1.0)),
        Just(PropValue::Num(2.0)),
        Just(PropValue::Num(3.0)),
    ]
}

fn predicate_strategy() -> impl Strategy<Value = Predicate> {
    prop_oneof![
        value_strategy().prop_map(Predicate::Equals),
        proptest::collection::vec(value_strategy(), 0..3).prop_map(Predicate::IsIn),
        proptest::collection::vec(value_strategy(), 0..3).prop_map(Predicate::NotIn),
        value_strategy().prop_map(Predicate::IsNot),
        value_strategy().prop_map(Predicate::Lt),
        value_strategy().prop_map(Predicate::Lte),
        value_strategy().prop_map(Predicate::Gt),
        value_strategy().prop_map(Predicate::Gte),
    ]
}

fn filter_strategy() -> impl Strategy<Value = Filter> {
    let leaf = prop_oneof![
        Just(Filter::any()),
        (
            prop_oneof![Just("dorm"), Just("year")],
            predicate_strategy()
        )
            .prop_map(|(prop, pred)| Filter::Stencil(vec![(prop.to_string(), pred)])),
        (predicate_strategy(), predicate_strategy()).prop_map(|(p1, p2)| {
            Filter::Stencil(vec![("dorm".to_string(), p1), ("year".to_string(), p2)])
        }),
    ];
    leaf.prop_recursive(3, 24, 2, |inner| {
        (
            inner.clone(),
            inner,
            prop_oneof![
                Just(FilterOp::And),
                Just(FilterOp::Or),
                Just(FilterOp::Diff)
            ],
        )
            .prop_map(|(left, right, op)| Filter::Combine {
                op,
                left: Box::new(left),
                right: Box::new(right),
            })
    })
}

fn roster_strategy() -> impl Strategy<Value = Vec<PropMap>> {
    proptest::collection::vec(
        (
            proptest::option::of(value_strategy()),
            proptest::option::of(1..=3i32),
        ),
        1..8,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .map(|(dorm, year)| {
                let mut info = PropMap::new();
                if let Some(d) = dorm {
                    info.insert("dorm".to_string(), d);
                }
                if let Some(y) = year {
                    info.insert("year".to_string(), PropValue::Num(y as f64));
                }
                info
            })
            .collect()
    })
}

/// Evaluate a filter over a roster, returning the matching student ids.
fn matching_ids(filter: &Filter, roster: &[PropMap]) -> HashSet<u32> {
    let mut mb = ModelBuilder::new();
    let (students, groups) = build_entities(roster, &[], &mut mb);
    let store = IndexedStore::new(students, groups);
    store
        .filter_students(Some(filter))
        .into_iter()
        .map(|s| s.id)
        .collect()
}

proptest! {
    #[test]
    fn combinators_have_set_semantics(
        roster in roster_strategy(),
        f in filter_strategy(),
        g in filter_strategy(),
    ) {
        let fs = matching_ids(&f, &roster);
        let gs = matching_ids(&g, &roster);

        let and = matching_ids(&f.clone().and(g.clone()), &roster);
        let or = matching_ids(&f.clone().or(g.clone()), &roster);
        let diff = matching_ids(&f.clone().minus(g.clone()), &roster);

        prop_assert_eq!(&and, &fs.intersection(&gs).copied().collect::<HashSet<_>>());
        prop_assert_eq!(&or, &fs.union(&gs).copied().collect::<HashSet<_>>());
        prop_assert_eq!(&diff, &fs.difference(&gs).copied().collect::<HashSet<_>>());
    }

    #[test]
    fn empty_stencil_matches_the_full_roster(roster in roster_strategy()) {
        let all = matching_ids(&Filter::any(), &roster);
        prop_assert_eq!(all.len(), roster.len());
    }

    #[test]
    fn results_never_exceed_the_roster(
        roster in roster_strategy(),
        f in filter_strategy(),
    ) {
        let hits = matching_ids(&f, &roster);
        let universe: HashSet<u32> = (1..=roster.len() as u32).collect();
        prop_assert!(hits.is_subset(&universe));
    }

    #[test]
    fn wildcard_students_match_every_value_query(
        roster in roster_strategy(),
        value in value_strategy(),
    ) {
        let wild: HashSet<u32> = roster
            .iter()
            .enumerate()
            .filter(|(_, info)| {
                matches!(info.get("dorm"), Some(PropValue::Str(s)) if s == WILDCARD)
            })
            .map(|(i, _)| i as u32 + 1)
            .collect();

        let equals = matching_ids(
            &Filter::Stencil(vec![("dorm".to_string(), Predicate::Equals(value.clone()))]),
            &roster,
        );
        let is_in = matching_ids(
            &Filter::Stencil(vec![("dorm".to_string(), Predicate::IsIn(vec![value]))]),
            &roster,
        );

        prop_assert!(wild.is_subset(&equals));
        prop_assert!(wild.is_subset(&is_in));
    }

    #[test]
    fn trivial_solves_place_every_student(
        roster in roster_strategy(),
        extra_capacity in 0..3u32,
    ) {
        // two groups whose combined size always covers the roster
        let half = roster.len().div_ceil(2) as u32 + extra_capacity;
        let group = |size: u32| -> PropMap {
            [("size".to_string(), PropValue::Num(size as f64))]
                .into_iter()
                .collect()
        };
        let input = ApiInput {
            students: roster.clone(),
            groups: vec![group(half), group(half)],
            goal_sets: Vec::new(),
            deterministic: true,
        };

        let outcome = grouper_core::create_groups(&input).expect("valid input");
        prop_assert!(outcome.groups.is_some());
        assert_placement_invariants(&outcome, roster.len());
        // an empty goal set has nothing to reward
        prop_assert!(outcome.reward.unwrap_or(1.0).abs() < 1e-6);
    }
}
