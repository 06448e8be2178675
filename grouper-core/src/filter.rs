//! Recursive, composable filters over property maps.
//!
//! A filter is a tree. Leaves carry a *stencil*: an ordered list of
//! `(property, predicate)` pairs that every matching entity must satisfy
//! (an empty stencil matches everything). Internal nodes combine two
//! subtrees with `AND`, `OR`, or `DIFF` set semantics. Trees of arbitrary
//! depth are built with the chainable [`Filter::and`], [`Filter::or`], and
//! [`Filter::minus`] methods.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::models::{Predicate, PropValue, WILDCARD};
use crate::solver::store::{HasInfo, PropIndex};

/// The ordered property→predicate pairs carried by a filter leaf.
pub type Stencil = Vec<(String, Predicate)>;

/// Set operator carried by an internal filter node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    /// Intersection of the two operand results.
    And,
    /// Union of the two operand results.
    Or,
    /// Left result minus right result.
    Diff,
}

/// A filter tree applied to students or groups.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    /// A leaf holding a stencil; an empty stencil matches every entity.
    Stencil(Stencil),
    /// An internal node combining two subtrees.
    Combine {
        /// How the operand results are merged.
        op: FilterOp,
        /// Left operand.
        left: Box<Filter>,
        /// Right operand.
        right: Box<Filter>,
    },
}

impl Filter {
    /// A filter that matches every entity.
    pub fn any() -> Self {
        Filter::Stencil(Vec::new())
    }

    /// A leaf filter from `(property, predicate)` pairs. Bare values are
    /// equality predicates:
    ///
    /// ```
    /// use grouper_core::Filter;
    /// use grouper_core::models::Predicate;
    ///
    /// let f = Filter::new([("honors", "y")]);
    /// let g = Filter::new([("year", Predicate::Gte(2.0.into()))]);
    /// let both = f.and(g);
    /// ```
    pub fn new<I, K, P>(stencil: I) -> Self
    where
        I: IntoIterator<Item = (K, P)>,
        K: Into<String>,
        P: Into<Predicate>,
    {
        Filter::Stencil(
            stencil
                .into_iter()
                .map(|(k, p)| (k.into(), p.into()))
                .collect(),
        )
    }

    /// Entities matching both `self` and `other`.
    pub fn and(self, other: Filter) -> Filter {
        Filter::Combine {
            op: FilterOp::And,
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    /// Entities matching `self` or `other`.
    pub fn or(self, other: Filter) -> Filter {
        Filter::Combine {
            op: FilterOp::Or,
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    /// Entities matching `self` but not `other`.
    pub fn minus(self, other: Filter) -> Filter {
        Filter::Combine {
            op: FilterOp::Diff,
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    /// Evaluate against one population, returning matching entity indices.
    ///
    /// Value-based predicates run over the property index; comparison
    /// predicates scan the full population. Results are duplicate-free.
    pub(crate) fn apply<E: HasInfo>(&self, index: &PropIndex, entities: &[E]) -> Vec<usize> {
        match self {
            Filter::Combine { op, left, right } => {
                let l = left.apply(index, entities);
                let r = right.apply(index, entities);
                match op {
                    FilterOp::And => intersect(l, &r),
                    FilterOp::Or => union(l, &r),
                    FilterOp::Diff => subtract(l, &r),
                }
            }
            Filter::Stencil(stencil) => {
                let mut matches: Option<Vec<usize>> = None;
                for (prop, pred) in stencil {
                    let candidates = candidates_for(prop, pred, index, entities);
                    matches = Some(match matches {
                        None => dedup(candidates),
                        Some(acc) => intersect(acc, &candidates),
                    });
                    if matches.as_ref().is_some_and(|m| m.is_empty()) {
                        return Vec::new();
                    }
                }
                matches.unwrap_or_else(|| (0..entities.len()).collect())
            }
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Stencil(stencil) => {
                write!(f, "{{")?;
                for (i, (prop, pred)) in stencil.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} {}", prop, pred)?;
                }
                write!(f, "}}")
            }
            Filter::Combine { op, left, right } => {
                let op = match op {
                    FilterOp::And => "AND",
                    FilterOp::Or => "OR",
                    FilterOp::Diff => "DIFF",
                };
                write!(f, "({} {} {})", left, op, right)
            }
        }
    }
}

/// Candidate entity indices for a single stencil entry.
fn candidates_for<E: HasInfo>(
    prop: &str,
    pred: &Predicate,
    index: &PropIndex,
    entities: &[E],
) -> Vec<usize> {
    match pred {
        Predicate::Equals(v) => value_candidates(prop, std::slice::from_ref(v), index),
        Predicate::IsIn(vs) => value_candidates(prop, vs, index),
        Predicate::IsNot(v) => {
            let hits = value_candidates(prop, std::slice::from_ref(v), index);
            subtract((0..entities.len()).collect(), &hits)
        }
        Predicate::NotIn(vs) => {
            let hits = value_candidates(prop, vs, index);
            subtract((0..entities.len()).collect(), &hits)
        }
        Predicate::Lt(v) | Predicate::Lte(v) | Predicate::Gt(v) | Predicate::Gte(v) => entities
            .iter()
            .enumerate()
            .filter(|(_, e)| {
                e.info()
                    .get(prop)
                    .and_then(|actual| actual.compare(v))
                    .is_some_and(|ord| match pred {
                        Predicate::Lt(_) => ord.is_lt(),
                        Predicate::Lte(_) => ord.is_le(),
                        Predicate::Gt(_) => ord.is_gt(),
                        Predicate::Gte(_) => ord.is_ge(),
                        _ => unreachable!(),
                    })
            })
            .map(|(i, _)| i)
            .collect(),
    }
}

/// Union of the index buckets for the given values, plus the wildcard bucket.
fn value_candidates(prop: &str, values: &[PropValue], index: &PropIndex) -> Vec<usize> {
    let mut out = Vec::new();
    let Some(buckets) = index.get(prop) else {
        return out;
    };
    for v in values {
        if let Some((_, bucket)) = buckets.iter().find(|(bv, _)| bv == v) {
            out.extend_from_slice(bucket);
        }
    }
    let wildcard = PropValue::Str(WILDCARD.to_string());
    if let Some((_, bucket)) = buckets.iter().find(|(bv, _)| *bv == wildcard) {
        out.extend_from_slice(bucket);
    }
    out
}

fn dedup(items: Vec<usize>) -> Vec<usize> {
    let mut seen = HashSet::new();
    items.into_iter().filter(|i| seen.insert(*i)).collect()
}

fn intersect(left: Vec<usize>, right: &[usize]) -> Vec<usize> {
    let keep: HashSet<usize> = right.iter().copied().collect();
    let mut seen = HashSet::new();
    left.into_iter()
        .filter(|i| keep.contains(i) && seen.insert(*i))
        .collect()
}

fn union(left: Vec<usize>, right: &[usize]) -> Vec<usize> {
    let mut seen: HashSet<usize> = HashSet::new();
    let mut out = Vec::new();
    for i in left.into_iter().chain(right.iter().copied()) {
        if seen.insert(i) {
            out.push(i);
        }
    }
    out
}

fn subtract(left: Vec<usize>, right: &[usize]) -> Vec<usize> {
    let drop: HashSet<usize> = right.iter().copied().collect();
    let mut seen = HashSet::new();
    left.into_iter()
        .filter(|i| !drop.contains(i) && seen.insert(*i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PropMap;
    use crate::solver::store::build_index;

    fn entity(pairs: &[(&str, PropValue)]) -> PropMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn roster() -> Vec<PropMap> {
        vec![
            entity(&[("dorm", "quincy".into()), ("year", 1.into())]),
            entity(&[("dorm", "adams".into()), ("year", 2.into())]),
            entity(&[("dorm", "quincy".into()), ("year", 3.into())]),
            entity(&[("dorm", WILDCARD.into()), ("year", 2.into())]),
            entity(&[("year", 4.into())]), // no dorm at all
        ]
    }

    fn apply(filter: &Filter, entities: &[PropMap]) -> Vec<usize> {
        let index = build_index(entities);
        filter.apply(&index, entities)
    }

    #[test]
    fn empty_stencil_matches_everything() {
        let all = apply(&Filter::any(), &roster());
        assert_eq!(all, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn equality_includes_wildcard_entities() {
        let hits = apply(&Filter::new([("dorm", "quincy")]), &roster());
        assert_eq!(hits, vec![0, 2, 3]);
    }

    #[test]
    fn is_in_unions_buckets_and_wildcard() {
        let f = Filter::new([(
            "dorm",
            Predicate::IsIn(vec!["quincy".into(), "adams".into()]),
        )]);
        let hits = apply(&f, &roster());
        assert_eq!(hits, vec![0, 2, 1, 3]);
    }

    #[test]
    fn not_in_excludes_wildcards_too() {
        let f = Filter::new([("dorm", Predicate::NotIn(vec!["adams".into()]))]);
        let hits = apply(&f, &roster());
        // adams and the wildcard entity are dropped; the dormless one stays
        assert_eq!(hits, vec![0, 2, 4]);
    }

    #[test]
    fn comparisons_skip_entities_without_the_property() {
        let f = Filter::new([("year", Predicate::Gte(2.into()))]);
        let hits = apply(&f, &roster());
        assert_eq!(hits, vec![1, 2, 3, 4]);

        let none = apply(&Filter::new([("height", Predicate::Lt(10.into()))]), &roster());
        assert!(none.is_empty());
    }

    #[test]
    fn mixed_type_comparison_matches_nothing() {
        let f = Filter::new([("dorm", Predicate::Lt(3.into()))]);
        let hits = apply(&f, &roster());
        // string dorms against a numeric bound: no ordering, no match;
        // wildcard does not help comparison predicates either
        assert!(hits.is_empty());
    }

    #[test]
    fn stencil_entries_intersect() {
        let f = Filter::new([
            ("dorm", Predicate::from("quincy")),
            ("year", Predicate::Gte(2.into())),
        ]);
        let hits = apply(&f, &roster());
        assert_eq!(hits, vec![2, 3]);
    }

    #[test]
    fn combine_ops_have_set_semantics() {
        let roster = roster();
        let quincy = Filter::new([("dorm", "quincy")]);
        let late = Filter::new([("year", Predicate::Gte(2.into()))]);

        let and = apply(&quincy.clone().and(late.clone()), &roster);
        let or = apply(&quincy.clone().or(late.clone()), &roster);
        let diff = apply(&quincy.clone().minus(late.clone()), &roster);

        let q: HashSet<usize> = apply(&quincy, &roster).into_iter().collect();
        let l: HashSet<usize> = apply(&late, &roster).into_iter().collect();
        let and: HashSet<usize> = and.into_iter().collect();
        let or: HashSet<usize> = or.into_iter().collect();
        let diff: HashSet<usize> = diff.into_iter().collect();

        assert_eq!(and, q.intersection(&l).copied().collect());
        assert_eq!(or, q.union(&l).copied().collect());
        assert_eq!(diff, q.difference(&l).copied().collect());
    }

    #[test]
    fn deep_trees_compose() {
        let roster = roster();
        let f = Filter::new([("dorm", "quincy")])
            .or(Filter::new([("dorm", "adams")]))
            .minus(Filter::new([("year", Predicate::Gt(2.into()))]))
            .and(Filter::any());
        let hits: HashSet<usize> = apply(&f, &roster).into_iter().collect();
        assert_eq!(hits, HashSet::from([0, 1, 3]));
    }

    #[test]
    fn display_renders_tree_shape() {
        let f = Filter::new([("dorm", "quincy")]).and(Filter::any());
        assert_eq!(f.to_string(), "({dorm = quincy} AND {})");
    }
}
