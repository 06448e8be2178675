//! Data models and types for the grouper-core API.
//!
//! This module contains the public data structures used to define an
//! assignment problem (students, candidate groups, goal sets), and the
//! outcome returned after solving. The API is designed to be serializable
//! (JSON/YAML) for easy integration with command-line tools and services.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::filter::Filter;

/// The wildcard sentinel. A property whose value is `"*"` participates in
/// every value-based candidate set for that property, and matches any
/// opposing value in a [`Goal::MustMatch`] comparison.
pub const WILDCARD: &str = "*";

/// A property value carried by a student or group: a string or a number.
///
/// Values are compared for equality across the whole API (filters, indexes,
/// must-match goals). Ordering is only defined between two numbers or two
/// strings; mixed-type comparisons yield no ordering and simply fail the
/// predicate instead of panicking.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropValue {
    /// A numeric value. Integers and floats share this representation.
    Num(f64),
    /// A string value. `"*"` is the wildcard.
    Str(String),
}

impl PropValue {
    /// True when this value is the `"*"` wildcard.
    pub fn is_wildcard(&self) -> bool {
        matches!(self, PropValue::Str(s) if s == WILDCARD)
    }

    /// The value as a nonnegative integer, when it is one.
    /// Used to read the distinguished `size`/`minsize` group properties.
    pub fn as_nonneg_int(&self) -> Option<u32> {
        match self {
            PropValue::Num(n) if *n >= 0.0 && n.fract() == 0.0 && *n <= u32::MAX as f64 => {
                Some(*n as u32)
            }
            _ => None,
        }
    }

    /// Ordering against another value, if one is defined.
    pub fn compare(&self, other: &PropValue) -> Option<Ordering> {
        match (self, other) {
            (PropValue::Num(a), PropValue::Num(b)) => a.partial_cmp(b),
            (PropValue::Str(a), PropValue::Str(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropValue::Num(a), PropValue::Num(b)) => a == b,
            (PropValue::Str(a), PropValue::Str(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for PropValue {}

impl Hash for PropValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            PropValue::Num(n) => {
                // normalize -0.0 so it hashes like 0.0
                let n = if *n == 0.0 { 0.0 } else { *n };
                0u8.hash(state);
                n.to_bits().hash(state);
            }
            PropValue::Str(s) => {
                1u8.hash(state);
                s.hash(state);
            }
        }
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Num(n) => write!(f, "{}", n),
            PropValue::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for PropValue {
    fn from(s: &str) -> Self {
        PropValue::Str(s.to_string())
    }
}

impl From<String> for PropValue {
    fn from(s: String) -> Self {
        PropValue::Str(s)
    }
}

impl From<f64> for PropValue {
    fn from(n: f64) -> Self {
        PropValue::Num(n)
    }
}

impl From<i32> for PropValue {
    fn from(n: i32) -> Self {
        PropValue::Num(n as f64)
    }
}

impl From<u32> for PropValue {
    fn from(n: u32) -> Self {
        PropValue::Num(n as f64)
    }
}

/// The property dictionary carried by every student and group.
pub type PropMap = HashMap<String, PropValue>;

/// A leaf-level predicate applied to a single property.
///
/// A bare value means equality; the `From` conversions give the same
/// ergonomics in Rust code (`Predicate::from("honors")`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// The property equals this value (wildcard entities also match).
    Equals(PropValue),
    /// The property equals one of these values (wildcard entities also match).
    IsIn(Vec<PropValue>),
    /// The property equals none of these values.
    NotIn(Vec<PropValue>),
    /// The property differs from this value.
    IsNot(PropValue),
    /// Numeric/string `<` comparison. Entities without the property never match.
    Lt(PropValue),
    /// `<=` comparison.
    Lte(PropValue),
    /// `>` comparison.
    Gt(PropValue),
    /// `>=` comparison.
    Gte(PropValue),
}

impl From<PropValue> for Predicate {
    fn from(v: PropValue) -> Self {
        Predicate::Equals(v)
    }
}

impl From<&str> for Predicate {
    fn from(v: &str) -> Self {
        Predicate::Equals(v.into())
    }
}

impl From<String> for Predicate {
    fn from(v: String) -> Self {
        Predicate::Equals(v.into())
    }
}

impl From<f64> for Predicate {
    fn from(v: f64) -> Self {
        Predicate::Equals(v.into())
    }
}

impl From<i32> for Predicate {
    fn from(v: i32) -> Self {
        Predicate::Equals(v.into())
    }
}

impl From<u32> for Predicate {
    fn from(v: u32) -> Self {
        Predicate::Equals(v.into())
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list(f: &mut fmt::Formatter<'_>, vs: &[PropValue]) -> fmt::Result {
            for (i, v) in vs.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", v)?;
            }
            Ok(())
        }
        match self {
            Predicate::Equals(v) => write!(f, "= {}", v),
            Predicate::IsIn(vs) => {
                write!(f, "in [")?;
                list(f, vs)?;
                write!(f, "]")
            }
            Predicate::NotIn(vs) => {
                write!(f, "not in [")?;
                list(f, vs)?;
                write!(f, "]")
            }
            Predicate::IsNot(v) => write!(f, "!= {}", v),
            Predicate::Lt(v) => write!(f, "< {}", v),
            Predicate::Lte(v) => write!(f, "<= {}", v),
            Predicate::Gt(v) => write!(f, "> {}", v),
            Predicate::Gte(v) => write!(f, ">= {}", v),
        }
    }
}

/// Similarity cutoff for [`Goal::MinSimilar`] / [`Goal::MaxSimilar`]: either
/// one scalar for every group, or a mapping from group size to scalar.
///
/// The scalar `-1` is a placeholder meaning "derive from the group". Note
/// the asymmetry: the minimum-similarity reading substitutes the group's
/// `size`, while the maximum-similarity reading substitutes `1` (nobody
/// similar).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SimilarCutoff {
    /// The same cutoff for every group (`-1` = placeholder).
    Uniform(i64),
    /// Per-group-size cutoffs; groups whose size is absent are unrestricted.
    BySize(HashMap<u32, i64>),
}

impl Default for SimilarCutoff {
    fn default() -> Self {
        SimilarCutoff::Uniform(Self::PLACEHOLDER)
    }
}

impl SimilarCutoff {
    const PLACEHOLDER: i64 = -1;

    /// Raw cutoff for a group of the given size. `None` = no restriction.
    fn raw(&self, group_size: Option<u32>) -> Option<i64> {
        match self {
            SimilarCutoff::Uniform(v) => Some(*v),
            SimilarCutoff::BySize(by_size) => {
                group_size.and_then(|s| by_size.get(&s).copied())
            }
        }
    }

    /// Cutoff under minimum-similarity rules: the placeholder becomes the
    /// group's size (unrestricted when the group has none).
    pub(crate) fn resolve_min(&self, group_size: Option<u32>) -> Option<u32> {
        match self.raw(group_size)? {
            Self::PLACEHOLDER => group_size,
            v if v >= 0 => Some(v as u32),
            _ => Some(0),
        }
    }

    /// Cutoff under maximum-similarity rules: the placeholder becomes 1.
    pub(crate) fn resolve_max(&self, group_size: Option<u32>) -> Option<u32> {
        match self.raw(group_size)? {
            Self::PLACEHOLDER => Some(1),
            v if v >= 0 => Some(v as u32),
            _ => Some(0),
        }
    }
}

/// Default for the `required` flag on every goal.
fn default_required() -> bool {
    true
}

/// A declarative goal. Goals in one goal set are implicitly conjoined.
///
/// All goals share three knobs:
/// - `required`: the goal must hold in any accepted solution,
/// - `net_reward`: awarded once when the goal is fully satisfied,
/// - `partial_reward`: awarded per satisfied unit (student, group, or pod).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Goal {
    /// Place every student matching `student_filter` into some group
    /// matching `group_filter`.
    GroupFilter(GroupFilterParams),
    /// Every relevant group must contain at least `min_similar` students
    /// sharing the same value of `property_name` (empty groups pass).
    MinSimilar(MinSimilarParams),
    /// No relevant group may contain more than `max_similar` students
    /// sharing the same value of `property_name`.
    MaxSimilar(MaxSimilarParams),
    /// Every relevant student must land in a relevant group where
    /// `student[student_property] == group[group_property]` (wildcards match).
    MustMatch(MustMatchParams),
    /// Each pod of students must end up in one group together.
    Pod(PodParams),
}

/// Parameters for [`Goal::GroupFilter`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupFilterParams {
    /// Selects the relevant students (absent = all).
    #[serde(default)]
    pub student_filter: Option<Filter>,
    /// Selects the preferable groups (absent = all).
    #[serde(default)]
    pub group_filter: Option<Filter>,
    /// Fail the goal set unless every relevant student is placed.
    #[serde(default = "default_required")]
    pub required: bool,
    /// Awarded when all relevant students are placed.
    #[serde(default)]
    pub net_reward: f64,
    /// Awarded per placed student.
    #[serde(default)]
    pub partial_reward: f64,
}

/// Parameters for [`Goal::MinSimilar`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinSimilarParams {
    /// Selects the relevant groups (absent = all).
    #[serde(default)]
    pub group_filter: Option<Filter>,
    /// The property whose shared values define similarity cohorts.
    pub property_name: String,
    /// Minimum cohort presence per group; see [`SimilarCutoff`].
    #[serde(default)]
    pub min_similar: SimilarCutoff,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default)]
    pub net_reward: f64,
    #[serde(default)]
    pub partial_reward: f64,
}

/// Parameters for [`Goal::MaxSimilar`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaxSimilarParams {
    /// Selects the relevant groups (absent = all).
    #[serde(default)]
    pub group_filter: Option<Filter>,
    /// The property whose shared values define similarity cohorts.
    pub property_name: String,
    /// Maximum cohort presence per group; see [`SimilarCutoff`].
    #[serde(default)]
    pub max_similar: SimilarCutoff,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default)]
    pub net_reward: f64,
    #[serde(default)]
    pub partial_reward: f64,
}

/// Parameters for [`Goal::MustMatch`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MustMatchParams {
    /// Selects the relevant groups (absent = all).
    #[serde(default)]
    pub group_filter: Option<Filter>,
    /// The group-side property compared for the match.
    pub group_property: String,
    /// Selects the relevant students (absent = all).
    #[serde(default)]
    pub student_filter: Option<Filter>,
    /// The student-side property compared for the match.
    pub student_property: String,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default)]
    pub net_reward: f64,
    #[serde(default)]
    pub partial_reward: f64,
}

/// Parameters for [`Goal::Pod`]. Exactly one of `student_filter` (a single
/// pod) or `student_filters` (a list of pods) must be given.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodParams {
    /// A single pod of students to keep together.
    #[serde(default)]
    pub student_filter: Option<Filter>,
    /// Several pods, each kept together independently.
    #[serde(default)]
    pub student_filters: Option<Vec<Filter>>,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default)]
    pub net_reward: f64,
    #[serde(default)]
    pub partial_reward: f64,
}

impl PodParams {
    /// The pods as a list, whichever form was given.
    pub(crate) fn pods(&self) -> Result<Vec<&Filter>, String> {
        match (&self.student_filter, &self.student_filters) {
            (Some(_), Some(_)) => {
                Err("pod goal takes either student_filter or student_filters, not both".into())
            }
            (None, None) => {
                Err("pod goal needs student_filter or student_filters".into())
            }
            (Some(f), None) => Ok(vec![f]),
            (None, Some(fs)) => Ok(fs.iter().collect()),
        }
    }
}

/// Complete input for one solve: the rosters, the prioritized goal sets,
/// and the determinism switch.
///
/// # Example
///
/// ```no_run
/// use grouper_core::models::{ApiInput, Goal, GroupFilterParams};
/// use grouper_core::Filter;
///
/// let input = ApiInput::new(
///     vec![
///         [("name".to_string(), "ada".into())].into_iter().collect(),
///         [("name".to_string(), "grace".into())].into_iter().collect(),
///     ],
///     vec![[("size".to_string(), 2.into())].into_iter().collect()],
/// )
/// .with_goal_set(vec![Goal::GroupFilter(GroupFilterParams {
///     student_filter: Some(Filter::new([("name", "ada")])),
///     group_filter: None,
///     required: true,
///     net_reward: 10.0,
///     partial_reward: 0.0,
/// })]);
///
/// let outcome = grouper_core::create_groups(&input)?;
/// println!("placed into {} groups", outcome.groups.map_or(0, |g| g.len()));
/// # Ok::<(), grouper_core::GrouperError>(())
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiInput {
    /// The students to place, as property maps.
    pub students: Vec<PropMap>,
    /// The candidate groups. `size` bounds membership from above; a nonzero
    /// `minsize` bounds it from below whenever the group is used.
    pub groups: Vec<PropMap>,
    /// Goal sets in descending priority. The first set the solver proves
    /// feasible wins. Empty = one unconstrained set.
    #[serde(default)]
    pub goal_sets: Vec<Vec<Goal>>,
    /// When true, inputs are not shuffled and repeated runs produce the
    /// same assignment (modulo solver internals).
    #[serde(default)]
    pub deterministic: bool,
}

impl ApiInput {
    /// A problem over the given rosters with no goals yet.
    pub fn new(students: Vec<PropMap>, groups: Vec<PropMap>) -> Self {
        ApiInput {
            students,
            groups,
            goal_sets: Vec::new(),
            deterministic: false,
        }
    }

    /// Append one student.
    pub fn with_student(mut self, student: PropMap) -> Self {
        self.students.push(student);
        self
    }

    /// Append one empty group.
    pub fn with_group(mut self, group: PropMap) -> Self {
        self.groups.push(group);
        self
    }

    /// Append a goal set at the lowest priority so far.
    pub fn with_goal_set(mut self, goals: Vec<Goal>) -> Self {
        self.goal_sets.push(goals);
        self
    }

    /// Toggle deterministic mode.
    pub fn set_deterministic(&mut self, deterministic: bool) {
        self.deterministic = deterministic;
    }
}

/// One group bucket in a successful outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedGroup {
    /// The group's original property map.
    pub info: PropMap,
    /// The property maps of the students placed here (empty when unused).
    pub students: Vec<PropMap>,
}

/// The result of a solve.
///
/// On success `groups` holds one bucket per candidate group in id order,
/// `reward` the objective value, and `goal_set` the zero-based index of the
/// goal set that succeeded. When every goal set fails, `groups` is `None`
/// and `logs` explains why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupingOutcome {
    /// The assignment, or `None` when every goal set was too strict.
    pub groups: Option<Vec<PlacedGroup>>,
    /// Total reward collected by the winning goal set.
    pub reward: Option<f64>,
    /// Zero-based index of the goal set that was satisfied.
    pub goal_set: Option<usize>,
    /// Human-readable progress and diagnostic lines, in order.
    pub logs: Vec<String>,
}
