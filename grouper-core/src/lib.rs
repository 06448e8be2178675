//! # Grouper-Core: Goal-Driven Group Assignment Engine
//!
//! This crate assigns a roster of students to a roster of candidate groups
//! so that a prioritized list of goal sets is satisfied as completely as
//! possible. Each goal set is a conjunction of declarative goals — "all
//! honors students must land in an honors section", "no group may contain
//! more than three students sharing a dorm", "these four students must stay
//! together". The active goal set is compiled, together with the structural
//! group and student constraints, into an integer linear program; the ILP
//! backend solves it, and the chosen assignment is decoded back into a
//! group → students mapping. When the backend proves a goal set infeasible,
//! the next set in priority order is tried.
//!
//! ## Quick Example
//!
//! ```no_run
//! use grouper_core::models::{ApiInput, Goal, GroupFilterParams, PropMap};
//! use grouper_core::{create_groups, Filter};
//!
//! fn student(name: &str, honors: &str) -> PropMap {
//!     [
//!         ("name".to_string(), name.into()),
//!         ("honors".to_string(), honors.into()),
//!     ]
//!     .into_iter()
//!     .collect()
//! }
//!
//! let input = ApiInput {
//!     students: vec![student("ada", "y"), student("grace", "y"), student("linus", "n")],
//!     groups: vec![
//!         [("honors".to_string(), "y".into()), ("size".to_string(), 2.into())]
//!             .into_iter()
//!             .collect(),
//!         [("honors".to_string(), "n".into()), ("size".to_string(), 2.into())]
//!             .into_iter()
//!             .collect(),
//!     ],
//!     goal_sets: vec![vec![Goal::GroupFilter(GroupFilterParams {
//!         student_filter: Some(Filter::new([("honors", "y")])),
//!         group_filter: Some(Filter::new([("honors", "y")])),
//!         required: true,
//!         net_reward: 10.0,
//!         partial_reward: 1.0,
//!     })]],
//!     deterministic: true,
//! };
//!
//! match create_groups(&input) {
//!     Ok(outcome) => {
//!         for line in &outcome.logs {
//!             println!("{}", line);
//!         }
//!         if let Some(groups) = outcome.groups {
//!             for (i, group) in groups.iter().enumerate() {
//!                 println!("group {}: {} students", i + 1, group.students.len());
//!             }
//!         }
//!     }
//!     Err(e) => eprintln!("Error: {:?}", e),
//! }
//! ```
//!
//! ## How a goal becomes linear constraints
//!
//! Every (student, group) pair gets a 0/1 membership variable named
//! `membership_<sid>_<gid>`. Goal compilers express their semantics over
//! sums of those variables through auxiliary big-M indicators (threshold,
//! AND, OR) and attach reward variables that form the maximization
//! objective. Required goals pin their indicators to 1; optional goals only
//! contribute reward, so the solver trades them off.
//!
//! ## Choosing a backend
//!
//! The ILP backend is selected by cargo feature: `solver-microlp` (default,
//! bundled and pure Rust) or `solver-highs` (faster on large problems,
//! needs the HiGHS native build). Only a solution the backend reports as
//! *optimal* is accepted; anything else falls through to the next goal set.

pub mod filter;
pub mod models;
pub mod solver;

pub use filter::Filter;
pub use models::{ApiInput, Goal, GroupingOutcome, PlacedGroup, Predicate, PropValue, WILDCARD};
pub use solver::GrouperError;

/// Assign students to groups under the input's prioritized goal sets.
///
/// This is the main entry point for the grouper-core library. The input
/// carries both rosters as property maps, the goal sets in descending
/// priority, and the determinism switch (nondeterministic runs shuffle both
/// rosters so the solver breaks ties differently between runs).
///
/// # Returns
///
/// - `Ok(outcome)` with `outcome.groups == Some(..)` when some goal set was
///   satisfied: one bucket per candidate group in id order, the collected
///   reward, and the zero-based index of the winning set.
/// - `Ok(outcome)` with `outcome.groups == None` when every goal set was
///   too strict; `outcome.logs` explains each failure.
/// - `Err(GrouperError)` when the input itself is invalid (either roster
///   exceeding the population ceiling of 500).
///
/// # Errors
///
/// Only input validation produces an error. Goal-set infeasibility is part
/// of normal operation and is reported through the outcome instead.
pub fn create_groups(input: &ApiInput) -> Result<GroupingOutcome, GrouperError> {
    solver::run(input)
}
