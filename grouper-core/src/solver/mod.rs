//! The solve-and-decode driver.
//!
//! For each goal set in priority order the driver builds a fresh
//! maximization problem (structural constraints plus the compiled goals),
//! hands it to the ILP backend, and accepts the first set the backend
//! proves optimal. The chosen assignment is decoded back into group
//! buckets through the `membership_<sid>_<gid>` variable names.

pub mod entities;
pub mod goals;
pub mod model;
pub mod store;

use rand::seq::SliceRandom;
use serde::Serialize;
use thiserror::Error;

use good_lp::{Solution, SolutionStatus, SolverModel};

#[cfg(feature = "solver-highs")]
use good_lp::solvers::highs::highs as default_solver;
#[cfg(all(not(feature = "solver-highs"), feature = "solver-microlp"))]
use good_lp::solvers::microlp::microlp as default_solver;

use crate::models::{ApiInput, Goal, GroupingOutcome, PlacedGroup, PropMap};
use self::entities::build_entities;
use self::model::{CompiledProblem, ModelBuilder};
use self::store::IndexedStore;

/// Hard ceiling on either population. Also keeps every membership sum far
/// below the big-M constant used by the indicator linearizations.
pub const MAX_POPULATION: usize = 500;

/// Errors that abort a whole invocation (goal-set failures do not; they
/// fall through to the next set and end up in the outcome's logs).
#[derive(Error, Debug, Serialize)]
pub enum GrouperError {
    /// The input failed up-front validation.
    #[error("validation error: {0}")]
    ValidationError(String),
}

pub(crate) fn run(input: &ApiInput) -> Result<GroupingOutcome, GrouperError> {
    if input.students.len() > MAX_POPULATION || input.groups.len() > MAX_POPULATION {
        return Err(GrouperError::ValidationError(format!(
            "you cannot have more than {} students or groups",
            MAX_POPULATION
        )));
    }

    let mut students = input.students.clone();
    let mut groups = input.groups.clone();
    if !input.deterministic {
        let mut rng = rand::rng();
        students.shuffle(&mut rng);
        groups.shuffle(&mut rng);
    }

    let default_sets = vec![Vec::new()];
    let goal_sets: &[Vec<Goal>] = if input.goal_sets.is_empty() {
        &default_sets
    } else {
        &input.goal_sets
    };

    let mut logs = Vec::new();
    for (i, goals) in goal_sets.iter().enumerate() {
        if let Some((placed, reward)) = attempt(&students, &groups, goals, i, &mut logs) {
            logs.push(format!("goal set {} was satisfied", i));
            return Ok(GroupingOutcome {
                groups: Some(placed),
                reward: Some(reward),
                goal_set: Some(i),
                logs,
            });
        }
    }

    logs.push("every goal set was too strict; no groups could be created".to_string());
    Ok(GroupingOutcome {
        groups: None,
        reward: None,
        goal_set: None,
        logs,
    })
}

/// Compile and solve one goal set. `None` means the set failed (the reason
/// was appended to `logs`) and the driver should try the next one.
fn attempt(
    student_infos: &[PropMap],
    group_infos: &[PropMap],
    goals: &[Goal],
    set_index: usize,
    logs: &mut Vec<String>,
) -> Option<(Vec<PlacedGroup>, f64)> {
    let mut mb = ModelBuilder::new();
    let (students, groups) = build_entities(student_infos, group_infos, &mut mb);
    let store = IndexedStore::new(students, groups);

    for student in store.all_students() {
        student.gen_constraints(&mut mb);
    }
    for group in store.all_groups() {
        group.gen_constraints(&mut mb);
    }

    for goal in goals {
        if let Err(reason) = goals::compile_goal(goal, &store, &mut mb) {
            logs.extend(std::mem::take(&mut mb.logs));
            logs.push(format!(
                "goal set {} could not be compiled: {}; trying the next goal set",
                set_index, reason
            ));
            return None;
        }
    }

    let CompiledProblem {
        vars,
        constraints,
        objective,
        memberships,
        logs: compile_logs,
    } = mb.finish();
    logs.extend(compile_logs);

    let mut problem = vars.maximise(objective.clone()).using(default_solver);
    for c in constraints {
        problem = problem.with(c);
    }

    match problem.solve() {
        Ok(sol) if matches!(sol.status(), SolutionStatus::Optimal) => {
            let reward = sol.eval(objective);
            let placed = decode(&store, &memberships, |var| sol.value(var));
            Some((placed, reward))
        }
        Ok(_) => {
            logs.push(format!(
                "goal set {} was not solved to proven optimality; trying the next goal set",
                set_index
            ));
            None
        }
        Err(e) => {
            log::debug!("goal set {} solve failed: {}", set_index, e);
            logs.push(format!(
                "goal set {} was too strict; trying the next goal set",
                set_index
            ));
            None
        }
    }
}

/// Turn the solved membership variables back into group buckets, in group-id
/// order. Unused groups keep an empty student list; variable names that do
/// not parse as `membership_<sid>_<gid>` are ignored.
fn decode(
    store: &IndexedStore,
    memberships: &[(String, good_lp::Variable)],
    value_of: impl Fn(good_lp::Variable) -> f64,
) -> Vec<PlacedGroup> {
    let mut buckets: Vec<PlacedGroup> = store
        .all_groups()
        .iter()
        .map(|g| PlacedGroup {
            info: g.info.clone(),
            students: Vec::new(),
        })
        .collect();

    for (name, var) in memberships {
        if value_of(*var) < 0.5 {
            continue;
        }
        let Some((sid, gid)) = decode_var_name(name) else {
            continue;
        };
        let student = store.all_students().get(sid as usize - 1);
        let bucket = buckets.get_mut(gid as usize - 1);
        if let (Some(student), Some(bucket)) = (student, bucket) {
            bucket.students.push(student.info.clone());
        }
    }
    buckets
}

/// Parse `membership_<sid>_<gid>` back into its identifiers.
fn decode_var_name(name: &str) -> Option<(u32, u32)> {
    let mut parts = name.split('_');
    if parts.next() != Some("membership") {
        return None;
    }
    let sid: u32 = parts.next()?.parse().ok()?;
    let gid: u32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || sid == 0 || gid == 0 {
        return None;
    }
    Some((sid, gid))
}
