//! Goal compilers.
//!
//! Each compiler turns one declarative goal into indicator variables and
//! reward terms through the [`ModelBuilder`]. They all share a shape:
//! filter the relevant entities, emit a per-unit indicator, gate the units
//! into one `satisfied` indicator, require it (or the units) when the goal
//! is `required`, and attach the partial/net rewards.
//!
//! A compiler returns `Err` only when the goal cannot be interpreted at all
//! (a placement goal with students but no groups, a malformed pod goal);
//! the driver then abandons the whole goal set. Degenerate per-group
//! parameters merely log and skip that group.

use good_lp::Variable;

use crate::models::{
    Goal, GroupFilterParams, MaxSimilarParams, MinSimilarParams, MustMatchParams, PodParams,
};
use crate::solver::model::ModelBuilder;
use crate::solver::store::IndexedStore;

/// Compile one goal into the current model.
pub fn compile_goal(goal: &Goal, store: &IndexedStore, mb: &mut ModelBuilder) -> Result<(), String> {
    match goal {
        Goal::GroupFilter(p) => compile_group_filter(p, store, mb),
        Goal::MinSimilar(p) => compile_min_similar(p, store, mb),
        Goal::MaxSimilar(p) => compile_max_similar(p, store, mb),
        Goal::MustMatch(p) => compile_must_match(p, store, mb),
        Goal::Pod(p) => compile_pod(p, store, mb),
    }
}

fn compile_group_filter(
    p: &GroupFilterParams,
    store: &IndexedStore,
    mb: &mut ModelBuilder,
) -> Result<(), String> {
    let students = store.filter_students(p.student_filter.as_ref());
    if students.is_empty() {
        // nothing to place, nothing to reward
        return Ok(());
    }
    let groups = store.filter_groups(p.group_filter.as_ref());
    if groups.is_empty() {
        let shown = p
            .group_filter
            .as_ref()
            .map_or_else(|| "<all>".to_string(), |f| f.to_string());
        return Err(format!(
            "no groups match filter {}; impossible to place the matching students",
            shown
        ));
    }

    let mut placed_vars = Vec::with_capacity(students.len());
    for student in &students {
        let total = ModelBuilder::sum(groups.iter().map(|g| student.var(g.id)));
        let placed = mb.geq_indicator(total, 1.0);
        if p.required {
            mb.require_true(placed);
        }
        mb.reward_var(placed, p.partial_reward);
        placed_vars.push(placed);
    }

    let count = placed_vars.len() as f64;
    let satisfied = mb.geq_indicator(ModelBuilder::sum(placed_vars), count);
    mb.reward_var(satisfied, p.net_reward);
    Ok(())
}

fn compile_min_similar(
    p: &MinSimilarParams,
    store: &IndexedStore,
    mb: &mut ModelBuilder,
) -> Result<(), String> {
    let cohorts = store.students_sharing_property(&p.property_name);
    let groups = store.filter_groups(p.group_filter.as_ref());

    let mut sat_vars: Vec<Variable> = Vec::new();
    for group in &groups {
        let Some(cutoff) = p.min_similar.resolve_min(group.size) else {
            // no restriction for this group size
            continue;
        };
        if cutoff == 0 {
            let line = format!(
                "min-similar cutoff of 0 on property {} is meaningless; skipping group {}",
                p.property_name, group.id
            );
            log::warn!("{}", line);
            mb.logs.push(line);
            continue;
        }

        let mut cohort_vars = Vec::with_capacity(cohorts.len());
        for cohort in &cohorts {
            let total = ModelBuilder::sum(cohort.iter().map(|s| s.var(group.id)));
            cohort_vars.push(mb.geq_indicator(total, cutoff as f64));
        }
        let any_cohort = mb.geq_indicator(ModelBuilder::sum(cohort_vars), 1.0);
        // an empty group satisfies the goal trivially
        let group_ok = mb.or_indicator(any_cohort, group.not_in_use());
        mb.reward_var(group_ok, p.partial_reward);
        sat_vars.push(group_ok);
    }

    let count = sat_vars.len() as f64;
    let satisfied = mb.geq_indicator(ModelBuilder::sum(sat_vars), count);
    if p.required {
        mb.require_true(satisfied);
    }
    mb.reward_var(satisfied, p.net_reward);
    Ok(())
}

fn compile_max_similar(
    p: &MaxSimilarParams,
    store: &IndexedStore,
    mb: &mut ModelBuilder,
) -> Result<(), String> {
    let cohorts = store.students_sharing_property(&p.property_name);
    let groups = store.filter_groups(p.group_filter.as_ref());

    let mut violate_vars: Vec<Variable> = Vec::new();
    for group in &groups {
        let Some(cutoff) = p.max_similar.resolve_max(group.size) else {
            continue;
        };
        if cutoff == 0 || group.size.is_some_and(|s| cutoff > s) {
            let line = format!(
                "max-similar cutoff of {} cannot apply to group {} (property {}); skipping",
                cutoff, group.id, p.property_name
            );
            log::warn!("{}", line);
            mb.logs.push(line);
            continue;
        }

        let mut group_violates = Vec::with_capacity(cohorts.len());
        for cohort in &cohorts {
            let total = ModelBuilder::sum(cohort.iter().map(|s| s.var(group.id)));
            let violates = mb.geq_indicator(total, (cutoff + 1) as f64);
            group_violates.push(violates);
            violate_vars.push(violates);
        }
        let group_ok = mb.leq_indicator(ModelBuilder::sum(group_violates), 0.0);
        mb.reward_var(group_ok, p.partial_reward);
    }

    let satisfied = mb.leq_indicator(ModelBuilder::sum(violate_vars), 0.0);
    if p.required {
        mb.require_true(satisfied);
    }
    mb.reward_var(satisfied, p.net_reward);
    Ok(())
}

fn compile_must_match(
    p: &MustMatchParams,
    store: &IndexedStore,
    mb: &mut ModelBuilder,
) -> Result<(), String> {
    let students = store.filter_students(p.student_filter.as_ref());
    let groups = store.filter_groups(p.group_filter.as_ref());

    let mut matched_vars = Vec::new();
    for student in &students {
        let Some(student_val) = student.info.get(&p.student_property) else {
            continue;
        };
        let mut eligible = Vec::new();
        for group in &groups {
            let Some(group_val) = group.info.get(&p.group_property) else {
                continue;
            };
            let matches = group_val == student_val
                || group_val.is_wildcard()
                || student_val.is_wildcard();
            if matches {
                eligible.push(student.var(group.id));
            }
        }
        if eligible.is_empty() {
            // no group can ever match this student; leave them unconstrained
            continue;
        }

        let matched = mb.geq_indicator(ModelBuilder::sum(eligible), 1.0);
        if p.required {
            mb.require_true(matched);
        }
        mb.reward_var(matched, p.partial_reward);
        matched_vars.push(matched);
    }

    let count = matched_vars.len() as f64;
    let satisfied = mb.geq_indicator(ModelBuilder::sum(matched_vars), count);
    mb.reward_var(satisfied, p.net_reward);
    Ok(())
}

fn compile_pod(p: &PodParams, store: &IndexedStore, mb: &mut ModelBuilder) -> Result<(), String> {
    let pods = p.pods()?;
    let groups = store.all_groups();

    let mut pod_vars = Vec::with_capacity(pods.len());
    for pod_filter in &pods {
        let members = store.filter_students(Some(pod_filter));

        let mut together_vars = Vec::with_capacity(groups.len());
        for group in groups {
            let total = ModelBuilder::sum(members.iter().map(|s| s.var(group.id)));
            together_vars.push(mb.geq_indicator(total, members.len() as f64));
        }
        let pod_ok = mb.geq_indicator(ModelBuilder::sum(together_vars), 1.0);
        mb.reward_var(pod_ok, p.partial_reward);
        pod_vars.push(pod_ok);
    }

    let count = pod_vars.len() as f64;
    let satisfied = mb.geq_indicator(ModelBuilder::sum(pod_vars), count);
    if p.required {
        mb.require_true(satisfied);
    }
    mb.reward_var(satisfied, p.net_reward);
    Ok(())
}
