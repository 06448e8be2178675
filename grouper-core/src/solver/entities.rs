//! Students and groups as ILP entities.
//!
//! Entities pair the immutable property maps from the API with the
//! membership variables of one solve attempt. Variables belong to a single
//! problem pot, so entities are rebuilt (with the same ids) for every fresh
//! maximization problem.

use good_lp::{constraint, Variable};
use std::collections::HashMap;

use crate::models::PropMap;
use crate::solver::model::ModelBuilder;
use crate::solver::store::HasInfo;

/// A student with one membership variable per candidate group.
/// Exactly one of them is 1 in any feasible solution.
pub struct Student {
    /// 1-based id, assigned in roster order.
    pub id: u32,
    /// The student's property map.
    pub info: PropMap,
    memberships: Vec<Variable>,
    var_by_group: HashMap<u32, Variable>,
}

impl Student {
    /// The membership variable tying this student to group `gid`.
    pub fn var(&self, gid: u32) -> Variable {
        self.var_by_group[&gid]
    }

    /// Structural constraint: the student lands in exactly one group.
    pub fn gen_constraints(&self, mb: &mut ModelBuilder) {
        let total = ModelBuilder::sum(self.memberships.iter().copied());
        mb.push_constraint(constraint!(total == 1.0));
    }
}

impl HasInfo for Student {
    fn info(&self) -> &PropMap {
        &self.info
    }
}

/// A candidate group with its size bounds and not-in-use indicator.
pub struct Group {
    /// 1-based id, assigned in roster order after zero-size groups drop out.
    pub id: u32,
    /// The group's property map.
    pub info: PropMap,
    /// Hard upper bound on membership, when the info map carries `size`.
    pub size: Option<u32>,
    /// Hard lower bound when the group is used, from `minsize`.
    pub minsize: Option<u32>,
    memberships: Vec<Variable>,
    not_in_use: Variable,
}

impl Group {
    /// The indicator that is 1 iff this group ends up empty.
    pub fn not_in_use(&self) -> Variable {
        self.not_in_use
    }

    /// Structural constraints: the size bounds, plus the binding that ties
    /// the not-in-use indicator to an empty membership sum.
    pub fn gen_constraints(&self, mb: &mut ModelBuilder) {
        let total = ModelBuilder::sum(self.memberships.iter().copied());
        if let Some(size) = self.size {
            mb.push_constraint(constraint!(total.clone() <= size as f64));
        }
        if let Some(minsize) = self.minsize {
            if minsize > 0 {
                mb.push_constraint(constraint!(total.clone() >= minsize as f64));
            }
        }
        mb.bind_leq(self.not_in_use, total, 0.0);
    }
}

impl HasInfo for Group {
    fn info(&self) -> &PropMap {
        &self.info
    }
}

/// Build both entity populations for one attempt.
///
/// Groups with `size == 0` are dropped before id assignment; remaining
/// groups get ids 1..G and students ids 1..S, both in input order.
/// Membership variables are created in lockstep and registered with the
/// builder under their `membership_<sid>_<gid>` names.
pub fn build_entities(
    student_infos: &[PropMap],
    group_infos: &[PropMap],
    mb: &mut ModelBuilder,
) -> (Vec<Student>, Vec<Group>) {
    let mut groups: Vec<Group> = Vec::new();
    for info in group_infos {
        let size = info.get("size").and_then(|v| v.as_nonneg_int());
        if size == Some(0) {
            continue;
        }
        let id = groups.len() as u32 + 1;
        let minsize = info.get("minsize").and_then(|v| v.as_nonneg_int());
        let not_in_use = mb.binary(format!("notinuse_{}", id));
        groups.push(Group {
            id,
            info: info.clone(),
            size,
            minsize,
            memberships: Vec::new(),
            not_in_use,
        });
    }

    let mut students: Vec<Student> = Vec::new();
    for (i, info) in student_infos.iter().enumerate() {
        let sid = i as u32 + 1;
        let mut memberships = Vec::with_capacity(groups.len());
        let mut var_by_group = HashMap::with_capacity(groups.len());
        for group in groups.iter_mut() {
            let var = mb.membership(sid, group.id);
            memberships.push(var);
            var_by_group.insert(group.id, var);
            group.memberships.push(var);
        }
        students.push(Student {
            id: sid,
            info: info.clone(),
            memberships,
            var_by_group,
        });
    }

    (students, groups)
}
