//! The indexed entity store.
//!
//! Holds both populations together with a two-level property index
//! (property → value → entities) built once per solve attempt. Filters
//! evaluate against the index; similarity goals read whole value-cohorts
//! from it.

use std::collections::HashMap;

use crate::filter::Filter;
use crate::models::{PropMap, PropValue};
use crate::solver::entities::{Group, Student};

/// Anything carrying a property map. Students, groups, and (in tests) raw
/// property maps all qualify.
pub trait HasInfo {
    /// The entity's property dictionary.
    fn info(&self) -> &PropMap;
}

impl HasInfo for PropMap {
    fn info(&self) -> &PropMap {
        self
    }
}

/// Property index for one population: for each property, the value buckets
/// in first-seen order, each holding entity indices in insertion order.
///
/// Buckets are an association list rather than a map so that cohort
/// enumeration is deterministic across runs.
pub type PropIndex = HashMap<String, Vec<(PropValue, Vec<usize>)>>;

/// Index a population by every property it carries.
pub(crate) fn build_index<E: HasInfo>(entities: &[E]) -> PropIndex {
    let mut index = PropIndex::new();
    for (i, entity) in entities.iter().enumerate() {
        for (prop, value) in entity.info() {
            let buckets = index.entry(prop.clone()).or_default();
            match buckets.iter_mut().find(|(v, _)| v == value) {
                Some((_, bucket)) => bucket.push(i),
                None => buckets.push((value.clone(), vec![i])),
            }
        }
    }
    index
}

/// Both populations plus their property indexes, read-only after build.
pub struct IndexedStore {
    students: Vec<Student>,
    groups: Vec<Group>,
    student_index: PropIndex,
    group_index: PropIndex,
}

impl IndexedStore {
    /// Build the store and its indexes from freshly constructed entities.
    pub fn new(students: Vec<Student>, groups: Vec<Group>) -> Self {
        let student_index = build_index(&students);
        let group_index = build_index(&groups);
        IndexedStore {
            students,
            groups,
            student_index,
            group_index,
        }
    }

    /// Every student, in id order.
    pub fn all_students(&self) -> &[Student] {
        &self.students
    }

    /// Every group, in id order.
    pub fn all_groups(&self) -> &[Group] {
        &self.groups
    }

    /// Students matching the filter; all of them when no filter is given.
    pub fn filter_students(&self, filter: Option<&Filter>) -> Vec<&Student> {
        match filter {
            None => self.students.iter().collect(),
            Some(f) => f
                .apply(&self.student_index, &self.students)
                .into_iter()
                .map(|i| &self.students[i])
                .collect(),
        }
    }

    /// Groups matching the filter; all of them when no filter is given.
    pub fn filter_groups(&self, filter: Option<&Filter>) -> Vec<&Group> {
        match filter {
            None => self.groups.iter().collect(),
            Some(f) => f
                .apply(&self.group_index, &self.groups)
                .into_iter()
                .map(|i| &self.groups[i])
                .collect(),
        }
    }

    /// The value-cohorts for one student property: one list of students per
    /// distinct value present, in first-seen order. Empty when no student
    /// carries the property.
    pub fn students_sharing_property(&self, property: &str) -> Vec<Vec<&Student>> {
        self.student_index
            .get(property)
            .map(|buckets| {
                buckets
                    .iter()
                    .map(|(_, idxs)| idxs.iter().map(|&i| &self.students[i]).collect())
                    .collect()
            })
            .unwrap_or_default()
    }
}
