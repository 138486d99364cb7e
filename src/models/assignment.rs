//! Qualification assignment model.
//!
//! The assignment is the sole mutable artifact of an optimization run: a
//! mapping from technician to the ordered set of qualification codes they
//! hold. It is constructed by the optimizer, repaired iteratively, and
//! re-evaluated in full by the coverage oracle after every mutation.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::{Roster, SkillRole, TaskCatalog};

/// A role-compatibility breach: a technician holding a qualification whose
/// code maps to the other role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleViolation {
    /// Offending technician.
    pub technician_id: String,
    /// Technician's own role.
    pub technician_role: SkillRole,
    /// Held qualification code.
    pub qualification: String,
    /// Role the qualification actually requires.
    pub required_role: SkillRole,
}

/// Mapping from technician to held qualification codes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    by_technician: BTreeMap<String, BTreeSet<String>>,
}

impl Assignment {
    /// Creates an empty assignment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an assignment with an empty qualification set for every
    /// active technician in the roster.
    pub fn for_roster(roster: &Roster) -> Self {
        let by_technician = roster
            .active()
            .map(|t| (t.id.clone(), BTreeSet::new()))
            .collect();
        Self { by_technician }
    }

    /// Grants a qualification. Returns `true` if it was newly added.
    pub fn grant(&mut self, technician_id: &str, qualification: &str) -> bool {
        self.by_technician
            .entry(technician_id.to_string())
            .or_default()
            .insert(qualification.to_string())
    }

    /// Revokes a qualification. Returns `true` if it was held.
    pub fn revoke(&mut self, technician_id: &str, qualification: &str) -> bool {
        self.by_technician
            .get_mut(technician_id)
            .map(|q| q.remove(qualification))
            .unwrap_or(false)
    }

    /// Whether a technician holds a qualification.
    pub fn holds(&self, technician_id: &str, qualification: &str) -> bool {
        self.by_technician
            .get(technician_id)
            .map(|q| q.contains(qualification))
            .unwrap_or(false)
    }

    /// Qualifications held by a technician.
    pub fn qualifications(&self, technician_id: &str) -> Option<&BTreeSet<String>> {
        self.by_technician.get(technician_id)
    }

    /// Number of qualifications held by a technician.
    pub fn qualification_count(&self, technician_id: &str) -> usize {
        self.by_technician
            .get(technician_id)
            .map(BTreeSet::len)
            .unwrap_or(0)
    }

    /// Technician ids holding a qualification, in sorted order.
    pub fn holders(&self, qualification: &str) -> Vec<&str> {
        self.by_technician
            .iter()
            .filter(|(_, quals)| quals.contains(qualification))
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Number of technicians holding a qualification.
    pub fn holder_count(&self, qualification: &str) -> usize {
        self.by_technician
            .values()
            .filter(|quals| quals.contains(qualification))
            .count()
    }

    /// Iterates (technician id, qualification set) pairs in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.by_technician.iter().map(|(id, q)| (id.as_str(), q))
    }

    /// Technician ids present in the assignment.
    pub fn technician_ids(&self) -> impl Iterator<Item = &str> {
        self.by_technician.keys().map(String::as_str)
    }

    /// Distinct qualification codes held by anyone.
    pub fn held_qualifications(&self) -> BTreeSet<&str> {
        self.by_technician
            .values()
            .flat_map(|quals| quals.iter().map(String::as_str))
            .collect()
    }

    /// Asset ids a technician is qualified on, derived via the catalog.
    pub fn assets_for(&self, technician_id: &str, catalog: &TaskCatalog) -> BTreeSet<String> {
        self.by_technician
            .get(technician_id)
            .map(|quals| {
                quals
                    .iter()
                    .filter_map(|q| catalog.asset_of_qualification(q))
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Total grants across all technicians.
    pub fn total_grants(&self) -> usize {
        self.by_technician.values().map(BTreeSet::len).sum()
    }

    /// Checks the role-compatibility invariant against a qualification →
    /// role mapping. Qualifications absent from the mapping are ignored
    /// (the requirement model reports those separately).
    pub fn role_violations(
        &self,
        roster: &Roster,
        role_of: &BTreeMap<String, SkillRole>,
    ) -> Vec<RoleViolation> {
        let mut violations = Vec::new();
        for (id, quals) in &self.by_technician {
            let Some(technician) = roster.get(id) else {
                continue;
            };
            for qual in quals {
                if let Some(&required) = role_of.get(qual) {
                    if required != technician.role {
                        violations.push(RoleViolation {
                            technician_id: id.clone(),
                            technician_role: technician.role,
                            qualification: qual.clone(),
                            required_role: required,
                        });
                    }
                }
            }
        }
        violations
    }
}
