//! Coverage requirement model.
//!
//! Derives, from the task catalog, what every asset/role combination
//! demands of an assignment:
//!
//! - **Daily** work for a role on an asset must all fit into the single
//!   early-shift maintenance window, split across technicians working in
//!   parallel: required head-count = ceil(total duration / window length),
//!   raised to any explicit crew size on the task sheets. A zero-duration
//!   group requires nobody and is excluded entirely.
//! - **Weekly** and **Monthly** tasks each need one technician; their
//!   window semantics live in the oracle.
//!
//! Also derives the qualification → role mapping and reports conflicts
//! (the same code seen with both roles). First-seen role wins; conflicts
//! are surfaced for operator review, never silently resolved.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use crate::models::{Periodicity, SkillRole, TaskCatalog};

/// Head-count requirement for an asset/role's Daily task group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRequirement {
    /// Asset under maintenance.
    pub asset_id: String,
    /// Required skill role.
    pub role: SkillRole,
    /// Simultaneous technicians required in the early window.
    pub required: u32,
    /// Total daily workload for the group, in hours.
    pub total_hours: f64,
    /// Task ids in the group.
    pub task_ids: Vec<String>,
    /// Qualification codes covering the group.
    pub qualifications: Vec<String>,
}

/// A Weekly or Monthly task needing one qualified technician inside its
/// periodicity window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowRequirement {
    /// Task id.
    pub task_id: String,
    /// Asset under maintenance.
    pub asset_id: String,
    /// Required skill role.
    pub role: SkillRole,
    /// Qualification code.
    pub qualification: String,
}

/// The same qualification code seen with two different roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleConflict {
    /// Conflicting code.
    pub qualification: String,
    /// Role kept (first seen).
    pub kept: SkillRole,
    /// Role rejected.
    pub rejected: SkillRole,
    /// Task that carried the rejected role.
    pub task_id: String,
}

/// Derived coverage requirements for one team's catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequirementModel {
    /// Early-window length in hours used for the Daily derivation.
    pub window_hours: f64,
    /// Daily groups with a non-zero requirement, sorted by (asset, role).
    pub daily: Vec<DailyRequirement>,
    /// Weekly tasks, in catalog order.
    pub weekly: Vec<WindowRequirement>,
    /// Monthly tasks, in catalog order.
    pub monthly: Vec<WindowRequirement>,
    /// Qualification → role mapping (first-seen role wins).
    pub role_of: BTreeMap<String, SkillRole>,
    /// Conflicts found while building `role_of`.
    pub conflicts: Vec<RoleConflict>,
}

impl RequirementModel {
    /// Derives requirements from a catalog.
    ///
    /// `window_hours` is the length of the single permitted early-shift
    /// maintenance window (must be positive).
    pub fn derive(catalog: &TaskCatalog, window_hours: f64) -> Self {
        assert!(window_hours > 0.0, "maintenance window must be positive");

        let (role_of, conflicts) = build_role_mapping(catalog);
        for c in &conflicts {
            warn!(
                qualification = %c.qualification,
                kept = %c.kept,
                rejected = %c.rejected,
                task = %c.task_id,
                "qualification code mapped to both roles; keeping first-seen role"
            );
        }

        let mut daily = Vec::new();
        for asset_id in catalog.asset_ids() {
            for role in SkillRole::ALL {
                let group = catalog.group(asset_id, role, Periodicity::Daily);
                if group.is_empty() {
                    continue;
                }
                let total_hours: f64 = group.iter().map(|t| t.duration_hours).sum();
                let derived = (total_hours / window_hours).ceil() as u32;
                let explicit = group.iter().filter_map(|t| t.crew_size).max().unwrap_or(0);
                let required = derived.max(explicit);
                if required == 0 {
                    // Zero workload requires nobody; not a coverage constraint.
                    continue;
                }
                daily.push(DailyRequirement {
                    asset_id: asset_id.to_string(),
                    role,
                    required,
                    total_hours,
                    task_ids: group.iter().map(|t| t.id.clone()).collect(),
                    qualifications: {
                        let mut quals: Vec<String> =
                            group.iter().map(|t| t.qualification.clone()).collect();
                        quals.sort();
                        quals.dedup();
                        quals
                    },
                });
            }
        }

        let window_tasks = |periodicity: Periodicity| -> Vec<WindowRequirement> {
            catalog
                .of_periodicity(periodicity)
                .map(|t| WindowRequirement {
                    task_id: t.id.clone(),
                    asset_id: t.asset_id.clone(),
                    role: t.role,
                    qualification: t.qualification.clone(),
                })
                .collect()
        };

        Self {
            window_hours,
            daily,
            weekly: window_tasks(Periodicity::Weekly),
            monthly: window_tasks(Periodicity::Monthly),
            role_of,
            conflicts,
        }
    }

    /// Role a qualification code requires, if known.
    pub fn role_of(&self, qualification: &str) -> Option<SkillRole> {
        self.role_of.get(qualification).copied()
    }

    /// Daily requirement for an asset/role, if one exists.
    pub fn daily_for(&self, asset_id: &str, role: SkillRole) -> Option<&DailyRequirement> {
        self.daily
            .iter()
            .find(|d| d.asset_id == asset_id && d.role == role)
    }

    /// Whether any requirement exists for a role.
    pub fn has_requirements_for(&self, role: SkillRole) -> bool {
        self.daily.iter().any(|d| d.role == role)
            || self.weekly.iter().any(|w| w.role == role)
            || self.monthly.iter().any(|m| m.role == role)
    }
}

fn build_role_mapping(catalog: &TaskCatalog) -> (BTreeMap<String, SkillRole>, Vec<RoleConflict>) {
    let mut role_of: BTreeMap<String, SkillRole> = BTreeMap::new();
    let mut conflicts = Vec::new();
    for task in &catalog.tasks {
        match role_of.get(&task.qualification) {
            None => {
                role_of.insert(task.qualification.clone(), task.role);
            }
            Some(&kept) if kept != task.role => {
                conflicts.push(RoleConflict {
                    qualification: task.qualification.clone(),
                    kept,
                    rejected: task.role,
                    task_id: task.id.clone(),
                });
            }
            Some(_) => {}
        }
    }
    (role_of, conflicts)
}
