//! Recurring maintenance task (PPM) model.
//!
//! A PPM is a recurring maintenance action on one asset with a fixed
//! periodicity, a required skill role, and a qualification code that a
//! technician must hold to execute it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::SkillRole;

/// Recurrence class of a task, which also selects its scheduling window:
/// Daily tasks must fit the early-shift window every weekday, Weekly tasks
/// need one qualifying day per week, Monthly tasks one per 4-week block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Periodicity {
    Daily,
    Weekly,
    Monthly,
}

impl Periodicity {
    /// All periodicity classes, in canonical order.
    pub const ALL: [Periodicity; 3] =
        [Periodicity::Daily, Periodicity::Weekly, Periodicity::Monthly];
}

/// A recurring maintenance task (PPM).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PpmTask {
    /// Unique task identifier (PPM code).
    pub id: String,
    /// Asset this task maintains.
    pub asset_id: String,
    /// Required skill role.
    pub role: SkillRole,
    /// Recurrence class.
    pub periodicity: Periodicity,
    /// Working duration in hours.
    pub duration_hours: f64,
    /// Qualification code a technician must hold.
    pub qualification: String,
    /// Explicit simultaneous-crew requirement, when the task sheet
    /// specifies one. `None` = derive from duration and window.
    pub crew_size: Option<u32>,
}

impl PpmTask {
    /// Creates a new task.
    pub fn new(
        id: impl Into<String>,
        asset_id: impl Into<String>,
        role: SkillRole,
        periodicity: Periodicity,
    ) -> Self {
        Self {
            id: id.into(),
            asset_id: asset_id.into(),
            role,
            periodicity,
            duration_hours: 0.0,
            qualification: String::new(),
            crew_size: None,
        }
    }

    /// Sets the duration in hours.
    pub fn with_duration(mut self, hours: f64) -> Self {
        self.duration_hours = hours;
        self
    }

    /// Sets the qualification code.
    pub fn with_qualification(mut self, code: impl Into<String>) -> Self {
        self.qualification = code.into();
        self
    }

    /// Sets an explicit crew size.
    pub fn with_crew_size(mut self, crew: u32) -> Self {
        self.crew_size = Some(crew);
        self
    }
}

/// The team's full task list, queryable by asset, role, and periodicity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskCatalog {
    /// All tasks for the team under optimization.
    pub tasks: Vec<PpmTask>,
}

impl TaskCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a task.
    pub fn with_task(mut self, task: PpmTask) -> Self {
        self.tasks.push(task);
        self
    }

    /// All tasks of a periodicity class.
    pub fn of_periodicity(&self, periodicity: Periodicity) -> impl Iterator<Item = &PpmTask> {
        self.tasks.iter().filter(move |t| t.periodicity == periodicity)
    }

    /// Tasks for an asset, role, and periodicity.
    pub fn group(
        &self,
        asset_id: &str,
        role: SkillRole,
        periodicity: Periodicity,
    ) -> Vec<&PpmTask> {
        self.tasks
            .iter()
            .filter(|t| t.asset_id == asset_id && t.role == role && t.periodicity == periodicity)
            .collect()
    }

    /// Every qualification code an asset requires for a role, across all
    /// periodicities. This is the set a technician acquires when assigned
    /// the asset (ride clustering).
    pub fn qualifications_for_asset_role(
        &self,
        asset_id: &str,
        role: SkillRole,
    ) -> BTreeSet<String> {
        self.tasks
            .iter()
            .filter(|t| t.asset_id == asset_id && t.role == role)
            .map(|t| t.qualification.clone())
            .collect()
    }

    /// Distinct qualification codes required for a role, in sorted order.
    pub fn qualifications_for_role(&self, role: SkillRole) -> BTreeSet<String> {
        self.tasks
            .iter()
            .filter(|t| t.role == role)
            .map(|t| t.qualification.clone())
            .collect()
    }

    /// Asset of the first task requiring a qualification code.
    pub fn asset_of_qualification(&self, code: &str) -> Option<&str> {
        self.tasks
            .iter()
            .find(|t| t.qualification == code)
            .map(|t| t.asset_id.as_str())
    }

    /// Distinct asset ids that have at least one task.
    pub fn asset_ids(&self) -> BTreeSet<&str> {
        self.tasks.iter().map(|t| t.asset_id.as_str()).collect()
    }

    /// Number of tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
