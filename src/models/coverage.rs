//! Coverage result model.
//!
//! The oracle's output: per periodicity class, the tested time windows,
//! how many passed, and a structured gap record for each failure. Gap
//! records carry enough detail (asset, tasks, qualification codes, role,
//! shortfall, where in the horizon) for a downstream training or reporting
//! layer to act on them without re-deriving anything from raw task data.

use serde::{Deserialize, Serialize};

use super::{Periodicity, SkillRole};

/// A task/time-window instance with too few qualified, available
/// technicians.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageGap {
    /// Affected asset.
    pub asset_id: String,
    /// Task ids in the unmet group.
    pub task_ids: Vec<String>,
    /// Qualification codes that would close the gap.
    pub qualifications: Vec<String>,
    /// Required skill role.
    pub role: SkillRole,
    /// Periodicity class of the window.
    pub periodicity: Periodicity,
    /// Technicians required in the window.
    pub required: u32,
    /// Qualified technicians actually available.
    pub available: u32,
    /// Week index within the horizon (daily and weekly gaps).
    pub week: Option<usize>,
    /// Weekday index, 0 = Monday (daily gaps).
    pub day: Option<usize>,
    /// 4-week block index (monthly gaps).
    pub block: Option<usize>,
}

impl CoverageGap {
    /// How many additional technicians the window is short.
    pub fn shortfall(&self) -> u32 {
        self.required.saturating_sub(self.available)
    }

    /// Identity of the underlying requirement, ignoring where in the
    /// horizon the gap occurred. Used to deduplicate repeated failures of
    /// the same requirement across weeks.
    pub fn requirement_key(&self) -> (String, SkillRole, Periodicity, Vec<String>) {
        (
            self.asset_id.clone(),
            self.role,
            self.periodicity,
            self.qualifications.clone(),
        )
    }
}

/// Pass/fail tally for one periodicity class over the whole horizon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodicitySummary {
    /// Time windows tested (days, weeks, or 4-week blocks).
    pub windows_tested: usize,
    /// Windows with every requirement met.
    pub windows_passed: usize,
    /// All gaps, in horizon order.
    pub gaps: Vec<CoverageGap>,
}

impl PeriodicitySummary {
    /// Coverage percentage. An empty test set counts as full coverage.
    pub fn coverage_percent(&self) -> f64 {
        if self.windows_tested == 0 {
            100.0
        } else {
            self.windows_passed as f64 / self.windows_tested as f64 * 100.0
        }
    }

    /// Whether every tested window passed.
    pub fn is_full(&self) -> bool {
        self.windows_passed == self.windows_tested
    }
}

/// Overall coverage classification, thresholded on the three periodicity
/// percentages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoverageStatus {
    /// All classes at 95% or better.
    Excellent,
    /// All classes at 90% or better.
    Good,
    /// Daily at 80%+, weekly and monthly at 85%+.
    Acceptable,
    /// Anything below the acceptable thresholds.
    Insufficient,
}

/// Redundancy risk classification, driven by the fraction of held
/// qualifications with a single holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

/// Single-point-of-failure analysis of an assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAnalysis {
    /// Distinct qualification codes held by anyone.
    pub total_qualifications: usize,
    /// Codes held by exactly one technician.
    pub single_holder: usize,
    /// Codes held by two or more technicians.
    pub redundant: usize,
    /// Codes held by three or more technicians.
    pub well_covered: usize,
    /// single_holder / total_qualifications.
    pub spof_ratio: f64,
    /// Overall risk level.
    pub level: RiskLevel,
    /// The single-holder codes, in sorted order.
    pub spof_qualifications: Vec<String>,
}

/// Complete result of one oracle evaluation.
///
/// Recomputed from scratch on every call; never partially updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageResult {
    /// Horizon length the evaluation covered, in weeks.
    pub horizon_weeks: usize,
    /// Daily-task coverage (windows = weekdays).
    pub daily: PeriodicitySummary,
    /// Weekly-task coverage (windows = weeks).
    pub weekly: PeriodicitySummary,
    /// Monthly-task coverage (windows = 4-week blocks).
    pub monthly: PeriodicitySummary,
    /// Weekly tasks that landed in the preferred early window.
    pub am_scheduled: usize,
    /// Weekly tasks that needed the late-shift fallback.
    pub pm_scheduled: usize,
    /// Overall classification.
    pub status: CoverageStatus,
    /// Single-point-of-failure analysis.
    pub risk: RiskAnalysis,
}

impl CoverageResult {
    /// Summary for one periodicity class.
    pub fn summary(&self, periodicity: Periodicity) -> &PeriodicitySummary {
        match periodicity {
            Periodicity::Daily => &self.daily,
            Periodicity::Weekly => &self.weekly,
            Periodicity::Monthly => &self.monthly,
        }
    }

    /// All gaps across the three classes, in class then horizon order.
    pub fn all_gaps(&self) -> impl Iterator<Item = &CoverageGap> {
        self.daily
            .gaps
            .iter()
            .chain(self.weekly.gaps.iter())
            .chain(self.monthly.gaps.iter())
    }

    /// Whether every tested window in every class passed.
    pub fn is_full_coverage(&self) -> bool {
        self.daily.is_full() && self.weekly.is_full() && self.monthly.is_full()
    }

    /// Fraction of weekly tasks scheduled in the preferred early window.
    pub fn am_preference_rate(&self) -> f64 {
        let total = self.am_scheduled + self.pm_scheduled;
        if total == 0 {
            0.0
        } else {
            self.am_scheduled as f64 / total as f64
        }
    }
}
