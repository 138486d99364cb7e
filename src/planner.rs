//! End-to-end planning pipeline.
//!
//! Wires the components together for one team's optimization run:
//! validate inputs, derive requirements, expand rotas into the coverage
//! oracle, run the configured strategy (with heuristic fallback), repair,
//! and balance. Every run ends with either a coverage result — possibly
//! below 100% with enumerated gaps — or an explicit unresolvable-gap
//! error; there is no silent partial success.

use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{info, warn};

use crate::balance::{BalanceReport, FairnessBalancer};
use crate::models::{
    Assignment, AssetRegister, CoverageResult, Rota, Roster, SkillRole, TaskCatalog,
};
use crate::optimizer::{
    OptimizeError, Optimizer, OptimizerConfig, RepairReport, Strategy,
};
use crate::oracle::CoverageOracle;
use crate::requirement::{RequirementModel, RoleConflict};
use crate::validation::{validate_input, ValidationError};

/// Input container for one planning run.
#[derive(Debug, Clone, Default)]
pub struct PlanRequest {
    /// Technician roster.
    pub roster: Roster,
    /// Asset register.
    pub assets: AssetRegister,
    /// Task catalog.
    pub catalog: TaskCatalog,
    /// Native rota per role. A missing role means an empty rota; its
    /// technicians read as never available.
    pub rotas: BTreeMap<SkillRole, Rota>,
}

impl PlanRequest {
    /// Creates an empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the roster.
    pub fn with_roster(mut self, roster: Roster) -> Self {
        self.roster = roster;
        self
    }

    /// Sets the asset register.
    pub fn with_assets(mut self, assets: AssetRegister) -> Self {
        self.assets = assets;
        self
    }

    /// Sets the task catalog.
    pub fn with_catalog(mut self, catalog: TaskCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Sets a role's native rota.
    pub fn with_rota(mut self, role: SkillRole, rota: Rota) -> Self {
        self.rotas.insert(role, rota);
        self
    }
}

/// Planning failure.
#[derive(Debug, Error)]
pub enum PlanError {
    /// The inputs failed structural validation.
    #[error("invalid input: {} problem(s) found", .errors.len())]
    InvalidInput {
        /// All detected problems.
        errors: Vec<ValidationError>,
    },
    /// A requirement can never be covered by any assignment.
    #[error(transparent)]
    Optimize(#[from] OptimizeError),
}

/// Result of a complete planning run.
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    /// The final assignment.
    pub assignment: Assignment,
    /// Oracle evaluation of the final assignment.
    pub coverage: CoverageResult,
    /// Workload distribution after balancing.
    pub balance: BalanceReport,
    /// Strategy that produced the assignment.
    pub strategy_used: Strategy,
    /// Why the exact strategy fell back, when it did.
    pub fallback_reason: Option<String>,
    /// Repair-loop statistics.
    pub repair: RepairReport,
    /// Qualification → role conflicts found in the catalog (first-seen
    /// role won; listed for operator review).
    pub role_conflicts: Vec<RoleConflict>,
    /// Evaluation horizon used, in weeks.
    pub horizon_weeks: usize,
}

/// The qualification planner.
///
/// # Example
///
/// ```
/// use rotacover::models::{
///     Asset, AssetRegister, ComplexityClass, Periodicity, PpmTask, Rota,
///     Roster, SkillRole, TaskCatalog, Technician,
/// };
/// use rotacover::optimizer::OptimizerConfig;
/// use rotacover::planner::{Planner, PlanRequest};
///
/// let request = PlanRequest::new()
///     .with_roster(
///         Roster::new().with_technician(Technician::new("E01", SkillRole::Electrical)),
///     )
///     .with_assets(AssetRegister::new().with_asset(Asset::new("GR", ComplexityClass::A)))
///     .with_catalog(TaskCatalog::new().with_task(
///         PpmTask::new("GR-W1", "GR", SkillRole::Electrical, Periodicity::Weekly)
///             .with_duration(2.0)
///             .with_qualification("GR.W1.EL"),
///     ))
///     .with_rota(SkillRole::Electrical, Rota::empty());
///
/// // An empty rota still yields a report: every window gaps, nothing crashes.
/// let outcome = Planner::new(OptimizerConfig::new()).plan(&request)?;
/// assert_eq!(outcome.coverage.weekly.coverage_percent(), 0.0);
/// # Ok::<(), rotacover::planner::PlanError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Planner {
    config: OptimizerConfig,
}

impl Planner {
    /// Creates a planner with the given configuration.
    pub fn new(config: OptimizerConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Runs the full pipeline on one team's inputs.
    pub fn plan(&self, request: &PlanRequest) -> Result<PlanOutcome, PlanError> {
        validate_input(&request.roster, &request.assets, &request.catalog)
            .map_err(|errors| PlanError::InvalidInput { errors })?;

        let requirements = RequirementModel::derive(&request.catalog, self.config.window_hours);
        let oracle = CoverageOracle::new(
            &requirements,
            &request.roster,
            &request.rotas,
            self.config.min_horizon_weeks,
        );
        info!(
            horizon_weeks = oracle.horizon_weeks(),
            daily_requirements = requirements.daily.len(),
            weekly_tasks = requirements.weekly.len(),
            monthly_tasks = requirements.monthly.len(),
            "planning run started"
        );

        let optimizer = Optimizer::new(self.config.clone());
        let outcome = optimizer.optimize(&oracle, &request.catalog, &request.assets)?;
        let mut assignment = outcome.assignment;

        let balance =
            FairnessBalancer::new().rebalance(&mut assignment, &oracle, &request.catalog);
        // Balancing only moves load; re-evaluate so the reported coverage
        // matches the assignment actually returned.
        let coverage = oracle.evaluate(&assignment);
        let horizon_weeks = oracle.horizon_weeks();

        let violations = assignment.role_violations(&request.roster, &requirements.role_of);
        if !violations.is_empty() {
            warn!(count = violations.len(), "role-compatibility violations in final assignment");
        }

        Ok(PlanOutcome {
            assignment,
            coverage,
            balance,
            strategy_used: outcome.strategy_used,
            fallback_reason: outcome.fallback_reason,
            repair: outcome.repair,
            role_conflicts: requirements.conflicts,
            horizon_weeks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Asset, ComplexityClass, Periodicity, PpmTask, Technician, WeekPattern,
    };
    use crate::optimizer::RedundancyPolicy;

    /// Two-role team: 9-week electrical and 18-week mechanical rota
    /// cycles, one asset with daily work for each role plus a weekly and
    /// a monthly task.
    fn sample_request() -> PlanRequest {
        let roster = Roster::new()
            .with_technician(Technician::new("E01", SkillRole::Electrical))
            .with_technician(Technician::new("E02", SkillRole::Electrical))
            .with_technician(Technician::new("E03", SkillRole::Electrical))
            .with_technician(Technician::new("M01", SkillRole::Mechanical))
            .with_technician(Technician::new("M02", SkillRole::Mechanical))
            .with_technician(Technician::new("M03", SkillRole::Mechanical));

        let assets = AssetRegister::new()
            .with_asset(Asset::new("GR", ComplexityClass::A).with_name("Giant Racer"))
            .with_asset(Asset::new("WM", ComplexityClass::B).with_name("Wave Machine"));

        let catalog = TaskCatalog::new()
            .with_task(
                PpmTask::new("GR-D-E", "GR", SkillRole::Electrical, Periodicity::Daily)
                    .with_duration(2.0)
                    .with_qualification("GR.D.EL"),
            )
            .with_task(
                PpmTask::new("GR-D-M", "GR", SkillRole::Mechanical, Periodicity::Daily)
                    .with_duration(2.5)
                    .with_qualification("GR.D.ME"),
            )
            .with_task(
                PpmTask::new("WM-W-E", "WM", SkillRole::Electrical, Periodicity::Weekly)
                    .with_duration(3.0)
                    .with_qualification("WM.W.EL"),
            )
            .with_task(
                PpmTask::new("WM-M-M", "WM", SkillRole::Mechanical, Periodicity::Monthly)
                    .with_duration(5.0)
                    .with_qualification("WM.M.ME"),
            );

        // Electrical: 9-week cycle rotating one technician onto Early
        // shift each week, the others Late. Mechanical: 18-week cycle,
        // same shape. Every week keeps at least one Early technician per
        // role on site.
        let elec_ids = ["E01", "E02", "E03"];
        let mut elec = Rota::empty();
        for week in 0..9 {
            let mut map = BTreeMap::new();
            for (i, id) in elec_ids.iter().enumerate() {
                let pattern = if week % 3 == i { "EEEEEOO" } else { "LLLLLOO" };
                map.insert(id.to_string(), WeekPattern::parse(pattern).unwrap());
            }
            elec = elec.with_week(map);
        }

        let mech_ids = ["M01", "M02", "M03"];
        let mut mech = Rota::empty();
        for week in 0..18 {
            let mut map = BTreeMap::new();
            for (i, id) in mech_ids.iter().enumerate() {
                let pattern = if week % 3 == i { "EEEEEOO" } else { "LLLLLOO" };
                map.insert(id.to_string(), WeekPattern::parse(pattern).unwrap());
            }
            mech = mech.with_week(map);
        }

        PlanRequest::new()
            .with_roster(roster)
            .with_assets(assets)
            .with_catalog(catalog)
            .with_rota(SkillRole::Electrical, elec)
            .with_rota(SkillRole::Mechanical, mech)
    }

    #[test]
    fn test_full_pipeline_heuristic() {
        let request = sample_request();
        let config = OptimizerConfig::new()
            .with_strategy(Strategy::Heuristic)
            .with_redundancy(RedundancyPolicy::Maximal);
        let outcome = Planner::new(config).plan(&request).unwrap();

        // 9- and 18-week cycles over the default minimum: 36 weeks.
        assert_eq!(outcome.horizon_weeks, 36);
        assert_eq!(outcome.strategy_used, Strategy::Heuristic);
        assert!(outcome.coverage.is_full_coverage());
        assert!(outcome.role_conflicts.is_empty());
        assert!(outcome
            .assignment
            .role_violations(
                &request.roster,
                &RequirementModel::derive(&request.catalog, 3.0).role_of
            )
            .is_empty());
    }

    #[test]
    fn test_full_pipeline_exact() {
        let request = sample_request();
        let config = OptimizerConfig::new().with_min_horizon_weeks(18);
        let outcome = Planner::new(config).plan(&request).unwrap();

        assert_eq!(outcome.horizon_weeks, 18);
        assert!(outcome.coverage.is_full_coverage());
        // Exact path either solved or fell back; both must repair to full
        // coverage on this instance, and the outcome says which ran.
        if outcome.strategy_used == Strategy::Exact {
            assert!(outcome.fallback_reason.is_none());
        } else {
            assert!(outcome.fallback_reason.is_some());
        }
    }

    #[test]
    fn test_invalid_input_rejected() {
        let mut request = sample_request();
        request.roster = request
            .roster
            .with_technician(Technician::new("E01", SkillRole::Electrical));
        let err = Planner::new(OptimizerConfig::new()).plan(&request).unwrap_err();
        match err {
            PlanError::InvalidInput { errors } => assert!(!errors.is_empty()),
            other => panic!("expected InvalidInput, got {other}"),
        }
    }

    #[test]
    fn test_empty_roster_escalates_unresolvable_gaps() {
        // An empty roster passes validation; the run proceeds and ends
        // with the explicit unresolvable-gap error, never silently.
        let mut request = sample_request();
        request.roster = Roster::new();
        let config = OptimizerConfig::new().with_strategy(Strategy::Heuristic);
        let err = Planner::new(config).plan(&request).unwrap_err();
        match err {
            PlanError::Optimize(OptimizeError::UnresolvableGaps { gaps }) => {
                assert!(!gaps.is_empty());
            }
            other => panic!("expected UnresolvableGaps, got {other}"),
        }
    }

    #[test]
    fn test_missing_rota_still_produces_report() {
        // Drop the mechanical rota entirely: the run must not crash, and
        // the mechanical windows must report as uncovered.
        let mut request = sample_request();
        request.rotas.remove(&SkillRole::Mechanical);
        let config = OptimizerConfig::new().with_strategy(Strategy::Heuristic);
        let outcome = Planner::new(config).plan(&request).unwrap();

        assert!(!outcome.coverage.is_full_coverage());
        assert!(outcome
            .coverage
            .all_gaps()
            .any(|g| g.role == SkillRole::Mechanical));
        // Electrical coverage is unaffected.
        assert!(outcome
            .coverage
            .all_gaps()
            .all(|g| g.role != SkillRole::Electrical));
    }

    #[test]
    fn test_plan_is_deterministic() {
        let request = sample_request();
        let config = OptimizerConfig::new()
            .with_strategy(Strategy::Heuristic)
            .with_seed(11);
        let planner = Planner::new(config);
        let a = planner.plan(&request).unwrap();
        let b = planner.plan(&request).unwrap();
        assert_eq!(a.assignment, b.assignment);
        assert_eq!(a.coverage, b.coverage);
    }
}
