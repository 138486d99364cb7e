//! Qualification assignment optimizer.
//!
//! Two strategies produce a role-compatible assignment satisfying the
//! coverage requirements:
//!
//! - **Exact** (`exact`): an integer program over binary
//!   (technician, asset) variables with the rotation coverage constraints
//!   generated from the expanded rotas and a fairness objective. Solved
//!   under a wall-clock limit; any failure (timeout, infeasibility,
//!   solver error) falls back to the heuristic — never a fatal error.
//! - **Heuristic** (`heuristic`): a seeded fair round-robin deal, repaired
//!   by the oracle-guided loop in `repair`.
//!
//! The repair loop also runs after a successful exact solve as a post-hoc
//! improvement pass.

mod exact;
mod heuristic;
mod repair;

pub use exact::ExactSolveError;
pub use heuristic::initial_fair_assignment;
pub use repair::{repair, RepairReport};

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::models::{Assignment, AssetRegister, CoverageGap, CoverageResult, TaskCatalog};
use crate::oracle::CoverageOracle;

/// Which optimization strategy to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    /// Integer program with heuristic fallback.
    Exact,
    /// Fair round-robin deal plus repair loop.
    Heuristic,
}

/// How many technicians beyond a gap's strict shortfall the repair loop
/// grants a qualification to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RedundancyPolicy {
    /// Exactly the shortfall.
    Minimal,
    /// Shortfall plus one spare holder.
    Standard,
    /// Shortfall plus two spare holders.
    Aggressive,
    /// Every eligible technician.
    Maximal,
}

impl RedundancyPolicy {
    /// Extra holders beyond the shortfall; `None` = all eligible.
    pub fn extra_holders(&self) -> Option<u32> {
        match self {
            RedundancyPolicy::Minimal => Some(0),
            RedundancyPolicy::Standard => Some(1),
            RedundancyPolicy::Aggressive => Some(2),
            RedundancyPolicy::Maximal => None,
        }
    }
}

/// Operator-facing optimization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Strategy to attempt first.
    pub strategy: Strategy,
    /// Wall-clock limit for one exact solve.
    pub time_limit: Duration,
    /// Relative optimality gap accepted from the exact solver, where the
    /// backend supports one.
    pub mip_gap: f64,
    /// Repair-loop redundancy policy.
    pub redundancy: RedundancyPolicy,
    /// Upper bound on repair passes; guarantees termination even when
    /// full coverage is impossible.
    pub max_repair_passes: u32,
    /// Seed for all randomized tie-breaking.
    pub seed: u64,
    /// Early-shift maintenance window length in hours.
    pub window_hours: f64,
    /// Minimum evaluation horizon in weeks; raised to a common multiple
    /// of the native rota cycle lengths.
    pub min_horizon_weeks: usize,
    /// Force equal per-technician counts of each asset complexity class.
    /// Can render the model infeasible on asymmetric rosters, which then
    /// falls back to the heuristic.
    pub equal_class_distribution: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Exact,
            time_limit: Duration::from_secs(300),
            mip_gap: 0.03,
            redundancy: RedundancyPolicy::Minimal,
            max_repair_passes: 10,
            seed: 42,
            window_hours: 3.0,
            min_horizon_weeks: 36,
            equal_class_distribution: false,
        }
    }
}

impl OptimizerConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the strategy.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the exact-solve time limit.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = limit;
        self
    }

    /// Sets the repair redundancy policy.
    pub fn with_redundancy(mut self, redundancy: RedundancyPolicy) -> Self {
        self.redundancy = redundancy;
        self
    }

    /// Sets the repair pass limit.
    pub fn with_max_repair_passes(mut self, passes: u32) -> Self {
        self.max_repair_passes = passes;
        self
    }

    /// Sets the tie-breaking seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the early-window length in hours.
    pub fn with_window_hours(mut self, hours: f64) -> Self {
        self.window_hours = hours;
        self
    }

    /// Sets the minimum horizon in weeks.
    pub fn with_min_horizon_weeks(mut self, weeks: usize) -> Self {
        self.min_horizon_weeks = weeks;
        self
    }

    /// Enables equal complexity-class distribution constraints.
    pub fn with_equal_class_distribution(mut self) -> Self {
        self.equal_class_distribution = true;
        self
    }
}

/// Optimization failure.
#[derive(Debug, Error)]
pub enum OptimizeError {
    /// Requirements whose role has no eligible technician at all. Coverage
    /// cannot be repaired by any assignment; surfaced instead of looping.
    #[error("{} requirement(s) have no eligible technicians of the needed role", .gaps.len())]
    UnresolvableGaps {
        /// The affected requirements, one gap each.
        gaps: Vec<CoverageGap>,
    },
}

/// Result of one optimization run.
#[derive(Debug, Clone)]
pub struct OptimizeOutcome {
    /// The final assignment.
    pub assignment: Assignment,
    /// Oracle evaluation of the final assignment.
    pub coverage: CoverageResult,
    /// Strategy that produced the assignment.
    pub strategy_used: Strategy,
    /// Why the exact strategy fell back, when it did.
    pub fallback_reason: Option<String>,
    /// Repair-loop statistics.
    pub repair: RepairReport,
}

/// The assignment optimizer.
#[derive(Debug, Clone, Default)]
pub struct Optimizer {
    config: OptimizerConfig,
}

impl Optimizer {
    /// Creates an optimizer with the given configuration.
    pub fn new(config: OptimizerConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Produces an assignment for the oracle's roster and requirements.
    ///
    /// The exact strategy falls back to the heuristic on any solver
    /// failure. Both paths finish with the bounded repair loop, so the
    /// outcome always carries a full coverage evaluation.
    pub fn optimize(
        &self,
        oracle: &CoverageOracle<'_>,
        catalog: &TaskCatalog,
        register: &AssetRegister,
    ) -> Result<OptimizeOutcome, OptimizeError> {
        let (mut assignment, strategy_used, fallback_reason) = match self.config.strategy {
            Strategy::Exact => match exact::solve(oracle, catalog, register, &self.config) {
                Ok(assignment) => {
                    info!("exact solve succeeded; running post-hoc repair pass");
                    (assignment, Strategy::Exact, None)
                }
                Err(err) => {
                    warn!(error = %err, "exact solve failed; falling back to heuristic");
                    (
                        initial_fair_assignment(oracle, self.config.seed),
                        Strategy::Heuristic,
                        Some(err.to_string()),
                    )
                }
            },
            Strategy::Heuristic => (
                initial_fair_assignment(oracle, self.config.seed),
                Strategy::Heuristic,
                None,
            ),
        };

        let (coverage, repair) = repair::repair(&mut assignment, oracle, &self.config)?;

        Ok(OptimizeOutcome {
            assignment,
            coverage,
            strategy_used,
            fallback_reason,
            repair,
        })
    }
}
