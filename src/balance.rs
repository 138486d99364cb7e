//! Fairness balancing of a coverage-satisfying assignment.
//!
//! Scores each technician's workload (qualification count plus a half
//! weight per qualified asset), reports the max−min spread and its ratio
//! to the average, and flags the assignment when the ratio exceeds the
//! configured threshold. Rebalancing only ever *moves* a unit of load: a
//! qualification is granted to the least-loaded eligible non-holder before
//! it is revoked from the most-loaded holder, and the move is kept only if
//! a fresh oracle evaluation shows no periodicity's coverage dropped — so
//! the last holder of a requirement is never stripped without a
//! replacement in place.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{Assignment, CoverageResult, SkillRole, TaskCatalog};
use crate::oracle::CoverageOracle;

/// One technician's workload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicianLoad {
    /// Technician id.
    pub technician_id: String,
    /// Technician role.
    pub role: SkillRole,
    /// Qualifications held.
    pub qualifications: usize,
    /// Assets qualified on.
    pub assets: usize,
    /// Workload score: qualifications + 0.5 × assets.
    pub score: f64,
}

/// Workload distribution report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceReport {
    /// Per-technician loads, sorted by id.
    pub loads: Vec<TechnicianLoad>,
    /// Mean workload score.
    pub average: f64,
    /// Max − min workload score.
    pub spread: f64,
    /// Spread as a fraction of the average.
    pub spread_ratio: f64,
    /// Whether the spread ratio exceeds the threshold.
    pub flagged: bool,
    /// Load moves applied by `rebalance`.
    pub moves_applied: u32,
}

/// The fairness balancer.
#[derive(Debug, Clone)]
pub struct FairnessBalancer {
    spread_threshold: f64,
}

impl Default for FairnessBalancer {
    fn default() -> Self {
        Self {
            spread_threshold: 0.5,
        }
    }
}

impl FairnessBalancer {
    /// Creates a balancer with the default spread threshold (0.5 × avg).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the spread-ratio threshold above which the assignment is
    /// flagged.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.spread_threshold = threshold;
        self
    }

    /// Computes the workload report without modifying the assignment.
    pub fn report(&self, assignment: &Assignment, catalog: &TaskCatalog) -> BalanceReport {
        self.report_with_moves(assignment, catalog, 0)
    }

    /// Moves load from the most- to the least-loaded technician of the
    /// same role while the assignment stays flagged, keeping only moves
    /// that a fresh oracle evaluation shows to be coverage-safe.
    pub fn rebalance(
        &self,
        assignment: &mut Assignment,
        oracle: &CoverageOracle<'_>,
        catalog: &TaskCatalog,
    ) -> BalanceReport {
        let mut baseline = oracle.evaluate(assignment);
        let mut moves_applied = 0;
        // One candidate move per held qualification bounds the loop.
        let move_budget = assignment.held_qualifications().len() as u32;

        for _ in 0..move_budget {
            let report = self.report_with_moves(assignment, catalog, moves_applied);
            if !report.flagged {
                break;
            }
            let Some((donor, receiver, qualification)) =
                self.pick_move(assignment, oracle, &report)
            else {
                break;
            };

            // Grant before revoking: the receiver becomes a holder first.
            assignment.grant(&receiver, &qualification);
            assignment.revoke(&donor, &qualification);

            let after = oracle.evaluate(assignment);
            if coverage_dropped(&baseline, &after) {
                // Undo in reverse order.
                assignment.grant(&donor, &qualification);
                assignment.revoke(&receiver, &qualification);
                break;
            }

            debug!(%donor, %receiver, %qualification, "moved load");
            baseline = after;
            moves_applied += 1;
        }

        self.report_with_moves(assignment, catalog, moves_applied)
    }

    fn report_with_moves(
        &self,
        assignment: &Assignment,
        catalog: &TaskCatalog,
        moves_applied: u32,
    ) -> BalanceReport {
        let role_of = |quals: &std::collections::BTreeSet<String>| -> SkillRole {
            // Role inferred from the catalog's first matching task; a
            // technician with no qualifications reads as Electrical but
            // never participates in a move.
            quals
                .iter()
                .find_map(|q| catalog.tasks.iter().find(|t| &t.qualification == q))
                .map(|t| t.role)
                .unwrap_or(SkillRole::Electrical)
        };

        let loads: Vec<TechnicianLoad> = assignment
            .iter()
            .map(|(id, quals)| {
                let assets = assignment.assets_for(id, catalog).len();
                TechnicianLoad {
                    technician_id: id.to_string(),
                    role: role_of(quals),
                    qualifications: quals.len(),
                    assets,
                    score: quals.len() as f64 + 0.5 * assets as f64,
                }
            })
            .collect();

        let (average, spread) = if loads.is_empty() {
            (0.0, 0.0)
        } else {
            let sum: f64 = loads.iter().map(|l| l.score).sum();
            let max = loads.iter().map(|l| l.score).fold(f64::MIN, f64::max);
            let min = loads.iter().map(|l| l.score).fold(f64::MAX, f64::min);
            (sum / loads.len() as f64, max - min)
        };
        let spread_ratio = if average > 0.0 { spread / average } else { 0.0 };

        BalanceReport {
            loads,
            average,
            spread,
            spread_ratio,
            flagged: spread_ratio > self.spread_threshold,
            moves_applied,
        }
    }

    /// Picks (donor, receiver, qualification) for one move: heaviest
    /// technician donates a qualification the lightest same-role
    /// technician lacks.
    fn pick_move(
        &self,
        assignment: &Assignment,
        oracle: &CoverageOracle<'_>,
        report: &BalanceReport,
    ) -> Option<(String, String, String)> {
        let donor = report
            .loads
            .iter()
            .filter(|l| l.qualifications > 0)
            .max_by(|a, b| {
                a.score
                    .partial_cmp(&b.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| b.technician_id.cmp(&a.technician_id))
            })?;

        let receiver = report
            .loads
            .iter()
            .filter(|l| {
                l.technician_id != donor.technician_id
                    && oracle
                        .roster()
                        .get(&l.technician_id)
                        .map(|t| t.role == donor.role)
                        .unwrap_or(false)
            })
            .min_by(|a, b| {
                a.score
                    .partial_cmp(&b.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.technician_id.cmp(&b.technician_id))
            })?;

        let qualification = assignment
            .qualifications(&donor.technician_id)?
            .iter()
            .find(|q| !assignment.holds(&receiver.technician_id, q))?
            .clone();

        Some((
            donor.technician_id.clone(),
            receiver.technician_id.clone(),
            qualification,
        ))
    }
}

fn coverage_dropped(before: &CoverageResult, after: &CoverageResult) -> bool {
    after.daily.coverage_percent() < before.daily.coverage_percent()
        || after.weekly.coverage_percent() < before.weekly.coverage_percent()
        || after.monthly.coverage_percent() < before.monthly.coverage_percent()
}
