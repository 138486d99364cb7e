//! Oracle-guided repair loop.
//!
//! Repeatedly evaluates the assignment, and for every distinct unmet
//! requirement grants its qualification codes to the best-ranked eligible
//! technicians until the shortfall (plus the redundancy policy's spare
//! holders) is covered. Candidates are ranked by fewest qualifications
//! held, then by how well their shift pattern fits the gap's window, then
//! by id.
//!
//! Termination is guaranteed: the loop stops when no gaps remain, when the
//! configured pass limit is reached, or when a pass grants nothing (stall
//! — the remaining gaps are reported as permanent). A requirement whose
//! role has no eligible technician at all can never be repaired and
//! escalates as an error instead.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::models::{Assignment, CoverageGap, CoverageResult, Periodicity, Technician};
use crate::oracle::CoverageOracle;

use super::{OptimizeError, OptimizerConfig};

/// Statistics from one repair run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairReport {
    /// Passes that attempted repairs.
    pub passes: u32,
    /// Qualification grants applied in total.
    pub grants: u32,
    /// Whether the final evaluation shows no gaps.
    pub converged: bool,
    /// Whether the loop stopped because a pass changed nothing while gaps
    /// remained.
    pub stalled: bool,
}

/// Runs the repair loop to completion, returning the final evaluation.
pub fn repair(
    assignment: &mut Assignment,
    oracle: &CoverageOracle<'_>,
    config: &OptimizerConfig,
) -> Result<(CoverageResult, RepairReport), OptimizeError> {
    let mut report = RepairReport::default();
    let mut result = oracle.evaluate(assignment);

    for pass in 0..config.max_repair_passes {
        let needs = distinct_needs(&result);
        if needs.is_empty() {
            break;
        }

        let unresolvable: Vec<CoverageGap> = needs
            .values()
            .filter(|gap| oracle.roster().active_of_role(gap.role).is_empty())
            .cloned()
            .collect();
        if !unresolvable.is_empty() {
            return Err(OptimizeError::UnresolvableGaps { gaps: unresolvable });
        }

        report.passes += 1;
        let mut pass_grants = 0u32;

        for gap in needs.values() {
            let mut candidates: Vec<&Technician> = oracle
                .roster()
                .active_of_role(gap.role)
                .into_iter()
                .filter(|t| !gap.qualifications.iter().all(|q| assignment.holds(&t.id, q)))
                .collect();

            candidates.sort_by(|a, b| {
                let held = assignment
                    .qualification_count(&a.id)
                    .cmp(&assignment.qualification_count(&b.id));
                held.then_with(|| {
                    window_fit(oracle, gap, b)
                        .partial_cmp(&window_fit(oracle, gap, a))
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .then_with(|| a.id.cmp(&b.id))
            });

            let take = match config.redundancy.extra_holders() {
                Some(extra) => (gap.shortfall() + extra) as usize,
                None => candidates.len(),
            };

            for technician in candidates.into_iter().take(take) {
                for qualification in &gap.qualifications {
                    if assignment.grant(&technician.id, qualification) {
                        pass_grants += 1;
                    }
                }
            }
        }

        report.grants += pass_grants;
        debug!(pass, grants = pass_grants, "repair pass complete");

        if pass_grants == 0 {
            report.stalled = true;
            warn!(
                remaining = result.all_gaps().count(),
                "repair stalled; remaining gaps are permanent"
            );
            break;
        }

        result = oracle.evaluate(assignment);
    }

    report.converged = result.all_gaps().next().is_none();
    Ok((result, report))
}

/// Deduplicates gaps down to one entry per underlying requirement,
/// keeping the occurrence with the largest shortfall.
fn distinct_needs(result: &CoverageResult) -> BTreeMap<GapKey, CoverageGap> {
    let mut needs: BTreeMap<GapKey, CoverageGap> = BTreeMap::new();
    for gap in result.all_gaps() {
        let key = gap.requirement_key();
        match needs.get(&key) {
            Some(existing) if existing.shortfall() >= gap.shortfall() => {}
            _ => {
                needs.insert(key, gap.clone());
            }
        }
    }
    needs
}

type GapKey = (
    String,
    crate::models::SkillRole,
    Periodicity,
    Vec<String>,
);

/// How well a technician's shift pattern fits a gap's window: early-shift
/// ratio for Daily and Weekly windows, any-shift ratio for Monthly.
fn window_fit(oracle: &CoverageOracle<'_>, gap: &CoverageGap, technician: &Technician) -> f64 {
    let profile = oracle.profile(gap.role, &technician.id);
    match gap.periodicity {
        Periodicity::Daily | Periodicity::Weekly => profile.early_ratio(),
        Periodicity::Monthly => profile.any_ratio(),
    }
}
