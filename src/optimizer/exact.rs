//! Exact assignment optimization via integer programming.
//!
//! Builds a MILP over binary (technician, asset) variables — assigning an
//! asset grants the technician every qualification the asset requires for
//! their role, which keeps the model tractable and reflects that an
//! asset's qualifications are acquired together in practice. The rotation
//! coverage constraints are generated programmatically from the expanded
//! rotas: one per (week × weekday × asset × role) for Daily work, one per
//! (week × task) for Weekly, one per (4-week block × task) for Monthly.
//! Identical candidate sets recur across the horizon and are emitted once.
//!
//! The objective minimizes the max−min spread of per-technician asset
//! counts, with total assignment count weighted an order of magnitude
//! lower as the secondary criterion.

use good_lp::{
    constraint, default_solver, variable, Expression, ProblemVariables, Solution, SolverModel,
    Variable,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{
    Assignment, AssetRegister, ComplexityClass, ShiftCode, SkillRole, TaskCatalog, Technician,
};
use crate::oracle::CoverageOracle;

use super::OptimizerConfig;

/// Why an exact solve produced no assignment. Every variant triggers the
/// heuristic fallback; none is fatal.
#[derive(Debug, Error)]
pub enum ExactSolveError {
    /// The wall-clock limit elapsed before the solver finished.
    #[error("solver exceeded the {0:?} time limit")]
    Timeout(Duration),
    /// The solver reported infeasibility or failed outright.
    #[error("solver failed: {0}")]
    Solver(String),
}

/// Everything the worker thread needs to build and solve the model.
/// Owned data only, so the solve can run beyond a timeout without
/// borrowing from the caller.
struct MilpInput {
    n_pairs: usize,
    n_assets: usize,
    /// Coverage rows: sum of the listed pair variables >= required.
    cover_rows: Vec<(Vec<usize>, u32)>,
    /// Pair variables per technician, for the fairness bounds.
    per_technician: Vec<Vec<usize>>,
    /// Equal-distribution rows: sum(left) == sum(right).
    equal_rows: Vec<(Vec<usize>, Vec<usize>)>,
}

/// Solves the assignment MILP and expands the picked assets into
/// qualification grants.
pub(super) fn solve(
    oracle: &CoverageOracle<'_>,
    catalog: &TaskCatalog,
    register: &AssetRegister,
    config: &OptimizerConfig,
) -> Result<Assignment, ExactSolveError> {
    let mut technicians: Vec<&Technician> = oracle.roster().active().collect();
    technicians.sort_by(|a, b| a.id.cmp(&b.id));
    let mut asset_ids: Vec<&str> = register.assets.iter().map(|a| a.id.as_str()).collect();
    asset_ids.sort_unstable();

    // Variables exist only for role-compatible pairs: an asset with no
    // qualification for the technician's role cannot be assigned.
    let mut pair_index: BTreeMap<(usize, usize), usize> = BTreeMap::new();
    let mut pairs: Vec<(usize, usize)> = Vec::new();
    for (ti, technician) in technicians.iter().enumerate() {
        for (ai, asset_id) in asset_ids.iter().enumerate() {
            if !catalog
                .qualifications_for_asset_role(asset_id, technician.role)
                .is_empty()
            {
                pair_index.insert((ti, ai), pairs.len());
                pairs.push((ti, ai));
            }
        }
    }

    if pairs.is_empty() {
        // Nothing assignable; hand back the empty assignment.
        return Ok(Assignment::for_roster(oracle.roster()));
    }

    let asset_pos: BTreeMap<&str, usize> = asset_ids
        .iter()
        .enumerate()
        .map(|(i, id)| (*id, i))
        .collect();
    let horizon = oracle.horizon_weeks();
    let requirements = oracle.requirements();

    // Deduplicated coverage rows. The same candidate set recurs for every
    // week the rota pattern repeats; one constraint suffices.
    let mut cover_rows: BTreeSet<(Vec<usize>, u32)> = BTreeSet::new();

    // Baseline: every asset/role with tasks keeps at least one technician.
    for (ai, asset_id) in asset_ids.iter().enumerate() {
        for role in SkillRole::ALL {
            if catalog
                .qualifications_for_asset_role(asset_id, role)
                .is_empty()
            {
                continue;
            }
            let row = role_pairs(&technicians, &pair_index, ai, role, |_| true);
            if !row.is_empty() {
                cover_rows.insert((row, 1));
            }
        }
    }

    // Daily: the required head-count must be on Early shift every weekday.
    for req in &requirements.daily {
        let Some(&ai) = asset_pos.get(req.asset_id.as_str()) else {
            continue;
        };
        for week in 0..horizon {
            for day in 0..5 {
                let row = role_pairs(&technicians, &pair_index, ai, req.role, |t| {
                    oracle.shift_for(req.role, &t.id, week, day) == ShiftCode::Early
                });
                if !row.is_empty() {
                    cover_rows.insert((row, req.required));
                }
            }
        }
    }

    // Weekly: one technician on Early or Late shift some weekday of the week.
    for task in &requirements.weekly {
        let Some(&ai) = asset_pos.get(task.asset_id.as_str()) else {
            continue;
        };
        for week in 0..horizon {
            let row = role_pairs(&technicians, &pair_index, ai, task.role, |t| {
                on_site_in_weeks(oracle, t, week, week + 1)
            });
            if !row.is_empty() {
                cover_rows.insert((row, 1));
            }
        }
    }

    // Monthly: one technician on site some weekday of the 4-week block.
    for task in &requirements.monthly {
        let Some(&ai) = asset_pos.get(task.asset_id.as_str()) else {
            continue;
        };
        for block in 0..horizon.div_ceil(4) {
            let start = block * 4;
            let end = (start + 4).min(horizon);
            let row = role_pairs(&technicians, &pair_index, ai, task.role, |t| {
                on_site_in_weeks(oracle, t, start, end)
            });
            if !row.is_empty() {
                cover_rows.insert((row, 1));
            }
        }
    }

    let per_technician: Vec<Vec<usize>> = (0..technicians.len())
        .map(|ti| {
            (0..asset_ids.len())
                .filter_map(|ai| pair_index.get(&(ti, ai)).copied())
                .collect()
        })
        .collect();

    let mut equal_rows: Vec<(Vec<usize>, Vec<usize>)> = Vec::new();
    if config.equal_class_distribution {
        for class in ComplexityClass::ALL {
            let class_assets: Vec<usize> = asset_ids
                .iter()
                .enumerate()
                .filter(|(_, id)| {
                    register
                        .get(id)
                        .map(|a| a.complexity == class)
                        .unwrap_or(false)
                })
                .map(|(ai, _)| ai)
                .collect();
            if class_assets.is_empty() {
                continue;
            }
            let class_pairs = |ti: usize| -> Vec<usize> {
                class_assets
                    .iter()
                    .filter_map(|&ai| pair_index.get(&(ti, ai)).copied())
                    .collect()
            };
            let first = class_pairs(0);
            for ti in 1..technicians.len() {
                equal_rows.push((first.clone(), class_pairs(ti)));
            }
        }
    }

    let input = MilpInput {
        n_pairs: pairs.len(),
        n_assets: asset_ids.len(),
        cover_rows: cover_rows.into_iter().collect(),
        per_technician,
        equal_rows,
    };
    info!(
        variables = input.n_pairs,
        constraints = input.cover_rows.len(),
        horizon,
        "solving assignment MILP"
    );

    let values = solve_with_timeout(input, config.time_limit)?;

    let mut assignment = Assignment::for_roster(oracle.roster());
    let mut picked = 0;
    for (idx, &(ti, ai)) in pairs.iter().enumerate() {
        if values[idx] > 0.5 {
            picked += 1;
            for qualification in
                catalog.qualifications_for_asset_role(asset_ids[ai], technicians[ti].role)
            {
                assignment.grant(&technicians[ti].id, &qualification);
            }
        }
    }
    debug!(picked, "expanded asset picks into qualification grants");
    Ok(assignment)
}

/// Pair variables of role-matching technicians for one asset, filtered by
/// an availability predicate.
fn role_pairs(
    technicians: &[&Technician],
    pair_index: &BTreeMap<(usize, usize), usize>,
    ai: usize,
    role: SkillRole,
    mut available: impl FnMut(&Technician) -> bool,
) -> Vec<usize> {
    technicians
        .iter()
        .enumerate()
        .filter(|(_, t)| t.role == role && available(t))
        .filter_map(|(ti, _)| pair_index.get(&(ti, ai)).copied())
        .collect()
}

/// Whether a technician is on Early or Late shift on any weekday of the
/// week range [start, end).
fn on_site_in_weeks(
    oracle: &CoverageOracle<'_>,
    technician: &Technician,
    start: usize,
    end: usize,
) -> bool {
    (start..end).any(|week| {
        (0..5).any(|day| {
            oracle.shift_for(technician.role, &technician.id, week, day) != ShiftCode::Off
        })
    })
}

/// Runs the solve on a worker thread under a wall-clock limit. The backend
/// cannot be cancelled, so on timeout the thread is abandoned and its
/// eventual result discarded; the caller falls back deterministically.
fn solve_with_timeout(input: MilpInput, limit: Duration) -> Result<Vec<f64>, ExactSolveError> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(solve_model(&input));
    });
    match rx.recv_timeout(limit) {
        Ok(Ok(values)) => Ok(values),
        Ok(Err(message)) => Err(ExactSolveError::Solver(message)),
        Err(_) => Err(ExactSolveError::Timeout(limit)),
    }
}

fn solve_model(input: &MilpInput) -> Result<Vec<f64>, String> {
    let mut vars = ProblemVariables::new();
    let xs: Vec<Variable> = (0..input.n_pairs)
        .map(|_| vars.add(variable().binary()))
        .collect();
    let max_assets = vars.add(variable().integer().min(0.0).max(input.n_assets as f64));
    let min_assets = vars.add(variable().integer().min(0.0).max(input.n_assets as f64));

    let total = sum_of(&xs, &(0..input.n_pairs).collect::<Vec<_>>());
    let objective = (max_assets - min_assets) * 10.0 + total * 0.01;

    let mut model = vars.minimise(objective).using(default_solver);

    for (row, required) in &input.cover_rows {
        let needed = f64::from(*required);
        let row_sum = sum_of(&xs, row);
        model = model.with(constraint!(row_sum >= needed));
    }

    for technician_pairs in &input.per_technician {
        let load = sum_of(&xs, technician_pairs);
        let load_upper = load.clone();
        model = model.with(constraint!(load_upper <= max_assets));
        model = model.with(constraint!(load >= min_assets));
    }

    for (left, right) in &input.equal_rows {
        let left_sum = sum_of(&xs, left);
        let right_sum = sum_of(&xs, right);
        model = model.with(constraint!(left_sum == right_sum));
    }

    let solution = model.solve().map_err(|e| e.to_string())?;
    Ok(xs.iter().map(|v| solution.value(*v)).collect())
}

fn sum_of(xs: &[Variable], indices: &[usize]) -> Expression {
    indices
        .iter()
        .fold(Expression::from(0.0), |acc, &i| acc + xs[i])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Asset, Periodicity, PpmTask, Rota, Roster, WeekPattern,
    };
    use crate::requirement::RequirementModel;

    fn rotas_all_early(technicians: &[(&str, SkillRole)]) -> BTreeMap<SkillRole, Rota> {
        let mut rotas = BTreeMap::new();
        for role in SkillRole::ALL {
            let week: BTreeMap<String, WeekPattern> = technicians
                .iter()
                .filter(|(_, r)| *r == role)
                .map(|(id, _)| (id.to_string(), WeekPattern::parse("EEEEEOO").unwrap()))
                .collect();
            rotas.insert(role, Rota::empty().with_week(week));
        }
        rotas
    }

    fn roster_of(technicians: &[(&str, SkillRole)]) -> Roster {
        let mut roster = Roster::new();
        for (id, role) in technicians {
            roster = roster.with_technician(crate::models::Technician::new(*id, *role));
        }
        roster
    }

    #[test]
    fn test_exact_covers_daily_headcount() {
        // 5h of daily work in a 3h window → 2 technicians must be picked.
        let catalog = TaskCatalog::new().with_task(
            PpmTask::new("D1", "GR", SkillRole::Mechanical, Periodicity::Daily)
                .with_duration(5.0)
                .with_qualification("GR.D1.ME"),
        );
        let register = AssetRegister::new().with_asset(Asset::new("GR", ComplexityClass::A));
        let technicians = [
            ("M01", SkillRole::Mechanical),
            ("M02", SkillRole::Mechanical),
            ("M03", SkillRole::Mechanical),
        ];
        let roster = roster_of(&technicians);
        let rotas = rotas_all_early(&technicians);
        let requirements = RequirementModel::derive(&catalog, 3.0);
        let oracle = CoverageOracle::new(&requirements, &roster, &rotas, 1);

        let assignment = solve(&oracle, &catalog, &register, &OptimizerConfig::default()).unwrap();
        // The head-count needs 2; the fairness term pulls in the third
        // technician as well, since an empty plate widens the spread.
        assert_eq!(assignment.holder_count("GR.D1.ME"), 3);
        assert!(oracle.evaluate(&assignment).is_full_coverage());
    }

    #[test]
    fn test_exact_infeasible_reports_solver_error() {
        // Required head-count 2 with a single mechanical technician.
        let catalog = TaskCatalog::new().with_task(
            PpmTask::new("D1", "GR", SkillRole::Mechanical, Periodicity::Daily)
                .with_duration(5.0)
                .with_qualification("GR.D1.ME"),
        );
        let register = AssetRegister::new().with_asset(Asset::new("GR", ComplexityClass::A));
        let technicians = [("M01", SkillRole::Mechanical)];
        let roster = roster_of(&technicians);
        let rotas = rotas_all_early(&technicians);
        let requirements = RequirementModel::derive(&catalog, 3.0);
        let oracle = CoverageOracle::new(&requirements, &roster, &rotas, 1);

        let err = solve(&oracle, &catalog, &register, &OptimizerConfig::default()).unwrap_err();
        assert!(matches!(err, ExactSolveError::Solver(_)));
    }

    #[test]
    fn test_exact_skips_role_incompatible_assets() {
        // The asset only has electrical work; the mechanical technician
        // must end up with nothing.
        let catalog = TaskCatalog::new().with_task(
            PpmTask::new("W1", "GR", SkillRole::Electrical, Periodicity::Weekly)
                .with_duration(1.0)
                .with_qualification("GR.W1.EL"),
        );
        let register = AssetRegister::new().with_asset(Asset::new("GR", ComplexityClass::B));
        let technicians = [("E01", SkillRole::Electrical), ("M01", SkillRole::Mechanical)];
        let roster = roster_of(&technicians);
        let rotas = rotas_all_early(&technicians);
        let requirements = RequirementModel::derive(&catalog, 3.0);
        let oracle = CoverageOracle::new(&requirements, &roster, &rotas, 1);

        let assignment = solve(&oracle, &catalog, &register, &OptimizerConfig::default()).unwrap();
        assert!(assignment.holds("E01", "GR.W1.EL"));
        assert_eq!(assignment.qualification_count("M01"), 0);
        assert!(assignment
            .role_violations(&roster, &requirements.role_of)
            .is_empty());
    }

    #[test]
    fn test_exact_empty_catalog_yields_empty_assignment() {
        let catalog = TaskCatalog::new();
        let register = AssetRegister::new().with_asset(Asset::new("GR", ComplexityClass::C));
        let technicians = [("E01", SkillRole::Electrical)];
        let roster = roster_of(&technicians);
        let rotas = rotas_all_early(&technicians);
        let requirements = RequirementModel::derive(&catalog, 3.0);
        let oracle = CoverageOracle::new(&requirements, &roster, &rotas, 1);

        let assignment = solve(&oracle, &catalog, &register, &OptimizerConfig::default()).unwrap();
        assert_eq!(assignment.total_grants(), 0);
    }
}
