//! Coverage verification oracle.
//!
//! Simulates every technician's rotating shift pattern over the expanded
//! evaluation horizon and determines, task by task and window by window,
//! whether an assignment satisfies each periodicity's rule:
//!
//! - **Daily**: every weekday, the asset/role group's required head-count
//!   must be on Early shift holding a matching qualification.
//! - **Weekly**: once per week, one qualified technician on Early shift
//!   (preferred) or Late shift (fallback) on any weekday.
//! - **Monthly**: once per 4-week block, one qualified technician on Early
//!   or Late shift on any weekday of the block.
//!
//! `evaluate` is a pure function of the assignment and the expanded rotas:
//! it is re-run in full after every mutation and two calls on the same
//! input produce identical results.

mod risk;

pub use risk::{analyze as analyze_risk, classify_status};

use std::collections::{BTreeMap, BTreeSet};

use crate::models::{
    evaluation_horizon, shift_profiles, Assignment, CoverageGap, CoverageResult, Periodicity,
    PeriodicitySummary, Rota, Roster, ShiftCode, ShiftProfile, SkillRole, Technician,
};
use crate::requirement::RequirementModel;

/// Weekdays carry the maintenance windows; weekends do not.
const WEEKDAYS: usize = 5;

/// Weeks per monthly scheduling block.
const BLOCK_WEEKS: usize = 4;

/// The coverage oracle: expanded rotas plus derived requirements, ready to
/// evaluate assignments.
pub struct CoverageOracle<'a> {
    requirements: &'a RequirementModel,
    roster: &'a Roster,
    rotas: BTreeMap<SkillRole, Rota>,
    profiles: BTreeMap<SkillRole, BTreeMap<String, ShiftProfile>>,
    horizon_weeks: usize,
}

impl<'a> CoverageOracle<'a> {
    /// Builds an oracle from native (unexpanded) rotas.
    ///
    /// The horizon is the least common multiple of the native cycle
    /// lengths, scaled to at least `min_horizon_weeks`, so every phase
    /// alignment between the roles' patterns is exercised. A role with no
    /// rota gets an empty one: its technicians are never available and
    /// coverage reports the failure rather than crashing.
    pub fn new(
        requirements: &'a RequirementModel,
        roster: &'a Roster,
        native_rotas: &BTreeMap<SkillRole, Rota>,
        min_horizon_weeks: usize,
    ) -> Self {
        let cycle_lens: Vec<usize> = SkillRole::ALL
            .iter()
            .map(|role| native_rotas.get(role).map(Rota::cycle_len).unwrap_or(0))
            .collect();
        let horizon_weeks = evaluation_horizon(&cycle_lens, min_horizon_weeks.max(1));

        let mut rotas = BTreeMap::new();
        let mut profiles = BTreeMap::new();
        for role in SkillRole::ALL {
            let expanded = native_rotas
                .get(&role)
                .map(|r| r.expand_to(horizon_weeks))
                .unwrap_or_else(Rota::empty);
            profiles.insert(role, shift_profiles(&expanded));
            rotas.insert(role, expanded);
        }

        Self {
            requirements,
            roster,
            rotas,
            profiles,
            horizon_weeks,
        }
    }

    /// Evaluation horizon in weeks.
    pub fn horizon_weeks(&self) -> usize {
        self.horizon_weeks
    }

    /// The derived requirements this oracle verifies against.
    pub fn requirements(&self) -> &RequirementModel {
        self.requirements
    }

    /// The roster under evaluation.
    pub fn roster(&self) -> &Roster {
        self.roster
    }

    /// The expanded rota for a role.
    pub fn rota(&self, role: SkillRole) -> &Rota {
        &self.rotas[&role]
    }

    /// Shift availability profile for a technician over the horizon.
    pub fn profile(&self, role: SkillRole, technician_id: &str) -> ShiftProfile {
        self.profiles
            .get(&role)
            .and_then(|m| m.get(technician_id))
            .copied()
            .unwrap_or_default()
    }

    /// Shift of a technician on a given week and day of the horizon.
    pub fn shift_for(&self, role: SkillRole, technician_id: &str, week: usize, day: usize) -> ShiftCode {
        self.rotas[&role].shift_for(week, technician_id, day)
    }

    /// Evaluates an assignment against every requirement over the whole
    /// horizon. Deterministic and side-effect free.
    pub fn evaluate(&self, assignment: &Assignment) -> CoverageResult {
        let daily = self.evaluate_daily(assignment);
        let (weekly, am_scheduled, pm_scheduled) = self.evaluate_weekly(assignment);
        let monthly = self.evaluate_monthly(assignment);

        let status = risk::classify_status(
            daily.coverage_percent(),
            weekly.coverage_percent(),
            monthly.coverage_percent(),
        );
        let risk = risk::analyze(assignment);

        CoverageResult {
            horizon_weeks: self.horizon_weeks,
            daily,
            weekly,
            monthly,
            am_scheduled,
            pm_scheduled,
            status,
            risk,
        }
    }

    fn evaluate_daily(&self, assignment: &Assignment) -> PeriodicitySummary {
        let mut summary = PeriodicitySummary::default();
        if self.requirements.daily.is_empty() {
            return summary;
        }

        for week in 0..self.horizon_weeks {
            for day in 0..WEEKDAYS {
                summary.windows_tested += 1;
                let mut day_ok = true;

                for req in &self.requirements.daily {
                    let available = self
                        .roster
                        .active_of_role(req.role)
                        .iter()
                        .filter(|t| {
                            self.shift_for(req.role, &t.id, week, day) == ShiftCode::Early
                                && holds_any(assignment, t, &req.qualifications)
                        })
                        .count() as u32;

                    if available < req.required {
                        day_ok = false;
                        summary.gaps.push(CoverageGap {
                            asset_id: req.asset_id.clone(),
                            task_ids: req.task_ids.clone(),
                            qualifications: req.qualifications.clone(),
                            role: req.role,
                            periodicity: Periodicity::Daily,
                            required: req.required,
                            available,
                            week: Some(week),
                            day: Some(day),
                            block: None,
                        });
                    }
                }

                if day_ok {
                    summary.windows_passed += 1;
                }
            }
        }
        summary
    }

    fn evaluate_weekly(&self, assignment: &Assignment) -> (PeriodicitySummary, usize, usize) {
        let mut summary = PeriodicitySummary::default();
        let mut am_scheduled = 0;
        let mut pm_scheduled = 0;
        if self.requirements.weekly.is_empty() {
            return (summary, am_scheduled, pm_scheduled);
        }

        for week in 0..self.horizon_weeks {
            summary.windows_tested += 1;
            let (am, pm) = self.week_availability(week);
            let mut week_ok = true;

            for task in &self.requirements.weekly {
                let qualified: Vec<&Technician> = self
                    .roster
                    .active_of_role(task.role)
                    .into_iter()
                    .filter(|t| assignment.holds(&t.id, &task.qualification))
                    .collect();

                if qualified.iter().any(|t| am.contains(t.id.as_str())) {
                    am_scheduled += 1;
                    continue;
                }
                if qualified.iter().any(|t| pm.contains(t.id.as_str())) {
                    pm_scheduled += 1;
                    continue;
                }

                week_ok = false;
                summary.gaps.push(CoverageGap {
                    asset_id: task.asset_id.clone(),
                    task_ids: vec![task.task_id.clone()],
                    qualifications: vec![task.qualification.clone()],
                    role: task.role,
                    periodicity: Periodicity::Weekly,
                    required: 1,
                    available: 0,
                    week: Some(week),
                    day: None,
                    block: None,
                });
            }

            if week_ok {
                summary.windows_passed += 1;
            }
        }
        (summary, am_scheduled, pm_scheduled)
    }

    fn evaluate_monthly(&self, assignment: &Assignment) -> PeriodicitySummary {
        let mut summary = PeriodicitySummary::default();
        if self.requirements.monthly.is_empty() {
            return summary;
        }

        let blocks = self.horizon_weeks.div_ceil(BLOCK_WEEKS);
        for block in 0..blocks {
            summary.windows_tested += 1;
            let start = block * BLOCK_WEEKS;
            let end = (start + BLOCK_WEEKS).min(self.horizon_weeks);
            let available = self.block_availability(start, end);
            let mut block_ok = true;

            for task in &self.requirements.monthly {
                let covered = self
                    .roster
                    .active_of_role(task.role)
                    .iter()
                    .any(|t| {
                        assignment.holds(&t.id, &task.qualification)
                            && available.contains(t.id.as_str())
                    });

                if !covered {
                    block_ok = false;
                    summary.gaps.push(CoverageGap {
                        asset_id: task.asset_id.clone(),
                        task_ids: vec![task.task_id.clone()],
                        qualifications: vec![task.qualification.clone()],
                        role: task.role,
                        periodicity: Periodicity::Monthly,
                        required: 1,
                        available: 0,
                        week: None,
                        day: None,
                        block: Some(block),
                    });
                }
            }

            if block_ok {
                summary.windows_passed += 1;
            }
        }
        summary
    }

    /// Technicians on Early (am) and Late (pm) shift on at least one
    /// weekday of a week.
    fn week_availability(&self, week: usize) -> (BTreeSet<&str>, BTreeSet<&str>) {
        let mut am = BTreeSet::new();
        let mut pm = BTreeSet::new();
        for technician in self.roster.active() {
            for day in 0..WEEKDAYS {
                match self.shift_for(technician.role, &technician.id, week, day) {
                    ShiftCode::Early => {
                        am.insert(technician.id.as_str());
                    }
                    ShiftCode::Late => {
                        pm.insert(technician.id.as_str());
                    }
                    ShiftCode::Off => {}
                }
            }
        }
        (am, pm)
    }

    /// Technicians on Early or Late shift on at least one weekday of the
    /// week range [start, end).
    fn block_availability(&self, start: usize, end: usize) -> BTreeSet<&str> {
        let mut available = BTreeSet::new();
        for technician in self.roster.active() {
            'weeks: for week in start..end {
                for day in 0..WEEKDAYS {
                    if self.shift_for(technician.role, &technician.id, week, day) != ShiftCode::Off {
                        available.insert(technician.id.as_str());
                        break 'weeks;
                    }
                }
            }
        }
        available
    }
}

fn holds_any(assignment: &Assignment, technician: &Technician, qualifications: &[String]) -> bool {
    qualifications
        .iter()
        .any(|q| assignment.holds(&technician.id, q))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Periodicity, PpmTask, TaskCatalog, Technician, WeekPattern};

    fn rotas_all(pattern: &str, technicians: &[(&str, SkillRole)]) -> BTreeMap<SkillRole, Rota> {
        let mut by_role: BTreeMap<SkillRole, Rota> = BTreeMap::new();
        for role in SkillRole::ALL {
            let week: BTreeMap<String, WeekPattern> = technicians
                .iter()
                .filter(|(_, r)| *r == role)
                .map(|(id, _)| (id.to_string(), WeekPattern::parse(pattern).unwrap()))
                .collect();
            by_role.insert(role, Rota::empty().with_week(week));
        }
        by_role
    }

    fn roster_of(technicians: &[(&str, SkillRole)]) -> Roster {
        let mut roster = Roster::new();
        for (id, role) in technicians {
            roster = roster.with_technician(Technician::new(*id, *role));
        }
        roster
    }

    #[test]
    fn test_daily_shortfall_reported_every_weekday() {
        // One Daily electrical task of 4h against a 3h window needs 2
        // technicians on Early shift; with a single qualified holder the
        // asset must gap with shortfall 1 on every weekday.
        let catalog = TaskCatalog::new().with_task(
            PpmTask::new("D1", "GR", SkillRole::Electrical, Periodicity::Daily)
                .with_duration(4.0)
                .with_qualification("GR.D1.EL"),
        );
        let requirements = crate::requirement::RequirementModel::derive(&catalog, 3.0);

        let technicians = [("E01", SkillRole::Electrical), ("E02", SkillRole::Electrical)];
        let roster = roster_of(&technicians);
        let rotas = rotas_all("EEEEEOO", &technicians);
        let oracle = CoverageOracle::new(&requirements, &roster, &rotas, 1);

        let mut assignment = Assignment::for_roster(&roster);
        assignment.grant("E01", "GR.D1.EL");

        let result = oracle.evaluate(&assignment);
        assert_eq!(result.daily.windows_tested, 5);
        assert_eq!(result.daily.windows_passed, 0);
        assert_eq!(result.daily.gaps.len(), 5);
        for gap in &result.daily.gaps {
            assert_eq!(gap.asset_id, "GR");
            assert_eq!(gap.shortfall(), 1);
            assert_eq!(gap.periodicity, Periodicity::Daily);
        }

        // Granting the second technician closes every window.
        assignment.grant("E02", "GR.D1.EL");
        let result = oracle.evaluate(&assignment);
        assert!(result.daily.is_full());
        assert!(result.is_full_coverage());
    }

    #[test]
    fn test_zero_requirement_never_gaps() {
        let catalog = TaskCatalog::new().with_task(
            PpmTask::new("D0", "GR", SkillRole::Electrical, Periodicity::Daily)
                .with_duration(0.0)
                .with_qualification("GR.D0.EL"),
        );
        let requirements = crate::requirement::RequirementModel::derive(&catalog, 3.0);

        let technicians = [("E01", SkillRole::Electrical)];
        let roster = roster_of(&technicians);
        let rotas = rotas_all("OOOOOOO", &technicians);
        let oracle = CoverageOracle::new(&requirements, &roster, &rotas, 1);

        // Nobody holds the qualification and nobody is ever on shift, yet
        // a zero-duration group is no constraint at all.
        let result = oracle.evaluate(&Assignment::for_roster(&roster));
        assert!(result.all_gaps().next().is_none());
        assert!(result.is_full_coverage());
    }

    #[test]
    fn test_weekly_am_preference_and_pm_fallback() {
        let catalog = TaskCatalog::new().with_task(
            PpmTask::new("W1", "GR", SkillRole::Mechanical, Periodicity::Weekly)
                .with_duration(2.0)
                .with_qualification("GR.W1.ME"),
        );
        let requirements = crate::requirement::RequirementModel::derive(&catalog, 3.0);

        let technicians = [("M01", SkillRole::Mechanical)];
        let roster = roster_of(&technicians);

        // Week 0 all Early, week 1 all Late, week 2 off.
        let mut rotas = BTreeMap::new();
        for role in SkillRole::ALL {
            let mk = |p: &str| -> BTreeMap<String, WeekPattern> {
                if role == SkillRole::Mechanical {
                    [("M01".to_string(), WeekPattern::parse(p).unwrap())].into()
                } else {
                    BTreeMap::new()
                }
            };
            rotas.insert(
                role,
                Rota::empty()
                    .with_week(mk("EEEEEOO"))
                    .with_week(mk("LLLLLOO"))
                    .with_week(mk("OOOOOOO")),
            );
        }
        let oracle = CoverageOracle::new(&requirements, &roster, &rotas, 3);

        let mut assignment = Assignment::for_roster(&roster);
        assignment.grant("M01", "GR.W1.ME");

        let result = oracle.evaluate(&assignment);
        assert_eq!(result.weekly.windows_tested, 3);
        assert_eq!(result.weekly.windows_passed, 2);
        assert_eq!(result.am_scheduled, 1);
        assert_eq!(result.pm_scheduled, 1);
        assert_eq!(result.weekly.gaps.len(), 1);
        assert_eq!(result.weekly.gaps[0].week, Some(2));
    }

    #[test]
    fn test_monthly_blocks() {
        let catalog = TaskCatalog::new().with_task(
            PpmTask::new("M1", "WM", SkillRole::Electrical, Periodicity::Monthly)
                .with_duration(6.0)
                .with_qualification("WM.M1.EL"),
        );
        let requirements = crate::requirement::RequirementModel::derive(&catalog, 3.0);

        let technicians = [("E01", SkillRole::Electrical)];
        let roster = roster_of(&technicians);

        // 8-week cycle: on site only in week 2 (block 0) — block 1 gaps.
        let mut weeks = Vec::new();
        for w in 0..8 {
            let pattern = if w == 2 { "LLLLLOO" } else { "OOOOOOO" };
            weeks.push(
                [("E01".to_string(), WeekPattern::parse(pattern).unwrap())]
                    .into_iter()
                    .collect(),
            );
        }
        let mut rotas = BTreeMap::new();
        rotas.insert(SkillRole::Electrical, Rota { weeks });
        rotas.insert(SkillRole::Mechanical, Rota::empty());
        let oracle = CoverageOracle::new(&requirements, &roster, &rotas, 8);

        let mut assignment = Assignment::for_roster(&roster);
        assignment.grant("E01", "WM.M1.EL");

        let result = oracle.evaluate(&assignment);
        assert_eq!(result.monthly.windows_tested, 2);
        assert_eq!(result.monthly.windows_passed, 1);
        assert_eq!(result.monthly.gaps.len(), 1);
        assert_eq!(result.monthly.gaps[0].block, Some(1));
    }

    #[test]
    fn test_missing_rota_reports_total_failure() {
        let catalog = TaskCatalog::new().with_task(
            PpmTask::new("D1", "GR", SkillRole::Mechanical, Periodicity::Daily)
                .with_duration(1.0)
                .with_qualification("GR.D1.ME"),
        );
        let requirements = crate::requirement::RequirementModel::derive(&catalog, 3.0);

        let technicians = [("M01", SkillRole::Mechanical)];
        let roster = roster_of(&technicians);
        // No rota at all for either role.
        let rotas = BTreeMap::new();
        let oracle = CoverageOracle::new(&requirements, &roster, &rotas, 4);

        let mut assignment = Assignment::for_roster(&roster);
        assignment.grant("M01", "GR.D1.ME");

        let result = oracle.evaluate(&assignment);
        assert_eq!(result.daily.windows_passed, 0);
        assert!((result.daily.coverage_percent() - 0.0).abs() < 1e-10);
    }

    #[test]
    fn test_idempotence() {
        let catalog = TaskCatalog::new()
            .with_task(
                PpmTask::new("D1", "GR", SkillRole::Electrical, Periodicity::Daily)
                    .with_duration(2.0)
                    .with_qualification("GR.D1.EL"),
            )
            .with_task(
                PpmTask::new("W1", "GR", SkillRole::Mechanical, Periodicity::Weekly)
                    .with_duration(1.0)
                    .with_qualification("GR.W1.ME"),
            );
        let requirements = crate::requirement::RequirementModel::derive(&catalog, 3.0);

        let technicians = [("E01", SkillRole::Electrical), ("M01", SkillRole::Mechanical)];
        let roster = roster_of(&technicians);
        let rotas = rotas_all("EELLOOO", &technicians);
        let oracle = CoverageOracle::new(&requirements, &roster, &rotas, 4);

        let mut assignment = Assignment::for_roster(&roster);
        assignment.grant("E01", "GR.D1.EL");

        let first = oracle.evaluate(&assignment);
        let second = oracle.evaluate(&assignment);
        assert_eq!(first, second);
    }

    #[test]
    fn test_monotonicity_of_granting() {
        let catalog = TaskCatalog::new().with_task(
            PpmTask::new("W1", "GR", SkillRole::Electrical, Periodicity::Weekly)
                .with_duration(2.0)
                .with_qualification("GR.W1.EL"),
        );
        let requirements = crate::requirement::RequirementModel::derive(&catalog, 3.0);

        let technicians = [("E01", SkillRole::Electrical), ("E02", SkillRole::Electrical)];
        let roster = roster_of(&technicians);

        // E01 works only odd weeks, E02 only even weeks.
        let mut weeks = Vec::new();
        for w in 0..4 {
            let (p1, p2) = if w % 2 == 0 {
                ("OOOOOOO", "EEEEEOO")
            } else {
                ("EEEEEOO", "OOOOOOO")
            };
            weeks.push(
                [
                    ("E01".to_string(), WeekPattern::parse(p1).unwrap()),
                    ("E02".to_string(), WeekPattern::parse(p2).unwrap()),
                ]
                .into_iter()
                .collect(),
            );
        }
        let mut rotas = BTreeMap::new();
        rotas.insert(SkillRole::Electrical, Rota { weeks });
        rotas.insert(SkillRole::Mechanical, Rota::empty());
        let oracle = CoverageOracle::new(&requirements, &roster, &rotas, 4);

        let mut assignment = Assignment::for_roster(&roster);
        assignment.grant("E01", "GR.W1.EL");
        let before = oracle.evaluate(&assignment).weekly.coverage_percent();

        assignment.grant("E02", "GR.W1.EL");
        let after = oracle.evaluate(&assignment).weekly.coverage_percent();
        assert!(after >= before);
        assert!((after - 100.0).abs() < 1e-10);
    }
}
