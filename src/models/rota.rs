//! Shift rota models and cycle expansion.
//!
//! A rota is a recurring multi-week shift schedule: each week maps
//! technician ids to a 7-day pattern of shift codes. Native cycles differ
//! in length between roles, so coverage is always evaluated over an
//! expanded horizon that tiles each native cycle end-to-end until every
//! phase alignment between the roles' patterns has been exercised.
//!
//! # Week layout
//! Days are indexed 0–6 starting Monday. Maintenance windows only exist on
//! weekdays (0–4); weekend columns are carried but never queried by the
//! coverage oracle.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A technician's availability class for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ShiftCode {
    /// Early shift — the only window in which Daily tasks may run.
    Early,
    /// Late shift — fallback window for Weekly tasks, valid for Monthly.
    Late,
    /// Not on site.
    Off,
}

impl ShiftCode {
    /// Parses a rota-sheet code (`E`, `L`, or `O`).
    pub fn from_code(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'E' => Some(ShiftCode::Early),
            'L' => Some(ShiftCode::Late),
            'O' => Some(ShiftCode::Off),
            _ => None,
        }
    }

    /// Rota-sheet code for this shift.
    pub fn code(&self) -> char {
        match self {
            ShiftCode::Early => 'E',
            ShiftCode::Late => 'L',
            ShiftCode::Off => 'O',
        }
    }
}

/// One technician's shifts for one week, Monday through Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekPattern(pub [ShiftCode; 7]);

impl WeekPattern {
    /// A week entirely off.
    pub fn off() -> Self {
        WeekPattern([ShiftCode::Off; 7])
    }

    /// Parses a 7-character pattern string such as `"EEEEEOO"`.
    pub fn parse(s: &str) -> Option<Self> {
        let mut days = [ShiftCode::Off; 7];
        let mut chars = s.chars();
        for day in &mut days {
            *day = ShiftCode::from_code(chars.next()?)?;
        }
        if chars.next().is_some() {
            return None;
        }
        Some(WeekPattern(days))
    }

    /// Shift on a given day (0 = Monday).
    #[inline]
    pub fn shift_on(&self, day: usize) -> ShiftCode {
        self.0.get(day).copied().unwrap_or(ShiftCode::Off)
    }
}

/// A role's rota: an ordered cycle of weeks, each mapping technician id to
/// a week pattern.
///
/// An empty rota (missing rota file) is valid input everywhere: it expands
/// to an empty rota and every technician of the role reads as `Off`, so
/// coverage correctly reports total failure instead of crashing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Rota {
    /// Weeks of the native cycle, in rotation order.
    pub weeks: Vec<BTreeMap<String, WeekPattern>>,
}

impl Rota {
    /// Creates an empty rota (no weeks, nobody available).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Adds a week to the native cycle.
    pub fn with_week(mut self, week: BTreeMap<String, WeekPattern>) -> Self {
        self.weeks.push(week);
        self
    }

    /// Length of the native cycle in weeks.
    pub fn cycle_len(&self) -> usize {
        self.weeks.len()
    }

    /// Whether the rota has no weeks.
    pub fn is_empty(&self) -> bool {
        self.weeks.is_empty()
    }

    /// Expands the native cycle onto a horizon by tiling it end-to-end
    /// (wrap-around repetition) until `target_weeks` is reached or
    /// exceeded, then truncating. An empty rota stays empty.
    pub fn expand_to(&self, target_weeks: usize) -> Rota {
        if self.weeks.is_empty() || target_weeks == 0 {
            return Rota {
                weeks: self.weeks.clone(),
            };
        }
        let weeks = (0..target_weeks)
            .map(|w| self.weeks[w % self.weeks.len()].clone())
            .collect();
        Rota { weeks }
    }

    /// Shift of a technician on a given week and day. Unknown weeks or
    /// technicians read as `Off`.
    pub fn shift_for(&self, week: usize, technician_id: &str, day: usize) -> ShiftCode {
        self.weeks
            .get(week)
            .and_then(|w| w.get(technician_id))
            .map(|p| p.shift_on(day))
            .unwrap_or(ShiftCode::Off)
    }
}

/// Picks an evaluation horizon that exercises every phase alignment of the
/// given native cycle lengths: the least common multiple of all non-zero
/// lengths, scaled up in whole multiples to at least `min_weeks`.
///
/// Evaluating only one native cycle length risks never observing the
/// unlucky alignments where both roles are simultaneously short-staffed.
pub fn evaluation_horizon(cycle_lens: &[usize], min_weeks: usize) -> usize {
    let base = cycle_lens
        .iter()
        .copied()
        .filter(|&l| l > 0)
        .fold(1, lcm);
    if base >= min_weeks {
        base
    } else {
        base * min_weeks.div_ceil(base)
    }
}

fn gcd(a: usize, b: usize) -> usize {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

fn lcm(a: usize, b: usize) -> usize {
    a / gcd(a, b) * b
}

/// A technician's availability statistics over an expanded rota,
/// weekdays only. Used to rank repair candidates by how well their shift
/// pattern fits a gap's window.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ShiftProfile {
    /// Weekday count on Early shift.
    pub early_days: u32,
    /// Weekday count on Late shift.
    pub late_days: u32,
    /// Total weekdays observed.
    pub weekdays: u32,
}

impl ShiftProfile {
    /// Fraction of weekdays on Early shift.
    pub fn early_ratio(&self) -> f64 {
        if self.weekdays == 0 {
            0.0
        } else {
            f64::from(self.early_days) / f64::from(self.weekdays)
        }
    }

    /// Fraction of weekdays on Early or Late shift.
    pub fn any_ratio(&self) -> f64 {
        if self.weekdays == 0 {
            0.0
        } else {
            f64::from(self.early_days + self.late_days) / f64::from(self.weekdays)
        }
    }
}

/// Computes per-technician shift profiles over an (expanded) rota.
pub fn shift_profiles(rota: &Rota) -> BTreeMap<String, ShiftProfile> {
    let mut profiles: BTreeMap<String, ShiftProfile> = BTreeMap::new();
    for week in &rota.weeks {
        for (id, pattern) in week {
            let p = profiles.entry(id.clone()).or_default();
            for day in 0..5 {
                p.weekdays += 1;
                match pattern.shift_on(day) {
                    ShiftCode::Early => p.early_days += 1,
                    ShiftCode::Late => p.late_days += 1,
                    ShiftCode::Off => {}
                }
            }
        }
    }
    profiles
}
