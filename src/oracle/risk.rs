//! Risk classification of an evaluated assignment.
//!
//! A qualification held by exactly one technician is a single point of
//! failure: one absence removes the capability entirely. The risk level is
//! driven by the fraction of held qualifications in that state.

use crate::models::{Assignment, CoverageStatus, RiskAnalysis, RiskLevel};

/// Analyzes holder redundancy across an assignment.
pub fn analyze(assignment: &Assignment) -> RiskAnalysis {
    let held = assignment.held_qualifications();
    let total = held.len();

    let mut single = Vec::new();
    let mut redundant = 0;
    let mut well_covered = 0;
    for qual in &held {
        match assignment.holder_count(qual) {
            1 => single.push((*qual).to_string()),
            n if n >= 3 => {
                redundant += 1;
                well_covered += 1;
            }
            _ => redundant += 1,
        }
    }

    let spof_ratio = if total == 0 {
        0.0
    } else {
        single.len() as f64 / total as f64
    };

    let level = if spof_ratio > 0.5 {
        RiskLevel::Critical
    } else if spof_ratio > 0.3 {
        RiskLevel::High
    } else if spof_ratio > 0.1 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    RiskAnalysis {
        total_qualifications: total,
        single_holder: single.len(),
        redundant,
        well_covered,
        spof_ratio,
        level,
        spof_qualifications: single,
    }
}

/// Classifies overall coverage from the three periodicity percentages.
pub fn classify_status(daily: f64, weekly: f64, monthly: f64) -> CoverageStatus {
    if daily >= 95.0 && weekly >= 95.0 && monthly >= 95.0 {
        CoverageStatus::Excellent
    } else if daily >= 90.0 && weekly >= 90.0 && monthly >= 90.0 {
        CoverageStatus::Good
    } else if daily >= 80.0 && weekly >= 85.0 && monthly >= 85.0 {
        CoverageStatus::Acceptable
    } else {
        CoverageStatus::Insufficient
    }
}
