//! Qualification-coverage domain models.
//!
//! Core data types for the planning problem and its results. Technicians,
//! assets, and tasks are loaded once per run and treated as read-only; the
//! `Assignment` is the sole mutable artifact; `CoverageResult` is
//! recomputed, never mutated.

mod asset;
mod assignment;
mod coverage;
mod rota;
mod task;
mod technician;

pub use asset::{Asset, AssetRegister, ComplexityClass};
pub use assignment::{Assignment, RoleViolation};
pub use coverage::{
    CoverageGap, CoverageResult, CoverageStatus, PeriodicitySummary, RiskAnalysis, RiskLevel,
};
pub use rota::{
    evaluation_horizon, shift_profiles, Rota, ShiftCode, ShiftProfile, WeekPattern,
};
pub use task::{Periodicity, PpmTask, TaskCatalog};
pub use technician::{Roster, SkillRole, Technician};
