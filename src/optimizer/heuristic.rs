//! Fair round-robin initial assignment.
//!
//! The heuristic strategy starts every technician at zero qualifications
//! and deals the required qualifications role by role, always extending
//! the technician currently holding the fewest. The deal order is shuffled
//! with a seeded RNG so equally-ranked outcomes are tie-broken randomly
//! yet reproducibly. The result is fair but coverage-agnostic; the repair
//! loop closes the gaps afterwards.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::models::{Assignment, SkillRole};
use crate::oracle::CoverageOracle;

/// Deals every required qualification across the active technicians of its
/// role, least-loaded first.
pub fn initial_fair_assignment(oracle: &CoverageOracle<'_>, seed: u64) -> Assignment {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut assignment = Assignment::for_roster(oracle.roster());

    for role in SkillRole::ALL {
        let mut qualifications: Vec<&String> = oracle
            .requirements()
            .role_of
            .iter()
            .filter(|(_, r)| **r == role)
            .map(|(q, _)| q)
            .collect();
        qualifications.shuffle(&mut rng);

        let technicians = oracle.roster().active_of_role(role);
        if technicians.is_empty() {
            continue;
        }

        for qualification in qualifications {
            let target = technicians
                .iter()
                .min_by_key(|t| (assignment.qualification_count(&t.id), t.id.as_str()))
                .expect("role has technicians");
            assignment.grant(&target.id, qualification);
        }
    }

    assignment
}
