//! Technician and roster models.
//!
//! A technician is a member of a fixed maintenance team holding exactly
//! one skill role. The roster is loaded once per optimization run and
//! treated as read-only.

use serde::{Deserialize, Serialize};

/// Skill role of a technician. Every qualification code maps to exactly
/// one role, and a technician only ever holds qualifications of their
/// own role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SkillRole {
    Electrical,
    Mechanical,
}

impl SkillRole {
    /// Both roles, in canonical order.
    pub const ALL: [SkillRole; 2] = [SkillRole::Electrical, SkillRole::Mechanical];

    /// Lowercase label, matching task maintenance-type spellings.
    pub fn label(&self) -> &'static str {
        match self {
            SkillRole::Electrical => "electrical",
            SkillRole::Mechanical => "mechanical",
        }
    }
}

impl std::fmt::Display for SkillRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A maintenance technician.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Technician {
    /// Unique technician identifier (employee code).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Skill role.
    pub role: SkillRole,
    /// Position in the rota pattern (1-based slot, informational).
    pub rota_slot: u32,
    /// Whether the technician is active. Inactive technicians (vacancies,
    /// long-term absence) are excluded from assignment and availability.
    pub active: bool,
}

impl Technician {
    /// Creates a new active technician.
    pub fn new(id: impl Into<String>, role: SkillRole) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            role,
            rota_slot: 0,
            active: true,
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the rota slot number.
    pub fn with_rota_slot(mut self, slot: u32) -> Self {
        self.rota_slot = slot;
        self
    }

    /// Marks the technician as inactive (vacancy).
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

/// The technician roster for one team.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    /// All technicians, active or not.
    pub technicians: Vec<Technician>,
}

impl Roster {
    /// Creates an empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a technician.
    pub fn with_technician(mut self, technician: Technician) -> Self {
        self.technicians.push(technician);
        self
    }

    /// Looks up a technician by id.
    pub fn get(&self, id: &str) -> Option<&Technician> {
        self.technicians.iter().find(|t| t.id == id)
    }

    /// All active technicians.
    pub fn active(&self) -> impl Iterator<Item = &Technician> {
        self.technicians.iter().filter(|t| t.active)
    }

    /// Active technicians of a given role.
    pub fn active_of_role(&self, role: SkillRole) -> Vec<&Technician> {
        self.active().filter(|t| t.role == role).collect()
    }

    /// Number of technicians (including inactive).
    pub fn len(&self) -> usize {
        self.technicians.len()
    }

    /// Whether the roster is empty.
    pub fn is_empty(&self) -> bool {
        self.technicians.is_empty()
    }
}
