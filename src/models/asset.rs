//! Asset (ride) reference data.
//!
//! Assets are the maintained installations. Immutable during a run.

use serde::{Deserialize, Serialize};

/// Asset complexity classification.
///
/// Drives the optional equal-distribution constraints in the exact
/// optimizer: class A assets are the high-value installations that should
/// not concentrate on a few technicians.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ComplexityClass {
    A,
    B,
    C,
}

impl ComplexityClass {
    /// All classes, in canonical order.
    pub const ALL: [ComplexityClass; 3] =
        [ComplexityClass::A, ComplexityClass::B, ComplexityClass::C];
}

/// A maintained asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    /// Unique asset identifier (ride code).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Complexity class.
    pub complexity: ComplexityClass,
    /// Owning team id.
    pub team: u32,
}

impl Asset {
    /// Creates a new asset.
    pub fn new(id: impl Into<String>, complexity: ComplexityClass) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            complexity,
            team: 1,
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the owning team.
    pub fn with_team(mut self, team: u32) -> Self {
        self.team = team;
        self
    }
}

/// Reference register of the team's assets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetRegister {
    /// All assets for the team under optimization.
    pub assets: Vec<Asset>,
}

impl AssetRegister {
    /// Creates an empty register.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an asset.
    pub fn with_asset(mut self, asset: Asset) -> Self {
        self.assets.push(asset);
        self
    }

    /// Looks up an asset by id.
    pub fn get(&self, id: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.id == id)
    }

    /// Assets of a given complexity class.
    pub fn of_class(&self, class: ComplexityClass) -> Vec<&Asset> {
        self.assets.iter().filter(|a| a.complexity == class).collect()
    }

    /// Number of assets.
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Whether the register is empty.
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}
