//! Per-ship runtime state
//!
//! Created at spawn from a clone of the class profile. The damage model
//! owns it afterwards and is the only writer of hitboxes, hull, effects
//! and latches.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::damage::effects::Effects;
use crate::damage::latch::{FireLocks, Latches};
use crate::movement::SpeedController;
use crate::ship::hitbox::{Hitbox, HullPool};
use crate::ship::profile::ShipProfile;

/// Flood level reported by an outside flooding simulation
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FloodingReport {
    pub level_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipState {
    pub profile: ShipProfile,
    /// Missing entries are backfilled from the profile catalog
    #[serde(default)]
    pub hitboxes: BTreeMap<String, Hitbox>,
    /// A pool with no capacity counts as missing and is backfilled
    #[serde(default = "HullPool::unset")]
    pub hull: HullPool,
    pub effects: Effects,
    #[serde(default)]
    pub latches: Latches,
    #[serde(default)]
    pub flooding: FloodingReport,
    pub helm: SpeedController,
}

impl ShipState {
    /// Fresh state for a newly spawned ship
    pub fn spawn(profile: &ShipProfile) -> Self {
        let profile = profile.clone();
        let effects = Effects::pristine(profile.propulsion.max_speed_knots);
        let helm = SpeedController::new(profile.propulsion.clone());
        Self {
            profile,
            hitboxes: BTreeMap::new(),
            hull: HullPool::unset(),
            effects,
            latches: Latches::default(),
            flooding: FloodingReport::default(),
            helm,
        }
    }

    pub fn name(&self) -> &str {
        &self.profile.identity.name
    }

    pub fn sunk(&self) -> bool {
        self.latches.sunk.is_engaged()
    }

    pub fn fire_locks(&self) -> &FireLocks {
        &self.latches.fire_locks
    }
}
