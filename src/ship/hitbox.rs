//! Runtime hitbox and hull pool state
//!
//! A hitbox tracks HP for one named sub-system. Damage percent is always
//! derived from HP so the two cannot drift apart.

use serde::{Deserialize, Serialize};

use crate::core::error::{BroadsideError, Result};
use crate::ship::profile::HitboxSpec;

/// Well-known hitbox names the effect rules key on
pub mod names {
    pub const BOW: &str = "bow";
    pub const HULL_FORE_1: &str = "hullfore1";
    pub const HULL_FORE_2: &str = "hullfore2";
    pub const HULL_MID: &str = "hullmid";
    pub const HULL_AFT_1: &str = "hullaft1";
    pub const HULL_AFT_2: &str = "hullaft2";
    pub const ENGINE: &str = "engine";
    pub const PROP: &str = "prop";
    pub const FUNNEL: &str = "funnel";
    pub const RUDDER: &str = "rudder";
    pub const RANGEFINDER: &str = "rangefinder";
    pub const BRIDGE: &str = "bridge";
    pub const DAMAGE_CONTROL_1: &str = "damagecontrol1";
    pub const DAMAGE_CONTROL_2: &str = "damagecontrol2";
    pub const MAGAZINE: &str = "magazine";
    pub const TURRET_1: &str = "turret1";
    pub const TURRET_2: &str = "turret2";
    pub const TURRET_3: &str = "turret3";
    pub const TURRET_4: &str = "turret4";

    /// Hull sections: flood progressively, and enough of them gone sinks the ship
    pub const HULL_SECTIONS: [&str; 6] = [
        BOW,
        HULL_FORE_1,
        HULL_FORE_2,
        HULL_MID,
        HULL_AFT_1,
        HULL_AFT_2,
    ];

    /// Compartments that can catch fire
    pub const FIRE_PRONE: [&str; 7] = [
        ENGINE, BRIDGE, MAGAZINE, TURRET_1, TURRET_2, TURRET_3, TURRET_4,
    ];

    pub const TURRETS: [&str; 4] = [TURRET_1, TURRET_2, TURRET_3, TURRET_4];
}

/// Runtime state of one named sub-system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hitbox {
    pub hp: f64,
    /// Snapshot of the class HP at spawn
    pub max_hp: f64,
    pub destroyed: bool,
    /// Whole-number percent, 0 to 100
    pub damage_percent: f64,
    pub floodable: bool,
    /// Mirrors damage percent on floodable hitboxes, 0 otherwise
    pub flood_level: f64,
    pub on_fire: bool,
}

impl Hitbox {
    /// Fresh, undamaged hitbox
    pub fn from_spec(spec: &HitboxSpec) -> Self {
        Self {
            hp: spec.hp,
            max_hp: spec.hp,
            destroyed: false,
            damage_percent: 0.0,
            floodable: spec.floodable,
            flood_level: 0.0,
            on_fire: false,
        }
    }

    /// Remaining HP as a fraction of max
    pub fn hp_ratio(&self) -> f64 {
        if self.max_hp > 0.0 {
            (self.hp / self.max_hp).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn check(&self, name: &str) -> Result<()> {
        if self.max_hp.is_finite() && self.max_hp > 0.0 {
            Ok(())
        } else {
            Err(BroadsideError::CorruptHitbox(name.to_string()))
        }
    }

    /// Subtract HP. Returns false when nothing changed.
    pub fn take_damage(&mut self, amount: f64) -> bool {
        if !amount.is_finite() || amount <= 0.0 || self.destroyed {
            return false;
        }
        self.hp = (self.hp - amount).max(0.0);
        self.sync();
        true
    }

    /// Add HP, capped at max. Returns false when nothing changed.
    pub fn restore(&mut self, amount: f64) -> bool {
        if !amount.is_finite() || amount <= 0.0 || self.hp >= self.max_hp {
            return false;
        }
        self.hp = (self.hp + amount).min(self.max_hp);
        self.sync();
        true
    }

    /// Set damage percent directly and resync HP from it
    pub fn set_damage_percent(&mut self, percent: f64) {
        let percent = percent.round().clamp(0.0, 100.0);
        self.hp = self.max_hp * (1.0 - percent / 100.0);
        self.sync();
    }

    /// Re-derive damage percent, destroyed flag and flood level from HP.
    ///
    /// HP that rounds to 100% damage is zeroed so that destroyed and
    /// 100% damage always agree.
    fn sync(&mut self) {
        if !(self.max_hp.is_finite() && self.max_hp > 0.0) {
            return;
        }
        self.hp = self.hp.clamp(0.0, self.max_hp);
        let mut percent = (100.0 * (1.0 - self.hp / self.max_hp)).round();
        if percent >= 100.0 {
            self.hp = 0.0;
            percent = 100.0;
        }
        self.damage_percent = percent.max(0.0);
        self.destroyed = self.hp <= 0.0;
        if self.floodable {
            self.flood_level = self.damage_percent;
        }
    }
}

/// Catch-all damage bucket for hits outside any named hitbox
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HullPool {
    pub current_hp: f64,
    pub max_hp: f64,
}

impl HullPool {
    pub fn new(max_hp: f64) -> Self {
        Self {
            current_hp: max_hp,
            max_hp,
        }
    }

    /// Placeholder for a pool the damage model has yet to size
    pub fn unset() -> Self {
        Self {
            current_hp: 0.0,
            max_hp: 0.0,
        }
    }

    pub fn is_unset(&self) -> bool {
        !(self.max_hp.is_finite() && self.max_hp > 0.0)
    }

    pub fn ratio(&self) -> f64 {
        if self.max_hp > 0.0 {
            (self.current_hp / self.max_hp).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Returns false when nothing changed
    pub fn take_damage(&mut self, amount: f64) -> bool {
        if !amount.is_finite() || amount <= 0.0 {
            return false;
        }
        self.current_hp = (self.current_hp - amount).clamp(0.0, self.max_hp);
        true
    }

    pub fn restore(&mut self, amount: f64) -> bool {
        if !amount.is_finite() || amount <= 0.0 || self.current_hp >= self.max_hp {
            return false;
        }
        self.current_hp = (self.current_hp + amount).min(self.max_hp);
        true
    }
}
