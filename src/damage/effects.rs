//! Derived gameplay effects of a ship's damage state
//!
//! `derive_effects` rebuilds the whole aggregate from hitboxes and the hull
//! pool on every call. Nothing else writes an `Effects`. The rules compose
//! in a fixed order; factors multiply, speed cap reductions add.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::config::CombatConfig;
use crate::core::dice::Dice;
use crate::core::types::{Knots, RudderSide};
use crate::damage::latch::{Latches, RudderJam};
use crate::ship::hitbox::{names, Hitbox, HullPool};

/// Penalty per percent of damage or flooding (0.1% per 1%)
const PER_PERCENT: f64 = 0.001;

/// Speed cap reduction, in percent of cap, per percent of damage
const BOW_CAP_WEIGHT: f64 = 0.1;
const FLOOD_CAP_WEIGHT: f64 = 0.1;
const ENGINE_CAP_WEIGHT: f64 = 0.6;
const PROP_CAP_WEIGHT: f64 = 0.1;

/// Fraction of top speed lost with the funnel fully destroyed
const FUNNEL_SPEED_LOSS: f64 = 0.25;

/// Reload multiplier for a turret with no HP left
const WRECKED_RELOAD_MULTIPLIER: f64 = 4.0;

/// Repair efficiency lost per damage control party at 100% damage
const DAMAGE_CONTROL_WEIGHT: f64 = 0.4;

/// Per-turret derived state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TurretEffect {
    /// Hit chance multiplier, 0 to 1
    pub accuracy: f64,
    /// Reload time multiplier, 1 when intact
    pub reload_multiplier: f64,
}

impl Default for TurretEffect {
    fn default() -> Self {
        Self {
            accuracy: 1.0,
            reload_multiplier: 1.0,
        }
    }
}

/// Everything the motion, gunnery and HUD layers read from damage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effects {
    pub speed_factor: f64,
    pub accel_factor: f64,
    pub turn_rate_factor: f64,
    /// Absolute top speed after damage
    pub speed_cap_kts: Knots,
    pub rudder_effectiveness_scale: f64,
    pub rudder_jam: RudderJam,
    pub rangefinder_effectiveness: f64,
    pub command_delay_seconds: f64,
    pub repair_efficiency: f64,
    pub funnel_smoke: f64,
    pub fire_percent: f64,
    pub turrets: BTreeMap<String, TurretEffect>,
    pub sunk: bool,
}

impl Effects {
    /// Effects of an undamaged ship
    pub fn pristine(base_max_kts: Knots) -> Self {
        Self {
            speed_factor: 1.0,
            accel_factor: 1.0,
            turn_rate_factor: 1.0,
            speed_cap_kts: base_max_kts,
            rudder_effectiveness_scale: 1.0,
            rudder_jam: RudderJam::None,
            rangefinder_effectiveness: 1.0,
            command_delay_seconds: 0.0,
            repair_efficiency: 1.0,
            funnel_smoke: 1.0,
            fire_percent: 0.0,
            turrets: BTreeMap::new(),
            sunk: false,
        }
    }

    /// Turret accuracy, 1.0 for turrets the ship does not track
    pub fn turret_accuracy(&self, turret: &str) -> f64 {
        self.turrets.get(turret).map(|t| t.accuracy).unwrap_or(1.0)
    }
}

/// Read-only view of the state effects derive from
#[derive(Debug, Clone, Copy)]
pub struct EffectInputs<'a> {
    pub hitboxes: &'a BTreeMap<String, Hitbox>,
    pub hull: &'a HullPool,
    /// Flood level reported by an outside flooding simulation, if any
    pub external_flood_percent: Option<f64>,
    pub base_max_kts: Knots,
}

impl EffectInputs<'_> {
    fn ratio(&self, name: &str) -> f64 {
        self.hitboxes.get(name).map(Hitbox::hp_ratio).unwrap_or(1.0)
    }

    fn damage(&self, name: &str) -> f64 {
        self.hitboxes
            .get(name)
            .map(|h| h.damage_percent.clamp(0.0, 100.0))
            .unwrap_or(0.0)
    }

    fn destroyed(&self, name: &str) -> bool {
        self.hitboxes.get(name).map(|h| h.destroyed).unwrap_or(false)
    }

    /// Mean flood percent across floodable compartments, unless an outside
    /// simulation reports a positive level
    pub fn average_flood_percent(&self) -> f64 {
        if let Some(level) = self.external_flood_percent.filter(|l| *l > 0.0) {
            return level.clamp(0.0, 100.0);
        }
        let floods: Vec<f64> = self
            .hitboxes
            .values()
            .filter(|h| h.floodable)
            .map(|h| h.flood_level.clamp(0.0, 100.0))
            .collect();
        if floods.is_empty() {
            0.0
        } else {
            floods.iter().sum::<f64>() / floods.len() as f64
        }
    }
}

/// Rebuild effects from scratch
///
/// Draws from `dice` only when the rudder first jams. Two calls with no
/// intervening mutation return identical effects.
pub fn derive_effects(
    inputs: &EffectInputs<'_>,
    config: &CombatConfig,
    latches: &mut Latches,
    dice: &mut dyn Dice,
) -> Effects {
    let mut fx = Effects::pristine(inputs.base_max_kts);
    let mut sinking = false;

    // Hull pool
    let hull_ratio = inputs.hull.ratio();
    fx.speed_factor *= hull_ratio;
    fx.turn_rate_factor *= hull_ratio;
    if hull_ratio <= 0.0 {
        sinking = true;
    }

    // Per-compartment flooding
    for hitbox in inputs.hitboxes.values().filter(|h| h.floodable) {
        let flood = hitbox.flood_level.clamp(0.0, 100.0);
        let penalty = 1.0 - PER_PERCENT * flood;
        fx.speed_factor *= penalty;
        fx.turn_rate_factor *= penalty;
        if flood >= 100.0 {
            sinking = true;
        }
    }

    // Bow
    let bow = inputs.damage(names::BOW);
    fx.speed_factor *= 1.0 - PER_PERCENT * bow;
    fx.turn_rate_factor *= 1.0 - PER_PERCENT * bow;

    // Propulsion
    let prop_ratio = inputs.ratio(names::PROP);
    fx.speed_factor *= prop_ratio;
    fx.accel_factor *= prop_ratio;
    let engine_ratio = inputs.ratio(names::ENGINE);
    fx.speed_factor *= engine_ratio;
    fx.accel_factor *= engine_ratio;

    let funnel_ratio = inputs.ratio(names::FUNNEL);
    fx.funnel_smoke = funnel_ratio;
    fx.speed_factor *= (1.0 - FUNNEL_SPEED_LOSS * (1.0 - funnel_ratio)).max(0.0);

    // Steering
    fx.rudder_effectiveness_scale = inputs.ratio(names::RUDDER);
    let rudder_wrecked =
        inputs.hitboxes.contains_key(names::RUDDER) && inputs.damage(names::RUDDER) >= 100.0;

    // Fire control and command
    fx.rangefinder_effectiveness = if inputs.destroyed(names::RANGEFINDER) {
        0.0
    } else {
        inputs.ratio(names::RANGEFINDER)
    };
    fx.command_delay_seconds =
        (1.0 - inputs.ratio(names::BRIDGE)) * config.max_command_delay_secs;

    let dc1 = inputs.damage(names::DAMAGE_CONTROL_1);
    let dc2 = inputs.damage(names::DAMAGE_CONTROL_2);
    fx.repair_efficiency = (1.0
        - DAMAGE_CONTROL_WEIGHT * dc1 / 100.0
        - DAMAGE_CONTROL_WEIGHT * dc2 / 100.0)
        .clamp(config.repair_efficiency_floor, 1.0);

    // Magazine detonation
    if inputs.damage(names::MAGAZINE) >= 100.0 || inputs.destroyed(names::MAGAZINE) {
        sinking = true;
    }

    // Turrets
    for turret in names::TURRETS {
        let Some(hitbox) = inputs.hitboxes.get(turret) else {
            continue;
        };
        let ratio = hitbox.hp_ratio();
        let reload_multiplier = if ratio > 0.0 {
            1.0 / ratio
        } else {
            WRECKED_RELOAD_MULTIPLIER
        };
        fx.turrets.insert(
            turret.to_string(),
            TurretEffect {
                accuracy: ratio,
                reload_multiplier,
            },
        );
        if hitbox.damage_percent >= 100.0 {
            latches.fire_locks.lock(turret);
        }
    }

    // Global flooding weighs on turning a second time
    let avg_flood = inputs.average_flood_percent();
    fx.turn_rate_factor *= 1.0 - PER_PERCENT * avg_flood;

    let engine = inputs.damage(names::ENGINE);
    let prop = inputs.damage(names::PROP);
    let cap_loss = (bow * BOW_CAP_WEIGHT
        + avg_flood * FLOOD_CAP_WEIGHT
        + engine * ENGINE_CAP_WEIGHT
        + prop * PROP_CAP_WEIGHT)
        .min(100.0);
    fx.speed_cap_kts = inputs.base_max_kts * (1.0 - cap_loss / 100.0);

    // Fires
    fx.fire_percent = inputs
        .hitboxes
        .iter()
        .filter(|(name, h)| h.on_fire && !latches.fire_locks.is_locked(name))
        .map(|(_, h)| h.damage_percent)
        .fold(0.0, f64::max)
        .clamp(0.0, 100.0);
    if fx.fire_percent >= 100.0 {
        sinking = true;
    }

    // Broken back
    let wrecked_sections = names::HULL_SECTIONS
        .iter()
        .filter(|s| inputs.hitboxes.contains_key(**s) && inputs.damage(s) >= 100.0)
        .count();
    if wrecked_sections >= config.hull_sections_to_sink {
        sinking = true;
    }

    if sinking {
        latches.sunk.engage();
    }
    fx.sunk = latches.sunk.is_engaged();

    if rudder_wrecked {
        if !latches.rudder_jam.current().is_jammed() {
            let side = if dice.roll() < 0.5 {
                RudderSide::Left
            } else {
                RudderSide::Right
            };
            latches.rudder_jam.jam(side);
        }
    } else if !fx.sunk {
        latches.rudder_jam.release();
    }
    fx.rudder_jam = latches.rudder_jam.current();

    fx.speed_factor = fx.speed_factor.clamp(0.0, 1.0);
    fx.accel_factor = fx.accel_factor.clamp(0.0, 1.0);
    fx.turn_rate_factor = fx.turn_rate_factor.clamp(0.0, 1.0);
    fx.speed_cap_kts = fx.speed_cap_kts.max(0.0);
    fx.rudder_effectiveness_scale = fx.rudder_effectiveness_scale.clamp(0.0, 1.0);
    fx.rangefinder_effectiveness = fx.rangefinder_effectiveness.clamp(0.0, 1.0);
    fx.funnel_smoke = fx.funnel_smoke.clamp(0.0, 1.0);

    fx
}
