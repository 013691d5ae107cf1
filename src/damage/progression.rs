//! Slow-acting secondary damage: progressive flooding and fire
//!
//! Each function runs one tick over the compartments it governs and
//! reports whether any hitbox changed. Compartments are visited in a fixed
//! order so seeded runs replay exactly. A corrupt compartment is skipped
//! and reported after the rest of the tick has run.

use std::collections::BTreeMap;

use crate::core::config::CombatConfig;
use crate::core::dice::Dice;
use crate::core::error::{BroadsideError, Result};
use crate::ship::hitbox::{names, Hitbox};

/// One flooding tick
///
/// A hull section that is floodable, partly flooded, and damaged past the
/// threshold takes on one more percent. Flooding never reverses here.
pub fn flood_tick(hitboxes: &mut BTreeMap<String, Hitbox>, config: &CombatConfig) -> Result<bool> {
    let mut changed = false;
    let mut corrupt = None;

    for name in names::HULL_SECTIONS {
        let Some(hitbox) = hitboxes.get_mut(name) else {
            continue;
        };
        if !hitbox.floodable {
            continue;
        }
        if let Err(e) = hitbox.check(name) {
            skip_corrupt(&mut corrupt, e);
            continue;
        }

        let flooding = hitbox.flood_level > 0.0 && hitbox.flood_level < 100.0;
        if flooding && hitbox.damage_percent > config.flood_progress_threshold {
            let next = (hitbox.damage_percent + 1.0).min(100.0);
            hitbox.set_damage_percent(next);
            tracing::debug!("{} flooding spreads to {}%", name, hitbox.damage_percent);
            changed = true;
        }
    }

    finish(changed, corrupt)
}

/// One fire tick
///
/// At or below the threshold a fire goes out. Above it, an unburnt
/// compartment may ignite; a burning one loses one more percent until it
/// is gutted.
pub fn fire_tick(
    hitboxes: &mut BTreeMap<String, Hitbox>,
    config: &CombatConfig,
    dice: &mut dyn Dice,
) -> Result<bool> {
    let mut changed = false;
    let mut corrupt = None;

    for name in names::FIRE_PRONE {
        let Some(hitbox) = hitboxes.get_mut(name) else {
            continue;
        };
        if let Err(e) = hitbox.check(name) {
            skip_corrupt(&mut corrupt, e);
            continue;
        }

        if hitbox.damage_percent <= config.fire_threshold {
            if hitbox.on_fire {
                hitbox.on_fire = false;
                tracing::debug!("Fire in {} extinguished", name);
                changed = true;
            }
            continue;
        }

        if !hitbox.on_fire {
            if dice.chance(config.ignition_chance) {
                hitbox.on_fire = true;
                tracing::debug!("{} caught fire at {}%", name, hitbox.damage_percent);
                changed = true;
            }
        } else if hitbox.damage_percent < 100.0 {
            let next = hitbox.damage_percent + 1.0;
            hitbox.set_damage_percent(next);
            changed = true;
        }
    }

    finish(changed, corrupt)
}

fn skip_corrupt(first: &mut Option<BroadsideError>, err: BroadsideError) {
    tracing::warn!("Skipping compartment this tick: {}", err);
    first.get_or_insert(err);
}

fn finish(changed: bool, corrupt: Option<BroadsideError>) -> Result<bool> {
    match corrupt {
        Some(err) => Err(err),
        None => Ok(changed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dice::ScriptedDice;
    use crate::core::error::BroadsideError;
    use crate::ship::profile::HitboxSpec;

    fn compartment(floodable: bool, percent: f64) -> Hitbox {
        let mut hb = Hitbox::from_spec(&HitboxSpec {
            hp: 200.0,
            floodable,
            effect: String::new(),
        });
        hb.set_damage_percent(percent);
        hb
    }

    #[test]
    fn test_flooding_spreads_past_half() {
        let mut map = BTreeMap::new();
        map.insert("hullmid".to_string(), compartment(true, 60.0));
        assert!(flood_tick(&mut map, &CombatConfig::default()).unwrap());
        assert_eq!(map["hullmid"].damage_percent, 61.0);
        assert_eq!(map["hullmid"].flood_level, 61.0);
    }

    #[test]
    fn test_flooding_holds_at_half() {
        let mut map = BTreeMap::new();
        map.insert("hullmid".to_string(), compartment(true, 50.0));
        map.insert("bow".to_string(), compartment(true, 20.0));
        assert!(!flood_tick(&mut map, &CombatConfig::default()).unwrap());
        assert_eq!(map["hullmid"].damage_percent, 50.0);
        assert_eq!(map["bow"].damage_percent, 20.0);
    }

    #[test]
    fn test_flooding_ignores_dry_and_non_hull() {
        let mut map = BTreeMap::new();
        map.insert("hullaft1".to_string(), compartment(false, 80.0));
        map.insert("engine".to_string(), compartment(true, 80.0));
        assert!(!flood_tick(&mut map, &CombatConfig::default()).unwrap());
    }

    #[test]
    fn test_flooding_stops_when_full() {
        let mut map = BTreeMap::new();
        map.insert("bow".to_string(), compartment(true, 99.0));
        flood_tick(&mut map, &CombatConfig::default()).unwrap();
        assert!(map["bow"].destroyed);
        assert!(!flood_tick(&mut map, &CombatConfig::default()).unwrap());
    }

    #[test]
    fn test_ignition_then_burn() {
        let mut map = BTreeMap::new();
        map.insert("engine".to_string(), compartment(false, 60.0));
        let config = CombatConfig::default();

        // 0.05 < 10% ignition chance
        let mut dice = ScriptedDice::new([0.05]);
        assert!(fire_tick(&mut map, &config, &mut dice).unwrap());
        assert!(map["engine"].on_fire);
        assert_eq!(map["engine"].damage_percent, 60.0);

        assert!(fire_tick(&mut map, &config, &mut dice).unwrap());
        assert_eq!(map["engine"].damage_percent, 61.0);
    }

    #[test]
    fn test_no_ignition_on_high_roll() {
        let mut map = BTreeMap::new();
        map.insert("bridge".to_string(), compartment(false, 75.0));
        let mut dice = ScriptedDice::new([0.5]);
        assert!(!fire_tick(&mut map, &CombatConfig::default(), &mut dice).unwrap());
        assert!(!map["bridge"].on_fire);
    }

    #[test]
    fn test_fire_goes_out_at_half() {
        let mut map = BTreeMap::new();
        let mut hb = compartment(false, 50.0);
        hb.on_fire = true;
        map.insert("magazine".to_string(), hb);
        let mut dice = ScriptedDice::new([]);
        assert!(fire_tick(&mut map, &CombatConfig::default(), &mut dice).unwrap());
        assert!(!map["magazine"].on_fire);
    }

    #[test]
    fn test_corrupt_compartment_reports_error() {
        let mut map = BTreeMap::new();
        let mut hb = compartment(true, 60.0);
        hb.max_hp = f64::NAN;
        map.insert("hullfore1".to_string(), hb);
        let result = flood_tick(&mut map, &CombatConfig::default());
        assert!(matches!(result, Err(BroadsideError::CorruptHitbox(_))));
    }

    #[test]
    fn test_corrupt_section_does_not_block_later_sections() {
        let mut map = BTreeMap::new();
        let mut bow = compartment(true, 60.0);
        bow.max_hp = 0.0;
        map.insert("bow".to_string(), bow);
        map.insert("hullmid".to_string(), compartment(true, 60.0));

        let result = flood_tick(&mut map, &CombatConfig::default());
        assert!(matches!(result, Err(BroadsideError::CorruptHitbox(ref n)) if n == "bow"));
        assert_eq!(map["hullmid"].damage_percent, 61.0);
    }

    #[test]
    fn test_corrupt_engine_does_not_block_turret_fire() {
        let mut map = BTreeMap::new();
        let mut engine = compartment(false, 80.0);
        engine.max_hp = f64::NAN;
        map.insert("engine".to_string(), engine);
        let mut turret = compartment(false, 70.0);
        turret.on_fire = true;
        map.insert("turret2".to_string(), turret);

        let mut dice = ScriptedDice::new([]);
        let result = fire_tick(&mut map, &CombatConfig::default(), &mut dice);
        assert!(result.is_err());
        assert_eq!(map["turret2"].damage_percent, 71.0);
    }
}
