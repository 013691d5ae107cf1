//! Per-shell gunnery resolution
//!
//! Hit chance is a pure product of range, turret, fire-control and speed
//! factors. Damage and hit location are rolled on the target's dice in a
//! fixed order, so a seeded run always takes the same branches.

use serde::{Deserialize, Serialize};

use crate::core::config::CombatConfig;
use crate::core::dice::Dice;
use crate::core::types::Knots;
use crate::damage::model::DamageModel;

/// One shell as handed over by the targeting layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shell {
    pub base_damage: f64,
    pub distance_m: f64,
    pub turret: String,
    pub attacker_kts: Knots,
    pub target_kts: Knots,
}

/// Where a shell landed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HitLocation {
    Hitbox(String),
    Hull,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotOutcome {
    pub hit: bool,
    pub location: Option<HitLocation>,
    pub damage: u32,
}

impl ShotOutcome {
    pub fn miss() -> Self {
        Self {
            hit: false,
            location: None,
            damage: 0,
        }
    }

    fn landed(location: HitLocation, damage: u32) -> Self {
        Self {
            hit: true,
            location: Some(location),
            damage,
        }
    }

    /// Hitbox name, if the shell struck one
    pub fn hitbox(&self) -> Option<&str> {
        match &self.location {
            Some(HitLocation::Hitbox(name)) => Some(name),
            _ => None,
        }
    }
}

/// Gunnery against one ship
#[derive(Debug, Clone)]
pub struct FiringSolution {
    max_range_m: f64,
    config: CombatConfig,
}

impl FiringSolution {
    pub fn new(max_range_m: f64, config: CombatConfig) -> Self {
        Self {
            max_range_m,
            config,
        }
    }

    /// Solution for the guns a ship carries, ranged by its main battery
    pub fn for_ship(model: &DamageModel) -> Self {
        Self::new(
            model.profile().weapons.main_battery.max_range_m,
            model.config().clone(),
        )
    }

    pub fn max_range_m(&self) -> f64 {
        self.max_range_m
    }

    fn distance_ratio(&self, distance: f64) -> f64 {
        if self.max_range_m > 0.0 && distance.is_finite() {
            distance.max(0.0) / self.max_range_m
        } else {
            1.0
        }
    }

    /// Chance a shell hits, in [0, 1]. No randomness.
    pub fn compute_hit_probability(
        &self,
        distance: f64,
        turret_accuracy: f64,
        rangefinder_effect: f64,
        attacker_kts: Knots,
        target_kts: Knots,
    ) -> f64 {
        let cfg = &self.config;
        let ratio = self.distance_ratio(distance);
        let distance_penalty = (1.0 - cfg.distance_penalty_slope * ratio).clamp(0.0, 1.0);
        let attacker_factor =
            (1.0 - cfg.attacker_speed_penalty * attacker_kts.abs()).max(cfg.attacker_speed_floor);
        let target_factor =
            (1.0 - cfg.target_speed_penalty * target_kts.abs()).max(cfg.target_speed_floor);

        let p = distance_penalty
            * clamp_unit(turret_accuracy)
            * clamp_unit(rangefinder_effect)
            * attacker_factor
            * target_factor;
        clamp_unit(p)
    }

    /// Roll a shell's damage. Zero on a miss or a dud.
    ///
    /// Draws, in order: the hit roll, then (on a hit) the dud roll, then
    /// (on a live shell) the variance.
    pub fn compute_damage(
        &self,
        distance: f64,
        base_damage: f64,
        hit_probability: f64,
        dice: &mut dyn Dice,
    ) -> u32 {
        let cfg = &self.config;
        if dice.roll() >= hit_probability {
            return 0;
        }
        if dice.chance(cfg.dud_chance) {
            return 0;
        }
        let variance = dice.uniform(cfg.variance_min, cfg.variance_max);
        let range_factor = (1.0 - (1.0 - cfg.range_factor_floor) * self.distance_ratio(distance))
            .max(cfg.range_factor_floor);
        let damage = (base_damage * variance * range_factor).round();
        if damage.is_finite() && damage > 0.0 {
            damage as u32
        } else {
            0
        }
    }

    /// Resolve one shell against `target` and apply the damage.
    ///
    /// Location branches, in roll order:
    /// a) even roll: a random intact hitbox (falls through if none are left)
    /// b) even roll: the hull pool; otherwise an even roll between a clean
    ///    miss and a pass-through hit on a random intact hitbox
    pub fn fire_shell(&self, target: &mut DamageModel, shell: &Shell) -> ShotOutcome {
        let accuracy = target.effects().turret_accuracy(&shell.turret);
        let rangefinder = target.effects().rangefinder_effectiveness;
        let probability = self.compute_hit_probability(
            shell.distance_m,
            accuracy,
            rangefinder,
            shell.attacker_kts,
            shell.target_kts,
        );

        let damage = self.compute_damage(
            shell.distance_m,
            shell.base_damage,
            probability,
            target.dice_mut(),
        );
        if damage == 0 {
            return ShotOutcome::miss();
        }

        if target.dice_mut().roll() < 0.5 {
            if let Some(name) = pick_live_hitbox(target) {
                return land_on_hitbox(target, name, damage);
            }
        }

        if target.dice_mut().roll() < 0.5 {
            if !target.apply_hull_damage(damage as f64) {
                return ShotOutcome::miss();
            }
            return ShotOutcome::landed(HitLocation::Hull, damage);
        }

        if target.dice_mut().roll() < 0.5 {
            return ShotOutcome::miss();
        }

        match pick_live_hitbox(target) {
            Some(name) => land_on_hitbox(target, name, damage),
            None => ShotOutcome::miss(),
        }
    }
}

/// Apply a shell to a hitbox; a target that refuses the damage counts as a miss
fn land_on_hitbox(target: &mut DamageModel, name: String, damage: u32) -> ShotOutcome {
    if target.apply_damage(&name, damage as f64) {
        ShotOutcome::landed(HitLocation::Hitbox(name), damage)
    } else {
        ShotOutcome::miss()
    }
}

fn pick_live_hitbox(target: &mut DamageModel) -> Option<String> {
    let mut pool = target.live_hitboxes();
    if pool.is_empty() {
        return None;
    }
    let idx = target.dice_mut().pick(pool.len());
    Some(pool.swap_remove(idx))
}

fn clamp_unit(x: f64) -> f64 {
    if x.is_finite() {
        x.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dice::ScriptedDice;
    use crate::ship::hitbox::names;
    use crate::ship::profile::ProfileCatalog;
    use crate::ship::state::ShipState;

    const MAX_RANGE: f64 = 10_000.0;

    fn solution() -> FiringSolution {
        FiringSolution::new(MAX_RANGE, CombatConfig::default())
    }

    fn target(rolls: Vec<f64>) -> DamageModel {
        let catalog = ProfileCatalog::builtin().unwrap();
        DamageModel::initialize(
            ShipState::spawn(catalog.get("battleship").unwrap()),
            CombatConfig::default(),
            Box::new(ScriptedDice::new(rolls).with_fallback(0.99)),
        )
        .unwrap()
    }

    fn shell() -> Shell {
        Shell {
            base_damage: 100.0,
            distance_m: 0.0,
            turret: names::TURRET_1.to_string(),
            attacker_kts: 0.0,
            target_kts: 0.0,
        }
    }

    #[test]
    fn test_point_blank_stationary_is_certain() {
        let p = solution().compute_hit_probability(0.0, 1.0, 1.0, 0.0, 0.0);
        assert_eq!(p, 1.0);
    }

    #[test]
    fn test_max_range_is_zero() {
        let p = solution().compute_hit_probability(MAX_RANGE, 1.0, 1.0, 0.0, 0.0);
        assert_eq!(p, 0.0);
        // Penalty bottoms out before max range
        let p = solution().compute_hit_probability(MAX_RANGE / 1.3, 1.0, 1.0, 0.0, 0.0);
        assert!(p.abs() < 1e-12);
    }

    #[test]
    fn test_speed_factors_floor() {
        let s = solution();
        let p = s.compute_hit_probability(0.0, 1.0, 1.0, 200.0, 0.0);
        assert!((p - 0.5).abs() < 1e-12);
        let p = s.compute_hit_probability(0.0, 1.0, 1.0, 0.0, 200.0);
        assert!((p - 0.3).abs() < 1e-12);
        let p = s.compute_hit_probability(0.0, 1.0, 1.0, 20.0, 30.0);
        assert!((p - 0.9 * 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_inputs_clamped() {
        let p = solution().compute_hit_probability(-50.0, 3.0, f64::NAN, 0.0, 0.0);
        assert_eq!(p, 0.0);
        let p = solution().compute_hit_probability(-50.0, 3.0, 1.0, 0.0, 0.0);
        assert_eq!(p, 1.0);
    }

    #[test]
    fn test_damage_roll_order() {
        let s = solution();
        // hit, live shell, variance 1.0, point blank
        let mut dice = ScriptedDice::new([0.1, 0.5, 0.5]);
        assert_eq!(s.compute_damage(0.0, 100.0, 0.8, &mut dice), 100);
        assert_eq!(dice.remaining(), 0);

        // miss consumes one roll only
        let mut dice = ScriptedDice::new([0.9, 0.5, 0.5]);
        assert_eq!(s.compute_damage(0.0, 100.0, 0.8, &mut dice), 0);
        assert_eq!(dice.remaining(), 2);

        // dud consumes two
        let mut dice = ScriptedDice::new([0.1, 0.05, 0.5]);
        assert_eq!(s.compute_damage(0.0, 100.0, 0.8, &mut dice), 0);
        assert_eq!(dice.remaining(), 1);
    }

    #[test]
    fn test_damage_falls_off_with_range() {
        let s = solution();
        let mut dice = ScriptedDice::new([0.0, 0.5, 0.5]);
        assert_eq!(s.compute_damage(MAX_RANGE, 100.0, 1.0, &mut dice), 75);
        let mut dice = ScriptedDice::new([0.0, 0.5, 0.0]);
        assert_eq!(s.compute_damage(MAX_RANGE / 2.0, 100.0, 1.0, &mut dice), 66);
    }

    #[test]
    fn test_direct_hitbox_branch() {
        // hit, live, variance 1.0, branch a, pick first hitbox ("bow")
        let mut t = target(vec![0.0, 0.5, 0.5, 0.1, 0.0]);
        let out = solution().fire_shell(&mut t, &shell());
        assert_eq!(out.hitbox(), Some(names::BOW));
        assert_eq!(out.damage, 100);
        assert_eq!(t.hitbox(names::BOW).unwrap().hp, 1700.0);
    }

    #[test]
    fn test_hull_branch() {
        let mut t = target(vec![0.0, 0.5, 0.5, 0.7, 0.2]);
        let out = solution().fire_shell(&mut t, &shell());
        assert_eq!(out.location, Some(HitLocation::Hull));
        assert_eq!(t.hull().current_hp, 12_000.0 - 100.0);
    }

    #[test]
    fn test_clean_miss_branch() {
        let mut t = target(vec![0.0, 0.5, 0.5, 0.7, 0.7, 0.3]);
        let out = solution().fire_shell(&mut t, &shell());
        assert_eq!(out, ShotOutcome::miss());
        assert_eq!(t.hull().current_hp, 12_000.0);
    }

    #[test]
    fn test_pass_through_branch() {
        // last pick 0.99 lands on the final hitbox in catalog order
        let mut t = target(vec![0.0, 0.5, 0.5, 0.7, 0.7, 0.6, 0.99]);
        let out = solution().fire_shell(&mut t, &shell());
        assert!(out.hit);
        assert_eq!(out.hitbox(), Some(names::TURRET_3));
        assert_eq!(t.hitbox(names::TURRET_3).unwrap().hp, 800.0);
    }

    #[test]
    fn test_disposed_target_takes_no_hits() {
        let mut t = target(vec![0.0, 0.5, 0.5, 0.1, 0.0]);
        t.dispose();
        let out = solution().fire_shell(&mut t, &shell());
        assert_eq!(out, ShotOutcome::miss());
        assert_eq!(t.hitbox(names::BOW).unwrap().hp, 1800.0);

        let mut t = target(vec![0.0, 0.5, 0.5, 0.7, 0.2]);
        t.dispose();
        let out = solution().fire_shell(&mut t, &shell());
        assert_eq!(out, ShotOutcome::miss());
        assert_eq!(t.hull().current_hp, 12_000.0);
    }

    #[test]
    fn test_wrecked_target_turret_spoils_aim() {
        let mut t = target(vec![]);
        t.apply_damage(names::TURRET_1, 900.0);
        let out = solution().fire_shell(&mut t, &shell());
        assert_eq!(out, ShotOutcome::miss());
    }
}
