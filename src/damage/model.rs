//! Damage model: the single writer of one ship's structural state
//!
//! Every mutation (hits, repairs, timer ticks) goes through here and ends
//! with a full recompute of the ship's effects.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::config::CombatConfig;
use crate::core::dice::{Dice, SeededDice};
use crate::core::error::{BroadsideError, Result};
use crate::core::types::RudderSide;
use crate::damage::effects::{derive_effects, EffectInputs, Effects};
use crate::damage::latch::{FireLocks, Latches};
use crate::damage::progression;
use crate::damage::timer::CadenceTimer;
use crate::movement::SpeedController;
use crate::ship::hitbox::{Hitbox, HullPool};
use crate::ship::profile::ShipProfile;
use crate::ship::state::ShipState;

/// Latch transitions worth telling the rest of the game about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageEvent {
    Sunk,
    RudderJammed(RudderSide),
    RudderFreed,
    TurretLocked(String),
}

pub struct DamageModel {
    state: ShipState,
    config: CombatConfig,
    dice: Box<dyn Dice>,
    flood_timer: CadenceTimer,
    fire_timer: CadenceTimer,
    disposed: bool,
}

impl std::fmt::Debug for DamageModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DamageModel")
            .field("ship", &self.state.name())
            .field("sunk", &self.state.sunk())
            .field("disposed", &self.disposed)
            .finish()
    }
}

impl DamageModel {
    /// Take ownership of a ship's state and bring it up to date.
    ///
    /// Fails with a configuration error if the profile has no usable hitbox
    /// catalog or a supplied hitbox has no usable max HP. Missing runtime
    /// hitboxes and an unsized hull pool are filled in from the profile.
    pub fn initialize(
        mut state: ShipState,
        config: CombatConfig,
        dice: Box<dyn Dice>,
    ) -> Result<Self> {
        config.validate()?;
        state.profile.validate()?;

        let catalog = state.profile.hitbox_catalog()?;
        for (name, spec) in catalog {
            state
                .hitboxes
                .entry(name.clone())
                .or_insert_with(|| Hitbox::from_spec(spec));
        }
        for (name, hitbox) in &state.hitboxes {
            hitbox.check(name).map_err(|e| {
                BroadsideError::config(format!("{}: {}", state.profile.identity.name, e))
            })?;
        }

        if state.hull.is_unset() {
            let capacity = state
                .profile
                .hull_integrity()
                .unwrap_or(config.default_hull_integrity);
            state.hull = HullPool::new(capacity);
        }

        let flood_timer = CadenceTimer::new(config.flood_interval());
        let fire_timer = CadenceTimer::new(config.fire_interval());

        let mut model = Self {
            state,
            config,
            dice,
            flood_timer,
            fire_timer,
            disposed: false,
        };
        model.recompute_effects();

        tracing::debug!(
            "Damage model up for {} ({} hitboxes, hull {})",
            model.state.name(),
            model.state.hitboxes.len(),
            model.state.hull.max_hp
        );
        Ok(model)
    }

    /// Spawn a fresh ship from a class profile with seeded dice
    pub fn spawn(profile: &ShipProfile, config: CombatConfig, seed: u64) -> Result<Self> {
        Self::initialize(
            ShipState::spawn(profile),
            config,
            Box::new(SeededDice::new(seed)),
        )
    }

    pub fn state(&self) -> &ShipState {
        &self.state
    }

    pub fn effects(&self) -> &Effects {
        &self.state.effects
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    pub fn profile(&self) -> &ShipProfile {
        &self.state.profile
    }

    pub fn hitbox(&self, name: &str) -> Option<&Hitbox> {
        self.state.hitboxes.get(name)
    }

    pub fn hull(&self) -> &HullPool {
        &self.state.hull
    }

    pub fn is_sunk(&self) -> bool {
        self.state.sunk()
    }

    pub fn fire_locks(&self) -> &FireLocks {
        self.state.fire_locks()
    }

    /// Whether a turret can still fire
    pub fn can_fire(&self, turret: &str) -> bool {
        !self.is_sunk() && !self.state.latches.fire_locks.is_locked(turret)
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Names of hitboxes that can still take damage, in catalog order
    pub fn live_hitboxes(&self) -> Vec<String> {
        self.state
            .hitboxes
            .iter()
            .filter(|(_, h)| !h.destroyed)
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn helm(&self) -> &SpeedController {
        &self.state.helm
    }

    pub fn helm_mut(&mut self) -> &mut SpeedController {
        &mut self.state.helm
    }

    pub(crate) fn dice_mut(&mut self) -> &mut dyn Dice {
        self.dice.as_mut()
    }

    /// Damage a named hitbox.
    ///
    /// Ignored unless the amount is finite and positive and the hitbox
    /// exists and is not yet destroyed. Returns whether damage was applied.
    pub fn apply_damage(&mut self, name: &str, amount: f64) -> bool {
        if self.disposed {
            return false;
        }
        let Some(hitbox) = self.state.hitboxes.get_mut(name) else {
            return false;
        };
        if !hitbox.take_damage(amount) {
            return false;
        }
        tracing::debug!(
            "{}: {} hit for {:.0}, now {}%",
            self.state.profile.identity.name,
            name,
            amount,
            hitbox.damage_percent
        );
        self.recompute_effects();
        true
    }

    /// Damage the hull pool. Ignored unless the amount is finite and positive.
    pub fn apply_hull_damage(&mut self, amount: f64) -> bool {
        if self.disposed || !self.state.hull.take_damage(amount) {
            return false;
        }
        tracing::debug!(
            "{}: hull hit for {:.0}, {:.0}/{:.0} left",
            self.state.profile.identity.name,
            amount,
            self.state.hull.current_hp,
            self.state.hull.max_hp
        );
        self.recompute_effects();
        true
    }

    /// Restore hitbox HP, scaled by current repair efficiency.
    ///
    /// Sunk ships cannot be repaired.
    pub fn repair(&mut self, name: &str, amount: f64) -> bool {
        if self.disposed || self.is_sunk() {
            return false;
        }
        let scaled = amount * self.state.effects.repair_efficiency;
        let Some(hitbox) = self.state.hitboxes.get_mut(name) else {
            return false;
        };
        if !hitbox.restore(scaled) {
            return false;
        }
        tracing::debug!(
            "{}: {} repaired to {}%",
            self.state.profile.identity.name,
            name,
            hitbox.damage_percent
        );
        self.recompute_effects();
        true
    }

    /// Restore hull HP, scaled by current repair efficiency
    pub fn repair_hull(&mut self, amount: f64) -> bool {
        if self.disposed || self.is_sunk() {
            return false;
        }
        let scaled = amount * self.state.effects.repair_efficiency;
        if !self.state.hull.restore(scaled) {
            return false;
        }
        self.recompute_effects();
        true
    }

    /// Feed in a flood level from an outside flooding simulation.
    /// `None` or a non-positive level falls back to the compartment average.
    pub fn set_external_flood_level(&mut self, level_percent: Option<f64>) {
        if self.disposed {
            return;
        }
        self.state.flooding.level_percent = level_percent.filter(|l| l.is_finite());
        self.recompute_effects();
    }

    /// Rebuild effects from current hitboxes and hull pool
    pub fn recompute_effects(&mut self) -> Vec<DamageEvent> {
        let before = self.state.latches.clone();

        let inputs = EffectInputs {
            hitboxes: &self.state.hitboxes,
            hull: &self.state.hull,
            external_flood_percent: self.state.flooding.level_percent,
            base_max_kts: self.state.profile.propulsion.max_speed_knots,
        };
        self.state.effects = derive_effects(
            &inputs,
            &self.config,
            &mut self.state.latches,
            self.dice.as_mut(),
        );

        self.latch_events(&before)
    }

    fn latch_events(&self, before: &Latches) -> Vec<DamageEvent> {
        let after = &self.state.latches;
        let name = self.state.name();
        let mut events = Vec::new();

        for turret in after.fire_locks.iter() {
            if !before.fire_locks.is_locked(turret) {
                tracing::info!("{}: {} knocked out", name, turret);
                events.push(DamageEvent::TurretLocked(turret.to_string()));
            }
        }

        let (was, now) = (before.rudder_jam.current(), after.rudder_jam.current());
        if was != now {
            match now.side() {
                Some(side) => {
                    tracing::info!("{}: rudder jammed {:?}", name, side);
                    events.push(DamageEvent::RudderJammed(side));
                }
                None => {
                    tracing::info!("{}: rudder freed", name);
                    events.push(DamageEvent::RudderFreed);
                }
            }
        }

        if !before.sunk.is_engaged() && after.sunk.is_engaged() {
            tracing::info!("{} is sinking", name);
            events.push(DamageEvent::Sunk);
        }

        events
    }

    /// Run one flooding tick now
    pub fn flood_tick(&mut self) -> Result<Vec<DamageEvent>> {
        match progression::flood_tick(&mut self.state.hitboxes, &self.config) {
            Ok(true) => Ok(self.recompute_effects()),
            Ok(false) => Ok(Vec::new()),
            Err(e) => {
                // Compartments visited before the failure may have changed
                self.recompute_effects();
                Err(e)
            }
        }
    }

    /// Run one fire tick now
    pub fn fire_tick(&mut self) -> Result<Vec<DamageEvent>> {
        match progression::fire_tick(&mut self.state.hitboxes, &self.config, self.dice.as_mut()) {
            Ok(true) => Ok(self.recompute_effects()),
            Ok(false) => Ok(Vec::new()),
            Err(e) => {
                self.recompute_effects();
                Err(e)
            }
        }
    }

    /// Advance both timers by `dt` and run whichever ticks fall due.
    ///
    /// A failing tick is logged and skipped; the timers keep running.
    pub fn advance(&mut self, dt: Duration) -> Vec<DamageEvent> {
        let mut events = Vec::new();
        if self.disposed {
            return events;
        }

        if self.flood_timer.advance(dt) {
            match self.flood_tick() {
                Ok(ev) => events.extend(ev),
                Err(e) => tracing::warn!("{}: flooding tick failed: {}", self.state.name(), e),
            }
        }

        if self.fire_timer.advance(dt) {
            match self.fire_tick() {
                Ok(ev) => events.extend(ev),
                Err(e) => tracing::warn!("{}: fire tick failed: {}", self.state.name(), e),
            }
        }

        events
    }

    /// Stop both timers and refuse further mutation
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.flood_timer.cancel();
        self.fire_timer.cancel();
        self.disposed = true;
        tracing::debug!("Damage model for {} disposed", self.state.name());
    }

    /// Dispose and hand back the final state
    pub fn into_state(mut self) -> ShipState {
        self.dispose();
        self.state
    }
}
