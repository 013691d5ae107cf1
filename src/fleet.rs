//! Registry of live ships for one match
//!
//! Each match owns its own fleet, so concurrent matches and tests never
//! share ship ids, dice streams or profiles.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::core::config::CombatConfig;
use crate::core::dice::SeededDice;
use crate::core::error::{BroadsideError, Result};
use crate::core::types::ShipId;
use crate::damage::model::{DamageEvent, DamageModel};
use crate::firing::solution::{FiringSolution, Shell, ShotOutcome};
use crate::ship::profile::ProfileCatalog;
use crate::ship::state::ShipState;

pub struct Fleet {
    catalog: ProfileCatalog,
    config: CombatConfig,
    ships: BTreeMap<ShipId, DamageModel>,
    /// Spawn order, for stable iteration
    order: Vec<ShipId>,
    seed: u64,
    spawned: u64,
}

impl Fleet {
    pub fn new(catalog: ProfileCatalog, config: CombatConfig, seed: u64) -> Self {
        Self {
            catalog,
            config,
            ships: BTreeMap::new(),
            order: Vec::new(),
            seed,
            spawned: 0,
        }
    }

    pub fn catalog(&self) -> &ProfileCatalog {
        &self.catalog
    }

    /// Spawn a ship of the given class. Each ship gets its own dice stream
    /// derived from the fleet seed and spawn count.
    pub fn spawn(&mut self, class: &str) -> Result<ShipId> {
        let profile = self.catalog.get(class).ok_or_else(|| {
            BroadsideError::config(format!("unknown ship class '{}'", class))
        })?;
        let dice_seed = self
            .seed
            .wrapping_add(self.spawned.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        let model = DamageModel::initialize(
            ShipState::spawn(profile),
            self.config.clone(),
            Box::new(SeededDice::new(dice_seed)),
        )?;

        let id = ShipId::new();
        self.spawned += 1;
        self.ships.insert(id, model);
        self.order.push(id);
        tracing::info!("Spawned {} as {:?}", class, id);
        Ok(id)
    }

    /// Remove a ship, stopping its timers, and return its final state
    pub fn despawn(&mut self, id: ShipId) -> Result<ShipState> {
        let model = self.ships.remove(&id).ok_or(BroadsideError::UnknownShip(id))?;
        self.order.retain(|s| *s != id);
        Ok(model.into_state())
    }

    pub fn get(&self, id: ShipId) -> Result<&DamageModel> {
        self.ships.get(&id).ok_or(BroadsideError::UnknownShip(id))
    }

    pub fn get_mut(&mut self, id: ShipId) -> Result<&mut DamageModel> {
        self.ships.get_mut(&id).ok_or(BroadsideError::UnknownShip(id))
    }

    pub fn ids(&self) -> &[ShipId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.ships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ships.is_empty()
    }

    /// Fire one main-battery shell from `attacker`'s turret at `target`.
    ///
    /// Returns `None` when the attacker is sunk or the turret is knocked out.
    pub fn fire(
        &mut self,
        attacker: ShipId,
        target: ShipId,
        turret: &str,
        distance_m: f64,
    ) -> Result<Option<ShotOutcome>> {
        let (base_damage, max_range_m, attacker_kts) = {
            let shooter = self.get(attacker)?;
            if !shooter.can_fire(turret) {
                return Ok(None);
            }
            let battery = &shooter.profile().weapons.main_battery;
            (
                battery.base_damage,
                battery.max_range_m,
                shooter.helm().actual_kts(),
            )
        };
        // Range is the shooter's guns; aim degradation is read off the target
        let solution = FiringSolution::new(max_range_m, self.config.clone());

        let victim = self.get_mut(target)?;
        let shell = Shell {
            base_damage,
            distance_m,
            turret: turret.to_string(),
            attacker_kts,
            target_kts: victim.helm().actual_kts(),
        };
        Ok(Some(solution.fire_shell(victim, &shell)))
    }

    /// Advance every ship's timers and helm by `dt`
    pub fn advance(&mut self, dt: Duration) -> Vec<(ShipId, DamageEvent)> {
        let mut events = Vec::new();
        for id in &self.order {
            let Some(model) = self.ships.get_mut(id) else {
                continue;
            };
            events.extend(model.advance(dt).into_iter().map(|e| (*id, e)));
            let effects = model.effects().clone();
            model.helm_mut().step(dt, &effects);
        }
        events
    }
}
