//! One mutex per ship, with flooding and fire on wall-clock timers
//!
//! The handle owns the two periodic tasks. Every write to the ship, from a
//! timer or from a shell, goes through the same lock. Disposal aborts both
//! tasks and waits for them before the state is released.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::core::error::Result;
use crate::damage::model::{DamageEvent, DamageModel};
use crate::firing::solution::{FiringSolution, Shell, ShotOutcome};
use crate::ship::state::ShipState;

type Tick = fn(&mut DamageModel) -> Result<Vec<DamageEvent>>;

pub struct ShipHandle {
    model: Arc<Mutex<DamageModel>>,
    timers: Vec<JoinHandle<()>>,
}

fn lock(model: &Mutex<DamageModel>) -> MutexGuard<'_, DamageModel> {
    // A panicked writer leaves whole hitboxes behind; keep simulating
    model.lock().unwrap_or_else(PoisonError::into_inner)
}

fn spawn_timer(
    model: Arc<Mutex<DamageModel>>,
    period: Duration,
    label: &'static str,
    tick: Tick,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately
        interval.tick().await;

        loop {
            interval.tick().await;
            let mut guard = lock(&model);
            if guard.is_disposed() {
                break;
            }
            if let Err(e) = tick(&mut guard) {
                tracing::warn!("{}: {} tick failed: {}", guard.state().name(), label, e);
            }
        }
    })
}

impl ShipHandle {
    /// Wrap a model and start its timers. Must be called inside a tokio runtime.
    pub fn spawn(model: DamageModel) -> Self {
        let flood_every = model.config().flood_interval();
        let fire_every = model.config().fire_interval();
        let model = Arc::new(Mutex::new(model));

        let timers = vec![
            spawn_timer(model.clone(), flood_every, "flooding", DamageModel::flood_tick),
            spawn_timer(model.clone(), fire_every, "fire", DamageModel::fire_tick),
        ];

        Self { model, timers }
    }

    /// Run `f` with exclusive access to the ship
    pub fn with_model<R>(&self, f: impl FnOnce(&mut DamageModel) -> R) -> R {
        let mut guard = lock(&self.model);
        f(&mut guard)
    }

    pub fn apply_damage(&self, name: &str, amount: f64) -> bool {
        self.with_model(|m| m.apply_damage(name, amount))
    }

    pub fn apply_hull_damage(&self, amount: f64) -> bool {
        self.with_model(|m| m.apply_hull_damage(amount))
    }

    /// Resolve a shell against this ship under its lock
    pub fn fire_at(&self, solution: &FiringSolution, shell: &Shell) -> ShotOutcome {
        self.with_model(|m| solution.fire_shell(m, shell))
    }

    /// Copy of the current state for readers outside the lock
    pub fn snapshot(&self) -> ShipState {
        self.with_model(|m| m.state().clone())
    }

    /// Stop both timers, then release the ship and return its final state
    pub async fn dispose(self) -> ShipState {
        for timer in &self.timers {
            timer.abort();
        }
        for timer in self.timers {
            // Cancelled tasks report a JoinError; that is the expected outcome
            let _ = timer.await;
        }

        match Arc::try_unwrap(self.model) {
            Ok(mutex) => mutex
                .into_inner()
                .unwrap_or_else(PoisonError::into_inner)
                .into_state(),
            Err(shared) => {
                let mut guard = lock(&shared);
                guard.dispose();
                guard.state().clone()
            }
        }
    }
}
