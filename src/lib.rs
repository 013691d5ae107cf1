//! Broadside - naval gunnery damage resolution
//!
//! Ship class profiles, per-ship damage state with derived effects,
//! progressive flooding and fire, per-shell firing solutions, and the
//! engine telegraph and rudder model that consume the effects.

pub mod actor;
pub mod core;
pub mod damage;
pub mod firing;
pub mod fleet;
pub mod movement;
pub mod ship;

pub use crate::actor::ShipHandle;
pub use crate::core::{BroadsideError, CombatConfig, Dice, ScriptedDice, SeededDice, ShipId};
pub use crate::damage::{DamageEvent, DamageModel, Effects, RudderJam};
pub use crate::firing::{FiringSolution, HitLocation, Shell, ShotOutcome};
pub use crate::fleet::Fleet;
pub use crate::movement::{SpeedController, SpeedStep};
pub use crate::ship::{names, Hitbox, HullPool, ProfileCatalog, ShipProfile, ShipState};
