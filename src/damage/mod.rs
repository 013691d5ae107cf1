pub mod effects;
pub mod latch;
pub mod model;
pub mod progression;
pub mod timer;

pub use effects::{derive_effects, EffectInputs, Effects, TurretEffect};
pub use latch::{FireLocks, Latches, RudderJam, RudderJamLatch, SunkLatch};
pub use model::{DamageEvent, DamageModel};
pub use timer::CadenceTimer;
