pub mod config;
pub mod dice;
pub mod error;
pub mod types;

pub use config::CombatConfig;
pub use dice::{Dice, ScriptedDice, SeededDice};
pub use error::{BroadsideError, Result};
pub use types::{Knots, RudderSide, ShipId};
