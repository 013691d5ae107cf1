pub mod solution;

pub use solution::{FiringSolution, HitLocation, Shell, ShotOutcome};
