pub mod controller;

pub use controller::{MovementState, SpeedController, SpeedStep, DETENT_KTS};
