//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a spawned ship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShipId(pub Uuid);

impl ShipId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ShipId {
    fn default() -> Self {
        Self::new()
    }
}

/// Speed in knots. Negative is astern.
pub type Knots = f64;

/// Which way a rudder is hard over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RudderSide {
    Left,
    Right,
}

impl RudderSide {
    /// Sign of the turn this side produces (left = counter-clockwise)
    pub fn turn_sign(&self) -> f64 {
        match self {
            RudderSide::Left => -1.0,
            RudderSide::Right => 1.0,
        }
    }
}
