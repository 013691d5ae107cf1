//! Sticky state that derived effects cannot rebuild from HP alone
//!
//! Sinking and turret fire locks only ever engage. A rudder jam holds its
//! side until the rudder is repaired; only the effect recompute can
//! release it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::core::types::RudderSide;

/// Set-once flag. There is no way to clear it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SunkLatch {
    engaged: bool,
}

impl SunkLatch {
    /// Returns true if this call sank the ship
    pub fn engage(&mut self) -> bool {
        let newly = !self.engaged;
        self.engaged = true;
        newly
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged
    }
}

/// Rudder jam as seen by the motion layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RudderJam {
    #[default]
    None,
    Left,
    Right,
}

impl RudderJam {
    pub fn side(&self) -> Option<RudderSide> {
        match self {
            RudderJam::None => None,
            RudderJam::Left => Some(RudderSide::Left),
            RudderJam::Right => Some(RudderSide::Right),
        }
    }

    pub fn is_jammed(&self) -> bool {
        !matches!(self, RudderJam::None)
    }
}

impl From<Option<RudderSide>> for RudderJam {
    fn from(side: Option<RudderSide>) -> Self {
        match side {
            None => RudderJam::None,
            Some(RudderSide::Left) => RudderJam::Left,
            Some(RudderSide::Right) => RudderJam::Right,
        }
    }
}

/// Holds the jammed side fixed from the moment it is chosen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RudderJamLatch {
    side: Option<RudderSide>,
}

impl RudderJamLatch {
    pub fn current(&self) -> RudderJam {
        self.side.into()
    }

    /// Jam to `side` unless already jammed. Returns true if this call jammed it.
    pub(crate) fn jam(&mut self, side: RudderSide) -> bool {
        if self.side.is_some() {
            return false;
        }
        self.side = Some(side);
        true
    }

    /// Returns true if a jam was cleared
    pub(crate) fn release(&mut self) -> bool {
        self.side.take().is_some()
    }
}

/// Turrets that have been knocked out for good
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FireLocks {
    locked: BTreeSet<String>,
}

impl FireLocks {
    /// Returns true if the turret was not already locked
    pub(crate) fn lock(&mut self, turret: &str) -> bool {
        self.locked.insert(turret.to_string())
    }

    pub fn is_locked(&self, turret: &str) -> bool {
        self.locked.contains(turret)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.locked.iter().map(|t| t.as_str())
    }

    pub fn len(&self) -> usize {
        self.locked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locked.is_empty()
    }
}

/// All one-way state carried by a ship
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Latches {
    pub sunk: SunkLatch,
    pub rudder_jam: RudderJamLatch,
    pub fire_locks: FireLocks,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sunk_latch_engages_once() {
        let mut sunk = SunkLatch::default();
        assert!(!sunk.is_engaged());
        assert!(sunk.engage());
        assert!(!sunk.engage());
        assert!(sunk.is_engaged());
    }

    #[test]
    fn test_rudder_jam_keeps_first_side() {
        let mut latch = RudderJamLatch::default();
        assert!(latch.jam(RudderSide::Left));
        assert!(!latch.jam(RudderSide::Right));
        assert_eq!(latch.current(), RudderJam::Left);
        assert!(latch.release());
        assert_eq!(latch.current(), RudderJam::None);
        assert!(!latch.release());
    }

    #[test]
    fn test_fire_locks_accumulate() {
        let mut locks = FireLocks::default();
        assert!(locks.lock("turret2"));
        assert!(!locks.lock("turret2"));
        assert!(locks.is_locked("turret2"));
        assert!(!locks.is_locked("turret1"));
        assert_eq!(locks.len(), 1);
    }
}
