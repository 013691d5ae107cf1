//! Combat tuning with documented constants
//!
//! Every coefficient the damage model, firing solution and timers use is
//! collected here. The values reproduce the stock gunnery balance; a match
//! can override any subset from a TOML file.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::core::error::{BroadsideError, Result};

/// Configuration for combat resolution
///
/// Passed explicitly to every model and solution so that concurrent matches
/// (and tests) can run with different tuning side by side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    // === TIMERS ===
    /// Seconds between flooding progression ticks
    pub flood_tick_secs: f64,

    /// Seconds between fire progression ticks
    pub fire_tick_secs: f64,

    // === SECONDARY EFFECTS ===
    /// Damage percent a hull compartment must reach before flooding spreads
    /// on its own
    pub flood_progress_threshold: f64,

    /// Damage percent at which a fire-prone compartment can ignite.
    /// At or below it, any fire is put out.
    pub fire_threshold: f64,

    /// Chance per fire tick that a qualifying compartment catches fire
    pub ignition_chance: f64,

    // === SHELLS ===
    /// Chance a shell that would have hit fails to burst
    pub dud_chance: f64,

    /// Lower bound of the per-shell damage variance
    pub variance_min: f64,

    /// Upper bound of the per-shell damage variance
    pub variance_max: f64,

    /// Damage multiplier floor at maximum range
    ///
    /// rangeFactor = max(floor, 1 - (1 - floor) * distance / maxRange)
    pub range_factor_floor: f64,

    /// Slope of the distance accuracy penalty. At 1.3 the penalty reaches
    /// zero at roughly 77% of maximum range.
    pub distance_penalty_slope: f64,

    /// Accuracy lost per knot of the firing ship's own speed
    pub attacker_speed_penalty: f64,

    /// Lowest accuracy factor the firing ship's speed can impose
    pub attacker_speed_floor: f64,

    /// Accuracy lost per knot of the target's speed
    pub target_speed_penalty: f64,

    /// Lowest accuracy factor the target's speed can impose
    pub target_speed_floor: f64,

    // === DERIVED EFFECTS ===
    /// Command delay in seconds with the bridge fully destroyed
    pub max_command_delay_secs: f64,

    /// Repair efficiency never drops below this, however wrecked damage
    /// control is
    pub repair_efficiency_floor: f64,

    /// Hull pool used when a profile does not state its hull integrity
    pub default_hull_integrity: f64,

    /// How many hull sections at 100% damage break the ship's back
    pub hull_sections_to_sink: usize,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            flood_tick_secs: 5.0,
            fire_tick_secs: 5.0,

            flood_progress_threshold: 50.0,
            fire_threshold: 50.0,
            ignition_chance: 0.10,

            dud_chance: 0.10,
            variance_min: 0.75,
            variance_max: 1.25,
            range_factor_floor: 0.75,
            distance_penalty_slope: 1.3,
            attacker_speed_penalty: 0.005,
            attacker_speed_floor: 0.5,
            target_speed_penalty: 0.01,
            target_speed_floor: 0.3,

            max_command_delay_secs: 5.0,
            repair_efficiency_floor: 0.2,
            default_hull_integrity: 2000.0,
            hull_sections_to_sink: 4,
        }
    }
}

impl CombatConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML. Missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: CombatConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn flood_interval(&self) -> Duration {
        Duration::from_secs_f64(self.flood_tick_secs)
    }

    pub fn fire_interval(&self) -> Duration {
        Duration::from_secs_f64(self.fire_tick_secs)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if !(self.flood_tick_secs > 0.0 && self.flood_tick_secs.is_finite())
            || !(self.fire_tick_secs > 0.0 && self.fire_tick_secs.is_finite())
        {
            return Err(BroadsideError::config("tick intervals must be positive"));
        }

        for (name, chance) in [
            ("ignition_chance", self.ignition_chance),
            ("dud_chance", self.dud_chance),
        ] {
            if !(0.0..=1.0).contains(&chance) {
                return Err(BroadsideError::config(format!(
                    "{} ({}) must be within [0, 1]",
                    name, chance
                )));
            }
        }

        if self.variance_min <= 0.0 || self.variance_min > self.variance_max {
            return Err(BroadsideError::config(format!(
                "variance_min ({}) must be positive and <= variance_max ({})",
                self.variance_min, self.variance_max
            )));
        }

        if !(0.0..=1.0).contains(&self.range_factor_floor)
            || !(0.0..=1.0).contains(&self.attacker_speed_floor)
            || !(0.0..=1.0).contains(&self.target_speed_floor)
            || !(0.0..=1.0).contains(&self.repair_efficiency_floor)
        {
            return Err(BroadsideError::config("floors must be within [0, 1]"));
        }

        if self.default_hull_integrity <= 0.0 {
            return Err(BroadsideError::config(
                "default_hull_integrity must be positive",
            ));
        }

        if self.hull_sections_to_sink == 0 {
            return Err(BroadsideError::config(
                "hull_sections_to_sink must be at least 1",
            ));
        }

        Ok(())
    }
}
