//! Ship class profiles
//!
//! A profile is the immutable per-class template: dimensions, movement
//! envelope, guns, armor, hull capacity and the hitbox catalog. Profiles
//! are authored as TOML and cloned into every spawned ship.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::core::error::{BroadsideError, Result};
use crate::core::types::Knots;

/// Immutable class template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipProfile {
    pub identity: Identity,
    #[serde(default)]
    pub dimensions: Dimensions,
    pub propulsion: Propulsion,
    #[serde(default)]
    pub weapons: Weapons,
    #[serde(default)]
    pub armor: Armor,
    /// Optional at parse time so that a missing section surfaces as a
    /// configuration error when the damage model is built
    #[serde(default)]
    pub damage: Option<DamageProfile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub class: String,
    #[serde(default)]
    pub nation: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub length_m: f64,
    pub beam_m: f64,
    pub draft_m: f64,
    #[serde(default)]
    pub displacement_t: f64,
}

/// Movement envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Propulsion {
    /// Full astern (negative)
    pub min_speed_knots: Knots,
    pub max_speed_knots: Knots,
    /// Knots gained or shed per second at full engine power
    pub acceleration_kts_per_s: f64,
    /// Degrees per second at full rudder authority
    pub turn_rate_deg_per_s: f64,
    /// Rudder authority at 5 knots, between 0 and 1
    pub rudder_effectiveness_at_5kts: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Weapons {
    pub main_battery: Battery,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Battery {
    pub caliber_mm: f64,
    pub base_damage: f64,
    pub max_range_m: f64,
    pub reload_secs: f64,
    /// Turret hitbox names, fore to aft
    pub turrets: Vec<String>,
}

impl Default for Battery {
    fn default() -> Self {
        Self {
            caliber_mm: 127.0,
            base_damage: 100.0,
            max_range_m: 15_000.0,
            reload_secs: 4.0,
            turrets: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Armor {
    pub belt_mm: f64,
    pub deck_mm: f64,
    #[serde(default)]
    pub turret_mm: f64,
}

/// Structural catalog consumed by the damage model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DamageProfile {
    #[serde(default)]
    pub hull_integrity: Option<f64>,
    #[serde(default)]
    pub hitboxes: Option<BTreeMap<String, HitboxSpec>>,
}

/// One entry of the hitbox catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitboxSpec {
    pub hp: f64,
    #[serde(default)]
    pub floodable: bool,
    /// What losing this compartment does, for the HUD
    #[serde(default)]
    pub effect: String,
}

impl ShipProfile {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// The hitbox catalog, or a configuration error if the profile has none
    pub fn hitbox_catalog(&self) -> Result<&BTreeMap<String, HitboxSpec>> {
        let hitboxes = self
            .damage
            .as_ref()
            .and_then(|d| d.hitboxes.as_ref())
            .ok_or_else(|| {
                BroadsideError::config(format!(
                    "{}: profile has no damage.hitboxes",
                    self.identity.name
                ))
            })?;

        if hitboxes.is_empty() {
            return Err(BroadsideError::config(format!(
                "{}: damage.hitboxes is empty",
                self.identity.name
            )));
        }

        for (name, spec) in hitboxes {
            if !spec.hp.is_finite() || spec.hp <= 0.0 {
                return Err(BroadsideError::config(format!(
                    "{}: hitbox '{}' has invalid hp {}",
                    self.identity.name, name, spec.hp
                )));
            }
        }

        Ok(hitboxes)
    }

    /// Stated hull integrity, if any
    pub fn hull_integrity(&self) -> Option<f64> {
        self.damage.as_ref().and_then(|d| d.hull_integrity)
    }

    /// Check everything the simulation relies on
    pub fn validate(&self) -> Result<()> {
        let p = &self.propulsion;
        if !(p.max_speed_knots > 0.0 && p.max_speed_knots.is_finite()) {
            return Err(BroadsideError::config(format!(
                "{}: max_speed_knots must be positive",
                self.identity.name
            )));
        }
        if p.min_speed_knots > 0.0 {
            return Err(BroadsideError::config(format!(
                "{}: min_speed_knots must not be positive",
                self.identity.name
            )));
        }
        if !(0.0..=1.0).contains(&p.rudder_effectiveness_at_5kts) {
            return Err(BroadsideError::config(format!(
                "{}: rudder_effectiveness_at_5kts must be within [0, 1]",
                self.identity.name
            )));
        }
        if self.weapons.main_battery.max_range_m <= 0.0 {
            return Err(BroadsideError::config(format!(
                "{}: main battery max_range_m must be positive",
                self.identity.name
            )));
        }
        if let Some(hull) = self.hull_integrity() {
            if !hull.is_finite() || hull <= 0.0 {
                return Err(BroadsideError::config(format!(
                    "{}: hull_integrity must be positive",
                    self.identity.name
                )));
            }
        }
        self.hitbox_catalog()?;
        Ok(())
    }
}

/// Profiles indexed by class key
#[derive(Debug, Clone, Default)]
pub struct ProfileCatalog {
    profiles: BTreeMap<String, ShipProfile>,
}

const BUILTIN_PROFILES: [(&str, &str); 2] = [
    ("destroyer", include_str!("../../data/ships/destroyer.toml")),
    ("battleship", include_str!("../../data/ships/battleship.toml")),
];

impl ProfileCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Profiles bundled with the crate
    pub fn builtin() -> Result<Self> {
        let mut catalog = Self::new();
        for (key, content) in BUILTIN_PROFILES {
            catalog.insert(key, ShipProfile::from_toml_str(content)?)?;
        }
        Ok(catalog)
    }

    /// Load every `*.toml` file in a directory, keyed by file stem
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let mut catalog = Self::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("toml") {
                continue;
            }
            let Some(key) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let key = key.to_string();
            match ShipProfile::load(&path).and_then(|p| catalog.insert(&key, p)) {
                Ok(()) => tracing::debug!("Loaded ship profile '{}'", key),
                Err(e) => {
                    tracing::warn!("Rejected ship profile {}: {}", path.display(), e);
                    return Err(e);
                }
            }
        }
        Ok(catalog)
    }

    /// Validate and register a profile
    pub fn insert(&mut self, key: &str, profile: ShipProfile) -> Result<()> {
        profile.validate()?;
        self.profiles.insert(key.to_string(), profile);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&ShipProfile> {
        self.profiles.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
