pub mod hitbox;
pub mod profile;
pub mod state;

pub use hitbox::{names, Hitbox, HullPool};
pub use profile::{
    Armor, Battery, DamageProfile, Dimensions, HitboxSpec, Identity, ProfileCatalog, Propulsion,
    ShipProfile, Weapons,
};
pub use state::{FloodingReport, ShipState};
