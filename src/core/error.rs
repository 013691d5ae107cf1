use thiserror::Error;

#[derive(Error, Debug)]
pub enum BroadsideError {
    /// Missing or malformed ship profile or combat config
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Ship not found: {0:?}")]
    UnknownShip(crate::core::types::ShipId),

    #[error("Hitbox '{0}' has no usable max HP")]
    CorruptHitbox(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BroadsideError {
    pub fn config(msg: impl Into<String>) -> Self {
        BroadsideError::Configuration(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, BroadsideError>;
