use thiserror::Error;

use crate::shocks::ShockLevel;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Generation failed at {level} level for unit '{unit}': {reason}")]
    Generation {
        level: ShockLevel,
        unit: String,
        reason: String,
    },

    #[error("Cannot reshape media table at state '{state}', week {week}: {detail}")]
    Reshape {
        state: String,
        week: usize,
        detail: String,
    },

    #[error("Estimation failed: {0}")]
    Estimation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SimResult<T> = Result<T, SimError>;
