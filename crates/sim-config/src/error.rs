//! Configuration error taxonomy (§7): reported at construction time, before
//! the run starts.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("simulation.duration must be a positive, finite number of seconds, got {0}")]
    InvalidDuration(f64),

    #[error("simulation.timeStep must be a positive, finite number of seconds, got {0}")]
    InvalidTimeStep(f64),

    #[error("metrics.collectionInterval must be a positive, finite number of seconds, got {0}")]
    InvalidInterval(f64),

    #[error("metrics.outputFormat must be one of json, csv, yaml, got {0:?}")]
    InvalidOutputFormat(String),

    #[error("a probability field must lie in [0,1], got {field}={value}")]
    InvalidProbability { field: String, value: f64 },

    #[error("antispam.trustThreshold must lie in [0,1], got {0}")]
    InvalidTrustThreshold(f64),
}
