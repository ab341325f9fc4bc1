//! Scenario configuration loading and validation (§6, §9).
//!
//! A `serde`-derived document struct with `#[serde(default)]` leaf defaults
//! and a `load_from` entry point that discovers a file when no override path
//! is given, using YAML (§6) and an explicit, typed [`ConfigError`] rather
//! than silent fallback-to-defaults on a parse error (§7: "Configuration
//! errors ... reported at construction time; the run does not start").

mod error;

pub use error::ConfigError;

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
    Yaml,
}

impl OutputFormat {
    /// Case-insensitive parse of the `metrics.outputFormat` scalar. The
    /// field is read as a raw string (rather than deserialized straight into
    /// this enum) so an unrecognized value surfaces as
    /// [`ConfigError::InvalidOutputFormat`] rather than a generic YAML parse
    /// error, matching the other scalar-validation error kinds in §7.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            "yaml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub duration: f64,
    #[serde(rename = "timeStep")]
    pub time_step: f64,
    #[serde(rename = "randomSeed")]
    pub random_seed: Option<u64>,
    #[serde(rename = "maxEvents")]
    pub max_events: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            duration: 3600.0,
            time_step: 1.0,
            random_seed: None,
            max_events: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    #[serde(rename = "collectionInterval")]
    pub collection_interval: f64,
    #[serde(rename = "outputFormat")]
    pub output_format_raw: String,
    #[serde(rename = "outputFile")]
    pub output_file: Option<PathBuf>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            collection_interval: 10.0,
            output_format_raw: "json".to_string(),
            output_file: None,
        }
    }
}

impl MetricsConfig {
    /// The resolved output format, or `None` if `outputFormat` is not one of
    /// `json`/`csv`/`yaml`. Populated only after [`ScenarioConfig::validate`]
    /// has confirmed it parses; callers past that point may default safely.
    pub fn output_format(&self) -> Option<OutputFormat> {
        OutputFormat::parse(&self.output_format_raw)
    }
}

/// Scalar leaf read from an ambient (`network`/`antispam`/`attacks`) section
/// for the handful of well-known keys this layer validates on the core's
/// behalf, without otherwise interpreting the section (§6: "the core does
/// not interpret them; they are surfaced to `demos`").
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AntiSpamConfig {
    #[serde(rename = "trustThreshold")]
    pub trust_threshold: Option<f64>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

/// Full scenario document: the `simulation`/`metrics` keys the core reads
/// plus three pass-through sections a `demos` scenario binds to its own
/// agents and strategies (§6).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub simulation: SimulationConfig,
    pub metrics: MetricsConfig,
    pub network: HashMap<String, serde_yaml::Value>,
    pub antispam: AntiSpamConfig,
    pub attacks: HashMap<String, serde_yaml::Value>,
}

impl ScenarioConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.simulation.duration > 0.0) || !self.simulation.duration.is_finite() {
            return Err(ConfigError::InvalidDuration(self.simulation.duration));
        }
        if !(self.simulation.time_step > 0.0) || !self.simulation.time_step.is_finite() {
            return Err(ConfigError::InvalidTimeStep(self.simulation.time_step));
        }
        if !(self.metrics.collection_interval > 0.0) || !self.metrics.collection_interval.is_finite() {
            return Err(ConfigError::InvalidInterval(self.metrics.collection_interval));
        }
        if self.metrics.output_format().is_none() {
            return Err(ConfigError::InvalidOutputFormat(self.metrics.output_format_raw.clone()));
        }
        if let Some(threshold) = self.antispam.trust_threshold {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(ConfigError::InvalidTrustThreshold(threshold));
            }
        }
        for (key, value) in self.antispam.extra.iter().chain(self.attacks.iter()) {
            if key.to_lowercase().contains("probability") {
                if let Some(number) = value.as_f64() {
                    if !(0.0..=1.0).contains(&number) {
                        return Err(ConfigError::InvalidProbability {
                            field: key.clone(),
                            value: number,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

/// Best-effort scenario file location: prefer a file in the working
/// directory, then fall back to a platform config directory.
pub fn discover() -> PathBuf {
    let local = PathBuf::from("scenario.yaml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("nostr-sim").join("scenario.yaml");
    }
    PathBuf::from("scenario.yaml")
}

/// Load and validate a scenario config. A missing file at the discovered or
/// given path yields all-default configuration (there is no obligation to
/// configure a run); a file that exists but fails to parse or fails
/// validation is a hard [`ConfigError`] — the run does not start (§7).
pub fn load_from(path: Option<PathBuf>) -> Result<ScenarioConfig, ConfigError> {
    let path = path.unwrap_or_else(discover);
    let config = match std::fs::read_to_string(&path) {
        Ok(content) => {
            debug!(target: "config", path = %path.display(), "scenario config file read");
            serde_yaml::from_str::<ScenarioConfig>(&content)?
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            info!(target: "config", path = %path.display(), "no scenario config found; using defaults");
            ScenarioConfig::default()
        }
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.display().to_string(),
                source,
            });
        }
    };
    config.validate()?;
    Ok(config)
}

/// Load and validate from an in-memory YAML document, for callers (and
/// tests) that do not want to touch the filesystem.
pub fn load_str(yaml: &str) -> Result<ScenarioConfig, ConfigError> {
    let config: ScenarioConfig = serde_yaml::from_str(yaml)?;
    config.validate()?;
    Ok(config)
}

pub fn default_scenario_path() -> PathBuf {
    discover()
}
