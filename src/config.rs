use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::coordinator::CoordinatorConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub formation: FormationConfig,
    pub trajectory: TrajectoryConfig,
    pub coordinator: CoordinatorConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FormationConfig {
    /// World (reference) frame id; goals in other frames are converted here
    pub world_frame: String,
    /// Moving formation frame whose origin tracks the centroid
    pub formation_frame: String,
    /// Fixed agent roster, created once at process start
    pub agents: Vec<String>,
    /// Distance between adjacent formation slots (m)
    pub spacing: f64,
    /// Per-axis speed cap for slot tracking (m/s)
    pub agent_max_speed: f64,
    /// Centroid seed pose before the first mission
    pub initial_centroid: CentroidSeed,
}

impl Default for FormationConfig {
    fn default() -> Self {
        Self {
            world_frame: "earth".to_string(),
            formation_frame: "swarm".to_string(),
            agents: vec!["drone0".to_string(), "drone1".to_string()],
            spacing: 1.0,
            agent_max_speed: 0.5,
            initial_centroid: CentroidSeed::default(),
        }
    }
}

/// Seed centroid position in the world frame
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CentroidSeed {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Default for CentroidSeed {
    fn default() -> Self {
        Self {
            x: 6.0,
            y: 0.0,
            z: 1.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrajectoryConfig {
    /// Fixed sampling step for the setpoint buffer (s)
    pub sample_dt: f64,
    /// Setpoints per lookahead window
    pub lookahead_len: usize,
}

impl Default for TrajectoryConfig {
    fn default() -> Self {
        Self {
            sample_dt: 0.1,
            lookahead_len: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Enable JSON formatted logs
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from `aeroswarm.toml` in the working directory
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("aeroswarm.toml")
    }

    /// Load configuration from a specific file, then apply environment
    /// overrides (AEROSWARM_FORMATION__SPACING, etc.)
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(
                Environment::with_prefix("AEROSWARM")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }
}
