//! Run configuration
//!
//! A RON file naming the JSON documents a run is built from:
//!
//! ```ron
//! (
//!     disease_model: Some("disease.json"),
//!     traits: Some("traits.json"),
//!     variables: Some("variables.json"),
//!     interventions: Some("interventions.json"),
//!     triggers: Some("triggers.json"),
//!     start_tick: 0,
//!     log: (filter: "info"),
//! )
//! ```
//!
//! Relative paths are resolved against the directory of the configuration
//! file. Documents left out are treated as empty.

use crate::error::Result;
use intervene_core::Tick;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

/// Paths and settings of one simulation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Health states of the disease model
    pub disease_model: Option<PathBuf>,
    /// Node and edge trait taxonomy
    pub traits: Option<PathBuf>,
    /// Variable definitions
    pub variables: Option<PathBuf>,
    /// Intervention definitions
    pub interventions: Option<PathBuf>,
    /// Trigger definitions, read after the interventions they name
    pub triggers: Option<PathBuf>,
    /// Tick the action queue starts at
    pub start_tick: Tick,
    pub log: LogConfig,
}

impl EngineConfig {
    /// Parse a configuration from a RON string; paths are kept as written
    pub fn from_ron_str(content: &str) -> Result<Self> {
        Ok(ron::from_str(content)?)
    }

    /// Load a configuration file and resolve its paths
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = Self::from_ron_str(&fs::read_to_string(path)?)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    /// Make relative document paths relative to `base`
    pub fn resolve_paths(&mut self, base: &Path) {
        for path in [
            &mut self.disease_model,
            &mut self.traits,
            &mut self.variables,
            &mut self.interventions,
            &mut self.triggers,
        ]
        .into_iter()
        .flatten()
        {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}
