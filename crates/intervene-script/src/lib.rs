//! Intervene Script - run configuration and document loading
//!
//! Turns the files of a simulation run into scheduled actions:
//! - `EngineConfig` read from RON, naming the JSON documents
//! - `Loader` parsing the disease model, traits, variables, interventions
//!   and triggers into a `Setup`
//! - `Setup::validate` reporting unbindable operations before the first tick
//! - `Setup::process_triggers` firing interventions from global conditions
//! - `logging::init` for the `tracing` subscriber

mod config;
mod error;
mod loader;
pub mod logging;
mod trigger;

pub use config::{EngineConfig, LogConfig};
pub use error::{Error, Result};
pub use loader::{Intervention, Loader, Setup};
pub use trigger::{Trigger, TriggerDefinition};
