//! Health-state catalog
//!
//! The disease model itself lives outside this crate. Conditions and
//! operations only need its state names, resolved once to dense ids.

use crate::document::{describe, get_str, Document};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::error;

/// Dense identifier of a health state in the disease model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HealthStateId(pub u32);

impl fmt::Display for HealthStateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "state:{}", self.0)
    }
}

/// Name to id mapping for the disease model's health states
#[derive(Debug, Clone, Default)]
pub struct HealthStates {
    names: Vec<String>,
    index: HashMap<String, HealthStateId>,
    initial: HealthStateId,
    valid: bool,
}

impl HealthStates {
    /// Create a catalog from state names in declaration order.
    ///
    /// The first name becomes the initial state.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut states = Self {
            valid: true,
            ..Self::default()
        };
        for name in names {
            states.push(name.into());
        }
        states
    }

    /// Parse `{"states": [{"id": ..}, ..], "initialState": ..}`
    pub fn from_document(doc: &Document) -> Self {
        let mut states = Self {
            valid: true,
            ..Self::default()
        };

        let Some(items) = doc.get("states").and_then(Document::as_array) else {
            error!(doc = %describe(doc), "Disease model: missing 'states' array");
            states.valid = false;
            return states;
        };

        for item in items {
            match get_str(item, "id") {
                Some(id) if !id.is_empty() => states.push(id.to_string()),
                _ => {
                    error!(item = %describe(item), "Disease model: invalid state");
                    states.valid = false;
                    return states;
                }
            }
        }

        if let Some(initial) = get_str(doc, "initialState") {
            match states.get(initial) {
                Some(id) => states.initial = id,
                None => {
                    error!(initial, "Disease model: unknown initial state");
                    states.valid = false;
                }
            }
        }

        states
    }

    fn push(&mut self, name: String) {
        if self.index.contains_key(&name) {
            return;
        }
        let id = HealthStateId(self.names.len() as u32);
        self.index.insert(name.clone(), id);
        self.names.push(name);
    }

    /// Resolve a state name
    pub fn get(&self, name: &str) -> Option<HealthStateId> {
        self.index.get(name).copied()
    }

    /// Name of a state id
    pub fn name(&self, id: HealthStateId) -> Option<&str> {
        self.names.get(id.0 as usize).map(String::as_str)
    }

    /// The initial state of every node
    pub fn initial(&self) -> HealthStateId {
        self.initial
    }

    /// Number of states
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if no states are defined
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Whether the document this catalog was read from was well formed
    pub fn is_valid(&self) -> bool {
        self.valid
    }
}
