//! Deployment-supplied computation hooks
//!
//! The disease model consults these slots when a deployment replaces one of
//! its built-in computations. This crate only stores the function pointers.

use crate::health::HealthStateId;
use crate::network::{Edge, Node};
use std::fmt;
use tracing::warn;

/// Propensity of transmission `transmission` along `edge`
pub type TransmissionPropensity = fn(transmission: usize, edge: &Edge) -> f64;

/// Progression chosen for a node leaving `state`, by index
pub type StateProgression = fn(state: HealthStateId, node: &Node) -> Option<usize>;

/// Ticks a node dwells in the state reached by `progression`
pub type ProgressionDwellTime = fn(progression: usize, node: &Node) -> u32;

/// An optional replacement for one computation
#[derive(Clone, Copy)]
pub struct CustomMethod<F: Copy> {
    name: &'static str,
    method: Option<F>,
}

impl<F: Copy> CustomMethod<F> {
    pub const fn new(name: &'static str) -> Self {
        Self { name, method: None }
    }

    /// Install `method`, or clear the slot with `None`.
    ///
    /// Replacing a method that is already set logs a warning.
    pub fn set(&mut self, method: Option<F>) {
        if self.method.is_some() && method.is_some() {
            warn!(slot = self.name, "Overwriting previously set custom method");
        }
        self.method = method;
    }

    pub fn get(&self) -> Option<F> {
        self.method
    }

    pub fn is_set(&self) -> bool {
        self.method.is_some()
    }
}

impl<F: Copy> fmt::Debug for CustomMethod<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomMethod")
            .field("name", &self.name)
            .field("set", &self.is_set())
            .finish()
    }
}

/// All hook slots of a deployment
#[derive(Debug, Clone, Copy)]
pub struct CustomMethods {
    pub transmission_propensity: CustomMethod<TransmissionPropensity>,
    pub state_progression: CustomMethod<StateProgression>,
    pub progression_dwell_time: CustomMethod<ProgressionDwellTime>,
}

impl CustomMethods {
    pub const fn new() -> Self {
        Self {
            transmission_propensity: CustomMethod::new("transmission_propensity"),
            state_progression: CustomMethod::new("state_progression"),
            progression_dwell_time: CustomMethod::new("progression_dwell_time"),
        }
    }
}

impl Default for CustomMethods {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{EdgeId, NodeId};

    fn doubled_weight(_transmission: usize, edge: &Edge) -> f64 {
        2.0 * edge.weight
    }

    fn always_first(_state: HealthStateId, _node: &Node) -> Option<usize> {
        Some(0)
    }

    #[test]
    fn test_slots_start_empty() {
        let methods = CustomMethods::new();
        assert!(!methods.transmission_propensity.is_set());
        assert!(!methods.state_progression.is_set());
        assert!(!methods.progression_dwell_time.is_set());
    }

    #[test]
    fn test_set_and_clear() {
        let mut methods = CustomMethods::default();
        methods.transmission_propensity.set(Some(doubled_weight));
        methods.state_progression.set(Some(always_first));

        let edge = Edge::new(EdgeId(1), NodeId(1), NodeId(2));
        let propensity = methods.transmission_propensity.get().unwrap();
        assert_eq!(propensity(0, &edge), 2.0);

        let node = Node::new(NodeId(1), HealthStateId(0));
        assert_eq!(methods.state_progression.get().unwrap()(HealthStateId(0), &node), Some(0));

        methods.transmission_propensity.set(None);
        assert!(methods.transmission_propensity.get().is_none());
    }
}
