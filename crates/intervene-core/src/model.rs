//! Mutable simulation state seen by interventions

use crate::network::Network;
use crate::variable::VariableStore;

/// State conditions read and operations write
#[derive(Debug, Clone, Default)]
pub struct Model {
    /// This process's part of the contact network
    pub network: Network,
    /// Intervention variables
    pub variables: VariableStore,
}

impl Model {
    /// Create an empty model
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a model over existing state
    pub fn with_state(network: Network, variables: VariableStore) -> Self {
        Self { network, variables }
    }
}
