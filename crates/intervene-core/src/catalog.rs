//! Name resolution context for document parsers

use crate::health::HealthStates;
use crate::traits::TraitRegistry;

/// External registries that names in definition documents resolve against
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    /// Health states of the disease model
    pub health_states: HealthStates,
    /// Node and edge trait taxonomy
    pub traits: TraitRegistry,
}

impl Catalog {
    /// Create a catalog from its two registries
    pub fn new(health_states: HealthStates, traits: TraitRegistry) -> Self {
        Self {
            health_states,
            traits,
        }
    }

    /// Check that both registries were read without errors
    pub fn is_valid(&self) -> bool {
        self.health_states.is_valid() && self.traits.is_valid()
    }
}
