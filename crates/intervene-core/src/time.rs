//! Discrete simulation time

/// A discrete simulation time step
pub type Tick = u64;
