//! Intervene Core - configuration-driven intervention engine
//!
//! This crate provides the rule engine an epidemic simulation uses to apply
//! interventions at discrete ticks:
//! - Typed values (`Value`, `ValueSet`) resolved against health-state and
//!   trait catalogs
//! - Simulation variables (`Variable`, `VariableStore`) with a binary
//!   encoding for checkpoints and cross-process exchange
//! - Conditions (`BooleanExpression`, `Condition`) over variables and the
//!   attributes of nodes and edges
//! - Operations bound through an `OperationRegistry` of named mutators
//! - Actions and the tick-indexed `ActionQueue`
//!
//! ## Flow
//!
//! Definitions are parsed once from documents. `ActionDefinition::create_action`
//! binds one to a subject, `ActionQueue::schedule` files it under a tick and
//! `ActionQueue::process` runs the tick's actions in insertion order.

mod action;
mod catalog;
mod changes;
mod codec;
mod condition;
mod document;
mod error;
mod health;
mod identity;
mod model;
mod network;
pub mod operation;
mod operator;
pub mod plugin;
mod queue;
pub mod time;
mod traits;
mod value;
mod value_set;
mod variable;

pub use action::{Action, ActionDefinition, ActionOutcome};
pub use catalog::Catalog;
pub use changes::Changes;
pub use condition::{BooleanExpression, Comparison, Condition, ConditionDefinition, Operand};
pub use document::Document;
pub use error::{Error, Result};
pub use health::{HealthStateId, HealthStates};
pub use identity::{EdgeId, NodeId, Subject};
pub use model::Model;
pub use network::{Edge, EdgeProperty, Network, Node, NodeProperty};
pub use operation::{
    FromValue, Operation, OperationDefinition, OperationInstance, OperationRegistry, Target,
    TargetKind, TargetRef,
};
pub use operator::Operator;
pub use plugin::{CustomMethod, CustomMethods};
pub use queue::{ActionQueue, TickReport};
pub use time::Tick;
pub use traits::{Enum, Feature, Trait, TraitData, TraitRegistry, TraitValue, NOT_SET};
pub use value::{Value, ValueType};
pub use value_set::ValueSet;
pub use variable::{Variable, VariableScope, VariableStore};
