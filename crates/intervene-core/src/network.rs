//! Local partition of the contact network
//!
//! The engine does not own the contact network. [`Network`] holds the slice
//! of nodes and edges this process is responsible for, exposing the
//! attributes conditions read and the mutators operations call.

use crate::health::HealthStateId;
use crate::identity::{EdgeId, NodeId};
use crate::operator::Operator;
use crate::traits::{TraitData, TraitValue};
use crate::value::{Value, ValueType};
use indexmap::IndexMap;

/// Apply a numeric operator, rejecting negative results
fn apply_non_negative(current: &mut f64, operand: f64, operator: Operator) -> bool {
    match operator.apply(*current, operand) {
        Some(result) if result >= 0.0 => {
            *current = result;
            true
        }
        _ => false,
    }
}

fn apply_trait(data: &mut TraitData, value: TraitValue, operator: Operator) -> bool {
    if operator != Operator::Assign {
        return false;
    }
    value.apply(data);
    true
}

/// A person in the population
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub health_state: HealthStateId,
    pub susceptibility_factor: f64,
    pub infectivity_factor: f64,
    pub node_trait: TraitData,
}

impl Node {
    /// Create a node in `health_state` with unit factors
    pub fn new(id: NodeId, health_state: HealthStateId) -> Self {
        Self {
            id,
            health_state,
            susceptibility_factor: 1.0,
            infectivity_factor: 1.0,
            node_trait: 0,
        }
    }

    pub fn with_trait(mut self, node_trait: TraitData) -> Self {
        self.node_trait = node_trait;
        self
    }

    pub fn set_health_state(&mut self, state: HealthStateId, operator: Operator) -> bool {
        operator.assign(&mut self.health_state, state)
    }

    pub fn set_susceptibility_factor(&mut self, factor: f64, operator: Operator) -> bool {
        apply_non_negative(&mut self.susceptibility_factor, factor, operator)
    }

    pub fn set_infectivity_factor(&mut self, factor: f64, operator: Operator) -> bool {
        apply_non_negative(&mut self.infectivity_factor, factor, operator)
    }

    pub fn set_node_trait(&mut self, value: TraitValue, operator: Operator) -> bool {
        apply_trait(&mut self.node_trait, value, operator)
    }

    /// Read an attribute as a value.
    ///
    /// Trait attributes yield the whole trait word as a trait value covering
    /// every bit.
    pub fn get(&self, property: NodeProperty) -> Value {
        match property {
            NodeProperty::HealthState => Value::HealthState(self.health_state),
            NodeProperty::SusceptibilityFactor => Value::Number(self.susceptibility_factor),
            NodeProperty::InfectivityFactor => Value::Number(self.infectivity_factor),
            NodeProperty::NodeTrait => {
                Value::TraitValue(TraitValue::of(self.node_trait, TraitData::MAX))
            }
        }
    }
}

/// A directed contact from `source` to `target`
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: EdgeId,
    pub target: NodeId,
    pub source: NodeId,
    pub target_activity: TraitData,
    pub source_activity: TraitData,
    pub duration: f64,
    pub weight: f64,
    pub active: bool,
    pub edge_trait: TraitData,
}

impl Edge {
    /// Create an active edge with unit weight
    pub fn new(id: EdgeId, source: NodeId, target: NodeId) -> Self {
        Self {
            id,
            target,
            source,
            target_activity: 0,
            source_activity: 0,
            duration: 0.0,
            weight: 1.0,
            active: true,
            edge_trait: 0,
        }
    }

    pub fn set_weight(&mut self, weight: f64, operator: Operator) -> bool {
        apply_non_negative(&mut self.weight, weight, operator)
    }

    pub fn set_duration(&mut self, duration: f64, operator: Operator) -> bool {
        apply_non_negative(&mut self.duration, duration, operator)
    }

    pub fn set_active(&mut self, active: bool, operator: Operator) -> bool {
        operator.assign(&mut self.active, active)
    }

    pub fn set_edge_trait(&mut self, value: TraitValue, operator: Operator) -> bool {
        apply_trait(&mut self.edge_trait, value, operator)
    }

    /// Read an attribute as a value
    pub fn get(&self, property: EdgeProperty) -> Value {
        let word = |data| Value::TraitValue(TraitValue::of(data, TraitData::MAX));
        match property {
            EdgeProperty::Weight => Value::Number(self.weight),
            EdgeProperty::Duration => Value::Number(self.duration),
            EdgeProperty::Active => Value::Boolean(self.active),
            EdgeProperty::EdgeTrait => word(self.edge_trait),
            EdgeProperty::TargetActivity => word(self.target_activity),
            EdgeProperty::SourceActivity => word(self.source_activity),
        }
    }
}

/// Node attributes readable by conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeProperty {
    HealthState,
    SusceptibilityFactor,
    InfectivityFactor,
    NodeTrait,
}

impl NodeProperty {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "healthState" => Some(NodeProperty::HealthState),
            "susceptibilityFactor" => Some(NodeProperty::SusceptibilityFactor),
            "infectivityFactor" => Some(NodeProperty::InfectivityFactor),
            "nodeTrait" => Some(NodeProperty::NodeTrait),
            _ => None,
        }
    }

    pub fn value_type(self) -> ValueType {
        match self {
            NodeProperty::HealthState => ValueType::HealthState,
            NodeProperty::SusceptibilityFactor | NodeProperty::InfectivityFactor => {
                ValueType::Number
            }
            NodeProperty::NodeTrait => ValueType::TraitValue,
        }
    }
}

/// Edge attributes readable by conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeProperty {
    Weight,
    Duration,
    Active,
    EdgeTrait,
    TargetActivity,
    SourceActivity,
}

impl EdgeProperty {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "weight" => Some(EdgeProperty::Weight),
            "duration" => Some(EdgeProperty::Duration),
            "active" => Some(EdgeProperty::Active),
            "edgeTrait" => Some(EdgeProperty::EdgeTrait),
            "targetActivity" => Some(EdgeProperty::TargetActivity),
            "sourceActivity" => Some(EdgeProperty::SourceActivity),
            _ => None,
        }
    }

    pub fn value_type(self) -> ValueType {
        match self {
            EdgeProperty::Weight | EdgeProperty::Duration => ValueType::Number,
            EdgeProperty::Active => ValueType::Boolean,
            EdgeProperty::EdgeTrait
            | EdgeProperty::TargetActivity
            | EdgeProperty::SourceActivity => ValueType::TraitValue,
        }
    }
}

/// Nodes and edges owned by this process
#[derive(Debug, Clone, Default)]
pub struct Network {
    nodes: IndexMap<NodeId, Node>,
    edges: IndexMap<EdgeId, Edge>,
}

impl Network {
    /// Create an empty network
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a node
    pub fn add_node(&mut self, node: Node) {
        self.nodes.insert(node.id, node);
    }

    /// Insert or replace an edge
    pub fn add_edge(&mut self, edge: Edge) {
        self.edges.insert(edge.id, edge);
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(&id)
    }

    pub fn edge_mut(&mut self, id: EdgeId) -> Option<&mut Edge> {
        self.edges.get_mut(&id)
    }

    /// Iterate over nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Iterate over edges in insertion order
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Edges pointing at `target`
    pub fn incoming(&self, target: NodeId) -> impl Iterator<Item = &Edge> {
        self.edges.values().filter(move |e| e.target == target)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}
