//! Operations: bound mutations of one target
//!
//! An [`OperationDefinition`] is the declarative form read from a document:
//! target kind, method name, operator and argument. Binding it goes through
//! the [`OperationRegistry`], where each target type registers its mutators
//! by name. The registry coerces the argument to the mutator's parameter
//! type and produces a type-erased [`Operation`].
//!
//! An unregistered `(target kind, method)` pair or an argument of the wrong
//! type is reported by [`OperationRegistry::validate`] during setup.

use crate::catalog::Catalog;
use crate::changes::Changes;
use crate::document::{describe, get_str, Document};
use crate::error::{Error, Result};
use crate::health::HealthStateId;
use crate::identity::{EdgeId, NodeId, Subject};
use crate::model::Model;
use crate::network::{Edge, Node};
use crate::operator::Operator;
use crate::traits::TraitValue;
use crate::value::{Value, ValueType};
use crate::variable::{Variable, VariableStore};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, trace, warn};

/// Kind of entity an operation mutates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Node,
    Edge,
    Variable,
}

impl TargetKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "node" => Some(TargetKind::Node),
            "edge" => Some(TargetKind::Edge),
            "variable" => Some(TargetKind::Variable),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TargetKind::Node => "node",
            TargetKind::Edge => "edge",
            TargetKind::Variable => "variable",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A resolved operation target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetRef {
    Node(NodeId),
    Edge(EdgeId),
    /// Variable by store index
    Variable(usize),
}

impl TargetRef {
    pub fn kind(self) -> TargetKind {
        match self {
            TargetRef::Node(_) => TargetKind::Node,
            TargetRef::Edge(_) => TargetKind::Edge,
            TargetRef::Variable(_) => TargetKind::Variable,
        }
    }
}

/// An entity type operations can mutate
pub trait Target: 'static {
    const KIND: TargetKind;

    /// How the model addresses one instance
    type Id: Copy + fmt::Debug + fmt::Display + Send + Sync + 'static;

    fn id_of(target: TargetRef) -> Option<Self::Id>;

    fn resolve_mut(model: &mut Model, id: Self::Id) -> Option<&mut Self>;

    fn record(changes: &mut Changes, id: Self::Id);
}

impl Target for Node {
    const KIND: TargetKind = TargetKind::Node;
    type Id = NodeId;

    fn id_of(target: TargetRef) -> Option<NodeId> {
        match target {
            TargetRef::Node(id) => Some(id),
            _ => None,
        }
    }

    fn resolve_mut(model: &mut Model, id: NodeId) -> Option<&mut Self> {
        model.network.node_mut(id)
    }

    fn record(changes: &mut Changes, id: NodeId) {
        changes.record_node(id);
    }
}

impl Target for Edge {
    const KIND: TargetKind = TargetKind::Edge;
    type Id = EdgeId;

    fn id_of(target: TargetRef) -> Option<EdgeId> {
        match target {
            TargetRef::Edge(id) => Some(id),
            _ => None,
        }
    }

    fn resolve_mut(model: &mut Model, id: EdgeId) -> Option<&mut Self> {
        model.network.edge_mut(id)
    }

    fn record(changes: &mut Changes, id: EdgeId) {
        changes.record_edge(id);
    }
}

impl Target for Variable {
    const KIND: TargetKind = TargetKind::Variable;
    type Id = usize;

    fn id_of(target: TargetRef) -> Option<usize> {
        match target {
            TargetRef::Variable(index) => Some(index),
            _ => None,
        }
    }

    fn resolve_mut(model: &mut Model, index: usize) -> Option<&mut Self> {
        model.variables.get_mut(index)
    }

    fn record(changes: &mut Changes, index: usize) {
        changes.record_variable(index);
    }
}

/// A mutator parameter type that can be taken from a [`Value`]
pub trait FromValue: Copy + fmt::Debug + Send + Sync + Sized + 'static {
    const VALUE_TYPE: ValueType;

    fn from_value(value: Value) -> Option<Self>;
}

impl FromValue for bool {
    const VALUE_TYPE: ValueType = ValueType::Boolean;

    fn from_value(value: Value) -> Option<Self> {
        value.as_bool()
    }
}

impl FromValue for f64 {
    const VALUE_TYPE: ValueType = ValueType::Number;

    fn from_value(value: Value) -> Option<Self> {
        value.as_number()
    }
}

impl FromValue for HealthStateId {
    const VALUE_TYPE: ValueType = ValueType::HealthState;

    fn from_value(value: Value) -> Option<Self> {
        value.as_health_state()
    }
}

impl FromValue for TraitValue {
    const VALUE_TYPE: ValueType = ValueType::TraitValue;

    fn from_value(value: Value) -> Option<Self> {
        value.as_trait_value()
    }
}

/// A mutator: applies an argument with an operator, reporting success
pub type Method<T, A> = fn(&mut T, A, Operator) -> bool;

/// An executable, bound mutation
pub trait Operation: fmt::Debug + Send + Sync {
    /// Apply the mutation.
    ///
    /// Returns the mutator's own success indicator; a target missing from
    /// the model counts as failure. Successful mutations are recorded in
    /// `changes`.
    fn execute(&self, model: &mut Model, changes: &mut Changes) -> bool;

    /// The kind of entity this operation mutates
    fn target_kind(&self) -> TargetKind;

    fn box_clone(&self) -> Box<dyn Operation>;
}

impl Clone for Box<dyn Operation> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

/// An [`Operation`] calling `method` on one instance of `T`
pub struct OperationInstance<T: Target, A> {
    target: T::Id,
    argument: A,
    operator: Operator,
    method: Method<T, A>,
    name: Arc<str>,
}

impl<T: Target, A: FromValue> OperationInstance<T, A> {
    pub fn new(
        target: T::Id,
        method: Method<T, A>,
        name: impl Into<Arc<str>>,
        argument: A,
        operator: Operator,
    ) -> Self {
        Self {
            target,
            argument,
            operator,
            method,
            name: name.into(),
        }
    }
}

impl<T: Target, A: FromValue> Clone for OperationInstance<T, A> {
    fn clone(&self) -> Self {
        Self {
            target: self.target,
            argument: self.argument,
            operator: self.operator,
            method: self.method,
            name: Arc::clone(&self.name),
        }
    }
}

impl<T: Target, A: FromValue> fmt::Debug for OperationInstance<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationInstance")
            .field("target", &self.target)
            .field("method", &self.name)
            .field("operator", &self.operator)
            .field("argument", &self.argument)
            .finish()
    }
}

impl<T: Target, A: FromValue> Operation for OperationInstance<T, A> {
    fn execute(&self, model: &mut Model, changes: &mut Changes) -> bool {
        let Some(target) = T::resolve_mut(model, self.target) else {
            warn!(entity = %self.target, method = %self.name, "Operation target not found");
            return false;
        };

        let applied = (self.method)(target, self.argument, self.operator);
        trace!(
            entity = %self.target,
            method = %self.name,
            operator = %self.operator,
            argument = ?self.argument,
            applied,
            "Executed operation"
        );

        if applied {
            T::record(changes, self.target);
        }
        applied
    }

    fn target_kind(&self) -> TargetKind {
        T::KIND
    }

    fn box_clone(&self) -> Box<dyn Operation> {
        Box::new(self.clone())
    }
}

type BindFn = dyn Fn(TargetRef, Value, Operator) -> Option<Box<dyn Operation>> + Send + Sync;

#[derive(Clone)]
struct Binder {
    argument: ValueType,
    bind: Arc<BindFn>,
}

/// Mutators available to operations, by target kind and method name
#[derive(Clone, Default)]
pub struct OperationRegistry {
    binders: HashMap<(TargetKind, String), Binder>,
}

impl OperationRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in node, edge and variable mutators
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        registry.register::<Node, HealthStateId>("setHealthState", Node::set_health_state);
        registry.register::<Node, f64>("setSusceptibilityFactor", Node::set_susceptibility_factor);
        registry.register::<Node, f64>("setInfectivityFactor", Node::set_infectivity_factor);
        registry.register::<Node, TraitValue>("setNodeTrait", Node::set_node_trait);

        registry.register::<Edge, f64>("setWeight", Edge::set_weight);
        registry.register::<Edge, f64>("setDuration", Edge::set_duration);
        registry.register::<Edge, bool>("setActive", Edge::set_active);
        registry.register::<Edge, TraitValue>("setEdgeTrait", Edge::set_edge_trait);

        registry.register::<Variable, f64>("setValue", Variable::set_value);

        registry
    }

    /// Register `method` of target type `T` under `name`.
    ///
    /// Replaces, with a warning, a previous registration of the same name.
    pub fn register<T, A>(&mut self, name: &str, method: Method<T, A>)
    where
        T: Target,
        A: FromValue,
    {
        let label: Arc<str> = Arc::from(name);
        let bind = move |target: TargetRef, argument: Value, operator: Operator| {
            let id = T::id_of(target)?;
            let argument = A::from_value(argument)?;
            let name = Arc::clone(&label);
            let operation = OperationInstance::<T, A>::new(id, method, name, argument, operator);
            Some(Box::new(operation) as Box<dyn Operation>)
        };

        let binder = Binder {
            argument: A::VALUE_TYPE,
            bind: Arc::new(bind),
        };

        if self.binders.insert((T::KIND, name.to_string()), binder).is_some() {
            warn!(kind = %T::KIND, method = name, "Operation method registered twice, replacing");
        } else {
            debug!(
                kind = %T::KIND,
                method = name,
                argument = %A::VALUE_TYPE,
                "Registered operation method"
            );
        }
    }

    /// Check whether `method` can be bound on `target` with an argument of
    /// type `argument`
    pub fn validate(&self, target: TargetKind, method: &str, argument: ValueType) -> Result<()> {
        let binder = self.binder(target, method)?;
        if binder.argument != argument {
            return Err(Error::ArgumentType {
                method: method.to_string(),
                expected: binder.argument,
                got: argument,
            });
        }
        Ok(())
    }

    /// Bind `method` to a concrete target and argument
    pub fn bind(
        &self,
        target: TargetRef,
        method: &str,
        argument: Value,
        operator: Operator,
    ) -> Result<Box<dyn Operation>> {
        self.validate(target.kind(), method, argument.value_type())?;
        let binder = self.binder(target.kind(), method)?;
        (binder.bind)(target, argument, operator).ok_or_else(|| {
            Error::InvalidDefinition(format!("cannot bind '{}' on {}", method, target.kind()))
        })
    }

    /// Whether a binder exists for the pair
    pub fn contains(&self, target: TargetKind, method: &str) -> bool {
        self.binders.contains_key(&(target, method.to_string()))
    }

    pub fn len(&self) -> usize {
        self.binders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.binders.is_empty()
    }

    fn binder(&self, target: TargetKind, method: &str) -> Result<&Binder> {
        self.binders
            .get(&(target, method.to_string()))
            .ok_or_else(|| Error::UnknownMethod {
                target,
                method: method.to_string(),
            })
    }
}

impl fmt::Debug for OperationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<_> = self
            .binders
            .iter()
            .map(|((target, method), binder)| format!("{}.{}({})", target, method, binder.argument))
            .collect();
        methods.sort();
        f.debug_struct("OperationRegistry").field("methods", &methods).finish()
    }
}

/// Declarative description of an operation
///
/// Document form: `{"target": "node" | "edge" | "variable", "method": name,
/// "operator"?: "=" | "+=" | "-=" | "*=" | "/=", "value": value,
/// "variable"?: id}`. `variable` names the target variable and is required
/// when `target` is `variable`.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationDefinition {
    target: TargetKind,
    method: String,
    operator: Operator,
    argument: Value,
    variable: Option<String>,
    valid: bool,
}

impl OperationDefinition {
    pub fn new(target: TargetKind, method: impl Into<String>, argument: Value) -> Self {
        Self {
            target,
            method: method.into(),
            operator: Operator::Assign,
            argument,
            variable: None,
            valid: true,
        }
    }

    pub fn with_operator(mut self, operator: Operator) -> Self {
        self.operator = operator;
        self
    }

    /// Target a variable by id
    pub fn on_variable(mut self, id: impl Into<String>) -> Self {
        self.variable = Some(id.into());
        self
    }

    /// Parse an operation document. Problems are logged and mark the
    /// definition invalid.
    pub fn from_document(doc: &Document, catalog: &Catalog) -> Self {
        let mut definition = Self::new(TargetKind::Variable, "", Value::Boolean(false));
        definition.valid = definition.parse(doc, catalog).is_some();
        if !definition.valid {
            error!(doc = %describe(doc), "Operation: invalid definition");
        }
        definition
    }

    fn parse(&mut self, doc: &Document, catalog: &Catalog) -> Option<()> {
        self.target = get_str(doc, "target").and_then(TargetKind::parse)?;
        self.method = get_str(doc, "method").filter(|m| !m.is_empty())?.to_string();

        if let Some(operator) = doc.get("operator") {
            self.operator = operator.as_str().and_then(Operator::parse)?;
        }

        self.argument = Value::from_document(doc.get("value")?, catalog)?;

        if self.target == TargetKind::Variable {
            self.variable = Some(get_str(doc, "variable")?.to_string());
        }

        Some(())
    }

    pub fn target(&self) -> TargetKind {
        self.target
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn argument(&self) -> Value {
        self.argument
    }

    pub fn variable(&self) -> Option<&str> {
        self.variable.as_deref()
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Check the definition against the registry without binding it
    pub fn validate(&self, registry: &OperationRegistry) -> Result<()> {
        if !self.valid {
            return Err(Error::InvalidDefinition(format!("operation '{}'", self.method)));
        }
        registry.validate(self.target, &self.method, self.argument.value_type())
    }

    /// Bind to the target selected by `subject` (or by the variable id)
    pub fn create_operation(
        &self,
        registry: &OperationRegistry,
        variables: &VariableStore,
        subject: Subject,
    ) -> Result<Box<dyn Operation>> {
        self.validate(registry)?;
        let target = self.resolve_target(variables, subject)?;
        registry.bind(target, &self.method, self.argument, self.operator)
    }

    fn resolve_target(&self, variables: &VariableStore, subject: Subject) -> Result<TargetRef> {
        match (self.target, subject) {
            (TargetKind::Node, Subject::Node(id)) => Ok(TargetRef::Node(id)),
            (TargetKind::Edge, Subject::Edge(id)) => Ok(TargetRef::Edge(id)),
            (TargetKind::Variable, _) => {
                let id = self.variable.as_deref().unwrap_or_default();
                variables
                    .index_of(id)
                    .map(TargetRef::Variable)
                    .ok_or_else(|| Error::VariableNotFound(id.to_string()))
            }
            (target, subject) => Err(Error::TargetMismatch {
                target,
                subject: subject.to_string(),
            }),
        }
    }
}
