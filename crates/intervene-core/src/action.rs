//! Actions: a condition gating an ordered list of operations

use crate::catalog::Catalog;
use crate::changes::Changes;
use crate::condition::{Condition, ConditionDefinition};
use crate::document::{describe, get_str, Document};
use crate::error::{Error, Result};
use crate::identity::Subject;
use crate::model::Model;
use crate::operation::{Operation, OperationDefinition, OperationRegistry};
use crate::time::Tick;
use crate::variable::VariableStore;
use tracing::{debug, error, trace};

/// Result of checking an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The condition did not hold; nothing ran
    Skipped,
    /// Every operation ran
    Executed { succeeded: usize, failed: usize },
}

impl ActionOutcome {
    /// True unless an operation was rejected
    pub fn is_success(&self) -> bool {
        match self {
            ActionOutcome::Skipped => true,
            ActionOutcome::Executed { failed, .. } => *failed == 0,
        }
    }

    pub fn is_executed(&self) -> bool {
        matches!(self, ActionOutcome::Executed { .. })
    }
}

/// One intervention rule bound to its subject
#[derive(Debug, Clone)]
pub struct Action {
    id: String,
    condition: Condition,
    operations: Vec<Box<dyn Operation>>,
}

impl Action {
    pub fn new(id: impl Into<String>, condition: Condition) -> Self {
        Self {
            id: id.into(),
            condition,
            operations: Vec::new(),
        }
    }

    /// Append an operation; operations run in the order they were added
    pub fn add_operation(&mut self, operation: Box<dyn Operation>) {
        self.operations.push(operation);
    }

    pub fn with_operation(mut self, operation: Box<dyn Operation>) -> Self {
        self.add_operation(operation);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    pub fn operations(&self) -> &[Box<dyn Operation>] {
        &self.operations
    }

    /// Evaluate the condition once and, if it holds, run every operation.
    ///
    /// A rejected operation does not stop the remaining ones; the outcome
    /// counts successes and failures.
    pub fn check_conditions(&self, model: &mut Model, changes: &mut Changes) -> ActionOutcome {
        if !self.condition.is_true(model) {
            trace!(
                action = %self.id,
                subject = %self.condition.subject(),
                "Condition false, skipping"
            );
            return ActionOutcome::Skipped;
        }

        let succeeded = self
            .operations
            .iter()
            .filter(|operation| operation.execute(model, changes))
            .count();
        let failed = self.operations.len() - succeeded;

        debug!(
            action = %self.id,
            subject = %self.condition.subject(),
            succeeded,
            failed,
            "Executed action"
        );
        ActionOutcome::Executed { succeeded, failed }
    }
}

/// Declarative description of an action
///
/// Document form: `{"id"?, "delay"?: ticks, "condition"?: expression,
/// "operations": [operation, ..]}` with at least one operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionDefinition {
    id: String,
    delay: Tick,
    condition: ConditionDefinition,
    operations: Vec<OperationDefinition>,
    valid: bool,
}

impl ActionDefinition {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            delay: 0,
            condition: ConditionDefinition::always(),
            operations: Vec::new(),
            valid: true,
        }
    }

    pub fn with_delay(mut self, delay: Tick) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_condition(mut self, condition: ConditionDefinition) -> Self {
        self.valid &= condition.is_valid();
        self.condition = condition;
        self
    }

    pub fn with_operation(mut self, operation: OperationDefinition) -> Self {
        self.valid &= operation.is_valid();
        self.operations.push(operation);
        self
    }

    /// Parse an action document; problems are logged and mark it invalid
    pub fn from_document(doc: &Document, catalog: &Catalog, variables: &VariableStore) -> Self {
        let mut definition = Self::new(get_str(doc, "id").unwrap_or_default());

        match doc.get("delay").map(Document::as_u64) {
            None => {}
            Some(Some(delay)) => definition.delay = delay,
            Some(None) => {
                error!(action = %definition.id, "Action: 'delay' must be a tick count");
                definition.valid = false;
            }
        }

        if doc.get("priority").is_some() {
            debug!(
                action = %definition.id,
                "Action: 'priority' is ignored, insertion order applies"
            );
        }

        definition.condition =
            ConditionDefinition::from_document(doc.get("condition"), catalog, variables);
        definition.valid &= definition.condition.is_valid();

        match doc.get("operations").and_then(Document::as_array) {
            Some(items) if !items.is_empty() => {
                for item in items {
                    let operation = OperationDefinition::from_document(item, catalog);
                    definition.valid &= operation.is_valid();
                    definition.operations.push(operation);
                }
            }
            _ => {
                error!(doc = %describe(doc), "Action: 'operations' must be a non-empty array");
                definition.valid = false;
            }
        }

        definition
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Ticks between scheduling and execution
    pub fn delay(&self) -> Tick {
        self.delay
    }

    pub fn condition(&self) -> &ConditionDefinition {
        &self.condition
    }

    pub fn operations(&self) -> &[OperationDefinition] {
        &self.operations
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Check every operation against the registry
    pub fn validate(&self, registry: &OperationRegistry) -> Result<()> {
        if !self.valid {
            return Err(Error::InvalidDefinition(format!("action '{}'", self.id)));
        }
        if self.operations.is_empty() {
            return Err(Error::InvalidDefinition(format!("action '{}' has no operations", self.id)));
        }
        for operation in &self.operations {
            operation.validate(registry)?;
        }
        Ok(())
    }

    /// Build an action bound to `subject`
    pub fn create_action(
        &self,
        registry: &OperationRegistry,
        variables: &VariableStore,
        subject: Subject,
    ) -> Result<Action> {
        self.validate(registry)?;

        let mut action = Action::new(self.id.clone(), self.condition.create_condition(subject)?);
        for operation in &self.operations {
            action.add_operation(operation.create_operation(registry, variables, subject)?);
        }
        Ok(action)
    }
}
