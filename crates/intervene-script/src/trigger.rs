//! Triggers: conditions over global state that fire interventions
//!
//! A trigger is checked once per tick. While its condition holds, every
//! intervention it names fires, and the actions of a fired intervention are
//! scheduled at the current tick plus the action delay.

use crate::error::{Error, Result};
use intervene_core::{
    Catalog, Condition, ConditionDefinition, Document, Model, Subject, VariableStore,
};
use tracing::debug;

/// Parsed trigger document
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerDefinition {
    pub id: String,
    pub condition: ConditionDefinition,
    /// Ids of the interventions fired, without repeats
    pub interventions: Vec<String>,
}

impl TriggerDefinition {
    pub fn new(
        id: impl Into<String>,
        condition: ConditionDefinition,
        interventions: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            condition,
            interventions,
        }
    }

    /// Parse `{"id"?, "condition": expression, "interventionIds": [id, ..]}`.
    ///
    /// A trigger without an id is named `fallback_id`.
    pub fn from_document(
        doc: &Document,
        fallback_id: String,
        catalog: &Catalog,
        variables: &VariableStore,
    ) -> Result<Self> {
        let id = match doc.get("id") {
            None => fallback_id,
            Some(id) => match id.as_str() {
                Some(id) if !id.is_empty() => id.to_string(),
                _ => return Err(Error::InvalidDocument("trigger with invalid 'id'".to_string())),
            },
        };
        let invalid = |what: &str| Error::InvalidDocument(format!("trigger '{}': {}", id, what));

        let condition_doc = doc.get("condition").ok_or_else(|| invalid("missing 'condition'"))?;
        let condition = ConditionDefinition::from_document(Some(condition_doc), catalog, variables);
        if !condition.is_valid() {
            return Err(invalid("invalid 'condition'"));
        }

        let items = doc
            .get("interventionIds")
            .and_then(Document::as_array)
            .ok_or_else(|| invalid("'interventionIds' must be an array"))?;

        let mut interventions: Vec<String> = Vec::with_capacity(items.len());
        for item in items {
            let intervention = item
                .as_str()
                .ok_or_else(|| invalid("intervention ids must be strings"))?;
            if !interventions.iter().any(|known| known == intervention) {
                interventions.push(intervention.to_string());
            }
        }

        Ok(Self::new(id, condition, interventions))
    }

    /// Bind the condition. Triggers have no subject, so their conditions may
    /// only read variables and literals.
    pub fn create_trigger(&self) -> Result<Trigger> {
        let condition = self
            .condition
            .create_condition(Subject::Global)
            .map_err(|source| Error::Trigger {
                id: self.id.clone(),
                source,
            })?;

        Ok(Trigger {
            id: self.id.clone(),
            condition,
            interventions: self.interventions.clone(),
        })
    }
}

/// A bound trigger
#[derive(Debug, Clone)]
pub struct Trigger {
    id: String,
    condition: Condition,
    interventions: Vec<String>,
}

impl Trigger {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn interventions(&self) -> &[String] {
        &self.interventions
    }

    /// Whether the trigger fires in the current state
    pub fn is_true(&self, model: &Model) -> bool {
        let fired = self.condition.is_true(model);
        debug!(trigger = %self.id, fired, "Checked trigger");
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intervene_core::{
        Error as CoreError, HealthStates, Network, Operator, TraitRegistry, Variable, VariableScope,
    };
    use serde_json::json;

    fn catalog() -> Catalog {
        Catalog::new(HealthStates::new(["Susceptible", "Infected"]), TraitRegistry::new())
    }

    fn variables() -> VariableStore {
        let mut variables = VariableStore::new();
        variables.push(Variable::new("cases", 0.0, VariableScope::Global));
        variables
    }

    fn parse(doc: Document) -> Result<TriggerDefinition> {
        TriggerDefinition::from_document(&doc, "trigger.0".to_string(), &catalog(), &variables())
    }

    #[test]
    fn test_from_document() {
        let definition = parse(json!({
            "id": "outbreak",
            "condition": {"operator": ">", "left": {"variable": {"idRef": "cases"}}, "right": 10},
            "interventionIds": ["close-schools", "isolate", "close-schools"]
        }))
        .unwrap();

        assert_eq!(definition.id, "outbreak");
        assert_eq!(definition.interventions, ["close-schools", "isolate"]);
    }

    #[test]
    fn test_fallback_id() {
        let doc = json!({"condition": {"value": true}, "interventionIds": []});
        let definition = parse(doc).unwrap();
        assert_eq!(definition.id, "trigger.0");
    }

    #[test]
    fn test_fires_while_condition_holds() {
        let definition = parse(json!({
            "condition": {"operator": ">=", "left": {"variable": {"idRef": "cases"}}, "right": 3},
            "interventionIds": ["isolate"]
        }))
        .unwrap();
        let trigger = definition.create_trigger().unwrap();

        let mut model = Model::with_state(Network::new(), variables());
        assert!(!trigger.is_true(&model));

        model.variables.get_mut(0).unwrap().set_value(3.0, Operator::Assign);
        assert!(trigger.is_true(&model));
    }

    #[test]
    fn test_entity_condition_cannot_bind() {
        let definition = parse(json!({
            "id": "per-node",
            "condition": {
                "operator": "==",
                "left": {"node": {"property": "healthState"}},
                "right": {"healthState": "Infected"}
            },
            "interventionIds": ["isolate"]
        }))
        .unwrap();

        assert!(matches!(
            definition.create_trigger(),
            Err(Error::Trigger { ref id, source: CoreError::TargetMismatch { .. } })
                if id == "per-node"
        ));
    }

    #[test]
    fn test_invalid_documents() {
        for doc in [
            json!({"interventionIds": ["a"]}),
            json!({"condition": {"value": 1}, "interventionIds": ["a"]}),
            json!({"condition": {"value": true}}),
            json!({"condition": {"value": true}, "interventionIds": [1]}),
            json!({"id": "", "condition": {"value": true}, "interventionIds": []}),
        ] {
            assert!(matches!(parse(doc), Err(Error::InvalidDocument(_))));
        }
    }
}
