//! Document loader
//!
//! Reads the JSON documents of a run in dependency order (disease model and
//! traits, then variables, then interventions, then triggers) and produces a
//! [`Setup`] that can be validated against an operation registry and
//! scheduled.

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::trigger::{Trigger, TriggerDefinition};
use intervene_core::{
    ActionDefinition, ActionQueue, Catalog, ConditionDefinition, Document, EdgeId, HealthStates,
    Model, NodeId, OperationRegistry, Subject, Tick, TraitRegistry, VariableStore,
};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// One intervention: an action definition and the subjects it applies to
#[derive(Debug, Clone, PartialEq)]
pub struct Intervention {
    pub id: String,
    /// Tick the action is scheduled relative to; `None` means the queue's
    /// current tick
    pub tick: Option<Tick>,
    pub subjects: Vec<Subject>,
    pub action: ActionDefinition,
}

impl Intervention {
    /// Tick the actions fire at when scheduled on a queue at `current_tick`
    pub fn fire_tick(&self, current_tick: Tick) -> Tick {
        self.tick.unwrap_or(current_tick).saturating_add(self.action.delay())
    }
}

/// Everything needed to run interventions
#[derive(Debug, Clone, Default)]
pub struct Setup {
    pub catalog: Catalog,
    pub variables: VariableStore,
    pub interventions: Vec<Intervention>,
    pub triggers: Vec<TriggerDefinition>,
    pub start_tick: Tick,
}

impl Setup {
    /// Bind every intervention to every subject and every trigger to its
    /// condition, without scheduling.
    ///
    /// Reports the first unregistered method, argument mismatch, unknown
    /// variable or subject mismatch.
    pub fn validate(&self, registry: &OperationRegistry) -> Result<()> {
        for intervention in &self.interventions {
            for subject in &intervention.subjects {
                intervention
                    .action
                    .create_action(registry, &self.variables, *subject)
                    .map_err(|source| Error::Intervention {
                        id: intervention.id.clone(),
                        source,
                    })?;
            }
        }
        self.create_triggers()?;
        debug!(
            interventions = self.interventions.len(),
            triggers = self.triggers.len(),
            "Validated setup"
        );
        Ok(())
    }

    /// Whether some trigger names the intervention
    pub fn is_triggered(&self, id: &str) -> bool {
        self.triggers
            .iter()
            .any(|trigger| trigger.interventions.iter().any(|named| named == id))
    }

    /// Create one action per subject and schedule it.
    ///
    /// Interventions and subjects are scheduled in document order.
    /// Interventions named by a trigger are left to
    /// [`Setup::process_triggers`] unless they carry a `tick`. Returns the
    /// number of scheduled actions.
    pub fn schedule(&self, registry: &OperationRegistry, queue: &mut ActionQueue) -> Result<usize> {
        let mut scheduled = 0;
        for intervention in &self.interventions {
            if intervention.tick.is_none() && self.is_triggered(&intervention.id) {
                continue;
            }
            let tick = intervention.fire_tick(queue.current_tick());
            scheduled += self.schedule_intervention(intervention, tick, registry, queue)?;
        }
        info!(scheduled, "Scheduled interventions");
        Ok(scheduled)
    }

    /// Bind every trigger
    pub fn create_triggers(&self) -> Result<Vec<Trigger>> {
        self.triggers.iter().map(TriggerDefinition::create_trigger).collect()
    }

    /// Check `triggers` against `model` and schedule the interventions they
    /// fire.
    ///
    /// Every trigger sees the same state. An intervention named by several
    /// firing triggers fires once, at the queue's current tick plus its
    /// action delay. Returns the number of scheduled actions.
    pub fn process_triggers(
        &self,
        triggers: &[Trigger],
        registry: &OperationRegistry,
        model: &Model,
        queue: &mut ActionQueue,
    ) -> Result<usize> {
        let fired: HashSet<&str> = triggers
            .iter()
            .filter(|trigger| trigger.is_true(model))
            .flat_map(|trigger| trigger.interventions().iter().map(String::as_str))
            .collect();

        let current_tick = queue.current_tick();
        let mut scheduled = 0;
        for intervention in &self.interventions {
            if !fired.contains(intervention.id.as_str()) {
                continue;
            }
            info!(intervention = %intervention.id, tick = current_tick, "Intervention triggered");
            let tick = current_tick.saturating_add(intervention.action.delay());
            scheduled += self.schedule_intervention(intervention, tick, registry, queue)?;
        }
        Ok(scheduled)
    }

    fn schedule_intervention(
        &self,
        intervention: &Intervention,
        tick: Tick,
        registry: &OperationRegistry,
        queue: &mut ActionQueue,
    ) -> Result<usize> {
        for subject in &intervention.subjects {
            let action = intervention
                .action
                .create_action(registry, &self.variables, *subject)
                .map_err(|source| Error::Intervention {
                    id: intervention.id.clone(),
                    source,
                })?;
            queue.schedule(tick, action);
        }
        Ok(intervention.subjects.len())
    }

    /// A queue positioned at the configured start tick
    pub fn queue(&self) -> ActionQueue {
        let mut queue = ActionQueue::new();
        queue.set_current_tick(self.start_tick);
        queue
    }
}

fn parse(content: &str) -> Result<Document> {
    Ok(serde_json::from_str(content)?)
}

fn read(path: &Path) -> Result<Document> {
    debug!(path = %path.display(), "Reading document");
    parse(&fs::read_to_string(path)?)
}

fn parse_subjects(doc: Option<&Document>) -> Option<Vec<Subject>> {
    let Some(doc) = doc else {
        return Some(vec![Subject::Global]);
    };

    if doc.as_str() == Some("global") {
        return Some(vec![Subject::Global]);
    }

    if let Some(nodes) = doc.get("nodes").and_then(Document::as_array) {
        return nodes
            .iter()
            .map(|id| id.as_u64().map(|id| Subject::Node(NodeId(id))))
            .collect();
    }

    if let Some(edges) = doc.get("edges").and_then(Document::as_array) {
        return edges
            .iter()
            .map(|id| id.as_u64().map(|id| Subject::Edge(EdgeId(id))))
            .collect();
    }

    None
}

/// Loader for intervention documents
pub struct Loader {
    setup: Setup,
    ids: HashSet<String>,
}

impl Loader {
    /// Create a new loader
    pub fn new() -> Self {
        Self {
            setup: Setup::default(),
            ids: HashSet::new(),
        }
    }

    /// Load every document named by `config`
    pub fn from_config(config: &EngineConfig) -> Result<Setup> {
        let mut loader = Self::new();
        loader.setup.start_tick = config.start_tick;

        if let Some(path) = &config.disease_model {
            loader.load_disease_model(&read(path)?)?;
        }
        if let Some(path) = &config.traits {
            loader.load_traits(&read(path)?)?;
        }
        if let Some(path) = &config.variables {
            loader.load_variables(&read(path)?)?;
        }
        if let Some(path) = &config.interventions {
            loader.load_interventions(&read(path)?)?;
        }
        if let Some(path) = &config.triggers {
            loader.load_triggers(&read(path)?)?;
        }

        Ok(loader.finish())
    }

    /// Load `{"states": [..], "initialState": ..}`
    pub fn load_disease_model(&mut self, doc: &Document) -> Result<()> {
        let states = HealthStates::from_document(doc);
        if !states.is_valid() {
            return Err(Error::InvalidDocument("disease model".to_string()));
        }
        debug!(states = states.len(), "Loaded disease model");
        self.setup.catalog.health_states = states;
        Ok(())
    }

    /// Load `{"traits": [..]}`
    pub fn load_traits(&mut self, doc: &Document) -> Result<()> {
        let traits = TraitRegistry::from_document(doc);
        if !traits.is_valid() {
            return Err(Error::InvalidDocument("traits".to_string()));
        }
        debug!(traits = traits.len(), "Loaded traits");
        self.setup.catalog.traits = traits;
        Ok(())
    }

    /// Load an array of variable definitions
    pub fn load_variables(&mut self, doc: &Document) -> Result<()> {
        let variables = VariableStore::from_document(doc);
        if !variables.is_valid() {
            return Err(Error::InvalidDocument("variables".to_string()));
        }
        debug!(
            variables = variables.len(),
            duplicates = variables.duplicate_ids().len(),
            "Loaded variables"
        );
        self.setup.variables = variables;
        Ok(())
    }

    /// Load `{"interventions": [..]}`.
    ///
    /// Names resolve against the catalogs and variables loaded so far. The
    /// document is taken whole or not at all.
    pub fn load_interventions(&mut self, doc: &Document) -> Result<()> {
        let Some(items) = doc.get("interventions").and_then(Document::as_array) else {
            return Err(Error::InvalidDocument("missing 'interventions' array".to_string()));
        };

        let mut interventions = Vec::with_capacity(items.len());
        let mut triggers = Vec::new();
        let mut ids = HashSet::new();
        for item in items {
            let (intervention, trigger) = self.parse_intervention(item)?;
            if self.ids.contains(&intervention.id) || !ids.insert(intervention.id.clone()) {
                return Err(Error::DuplicateDefinition(intervention.id));
            }
            triggers.extend(trigger);
            interventions.push(intervention);
        }

        self.ids.extend(ids);
        self.setup.interventions.extend(interventions);
        self.setup.triggers.extend(triggers);
        debug!(interventions = self.setup.interventions.len(), "Loaded interventions");
        Ok(())
    }

    /// Parse an intervention and the trigger it may carry inline
    fn parse_intervention(
        &self,
        doc: &Document,
    ) -> Result<(Intervention, Option<TriggerDefinition>)> {
        let id = match doc.get("id").and_then(Document::as_str) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => return Err(Error::InvalidDocument("intervention without 'id'".to_string())),
        };
        let invalid =
            |what: &str| Error::InvalidDocument(format!("intervention '{}': {}", id, what));

        let tick = match doc.get("tick") {
            None => None,
            Some(tick) => {
                Some(tick.as_u64().ok_or_else(|| invalid("'tick' must be a tick count"))?)
            }
        };

        let subjects =
            parse_subjects(doc.get("subjects")).ok_or_else(|| invalid("invalid 'subjects'"))?;

        let action_doc = doc.get("action").ok_or_else(|| invalid("missing 'action'"))?;
        let catalog = &self.setup.catalog;
        let variables = &self.setup.variables;
        let action = ActionDefinition::from_document(action_doc, catalog, variables);
        if !action.is_valid() {
            return Err(invalid("invalid 'action'"));
        }

        let trigger = match doc.get("trigger") {
            None => None,
            Some(condition_doc) => {
                let condition =
                    ConditionDefinition::from_document(Some(condition_doc), catalog, variables);
                if !condition.is_valid() {
                    return Err(invalid("invalid 'trigger'"));
                }
                let trigger_id = format!("{}.trigger", id);
                Some(TriggerDefinition::new(trigger_id, condition, vec![id.clone()]))
            }
        };

        let intervention = Intervention {
            id,
            tick,
            subjects,
            action,
        };
        Ok((intervention, trigger))
    }

    /// Load `{"triggers": [..]}`.
    ///
    /// Every named intervention must already be loaded. The document is
    /// taken whole or not at all.
    pub fn load_triggers(&mut self, doc: &Document) -> Result<()> {
        let Some(items) = doc.get("triggers").and_then(Document::as_array) else {
            return Err(Error::InvalidDocument("missing 'triggers' array".to_string()));
        };

        let mut triggers = Vec::with_capacity(items.len());
        for item in items {
            let fallback_id = format!("trigger.{}", self.setup.triggers.len() + triggers.len());
            let trigger = TriggerDefinition::from_document(
                item,
                fallback_id,
                &self.setup.catalog,
                &self.setup.variables,
            )?;

            if let Some(unknown) = trigger.interventions.iter().find(|id| !self.ids.contains(*id)) {
                return Err(Error::InvalidDocument(format!(
                    "trigger '{}': unknown intervention '{}'",
                    trigger.id, unknown
                )));
            }
            triggers.push(trigger);
        }

        self.setup.triggers.extend(triggers);
        debug!(triggers = self.setup.triggers.len(), "Loaded triggers");
        Ok(())
    }

    /// Load a disease model file
    pub fn load_disease_model_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.load_disease_model(&read(path.as_ref())?)
    }

    /// Load a traits file
    pub fn load_traits_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.load_traits(&read(path.as_ref())?)
    }

    /// Load a variables file
    pub fn load_variables_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.load_variables(&read(path.as_ref())?)
    }

    /// Load an interventions file
    pub fn load_interventions_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.load_interventions(&read(path.as_ref())?)
    }

    /// Load a triggers file
    pub fn load_triggers_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.load_triggers(&read(path.as_ref())?)
    }

    /// Load a document from a JSON string
    pub fn parse_str(content: &str) -> Result<Document> {
        parse(content)
    }

    /// Finish loading and return the setup
    pub fn finish(self) -> Setup {
        self.setup
    }

    /// Get the current setup (for inspection during loading)
    pub fn setup(&self) -> &Setup {
        &self.setup
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intervene_core::{Changes, Edge, HealthStateId, Network, Node, Operator};
    use serde_json::json;

    const DISEASE: &str = r#"{
        "states": [{"id": "Susceptible"}, {"id": "Infected"}, {"id": "Recovered"}],
        "initialState": "Susceptible"
    }"#;

    const TRAITS: &str = r#"{
        "traits": [{
            "id": "edgeTrait",
            "features": [{"id": "setting", "enums": [{"id": "home"}, {"id": "work"}]}]
        }]
    }"#;

    const VARIABLES: &str = r#"[
        {"id": "isolations", "initialValue": 0, "scope": "global"}
    ]"#;

    const INTERVENTIONS: &str = r#"{
        "interventions": [
            {
                "id": "isolate",
                "tick": 2,
                "subjects": {"nodes": [1, 2]},
                "action": {
                    "condition": {
                        "operator": "==",
                        "left": {"node": {"property": "healthState"}},
                        "right": {"healthState": "Infected"}
                    },
                    "operations": [
                        {"target": "node", "method": "setInfectivityFactor", "value": 0},
                        {
                            "target": "variable",
                            "variable": "isolations",
                            "method": "setValue",
                            "operator": "+=",
                            "value": 1
                        }
                    ]
                }
            },
            {
                "id": "close-workplaces",
                "tick": 1,
                "subjects": {"edges": [10]},
                "action": {
                    "delay": 2,
                    "operations": [{"target": "edge", "method": "setActive", "value": false}]
                }
            }
        ]
    }"#;

    const TRIGGERS: &str = r#"{
        "triggers": [{
            "id": "many-isolations",
            "condition": {
                "operator": ">=",
                "left": {"variable": {"idRef": "isolations"}},
                "right": 2
            },
            "interventionIds": ["close-workplaces"]
        }]
    }"#;

    fn loader() -> Loader {
        let mut loader = Loader::new();
        loader.load_disease_model(&Loader::parse_str(DISEASE).unwrap()).unwrap();
        loader.load_traits(&Loader::parse_str(TRAITS).unwrap()).unwrap();
        loader.load_variables(&Loader::parse_str(VARIABLES).unwrap()).unwrap();
        loader
    }

    fn model(setup: &Setup) -> Model {
        let mut network = Network::new();
        network.add_node(Node::new(NodeId(1), HealthStateId(1)));
        network.add_node(Node::new(NodeId(2), HealthStateId(0)));
        network.add_edge(Edge::new(EdgeId(10), NodeId(1), NodeId(2)));
        Model::with_state(network, setup.variables.clone())
    }

    #[test]
    fn test_load_and_schedule() {
        let mut loader = loader();
        loader.load_interventions(&Loader::parse_str(INTERVENTIONS).unwrap()).unwrap();
        let setup = loader.finish();
        assert_eq!(setup.interventions.len(), 2);
        assert_eq!(
            setup.interventions[0].subjects,
            [Subject::Node(NodeId(1)), Subject::Node(NodeId(2))]
        );
        assert_eq!(setup.interventions[1].fire_tick(0), 3);

        let registry = OperationRegistry::with_defaults();
        setup.validate(&registry).unwrap();

        let mut queue = setup.queue();
        assert_eq!(setup.schedule(&registry, &mut queue).unwrap(), 3);
        assert_eq!(queue.get_actions(2).len(), 2);
        assert_eq!(queue.get_actions(3).len(), 1);

        let mut model = model(&setup);
        let mut changes = Changes::new();
        let report = queue.process(2, &mut model, &mut changes);
        assert_eq!(report.executed, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(model.network.node(NodeId(1)).unwrap().infectivity_factor, 0.0);
        assert_eq!(model.network.node(NodeId(2)).unwrap().infectivity_factor, 1.0);
        assert_eq!(model.variables.get_by_id("isolations").unwrap().value(), 1.0);

        queue.process(3, &mut model, &mut changes);
        assert!(!model.network.edge(EdgeId(10)).unwrap().active);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_unregistered_method_fails_before_scheduling() {
        let mut loader = loader();
        loader
            .load_interventions(&json!({"interventions": [count("vaccinate", 1.0)]}))
            .unwrap();
        let setup = loader.finish();

        let registry = OperationRegistry::new();
        assert!(matches!(
            setup.validate(&registry),
            Err(Error::Intervention {
                ref id,
                source: intervene_core::Error::UnknownMethod { .. },
            }) if id == "vaccinate"
        ));

        let mut queue = ActionQueue::new();
        assert!(setup.schedule(&registry, &mut queue).is_err());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_default_tick_is_current() {
        let mut loader = loader();
        loader
            .load_interventions(&json!({"interventions": [count("now", 5.0)]}))
            .unwrap();
        let mut setup = loader.finish();
        setup.start_tick = 7;

        let mut queue = setup.queue();
        setup.schedule(&OperationRegistry::with_defaults(), &mut queue).unwrap();
        assert_eq!(queue.get_actions(7).len(), 1);
    }

    #[test]
    fn test_invalid_interventions() {
        let mut loader = loader();
        for doc in [
            json!({}),
            json!({"interventions": [{"action": {"operations": []}}]}),
            json!({"interventions": [
                {"id": "x", "subjects": {"people": [1]}, "action": {"operations": []}}
            ]}),
            json!({"interventions": [{"id": "y", "action": {"operations": []}}]}),
            json!({"interventions": [
                {"id": "z", "tick": -1, "action": {"operations": []}}
            ]}),
        ] {
            assert!(matches!(loader.load_interventions(&doc), Err(Error::InvalidDocument(_))));
        }
    }

    #[test]
    fn test_duplicate_intervention_id() {
        let mut loader = loader();
        let doc = json!({"interventions": [count("a", 1.0), count("a", 2.0)]});
        assert!(matches!(
            loader.load_interventions(&doc),
            Err(Error::DuplicateDefinition(id)) if id == "a"
        ));
    }

    #[test]
    fn test_invalid_catalogs() {
        let mut loader = Loader::new();
        assert!(loader.load_disease_model(&json!({"states": "S"})).is_err());
        assert!(loader.load_traits(&json!({})).is_err());
        assert!(loader.load_variables(&json!({"id": "x"})).is_err());
        assert!(matches!(Loader::parse_str("{"), Err(Error::Json(_))));
    }

    #[test]
    fn test_from_config() {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in [
            ("disease.json", DISEASE),
            ("traits.json", TRAITS),
            ("variables.json", VARIABLES),
            ("interventions.json", INTERVENTIONS),
            ("triggers.json", TRIGGERS),
        ] {
            fs::write(dir.path().join(name), content).unwrap();
        }
        let config_path = dir.path().join("run.ron");
        fs::write(
            &config_path,
            r#"(
                disease_model: Some("disease.json"),
                traits: Some("traits.json"),
                variables: Some("variables.json"),
                interventions: Some("interventions.json"),
                triggers: Some("triggers.json"),
                start_tick: 1,
            )"#,
        )
        .unwrap();

        let config = EngineConfig::load(&config_path).unwrap();
        let setup = Loader::from_config(&config).unwrap();
        assert_eq!(setup.start_tick, 1);
        assert_eq!(setup.catalog.health_states.len(), 3);
        assert!(setup.catalog.traits.get("edgeTrait").is_some());
        assert_eq!(setup.variables.len(), 1);
        assert_eq!(setup.interventions.len(), 2);
        assert_eq!(setup.triggers.len(), 1);
        assert_eq!(setup.triggers[0].interventions, ["close-workplaces"]);
    }

    fn count(id: &str, value: f64) -> Document {
        json!({
            "id": id,
            "action": {"operations": [
                {
                    "target": "variable",
                    "variable": "isolations",
                    "method": "setValue",
                    "value": value
                }
            ]}
        })
    }

    fn isolations(operator: &str, threshold: u64) -> Document {
        json!({
            "operator": operator,
            "left": {"variable": {"idRef": "isolations"}},
            "right": threshold
        })
    }

    #[test]
    fn test_failed_document_is_not_applied() {
        let mut loader = loader();
        let doc = json!({"interventions": [count("good", 1.0), {"id": "bad", "action": {}}]});
        assert!(matches!(loader.load_interventions(&doc), Err(Error::InvalidDocument(_))));
        assert!(loader.setup().interventions.is_empty());

        loader
            .load_interventions(&json!({"interventions": [count("good", 1.0)]}))
            .unwrap();
        assert_eq!(loader.setup().interventions.len(), 1);

        // ids from earlier documents stay reserved
        assert!(matches!(
            loader.load_interventions(&json!({"interventions": [count("good", 2.0)]})),
            Err(Error::DuplicateDefinition(id)) if id == "good"
        ));
        assert_eq!(loader.setup().interventions.len(), 1);
    }

    #[test]
    fn test_triggers_fire_interventions() {
        let mut loader = loader();
        loader
            .load_interventions(&json!({"interventions": [
                {
                    "id": "close-workplaces",
                    "subjects": {"edges": [10]},
                    "action": {
                        "delay": 1,
                        "operations": [{"target": "edge", "method": "setActive", "value": false}]
                    }
                },
                count("scheduled", 7.0)
            ]}))
            .unwrap();
        loader
            .load_triggers(&json!({"triggers": [
                {
                    "condition": isolations(">=", 2),
                    "interventionIds": ["close-workplaces"]
                },
                {
                    "id": "always",
                    "condition": {"value": true},
                    "interventionIds": ["close-workplaces"]
                }
            ]}))
            .unwrap();
        let setup = loader.finish();
        assert_eq!(setup.triggers[0].id, "trigger.0");
        assert!(setup.is_triggered("close-workplaces"));
        assert!(!setup.is_triggered("scheduled"));

        let registry = OperationRegistry::with_defaults();
        setup.validate(&registry).unwrap();

        // triggered interventions without a tick wait for their trigger
        let mut queue = setup.queue();
        assert_eq!(setup.schedule(&registry, &mut queue).unwrap(), 1);
        assert_eq!(queue.pending_actions(), 1);

        let triggers = setup.create_triggers().unwrap();
        let mut model = model(&setup);
        let mut changes = Changes::new();
        queue.process(0, &mut model, &mut changes);
        assert_eq!(model.variables.get_by_id("isolations").unwrap().value(), 7.0);

        // both triggers hold; the intervention fires once
        queue.set_current_tick(3);
        assert_eq!(setup.process_triggers(&triggers, &registry, &model, &mut queue).unwrap(), 1);
        assert_eq!(queue.get_actions(4).len(), 1);

        queue.process(4, &mut model, &mut changes);
        assert!(!model.network.edge(EdgeId(10)).unwrap().active);
    }

    #[test]
    fn test_trigger_waits_for_condition() {
        let mut loader = loader();
        loader
            .load_interventions(&json!({"interventions": [count("reset", 0.0)]}))
            .unwrap();
        loader.load_triggers(&Loader::parse_str(r#"{"triggers": []}"#).unwrap()).unwrap();
        loader
            .load_triggers(&json!({"triggers": [{
                "condition": isolations(">", 5),
                "interventionIds": ["reset"]
            }]}))
            .unwrap();
        let setup = loader.finish();

        let registry = OperationRegistry::with_defaults();
        let triggers = setup.create_triggers().unwrap();
        let mut model = model(&setup);
        let mut queue = setup.queue();

        assert_eq!(setup.process_triggers(&triggers, &registry, &model, &mut queue).unwrap(), 0);
        assert!(queue.is_empty());

        model.variables.get_mut(0).unwrap().set_value(6.0, Operator::Assign);
        assert_eq!(setup.process_triggers(&triggers, &registry, &model, &mut queue).unwrap(), 1);
        queue.process(0, &mut model, &mut Changes::new());
        assert_eq!(model.variables.get(0).unwrap().value(), 0.0);
    }

    #[test]
    fn test_inline_trigger() {
        let mut loader = loader();
        let mut doc = count("relief", 0.0);
        doc["trigger"] = isolations(">", 100);
        loader.load_interventions(&json!({"interventions": [doc]})).unwrap();

        let setup = loader.finish();
        assert_eq!(setup.triggers.len(), 1);
        assert_eq!(setup.triggers[0].id, "relief.trigger");
        assert_eq!(setup.triggers[0].interventions, ["relief"]);

        let mut queue = setup.queue();
        assert_eq!(setup.schedule(&OperationRegistry::with_defaults(), &mut queue).unwrap(), 0);
    }

    #[test]
    fn test_invalid_triggers() {
        let mut loader = loader();
        loader
            .load_interventions(&json!({"interventions": [count("known", 1.0)]}))
            .unwrap();

        let doc = json!({"triggers": [
            {"condition": {"value": true}, "interventionIds": ["known"]},
            {"condition": {"value": true}, "interventionIds": ["unknown"]}
        ]});
        assert!(matches!(loader.load_triggers(&doc), Err(Error::InvalidDocument(_))));
        assert!(loader.setup().triggers.is_empty());
        assert!(loader.load_triggers(&json!({})).is_err());

        loader
            .load_triggers(&json!({"triggers": [{
                "id": "per-node",
                "condition": {
                    "operator": "==",
                    "left": {"node": {"property": "healthState"}},
                    "right": {"healthState": "Infected"}
                },
                "interventionIds": ["known"]
            }]}))
            .unwrap();
        let setup = loader.finish();
        assert!(matches!(
            setup.validate(&OperationRegistry::with_defaults()),
            Err(Error::Trigger { ref id, .. }) if id == "per-node"
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut loader = Loader::new();
        assert!(matches!(
            loader.load_variables_file(dir.path().join("missing.json")),
            Err(Error::Io(_))
        ));
    }
}
