//! Boolean expressions and conditions
//!
//! Conditions gate the operations of an action. A condition document is
//! parsed once into a [`ConditionDefinition`]; each action then receives its
//! own [`Condition`] bound to the subject the action was created for.
//!
//! Document grammar:
//!
//! ```text
//! {"value": true}
//! {"not": expr}
//! {"and": [expr, ..]}
//! {"or": [expr, ..]}
//! {"operator": "==" | "!=" | "<" | "<=" | ">" | ">=", "left": operand, "right": operand}
//! {"operator": "in" | "not in", "left": operand, "right": value set}
//! ```
//!
//! An operand is a single value document, `{"variable": {"idRef": id}}`,
//! `{"node": {"property": name}}` or `{"edge": {"property": name}}`.

use crate::catalog::Catalog;
use crate::document::{describe, get_str, Document};
use crate::error::{Error, Result};
use crate::identity::Subject;
use crate::model::Model;
use crate::network::{EdgeProperty, NodeProperty};
use crate::operation::TargetKind;
use crate::traits::TraitValue;
use crate::value::{Value, ValueType};
use crate::value_set::ValueSet;
use crate::variable::VariableStore;
use std::cmp::Ordering;
use tracing::error;

/// Relational operator of a comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

impl Comparison {
    pub fn parse(symbol: &str) -> Option<Self> {
        match symbol {
            "==" => Some(Comparison::Equal),
            "!=" => Some(Comparison::NotEqual),
            "<" => Some(Comparison::Less),
            "<=" => Some(Comparison::LessOrEqual),
            ">" => Some(Comparison::Greater),
            ">=" => Some(Comparison::GreaterOrEqual),
            _ => None,
        }
    }

    /// Whether `ordering` of left to right satisfies the comparison
    pub fn holds(self, ordering: Ordering) -> bool {
        match self {
            Comparison::Equal => ordering.is_eq(),
            Comparison::NotEqual => ordering.is_ne(),
            Comparison::Less => ordering.is_lt(),
            Comparison::LessOrEqual => ordering.is_le(),
            Comparison::Greater => ordering.is_gt(),
            Comparison::GreaterOrEqual => ordering.is_ge(),
        }
    }
}

/// One side of a comparison
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A literal
    Value(Value),
    /// A variable, by store index
    Variable(usize),
    /// An attribute of the subject node
    Node(NodeProperty),
    /// An attribute of the subject edge
    Edge(EdgeProperty),
}

impl Operand {
    fn from_document(doc: &Document, catalog: &Catalog, variables: &VariableStore) -> Option<Self> {
        if let Some(variable) = doc.get("variable") {
            let id = get_str(variable, "idRef")?;
            return match variables.index_of(id) {
                Some(index) => Some(Operand::Variable(index)),
                None => {
                    error!(id, "Condition: unknown variable");
                    None
                }
            };
        }

        if let Some(node) = doc.get("node") {
            return get_str(node, "property")
                .and_then(NodeProperty::parse)
                .map(Operand::Node);
        }

        if let Some(edge) = doc.get("edge") {
            return get_str(edge, "property")
                .and_then(EdgeProperty::parse)
                .map(Operand::Edge);
        }

        Value::from_document(doc, catalog).map(Operand::Value)
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Operand::Value(value) => value.value_type(),
            Operand::Variable(_) => ValueType::Number,
            Operand::Node(property) => property.value_type(),
            Operand::Edge(property) => property.value_type(),
        }
    }

    /// Current value, or `None` if the subject does not provide it
    pub fn evaluate(&self, model: &Model, subject: Subject) -> Option<Value> {
        match (self, subject) {
            (Operand::Value(value), _) => Some(*value),
            (Operand::Variable(index), _) => {
                model.variables.get(*index).map(|v| Value::Number(v.value()))
            }
            (Operand::Node(property), Subject::Node(id)) => {
                model.network.node(id).map(|n| n.get(*property))
            }
            (Operand::Edge(property), Subject::Edge(id)) => {
                model.network.edge(id).map(|e| e.get(*property))
            }
            _ => None,
        }
    }

    fn required_target(&self) -> Option<TargetKind> {
        match self {
            Operand::Node(_) => Some(TargetKind::Node),
            Operand::Edge(_) => Some(TargetKind::Edge),
            _ => None,
        }
    }
}

/// Narrow trait values to their common feature.
///
/// Entity trait attributes cover the whole trait word; comparing one with a
/// literal only looks at the literal's feature.
fn align(left: Value, right: Value) -> (Value, Value) {
    match (left, right) {
        (Value::TraitValue(l), Value::TraitValue(r)) if l.feature != r.feature => {
            if l.feature & r.feature == r.feature {
                (Value::TraitValue(TraitValue::of(l.value, r.feature)), right)
            } else if l.feature & r.feature == l.feature {
                (left, Value::TraitValue(TraitValue::of(r.value, l.feature)))
            } else {
                (left, right)
            }
        }
        _ => (left, right),
    }
}

/// A predicate tree over simulation state
#[derive(Debug, Clone, PartialEq)]
pub enum BooleanExpression {
    /// Always the given value
    Constant(bool),
    /// Relational comparison of two operands of the same type
    Compare {
        comparison: Comparison,
        left: Operand,
        right: Operand,
    },
    /// Membership of an operand in a set
    Within {
        operand: Operand,
        set: ValueSet,
        negate: bool,
    },
    Not(Box<BooleanExpression>),
    And(Vec<BooleanExpression>),
    Or(Vec<BooleanExpression>),
}

impl BooleanExpression {
    /// Parse an expression document. Problems are logged and yield `None`.
    pub fn from_document(
        doc: &Document,
        catalog: &Catalog,
        variables: &VariableStore,
    ) -> Option<Self> {
        if let Some(value) = doc.get("value") {
            let value = value.as_bool();
            if value.is_none() {
                error!(doc = %describe(doc), "Condition: 'value' must be a boolean");
            }
            return value.map(BooleanExpression::Constant);
        }

        if let Some(inner) = doc.get("not") {
            return Self::from_document(inner, catalog, variables)
                .map(|e| BooleanExpression::Not(Box::new(e)));
        }

        if let Some(items) = doc.get("and") {
            return Self::parse_list(items, catalog, variables).map(BooleanExpression::And);
        }

        if let Some(items) = doc.get("or") {
            return Self::parse_list(items, catalog, variables).map(BooleanExpression::Or);
        }

        if let Some(operator) = get_str(doc, "operator") {
            return Self::parse_operator(operator, doc, catalog, variables);
        }

        error!(doc = %describe(doc), "Condition: unrecognized expression");
        None
    }

    fn parse_list(
        items: &Document,
        catalog: &Catalog,
        variables: &VariableStore,
    ) -> Option<Vec<Self>> {
        let Some(items) = items.as_array() else {
            error!(doc = %describe(items), "Condition: expected an array of expressions");
            return None;
        };

        items
            .iter()
            .map(|item| Self::from_document(item, catalog, variables))
            .collect()
    }

    fn parse_operator(
        operator: &str,
        doc: &Document,
        catalog: &Catalog,
        variables: &VariableStore,
    ) -> Option<Self> {
        let null = Document::Null;
        let left_doc = doc.get("left").unwrap_or(&null);
        let right_doc = doc.get("right").unwrap_or(&null);

        let Some(left) = Operand::from_document(left_doc, catalog, variables) else {
            error!(doc = %describe(left_doc), "Condition: invalid left operand");
            return None;
        };

        if operator == "in" || operator == "not in" {
            let set = ValueSet::from_document(right_doc, catalog);
            if !set.is_valid() {
                return None;
            }
            if set.value_type() != left.value_type() {
                error!(
                    operand = %left.value_type(),
                    set = %set.value_type(),
                    "Condition: operand and set types differ"
                );
                return None;
            }
            return Some(BooleanExpression::Within {
                operand: left,
                set,
                negate: operator == "not in",
            });
        }

        let Some(comparison) = Comparison::parse(operator) else {
            error!(operator, "Condition: unknown operator");
            return None;
        };

        let Some(right) = Operand::from_document(right_doc, catalog, variables) else {
            error!(doc = %describe(right_doc), "Condition: invalid right operand");
            return None;
        };

        if left.value_type() != right.value_type() {
            error!(
                left = %left.value_type(),
                right = %right.value_type(),
                "Condition: operand types differ"
            );
            return None;
        }

        Some(BooleanExpression::Compare {
            comparison,
            left,
            right,
        })
    }

    /// Evaluate against current state.
    ///
    /// Returns `None` when an operand reads something the subject does not
    /// provide, such as an attribute of a node missing from the model. An
    /// undetermined part leaves every expression containing it undetermined,
    /// negations included.
    pub fn evaluate(&self, model: &Model, subject: Subject) -> Option<bool> {
        match self {
            BooleanExpression::Constant(value) => Some(*value),
            BooleanExpression::Compare {
                comparison,
                left,
                right,
            } => {
                let (l, r) = align(left.evaluate(model, subject)?, right.evaluate(model, subject)?);
                Some(comparison.holds(l.cmp(&r)))
            }
            BooleanExpression::Within {
                operand,
                set,
                negate,
            } => {
                let found = match operand.evaluate(model, subject)? {
                    Value::TraitValue(t) => set.feature().is_some_and(|feature| {
                        set.contains(&Value::TraitValue(TraitValue::of(t.value, feature)))
                    }),
                    value => set.contains(&value),
                };
                Some(found != *negate)
            }
            BooleanExpression::Not(inner) => inner.evaluate(model, subject).map(|value| !value),
            BooleanExpression::And(items) => items
                .iter()
                .try_fold(true, |all, item| Some(item.evaluate(model, subject)? && all)),
            BooleanExpression::Or(items) => items
                .iter()
                .try_fold(false, |any, item| Some(item.evaluate(model, subject)? || any)),
        }
    }

    /// Entity kinds whose attributes the expression reads, in order of
    /// first use
    pub fn required_targets(&self) -> Vec<TargetKind> {
        let mut kinds = Vec::new();
        self.collect_targets(&mut kinds);
        kinds
    }

    fn collect_targets(&self, kinds: &mut Vec<TargetKind>) {
        match self {
            BooleanExpression::Constant(_) => {}
            BooleanExpression::Compare { left, right, .. } => {
                push_target(kinds, left);
                push_target(kinds, right);
            }
            BooleanExpression::Within { operand, .. } => push_target(kinds, operand),
            BooleanExpression::Not(inner) => inner.collect_targets(kinds),
            BooleanExpression::And(items) | BooleanExpression::Or(items) => {
                for item in items {
                    item.collect_targets(kinds);
                }
            }
        }
    }
}

fn push_target(kinds: &mut Vec<TargetKind>, operand: &Operand) {
    if let Some(kind) = operand.required_target() {
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
}

/// Parsed condition document, shared by every action built from it
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionDefinition {
    expression: BooleanExpression,
    valid: bool,
}

impl ConditionDefinition {
    /// A condition that always holds
    pub fn always() -> Self {
        Self::new(BooleanExpression::Constant(true))
    }

    pub fn new(expression: BooleanExpression) -> Self {
        Self {
            expression,
            valid: true,
        }
    }

    /// Parse an optional condition document; a missing one always holds
    pub fn from_document(
        doc: Option<&Document>,
        catalog: &Catalog,
        variables: &VariableStore,
    ) -> Self {
        let Some(doc) = doc else {
            return Self::always();
        };

        let invalid = Self {
            expression: BooleanExpression::Constant(false),
            valid: false,
        };

        let Some(expression) = BooleanExpression::from_document(doc, catalog, variables) else {
            return invalid;
        };

        let targets = expression.required_targets();
        if targets.len() > 1 {
            error!(
                doc = %describe(doc),
                "Condition: node and edge attributes cannot be read together"
            );
            return invalid;
        }

        Self::new(expression)
    }

    pub fn expression(&self) -> &BooleanExpression {
        &self.expression
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Check that `subject` provides every entity attribute the expression reads
    pub fn check_subject(&self, subject: Subject) -> Result<()> {
        for target in self.expression.required_targets() {
            match (target, subject) {
                (TargetKind::Node, Subject::Node(_)) | (TargetKind::Edge, Subject::Edge(_)) => {}
                _ => {
                    return Err(Error::TargetMismatch {
                        target,
                        subject: subject.to_string(),
                    })
                }
            }
        }
        Ok(())
    }

    /// Bind a copy of the expression to `subject`
    pub fn create_condition(&self, subject: Subject) -> Result<Condition> {
        if !self.valid {
            return Err(Error::InvalidDefinition("condition".to_string()));
        }
        self.check_subject(subject)?;
        Ok(Condition {
            expression: Box::new(self.expression.clone()),
            subject,
        })
    }
}

impl Default for ConditionDefinition {
    fn default() -> Self {
        Self::always()
    }
}

/// An expression bound to the subject it is evaluated for
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    expression: Box<BooleanExpression>,
    subject: Subject,
}

impl Condition {
    pub fn new(expression: BooleanExpression, subject: Subject) -> Self {
        Self {
            expression: Box::new(expression),
            subject,
        }
    }

    /// Evaluate against current state; an undetermined expression is false
    pub fn is_true(&self, model: &Model) -> bool {
        self.expression.evaluate(model, self.subject).unwrap_or(false)
    }

    pub fn subject(&self) -> Subject {
        self.subject
    }

    pub fn expression(&self) -> &BooleanExpression {
        &self.expression
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::HealthStateId;
    use crate::identity::{EdgeId, NodeId};
    use crate::network::{Edge, Network, Node};
    use crate::operator::Operator;
    use crate::value::tests::catalog;
    use crate::variable::{Variable, VariableScope};
    use serde_json::json;

    fn model() -> Model {
        let catalog = catalog();
        let adult = catalog.traits.get("nodeTrait").unwrap().default_data();

        let mut network = Network::new();
        network.add_node(Node::new(NodeId(1), HealthStateId(2)).with_trait(adult));
        network.add_node(Node::new(NodeId(2), HealthStateId(0)).with_trait(adult));
        network.add_edge(Edge::new(EdgeId(7), NodeId(1), NodeId(2)));

        let mut variables = VariableStore::new();
        variables.push(Variable::new("cases", 12.0, VariableScope::Global));
        variables.push(Variable::new("threshold", 10.0, VariableScope::Global));

        Model::with_state(network, variables)
    }

    fn compare(operator: &str, left: Document, right: Document) -> Document {
        json!({"operator": operator, "left": left, "right": right})
    }

    fn node(property: &str) -> Document {
        json!({"node": {"property": property}})
    }

    fn variable(id: &str) -> Document {
        json!({"variable": {"idRef": id}})
    }

    fn parse(doc: Document, model: &Model) -> ConditionDefinition {
        ConditionDefinition::from_document(Some(&doc), &catalog(), &model.variables)
    }

    #[test]
    fn test_missing_document_is_true() {
        let variables = VariableStore::new();
        let definition = ConditionDefinition::from_document(None, &catalog(), &variables);
        assert!(definition.is_valid());
        let condition = definition.create_condition(Subject::Global).unwrap();
        assert!(condition.is_true(&Model::new()));
    }

    #[test]
    fn test_variable_comparison() {
        let mut model = model();
        let definition = parse(
            compare(">=", variable("cases"), variable("threshold")),
            &model,
        );
        let condition = definition.create_condition(Subject::Global).unwrap();
        assert!(condition.is_true(&model));

        model.variables.get_mut(0).unwrap().set_value(5.0, Operator::Assign);
        assert!(!condition.is_true(&model));
    }

    #[test]
    fn test_node_membership() {
        let model = model();
        let definition = parse(
            compare("in", node("healthState"), json!({"healthState": ["Exposed", "Infected"]})),
            &model,
        );
        assert!(definition.is_valid());

        assert!(definition.create_condition(Subject::Node(NodeId(1))).unwrap().is_true(&model));
        assert!(!definition.create_condition(Subject::Node(NodeId(2))).unwrap().is_true(&model));
        // unknown node yields false
        assert!(!definition.create_condition(Subject::Node(NodeId(9))).unwrap().is_true(&model));
    }

    #[test]
    fn test_not_in() {
        let model = model();
        let definition = parse(
            compare("not in", node("healthState"), json!({"healthState": ["Recovered"]})),
            &model,
        );
        assert!(definition.create_condition(Subject::Node(NodeId(2))).unwrap().is_true(&model));
    }

    #[test]
    fn test_trait_comparison_uses_literal_feature() {
        let model = model();
        let definition = parse(
            compare(
                "==",
                node("nodeTrait"),
                json!({"trait": "nodeTrait", "feature": "ageGroup", "enum": "adult"}),
            ),
            &model,
        );
        assert!(definition.is_valid());
        assert!(definition.create_condition(Subject::Node(NodeId(1))).unwrap().is_true(&model));

        let set = parse(
            compare(
                "in",
                node("nodeTrait"),
                json!({"trait": "nodeTrait", "feature": "ageGroup", "enum": ["child", "senior"]}),
            ),
            &model,
        );
        assert!(!set.create_condition(Subject::Node(NodeId(1))).unwrap().is_true(&model));
    }

    #[test]
    fn test_logical_composition() {
        let model = model();
        let definition = parse(
            json!({"and": [
                {"value": true},
                {"or": [{"value": false}, {"not": {"value": false}}]},
                {"operator": "==", "left": {"edge": {"property": "active"}}, "right": true}
            ]}),
            &model,
        );
        assert!(definition.is_valid());
        assert!(definition.create_condition(Subject::Edge(EdgeId(7))).unwrap().is_true(&model));
    }

    #[test]
    fn test_type_mismatch_is_invalid() {
        let model = model();
        let compared = parse(
            compare("<", variable("cases"), json!({"boolean": true})),
            &model,
        );
        assert!(!compared.is_valid());

        let within = parse(
            compare("in", node("healthState"), json!({"number": [1, 2]})),
            &model,
        );
        assert!(!within.is_valid());
        assert!(within.create_condition(Subject::Global).is_err());
    }

    #[test]
    fn test_malformed_documents_are_invalid() {
        let model = model();
        for doc in [
            json!({"value": 1}),
            json!({"and": {"value": true}}),
            json!({"operator": "~", "left": 1, "right": 2}),
            json!({"operator": "==", "left": {"variable": {"idRef": "missing"}}, "right": 1}),
            json!({"operator": "==", "left": {"node": {"property": "height"}}, "right": 1}),
            json!({"something": []}),
        ] {
            assert!(!parse(doc, &model).is_valid());
        }
    }

    #[test]
    fn test_subject_mismatch() {
        let model = model();
        let definition = parse(
            json!({"not": compare(">", node("infectivityFactor"), json!(0.5))}),
            &model,
        );
        assert!(definition.create_condition(Subject::Node(NodeId(1))).is_ok());
        assert!(matches!(
            definition.create_condition(Subject::Edge(EdgeId(7))),
            Err(Error::TargetMismatch { target: TargetKind::Node, .. })
        ));
    }

    #[test]
    fn test_mixed_entity_operands_are_rejected() {
        let model = model();
        let doc = json!({"and": [
            compare("==", node("healthState"), json!({"healthState": "Infected"})),
            {"operator": "==", "left": {"edge": {"property": "active"}}, "right": true}
        ]});
        assert!(!parse(doc.clone(), &model).is_valid());

        let expression =
            BooleanExpression::from_document(&doc, &catalog(), &model.variables).unwrap();
        assert_eq!(expression.required_targets(), [TargetKind::Node, TargetKind::Edge]);

        let definition = ConditionDefinition::new(expression);
        assert!(matches!(
            definition.create_condition(Subject::Node(NodeId(1))),
            Err(Error::TargetMismatch { target: TargetKind::Edge, .. })
        ));
        assert!(matches!(
            definition.create_condition(Subject::Edge(EdgeId(7))),
            Err(Error::TargetMismatch { target: TargetKind::Node, .. })
        ));
    }

    #[test]
    fn test_missing_entity_is_undetermined() {
        let model = model();
        let missing = Subject::Node(NodeId(9));
        let recovered = json!({"healthState": ["Recovered"]});
        let within = compare("in", node("healthState"), recovered.clone());
        let not_in = compare("not in", node("healthState"), recovered);

        for doc in [
            within.clone(),
            not_in,
            json!({"not": within.clone()}),
            json!({"or": [{"value": true}, within.clone()]}),
            json!({"and": [{"value": false}, {"not": within}]}),
        ] {
            let definition = parse(doc, &model);
            assert!(definition.is_valid());
            assert_eq!(definition.expression().evaluate(&model, missing), None);
            assert!(!definition.create_condition(missing).unwrap().is_true(&model));
        }
    }

    #[test]
    fn test_signed_zero_factor_compares_equal() {
        let mut model = model();
        let target = model.network.node_mut(NodeId(1)).unwrap();
        assert!(target.set_infectivity_factor(0.0, Operator::Assign));
        assert!(target.set_infectivity_factor(-1.0, Operator::Mul));

        let subject = Subject::Node(NodeId(1));
        for doc in [
            compare("==", node("infectivityFactor"), json!(0)),
            compare("in", node("infectivityFactor"), json!({"number": [0]})),
            compare("==", node("infectivityFactor"), json!(-0.0)),
        ] {
            let condition = parse(doc, &model).create_condition(subject).unwrap();
            assert!(condition.is_true(&model));
        }
    }

    #[test]
    fn test_condition_clone_is_independent() {
        let model = model();
        let expression = BooleanExpression::Not(Box::new(BooleanExpression::Constant(false)));
        let original = Condition::new(expression, Subject::Global);
        let copy = original.clone();
        drop(original);
        assert!(copy.is_true(&model));
    }
}
