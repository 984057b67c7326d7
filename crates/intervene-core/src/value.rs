//! Typed domain values
//!
//! A [`Value`] is one datum of a closed set of domain types. Values are
//! totally ordered (first by type, then by payload) so they can live in
//! ordered, duplicate-free containers.

use crate::catalog::Catalog;
use crate::document::{get_str, Document};
use crate::health::HealthStateId;
use crate::traits::TraitValue;
use std::cmp::Ordering;
use std::fmt;

/// Type tag of a [`Value`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValueType {
    Boolean,
    Number,
    HealthState,
    TraitValue,
}

impl ValueType {
    /// Fixed-width tag used in binary state
    pub fn tag(self) -> u32 {
        match self {
            ValueType::Boolean => 0,
            ValueType::Number => 1,
            ValueType::HealthState => 2,
            ValueType::TraitValue => 3,
        }
    }

    /// Inverse of [`ValueType::tag`]
    pub fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            0 => Some(ValueType::Boolean),
            1 => Some(ValueType::Number),
            2 => Some(ValueType::HealthState),
            3 => Some(ValueType::TraitValue),
            _ => None,
        }
    }

    /// Document key introducing values of this type
    pub fn key(self) -> &'static str {
        match self {
            ValueType::Boolean => "boolean",
            ValueType::Number => "number",
            ValueType::HealthState => "healthState",
            ValueType::TraitValue => "traitValue",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A single typed datum
#[derive(Debug, Clone, Copy)]
pub enum Value {
    Boolean(bool),
    Number(f64),
    HealthState(HealthStateId),
    TraitValue(TraitValue),
}

impl Value {
    /// Type tag of this value
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Boolean(_) => ValueType::Boolean,
            Value::Number(_) => ValueType::Number,
            Value::HealthState(_) => ValueType::HealthState,
            Value::TraitValue(_) => ValueType::TraitValue,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_health_state(&self) -> Option<HealthStateId> {
        match self {
            Value::HealthState(s) => Some(*s),
            _ => None,
        }
    }

    pub fn as_trait_value(&self) -> Option<TraitValue> {
        match self {
            Value::TraitValue(t) => Some(*t),
            _ => None,
        }
    }

    /// Parse a single value document.
    ///
    /// Recognizes `{"boolean": b}`, `{"number": x}`, `{"healthState": name}`
    /// and `{"trait": t, "feature": f, "enum": e}` in that order, or a bare
    /// boolean or number. Names are resolved against `catalog`; returns
    /// `None` if nothing matches or a name is unknown.
    pub fn from_document(doc: &Document, catalog: &Catalog) -> Option<Value> {
        match doc {
            Document::Bool(b) => return Some(Value::Boolean(*b)),
            Document::Number(n) => return n.as_f64().map(Value::from),
            _ => {}
        }

        if let Some(b) = doc.get("boolean") {
            return b.as_bool().map(Value::Boolean);
        }

        if let Some(n) = doc.get("number") {
            return n.as_f64().map(Value::from);
        }

        if let Some(name) = doc.get("healthState") {
            return name
                .as_str()
                .and_then(|name| catalog.health_states.get(name))
                .map(Value::HealthState);
        }

        let trait_id = get_str(doc, "trait")?;
        let feature = get_str(doc, "feature")?;
        let enumerant = get_str(doc, "enum")?;
        catalog
            .traits
            .resolve(trait_id, feature, enumerant)
            .map(Value::TraitValue)
    }
}

/// Fold negative zero into zero; `total_cmp` orders them apart
pub(crate) fn canonical(n: f64) -> f64 {
    if n == 0.0 {
        0.0
    } else {
        n
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Number(a), Value::Number(b)) => canonical(*a).total_cmp(&canonical(*b)),
            (Value::HealthState(a), Value::HealthState(b)) => a.cmp(b),
            (Value::TraitValue(a), Value::TraitValue(b)) => a.cmp(b),
            _ => self.value_type().cmp(&other.value_type()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::HealthState(s) => write!(f, "{}", s),
            Value::TraitValue(t) => write!(f, "{}", t),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(canonical(n))
    }
}

impl From<HealthStateId> for Value {
    fn from(s: HealthStateId) -> Self {
        Value::HealthState(s)
    }
}

impl From<TraitValue> for Value {
    fn from(t: TraitValue) -> Self {
        Value::TraitValue(t)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::health::HealthStates;
    use crate::traits::TraitRegistry;
    use serde_json::json;

    /// Catalog shared by the parser tests of this crate
    pub(crate) fn catalog() -> Catalog {
        Catalog::new(
            HealthStates::new(["Susceptible", "Exposed", "Infected", "Recovered"]),
            TraitRegistry::from_document(&json!({
                "traits": [{
                    "id": "nodeTrait",
                    "features": [
                        {
                            "id": "ageGroup",
                            "enums": [{"id": "child"}, {"id": "adult"}, {"id": "senior"}],
                            "default": "adult"
                        },
                        {
                            "id": "vaccinated",
                            "enums": [{"id": "no"}, {"id": "yes"}],
                            "default": "no"
                        }
                    ]
                }]
            })),
        )
    }

    #[test]
    fn test_value_types() {
        assert_eq!(Value::from(true).value_type(), ValueType::Boolean);
        assert_eq!(Value::from(2.5).value_type(), ValueType::Number);
        assert_eq!(Value::from(HealthStateId(1)).value_type(), ValueType::HealthState);
        assert_eq!(
            Value::from(TraitValue::new(3, 1)).value_type(),
            ValueType::TraitValue
        );
        assert_eq!(Value::from(2.5).as_number(), Some(2.5));
        assert_eq!(Value::from(2.5).as_bool(), None);
    }

    #[test]
    fn test_tag_round_trip() {
        for t in [
            ValueType::Boolean,
            ValueType::Number,
            ValueType::HealthState,
            ValueType::TraitValue,
        ] {
            assert_eq!(ValueType::from_tag(t.tag()), Some(t));
        }
        assert_eq!(ValueType::from_tag(9), None);
    }

    #[test]
    fn test_ordering() {
        assert!(Value::from(false) < Value::from(true));
        assert!(Value::from(-1.0) < Value::from(0.5));
        // type tag orders before payload
        assert!(Value::from(true) < Value::from(-100.0));
        assert_eq!(Value::from(f64::NAN), Value::from(f64::NAN));
    }

    #[test]
    fn test_negative_zero_equals_zero() {
        assert_eq!(Value::Number(-0.0), Value::Number(0.0));
        assert_eq!(Value::Number(-0.0).cmp(&Value::Number(0.0)), Ordering::Equal);
        assert!(Value::Number(-0.0) > Value::Number(-1e-300));
        assert_eq!(Value::from(-0.0).as_number().map(f64::is_sign_negative), Some(false));

        let parsed = Value::from_document(&json!({"number": -0.0}), &catalog()).unwrap();
        assert_eq!(parsed.as_number().map(f64::is_sign_negative), Some(false));
    }

    #[test]
    fn test_from_document() {
        let catalog = catalog();
        assert_eq!(
            Value::from_document(&json!({"boolean": true}), &catalog),
            Some(Value::Boolean(true))
        );
        assert_eq!(
            Value::from_document(&json!({"number": 3}), &catalog),
            Some(Value::Number(3.0))
        );
        assert_eq!(Value::from_document(&json!(0.25), &catalog), Some(Value::Number(0.25)));
        assert_eq!(
            Value::from_document(&json!({"healthState": "Infected"}), &catalog),
            Some(Value::HealthState(HealthStateId(2)))
        );
        let vaccinated = catalog.traits.resolve("nodeTrait", "vaccinated", "yes").unwrap();
        assert_eq!(
            Value::from_document(
                &json!({"trait": "nodeTrait", "feature": "vaccinated", "enum": "yes"}),
                &catalog
            ),
            Some(Value::TraitValue(vaccinated))
        );
    }

    #[test]
    fn test_from_document_rejects() {
        let catalog = catalog();
        assert_eq!(Value::from_document(&json!({"number": "x"}), &catalog), None);
        assert_eq!(Value::from_document(&json!({"healthState": "Dead"}), &catalog), None);
        assert_eq!(Value::from_document(&json!({"other": 1}), &catalog), None);
        assert_eq!(Value::from_document(&json!("text"), &catalog), None);
    }
}
