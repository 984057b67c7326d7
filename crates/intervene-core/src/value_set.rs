//! Type-homogeneous sets of values
//!
//! A [`ValueSet`] is the right-hand side of membership tests such as
//! "health state is one of {Exposed, Infected}". All members share the set's
//! [`ValueType`]; a trait-value set is further scoped to a single feature.

use crate::catalog::Catalog;
use crate::codec;
use crate::document::{describe, get_str, Document};
use crate::error::Result;
use crate::traits::{TraitData, TraitValue};
use crate::value::{Value, ValueType};
use std::collections::BTreeSet;
use std::io::{Read, Write};
use tracing::error;

/// An ordered, duplicate-free collection of values of one type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueSet {
    value_type: ValueType,
    valid: bool,
    values: BTreeSet<Value>,
}

impl ValueSet {
    /// Create an empty set for `value_type`
    pub fn new(value_type: ValueType) -> Self {
        Self {
            value_type,
            valid: true,
            values: BTreeSet::new(),
        }
    }

    fn invalid(value_type: ValueType) -> Self {
        Self {
            valid: false,
            ..Self::new(value_type)
        }
    }

    /// Insert a value.
    ///
    /// Returns false and leaves the set unchanged if the value's type differs
    /// from the set's, or if it is a trait value of another feature than the
    /// current members. Inserting an existing member is accepted.
    pub fn append(&mut self, value: Value) -> bool {
        if value.value_type() != self.value_type {
            return false;
        }

        let value = match value {
            Value::Number(n) => Value::from(n),
            Value::TraitValue(t) => match self.feature() {
                Some(feature) if t.feature != feature => return false,
                _ => value,
            },
            _ => value,
        };

        self.values.insert(value);
        true
    }

    /// Check membership
    pub fn contains(&self, value: &Value) -> bool {
        self.values.contains(value)
    }

    /// Whether any member matches the feature bits of a packed trait word.
    ///
    /// Only meaningful for trait-value sets.
    pub fn contains_trait(&self, data: TraitData) -> bool {
        self.feature()
            .is_some_and(|feature| self.contains(&Value::TraitValue(TraitValue::of(data, feature))))
    }

    /// Feature mask shared by the members of a non-empty trait-value set
    pub fn feature(&self) -> Option<TraitData> {
        self.values
            .first()
            .and_then(Value::as_trait_value)
            .map(|t| t.feature)
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Iterate over members in ascending order
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// False once parsing or decoding hit a structural problem
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Parse a value-set document.
    ///
    /// The first present key of `boolean`, `number`, `healthState` and
    /// `trait` decides the type. Never fails: problems are logged and the
    /// returned set is marked invalid.
    pub fn from_document(doc: &Document, catalog: &Catalog) -> Self {
        if let Some(items) = doc.get("boolean") {
            return Self::collect(ValueType::Boolean, items, |item| {
                item.as_bool().map(Value::Boolean)
            });
        }

        if let Some(items) = doc.get("number") {
            return Self::collect(ValueType::Number, items, |item| {
                item.as_f64().map(Value::from)
            });
        }

        if let Some(items) = doc.get("healthState") {
            return Self::collect(ValueType::HealthState, items, |item| {
                item.as_str()
                    .and_then(|name| catalog.health_states.get(name))
                    .map(Value::HealthState)
            });
        }

        if let Some(trait_id) = get_str(doc, "trait") {
            let Some(feature) = get_str(doc, "feature")
                .and_then(|feature| catalog.traits.get(trait_id)?.feature(feature))
            else {
                error!(doc = %describe(doc), "ValueSet: invalid trait or feature");
                return Self::invalid(ValueType::TraitValue);
            };

            let items = doc.get("enum").unwrap_or(&Document::Null);
            return Self::collect(ValueType::TraitValue, items, |item| {
                item.as_str()
                    .and_then(|name| feature.value(name))
                    .map(Value::TraitValue)
            });
        }

        error!(doc = %describe(doc), "ValueSet: no recognized value key");
        Self::invalid(ValueType::Number)
    }

    fn collect<F>(value_type: ValueType, items: &Document, resolve: F) -> Self
    where
        F: Fn(&Document) -> Option<Value>,
    {
        let mut set = Self::new(value_type);

        let Some(items) = items.as_array() else {
            error!(doc = %describe(items), kind = %value_type, "ValueSet: expected an array");
            set.valid = false;
            return set;
        };

        for item in items {
            match resolve(item) {
                Some(value) if set.append(value) => {}
                _ => {
                    error!(item = %describe(item), kind = %value_type, "ValueSet: invalid element");
                    set.valid = false;
                    return set;
                }
            }
        }

        set
    }

    /// Write `[type tag][count][elements]`
    pub fn to_binary<W: Write>(&self, writer: &mut W) -> Result<()> {
        codec::write(writer, &self.value_type.tag())?;
        codec::write(writer, &(self.values.len() as u64))?;

        for value in &self.values {
            match value {
                Value::Boolean(b) => codec::write(writer, b)?,
                Value::Number(n) => codec::write(writer, n)?,
                Value::HealthState(s) => codec::write(writer, s)?,
                Value::TraitValue(t) => codec::write(writer, t)?,
            }
        }

        Ok(())
    }

    /// Read a set written by [`ValueSet::to_binary`].
    ///
    /// A truncated stream or an unknown tag yields an invalid set.
    pub fn from_binary<R: Read>(reader: &mut R) -> Self {
        let Some(value_type) = codec::read::<_, u32>(reader)
            .ok()
            .and_then(ValueType::from_tag)
        else {
            error!("ValueSet: invalid type tag in binary stream");
            return Self::invalid(ValueType::Number);
        };

        let mut set = Self::new(value_type);
        let count = match codec::read::<_, u64>(reader) {
            Ok(count) => count,
            Err(err) => {
                error!(%err, "ValueSet: failed to read element count");
                set.valid = false;
                return set;
            }
        };

        for _ in 0..count {
            let value = match value_type {
                ValueType::Boolean => codec::read(reader).map(Value::Boolean),
                ValueType::Number => codec::read(reader).map(Value::Number),
                ValueType::HealthState => codec::read(reader).map(Value::HealthState),
                ValueType::TraitValue => codec::read(reader).map(Value::TraitValue),
            };

            match value {
                Ok(value) if set.append(value) => {}
                Ok(value) => {
                    error!(%value, "ValueSet: element does not fit the set");
                    set.valid = false;
                    return set;
                }
                Err(err) => {
                    error!(%err, "ValueSet: failed to read element");
                    set.valid = false;
                    return set;
                }
            }
        }

        set
    }
}

impl<'a> IntoIterator for &'a ValueSet {
    type Item = &'a Value;
    type IntoIter = std::collections::btree_set::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
