//! Simulation variables
//!
//! Variables are named numbers that interventions read in conditions and
//! write through operations. The store keeps declaration order so that the
//! binary encoding, which carries initial values only, lines up across
//! processes.

use crate::codec;
use crate::document::{describe, get_str, Document};
use crate::error::Result;
use crate::operator::Operator;
use crate::time::Tick;
use std::collections::HashMap;
use std::io::{Read, Write};
use tracing::{error, warn};

/// Whether a variable is shared across processes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VariableScope {
    /// Exchanged with other processes between ticks
    Global,
    /// Private to this process
    #[default]
    Local,
}

/// A named, mutable number
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    id: String,
    scope: VariableScope,
    initial_value: f64,
    value: f64,
    /// Reset interval in ticks, 0 for never
    reset: Tick,
}

impl Variable {
    /// Create a variable holding `initial_value`
    pub fn new(id: impl Into<String>, initial_value: f64, scope: VariableScope) -> Self {
        Self {
            id: id.into(),
            scope,
            initial_value,
            value: initial_value,
            reset: 0,
        }
    }

    /// Restore the initial value every `reset` ticks
    pub fn with_reset(mut self, reset: Tick) -> Self {
        self.reset = reset;
        self
    }

    /// Parse `{"id", "initialValue", "scope", "reset"?}`
    pub fn from_document(doc: &Document) -> Option<Self> {
        let id = match get_str(doc, "id") {
            Some(id) if !id.is_empty() => id,
            _ => {
                error!(doc = %describe(doc), "Variable: invalid or missing 'id'");
                return None;
            }
        };

        let Some(initial_value) = doc.get("initialValue").and_then(Document::as_f64) else {
            error!(id, "Variable: invalid or missing 'initialValue'");
            return None;
        };

        let scope = match get_str(doc, "scope") {
            Some("global") => VariableScope::Global,
            Some("local") => VariableScope::Local,
            _ => {
                error!(id, "Variable: invalid or missing 'scope'");
                return None;
            }
        };

        let reset = match doc.get("reset") {
            None => 0,
            Some(reset) => match reset.as_u64() {
                Some(reset) => reset,
                None => {
                    error!(id, "Variable: 'reset' must be a tick count");
                    return None;
                }
            },
        };

        Some(Self::new(id, initial_value, scope).with_reset(reset))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn scope(&self) -> VariableScope {
        self.scope
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn initial_value(&self) -> f64 {
        self.initial_value
    }

    /// Combine the current value with `value`.
    ///
    /// Returns false and keeps the current value if the result is not finite.
    pub fn set_value(&mut self, value: f64, operator: Operator) -> bool {
        match operator.apply(self.value, value) {
            Some(result) => {
                self.value = result;
                true
            }
            None => false,
        }
    }

    /// Restore the initial value when forced or when `tick` is a reset tick
    pub fn reset(&mut self, tick: Tick, force: bool) -> bool {
        if force || (self.reset != 0 && tick % self.reset == 0) {
            self.value = self.initial_value;
            return true;
        }
        false
    }
}

/// Ordered, id-indexed bank of variables
#[derive(Debug, Clone)]
pub struct VariableStore {
    variables: Vec<Variable>,
    index: HashMap<String, usize>,
    duplicates: Vec<String>,
    valid: bool,
}

impl VariableStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            variables: Vec::new(),
            index: HashMap::new(),
            duplicates: Vec::new(),
            valid: true,
        }
    }

    /// Parse an array of variable documents.
    ///
    /// Non-array input leaves the store empty and invalid. Malformed entries
    /// are skipped and mark the store invalid.
    pub fn from_document(doc: &Document) -> Self {
        let mut store = Self::new();

        let Some(items) = doc.as_array() else {
            error!(doc = %describe(doc), "Variables: expected an array");
            store.valid = false;
            return store;
        };

        for item in items {
            match Variable::from_document(item) {
                Some(variable) => {
                    store.push(variable);
                }
                None => store.valid = false,
            }
        }

        store
    }

    /// Append a variable and index it by id.
    ///
    /// A repeated id is kept in the sequence but the id now resolves to the
    /// new entry. The conflict is logged and listed in
    /// [`VariableStore::duplicate_ids`].
    pub fn push(&mut self, variable: Variable) -> usize {
        let index = self.variables.len();
        if let Some(previous) = self.index.insert(variable.id.clone(), index) {
            warn!(
                id = %variable.id,
                previous,
                index,
                "Variables: duplicate id, last definition wins"
            );
            self.duplicates.push(variable.id.clone());
        }
        self.variables.push(variable);
        index
    }

    pub fn get(&self, index: usize) -> Option<&Variable> {
        self.variables.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Variable> {
        self.variables.get_mut(index)
    }

    /// Position of the variable an id resolves to
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn get_by_id(&self, id: &str) -> Option<&Variable> {
        self.index_of(id).and_then(|index| self.get(index))
    }

    pub fn get_by_id_mut(&mut self, id: &str) -> Option<&mut Variable> {
        self.index_of(id).and_then(|index| self.get_mut(index))
    }

    /// Ids declared more than once, in the order the repeats were seen
    pub fn duplicate_ids(&self) -> &[String] {
        &self.duplicates
    }

    /// Reset every variable due at `tick`
    pub fn reset_all(&mut self, tick: Tick, force: bool) {
        for variable in &mut self.variables {
            variable.reset(tick, force);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.variables.iter()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Write `[count][initial value × count]`
    pub fn to_binary<W: Write>(&self, writer: &mut W) -> Result<()> {
        codec::write(writer, &(self.variables.len() as u64))?;
        for variable in &self.variables {
            codec::write(writer, &variable.initial_value)?;
        }
        Ok(())
    }

    /// Overwrite initial values from a stream written by
    /// [`VariableStore::to_binary`].
    ///
    /// Current values are untouched until the next reset. The stream must
    /// hold exactly as many values as the store. On a mismatch or a short
    /// read the store is marked invalid and reading stops; values read so
    /// far have already been applied.
    pub fn read_binary<R: Read>(&mut self, reader: &mut R) {
        if !self.valid {
            return;
        }

        let count = match codec::read::<_, u64>(reader) {
            Ok(count) => count,
            Err(err) => {
                error!(%err, "Variables: failed to read count");
                self.valid = false;
                return;
            }
        };

        if count != self.variables.len() as u64 {
            error!(count, expected = self.variables.len(), "Variables: cardinality mismatch");
            self.valid = false;
            return;
        }

        for variable in &mut self.variables {
            match codec::read::<_, f64>(reader) {
                Ok(value) => variable.initial_value = value,
                Err(err) => {
                    error!(id = %variable.id, %err, "Variables: failed to read initial value");
                    self.valid = false;
                    return;
                }
            }
        }
    }
}

impl Default for VariableStore {
    fn default() -> Self {
        Self::new()
    }
}
