//! Categorical trait taxonomy
//!
//! A trait (for example `nodeTrait`) packs several features into one 32-bit
//! word. Each feature owns a run of consecutive bits wide enough for all of
//! its enumerants; an enumerant is stored as its index shifted to the
//! feature's first bit. A [`TraitValue`] is the pair (feature mask,
//! enumerant bits) for one feature.

use crate::document::{describe, get_str, Document};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::error;

/// Raw packed trait word
pub type TraitData = u32;

/// Width of a trait word in bits
pub const TRAIT_BITS: u32 = TraitData::BITS;

/// Name of the implicit enumerant added to features without a default
pub const NOT_SET: &str = "notSet";

/// One (feature, enumerant) pair encoded as masks
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TraitValue {
    /// Bits occupied by the feature
    pub feature: TraitData,
    /// Enumerant bits, always a subset of `feature`
    pub value: TraitData,
}

impl TraitValue {
    /// Create a trait value from raw masks
    pub fn new(feature: TraitData, value: TraitData) -> Self {
        Self { feature, value }
    }

    /// Check whether `data` carries this value for the feature
    pub fn has_value(&self, data: TraitData) -> bool {
        data & self.feature == self.value
    }

    /// Overwrite the feature's bits in `data` with this value
    pub fn apply(&self, data: &mut TraitData) {
        *data &= !self.feature;
        *data |= self.value;
    }

    /// Extract the value of `feature` from `data`
    pub fn of(data: TraitData, feature: TraitData) -> Self {
        Self {
            feature,
            value: data & feature,
        }
    }
}

impl fmt::Display for TraitValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}/{:#010x}", self.feature, self.value)
    }
}

/// A named enumerant of a feature
#[derive(Debug, Clone)]
pub struct Enum {
    id: String,
    mask: TraitData,
}

impl Enum {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn mask(&self) -> TraitData {
        self.mask
    }
}

/// A feature of a trait with its enumerants
#[derive(Debug, Clone)]
pub struct Feature {
    id: String,
    mask: TraitData,
    enums: IndexMap<String, Enum>,
    default: String,
}

impl Feature {
    fn from_document(doc: &Document) -> Option<Self> {
        let id = match get_str(doc, "id") {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                error!(doc = %describe(doc), "Feature: invalid or missing 'id'");
                return None;
            }
        };

        let mut enums = IndexMap::new();
        for item in doc.get("enums").and_then(Document::as_array).into_iter().flatten() {
            match get_str(item, "id") {
                Some(enum_id) if !enum_id.is_empty() => {
                    enums.insert(
                        enum_id.to_string(),
                        Enum {
                            id: enum_id.to_string(),
                            mask: 0,
                        },
                    );
                }
                _ => {
                    error!(feature = %id, item = %describe(item), "Feature: invalid enum");
                    return None;
                }
            }
        }

        let default = match get_str(doc, "default") {
            Some(default) => default.to_string(),
            None => {
                enums.entry(NOT_SET.to_string()).or_insert(Enum {
                    id: NOT_SET.to_string(),
                    mask: 0,
                });
                NOT_SET.to_string()
            }
        };

        if !enums.contains_key(&default) {
            error!(feature = %id, default = %default, "Feature: invalid default");
            return None;
        }

        Some(Self {
            id,
            mask: 0,
            enums,
            default,
        })
    }

    /// Smallest bit count that can index every enumerant (at least one)
    fn bits_required(&self) -> u32 {
        let mut bits = 1;
        while (1usize << bits) < self.enums.len() {
            bits += 1;
        }
        bits
    }

    fn set_mask(&mut self, first_bit: u32, bits: u32) {
        let width = (1u64 << bits) - 1;
        self.mask = (width << first_bit) as TraitData;
        for (index, item) in self.enums.values_mut().enumerate() {
            item.mask = ((index as u64) << first_bit) as TraitData;
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Bits this feature occupies in the trait word
    pub fn mask(&self) -> TraitData {
        self.mask
    }

    /// Look up an enumerant by name
    pub fn get(&self, id: &str) -> Option<&Enum> {
        self.enums.get(id)
    }

    /// Resolve an enumerant name to a trait value
    pub fn value(&self, id: &str) -> Option<TraitValue> {
        self.get(id).map(|e| TraitValue::new(self.mask, e.mask))
    }

    /// The default enumerant's value
    pub fn default_value(&self) -> Option<TraitValue> {
        self.value(&self.default)
    }

    /// Number of enumerants, including an implicit `notSet`
    pub fn len(&self) -> usize {
        self.enums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.enums.is_empty()
    }
}

/// A trait: an ordered list of features sharing one trait word
#[derive(Debug, Clone)]
pub struct Trait {
    id: String,
    features: IndexMap<String, Feature>,
}

impl Trait {
    fn from_document(doc: &Document) -> Option<Self> {
        let id = match get_str(doc, "id") {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                error!(doc = %describe(doc), "Trait: invalid or missing 'id'");
                return None;
            }
        };

        let mut features = IndexMap::new();
        for item in doc.get("features").and_then(Document::as_array).into_iter().flatten() {
            let feature = Feature::from_document(item)?;
            features.insert(feature.id.clone(), feature);
        }

        let mut first_bit = 0;
        for feature in features.values_mut() {
            let bits = feature.bits_required();
            if first_bit + bits > TRAIT_BITS {
                error!(trait_id = %id, "Trait: features exceed {} bits", TRAIT_BITS);
                return None;
            }
            feature.set_mask(first_bit, bits);
            first_bit += bits;
        }

        Some(Self { id, features })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Look up a feature by name
    pub fn feature(&self, id: &str) -> Option<&Feature> {
        self.features.get(id)
    }

    /// Resolve a (feature, enumerant) name pair
    pub fn resolve(&self, feature: &str, enumerant: &str) -> Option<TraitValue> {
        self.feature(feature).and_then(|f| f.value(enumerant))
    }

    /// Trait word with every feature at its default
    pub fn default_data(&self) -> TraitData {
        self.features
            .values()
            .filter_map(Feature::default_value)
            .fold(0, |data, value| data | value.value)
    }

    /// Iterate over features in declaration order
    pub fn features(&self) -> impl Iterator<Item = &Feature> {
        self.features.values()
    }
}

/// All traits known to the simulation
#[derive(Debug, Clone)]
pub struct TraitRegistry {
    traits: IndexMap<String, Trait>,
    valid: bool,
}

impl TraitRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            traits: IndexMap::new(),
            valid: true,
        }
    }

    /// Parse `{"traits": [..]}`.
    ///
    /// Malformed traits are skipped and the registry is marked invalid.
    pub fn from_document(doc: &Document) -> Self {
        let mut registry = Self::new();

        let Some(items) = doc.get("traits").and_then(Document::as_array) else {
            error!(doc = %describe(doc), "Traits: missing 'traits' array");
            registry.valid = false;
            return registry;
        };

        for item in items {
            match Trait::from_document(item) {
                Some(t) => {
                    registry.traits.insert(t.id.clone(), t);
                }
                None => registry.valid = false,
            }
        }

        registry
    }

    /// Look up a trait by name
    pub fn get(&self, id: &str) -> Option<&Trait> {
        self.traits.get(id)
    }

    /// Resolve a (trait, feature, enumerant) name triple
    pub fn resolve(&self, trait_id: &str, feature: &str, enumerant: &str) -> Option<TraitValue> {
        self.get(trait_id).and_then(|t| t.resolve(feature, enumerant))
    }

    pub fn len(&self) -> usize {
        self.traits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traits.is_empty()
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

impl Default for TraitRegistry {
    fn default() -> Self {
        Self::new()
    }
}
