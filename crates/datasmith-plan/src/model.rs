use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Declarative description of a generation run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Plan {
    /// Seed for the whole run; omit for entropy-based seeding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Default number of rows to generate.
    pub rows: u64,
    /// Property declarations, in registration order.
    pub properties: Vec<PropertySpec>,
}

/// One property declaration.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PropertySpec {
    /// Unique property id; column name in the output dataset.
    pub id: String,
    /// Declared value type (`bool`, `int`, `float`, `text`, `uuid`, `date`,
    /// `timestamp`).
    pub value_type: String,
    /// Provider attached to this property.
    pub provider: ProviderRef,
    /// No two rows may share this property's value.
    #[serde(default)]
    pub unique: bool,
    /// Whether a null value is acceptable for this property.
    #[serde(default)]
    pub allow_null: bool,
    /// Argument name to the ordered property ids bound under it.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub arguments: BTreeMap<String, Vec<String>>,
    /// Weighted value targets; mutually exclusive with `ranges`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub weights: Vec<WeightSpec>,
    /// Weighted interval targets; mutually exclusive with `weights`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ranges: Vec<RangeSpec>,
}

/// Provider reference; accepts a bare id or a full spec with params.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ProviderRef {
    Id(String),
    Spec(ProviderSpec),
}

/// Provider spec with optional params.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProviderSpec {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl ProviderRef {
    pub fn id(&self) -> &str {
        match self {
            ProviderRef::Id(value) => value.as_str(),
            ProviderRef::Spec(spec) => spec.id.as_str(),
        }
    }

    pub fn params(&self) -> Option<&serde_json::Value> {
        match self {
            ProviderRef::Id(_) => None,
            ProviderRef::Spec(spec) => spec.params.as_ref(),
        }
    }
}

/// A weighted value target.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WeightSpec {
    /// Fraction of rows reserved for this value, in `[0, 1]`.
    pub fraction: f64,
    /// The value, as a JSON literal of the property's value type.
    pub value: serde_json::Value,
}

/// A weighted interval target over `[min, max)`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RangeSpec {
    /// Fraction of rows reserved for this interval, in `[0, 1]`.
    pub fraction: f64,
    pub min: serde_json::Value,
    pub max: serde_json::Value,
}
