pub mod company;
pub mod location;
pub mod person;
pub mod primitives;

use std::collections::BTreeMap;

use serde_json::Value as JsonValue;

use datasmith_core::{Property, Value, ValueKind, WeightedRange};

use crate::context::GenerationContext;
use crate::errors::GenerationError;

/// Retry budget for draws that must avoid an exclusion set.
pub const MAX_UNIQUE_ATTEMPTS: usize = 1000;

/// A pluggable value source attached to one property.
///
/// Providers own their random sequence and any reference data loaded in
/// [`Provider::load`]; nothing is shared across instances, so independent
/// engines never interfere.
pub trait Provider {
    /// Registry id of this provider, e.g. `primitive.int`.
    fn id(&self) -> &'static str;

    /// Kind of every value this provider produces.
    fn kind(&self) -> ValueKind;

    /// Establish the provider's private random sequence.
    fn initialize_randomizer(&mut self, seed: Option<u64>);

    /// One-time setup before generation; load reference data sized to the
    /// run.
    fn load(&mut self, property: &Property, row_count: usize) -> Result<(), GenerationError> {
        let _ = (property, row_count);
        Ok(())
    }

    /// Argument names this provider understands and their expected kinds.
    fn supported_arguments(&self) -> &[(&'static str, ValueKind)] {
        &[]
    }

    /// Stable string identifier for a value this provider produced or was
    /// declared with.
    fn value_id(&self, value: &Value) -> Result<String, GenerationError> {
        Ok(value.key())
    }

    /// Inverse of [`Provider::value_id`].
    fn value_by_id(&self, id: &str) -> Result<Value, GenerationError> {
        Value::parse_key(self.kind(), id).ok_or_else(|| GenerationError::UnknownValueId {
            provider: self.id().to_string(),
            id: id.to_string(),
        })
    }

    /// Produce one fresh value for the current row, avoiding `excluded`.
    fn row_value(
        &mut self,
        ctx: &GenerationContext<'_>,
        excluded: &[Value],
    ) -> Result<Value, GenerationError>;

    /// Produce one value inside `[min, max)`, avoiding `excluded`.
    ///
    /// Providers whose kind has no meaningful range reject this outright.
    fn ranged_value(
        &mut self,
        min: &Value,
        max: &Value,
        excluded: &[Value],
    ) -> Result<Value, GenerationError> {
        let _ = (min, max, excluded);
        Err(GenerationError::RangesUnsupported {
            provider: self.id().to_string(),
        })
    }

    /// Produce one value outside every range in `excluded_ranges`, avoiding
    /// `excluded`.
    fn row_value_outside(
        &mut self,
        ctx: &GenerationContext<'_>,
        excluded_ranges: &[WeightedRange],
        excluded: &[Value],
    ) -> Result<Value, GenerationError> {
        let _ = (ctx, excluded_ranges, excluded);
        Err(GenerationError::RangesUnsupported {
            provider: self.id().to_string(),
        })
    }
}

/// Bounded retry loop for draws that must avoid an exclusion set.
pub(crate) fn draw_avoiding<F>(
    provider_id: &str,
    excluded: &[Value],
    mut draw: F,
) -> Result<Value, GenerationError>
where
    F: FnMut() -> Value,
{
    for _ in 0..MAX_UNIQUE_ATTEMPTS {
        let candidate = draw();
        if !excluded.contains(&candidate) {
            return Ok(candidate);
        }
    }
    Err(GenerationError::UniqueValueExhausted {
        provider: provider_id.to_string(),
    })
}

/// Bounded retry loop for draws that must stay outside every excluded
/// range and off the exclusion set.
pub(crate) fn draw_outside_ranges<F>(
    provider_id: &str,
    excluded_ranges: &[WeightedRange],
    excluded: &[Value],
    mut draw: F,
) -> Result<Value, GenerationError>
where
    F: FnMut() -> Value,
{
    for _ in 0..MAX_UNIQUE_ATTEMPTS {
        let candidate = draw();
        if excluded_ranges
            .iter()
            .any(|range| candidate.in_range(&range.min, &range.max))
        {
            continue;
        }
        if excluded.contains(&candidate) {
            continue;
        }
        return Ok(candidate);
    }
    Err(GenerationError::UniqueValueExhausted {
        provider: provider_id.to_string(),
    })
}

type ProviderFactory =
    Box<dyn Fn(Option<&JsonValue>) -> Result<Box<dyn Provider>, GenerationError>>;

/// Registry mapping provider ids to factories.
///
/// Construction from a plan is a typed dispatch over this closed set; a
/// plan referencing an unregistered id is a configuration error.
pub struct ProviderRegistry {
    factories: BTreeMap<&'static str, ProviderFactory>,
}

impl ProviderRegistry {
    /// Registry with every built-in provider registered.
    pub fn new() -> Self {
        let mut registry = Self {
            factories: BTreeMap::new(),
        };
        primitives::register(&mut registry);
        person::register(&mut registry);
        location::register(&mut registry);
        company::register(&mut registry);
        registry
    }

    /// Registry without built-ins, for callers wiring only custom providers.
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    pub fn register<F>(&mut self, id: &'static str, factory: F)
    where
        F: Fn(Option<&JsonValue>) -> Result<Box<dyn Provider>, GenerationError> + 'static,
    {
        self.factories.insert(id, Box::new(factory));
    }

    pub fn create(
        &self,
        id: &str,
        params: Option<&JsonValue>,
    ) -> Result<Box<dyn Provider>, GenerationError> {
        let factory = self
            .factories
            .get(id)
            .ok_or_else(|| GenerationError::UnknownProvider(id.to_string()))?;
        factory(params)
    }

    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Typed accessor over a provider's JSON params.
pub(crate) struct Params<'a> {
    provider: &'static str,
    map: Option<&'a serde_json::Map<String, JsonValue>>,
}

impl<'a> Params<'a> {
    /// Parse and key-check params; unknown keys are rejected up front.
    pub(crate) fn new(
        provider: &'static str,
        raw: Option<&'a JsonValue>,
        allowed: &[&str],
    ) -> Result<Self, GenerationError> {
        let map = match raw {
            None => None,
            Some(JsonValue::Object(map)) => Some(map),
            Some(_) => {
                return Err(GenerationError::InvalidParams {
                    provider: provider.to_string(),
                    reason: "params must be a JSON object".to_string(),
                });
            }
        };

        if let Some(map) = map {
            for key in map.keys() {
                if !allowed.contains(&key.as_str()) {
                    return Err(GenerationError::InvalidParams {
                        provider: provider.to_string(),
                        reason: format!("unknown param '{key}'"),
                    });
                }
            }
        }

        Ok(Self { provider, map })
    }

    pub(crate) fn i64(&self, key: &str, default: i64) -> Result<i64, GenerationError> {
        match self.get(key) {
            None => Ok(default),
            Some(value) => value.as_i64().ok_or_else(|| self.bad(key, "an integer")),
        }
    }

    pub(crate) fn f64(&self, key: &str, default: f64) -> Result<f64, GenerationError> {
        match self.get(key) {
            None => Ok(default),
            Some(value) => value.as_f64().ok_or_else(|| self.bad(key, "a number")),
        }
    }

    pub(crate) fn usize(&self, key: &str, default: usize) -> Result<usize, GenerationError> {
        let value = self.i64(key, default as i64)?;
        usize::try_from(value).map_err(|_| self.bad(key, "a non-negative integer"))
    }

    pub(crate) fn str(&self, key: &str, default: &str) -> Result<String, GenerationError> {
        match self.get(key) {
            None => Ok(default.to_string()),
            Some(value) => value
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| self.bad(key, "a string")),
        }
    }

    pub(crate) fn require_str(&self, key: &str) -> Result<String, GenerationError> {
        match self.get(key) {
            None => Err(GenerationError::InvalidParams {
                provider: self.provider.to_string(),
                reason: format!("missing required param '{key}'"),
            }),
            Some(value) => value
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| self.bad(key, "a string")),
        }
    }

    fn get(&self, key: &str) -> Option<&JsonValue> {
        self.map.and_then(|map| map.get(key))
    }

    fn bad(&self, key: &str, expected: &str) -> GenerationError {
        GenerationError::InvalidParams {
            provider: self.provider.to_string(),
            reason: format!("param '{key}' must be {expected}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn registry_creates_builtins_and_rejects_unknown_ids() {
        let registry = ProviderRegistry::new();
        let provider = registry.create("primitive.bool", None).expect("builtin");
        assert_eq!(provider.id(), "primitive.bool");
        assert!(matches!(
            registry.create("no.such.provider", None),
            Err(GenerationError::UnknownProvider(_))
        ));
    }

    #[test]
    fn params_reject_unknown_keys() {
        let raw = json!({"min": 1, "bogus": 2});
        let result = Params::new("primitive.int", Some(&raw), &["min", "max"]);
        assert!(matches!(
            result,
            Err(GenerationError::InvalidParams { .. })
        ));
    }

    #[test]
    fn params_check_value_shapes() {
        let raw = json!({"min": "not-a-number"});
        let params = Params::new("primitive.int", Some(&raw), &["min", "max"]).unwrap();
        assert!(params.i64("min", 0).is_err());
        assert_eq!(params.i64("max", 42).unwrap(), 42);
    }

    #[test]
    fn draw_avoiding_exhausts_after_retry_budget() {
        let excluded = vec![Value::Bool(true), Value::Bool(false)];
        let result = draw_avoiding("test", &excluded, || Value::Bool(true));
        assert!(matches!(
            result,
            Err(GenerationError::UniqueValueExhausted { .. })
        ));
    }
}
