use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::value::{Value, ValueKind};

/// Tolerance for floating point drift when summing weight fractions.
const FRACTION_EPSILON: f64 = 1e-9;

/// A sub-population target: a fraction of rows pinned to one value.
#[derive(Debug, Clone, PartialEq)]
pub struct Weight {
    pub fraction: f64,
    pub value: Value,
}

/// A sub-population target over a half-open interval `[min, max)`.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedRange {
    pub fraction: f64,
    pub min: Value,
    pub max: Value,
}

/// Variant payload of a property.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PropertyVariant {
    #[default]
    Plain,
    Weighted(Vec<Weight>),
    Ranged(Vec<WeightedRange>),
}

/// A named generation unit bound to one provider.
///
/// `arguments` maps a local argument name to the ordered list of property
/// ids whose already-generated values the provider may read. Multiple ids
/// under one name are legal (list semantics).
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub id: String,
    pub kind: ValueKind,
    pub unique: bool,
    pub allow_null: bool,
    pub arguments: BTreeMap<String, Vec<String>>,
    pub variant: PropertyVariant,
}

impl Property {
    pub fn new(id: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            id: id.into(),
            kind,
            unique: false,
            allow_null: false,
            arguments: BTreeMap::new(),
            variant: PropertyVariant::Plain,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn allow_null(mut self) -> Self {
        self.allow_null = true;
        self
    }

    pub fn with_argument<I, S>(mut self, name: impl Into<String>, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arguments
            .entry(name.into())
            .or_default()
            .extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn weighted(mut self, weights: Vec<Weight>) -> Self {
        self.variant = PropertyVariant::Weighted(weights);
        self
    }

    pub fn ranged(mut self, ranges: Vec<WeightedRange>) -> Self {
        self.variant = PropertyVariant::Ranged(ranges);
        self
    }

    /// All property ids referenced by argument bindings, in binding order.
    pub fn argument_ids(&self) -> impl Iterator<Item = &str> {
        self.arguments
            .values()
            .flat_map(|ids| ids.iter().map(String::as_str))
    }

    /// True when `id` appears in any argument binding of this property.
    pub fn declares_dependency_on(&self, id: &str) -> bool {
        self.argument_ids().any(|bound| bound == id)
    }

    /// Check the structural invariants of this property.
    pub fn validate(&self) -> Result<()> {
        match &self.variant {
            PropertyVariant::Plain => Ok(()),
            PropertyVariant::Weighted(weights) => {
                if self.unique {
                    return self.invalid("a weighted property cannot be unique");
                }
                if weights.is_empty() {
                    return self.invalid("weighted property has no weights");
                }
                let mut total = 0.0;
                for weight in weights {
                    if weight.fraction < 0.0 {
                        return self.invalid("weight fraction is negative");
                    }
                    if weight.value.kind() != Some(self.kind) {
                        return self.invalid(&format!(
                            "weight value '{}' does not match declared kind '{}'",
                            weight.value.key(),
                            self.kind
                        ));
                    }
                    total += weight.fraction;
                }
                if total > 1.0 + FRACTION_EPSILON {
                    return self.invalid("weight fractions sum above 1.0");
                }
                Ok(())
            }
            PropertyVariant::Ranged(ranges) => {
                if ranges.is_empty() {
                    return self.invalid("ranged property has no ranges");
                }
                let mut total = 0.0;
                for range in ranges {
                    if range.fraction < 0.0 {
                        return self.invalid("range fraction is negative");
                    }
                    if range.min.kind() != Some(self.kind) || range.max.kind() != Some(self.kind) {
                        return self.invalid(&format!(
                            "range bounds do not match declared kind '{}'",
                            self.kind
                        ));
                    }
                    if range.min.cmp_same_kind(&range.max) != Some(std::cmp::Ordering::Less) {
                        return self.invalid("range min must be strictly below max");
                    }
                    total += range.fraction;
                }
                if total > 1.0 + FRACTION_EPSILON {
                    return self.invalid("range fractions sum above 1.0");
                }
                Ok(())
            }
        }
    }

    fn invalid(&self, reason: &str) -> Result<()> {
        Err(Error::InvalidProperty {
            id: self.id.clone(),
            reason: reason.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weight(fraction: f64, value: &str) -> Weight {
        Weight {
            fraction,
            value: Value::Text(value.to_string()),
        }
    }

    #[test]
    fn weighted_and_unique_conflict() {
        let property = Property::new("status", ValueKind::Text)
            .unique()
            .weighted(vec![weight(0.5, "active")]);
        assert!(matches!(
            property.validate(),
            Err(Error::InvalidProperty { .. })
        ));
    }

    #[test]
    fn weight_fractions_above_one_rejected() {
        let property = Property::new("status", ValueKind::Text)
            .weighted(vec![weight(0.7, "a"), weight(0.4, "b")]);
        assert!(property.validate().is_err());
    }

    #[test]
    fn negative_fraction_rejected() {
        let property = Property::new("status", ValueKind::Text).weighted(vec![weight(-0.1, "a")]);
        assert!(property.validate().is_err());
    }

    #[test]
    fn range_bounds_must_be_ordered_and_typed() {
        let backwards = Property::new("age", ValueKind::Int).ranged(vec![WeightedRange {
            fraction: 0.5,
            min: Value::Int(30),
            max: Value::Int(20),
        }]);
        assert!(backwards.validate().is_err());

        let mismatched = Property::new("age", ValueKind::Int).ranged(vec![WeightedRange {
            fraction: 0.5,
            min: Value::Text("a".into()),
            max: Value::Text("z".into()),
        }]);
        assert!(mismatched.validate().is_err());
    }

    #[test]
    fn full_fraction_budget_is_legal() {
        let property = Property::new("status", ValueKind::Text)
            .weighted(vec![weight(0.25, "a"), weight(0.25, "b"), weight(0.5, "c")]);
        assert!(property.validate().is_ok());
    }

    #[test]
    fn argument_bindings_accumulate() {
        let property = Property::new("city", ValueKind::Text)
            .with_argument("country", ["country"])
            .with_argument("region", ["state", "province"]);
        assert!(property.declares_dependency_on("country"));
        assert!(property.declares_dependency_on("province"));
        assert!(!property.declares_dependency_on("city"));
    }
}
