use std::collections::HashMap;
use std::time::Instant;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use datasmith_core::{
    resolve_order, Error as CoreError, Property, PropertyVariant, Value, ValueKind,
};
use datasmith_plan::{validate_plan, Plan};

use crate::context::GenerationContext;
use crate::errors::GenerationError;
use crate::events::{GenerationObserver, NoopObserver};
use crate::model::Dataset;
use crate::pool::build_pool;
use crate::providers::{Provider, ProviderRegistry};

/// Orchestrates a generation run over registered properties.
///
/// Registration order is retained: it is the resolver's tie-break among
/// independent properties and the column order of the output dataset.
pub struct GenerationEngine {
    entries: Vec<RegisteredProperty>,
    index: HashMap<String, usize>,
    seed: Option<u64>,
}

struct RegisteredProperty {
    property: Property,
    provider: Box<dyn Provider>,
}

impl GenerationEngine {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
            seed: None,
        }
    }

    /// Engine whose entire run, including pool shuffles and provider draws,
    /// is reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::new()
        }
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn properties(&self) -> impl Iterator<Item = &Property> {
        self.entries.iter().map(|entry| &entry.property)
    }

    /// Register a property with its provider.
    pub fn add_property(
        &mut self,
        property: Property,
        provider: Box<dyn Provider>,
    ) -> Result<&mut Self, GenerationError> {
        if self.index.contains_key(&property.id) {
            return Err(CoreError::DuplicateProperty(property.id).into());
        }
        self.index.insert(property.id.clone(), self.entries.len());
        self.entries.push(RegisteredProperty { property, provider });
        Ok(self)
    }

    /// Build an engine from a declarative plan.
    ///
    /// Properties and providers are constructed in declaration order;
    /// argument references were already resolved against the full id set by
    /// plan validation, so forward references work.
    pub fn from_plan(plan: &Plan, registry: &ProviderRegistry) -> Result<Self, GenerationError> {
        let report = validate_plan(plan);
        if !report.is_ok() {
            let reasons: Vec<String> = report
                .errors
                .iter()
                .map(|issue| issue.message.clone())
                .collect();
            return Err(GenerationError::InvalidPlan(reasons.join("; ")));
        }

        let mut engine = match plan.seed {
            Some(seed) => Self::with_seed(seed),
            None => Self::new(),
        };

        for spec in &plan.properties {
            let kind = ValueKind::parse(&spec.value_type)
                .ok_or_else(|| GenerationError::UnknownValueType(spec.value_type.clone()))?;
            let provider = registry.create(spec.provider.id(), spec.provider.params())?;

            let mut property = Property::new(&spec.id, kind);
            if spec.unique {
                property = property.unique();
            }
            if spec.allow_null {
                property = property.allow_null();
            }
            for (name, ids) in &spec.arguments {
                property = property.with_argument(name, ids.iter().cloned());
            }
            if !spec.weights.is_empty() {
                let weights = spec
                    .weights
                    .iter()
                    .map(|weight| {
                        Value::from_json(kind, &weight.value)
                            .map(|value| datasmith_core::Weight {
                                fraction: weight.fraction,
                                value,
                            })
                            .ok_or_else(|| {
                                GenerationError::InvalidPlan(format!(
                                    "weight value {} of '{}' is not a '{kind}' literal",
                                    weight.value, spec.id
                                ))
                            })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                property = property.weighted(weights);
            }
            if !spec.ranges.is_empty() {
                let ranges = spec
                    .ranges
                    .iter()
                    .map(|range| {
                        match (
                            Value::from_json(kind, &range.min),
                            Value::from_json(kind, &range.max),
                        ) {
                            (Some(min), Some(max)) => Ok(datasmith_core::WeightedRange {
                                fraction: range.fraction,
                                min,
                                max,
                            }),
                            _ => Err(GenerationError::InvalidPlan(format!(
                                "range bounds of '{}' are not '{kind}' literals",
                                spec.id
                            ))),
                        }
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                property = property.ranged(ranges);
            }

            engine.add_property(property, provider)?;
        }

        Ok(engine)
    }

    /// Generate `row_count` rows without lifecycle notifications.
    pub fn generate(&mut self, row_count: usize) -> Result<Dataset, GenerationError> {
        self.generate_with(row_count, &mut NoopObserver)
    }

    /// Generate `row_count` rows, notifying `observer` synchronously at
    /// each lifecycle point.
    pub fn generate_with(
        &mut self,
        row_count: usize,
        observer: &mut dyn GenerationObserver,
    ) -> Result<Dataset, GenerationError> {
        if row_count == 0 {
            return Err(GenerationError::InvalidPlan(
                "row count must be positive".to_string(),
            ));
        }

        let start = Instant::now();

        // Phase 1: validate every property before any generation work.
        for entry in &self.entries {
            entry.property.validate()?;
        }

        // Phase 2: resolve the generation order.
        let properties: Vec<Property> = self
            .entries
            .iter()
            .map(|entry| entry.property.clone())
            .collect();
        let order = resolve_order(&properties)?;
        let order_indices: Vec<usize> = order
            .iter()
            .map(|id| {
                self.index.get(id).copied().ok_or_else(|| {
                    GenerationError::InvalidPlan(format!(
                        "resolved order names unregistered property '{id}'"
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let kinds: HashMap<String, ValueKind> = self
            .entries
            .iter()
            .map(|entry| (entry.property.id.clone(), entry.property.kind))
            .collect();

        info!(
            rows = row_count,
            properties = self.entries.len(),
            seed = ?self.seed,
            "generation started"
        );

        // Phase 3: seed and load providers in dependency order.
        for &index in &order_indices {
            let entry = &mut self.entries[index];
            let provider_seed = self.seed.map(|seed| hash_seed(seed, &entry.property.id));
            entry.provider.initialize_randomizer(provider_seed);
            observer.property_loading(&entry.property.id);
            entry.provider.load(&entry.property, row_count)?;
            observer.property_loaded(&entry.property.id);

            let supported = entry.provider.supported_arguments();
            if !supported.is_empty() {
                for name in entry.property.arguments.keys() {
                    if !supported
                        .iter()
                        .any(|(advertised, _)| *advertised == name.as_str())
                    {
                        warn!(
                            property = %entry.property.id,
                            argument = %name,
                            provider = entry.provider.id(),
                            "argument not advertised by provider"
                        );
                    }
                }
            }
            debug!(
                property = %entry.property.id,
                provider = entry.provider.id(),
                "property loaded"
            );
        }

        let mut rng = match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_os_rng(),
        };

        // Phase 4: pre-generate weighted/ranged pools.
        let mut exclusions: HashMap<String, Vec<Value>> = HashMap::new();
        let mut pools: HashMap<String, Vec<Option<Value>>> = HashMap::new();
        for &index in &order_indices {
            let entry = &mut self.entries[index];
            if matches!(entry.property.variant, PropertyVariant::Plain) {
                continue;
            }
            let pool = build_pool(
                &entry.property,
                entry.provider.as_mut(),
                row_count,
                &mut exclusions,
                observer,
                &mut rng,
            )?;
            debug!(
                property = %entry.property.id,
                reserved = pool.iter().filter(|entry| entry.is_some()).count(),
                "pool pre-generated"
            );
            pools.insert(entry.property.id.clone(), pool);
        }

        // Phase 5: assemble rows in dependency order.
        let mut rows: Vec<HashMap<String, Value>> = Vec::with_capacity(row_count);
        for row_index in 0..row_count {
            let mut row: HashMap<String, Value> = HashMap::with_capacity(order_indices.len());
            for &index in &order_indices {
                let RegisteredProperty { property, provider } = &mut self.entries[index];

                let pooled = pools
                    .get(&property.id)
                    .and_then(|pool| pool.get(row_index))
                    .and_then(|entry| entry.clone());
                let from_pool = pooled.is_some();

                let value = match pooled {
                    Some(value) => value,
                    None => {
                        let ctx =
                            GenerationContext::new(row_index, row_count, property, &row, &kinds);
                        let excluded: &[Value] = match &property.variant {
                            PropertyVariant::Plain if !property.unique => &[],
                            _ => exclusions
                                .get(&property.id)
                                .map(Vec::as_slice)
                                .unwrap_or(&[]),
                        };
                        match &property.variant {
                            PropertyVariant::Ranged(ranges) => {
                                provider.row_value_outside(&ctx, ranges, excluded)?
                            }
                            _ => provider.row_value(&ctx, excluded)?,
                        }
                    }
                };

                if value.is_null() && !property.allow_null {
                    return Err(GenerationError::NullViolation {
                        property: property.id.clone(),
                        provider: provider.id().to_string(),
                    });
                }

                if !from_pool {
                    if property.unique && !value.is_null() {
                        let seen = exclusions.entry(property.id.clone()).or_default();
                        if seen.contains(&value) {
                            return Err(GenerationError::DuplicateUniqueValue {
                                property: property.id.clone(),
                                provider: provider.id().to_string(),
                            });
                        }
                        seen.push(value.clone());
                    } else if !value.is_null()
                        && let Some(seen) = exclusions.get_mut(&property.id)
                    {
                        // Tracking mode: live top-ups of weighted/ranged
                        // properties must not collide with reserved values.
                        seen.push(value.clone());
                    }
                    observer.value_generated(&property.id, &value);
                }

                row.insert(property.id.clone(), value);
            }
            observer.row_generated(row_index);
            rows.push(row);
        }

        info!(
            rows = rows.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "generation completed"
        );

        Ok(Dataset {
            columns: self
                .entries
                .iter()
                .map(|entry| entry.property.id.clone())
                .collect(),
            rows,
        })
    }
}

impl Default for GenerationEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Derive a per-property provider seed from the engine seed.
fn hash_seed(seed: u64, key: &str) -> u64 {
    let mut hash = seed ^ 0xcbf29ce484222325;
    for byte in key.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}
