use std::cmp::Ordering;
use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use datasmith_core::{Property, PropertyVariant, Value, Weight, WeightedRange};

use crate::errors::GenerationError;
use crate::events::GenerationObserver;
use crate::providers::Provider;

/// Build the pre-generated value pool for a weighted or ranged property.
///
/// The pool always has exactly `row_count` entries: weight buckets first
/// (largest fraction processed first so rounding never starves a later
/// bucket), then `None` padding for rows that will ask the provider live,
/// shuffled with the engine rng so buckets are not clustered by row index.
pub(crate) fn build_pool(
    property: &Property,
    provider: &mut dyn Provider,
    row_count: usize,
    exclusions: &mut HashMap<String, Vec<Value>>,
    observer: &mut dyn GenerationObserver,
    rng: &mut ChaCha8Rng,
) -> Result<Vec<Option<Value>>, GenerationError> {
    let mut pool: Vec<Option<Value>> = Vec::with_capacity(row_count);

    match &property.variant {
        PropertyVariant::Plain => {}
        PropertyVariant::Weighted(weights) => {
            fill_weighted(property, provider, weights, row_count, &mut pool, exclusions, observer)?;
        }
        PropertyVariant::Ranged(ranges) => {
            fill_ranged(property, provider, ranges, row_count, &mut pool, exclusions, observer)?;
        }
    }

    pool.resize(row_count, None);
    pool.shuffle(rng);
    Ok(pool)
}

fn fill_weighted(
    property: &Property,
    provider: &mut dyn Provider,
    weights: &[Weight],
    row_count: usize,
    pool: &mut Vec<Option<Value>>,
    exclusions: &mut HashMap<String, Vec<Value>>,
    observer: &mut dyn GenerationObserver,
) -> Result<(), GenerationError> {
    for weight in sorted_by_fraction(weights, |weight| weight.fraction) {
        let count = bucket_count(row_count, weight.fraction, pool.len());
        if count == 0 {
            continue;
        }

        let id = provider
            .value_id(&weight.value)
            .map_err(|_| unresolved(property, provider, weight.value.key()))?;
        let canonical = provider
            .value_by_id(&id)
            .map_err(|_| unresolved(property, provider, id))?;

        // Reserved values are excluded from live top-up draws.
        let reserved = exclusions.entry(property.id.clone()).or_default();
        if !reserved.contains(&canonical) {
            reserved.push(canonical.clone());
        }

        for _ in 0..count {
            observer.value_generated(&property.id, &canonical);
            pool.push(Some(canonical.clone()));
        }
    }
    Ok(())
}

fn fill_ranged(
    property: &Property,
    provider: &mut dyn Provider,
    ranges: &[WeightedRange],
    row_count: usize,
    pool: &mut Vec<Option<Value>>,
    exclusions: &mut HashMap<String, Vec<Value>>,
    observer: &mut dyn GenerationObserver,
) -> Result<(), GenerationError> {
    for range in sorted_by_fraction(ranges, |range| range.fraction) {
        let count = bucket_count(row_count, range.fraction, pool.len());
        for _ in 0..count {
            let value = {
                let excluded: &[Value] = if property.unique {
                    exclusions
                        .get(&property.id)
                        .map(Vec::as_slice)
                        .unwrap_or(&[])
                } else {
                    &[]
                };
                provider.ranged_value(&range.min, &range.max, excluded)?
            };
            if property.unique {
                exclusions
                    .entry(property.id.clone())
                    .or_default()
                    .push(value.clone());
            }
            observer.value_generated(&property.id, &value);
            pool.push(Some(value));
        }
    }
    Ok(())
}

/// Build the error raised when a weighted value cannot be resolved by its
/// provider.
fn unresolved(property: &Property, provider: &dyn Provider, id: String) -> GenerationError {
    GenerationError::UnresolvedWeightedValue {
        property: property.id.clone(),
        provider: provider.id().to_string(),
        id,
    }
}

/// Stable descending sort; ties keep declaration order.
fn sorted_by_fraction<T: Clone>(entries: &[T], fraction: impl Fn(&T) -> f64) -> Vec<T> {
    let mut sorted = entries.to_vec();
    sorted.sort_by(|a, b| {
        fraction(b)
            .partial_cmp(&fraction(a))
            .unwrap_or(Ordering::Equal)
    });
    sorted
}

/// `ceil(row_count * fraction)`, decremented until the pool cannot overflow
/// `row_count`.
fn bucket_count(row_count: usize, fraction: f64, assigned: usize) -> usize {
    let mut count = (row_count as f64 * fraction).ceil() as usize;
    while assigned + count > row_count {
        count -= 1;
    }
    count
}
