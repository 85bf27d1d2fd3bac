use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use serde_json::json;

use datasmith_core::{Error as CoreError, Property, Value, ValueKind, Weight, WeightedRange};
use datasmith_generate::providers::primitives::{BoolProvider, IntProvider};
use datasmith_generate::{
    GenerationContext, GenerationEngine, GenerationError, Provider, ProviderRegistry, RunSummary,
};
use datasmith_plan::Plan;

fn plan_from_json(raw: serde_json::Value) -> Plan {
    serde_json::from_value(raw).expect("parse plan")
}

fn engine_from(raw: serde_json::Value) -> GenerationEngine {
    let registry = ProviderRegistry::new();
    GenerationEngine::from_plan(&plan_from_json(raw), &registry).expect("build engine")
}

#[test]
fn plain_bool_generates_every_row_non_null() {
    let mut engine = GenerationEngine::with_seed(7);
    engine
        .add_property(Property::new("flag", ValueKind::Bool), Box::new(BoolProvider::new()))
        .unwrap();

    let dataset = engine.generate(1_000_000).unwrap();
    assert_eq!(dataset.len(), 1_000_000);
    assert!(dataset
        .rows
        .iter()
        .all(|row| row["flag"].as_bool().is_some()));
}

#[test]
fn weighted_values_hit_their_bucket_counts_and_are_not_clustered() {
    let mut engine = engine_from(json!({
        "seed": 11,
        "rows": 1000,
        "properties": [
            {
                "id": "status",
                "value_type": "text",
                "provider": "primitive.text",
                "weights": [
                    { "fraction": 0.5, "value": "A" },
                    { "fraction": 0.25, "value": "B" }
                ]
            }
        ]
    }));

    let mut summary = RunSummary::default();
    let dataset = engine.generate_with(1000, &mut summary).unwrap();

    let count = |needle: &str| {
        dataset
            .rows
            .iter()
            .filter(|row| row["status"].as_str() == Some(needle))
            .count()
    };
    assert_eq!(count("A"), 500);
    assert_eq!(count("B"), 250);

    // Remaining rows came from live draws, which exclude reserved values.
    let other = dataset
        .rows
        .iter()
        .filter(|row| !matches!(row["status"].as_str(), Some("A") | Some("B")))
        .count();
    assert_eq!(other, 250);

    // Shuffled pools must not leave a bucket clustered at the front.
    let first_half_a = dataset.rows[..500]
        .iter()
        .filter(|row| row["status"].as_str() == Some("A"))
        .count();
    assert!(first_half_a < 500);

    // Every value observed exactly once.
    assert_eq!(summary.values_generated.get("status"), Some(&1000));
    assert_eq!(summary.rows_generated, 1000);
}

#[test]
fn city_rows_belong_to_their_country() {
    let mut engine = engine_from(json!({
        "seed": 23,
        "rows": 200,
        "properties": [
            { "id": "country", "value_type": "text", "provider": "location.country" },
            {
                "id": "city",
                "value_type": "text",
                "provider": "location.city",
                "arguments": { "country": ["country"] }
            }
        ]
    }));

    let dataset = engine.generate(200).unwrap();

    let assets = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/world.json");
    let world: Vec<serde_json::Value> =
        serde_json::from_str(&std::fs::read_to_string(assets).unwrap()).unwrap();
    let cities_by_country: HashMap<String, HashSet<String>> = world
        .iter()
        .map(|country| {
            (
                country["name"].as_str().unwrap().to_string(),
                country["cities"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|city| city.as_str().unwrap().to_string())
                    .collect(),
            )
        })
        .collect();

    for row in &dataset.rows {
        let country = row["country"].as_str().unwrap();
        let city = row["city"].as_str().unwrap();
        assert!(
            cities_by_country[country].contains(city),
            "{city} is not a city of {country}"
        );
    }
}

#[test]
fn unique_property_with_exhausted_value_space_fails() {
    let mut engine = GenerationEngine::with_seed(3);
    engine
        .add_property(
            Property::new("flag", ValueKind::Bool).unique(),
            Box::new(BoolProvider::new()),
        )
        .unwrap();

    let error = engine.generate(3).unwrap_err();
    assert!(matches!(
        error,
        GenerationError::UniqueValueExhausted { .. }
    ));
}

#[test]
fn ranged_buckets_reserve_inside_and_live_draws_stay_outside() {
    let mut engine = engine_from(json!({
        "seed": 29,
        "rows": 1000,
        "properties": [
            {
                "id": "amount",
                "value_type": "int",
                "provider": { "id": "primitive.int", "params": { "min": 0, "max": 1000 } },
                "ranges": [ { "fraction": 0.25, "min": 100, "max": 200 } ]
            }
        ]
    }));

    let dataset = engine.generate(1000).unwrap();

    let inside = dataset
        .rows
        .iter()
        .filter(|row| {
            row["amount"]
                .in_range(&Value::Int(100), &Value::Int(200))
        })
        .count();
    assert_eq!(inside, 250, "only the reserved bucket lands in the range");
    assert_eq!(dataset.len(), 1000);
    assert!(dataset
        .rows
        .iter()
        .all(|row| row["amount"].as_i64().is_some()));
}

#[test]
fn cyclic_argument_declarations_fail_before_generation() {
    let mut engine = engine_from(json!({
        "rows": 10,
        "properties": [
            {
                "id": "a",
                "value_type": "text",
                "provider": "primitive.text",
                "arguments": { "other": ["b"] }
            },
            {
                "id": "b",
                "value_type": "text",
                "provider": "primitive.text",
                "arguments": { "other": ["a"] }
            }
        ]
    }));

    let mut summary = RunSummary::default();
    let error = engine.generate_with(10, &mut summary).unwrap_err();
    assert!(matches!(
        error,
        GenerationError::Config(CoreError::CyclicDependency(_))
    ));
    assert_eq!(summary.rows_generated, 0);
    assert!(summary.values_generated.is_empty());
}

#[test]
fn seeded_runs_are_reproducible() {
    let plan = json!({
        "seed": 99,
        "rows": 150,
        "properties": [
            { "id": "country", "value_type": "text", "provider": "location.country" },
            {
                "id": "city",
                "value_type": "text",
                "provider": "location.city",
                "arguments": { "country": ["country"] }
            },
            { "id": "name", "value_type": "text", "provider": "person.full_name" },
            {
                "id": "email",
                "value_type": "text",
                "provider": "person.email",
                "unique": true,
                "arguments": { "name": ["name"] }
            },
            {
                "id": "amount",
                "value_type": "int",
                "provider": { "id": "primitive.int", "params": { "min": 0, "max": 500 } },
                "ranges": [ { "fraction": 0.4, "min": 0, "max": 50 } ]
            },
            {
                "id": "segment",
                "value_type": "text",
                "provider": "primitive.text",
                "weights": [
                    { "fraction": 0.6, "value": "consumer" },
                    { "fraction": 0.3, "value": "enterprise" }
                ]
            }
        ]
    });

    let dataset_a = engine_from(plan.clone()).generate(150).unwrap();
    let dataset_b = engine_from(plan).generate(150).unwrap();
    assert_eq!(dataset_a, dataset_b);
}

#[test]
fn emails_derive_from_the_bound_name() {
    let mut engine = engine_from(json!({
        "seed": 5,
        "rows": 50,
        "properties": [
            { "id": "name", "value_type": "text", "provider": "person.full_name" },
            {
                "id": "email",
                "value_type": "text",
                "provider": "person.email",
                "arguments": { "name": ["name"] }
            }
        ]
    }));

    let dataset = engine.generate(50).unwrap();
    for row in &dataset.rows {
        let name = row["name"].as_str().unwrap();
        let email = row["email"].as_str().unwrap();
        let first = name
            .split_whitespace()
            .next()
            .unwrap()
            .to_ascii_lowercase();
        assert!(
            email.starts_with(&first),
            "email {email} does not derive from name {name}"
        );
    }
}

#[test]
fn unique_plain_property_never_repeats() {
    let mut engine = GenerationEngine::with_seed(13);
    engine
        .add_property(
            Property::new("code", ValueKind::Int).unique(),
            Box::new(IntProvider::new(0, 100_000)),
        )
        .unwrap();

    let dataset = engine.generate(500).unwrap();
    let mut seen = HashSet::new();
    for row in &dataset.rows {
        assert!(seen.insert(row["code"].as_i64().unwrap()));
    }
}

#[test]
fn unique_ranged_property_stays_unique_across_pool_and_live_draws() {
    let mut engine = GenerationEngine::with_seed(31);
    engine
        .add_property(
            Property::new("code", ValueKind::Int)
                .unique()
                .ranged(vec![WeightedRange {
                    fraction: 0.5,
                    min: Value::Int(0),
                    max: Value::Int(100),
                }]),
            Box::new(IntProvider::new(0, 10_000)),
        )
        .unwrap();

    let dataset = engine.generate(100).unwrap();
    let mut seen = HashSet::new();
    let mut inside = 0;
    for row in &dataset.rows {
        let code = row["code"].as_i64().unwrap();
        assert!(seen.insert(code));
        if (0..100).contains(&code) {
            inside += 1;
        }
    }
    assert_eq!(inside, 50);
}

#[test]
fn weighted_value_unknown_to_its_provider_fails_pregeneration() {
    let mut engine = GenerationEngine::with_seed(17);
    engine
        .add_property(
            Property::new("country", ValueKind::Text).weighted(vec![Weight {
                fraction: 0.5,
                value: Value::Text("Atlantis".to_string()),
            }]),
            ProviderRegistry::new()
                .create("location.country", None)
                .unwrap(),
        )
        .unwrap();

    let error = engine.generate(10).unwrap_err();
    assert!(matches!(
        error,
        GenerationError::UnresolvedWeightedValue { .. }
    ));
}

struct NosyProvider;

impl Provider for NosyProvider {
    fn id(&self) -> &'static str {
        "test.nosy"
    }

    fn kind(&self) -> ValueKind {
        ValueKind::Text
    }

    fn initialize_randomizer(&mut self, _seed: Option<u64>) {}

    fn row_value(
        &mut self,
        ctx: &GenerationContext<'_>,
        _excluded: &[Value],
    ) -> Result<Value, GenerationError> {
        // Reads a sibling it never declared as an argument.
        ctx.row_property("secret")
    }
}

#[test]
fn undeclared_sibling_reads_are_access_violations() {
    let mut engine = GenerationEngine::with_seed(1);
    engine
        .add_property(
            Property::new("secret", ValueKind::Text),
            ProviderRegistry::new().create("primitive.text", None).unwrap(),
        )
        .unwrap();
    engine
        .add_property(Property::new("snoop", ValueKind::Text), Box::new(NosyProvider))
        .unwrap();

    let error = engine.generate(5).unwrap_err();
    assert!(matches!(error, GenerationError::AccessViolation { .. }));
}

#[test]
fn weighted_and_unique_flags_conflict_at_generate_time() {
    let mut engine = GenerationEngine::with_seed(1);
    engine
        .add_property(
            Property::new("status", ValueKind::Text)
                .unique()
                .weighted(vec![Weight {
                    fraction: 0.5,
                    value: Value::Text("active".to_string()),
                }]),
            ProviderRegistry::new().create("primitive.text", None).unwrap(),
        )
        .unwrap();

    let error = engine.generate(10).unwrap_err();
    assert!(matches!(
        error,
        GenerationError::Config(CoreError::InvalidProperty { .. })
    ));
}
