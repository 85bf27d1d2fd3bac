use serde_json::json;

use datasmith_plan::{validate_plan, validate_plan_document, Plan};

fn sample_plan_json() -> serde_json::Value {
    json!({
        "seed": 42,
        "rows": 100,
        "properties": [
            {
                "id": "country",
                "value_type": "text",
                "provider": "location.country"
            },
            {
                "id": "city",
                "value_type": "text",
                "provider": { "id": "location.city" },
                "arguments": { "country": ["country"] }
            },
            {
                "id": "status",
                "value_type": "text",
                "provider": "primitive.text",
                "weights": [
                    { "fraction": 0.5, "value": "active" },
                    { "fraction": 0.25, "value": "inactive" }
                ]
            }
        ]
    })
}

#[test]
fn sample_plan_parses_and_validates() {
    let validated = validate_plan_document(&sample_plan_json()).expect("valid plan");
    assert_eq!(validated.plan.rows, 100);
    assert_eq!(validated.plan.properties.len(), 3);
    assert_eq!(validated.plan.properties[1].provider.id(), "location.city");
}

#[test]
fn forward_argument_references_are_legal() {
    let plan_json = json!({
        "rows": 10,
        "properties": [
            {
                "id": "city",
                "value_type": "text",
                "provider": "location.city",
                "arguments": { "country": ["country"] }
            },
            {
                "id": "country",
                "value_type": "text",
                "provider": "location.country"
            }
        ]
    });
    assert!(validate_plan_document(&plan_json).is_ok());
}

#[test]
fn undeclared_argument_reference_is_reported() {
    let plan_json = json!({
        "rows": 10,
        "properties": [
            {
                "id": "city",
                "value_type": "text",
                "provider": "location.city",
                "arguments": { "country": ["nowhere"] }
            }
        ]
    });
    let report = validate_plan_document(&plan_json).unwrap_err();
    assert!(report
        .errors
        .iter()
        .any(|issue| issue.code == "unknown_argument_reference"));
}

#[test]
fn duplicate_ids_and_bad_fractions_are_reported() {
    let plan: Plan = serde_json::from_value(json!({
        "rows": 10,
        "properties": [
            {
                "id": "status",
                "value_type": "text",
                "provider": "primitive.text",
                "weights": [
                    { "fraction": 0.8, "value": "a" },
                    { "fraction": 0.4, "value": "b" }
                ]
            },
            {
                "id": "status",
                "value_type": "text",
                "provider": "primitive.text"
            }
        ]
    }))
    .expect("parse plan");

    let report = validate_plan(&plan);
    let codes: Vec<&str> = report
        .errors
        .iter()
        .map(|issue| issue.code.as_str())
        .collect();
    assert!(codes.contains(&"duplicate_property_id"));
    assert!(codes.contains(&"fraction_sum_above_one"));
}

#[test]
fn weighted_unique_conflict_is_reported() {
    let plan: Plan = serde_json::from_value(json!({
        "rows": 10,
        "properties": [
            {
                "id": "status",
                "value_type": "text",
                "provider": "primitive.text",
                "unique": true,
                "weights": [{ "fraction": 0.5, "value": "a" }]
            }
        ]
    }))
    .expect("parse plan");

    let report = validate_plan(&plan);
    assert!(report
        .errors
        .iter()
        .any(|issue| issue.code == "weighted_unique_conflict"));
}

#[test]
fn weight_value_must_match_declared_type() {
    let plan: Plan = serde_json::from_value(json!({
        "rows": 10,
        "properties": [
            {
                "id": "age",
                "value_type": "int",
                "provider": "primitive.int",
                "weights": [{ "fraction": 0.5, "value": "not-a-number" }]
            }
        ]
    }))
    .expect("parse plan");

    let report = validate_plan(&plan);
    assert!(report
        .errors
        .iter()
        .any(|issue| issue.code == "invalid_weight_value"));
}

#[test]
fn conflicting_variants_are_reported() {
    let plan: Plan = serde_json::from_value(json!({
        "rows": 10,
        "properties": [
            {
                "id": "age",
                "value_type": "int",
                "provider": "primitive.int",
                "weights": [{ "fraction": 0.5, "value": 1 }],
                "ranges": [{ "fraction": 0.5, "min": 0, "max": 10 }]
            }
        ]
    }))
    .expect("parse plan");

    let report = validate_plan(&plan);
    assert!(report
        .errors
        .iter()
        .any(|issue| issue.code == "conflicting_variants"));
}

#[test]
fn structural_validation_rejects_missing_rows() {
    let plan_json = json!({
        "properties": []
    });
    let report = validate_plan_document(&plan_json).unwrap_err();
    assert!(!report.is_ok());
}
