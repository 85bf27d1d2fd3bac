use std::collections::HashSet;

use jsonschema::JSONSchema;
use serde_json::Value as JsonValue;

use datasmith_core::{Value, ValueKind};

use crate::errors::{IssueSeverity, PlanError, ValidationIssue, ValidationReport};
use crate::model::{Plan, PropertySpec};
use crate::schema::plan_json_schema_value;

/// Tolerance for floating point drift when summing fractions.
const FRACTION_EPSILON: f64 = 1e-9;

/// Validated plan with accumulated warnings.
#[derive(Debug, Clone)]
pub struct ValidatedPlan {
    pub plan: Plan,
    pub warnings: Vec<ValidationIssue>,
}

/// Validate a plan JSON document against the plan JSON Schema.
pub fn validate_plan_json(
    plan_json: &JsonValue,
    plan_schema: &JsonValue,
) -> Result<ValidationReport, PlanError> {
    let compiled =
        JSONSchema::compile(plan_schema).map_err(|err| PlanError::Schema(err.to_string()))?;

    let mut report = ValidationReport::default();

    if let Err(errors) = compiled.validate(plan_json) {
        for error in errors {
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "schema_violation",
                error.instance_path.to_string(),
                error.to_string(),
                None,
            ));
        }
    }

    Ok(report)
}

/// Validate a parsed plan's semantic invariants.
///
/// Argument references are resolved in a second pass over the full id set,
/// so forward references between properties are legal.
pub fn validate_plan(plan: &Plan) -> ValidationReport {
    let mut report = ValidationReport::default();

    if plan.rows == 0 {
        report.push_error(ValidationIssue::new(
            IssueSeverity::Error,
            "no_rows",
            "/rows",
            "plan must request at least one row",
            None,
        ));
    }

    if plan.properties.is_empty() {
        report.push_error(ValidationIssue::new(
            IssueSeverity::Error,
            "no_properties",
            "/properties",
            "plan declares no properties",
            None,
        ));
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for (index, spec) in plan.properties.iter().enumerate() {
        if !seen.insert(spec.id.as_str()) {
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "duplicate_property_id",
                format!("/properties/{index}/id"),
                format!("property id '{}' declared more than once", spec.id),
                None,
            ));
        }
    }

    let declared: HashSet<&str> = plan
        .properties
        .iter()
        .map(|spec| spec.id.as_str())
        .collect();

    for (index, spec) in plan.properties.iter().enumerate() {
        validate_property(spec, index, &declared, &mut report);
    }

    report
}

/// Validate the plan end-to-end: structure first, then semantics.
pub fn validate_plan_document(
    plan_json: &JsonValue,
) -> Result<ValidatedPlan, Box<ValidationReport>> {
    let structural = plan_json_schema_value()
        .and_then(|schema| validate_plan_json(plan_json, &schema))
        .map_err(|err| {
            let mut report = ValidationReport::default();
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "schema_validation_error",
                "/",
                err.to_string(),
                None,
            ));
            Box::new(report)
        })?;

    if !structural.is_ok() {
        return Err(Box::new(structural));
    }

    let plan: Plan = match serde_json::from_value(plan_json.clone()) {
        Ok(plan) => plan,
        Err(err) => {
            let mut report = ValidationReport::default();
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "invalid_plan_json",
                "/",
                err.to_string(),
                None,
            ));
            return Err(Box::new(report));
        }
    };

    let semantic = validate_plan(&plan);
    if !semantic.is_ok() {
        return Err(Box::new(semantic));
    }

    Ok(ValidatedPlan {
        plan,
        warnings: semantic.warnings,
    })
}

fn validate_property(
    spec: &PropertySpec,
    index: usize,
    declared: &HashSet<&str>,
    report: &mut ValidationReport,
) {
    let base = format!("/properties/{index}");

    let kind = match ValueKind::parse(&spec.value_type) {
        Some(kind) => Some(kind),
        None => {
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "unknown_value_type",
                format!("{base}/value_type"),
                format!(
                    "unknown value type '{}' for property '{}'",
                    spec.value_type, spec.id
                ),
                Some("expected one of: bool, int, float, text, uuid, date, timestamp".to_string()),
            ));
            None
        }
    };

    if spec.provider.id().is_empty() {
        report.push_error(ValidationIssue::new(
            IssueSeverity::Error,
            "missing_provider",
            format!("{base}/provider"),
            format!("property '{}' has no provider id", spec.id),
            None,
        ));
    }

    for (name, bindings) in &spec.arguments {
        if bindings.is_empty() {
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "empty_argument_binding",
                format!("{base}/arguments/{name}"),
                format!("argument '{name}' of property '{}' binds nothing", spec.id),
                None,
            ));
        }
        for reference in bindings {
            if !declared.contains(reference.as_str()) {
                report.push_error(ValidationIssue::new(
                    IssueSeverity::Error,
                    "unknown_argument_reference",
                    format!("{base}/arguments/{name}"),
                    format!(
                        "argument '{name}' of property '{}' references undeclared property '{}'",
                        spec.id, reference
                    ),
                    None,
                ));
            }
        }
    }

    if !spec.weights.is_empty() && !spec.ranges.is_empty() {
        report.push_error(ValidationIssue::new(
            IssueSeverity::Error,
            "conflicting_variants",
            base.clone(),
            format!(
                "property '{}' declares both weights and ranges",
                spec.id
            ),
            None,
        ));
        return;
    }

    if !spec.weights.is_empty() {
        if spec.unique {
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "weighted_unique_conflict",
                base.clone(),
                format!("weighted property '{}' cannot be unique", spec.id),
                None,
            ));
        }
        let mut total = 0.0;
        for (weight_index, weight) in spec.weights.iter().enumerate() {
            let path = format!("{base}/weights/{weight_index}");
            if weight.fraction < 0.0 {
                report.push_error(ValidationIssue::new(
                    IssueSeverity::Error,
                    "negative_fraction",
                    path.clone(),
                    format!("negative weight fraction on property '{}'", spec.id),
                    None,
                ));
            }
            total += weight.fraction;
            if let Some(kind) = kind
                && Value::from_json(kind, &weight.value).is_none()
            {
                report.push_error(ValidationIssue::new(
                    IssueSeverity::Error,
                    "invalid_weight_value",
                    path,
                    format!(
                        "weight value {} is not a '{}' literal",
                        weight.value, spec.value_type
                    ),
                    None,
                ));
            }
        }
        if total > 1.0 + FRACTION_EPSILON {
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "fraction_sum_above_one",
                format!("{base}/weights"),
                format!("weight fractions of property '{}' sum above 1.0", spec.id),
                None,
            ));
        }
    }

    if !spec.ranges.is_empty() {
        let mut total = 0.0;
        for (range_index, range) in spec.ranges.iter().enumerate() {
            let path = format!("{base}/ranges/{range_index}");
            if range.fraction < 0.0 {
                report.push_error(ValidationIssue::new(
                    IssueSeverity::Error,
                    "negative_fraction",
                    path.clone(),
                    format!("negative range fraction on property '{}'", spec.id),
                    None,
                ));
            }
            total += range.fraction;
            if let Some(kind) = kind {
                let min = Value::from_json(kind, &range.min);
                let max = Value::from_json(kind, &range.max);
                match (min, max) {
                    (Some(min), Some(max))
                        if min.cmp_same_kind(&max) == Some(std::cmp::Ordering::Less) => {}
                    _ => {
                        report.push_error(ValidationIssue::new(
                            IssueSeverity::Error,
                            "invalid_range_bounds",
                            path,
                            format!(
                                "range bounds on property '{}' must be '{}' literals with min < max",
                                spec.id, spec.value_type
                            ),
                            None,
                        ));
                    }
                }
            }
        }
        if total > 1.0 + FRACTION_EPSILON {
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "fraction_sum_above_one",
                format!("{base}/ranges"),
                format!("range fractions of property '{}' sum above 1.0", spec.id),
                None,
            ));
        }
    }
}
