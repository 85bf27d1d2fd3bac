use schemars::schema::RootSchema;
use schemars::schema_for;

use crate::errors::{PlanError, Result};
use crate::model::Plan;

/// Emit the JSON Schema for `plan.json`.
pub fn plan_json_schema() -> RootSchema {
    schema_for!(Plan)
}

/// The plan JSON Schema as a plain JSON value, for structural validation.
pub fn plan_json_schema_value() -> Result<serde_json::Value> {
    serde_json::to_value(plan_json_schema()).map_err(PlanError::Json)
}
