//! Declarative plan contracts and validation for datasmith.
//!
//! A plan (`plan.json`) declares properties, their providers, argument
//! bindings, and weighted/ranged population targets. This crate owns the
//! serde model, the JSON Schema, and structural + semantic validation.

pub mod errors;
pub mod model;
pub mod schema;
pub mod validate;

pub use errors::{IssueSeverity, PlanError, ValidationIssue, ValidationReport};
pub use model::{Plan, PropertySpec, ProviderRef, ProviderSpec, RangeSpec, WeightSpec};
pub use schema::{plan_json_schema, plan_json_schema_value};
pub use validate::{validate_plan, validate_plan_document, validate_plan_json, ValidatedPlan};
