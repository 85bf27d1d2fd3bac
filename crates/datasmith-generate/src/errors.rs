use thiserror::Error;

use datasmith_core::Error as CoreError;

/// Errors emitted by the generation engine and its providers.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Structural configuration error (duplicate ids, cycles, invalid
    /// weights).
    #[error("configuration error: {0}")]
    Config(#[from] CoreError),
    /// The plan is rejected before any generation work begins.
    #[error("invalid plan: {0}")]
    InvalidPlan(String),
    #[error("unknown provider id '{0}'")]
    UnknownProvider(String),
    #[error("unknown value type '{0}'")]
    UnknownValueType(String),
    #[error("invalid params for provider '{provider}': {reason}")]
    InvalidParams { provider: String, reason: String },
    /// A provider read an argument its property never declared.
    #[error("property '{property}' did not declare argument '{name}'")]
    AccessViolation { property: String, name: String },
    /// A declared argument resolved to a null value.
    #[error("argument '{name}' of property '{property}' resolved to null")]
    NullArgument { property: String, name: String },
    #[error("property '{property}' expected a '{expected}' value but found '{actual}'")]
    TypeMismatch {
        property: String,
        expected: String,
        actual: String,
    },
    #[error("provider '{provider}' returned null for non-nullable property '{property}'")]
    NullViolation { property: String, provider: String },
    #[error("provider '{provider}' produced a duplicate value for unique property '{property}'")]
    DuplicateUniqueValue { property: String, provider: String },
    #[error("provider '{provider}' cannot generate another unique value")]
    UniqueValueExhausted { provider: String },
    #[error("provider '{provider}' cannot resolve value id '{id}'")]
    UnknownValueId { provider: String, id: String },
    #[error(
        "weighted value '{id}' of property '{property}' could not be resolved by provider '{provider}'"
    )]
    UnresolvedWeightedValue {
        property: String,
        provider: String,
        id: String,
    },
    #[error("provider '{provider}' does not support ranged generation")]
    RangesUnsupported { provider: String },
    #[error("asset error: {0}")]
    Asset(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}
