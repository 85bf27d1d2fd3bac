use thiserror::Error;

/// Core error type shared across datasmith crates.
#[derive(Debug, Error)]
pub enum Error {
    /// A property id was registered more than once.
    #[error("duplicate property id '{0}'")]
    DuplicateProperty(String),
    /// An argument binding references a property that was never registered.
    #[error("property '{property}' references unknown property '{reference}'")]
    UnknownProperty { property: String, reference: String },
    /// The argument graph contains a cycle.
    #[error("cyclic dependency detected among properties: {}", .0.join(", "))]
    CyclicDependency(Vec<String>),
    /// A property violates a structural invariant.
    #[error("invalid property '{id}': {reason}")]
    InvalidProperty { id: String, reason: String },
}

/// Convenience alias for results returned by datasmith crates.
pub type Result<T> = std::result::Result<T, Error>;
