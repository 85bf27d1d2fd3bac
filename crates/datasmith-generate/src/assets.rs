use serde::de::DeserializeOwned;

use crate::errors::GenerationError;

/// Deserialize an embedded reference dataset.
///
/// Datasets ship inside the crate; providers call this from `load` and keep
/// the result as instance state.
pub(crate) fn embedded_json<T: DeserializeOwned>(name: &str) -> Result<T, GenerationError> {
    let raw = match name {
        "world.json" => include_str!("../assets/world.json"),
        "person.json" => include_str!("../assets/person.json"),
        "company.json" => include_str!("../assets/company.json"),
        other => {
            return Err(GenerationError::Asset(format!(
                "unknown embedded asset '{other}'"
            )));
        }
    };
    serde_json::from_str(raw)
        .map_err(|err| GenerationError::Asset(format!("invalid json asset '{name}': {err}")))
}
