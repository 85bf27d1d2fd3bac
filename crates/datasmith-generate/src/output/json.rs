use std::fs;
use std::path::Path;

use crate::errors::GenerationError;
use crate::model::Dataset;

/// Write a dataset as a JSON array of objects; returns bytes written.
pub fn write_dataset_json(path: &Path, dataset: &Dataset) -> Result<u64, GenerationError> {
    let rows: Vec<serde_json::Value> = dataset
        .rows
        .iter()
        .map(|row| {
            let mut object = serde_json::Map::new();
            for column in &dataset.columns {
                let value = row
                    .get(column)
                    .map(|value| value.to_json())
                    .unwrap_or(serde_json::Value::Null);
                object.insert(column.clone(), value);
            }
            serde_json::Value::Object(object)
        })
        .collect();

    let contents = serde_json::to_vec_pretty(&rows)?;
    fs::write(path, &contents)?;
    Ok(contents.len() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use datasmith_core::Value;

    #[test]
    fn json_output_contains_one_object_per_row() {
        let dataset = Dataset {
            columns: vec!["flag".to_string()],
            rows: vec![
                HashMap::from([("flag".to_string(), Value::Bool(true))]),
                HashMap::from([("flag".to_string(), Value::Null)]),
            ],
        };

        let dir = std::env::temp_dir().join("datasmith_json_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("dataset.json");
        write_dataset_json(&path, &dataset).unwrap();

        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let rows = parsed.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["flag"], serde_json::Value::Bool(true));
        assert!(rows[1]["flag"].is_null());
    }
}
