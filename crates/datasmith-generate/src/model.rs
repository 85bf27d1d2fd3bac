use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use datasmith_core::Value;

/// A generated dataset: ordered columns and one value map per row.
///
/// Produced once per `generate` call and immutable afterward. Column order
/// is property registration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub rows: Vec<HashMap<String, Value>>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        self.rows.get(row).and_then(|row| row.get(column))
    }
}

/// Artifact summarizing a generation run, written next to the dataset.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub seed: Option<u64>,
    pub rows_requested: u64,
    pub rows_generated: u64,
    pub values_generated: BTreeMap<String, u64>,
    pub duration_ms: u64,
    pub bytes_written: u64,
}
