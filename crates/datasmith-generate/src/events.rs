use std::collections::BTreeMap;

use datasmith_core::Value;

/// Synchronous lifecycle hooks for a generation run.
///
/// The engine invokes observers inline at four points: before and after a
/// provider's load phase, once per generated value, and once per completed
/// row. Pooled weighted/ranged values are observed when they are reserved;
/// live values when they are placed, so each value is seen exactly once.
pub trait GenerationObserver {
    fn property_loading(&mut self, _property_id: &str) {}
    fn property_loaded(&mut self, _property_id: &str) {}
    fn value_generated(&mut self, _property_id: &str, _value: &Value) {}
    fn row_generated(&mut self, _row_index: usize) {}
}

/// Observer that ignores every notification.
#[derive(Debug, Default)]
pub struct NoopObserver;

impl GenerationObserver for NoopObserver {}

/// Counting observer backing the CLI run report.
#[derive(Debug, Default, Clone)]
pub struct RunSummary {
    pub rows_generated: u64,
    pub values_generated: BTreeMap<String, u64>,
    pub loaded_properties: Vec<String>,
}

impl GenerationObserver for RunSummary {
    fn property_loaded(&mut self, property_id: &str) {
        self.loaded_properties.push(property_id.to_string());
    }

    fn value_generated(&mut self, property_id: &str, _value: &Value) {
        *self
            .values_generated
            .entry(property_id.to_string())
            .or_insert(0) += 1;
    }

    fn row_generated(&mut self, _row_index: usize) {
        self.rows_generated += 1;
    }
}
