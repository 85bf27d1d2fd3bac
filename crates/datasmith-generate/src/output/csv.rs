use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::errors::GenerationError;
use crate::model::Dataset;

/// Write a dataset as CSV with a header row; returns bytes written.
pub fn write_dataset_csv(path: &Path, dataset: &Dataset) -> Result<u64, GenerationError> {
    let writer = BufWriter::new(File::create(path)?);
    let counting = CountingWriter::new(writer);
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(counting);

    writer.write_record(&dataset.columns)?;

    for row in &dataset.rows {
        let record: Vec<String> = dataset
            .columns
            .iter()
            .map(|column| row.get(column).map(|value| value.to_csv()).unwrap_or_default())
            .collect();
        writer.write_record(&record)?;
    }

    writer.flush()?;
    let counting = writer.into_inner().map_err(|err| err.into_error())?;
    Ok(counting.bytes_written())
}

struct CountingWriter<W: Write> {
    inner: W,
    bytes: u64,
}

impl<W: Write> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, bytes: 0 }
    }

    fn bytes_written(&self) -> u64 {
        self.bytes
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let size = self.inner.write(buf)?;
        self.bytes = self.bytes.saturating_add(size as u64);
        Ok(size)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use datasmith_core::Value;

    #[test]
    fn csv_output_keeps_column_order_and_renders_nulls_empty() {
        let dataset = Dataset {
            columns: vec!["name".to_string(), "age".to_string()],
            rows: vec![
                HashMap::from([
                    ("name".to_string(), Value::Text("Ana".into())),
                    ("age".to_string(), Value::Int(31)),
                ]),
                HashMap::from([
                    ("name".to_string(), Value::Null),
                    ("age".to_string(), Value::Int(54)),
                ]),
            ],
        };

        let dir = std::env::temp_dir().join("datasmith_csv_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("dataset.csv");
        let bytes = write_dataset_csv(&path, &dataset).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "name,age\nAna,31\n,54\n");
        assert_eq!(bytes, contents.len() as u64);
    }
}
