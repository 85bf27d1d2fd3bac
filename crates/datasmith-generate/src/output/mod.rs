pub mod csv;
pub mod json;

pub use csv::write_dataset_csv;
pub use json::write_dataset_json;
