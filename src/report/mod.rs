//! Output writers.

pub mod writer;

pub use writer::{write_dataset_csv, write_dataset_json, write_json};
