//! Persistence and reporting.

pub mod generator;
pub mod store;

pub use generator::{generate_json_summary, generate_text_summary, SummaryReport};
pub use store::{read_aggregate, write_aggregate};
