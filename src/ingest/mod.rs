//! Corpus ingestion: partitioning, field extraction, and the build pipeline

pub mod extract;
pub mod partitioner;
pub mod pipeline;
pub mod progress;

pub use pipeline::{ingest_csv, ingest_documents, ingest_json, IngestOutcome};
