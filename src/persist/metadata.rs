//! Index-wide metadata: everything needed to resume querying that isn't
//! specific to one partition

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::{BM25Config, FileType, IndexConfig, MaxDf};
use crate::error::Result;

const METADATA_FILE: &str = "metadata.bin";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    pub num_docs: u64,
    pub min_df: u64,
    pub max_df: MaxDf,
    pub bm25: BM25Config,
    pub file_type: FileType,
    pub source_path: Option<String>,
    pub header: Option<Vec<String>>,
    pub search_col: String,
    pub num_partitions: usize,
    /// Stop words are part of the tokenizer contract, not just ingestion
    /// config: a reloaded index must tokenize queries identically to how
    /// it tokenized documents, so they travel with the rest of the state.
    pub stop_words: Vec<String>,
    /// Per-partition document counts, needed to know how many entries each
    /// partition's vbyte-compressed `doc_sizes`/`line_offsets` streams hold.
    pub doc_counts: Vec<u64>,
    pub avg_doc_sizes: Vec<f64>,
}

impl Metadata {
    pub fn new(
        config: &IndexConfig,
        file_type: FileType,
        source_path: Option<String>,
        header: Option<Vec<String>>,
        num_docs: u64,
        doc_counts: Vec<u64>,
        avg_doc_sizes: Vec<f64>,
    ) -> Self {
        Self {
            num_docs,
            min_df: config.min_df,
            max_df: config.max_df,
            bm25: config.bm25,
            file_type,
            source_path,
            header,
            search_col: config.search_col.clone(),
            num_partitions: config.num_partitions,
            stop_words: config.stop_words.iter().cloned().collect(),
            doc_counts,
            avg_doc_sizes,
        }
    }

    /// Write-then-rename: readers only ever see a complete, valid file.
    pub fn write(&self, dir: &Path) -> Result<()> {
        let bytes = bincode::serialize(self)?;
        let tmp = dir.join(format!("{METADATA_FILE}.tmp"));
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, dir.join(METADATA_FILE))?;
        Ok(())
    }

    pub fn read(dir: &Path) -> Result<Self> {
        let bytes = std::fs::read(dir.join(METADATA_FILE))?;
        Ok(bincode::deserialize(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{IndexConfig, MaxDf};

    #[test]
    fn round_trips_through_a_temp_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = IndexConfig::builder("text")
            .max_df(MaxDf::Absolute(100))
            .build()
            .unwrap();
        let meta = Metadata::new(
            &config,
            FileType::Csv,
            Some("corpus.csv".to_string()),
            Some(vec!["id".to_string(), "text".to_string()]),
            42,
            vec![20, 22],
            vec![3.5, 4.1],
        );
        meta.write(dir.path()).unwrap();

        let loaded = Metadata::read(dir.path()).unwrap();
        assert_eq!(loaded.num_docs, 42);
        assert_eq!(loaded.avg_doc_sizes, vec![3.5, 4.1]);
        assert_eq!(loaded.doc_counts, vec![20, 22]);
        assert_eq!(loaded.search_col, "text");
        assert_eq!(loaded.max_df, MaxDf::Absolute(100));
    }
}
