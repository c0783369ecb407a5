//! Partitioned, in-process BM25 full-text search over CSV, NDJSON, or
//! in-memory text corpora.
//!
//! Build once ([`BM25Index::build_csv`], [`BM25Index::build_json`],
//! [`BM25Index::build_documents`]), then answer many ranked queries
//! ([`BM25Index::query`], [`BM25Index::get_topk`]). The index shards the
//! corpus across `num_partitions` independent workers at construction time;
//! each partition owns its own vocabulary, postings, and document table for
//! the rest of its life (see [`index::partition::PartitionIndex`]).

pub mod codec;
pub mod collections;
pub mod config;
pub mod error;
pub mod index;
pub mod ingest;
pub mod persist;
pub mod query;

use ahash::AHashMap;
use std::path::Path;

pub use config::{BM25Config, FileType, IndexConfig, IndexConfigBuilder, MaxDf};
pub use error::{Error, Result};
pub use query::QueryHit;

use index::partition::PartitionIndex;
use ingest::progress::SharedProgress;
use query::reconstruct::{reconstruct_row, Row};

/// A built, queryable BM25 index. Frozen after construction or load: the
/// only way to change its contents is to build or load a new one.
pub struct BM25Index {
    config: IndexConfig,
    file_type: FileType,
    source_path: Option<String>,
    header: Option<Vec<String>>,
    partitions: Vec<PartitionIndex>,
    num_docs: u64,
}

impl BM25Index {
    /// Ingest a CSV file: first line is a comma-separated header, rows are
    /// comma-separated with `"`-quoted fields. Reports progress on
    /// `progress` if given, otherwise builds headless.
    pub fn build_csv(path: &str, config: IndexConfig, progress: Option<&SharedProgress>) -> Result<Self> {
        let hidden = SharedProgress::hidden();
        let progress = progress.unwrap_or(&hidden);
        let outcome = ingest::ingest_csv(path, &config, progress)?;
        progress.finish();
        Ok(Self {
            config,
            file_type: FileType::Csv,
            source_path: Some(path.to_string()),
            header: outcome.header,
            partitions: outcome.partitions,
            num_docs: outcome.num_docs,
        })
    }

    /// Ingest a newline-delimited JSON file, one flat object per line.
    pub fn build_json(path: &str, config: IndexConfig, progress: Option<&SharedProgress>) -> Result<Self> {
        let hidden = SharedProgress::hidden();
        let progress = progress.unwrap_or(&hidden);
        let outcome = ingest::ingest_json(path, &config, progress)?;
        progress.finish();
        Ok(Self {
            config,
            file_type: FileType::Json,
            source_path: Some(path.to_string()),
            header: None,
            partitions: outcome.partitions,
            num_docs: outcome.num_docs,
        })
    }

    /// Ingest an in-memory corpus, one document per string. There is no
    /// source file to seek back into, so [`BM25Index::get_topk`] returns an
    /// error for this kind of index — use [`BM25Index::query`] and look
    /// documents up by `(partition_id, doc_id)` in the caller's own
    /// document vector instead.
    pub fn build_documents(
        documents: &[String],
        config: IndexConfig,
        progress: Option<&SharedProgress>,
    ) -> Result<Self> {
        let hidden = SharedProgress::hidden();
        let progress = progress.unwrap_or(&hidden);
        let outcome = ingest::ingest_documents(documents, &config, progress)?;
        progress.finish();
        Ok(Self {
            config,
            file_type: FileType::InMemory,
            source_path: None,
            header: None,
            partitions: outcome.partitions,
            num_docs: outcome.num_docs,
        })
    }

    pub fn num_docs(&self) -> u64 {
        self.num_docs
    }

    pub fn num_partitions(&self) -> usize {
        self.partitions.len()
    }

    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    /// Rank every partition's matches and merge into one global top-`k`.
    /// `max_df_override`, if given, tightens (never loosens) the ingestion
    /// `max_df`: terms at or above it are treated as absent for this query
    /// only, without touching the persisted index.
    pub fn query(
        &self,
        text: &str,
        k: usize,
        max_df_override: Option<u64>,
        boost_factors: Option<&AHashMap<String, f32>>,
    ) -> Result<Vec<QueryHit>> {
        let config = self.query_time_config(max_df_override);
        query::query_all(&self.partitions, text, k, &config, self.num_docs, boost_factors)
    }

    /// Like [`BM25Index::query`], but also reconstructs each hit's original
    /// record from the source file, with a trailing `("score", ...)` field
    /// appended. Errors for in-memory corpora, which have no source file to
    /// reread.
    pub fn get_topk(
        &self,
        text: &str,
        k: usize,
        max_df_override: Option<u64>,
        boost_factors: Option<&AHashMap<String, f32>>,
    ) -> Result<Vec<Row>> {
        let hits = self.query(text, k, max_df_override, boost_factors)?;
        hits.into_iter()
            .map(|hit| {
                let partition = &self.partitions[hit.partition_id];
                let line_offset = partition.line_offset(hit.doc_id);
                reconstruct_row(
                    self.file_type,
                    self.source_path.as_deref(),
                    self.header.as_deref(),
                    line_offset,
                    hit.score,
                )
            })
            .collect()
    }

    /// A query-time config identical to the build-time one except for an
    /// optionally tighter `max_df`; `min_df`/`stop_words`/BM25 parameters
    /// stay fixed at whatever the index was built with.
    fn query_time_config(&self, max_df_override: Option<u64>) -> IndexConfig {
        let mut config = self.config.clone();
        if let Some(max_df) = max_df_override {
            config.max_df = MaxDf::Absolute(max_df);
        }
        config
    }

    /// Persist every partition plus global metadata into `dir`.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<()> {
        persist::save(
            dir.as_ref(),
            &self.config,
            self.file_type,
            self.source_path.clone(),
            self.header.clone(),
            &self.partitions,
            self.num_docs,
        )
    }

    /// Reload an index previously written by [`BM25Index::save`]. Stop
    /// words and BM25 parameters are restored from `metadata.bin`, so query
    /// tokenization matches exactly how the index was built.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let persist::LoadedIndex { partitions, metadata } = persist::load(dir.as_ref())?;
        let config = IndexConfig::builder(metadata.search_col.clone())
            .min_df(metadata.min_df)
            .max_df(metadata.max_df)
            .k1(metadata.bm25.k1)
            .b(metadata.bm25.b)
            .num_partitions(metadata.num_partitions)
            .stop_words(metadata.stop_words.iter().cloned())
            .build()?;
        Ok(Self {
            config,
            file_type: metadata.file_type,
            source_path: metadata.source_path,
            header: metadata.header,
            partitions,
            num_docs: metadata.num_docs,
        })
    }
}
