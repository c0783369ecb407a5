//! Index configuration
//!
//! Collects the knobs that control ingestion and ranking: which column to
//! index, document-frequency bounds, BM25 parameters and partition count.

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Source corpus format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileType {
    Csv,
    Json,
    InMemory,
}

impl FileType {
    /// Infer from a file extension. Used when no explicit file type is given.
    pub fn from_path(path: &str) -> Result<Self> {
        if path.ends_with(".csv") {
            Ok(FileType::Csv)
        } else if path.ends_with(".json") || path.ends_with(".ndjson") || path.ends_with(".jsonl")
        {
            Ok(FileType::Json)
        } else {
            Err(Error::UnsupportedFileType(path.to_string()))
        }
    }
}

/// How `max_df` is interpreted: an absolute document count, or a fraction of
/// `num_docs` resolved once ingestion knows the corpus size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MaxDf {
    Absolute(u64),
    Fraction(f32),
}

impl MaxDf {
    /// Resolve against a known document count. Consistently uses `num_docs`
    /// for every file type (the original CSV path derived this from file
    /// size in bytes instead, which the design notes call out as a bug).
    pub fn resolve(self, num_docs: u64) -> u64 {
        match self {
            MaxDf::Absolute(n) => n,
            MaxDf::Fraction(frac) => ((num_docs as f64) * frac as f64).round() as u64,
        }
    }
}

impl Default for MaxDf {
    fn default() -> Self {
        MaxDf::Fraction(1.0)
    }
}

/// Okapi BM25 ranking parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BM25Config {
    /// Term-frequency saturation parameter, typically 1.2-2.0.
    pub k1: f32,
    /// Length-normalization parameter, typically 0.75.
    pub b: f32,
}

impl Default for BM25Config {
    fn default() -> Self {
        Self { k1: 1.2, b: 0.75 }
    }
}

/// Full ingestion configuration.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    pub search_col: String,
    pub min_df: u64,
    pub max_df: MaxDf,
    pub bm25: BM25Config,
    pub num_partitions: usize,
    pub stop_words: AHashSet<String>,
}

impl IndexConfig {
    pub fn builder(search_col: impl Into<String>) -> IndexConfigBuilder {
        IndexConfigBuilder::new(search_col)
    }
}

pub struct IndexConfigBuilder {
    search_col: String,
    min_df: u64,
    max_df: MaxDf,
    bm25: BM25Config,
    num_partitions: usize,
    stop_words: AHashSet<String>,
}

impl IndexConfigBuilder {
    pub fn new(search_col: impl Into<String>) -> Self {
        Self {
            search_col: search_col.into(),
            min_df: 1,
            max_df: MaxDf::default(),
            bm25: BM25Config::default(),
            num_partitions: num_cpus::get().max(1),
            stop_words: AHashSet::new(),
        }
    }

    pub fn min_df(mut self, min_df: u64) -> Self {
        self.min_df = min_df;
        self
    }

    pub fn max_df(mut self, max_df: MaxDf) -> Self {
        self.max_df = max_df;
        self
    }

    pub fn k1(mut self, k1: f32) -> Self {
        self.bm25.k1 = k1;
        self
    }

    pub fn b(mut self, b: f32) -> Self {
        self.bm25.b = b;
        self
    }

    pub fn num_partitions(mut self, n: usize) -> Self {
        self.num_partitions = n;
        self
    }

    /// Stop words are normalized to upper case, matching token casing at
    /// both ingestion and query time.
    pub fn stop_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.stop_words = words.into_iter().map(|w| w.as_ref().to_uppercase()).collect();
        self
    }

    pub fn build(self) -> Result<IndexConfig> {
        if self.num_partitions == 0 {
            return Err(Error::Config("num_partitions must be >= 1".into()));
        }
        if !(0.0..=1.0).contains(&self.bm25.b) {
            return Err(Error::Config("b must be in [0, 1]".into()));
        }
        if self.bm25.k1 < 0.0 {
            return Err(Error::Config("k1 must be >= 0".into()));
        }
        Ok(IndexConfig {
            search_col: self.search_col,
            min_df: self.min_df,
            max_df: self.max_df,
            bm25: self.bm25,
            num_partitions: self.num_partitions,
            stop_words: self.stop_words,
        })
    }
}
