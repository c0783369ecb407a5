//! Command-line demo: build an index from a corpus file and query it
//!
//! This binary is a thin shell around the library API: it wires up CLI
//! parsing, progress reporting, and error display. All indexing and
//! ranking logic lives in the `bm25rs` library crate.

use std::path::PathBuf;

use anyhow::{Context, Result};
use bm25rs::{BM25Index, FileType, IndexConfig, MaxDf};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bm25rs-cli", about = "Partitioned BM25 full-text search over CSV/NDJSON corpora")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build an index from a corpus file and persist it to a directory.
    Build {
        /// Path to the source CSV or NDJSON file.
        #[arg(long)]
        input: PathBuf,
        /// Directory to write the built index into.
        #[arg(long)]
        output: PathBuf,
        /// Column (CSV) or key (JSON) to index.
        #[arg(long)]
        search_col: String,
        /// Force the file type instead of inferring it from the extension.
        #[arg(long, value_enum)]
        file_type: Option<CliFileType>,
        /// Minimum document frequency for a term to be visible at query time.
        #[arg(long, default_value_t = 1)]
        min_df: u64,
        /// Maximum document frequency before a term is evicted. Values < 2
        /// are interpreted as a fraction of the document count.
        #[arg(long, default_value_t = 1.0)]
        max_df: f32,
        #[arg(long, default_value_t = 1.2)]
        k1: f32,
        #[arg(long, default_value_t = 0.75)]
        b: f32,
        /// Number of partitions (worker threads). Defaults to available parallelism.
        #[arg(long)]
        num_partitions: Option<usize>,
        /// Comma-separated stop words, case-insensitive.
        #[arg(long)]
        stop_words: Option<String>,
        /// Hide the progress bar.
        #[arg(long)]
        quiet: bool,
    },
    /// Query a previously built index and print the top-k reconstructed rows.
    Query {
        /// Directory a previous `build` wrote the index into.
        #[arg(long)]
        index: PathBuf,
        /// Query text.
        query: String,
        #[arg(long, default_value_t = 10)]
        k: usize,
        /// Tighter per-query max_df cap, as an absolute document count.
        #[arg(long)]
        max_df_override: Option<u64>,
    },
}

#[derive(Clone, clap::ValueEnum)]
enum CliFileType {
    Csv,
    Json,
}

fn main() -> Result<()> {
    match Cli::parse().command {
        Command::Build {
            input,
            output,
            search_col,
            file_type,
            min_df,
            max_df,
            k1,
            b,
            num_partitions,
            stop_words,
            quiet,
        } => build(
            input, output, search_col, file_type, min_df, max_df, k1, b, num_partitions, stop_words, quiet,
        ),
        Command::Query { index, query, k, max_df_override } => {
            run_query(index, &query, k, max_df_override)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn build(
    input: PathBuf,
    output: PathBuf,
    search_col: String,
    file_type: Option<CliFileType>,
    min_df: u64,
    max_df: f32,
    k1: f32,
    b: f32,
    num_partitions: Option<usize>,
    stop_words: Option<String>,
    quiet: bool,
) -> Result<()> {
    let input_str = input.to_str().context("input path is not valid UTF-8")?;
    let resolved_type = match file_type {
        Some(CliFileType::Csv) => FileType::Csv,
        Some(CliFileType::Json) => FileType::Json,
        None => FileType::from_path(input_str)?,
    };

    let mut builder = IndexConfig::builder(search_col)
        .min_df(min_df)
        .max_df(if max_df < 2.0 { MaxDf::Fraction(max_df) } else { MaxDf::Absolute(max_df as u64) })
        .k1(k1)
        .b(b);
    if let Some(n) = num_partitions {
        builder = builder.num_partitions(n);
    }
    if let Some(words) = &stop_words {
        builder = builder.stop_words(words.split(',').map(str::trim).filter(|w| !w.is_empty()));
    }
    let config = builder.build()?;

    let progress = if quiet {
        None
    } else {
        Some(bm25rs::ingest::progress::SharedProgress::new(estimate_doc_count(input_str)?))
    };

    let index = match resolved_type {
        FileType::Csv => BM25Index::build_csv(input_str, config, progress.as_ref())?,
        FileType::Json => BM25Index::build_json(input_str, config, progress.as_ref())?,
        FileType::InMemory => anyhow::bail!("in-memory corpora are not built from a file path"),
    };

    index.save(&output)?;
    println!("indexed {} documents across {} partitions into {}", index.num_docs(), index.num_partitions(), output.display());
    Ok(())
}

fn estimate_doc_count(path: &str) -> Result<u64> {
    // Rough upper bound for the progress bar: one newline per record.
    let bytes = std::fs::read(path)?;
    Ok(bytes.iter().filter(|&&b| b == b'\n').count() as u64)
}

fn run_query(index_dir: PathBuf, query: &str, k: usize, max_df_override: Option<u64>) -> Result<()> {
    let index = BM25Index::load(&index_dir).with_context(|| format!("loading index at {}", index_dir.display()))?;
    let rows = index.get_topk(query, k, max_df_override, None)?;
    if rows.is_empty() {
        println!("no results");
        return Ok(());
    }
    for (rank, row) in rows.iter().enumerate() {
        print!("{}.", rank + 1);
        for (key, value) in row {
            print!(" {key}={value}");
        }
        println!();
    }
    Ok(())
}
