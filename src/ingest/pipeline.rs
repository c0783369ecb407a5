//! Ingestion orchestration: one OS thread per partition, no locking beyond
//! the shared progress bar
//!
//! Each worker owns its own [`PartitionIndex`] end to end: term ids, doc
//! ids, and postings never leave the partition that built them. The
//! coordinator only joins the workers and sums their document counts.

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};

use crate::config::IndexConfig;
use crate::error::{Error, Result};
use crate::index::partition::PartitionIndex;
use crate::ingest::extract::{find_column, json_field, split_csv_record};
use crate::ingest::partitioner::{partition_file, partition_range, PartitionBounds};
use crate::ingest::progress::SharedProgress;

/// A record without a closing delimiter inside this many bytes is treated
/// as malformed input rather than read into memory indefinitely.
const MAX_LINE_BYTES: usize = 1024 * 1024;

/// Result of building an index from a corpus: one [`PartitionIndex`] per
/// worker plus the header row (absent for in-memory corpora, which have no
/// columns beyond the search text itself).
pub struct IngestOutcome {
    pub partitions: Vec<PartitionIndex>,
    pub num_docs: u64,
    pub header: Option<Vec<String>>,
}

pub fn ingest_csv(path: &str, config: &IndexConfig, progress: &SharedProgress) -> Result<IngestOutcome> {
    let header = read_header_line(path)?;
    let header_end = header_byte_len(path)?;
    let col_idx = find_column(&header, &config.search_col)?;
    let bounds = partition_file(path, header_end, config.num_partitions)?;

    let partitions = std::thread::scope(|scope| -> Result<Vec<PartitionIndex>> {
        let handles: Vec<_> = bounds
            .iter()
            .map(|b| {
                scope.spawn(move || index_csv_partition(path, *b, col_idx, config, progress))
            })
            .collect();

        let mut partitions = Vec::with_capacity(handles.len());
        for handle in handles {
            partitions.push(handle.join().expect("partition worker panicked")?);
        }
        Ok(partitions)
    })?;

    let num_docs = partitions.iter().map(|p| p.num_docs()).sum();
    Ok(IngestOutcome {
        partitions,
        num_docs,
        header: Some(header),
    })
}

pub fn ingest_json(path: &str, config: &IndexConfig, progress: &SharedProgress) -> Result<IngestOutcome> {
    let bounds = partition_file(path, 0, config.num_partitions)?;

    let partitions = std::thread::scope(|scope| -> Result<Vec<PartitionIndex>> {
        let handles: Vec<_> = bounds
            .iter()
            .map(|b| scope.spawn(move || index_json_partition(path, *b, config, progress)))
            .collect();

        let mut partitions = Vec::with_capacity(handles.len());
        for handle in handles {
            partitions.push(handle.join().expect("partition worker panicked")?);
        }
        Ok(partitions)
    })?;

    let num_docs = partitions.iter().map(|p| p.num_docs()).sum();
    Ok(IngestOutcome {
        partitions,
        num_docs,
        header: None,
    })
}

pub fn ingest_documents(
    documents: &[String],
    config: &IndexConfig,
    progress: &SharedProgress,
) -> Result<IngestOutcome> {
    let ranges = partition_range(documents.len(), config.num_partitions);

    let partitions = std::thread::scope(|scope| -> Vec<PartitionIndex> {
        let handles: Vec<_> = ranges
            .iter()
            .map(|&(start, end)| {
                let slice = &documents[start..end];
                scope.spawn(move || index_in_memory_partition(slice, config, progress))
            })
            .collect();
        handles.into_iter().map(|h| h.join().expect("partition worker panicked")).collect()
    });

    let num_docs = partitions.iter().map(|p| p.num_docs()).sum();
    Ok(IngestOutcome {
        partitions,
        num_docs,
        header: None,
    })
}

fn index_csv_partition(
    path: &str,
    bounds: PartitionBounds,
    col_idx: usize,
    config: &IndexConfig,
    progress: &SharedProgress,
) -> Result<PartitionIndex> {
    let mut partition = PartitionIndex::new(config, bounds.num_docs);
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(bounds.start))?;
    let mut reader = BufReader::new(file);

    let mut offset = bounds.start;
    let mut line = String::new();
    while offset < bounds.end {
        line.clear();
        let read = reader.read_line(&mut line)?;
        if read == 0 {
            break;
        }
        let line_offset = offset;
        offset += read as u64;
        if line.len() > MAX_LINE_BYTES {
            return Err(Error::RecordTooLong(line_offset));
        }

        let fields = split_csv_record(&line);
        let field = fields.get(col_idx).map(String::as_str).unwrap_or("");
        partition.add_document(field, line_offset, &config.stop_words);
        progress.inc(1);
    }
    partition.finish_ingestion();
    Ok(partition)
}

fn index_json_partition(
    path: &str,
    bounds: PartitionBounds,
    config: &IndexConfig,
    progress: &SharedProgress,
) -> Result<PartitionIndex> {
    let mut partition = PartitionIndex::new(config, bounds.num_docs);
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(bounds.start))?;
    let mut reader = BufReader::new(file);

    let mut offset = bounds.start;
    let mut line = String::new();
    while offset < bounds.end {
        line.clear();
        let read = reader.read_line(&mut line)?;
        if read == 0 {
            break;
        }
        let line_offset = offset;
        offset += read as u64;
        if line.len() > MAX_LINE_BYTES {
            return Err(Error::RecordTooLong(line_offset));
        }

        let trimmed = line.trim_end_matches(['\n', '\r']);
        if trimmed.is_empty() {
            continue;
        }
        // A missing search key is not fatal (indexed as an empty field);
        // a line that doesn't parse as JSON at all is a corpus parse error.
        let field = match json_field(trimmed, &config.search_col, line_offset) {
            Ok(field) => field,
            Err(Error::ColumnNotFound(..)) => String::new(),
            Err(other) => return Err(other),
        };
        partition.add_document(&field, line_offset, &config.stop_words);
        progress.inc(1);
    }
    partition.finish_ingestion();
    Ok(partition)
}

fn index_in_memory_partition(
    documents: &[String],
    config: &IndexConfig,
    progress: &SharedProgress,
) -> PartitionIndex {
    let mut partition = PartitionIndex::new(config, documents.len() as u64);
    for doc in documents {
        partition.add_document(doc, 0, &config.stop_words);
        progress.inc(1);
    }
    partition.finish_ingestion();
    partition
}

fn read_header_line(path: &str) -> Result<Vec<String>> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut line = String::new();
    let read = reader.read_line(&mut line)?;
    if read == 0 {
        return Err(Error::InvalidData("CSV file has no header row".into()));
    }
    if line.len() > MAX_LINE_BYTES {
        return Err(Error::RecordTooLong(0));
    }
    Ok(split_csv_record(&line))
}

fn header_byte_len(path: &str) -> Result<u64> {
    let mut file = File::open(path)?;
    let mut buf = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        let n = file.read(&mut byte)?;
        if n == 0 {
            break;
        }
        buf.push(byte[0]);
        if byte[0] == b'\n' {
            break;
        }
    }
    Ok(buf.len() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexConfig;
    use std::io::Write;

    #[test]
    fn ingests_a_small_csv_file() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "id,text").unwrap();
        for i in 0..20 {
            writeln!(tmp, "{i},the quick fox jumps {i}").unwrap();
        }
        let path = tmp.path().to_str().unwrap().to_string();

        let config = IndexConfig::builder("text").num_partitions(2).build().unwrap();
        let outcome = ingest_csv(&path, &config, &SharedProgress::hidden()).unwrap();

        assert_eq!(outcome.num_docs, 20);
        assert_eq!(outcome.partitions.len(), 2);
        assert_eq!(outcome.header.unwrap(), vec!["id", "text"]);
    }

    #[test]
    fn ingests_ndjson() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        for i in 0..10 {
            writeln!(tmp, r#"{{"text": "hello world {i}"}}"#).unwrap();
        }
        let path = tmp.path().to_str().unwrap().to_string();

        let config = IndexConfig::builder("text").num_partitions(3).build().unwrap();
        let outcome = ingest_json(&path, &config, &SharedProgress::hidden()).unwrap();
        assert_eq!(outcome.num_docs, 10);
    }

    #[test]
    fn ingests_in_memory_documents() {
        let docs: Vec<String> = (0..7).map(|i| format!("doc number {i}")).collect();
        let config = IndexConfig::builder("text").num_partitions(3).build().unwrap();
        let outcome = ingest_documents(&docs, &config, &SharedProgress::hidden()).unwrap();
        assert_eq!(outcome.num_docs, 7);
    }
}
