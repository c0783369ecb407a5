//! Byte-range and index-range partitioning
//!
//! CSV and NDJSON partitions must land on record boundaries: each
//! partition's end is pushed forward from an even byte-size split to the
//! next newline, so no record is ever split across two workers. The same
//! scan counts records per partition so `max_df` can be resolved against an
//! exact document count instead of a byte-size guess.

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};

use crate::error::Result;

/// `[start, end)` byte range of a partition within the source file, plus
/// its record count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionBounds {
    pub start: u64,
    pub end: u64,
    pub num_docs: u64,
}

/// Split `[header_end, file_size)` into `num_partitions` byte ranges, each
/// pushed forward to the next newline, then count the records each one
/// contains.
pub fn partition_file(path: &str, header_end: u64, num_partitions: usize) -> Result<Vec<PartitionBounds>> {
    let file_size = std::fs::metadata(path)?.len();
    let mut file = File::open(path)?;

    let body_len = file_size.saturating_sub(header_end);
    let chunk_size = if num_partitions == 0 {
        body_len
    } else {
        body_len / num_partitions as u64
    };

    let mut boundaries = vec![header_end];
    let mut offset = header_end;
    for _ in 0..num_partitions.saturating_sub(1) {
        offset += chunk_size;
        if offset >= file_size {
            boundaries.push(file_size);
            continue;
        }
        boundaries.push(seek_to_next_newline(&mut file, offset)?);
    }
    boundaries.push(file_size);

    let mut bounds = Vec::with_capacity(num_partitions);
    for window in boundaries.windows(2) {
        let (start, end) = (window[0], window[1]);
        let num_docs = count_newlines(path, start, end)?;
        bounds.push(PartitionBounds { start, end, num_docs });
    }
    Ok(bounds)
}

fn seek_to_next_newline(file: &mut File, from: u64) -> Result<u64> {
    file.seek(SeekFrom::Start(from))?;
    let mut reader = BufReader::new(file.try_clone()?);
    let mut buf = Vec::new();
    let read = reader.read_until(b'\n', &mut buf)?;
    Ok(from + read as u64)
}

fn count_newlines(path: &str, start: u64, end: u64) -> Result<u64> {
    if end <= start {
        return Ok(0);
    }
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(start))?;
    let mut remaining = end - start;
    let mut buf = [0u8; 64 * 1024];
    let mut count = 0u64;
    while remaining > 0 {
        let to_read = remaining.min(buf.len() as u64) as usize;
        let n = file.read(&mut buf[..to_read])?;
        if n == 0 {
            break;
        }
        count += buf[..n].iter().filter(|&&b| b == b'\n').count() as u64;
        remaining -= n as u64;
    }
    Ok(count)
}

/// Split an in-memory corpus of `len` documents into `num_partitions`
/// contiguous index ranges.
pub fn partition_range(len: usize, num_partitions: usize) -> Vec<(usize, usize)> {
    if num_partitions == 0 || len == 0 {
        return vec![(0, len)];
    }
    let chunk = len / num_partitions;
    let remainder = len % num_partitions;
    let mut ranges = Vec::with_capacity(num_partitions);
    let mut start = 0;
    for i in 0..num_partitions {
        let extra = if i < remainder { 1 } else { 0 };
        let end = (start + chunk + extra).min(len);
        ranges.push((start, end));
        start = end;
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partitions_a_file_on_newline_boundaries() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        for i in 0..100 {
            writeln!(tmp, "row{i},value{i}").unwrap();
        }
        let path = tmp.path().to_str().unwrap().to_string();

        let bounds = partition_file(&path, 0, 4).unwrap();
        assert_eq!(bounds.len(), 4);
        let total_docs: u64 = bounds.iter().map(|b| b.num_docs).sum();
        assert_eq!(total_docs, 100);

        // every partition boundary lands right after a newline
        let contents = std::fs::read(&path).unwrap();
        for b in &bounds {
            if b.start > 0 {
                assert_eq!(contents[(b.start - 1) as usize], b'\n');
            }
        }
    }

    #[test]
    fn single_partition_covers_whole_file() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "a,b").unwrap();
        writeln!(tmp, "c,d").unwrap();
        let path = tmp.path().to_str().unwrap().to_string();

        let bounds = partition_file(&path, 0, 1).unwrap();
        assert_eq!(bounds.len(), 1);
        assert_eq!(bounds[0].num_docs, 2);
    }

    #[test]
    fn in_memory_ranges_cover_every_index_exactly_once() {
        let ranges = partition_range(17, 4);
        let mut covered = 0;
        let mut prev_end = 0;
        for (start, end) in ranges {
            assert_eq!(start, prev_end);
            covered += end - start;
            prev_end = end;
        }
        assert_eq!(covered, 17);
        assert_eq!(prev_end, 17);
    }
}
