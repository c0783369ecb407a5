//! Per-partition file layout
//!
//! Each partition owns four files, suffixed `_<partition_id>` as the spec
//! lays out: the term dictionary, the posting-list store, doc sizes, and
//! line offsets. `doc_sizes`/`line_offsets` are vbyte-compressed vectors
//! with no internal length prefix; the caller supplies `num_docs` from
//! `Metadata::doc_counts` to know where the stream ends.

use ahash::AHashMap;
use std::path::Path;

use crate::codec::vbyte;
use crate::error::Result;
use crate::index::partition::PartitionIndex;
use crate::index::posting::{Posting, PostingListStore};

fn term_mapping_path(dir: &Path, partition_id: usize) -> std::path::PathBuf {
    dir.join(format!("unique_term_mapping.bin_{partition_id}"))
}

fn inverted_index_path(dir: &Path, partition_id: usize) -> std::path::PathBuf {
    dir.join(format!("inverted_index.bin_{partition_id}"))
}

fn doc_sizes_path(dir: &Path, partition_id: usize) -> std::path::PathBuf {
    dir.join(format!("doc_sizes.bin_{partition_id}"))
}

fn line_offsets_path(dir: &Path, partition_id: usize) -> std::path::PathBuf {
    dir.join(format!("line_offsets.bin_{partition_id}"))
}

/// Write one partition's four files. Called before `Metadata::write`, which
/// is the single atomic commit point for the whole directory: a crash here
/// leaves orphaned partition files, but `metadata.bin` never appears
/// without them (see [`crate::persist`]).
pub fn write_partition(dir: &Path, partition_id: usize, partition: &PartitionIndex) -> Result<()> {
    let term_pairs: Vec<(String, u32)> = partition
        .term_to_id()
        .iter()
        .map(|(term, &id)| (term.clone(), id))
        .collect();
    std::fs::write(term_mapping_path(dir, partition_id), bincode::serialize(&term_pairs)?)?;

    let postings: Vec<(Vec<u8>, Vec<u8>)> = partition
        .postings()
        .iter()
        .map(|p| (p.encode_doc_ids(), p.term_freqs_bytes()))
        .collect();
    std::fs::write(
        inverted_index_path(dir, partition_id),
        bincode::serialize(&postings)?,
    )?;

    let doc_sizes: Vec<u64> = partition.doc_sizes().iter().map(|&s| s as u64).collect();
    std::fs::write(doc_sizes_path(dir, partition_id), vbyte::encode_vec(&doc_sizes))?;

    let line_offsets = partition.line_offsets();
    std::fs::write(
        line_offsets_path(dir, partition_id),
        vbyte::encode_vec(line_offsets),
    )?;

    Ok(())
}

/// Read one partition back. `num_docs` comes from `Metadata::doc_counts`;
/// `max_df` is re-resolved against it so a reloaded partition's eviction
/// threshold matches what it was built with (eviction itself is already
/// baked into the postings, so this only affects bookkeeping, not results).
pub fn read_partition(
    dir: &Path,
    partition_id: usize,
    num_docs: u64,
    max_df: u64,
    has_line_offsets: bool,
) -> Result<PartitionIndex> {
    let term_pairs: Vec<(String, u32)> =
        bincode::deserialize(&std::fs::read(term_mapping_path(dir, partition_id))?)?;
    let term_to_id: AHashMap<String, u32> = term_pairs.into_iter().collect();

    let posting_bufs: Vec<(Vec<u8>, Vec<u8>)> =
        bincode::deserialize(&std::fs::read(inverted_index_path(dir, partition_id))?)?;
    let mut postings = Vec::with_capacity(posting_bufs.len());
    for (doc_ids_buf, term_freqs_buf) in &posting_bufs {
        postings.push(Posting::decode_from_disk(doc_ids_buf, term_freqs_buf)?);
    }

    let doc_sizes_bytes = std::fs::read(doc_sizes_path(dir, partition_id))?;
    let doc_sizes: Vec<u16> = vbyte::decode_vec(&doc_sizes_bytes, num_docs as usize)?
        .into_iter()
        .map(|v| v.min(u16::MAX as u64) as u16)
        .collect();

    let line_offsets = if has_line_offsets {
        let bytes = std::fs::read(line_offsets_path(dir, partition_id))?;
        vbyte::decode_vec(&bytes, num_docs as usize)?
    } else {
        Vec::new()
    };

    Ok(PartitionIndex::from_persisted(
        term_to_id,
        PostingListStore::from_postings(postings),
        doc_sizes,
        line_offsets,
        max_df,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexConfig;

    #[test]
    fn round_trips_a_built_partition_through_disk() {
        let config = IndexConfig::builder("text").build().unwrap();
        let mut partition = PartitionIndex::new(&config, 3);
        let empty = ahash::AHashSet::new();
        partition.add_document("the quick brown fox", 0, &empty);
        partition.add_document("the lazy dog", 21, &empty);
        partition.add_document("quick fox", 34, &empty);
        partition.finish_ingestion();

        let dir = tempfile::tempdir().unwrap();
        write_partition(dir.path(), 0, &partition).unwrap();
        let max_df = config.max_df.resolve(3).max(1);
        let reloaded = read_partition(dir.path(), 0, 3, max_df, true).unwrap();

        assert_eq!(reloaded.num_docs(), partition.num_docs());
        assert_eq!(reloaded.line_offsets(), partition.line_offsets());
        let term_id = reloaded.term_id("FOX").unwrap();
        let orig_id = partition.term_id("FOX").unwrap();
        assert_eq!(
            reloaded.decode_postings(term_id).unwrap(),
            partition.decode_postings(orig_id).unwrap()
        );
    }
}
