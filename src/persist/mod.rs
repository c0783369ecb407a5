//! On-disk persistence
//!
//! Layout mirrors a manifest-commit pattern: every partition file is
//! written first, and `metadata.bin` is written last via write-then-rename.
//! A reader that finds `metadata.bin` can trust every partition file it
//! names exists and is complete; a crash mid-write leaves orphaned
//! partition files but no readable `metadata.bin`, so `load` either fully
//! succeeds or reports the directory as unusable — it never returns a
//! partially-built index.

pub mod metadata;
pub mod partition;

use std::path::Path;

use crate::config::{FileType, IndexConfig};
use crate::error::{Error, Result};
use crate::index::partition::PartitionIndex;
use metadata::Metadata;

/// Persist every partition plus global metadata into `dir`, creating it if
/// necessary.
pub fn save(
    dir: &Path,
    config: &IndexConfig,
    file_type: FileType,
    source_path: Option<String>,
    header: Option<Vec<String>>,
    partitions: &[PartitionIndex],
    num_docs: u64,
) -> Result<()> {
    std::fs::create_dir_all(dir)?;

    for (partition_id, partition) in partitions.iter().enumerate() {
        partition::write_partition(dir, partition_id, partition)?;
    }

    let doc_counts = partitions.iter().map(|p| p.num_docs()).collect();
    let avg_doc_sizes = partitions.iter().map(|p| p.avg_doc_size()).collect();
    let meta = Metadata::new(config, file_type, source_path, header, num_docs, doc_counts, avg_doc_sizes);
    meta.write(dir)
}

/// Everything needed to resume querying, loaded back from `dir`.
pub struct LoadedIndex {
    pub partitions: Vec<PartitionIndex>,
    pub metadata: Metadata,
}

pub fn load(dir: &Path) -> Result<LoadedIndex> {
    let metadata = Metadata::read(dir)?;
    if metadata.doc_counts.len() != metadata.num_partitions {
        return Err(Error::Corruption(
            "metadata.bin's doc_counts length does not match num_partitions".into(),
        ));
    }

    let has_line_offsets = metadata.file_type != FileType::InMemory;
    let mut partitions = Vec::with_capacity(metadata.num_partitions);
    for partition_id in 0..metadata.num_partitions {
        let num_docs = metadata.doc_counts[partition_id];
        let max_df = metadata.max_df.resolve(num_docs).max(1);
        partitions.push(partition::read_partition(
            dir,
            partition_id,
            num_docs,
            max_df,
            has_line_offsets,
        )?);
    }

    Ok(LoadedIndex { partitions, metadata })
}
