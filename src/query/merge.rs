//! Cross-partition fan-out and top-k merge
//!
//! Each partition is queried independently and in parallel; results carry
//! the partition id so the merge step and row reconstruction can find the
//! right partition again. The per-partition top-k lists are merged through
//! one global bounded heap rather than concatenated and fully sorted.

use ahash::AHashMap;

use crate::collections::topk::TopK;
use crate::config::IndexConfig;
use crate::error::Result;
use crate::index::partition::PartitionIndex;
use crate::query::executor::query_partition;

/// A single ranked result: which partition it came from, its local doc id,
/// and its BM25 score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryHit {
    pub partition_id: usize,
    pub doc_id: u64,
    pub score: f32,
}

/// Query every partition concurrently and merge into one global top-`k`.
pub fn query_all(
    partitions: &[PartitionIndex],
    query: &str,
    k: usize,
    config: &IndexConfig,
    global_num_docs: u64,
    boost_factors: Option<&AHashMap<String, f32>>,
) -> Result<Vec<QueryHit>> {
    let per_partition: Vec<Result<Vec<(u64, f32)>>> = std::thread::scope(|scope| {
        let handles: Vec<_> = partitions
            .iter()
            .map(|partition| {
                scope.spawn(move || {
                    query_partition(partition, query, config, global_num_docs, boost_factors)
                        .map(|hits| hits.into_iter().map(|h| (h.doc_id, h.score)).collect())
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().expect("query worker panicked")).collect()
    });

    let mut merged: TopK<(usize, u64)> = TopK::new(k);
    for (partition_id, hits) in per_partition.into_iter().enumerate() {
        for (doc_id, score) in hits? {
            merged.push(score, (partition_id, doc_id));
        }
    }

    Ok(merged
        .into_sorted_vec()
        .into_iter()
        .map(|(score, (partition_id, doc_id))| QueryHit {
            partition_id,
            doc_id,
            score,
        })
        .collect())
}
