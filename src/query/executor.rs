//! Per-partition BM25 query execution
//!
//! A query is tokenized exactly as ingestion tokenizes documents, mapped to
//! term ids local to the partition, and scored doc by doc. `idf` uses the
//! corpus-wide document count so partitions stay comparable once merged;
//! `tf`/length normalization only ever need this partition's own stats.
//! `config.max_df` is re-resolved against this partition's document count
//! on every query: ordinarily that reproduces ingestion's own eviction
//! threshold exactly (a non-evicted term's `df` is always below it), but a
//! caller-supplied override can tighten it further for this query only,
//! without touching the persisted index.

use ahash::AHashMap;

use crate::config::{BM25Config, IndexConfig};
use crate::error::Result;
use crate::index::partition::PartitionIndex;
use crate::index::tokenizer::tokenize;

/// One scored document within a single partition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredDoc {
    pub doc_id: u64,
    pub score: f32,
}

fn bm25_term_score(tf: u8, idf: f32, doc_size: u16, avg_doc_size: f64, bm25: &BM25Config) -> f32 {
    let tf = tf as f32;
    let doc_size = doc_size as f32;
    let avg_doc_size = avg_doc_size as f32;
    idf * tf / (tf + bm25.k1 * (1.0 - bm25.b + bm25.b * doc_size / avg_doc_size))
}

/// Score every document in `partition` against `query`, using `global_num_docs`
/// for idf and an optional per-term boost multiplier (matched by tokenized
/// term, applied after the base BM25 contribution).
pub fn query_partition(
    partition: &PartitionIndex,
    query: &str,
    config: &IndexConfig,
    global_num_docs: u64,
    boost_factors: Option<&AHashMap<String, f32>>,
) -> Result<Vec<ScoredDoc>> {
    let tokens = tokenize(query, &config.stop_words);
    if tokens.is_empty() {
        return Ok(Vec::new());
    }

    let query_max_df = config.max_df.resolve(partition.num_docs()).max(1);

    let mut term_ids = Vec::new();
    for token in &tokens {
        let Some(term_id) = partition.term_id(token) else {
            continue;
        };
        if partition.is_evicted(term_id) {
            continue;
        }
        let df = partition.df(term_id);
        if df < config.min_df {
            continue;
        }
        if df >= query_max_df {
            continue;
        }
        term_ids.push((token.clone(), term_id, df));
    }

    if term_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut doc_scores: AHashMap<u64, f32> = AHashMap::new();
    for (token, term_id, df) in term_ids {
        let idf = ((global_num_docs as f64 - df as f64 + 0.5) / (df as f64 + 0.5)).ln() as f32;
        let boost = boost_factors.and_then(|b| b.get(&token)).copied().unwrap_or(1.0);

        for (doc_id, tf) in partition.decode_postings(term_id)? {
            let score = bm25_term_score(
                tf,
                idf,
                partition.doc_size(doc_id),
                partition.avg_doc_size(),
                &config.bm25,
            ) * boost;
            *doc_scores.entry(doc_id).or_insert(0.0) += score;
        }
    }

    Ok(doc_scores
        .into_iter()
        .map(|(doc_id, score)| ScoredDoc { doc_id, score })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexConfig;

    fn empty_stop_words() -> ahash::AHashSet<String> {
        ahash::AHashSet::new()
    }

    fn build_partition(docs: &[&str], config: &IndexConfig) -> PartitionIndex {
        let mut partition = PartitionIndex::new(config, docs.len() as u64);
        for doc in docs {
            partition.add_document(doc, 0, &empty_stop_words());
        }
        partition.finish_ingestion();
        partition
    }

    #[test]
    fn higher_tf_scores_higher_for_the_same_query() {
        let config = IndexConfig::builder("text").build().unwrap();
        // A third, fox-free document keeps FOX's df below the partition's
        // document count, so the default max_df (fraction 1.0) doesn't
        // evict it for appearing in every document that contains it.
        let docs = ["fox fox fox fox", "fox cat dog bird", "nothing relevant here"];
        let partition = build_partition(&docs, &config);

        let results = query_partition(&partition, "fox", &config, 2, None).unwrap();
        let scores: AHashMap<u64, f32> = results.into_iter().map(|s| (s.doc_id, s.score)).collect();
        assert!(scores[&0] > scores[&1]);
    }

    #[test]
    fn empty_query_returns_no_results() {
        let config = IndexConfig::builder("text").build().unwrap();
        let partition = build_partition(&["a b c"], &config);
        let results = query_partition(&partition, "", &config, 1, None).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn terms_below_min_df_are_dropped() {
        let config = IndexConfig::builder("text").min_df(2).build().unwrap();
        let partition = build_partition(&["rare word", "other stuff"], &config);
        let results = query_partition(&partition, "rare", &config, 2, None).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn boost_factor_multiplies_term_contribution() {
        let config = IndexConfig::builder("text").build().unwrap();
        let partition = build_partition(&["alpha beta", "beta only"], &config);

        let baseline = query_partition(&partition, "alpha", &config, 2, None).unwrap();
        let mut boosts = AHashMap::new();
        boosts.insert("ALPHA".to_string(), 3.0);
        let boosted = query_partition(&partition, "alpha", &config, 2, Some(&boosts)).unwrap();

        assert!(boosted[0].score > baseline[0].score);
    }

    #[test]
    fn unknown_query_terms_yield_no_results() {
        let config = IndexConfig::builder("text").build().unwrap();
        let partition = build_partition(&["alpha beta"], &config);
        let results = query_partition(&partition, "zzz", &config, 1, None).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn tight_max_df_override_drops_a_term_ingestion_let_through() {
        // ALPHA has df=2 over 3 docs; the default max_df (fraction 1.0)
        // resolves to 3, so ingestion never evicts it.
        let config = IndexConfig::builder("text").build().unwrap();
        let partition = build_partition(&["alpha one", "alpha two", "three only"], &config);

        let baseline = query_partition(&partition, "alpha", &config, 3, None).unwrap();
        assert_eq!(baseline.len(), 2);

        let mut tight = config.clone();
        tight.max_df = crate::config::MaxDf::Absolute(1);
        let filtered = query_partition(&partition, "alpha", &tight, 3, None).unwrap();
        assert!(filtered.is_empty());
    }
}
