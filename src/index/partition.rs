//! A single partition's index: term dictionary, postings, and per-document
//! bookkeeping
//!
//! Doc ids and term ids are local to the partition; the coordinator never
//! renumbers them. Cross-partition results are merged by score alone.

use ahash::AHashMap;

use crate::config::IndexConfig;
use crate::error::Result;
use crate::index::posting::PostingListStore;
use crate::index::tokenizer::tokenize_raw;

/// One partition's worth of indexed documents.
pub struct PartitionIndex {
    term_to_id: AHashMap<String, u32>,
    postings: PostingListStore,
    /// Token count per document, saturating at `u16::MAX`.
    doc_sizes: Vec<u16>,
    /// Byte offset of each document's raw record in the source file.
    /// Empty for in-memory corpora (there is nothing to seek back to).
    line_offsets: Vec<u64>,
    num_docs: u64,
    avg_doc_size: f64,
    max_df: u64,
    /// Debug-only reverse lookup from term id back to its string, useful
    /// when inspecting a built index interactively; never read by the
    /// query path.
    #[cfg(debug_assertions)]
    id_to_term: Vec<String>,
}

impl PartitionIndex {
    /// `expected_docs` is this partition's document count, known ahead of
    /// time from the byte-range scan that found its boundaries; `max_df` is
    /// resolved against it up front so every term in this partition shares
    /// one absolute cutoff.
    pub fn new(config: &IndexConfig, expected_docs: u64) -> Self {
        Self {
            term_to_id: AHashMap::new(),
            postings: PostingListStore::new(),
            doc_sizes: Vec::new(),
            line_offsets: Vec::new(),
            num_docs: 0,
            avg_doc_size: 0.0,
            max_df: config.max_df.resolve(expected_docs).max(1),
            #[cfg(debug_assertions)]
            id_to_term: Vec::new(),
        }
    }

    /// Index one document's already-extracted search field. `line_offset`
    /// is the byte offset of the source record, used later to reconstruct
    /// the row at query time; pass 0 for in-memory corpora.
    ///
    /// `doc_size` counts every whitespace-delimited token, stop words
    /// included — a stop word still occupies a position in the document,
    /// it just never enters the postings.
    pub fn add_document(
        &mut self,
        field: &str,
        line_offset: u64,
        stop_words: &ahash::AHashSet<String>,
    ) {
        let doc_id = self.num_docs;
        let tokens = tokenize_raw(field);
        let mut touched_this_doc: Vec<u32> = Vec::new();

        for token in &tokens {
            if stop_words.contains(token) {
                continue;
            }
            let term_id = match self.term_to_id.get(token) {
                Some(&id) => id,
                None => {
                    let (id, _evicted) = self.postings.new_term(doc_id, self.max_df);
                    self.term_to_id.insert(token.clone(), id);
                    #[cfg(debug_assertions)]
                    self.id_to_term.push(token.clone());
                    touched_this_doc.push(id);
                    continue;
                }
            };

            if self.postings.is_evicted(term_id) {
                continue;
            }
            if self.postings.is_repeat_in_current_doc(term_id, doc_id) {
                self.postings.bump_pending_tf(term_id);
            } else {
                self.postings.append_new_occurrence(term_id, doc_id, self.max_df);
                touched_this_doc.push(term_id);
            }
        }

        for term_id in touched_this_doc {
            self.postings.flush_pending_tf(term_id);
        }

        self.doc_sizes.push(tokens.len().min(u16::MAX as usize) as u16);
        self.line_offsets.push(line_offset);
        self.num_docs += 1;
    }

    /// Finalize after the last document: freezes ingestion scratch state and
    /// computes the partition's average document size.
    pub fn finish_ingestion(&mut self) {
        self.postings.finish_ingestion();
        self.avg_doc_size = if self.num_docs == 0 {
            0.0
        } else {
            self.doc_sizes.iter().map(|&s| s as f64).sum::<f64>() / self.num_docs as f64
        };
    }

    pub fn num_docs(&self) -> u64 {
        self.num_docs
    }

    pub fn avg_doc_size(&self) -> f64 {
        self.avg_doc_size
    }

    pub fn doc_size(&self, doc_id: u64) -> u16 {
        self.doc_sizes[doc_id as usize]
    }

    pub fn line_offset(&self, doc_id: u64) -> u64 {
        self.line_offsets[doc_id as usize]
    }

    pub fn term_id(&self, term: &str) -> Option<u32> {
        self.term_to_id.get(term).copied()
    }

    pub fn df(&self, term_id: u32) -> u64 {
        self.postings.get(term_id).df()
    }

    pub fn is_evicted(&self, term_id: u32) -> bool {
        self.postings.is_evicted(term_id)
    }

    pub fn decode_postings(&self, term_id: u32) -> Result<Vec<(u64, u8)>> {
        self.postings.get(term_id).decode()
    }

    pub fn num_terms(&self) -> usize {
        self.postings.len()
    }

    #[cfg(debug_assertions)]
    pub fn term_by_id(&self, term_id: u32) -> Option<&str> {
        self.id_to_term.get(term_id as usize).map(|s| s.as_str())
    }

    pub fn postings(&self) -> &PostingListStore {
        &self.postings
    }

    pub fn doc_sizes(&self) -> &[u16] {
        &self.doc_sizes
    }

    pub fn line_offsets(&self) -> &[u64] {
        &self.line_offsets
    }

    pub fn term_to_id(&self) -> &AHashMap<String, u32> {
        &self.term_to_id
    }

    /// Rebuild a frozen partition straight from its persisted parts: no
    /// ingestion scratch state is needed since nothing further is indexed.
    pub fn from_persisted(
        term_to_id: AHashMap<String, u32>,
        postings: PostingListStore,
        doc_sizes: Vec<u16>,
        line_offsets: Vec<u64>,
        max_df: u64,
    ) -> Self {
        let num_docs = doc_sizes.len() as u64;
        let avg_doc_size = if num_docs == 0 {
            0.0
        } else {
            doc_sizes.iter().map(|&s| s as f64).sum::<f64>() / num_docs as f64
        };
        Self {
            term_to_id,
            postings,
            doc_sizes,
            line_offsets,
            num_docs,
            avg_doc_size,
            max_df,
            #[cfg(debug_assertions)]
            id_to_term: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexConfig;

    fn empty_stop_words() -> ahash::AHashSet<String> {
        ahash::AHashSet::new()
    }

    #[test]
    fn doc_sizes_and_line_offsets_track_num_docs() {
        let config = IndexConfig::builder("text").build().unwrap();
        let mut part = PartitionIndex::new(&config, 3);
        part.add_document("the quick fox", 0, &empty_stop_words());
        part.add_document("the lazy dog", 10, &empty_stop_words());
        part.finish_ingestion();

        assert_eq!(part.num_docs(), 2);
        assert_eq!(part.doc_sizes().len(), 2);
        assert_eq!(part.line_offsets(), &[0, 10]);
    }

    #[test]
    fn repeated_term_within_one_document_raises_tf_not_df() {
        let config = IndexConfig::builder("text").build().unwrap();
        let mut part = PartitionIndex::new(&config, 1);
        part.add_document("fox fox fox", 0, &empty_stop_words());
        part.finish_ingestion();

        let term_id = part.term_id("FOX").unwrap();
        assert_eq!(part.df(term_id), 1);
        let decoded = part.decode_postings(term_id).unwrap();
        assert_eq!(decoded, vec![(0, 3)]);
    }

    #[test]
    fn term_touching_every_document_gets_evicted() {
        let config = IndexConfig::builder("text")
            .max_df(crate::config::MaxDf::Fraction(1.0))
            .build()
            .unwrap();
        let mut part = PartitionIndex::new(&config, 3);
        part.add_document("common a", 0, &empty_stop_words());
        part.add_document("common b", 0, &empty_stop_words());
        part.add_document("common c", 0, &empty_stop_words());
        part.finish_ingestion();

        let term_id = part.term_id("COMMON").unwrap();
        assert!(part.is_evicted(term_id));
        assert!(part.decode_postings(term_id).unwrap().is_empty());
    }

    #[test]
    fn zero_token_document_still_counts_toward_num_docs() {
        let config = IndexConfig::builder("text").build().unwrap();
        let mut part = PartitionIndex::new(&config, 1);
        part.add_document("", 0, &empty_stop_words());
        part.finish_ingestion();
        assert_eq!(part.num_docs(), 1);
        assert_eq!(part.doc_size(0), 0);
    }

    #[test]
    fn stop_words_count_toward_doc_size_but_not_postings() {
        let config = IndexConfig::builder("text")
            .stop_words(["THE"])
            .build()
            .unwrap();
        let stop_words = config.stop_words.clone();
        let mut part = PartitionIndex::new(&config, 1);
        part.add_document("the quick fox", 0, &stop_words);
        part.finish_ingestion();

        // THE, QUICK, FOX: 3 tokens total, even though THE is a stop word.
        assert_eq!(part.doc_size(0), 3);
        assert!(part.term_id("THE").is_none());
        assert!(part.term_id("QUICK").is_some());
    }
}
