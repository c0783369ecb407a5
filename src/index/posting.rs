//! Per-partition posting list store
//!
//! Each term's posting is a vbyte-delta-coded doc-id stream plus an
//! RLE-coded term-frequency stream. Scratch state needed only during
//! ingestion (the doc id a term was last seen at, and its in-progress
//! frequency for the document currently being built) lives alongside the
//! postings and is dropped once ingestion finishes.

use crate::codec::{rle, vbyte};
use crate::error::Result;

/// One term's compressed postings.
#[derive(Debug, Clone, Default)]
pub struct Posting {
    /// vbyte-encoded deltas between consecutive doc ids (ascending).
    doc_id_deltas: Vec<u8>,
    /// Document frequency: number of distinct documents containing the
    /// term. Kept as an explicit O(1) counter alongside the RLE sequence,
    /// equivalent to (and always consistent with) the sum of
    /// `term_freqs` repeat counts once a document's run has been flushed.
    df: u64,
    /// One run per document, in doc-id order; repeat-count sums to `df`.
    term_freqs: Vec<rle::Run>,
    /// Set once `df` reaches the high-df eviction threshold. `doc_id_deltas`
    /// and `term_freqs` are cleared and never touched again; the term stays
    /// resolvable to this id but is invisible to queries.
    evicted: bool,
}

impl Posting {
    pub fn df(&self) -> u64 {
        self.df
    }

    pub fn is_evicted(&self) -> bool {
        self.evicted
    }

    /// Decode the full `(doc_id, tf)` stream in ascending doc-id order.
    pub fn decode(&self) -> Result<Vec<(u64, u8)>> {
        if self.evicted {
            return Ok(Vec::new());
        }
        let doc_ids = vbyte::decode_vec(&self.doc_id_deltas, self.df as usize)?;
        let tfs = rle::decode(&self.term_freqs);
        let mut out = Vec::with_capacity(doc_ids.len());
        let mut running = 0u64;
        for (i, delta) in doc_ids.into_iter().enumerate() {
            running += delta;
            out.push((running, tfs[i]));
        }
        Ok(out)
    }

    /// Encode into the on-disk layout: `[vbyte(df)][vbyte(delta)...]`.
    pub fn encode_doc_ids(&self) -> Vec<u8> {
        let mut out = vbyte::encode(self.df);
        out.extend_from_slice(&self.doc_id_deltas);
        out
    }

    pub fn term_freqs_bytes(&self) -> Vec<u8> {
        rle::serialize(&self.term_freqs)
    }

    /// Rebuilt straight from an encoded `[vbyte(df)][deltas...]` buffer plus
    /// its term-frequency run bytes, as read back from disk.
    pub fn decode_from_disk(doc_ids_buf: &[u8], term_freqs_buf: &[u8]) -> Result<Self> {
        let (df, consumed) = vbyte::decode(doc_ids_buf)?;
        let deltas = doc_ids_buf[consumed..].to_vec();
        let term_freqs = rle::deserialize(term_freqs_buf)?;
        // A non-evicted posting always has at least one delta byte once df >= 1
        // (even `vbyte::encode(0)` is one byte); eviction is the only thing that
        // clears the delta buffer while leaving df in place.
        let evicted = deltas.is_empty();
        Ok(Self {
            doc_id_deltas: deltas,
            df,
            term_freqs,
            evicted,
        })
    }
}

/// Per-partition store of every term's posting, plus ingestion scratch
/// state. `prev_doc_id`/`pending_tf` are parallel to `postings` (indexed by
/// term id) and are freed by [`PostingListStore::finish_ingestion`].
pub struct PostingListStore {
    postings: Vec<Posting>,
    scratch: Option<Scratch>,
}

struct Scratch {
    /// Doc id at which each term was last touched (creation or append).
    prev_doc_id: Vec<u64>,
    /// In-progress term frequency for the document currently being built.
    pending_tf: Vec<u8>,
}

impl Default for PostingListStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PostingListStore {
    pub fn new() -> Self {
        Self {
            postings: Vec::new(),
            scratch: Some(Scratch {
                prev_doc_id: Vec::new(),
                pending_tf: Vec::new(),
            }),
        }
    }

    /// Rebuild directly from already-decoded postings, as read back from
    /// disk. There is no ingestion left to do, so no scratch state.
    pub fn from_postings(postings: Vec<Posting>) -> Self {
        Self {
            postings,
            scratch: None,
        }
    }

    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    pub fn get(&self, term_id: u32) -> &Posting {
        &self.postings[term_id as usize]
    }

    pub fn is_evicted(&self, term_id: u32) -> bool {
        self.postings[term_id as usize].evicted
    }

    fn scratch_mut(&mut self) -> &mut Scratch {
        self.scratch.as_mut().expect("ingestion already finished")
    }

    /// Allocate a new term id and record its first-ever occurrence:
    /// `df = 1`, a single delta equal to `doc_id` (implicitly relative to
    /// 0), pending tf = 1. Returns the new term id and whether it was
    /// evicted on the spot (only possible with a pathological `max_df <= 1`).
    pub fn new_term(&mut self, doc_id: u64, max_df: u64) -> (u32, bool) {
        let term_id = self.postings.len() as u32;
        let mut posting = Posting {
            doc_id_deltas: vbyte::encode(doc_id),
            df: 1,
            term_freqs: Vec::new(),
            evicted: false,
        };
        let evicted_now = posting.df >= max_df;
        if evicted_now {
            posting.doc_id_deltas.clear();
            posting.evicted = true;
        }
        self.postings.push(posting);

        let scratch = self.scratch_mut();
        scratch.prev_doc_id.push(doc_id);
        scratch.pending_tf.push(1);

        (term_id, evicted_now)
    }

    /// This doc id equals the last doc id this (non-evicted) term was
    /// touched at, i.e. a repeat occurrence within the same document.
    pub fn is_repeat_in_current_doc(&self, term_id: u32, doc_id: u64) -> bool {
        self.scratch
            .as_ref()
            .expect("ingestion already finished")
            .prev_doc_id[term_id as usize]
            == doc_id
    }

    /// Bump the current document's pending term frequency, saturating at
    /// 255 (further occurrences beyond that are simply ignored).
    pub fn bump_pending_tf(&mut self, term_id: u32) {
        let tf = &mut self.scratch_mut().pending_tf[term_id as usize];
        if *tf < 255 {
            *tf += 1;
        }
    }

    /// First occurrence of an already-known, non-evicted term in a new
    /// document: append the doc-id delta, bump `df`, reset pending tf to 1.
    /// Returns whether the term just crossed the high-df eviction
    /// threshold.
    pub fn append_new_occurrence(&mut self, term_id: u32, doc_id: u64, max_df: u64) -> bool {
        let prev = self.scratch_mut().prev_doc_id[term_id as usize];
        let delta = doc_id - prev;
        let posting = &mut self.postings[term_id as usize];
        vbyte::encode_into(delta, &mut posting.doc_id_deltas);
        posting.df += 1;

        let scratch = self.scratch_mut();
        scratch.prev_doc_id[term_id as usize] = doc_id;
        scratch.pending_tf[term_id as usize] = 1;

        let posting = &mut self.postings[term_id as usize];
        if posting.df >= max_df {
            posting.doc_id_deltas.clear();
            posting.doc_id_deltas.shrink_to_fit();
            posting.evicted = true;
            true
        } else {
            false
        }
    }

    /// Flush the current document's pending tf for `term_id` into its RLE
    /// run sequence. No-op for already-evicted terms.
    pub fn flush_pending_tf(&mut self, term_id: u32) {
        if self.postings[term_id as usize].evicted {
            return;
        }
        let tf = self.scratch_mut().pending_tf[term_id as usize];
        rle::push(&mut self.postings[term_id as usize].term_freqs, tf);
    }

    /// Drop ingestion-only scratch state. Called once per partition after
    /// its corpus slice has been fully processed.
    pub fn finish_ingestion(&mut self) {
        self.scratch = None;
    }

    pub fn iter(&self) -> impl Iterator<Item = &Posting> {
        self.postings.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_term_then_repeat_then_new_doc() {
        let mut store = PostingListStore::new();
        let (t, evicted) = store.new_term(0, 1000);
        assert!(!evicted);
        assert!(store.is_repeat_in_current_doc(t, 0));
        store.bump_pending_tf(t); // second occurrence, same doc
        store.flush_pending_tf(t); // end of doc 0: tf=2

        assert!(!store.is_repeat_in_current_doc(t, 1));
        store.append_new_occurrence(t, 1, 1000);
        store.flush_pending_tf(t); // end of doc 1: tf=1

        store.finish_ingestion();
        let decoded = store.get(t).decode().unwrap();
        assert_eq!(decoded, vec![(0, 2), (1, 1)]);
        assert_eq!(store.get(t).df(), 2);
    }

    #[test]
    fn tf_saturates_at_255() {
        let mut store = PostingListStore::new();
        let (t, _) = store.new_term(0, 1000);
        for _ in 0..400 {
            store.bump_pending_tf(t);
        }
        store.flush_pending_tf(t);
        store.finish_ingestion();
        let decoded = store.get(t).decode().unwrap();
        assert_eq!(decoded[0].1, 255);
    }

    #[test]
    fn evicts_once_df_reaches_max_df() {
        let mut store = PostingListStore::new();
        let (t, evicted0) = store.new_term(0, 3);
        assert!(!evicted0);
        store.flush_pending_tf(t);

        let evicted1 = store.append_new_occurrence(t, 1, 3);
        assert!(!evicted1);
        store.flush_pending_tf(t);

        let evicted2 = store.append_new_occurrence(t, 2, 3);
        assert!(evicted2);
        assert!(store.is_evicted(t));
    }

    #[test]
    fn doc_ids_are_strictly_increasing_after_decode() {
        let mut store = PostingListStore::new();
        let (t, _) = store.new_term(5, 1000);
        store.flush_pending_tf(t);
        store.append_new_occurrence(t, 9, 1000);
        store.flush_pending_tf(t);
        store.append_new_occurrence(t, 20, 1000);
        store.flush_pending_tf(t);
        store.finish_ingestion();

        let decoded = store.get(t).decode().unwrap();
        let ids: Vec<u64> = decoded.iter().map(|(id, _)| *id).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn evicted_posting_round_trips_as_evicted() {
        let mut store = PostingListStore::new();
        let (t, _) = store.new_term(0, 2);
        store.flush_pending_tf(t);
        let evicted = store.append_new_occurrence(t, 1, 2);
        assert!(evicted);
        store.finish_ingestion();

        let posting = store.get(t);
        assert!(posting.is_evicted());
        let doc_ids_buf = posting.encode_doc_ids();
        let tf_buf = posting.term_freqs_bytes();
        let reloaded = Posting::decode_from_disk(&doc_ids_buf, &tf_buf).unwrap();
        assert!(reloaded.is_evicted());
        assert_eq!(reloaded.df(), posting.df());
        assert!(reloaded.decode().unwrap().is_empty());
    }

    #[test]
    fn round_trips_through_disk_encoding() {
        let mut store = PostingListStore::new();
        let (t, _) = store.new_term(2, 1000);
        store.flush_pending_tf(t);
        store.append_new_occurrence(t, 7, 1000);
        store.bump_pending_tf(t);
        store.flush_pending_tf(t);
        store.finish_ingestion();

        let posting = store.get(t);
        let doc_ids_buf = posting.encode_doc_ids();
        let tf_buf = posting.term_freqs_bytes();
        let reloaded = Posting::decode_from_disk(&doc_ids_buf, &tf_buf).unwrap();
        assert_eq!(reloaded.decode().unwrap(), posting.decode().unwrap());
        assert_eq!(reloaded.df(), posting.df());
    }
}
