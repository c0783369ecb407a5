//! Terminal progress reporting for long-running ingestion
//!
//! Each partition worker reports into the same bar; the only shared state
//! is the bar itself, guarded by a short-lived lock so contention never
//! shows up in profiles.

use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::Mutex;

/// A progress bar safe to share across partition worker threads.
#[derive(Clone)]
pub struct SharedProgress {
    bar: Arc<Mutex<ProgressBar>>,
}

impl SharedProgress {
    pub fn new(total_docs: u64) -> Self {
        let bar = ProgressBar::new(total_docs);
        bar.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} docs ({per_sec})")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self {
            bar: Arc::new(Mutex::new(bar)),
        }
    }

    /// A progress instance that renders nothing, for library callers that
    /// don't want terminal output (e.g. the test suite).
    pub fn hidden() -> Self {
        Self {
            bar: Arc::new(Mutex::new(ProgressBar::hidden())),
        }
    }

    pub fn inc(&self, delta: u64) {
        self.bar.lock().inc(delta);
    }

    pub fn finish(&self) {
        self.bar.lock().finish_and_clear();
    }
}
