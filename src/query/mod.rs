//! Query execution: per-partition scoring, cross-partition merge, and row
//! reconstruction

pub mod executor;
pub mod merge;
pub mod reconstruct;

pub use merge::{query_all, QueryHit};
