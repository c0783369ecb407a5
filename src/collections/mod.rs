//! Small, purpose-built data structures used by the query executor

pub mod topk;
