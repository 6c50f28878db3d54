//! Batch workflow
//!
//! Drives the per-file pipeline sequentially:
//! Detect → Extract → ReadExisting → CheckStale → Skip | MergeEmit.
//! Each file fully completes or fails before the next one starts.

pub mod batch;

pub use batch::{BatchDriver, BatchError, BatchOptions, BatchPlan, BatchReport, FileFailure};
