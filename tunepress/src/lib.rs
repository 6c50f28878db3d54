//! tunepress library interface
//!
//! Turns audio files into Markdown content records with YAML front-matter.
//! Exposed as a library so the pipeline can be driven from integration
//! tests with a substitute probe.

pub mod cli;
pub mod models;
pub mod services;
pub mod workflow;

pub use models::{AudioFormat, AudioMetadata};
pub use services::{FfprobeProber, MetadataError, Prober};
pub use workflow::{BatchDriver, BatchError, BatchOptions, BatchReport};
