//! # tunepress common library
//!
//! Shared code for the tunepress workspace:
//! - Error type and `Result` alias
//! - Configuration loading (CLI → ENV → TOML → compiled default)
//! - Human-readable duration / file size formatting
//! - Stable build-date store for feed "last modified" values

pub mod build_dates;
pub mod config;
pub mod error;
pub mod human_format;

pub use error::{Error, Result};
