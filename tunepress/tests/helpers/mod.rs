//! Test helper utilities
//!
//! Shared fixtures for tunepress integration tests

#![allow(dead_code)]

pub mod fake_prober;
pub mod fixtures;

pub use fake_prober::FakeProber;
pub use fixtures::{
    backdate, flac_probe_json, read_record, set_mtime, test_driver, write_audio_file,
};
