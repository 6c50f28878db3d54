//! Data models for the content sync pipeline

pub mod audio_metadata;
pub mod content_record;

pub use audio_metadata::{AudioFormat, AudioMetadata};
pub use content_record::{ExistingFrontMatter, FrontMatter, TechnicalInfo};
