//! Persisted content record (front-matter) types

use serde::Serialize;
use std::collections::BTreeMap;

/// Front-matter written at the top of every generated record
///
/// Field order here is the order keys appear in the file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontMatter {
    pub title: String,
    pub artist: String,
    pub album: String,
    /// Strict `YYYY-MM-DD`
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_date: Option<String>,
    pub genre: Vec<String>,
    /// Whole seconds
    pub duration: u64,
    pub file_size: u64,
    pub filename: String,
    pub tags: Vec<String>,
    pub layout: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub composer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performer: Option<String>,
    pub description: String,
    pub technical: TechnicalInfo,
}

/// `technical:` block of the front-matter
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalInfo {
    pub sample_rate: u32,
    pub bit_depth: Option<u32>,
    pub channels: String,
    pub format: String,
    pub mime_type: String,
    pub bitrate: u64,
}

/// The parts of an existing record the merger cares about
///
/// Everything else the front-matter contained lands in `extra`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExistingFrontMatter {
    pub date: Option<String>,
    pub publish_date: Option<String>,
    pub created_date: Option<String>,
    pub description: Option<String>,
    pub extra: BTreeMap<String, serde_yml::Value>,
}

impl ExistingFrontMatter {
    /// Split a parsed front-matter mapping into named fields and the rest
    pub fn from_fields(mut fields: BTreeMap<String, serde_yml::Value>) -> Self {
        let mut take = |key: &str| fields.remove(key).as_ref().and_then(scalar_to_string);

        let date = take("date");
        let publish_date = take("publishDate");
        let created_date = take("createdDate");
        let description = take("description");

        Self {
            date,
            publish_date,
            created_date,
            description,
            extra: fields,
        }
    }
}

/// Render a YAML scalar as text; sequences, mappings and null yield `None`
fn scalar_to_string(value: &serde_yml::Value) -> Option<String> {
    match value {
        serde_yml::Value::String(s) => Some(s.clone()),
        serde_yml::Value::Number(n) => Some(n.to_string()),
        serde_yml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
