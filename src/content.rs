//! Static label-to-content registry and the capped, filtered resolver.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::warn;
use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// At most this many items of each kind are surfaced per label.
pub const MAX_ITEMS_PER_KIND: usize = 3;

/// Curated references for one label, as configured. Lists are stored raw;
/// filtering and capping happen at resolve time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentEntry {
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub texts: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub images: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub videos: Vec<String>,
}

/// Accepts a JSON array with arbitrary item types and keeps only the
/// strings. Registry files are hand-curated; a stray number or null in a
/// list should not reject the whole registry.
fn lenient_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values: Vec<Value> = Vec::deserialize(deserializer)?;
    Ok(values
        .into_iter()
        .filter_map(|v| match v {
            Value::String(s) => Some(s),
            _ => None,
        })
        .collect())
}

/// Content actually handed to the presentation layer: each list filtered of
/// blank entries, order preserved, capped at [`MAX_ITEMS_PER_KIND`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedContent {
    pub texts: Vec<String>,
    pub images: Vec<String>,
    pub videos: Vec<String>,
}

impl ResolvedContent {
    /// True when all three kinds are empty — the caller shows a
    /// "no content yet" state instead of an error.
    pub fn is_empty(&self) -> bool {
        self.texts.is_empty() && self.images.is_empty() && self.videos.is_empty()
    }
}

/// Immutable mapping from label to [`ContentEntry`], defined once at process
/// start. Labels without an entry resolve to empty content rather than an
/// error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentRegistry {
    entries: HashMap<String, ContentEntry>,
}

impl ContentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a registry from a JSON object keyed by label.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Loads a registry from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Ok(Self::from_json_str(&text)?)
    }

    /// Adds or replaces the entry for a label. Intended for code-level
    /// registries built at startup.
    pub fn insert(&mut self, label: impl Into<String>, entry: ContentEntry) {
        self.entries.insert(label.into(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Checks the registry keys against the model vocabulary, logging and
    /// returning the keys no label will ever select. A mismatch is a
    /// configuration smell, not an error.
    pub fn validate_against(&self, labels: &[String]) -> Vec<String> {
        let mut unknown: Vec<String> = self
            .entries
            .keys()
            .filter(|key| !labels.contains(key))
            .cloned()
            .collect();
        unknown.sort();
        for key in &unknown {
            warn!("Content registry entry '{}' matches no model label", key);
        }
        unknown
    }

    /// Resolves the content to display for a label.
    ///
    /// A label absent from the registry yields all-empty lists. Each present
    /// list is filtered of entries that are empty after trimming, keeps its
    /// original order, and is truncated to the first [`MAX_ITEMS_PER_KIND`]
    /// items.
    pub fn resolve(&self, label: &str) -> ResolvedContent {
        match self.entries.get(label) {
            None => ResolvedContent::default(),
            Some(entry) => ResolvedContent {
                texts: pick_top(&entry.texts),
                images: pick_top(&entry.images),
                videos: pick_top(&entry.videos),
            },
        }
    }
}

fn pick_top(values: &[String]) -> Vec<String> {
    values
        .iter()
        .filter(|s| !s.trim().is_empty())
        .take(MAX_ITEMS_PER_KIND)
        .cloned()
        .collect()
}
