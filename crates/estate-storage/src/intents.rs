//! Intent table: intent name to trigger phrases, in file order.

use std::path::Path;

use serde_json::{Map, Value};
use tracing::{info, warn};

use estate_core::error::{EstateError, Result};

/// One intent and the phrases that trigger it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentEntry {
    pub name: String,
    /// Lower-cased, trimmed, non-empty phrases.
    pub triggers: Vec<String>,
}

/// Read-only mapping of intent names to trigger phrases.
///
/// Iteration order is the order of the keys in the source file, which is the
/// priority order used by the classifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntentTable {
    entries: Vec<IntentEntry>,
}

impl IntentTable {
    /// Build a table from `(name, phrases)` pairs, applying the same
    /// normalization as the file loader. Later duplicates of a name are merged
    /// into the first occurrence.
    pub fn from_pairs<I, N, P, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, P)>,
        N: Into<String>,
        P: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut entries: Vec<IntentEntry> = Vec::new();
        for (name, phrases) in pairs {
            let name = name.into();
            let triggers = normalize_phrases(&name, phrases);
            match entries.iter_mut().find(|e| e.name == name) {
                Some(existing) => existing.triggers.extend(triggers),
                None => entries.push(IntentEntry { name, triggers }),
            }
        }
        Self { entries }
    }

    /// Parse the JSON object form `{"intent": ["phrase", ...], ...}`.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let object: Map<String, Value> = serde_json::from_str(content)
            .map_err(|e| EstateError::Dataset(format!("invalid intent table: {}", e)))?;

        let mut pairs: Vec<(String, Vec<String>)> = Vec::with_capacity(object.len());
        for (name, value) in object {
            let Value::Array(items) = value else {
                warn!(intent = %name, "Intent value is not an array, skipping");
                continue;
            };
            let phrases = items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    other => {
                        warn!(intent = %name, value = %other, "Non-string trigger phrase skipped");
                        None
                    }
                })
                .collect();
            pairs.push((name, phrases));
        }

        Ok(Self::from_pairs(pairs))
    }

    /// Load the table from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let table = Self::from_json_str(&content)?;
        info!(
            path = %path.display(),
            intents = table.len(),
            "Intent table loaded"
        );
        Ok(table)
    }

    /// Load the table, degrading to an empty table on any error.
    pub fn load_or_empty(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "Failed to load intents, using empty table");
            Self::default()
        })
    }

    pub fn entries(&self) -> &[IntentEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn normalize_phrases<P, S>(intent: &str, phrases: P) -> Vec<String>
where
    P: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    phrases
        .into_iter()
        .filter_map(|p| {
            let phrase = p.as_ref().trim().to_lowercase();
            if phrase.is_empty() {
                // An empty phrase is a substring of every message.
                warn!(intent = %intent, "Empty trigger phrase dropped");
                None
            } else {
                Some(phrase)
            }
        })
        .collect()
}
