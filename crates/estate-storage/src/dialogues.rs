//! Scripted dialogue loader.
//!
//! Format: dialogues separated by a line of `=` characters, each line inside a
//! dialogue is `H: utterance` or `B: utterance`.

use std::path::Path;

use tracing::{debug, info, warn};

use estate_core::error::Result;
use estate_core::types::{Dialogue, Speaker, Turn};

/// Minimum run of `=` that separates two dialogues.
const SEPARATOR_MIN_LEN: usize = 3;

/// All scripted dialogues, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DialogueScript {
    dialogues: Vec<Dialogue>,
}

impl DialogueScript {
    pub fn new(dialogues: Vec<Dialogue>) -> Self {
        Self {
            dialogues: dialogues.into_iter().filter(|d| !d.is_empty()).collect(),
        }
    }

    /// Parse the plain-text script.
    pub fn parse(content: &str) -> Self {
        let mut dialogues = Vec::new();
        let mut current: Vec<Turn> = Vec::new();

        for (lineno, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if is_separator(line) {
                if !current.is_empty() {
                    dialogues.push(Dialogue::new(std::mem::take(&mut current)));
                }
                continue;
            }
            let Some((tag, utterance)) = line.split_once(':') else {
                continue;
            };
            match Speaker::from_tag(tag) {
                Some(speaker) => current.push(Turn {
                    speaker,
                    utterance: utterance.trim().to_string(),
                }),
                None => debug!(line = lineno + 1, tag = %tag.trim(), "Unknown speaker tag ignored"),
            }
        }
        if !current.is_empty() {
            dialogues.push(Dialogue::new(current));
        }

        Self { dialogues }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let script = Self::parse(&content);
        info!(
            path = %path.display(),
            dialogues = script.len(),
            "Dialogue script loaded"
        );
        Ok(script)
    }

    /// Load the script, degrading to no dialogues on any error.
    pub fn load_or_empty(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "Failed to load dialogues, using none");
            Self::default()
        })
    }

    pub fn dialogues(&self) -> &[Dialogue] {
        &self.dialogues
    }

    pub fn len(&self) -> usize {
        self.dialogues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dialogues.is_empty()
    }
}

fn is_separator(line: &str) -> bool {
    line.len() >= SEPARATOR_MIN_LEN && line.chars().all(|c| c == '=')
}
