//! Most-recently-used prompt history

use serde::{Deserialize, Serialize};

/// Previously submitted prompts, most recent first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptHistory {
    /// Stored prompts, newest at index 0
    pub prompts: Vec<String>,

    /// Oldest entries are dropped beyond this
    pub max_entries: usize,
}

impl Default for PromptHistory {
    fn default() -> Self {
        Self {
            prompts: Vec::new(),
            max_entries: 100,
        }
    }
}

impl PromptHistory {
    pub fn new(max_entries: usize) -> Self {
        Self {
            prompts: Vec::new(),
            max_entries,
        }
    }

    /// Move `prompt` to the front, removing any earlier copy.
    /// Blank prompts are ignored. Returns whether anything was recorded.
    pub fn record(&mut self, prompt: &str) -> bool {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return false;
        }

        self.prompts.retain(|p| p != prompt);
        self.prompts.insert(0, prompt.to_string());
        self.prompts.truncate(self.max_entries.max(1));
        true
    }

    /// Case-insensitive substring match, in MRU order. A blank query matches everything.
    pub fn filter(&self, query: &str) -> Vec<&str> {
        let query = query.trim().to_lowercase();
        self.prompts
            .iter()
            .filter(|p| query.is_empty() || p.to_lowercase().contains(&query))
            .map(String::as_str)
            .collect()
    }

    pub fn remove(&mut self, prompt: &str) -> bool {
        let before = self.prompts.len();
        self.prompts.retain(|p| p != prompt.trim());
        self.prompts.len() != before
    }

    pub fn clear(&mut self) {
        self.prompts.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.prompts.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}
