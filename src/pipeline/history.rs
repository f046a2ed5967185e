use serde::{Deserialize, Serialize};
use std::fmt;

const SPROUT_MARKER: &str = "<SPROUT>";

/// One stage a work item has passed through.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryEntry {
    pub key: String,
    /// Set when the item was created as a child of another item at `key`.
    pub sprout: bool,
}

impl HistoryEntry {
    pub fn transform(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            sprout: false,
        }
    }

    pub fn sprout(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            sprout: true,
        }
    }
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sprout {
            write!(f, "{}{}", SPROUT_MARKER, self.key)
        } else {
            f.write_str(&self.key)
        }
    }
}

/// Append-only audit trail of processing stages.
///
/// Entries are only ever added at the end. The only way to lose entries is
/// to replace the whole history with another one (`WorkItem::set_history`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransformHistory {
    entries: Vec<HistoryEntry>,
}

impl TransformHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in order, sprout entries rendered with their marker.
    pub fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.to_string()).collect()
    }
}
