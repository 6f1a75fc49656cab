//! Change-log entries attached to every versioned write

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// What a change did to a record
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeCommand {
    Save,
    Delete,
}

impl fmt::Display for ChangeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeCommand::Save => f.write_str("save"),
            ChangeCommand::Delete => f.write_str("delete"),
        }
    }
}

/// A single change-log entry
///
/// Like a commit in a VCS, every record version carries one of these so
/// the history of a file can be audited after the fact.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEntry {
    pub command: ChangeCommand,

    /// User that made the change
    pub author: String,

    /// Free-form reason, empty for ordinary saves
    pub message: String,

    /// Timestamp (unix millis)
    pub timestamp: u64,
}

impl ChangeEntry {
    pub fn new(command: ChangeCommand, author: impl Into<String>, message: impl Into<String>) -> Self {
        ChangeEntry {
            command,
            author: author.into(),
            message: message.into(),
            timestamp: now_millis(),
        }
    }

    pub fn save(author: impl Into<String>) -> Self {
        Self::new(ChangeCommand::Save, author, "")
    }

    pub fn delete(author: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ChangeCommand::Delete, author, reason)
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_entry() {
        let change = ChangeEntry::save("user-1");
        assert_eq!(change.command, ChangeCommand::Save);
        assert_eq!(change.author, "user-1");
        assert!(change.message.is_empty());
        assert!(change.timestamp > 0);
    }

    #[test]
    fn test_command_serializes_lowercase() {
        let json = serde_json::to_string(&ChangeCommand::Delete).unwrap();
        assert_eq!(json, "\"delete\"");
    }
}
