//! Append-only, human-readable record of pipeline milestones

use serde::{Deserialize, Serialize};

/// Substring of a known noisy line stripped before display
const NOISY_SUBSTRING: &str = "missing ScriptRunContext";

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct AgentLog {
    entries: Vec<String>,
}

impl AgentLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one entry; it is mirrored to tracing at debug level
    pub fn push(&mut self, entry: impl Into<String>) {
        let entry = entry.into();
        tracing::debug!(target: "agent_log", "{}", entry);
        self.entries.push(entry);
    }

    pub fn extend<I, S>(&mut self, entries: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for entry in entries {
            self.push(entry);
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every entry joined by newlines
    #[must_use]
    pub fn to_text(&self) -> String {
        self.entries.join("\n")
    }

    /// Text for display with noisy lines removed
    #[must_use]
    pub fn display_text(&self) -> String {
        self.to_text()
            .lines()
            .filter(|line| !line.contains(NOISY_SUBSTRING))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_keep_order() {
        let mut log = AgentLog::new();
        log.push("first");
        log.extend(["second", "third"]);
        assert_eq!(log.len(), 3);
        assert_eq!(log.to_text(), "first\nsecond\nthird");
    }

    #[test]
    fn test_display_text_strips_noisy_lines() {
        let mut log = AgentLog::new();
        log.push("✅ Analysis complete:");
        log.push("Thread 'x': missing ScriptRunContext! This warning can be ignored\n- Location 1");
        log.push("done");
        assert_eq!(log.display_text(), "✅ Analysis complete:\n- Location 1\ndone");
    }
}
