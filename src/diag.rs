//! Conformance-failure accumulator
//!
//! One `FailureLog` is created per parse call and collects human-readable
//! messages in the order violations are found. Parsing decisions never depend
//! on the log; a caller that drops it gets identical structures back.

use serde::Serialize;

#[derive(Debug, Default, Clone, Serialize)]
pub struct FailureLog {
    messages: Vec<String>,
}

impl FailureLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one failure message.
    pub fn add(&mut self, msg: impl Into<String>) {
        self.messages.push(msg.into());
    }

    /// Record a failure only when `revision` is at or below `cap`.
    ///
    /// Later CTA-861 revisions legalize some previously reserved values, so
    /// a handful of checks are silenced for revision > 3 sources.
    pub fn add_until(&mut self, cap: u8, revision: u8, msg: impl Into<String>) {
        if revision <= cap {
            self.messages.push(msg.into());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Render the accumulated failures under a section label, each message
    /// indented two spaces. Empty logs render to an empty string (the header
    /// is only printed once there is something to report).
    pub fn render(&self, section: &str) -> String {
        if self.messages.is_empty() {
            return String::new();
        }
        let mut out = format!("{section}:\n");
        for msg in &self.messages {
            out.push_str("  ");
            out.push_str(msg);
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_lazy_header() {
        let log = FailureLog::new();
        assert_eq!(log.render("Block 1 (CTA-861 Extension Block)"), "");

        let mut log = FailureLog::new();
        log.add("Padding: Contains non-zero bytes.");
        log.add("Non-zero byte 3.");
        assert_eq!(
            log.render("Block 1 (CTA-861 Extension Block)"),
            "Block 1 (CTA-861 Extension Block):\n  Padding: Contains non-zero bytes.\n  Non-zero byte 3.\n"
        );
    }

    #[test]
    fn revision_cap() {
        let mut log = FailureLog::new();
        log.add_until(3, 3, "recorded");
        log.add_until(3, 4, "dropped");
        assert_eq!(log.messages(), ["recorded"]);
    }
}
