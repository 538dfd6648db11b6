//! UI-agnostic chat state types
//!
//! These are shared by every host surface and carry no presentation details.

use chrono::{DateTime, Local};

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ChatRole::User => "You",
            ChatRole::Assistant => "AI Assistant",
        }
    }
}

/// One message in the transcript.
///
/// Turns are immutable once created: fields are only reachable through
/// accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    role: ChatRole,
    content: String,
    timestamp: DateTime<Local>,
}

impl ChatTurn {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self::at(role, content, Local::now())
    }

    pub fn at(role: ChatRole, content: impl Into<String>, timestamp: DateTime<Local>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }

    pub fn role(&self) -> ChatRole {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    /// Timestamp at minute granularity, e.g. `14:05`.
    pub fn time_label(&self) -> String {
        self.timestamp.format("%H:%M").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_time_label_is_minute_granularity() {
        let ts = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 59).unwrap();
        let turn = ChatTurn::at(ChatRole::User, "hi", ts);
        assert_eq!(turn.time_label(), "07:05");
    }

    #[test]
    fn test_content_keeps_line_breaks() {
        let turn = ChatTurn::assistant("line one\nline two");
        assert_eq!(turn.content().lines().count(), 2);
        assert_eq!(turn.role(), ChatRole::Assistant);
    }

    #[test]
    fn test_role_names() {
        assert_eq!(ChatRole::User.as_str(), "user");
        assert_eq!(ChatRole::Assistant.display_name(), "AI Assistant");
    }
}
