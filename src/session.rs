//! Per-session front-end state: login screen vs. chat screen plus the
//! transcript shown on the chat screen.
//!
//! Mirrors what the browser page keeps in `sessionStorage`.

use crate::models::{ChatMessage, UserProfile};

/// Shown when `/search` fails or answers with something unexpected.
pub const NO_ANSWER: &str = "No results found or an error occurred.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    LoggedOut,
    LoggedIn { user: Option<UserProfile> },
}

#[derive(Debug, Clone)]
pub struct Session {
    screen: Screen,
    transcript: Vec<ChatMessage>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            screen: Screen::LoggedOut,
            transcript: Vec::new(),
        }
    }

    /// Session restored from a "logged in" hint (e.g. a query parameter)
    /// without a profile.
    pub fn resumed() -> Self {
        Self {
            screen: Screen::LoggedIn { user: None },
            transcript: Vec::new(),
        }
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(self.screen, Screen::LoggedIn { .. })
    }

    /// LoggedOut → LoggedIn. There is no way back.
    pub fn log_in(&mut self, user: UserProfile) {
        self.screen = Screen::LoggedIn { user: Some(user) };
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.transcript.push(ChatMessage::user(content));
    }

    /// Record the assistant turn; `None` renders as [`NO_ANSWER`].
    pub fn push_assistant(&mut self, content: Option<String>) {
        let content = content.unwrap_or_else(|| NO_ANSWER.to_string());
        self.transcript.push(ChatMessage::assistant(content));
    }
}
