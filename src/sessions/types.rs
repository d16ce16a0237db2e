use crate::assessment::Assessment;
use crate::providers::Turn;
use chrono::{DateTime, Utc};

/// Chat turns kept per session. Older turns are dropped from the front.
pub const MAX_HISTORY_TURNS: usize = 20;

/// Per-visitor state: at most one assessment and one chat history.
#[derive(Debug, Clone)]
pub struct Session {
    pub assessment: Option<Assessment>,
    pub chat_history: Vec<Turn>,
    pub last_seen: DateTime<Utc>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            assessment: None,
            chat_history: Vec::new(),
            last_seen: Utc::now(),
        }
    }

    pub fn touch(&mut self) {
        self.last_seen = Utc::now();
    }

    /// Append a completed user/assistant exchange, capped at
    /// [`MAX_HISTORY_TURNS`].
    pub fn record_exchange(&mut self, user_message: &str, assistant_response: &str) {
        self.chat_history.push(Turn::user(user_message));
        self.chat_history.push(Turn::assistant(assistant_response));
        if self.chat_history.len() > MAX_HISTORY_TURNS {
            let excess = self.chat_history.len() - MAX_HISTORY_TURNS;
            self.chat_history.drain(..excess);
        }
    }

    pub fn clear_chat(&mut self) {
        self.chat_history.clear();
    }

    pub fn clear_all(&mut self) {
        self.assessment = None;
        self.chat_history.clear();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
