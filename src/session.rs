//! In-memory per-chat session state

use std::collections::HashMap;

use crate::questions::QuizRound;

/// Where a chat currently is in its conversation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    AwaitingAnswer(QuizRound),
    AwaitingWordInput,
    AwaitingTranslationInput { word: String },
    AwaitingDeleteConfirmation { word: String },
}

/// State kept for one chat; `previous_word` survives every transition
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    pub previous_word: Option<String>,
    pub state: SessionState,
}

impl Session {
    pub fn active_round(&self) -> Option<&QuizRound> {
        match &self.state {
            SessionState::AwaitingAnswer(round) => Some(round),
            _ => None,
        }
    }

    pub fn active_round_mut(&mut self) -> Option<&mut QuizRound> {
        match &mut self.state {
            SessionState::AwaitingAnswer(round) => Some(round),
            _ => None,
        }
    }
}

/// Sessions keyed by chat id. Lost on restart.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<i64, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, chat_id: i64) -> Option<&Session> {
        self.sessions.get(&chat_id)
    }

    pub fn get_mut(&mut self, chat_id: i64) -> Option<&mut Session> {
        self.sessions.get_mut(&chat_id)
    }

    /// Existing session for the chat, created empty on first use
    pub fn entry(&mut self, chat_id: i64) -> &mut Session {
        self.sessions.entry(chat_id).or_default()
    }

    pub fn previous_word(&self, chat_id: i64) -> Option<&str> {
        self.get(chat_id).and_then(|s| s.previous_word.as_deref())
    }

    /// Drop any in-progress flow, keeping only the previous word
    pub fn reset(&mut self, chat_id: i64) {
        if let Some(session) = self.sessions.get_mut(&chat_id) {
            session.state = SessionState::Idle;
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
