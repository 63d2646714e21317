//! Quiz engine: session transitions driven by chat events

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::db::{VocabularyStore, WordPair};
use crate::error::{BotError, Result};
use crate::questions::{judge, select_round, Judgement, MessageRef, QuizRound};
use crate::session::{Session, SessionState, SessionStore};

/// What happened to a submitted answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    Correct {
        question: String,
        correct_answer: String,
        message_ref: Option<MessageRef>,
    },
    /// The unchanged round, to be shown again
    Incorrect(QuizRound),
}

/// A personal word that was just saved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedWord {
    pub word: String,
    pub translation: String,
    pub total_words: i64,
}

pub struct QuizEngine<S, R = StdRng> {
    store: S,
    sessions: SessionStore,
    rng: R,
}

impl<S: VocabularyStore> QuizEngine<S, StdRng> {
    pub fn new(store: S) -> Self {
        Self::with_rng(store, StdRng::from_entropy())
    }
}

impl<S: VocabularyStore, R: Rng> QuizEngine<S, R> {
    pub fn with_rng(store: S, rng: R) -> Self {
        Self {
            store,
            sessions: SessionStore::new(),
            rng,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn session(&self, chat_id: i64) -> Option<&Session> {
        self.sessions.get(chat_id)
    }

    /// Draw a new round for the chat, replacing whatever it was doing
    pub fn start_round(&mut self, chat_id: i64, user_id: i64) -> Result<QuizRound> {
        let previous_word = self.sessions.previous_word(chat_id).map(str::to_string);
        let round = select_round(&self.store, &mut self.rng, user_id, previous_word.as_deref())?;
        debug!(chat_id, user_id, question = %round.question, "round started");

        let session = self.sessions.entry(chat_id);
        session.previous_word = Some(round.question.clone());
        session.state = SessionState::AwaitingAnswer(round.clone());
        Ok(round)
    }

    /// Remember which message shows the active round
    pub fn attach_message(&mut self, chat_id: i64, message_ref: MessageRef) {
        if let Some(round) = self.sessions.get_mut(chat_id).and_then(Session::active_round_mut) {
            round.message_ref = Some(message_ref);
        }
    }

    pub fn submit_answer(&mut self, chat_id: i64, answer: &str) -> Result<AnswerOutcome> {
        let session = self.sessions.get_mut(chat_id).ok_or(BotError::StaleSession)?;
        let round = session.active_round().ok_or(BotError::StaleSession)?;

        match judge(round, answer) {
            Judgement::Correct {
                question,
                correct_answer,
            } => {
                let message_ref = round.message_ref;
                session.previous_word = Some(question.clone());
                session.state = SessionState::Idle;
                Ok(AnswerOutcome::Correct {
                    question,
                    correct_answer,
                    message_ref,
                })
            }
            Judgement::Incorrect => Ok(AnswerOutcome::Incorrect(round.clone())),
        }
    }

    /// Answer choices of a round in a fresh random order
    pub fn shuffled_choices(&mut self, round: &QuizRound) -> Vec<String> {
        round.shuffled_choices(&mut self.rng)
    }

    pub fn begin_add_word(&mut self, chat_id: i64) {
        self.sessions.entry(chat_id).state = SessionState::AwaitingWordInput;
    }

    /// Accept the word to add; an empty word keeps the chat on the same step
    pub fn submit_word(&mut self, chat_id: i64, text: &str) -> Result<String> {
        let session = self.sessions.get_mut(chat_id).ok_or(BotError::StaleSession)?;
        if session.state != SessionState::AwaitingWordInput {
            return Err(BotError::StaleSession);
        }

        let word = text.trim();
        if word.is_empty() {
            return Err(BotError::Validation("word must not be empty".to_string()));
        }

        session.state = SessionState::AwaitingTranslationInput {
            word: word.to_string(),
        };
        Ok(word.to_string())
    }

    /// Accept the translation and save the pair to the personal vocabulary
    pub fn submit_translation(&mut self, chat_id: i64, user_id: i64, text: &str) -> Result<AddedWord> {
        let session = self.sessions.get_mut(chat_id).ok_or(BotError::StaleSession)?;
        let SessionState::AwaitingTranslationInput { word } = &session.state else {
            return Err(BotError::StaleSession);
        };

        let translation = text.trim();
        if translation.is_empty() {
            return Err(BotError::Validation("translation must not be empty".to_string()));
        }

        let pair = WordPair::new(word.clone(), translation);
        session.state = SessionState::Idle;

        self.store.upsert_user_word(user_id, &pair.word, &pair.translation)?;
        let total_words = self.store.count_user_words(user_id)?;
        info!(chat_id, user_id, word = %pair.word, total_words, "personal word saved");

        Ok(AddedWord {
            word: pair.word,
            translation: pair.translation,
            total_words,
        })
    }

    pub fn request_delete(&mut self, chat_id: i64, word: &str) {
        self.sessions.entry(chat_id).state = SessionState::AwaitingDeleteConfirmation {
            word: word.to_string(),
        };
    }

    /// Delete a personal word; the word comes with the confirmation itself
    pub fn confirm_delete(&mut self, chat_id: i64, user_id: i64, word: &str) -> Result<bool> {
        self.sessions.reset(chat_id);
        let deleted = self.store.delete_user_word(user_id, word)?;
        info!(chat_id, user_id, word, deleted, "personal word delete");
        Ok(deleted)
    }

    /// Abandon any in-progress flow
    pub fn cancel(&mut self, chat_id: i64) {
        self.sessions.reset(chat_id);
    }
}
