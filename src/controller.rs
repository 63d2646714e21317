//! Conversation controller: turns chat events into engine calls and replies

use rand::rngs::StdRng;
use rand::Rng;
use tracing::{debug, error, warn};

use crate::db::{UserInfo, VocabularyStore};
use crate::engine::{AnswerOutcome, QuizEngine};
use crate::error::BotError;
use crate::messages::{self, Action, Reply};
use crate::questions::MessageRef;
use crate::session::SessionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Command(Command),
    /// Raw callback data of a pressed button
    Callback(String),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Incoming {
    pub chat_id: i64,
    pub user: UserInfo,
    pub event: Event,
}

/// What the transport should do in response to an event
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Outcome {
    /// Short popup shown for a button press
    pub notice: Option<String>,
    pub reply: Option<Reply>,
}

impl Outcome {
    pub fn reply(reply: Reply) -> Self {
        Self {
            notice: None,
            reply: Some(reply),
        }
    }

    pub fn notice(notice: impl Into<String>) -> Self {
        Self {
            notice: Some(notice.into()),
            reply: None,
        }
    }

    fn with_notice(mut self, notice: impl Into<String>) -> Self {
        self.notice = Some(notice.into());
        self
    }
}

pub struct Controller<S, R = StdRng> {
    engine: QuizEngine<S, R>,
}

impl<S: VocabularyStore, R: Rng> Controller<S, R> {
    pub fn new(engine: QuizEngine<S, R>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &QuizEngine<S, R> {
        &self.engine
    }

    pub fn handle(&mut self, incoming: &Incoming) -> Outcome {
        let chat_id = incoming.chat_id;
        let user_id = match self.engine.store().ensure_user(&incoming.user) {
            Ok(id) => id,
            Err(err) => {
                error!(chat_id, external_id = incoming.user.external_id, error = %err, "failed to resolve user");
                return match incoming.event {
                    Event::Callback(_) => Outcome::notice(messages::USER_ERROR),
                    _ => Outcome::reply(Reply::text(messages::GENERIC_ERROR)),
                };
            }
        };

        match &incoming.event {
            Event::Command(command) => {
                debug!(chat_id, user_id, ?command, "command");
                self.engine.cancel(chat_id);
                Outcome::reply(Reply::with_menu(messages::WELCOME))
            }
            Event::Text(text) => self.on_text(chat_id, user_id, text),
            Event::Callback(tag) => match Action::parse(tag) {
                Some(action) => self.on_action(chat_id, user_id, action),
                None => {
                    warn!(chat_id, tag = %tag, "unknown callback tag");
                    Outcome::notice(messages::GENERIC_ERROR)
                }
            },
        }
    }

    /// The transport delivered a quiz card as this message
    pub fn card_delivered(&mut self, chat_id: i64, message_ref: MessageRef) {
        self.engine.attach_message(chat_id, message_ref);
    }

    fn on_action(&mut self, chat_id: i64, user_id: i64, action: Action) -> Outcome {
        match action {
            Action::StartQuiz => match self.engine.start_round(chat_id, user_id) {
                Ok(round) => {
                    let choices = self.engine.shuffled_choices(&round);
                    Outcome::reply(messages::card(&round.question, choices, None))
                }
                Err(err) => self.failure(chat_id, user_id, err),
            },
            Action::SubmitAnswer(answer) => match self.engine.submit_answer(chat_id, &answer) {
                Ok(AnswerOutcome::Correct {
                    question,
                    correct_answer,
                    message_ref,
                }) => Outcome::reply(messages::correct_answer(&question, &correct_answer, message_ref))
                    .with_notice(messages::CORRECT_NOTICE),
                Ok(AnswerOutcome::Incorrect(round)) => {
                    let choices = self.engine.shuffled_choices(&round);
                    Outcome::reply(messages::card(&round.question, choices, round.message_ref))
                        .with_notice(messages::INCORRECT_NOTICE)
                }
                Err(err) => self.failure(chat_id, user_id, err),
            },
            Action::AddWord => {
                self.engine.begin_add_word(chat_id);
                Outcome::reply(Reply::text(messages::ASK_WORD).force_reply())
            }
            Action::DeleteWord => match self.engine.store().list_user_words(user_id) {
                Ok(words) if words.is_empty() => Outcome::reply(Reply::with_menu(messages::NO_WORDS)),
                Ok(words) => Outcome::reply(messages::delete_choices(&words)),
                Err(err) => self.failure(chat_id, user_id, err),
            },
            Action::RequestDelete(word) => {
                self.engine.request_delete(chat_id, &word);
                Outcome::reply(messages::confirm_delete(&word))
            }
            Action::ConfirmDelete(word) => match self.engine.confirm_delete(chat_id, user_id, &word) {
                Ok(true) => Outcome::reply(messages::deleted(&word)).with_notice(messages::deleted_notice(&word)),
                Ok(false) => {
                    let text = messages::not_deleted(&word);
                    Outcome::reply(Reply::with_menu(text.clone())).with_notice(text)
                }
                Err(err) => self.failure(chat_id, user_id, err),
            },
            Action::CancelDelete => {
                self.engine.cancel(chat_id);
                Outcome::reply(Reply::with_menu(messages::MAIN_MENU)).with_notice(messages::DELETE_CANCELLED)
            }
            Action::ShowMyWords => match self.engine.store().list_user_words(user_id) {
                Ok(words) if words.is_empty() => Outcome::reply(Reply::with_menu(messages::NO_WORDS)),
                Ok(words) => Outcome::reply(messages::my_words(&words)),
                Err(err) => self.failure(chat_id, user_id, err),
            },
            Action::ReturnToMenu => Outcome::reply(Reply::with_menu(messages::MAIN_MENU)),
        }
    }

    fn on_text(&mut self, chat_id: i64, user_id: i64, text: &str) -> Outcome {
        let state = self.engine.session(chat_id).map(|s| s.state.clone());
        match state {
            Some(SessionState::AwaitingWordInput) => match self.engine.submit_word(chat_id, text) {
                Ok(word) => Outcome::reply(messages::ask_translation(&word)),
                Err(BotError::Validation(_)) => {
                    Outcome::reply(Reply::text(messages::EMPTY_WORD).force_reply())
                }
                Err(err) => self.failure(chat_id, user_id, err),
            },
            Some(SessionState::AwaitingTranslationInput { word }) => {
                match self.engine.submit_translation(chat_id, user_id, text) {
                    Ok(added) => Outcome::reply(messages::word_added(
                        &added.word,
                        &added.translation,
                        added.total_words,
                    )),
                    Err(BotError::Validation(_)) => {
                        Outcome::reply(Reply::text(messages::EMPTY_TRANSLATION).force_reply())
                    }
                    Err(BotError::StaleSession) => {
                        Outcome::reply(Reply::with_menu(messages::MISSING_SOURCE_WORD))
                    }
                    Err(err) => {
                        error!(chat_id, user_id, word = %word, error = %err, "failed to save personal word");
                        Outcome::reply(messages::word_not_added(&word))
                    }
                }
            }
            _ => Outcome::reply(Reply::with_menu(messages::MAIN_MENU)),
        }
    }

    fn failure(&self, chat_id: i64, user_id: i64, err: BotError) -> Outcome {
        match err {
            BotError::NotFound => {
                warn!(chat_id, user_id, "no word available for training");
                Outcome::reply(Reply::with_menu(messages::TRAINING_UNAVAILABLE))
            }
            BotError::StaleSession => {
                warn!(chat_id, user_id, "stale session");
                Outcome::reply(Reply::with_menu(messages::STALE_SESSION)).with_notice(messages::STALE_NOTICE)
            }
            err => {
                error!(chat_id, user_id, error = %err, "request failed");
                Outcome::reply(Reply::with_menu(messages::GENERIC_ERROR))
            }
        }
    }
}
