//! VoIQ Bot - vocabulary quiz over Telegram
//!
//! Quiz rounds with multiple-choice translations drawn from a shared base
//! vocabulary and each user's personal words, backed by SQLite.

pub mod config;
pub mod controller;
pub mod db;
pub mod engine;
pub mod error;
pub mod import;
pub mod logging;
pub mod messages;
pub mod questions;
pub mod session;
pub mod telegram;

pub use config::Config;
pub use controller::{Command, Controller, Event, Incoming, Outcome};
pub use db::{init_database, verify_schema, SqliteStore, UserInfo, VocabularyStore, WordPair};
pub use engine::{AddedWord, AnswerOutcome, QuizEngine};
pub use error::{BotError, Result};
pub use import::import_file;
pub use messages::{Action, Button, Delivery, Keyboard, Reply};
pub use questions::{judge, select_round, Judgement, MessageRef, QuizRound, DISTRACTOR_COUNT, MAX_SELECTION_ATTEMPTS};
pub use session::{Session, SessionState, SessionStore};
