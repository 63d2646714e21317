//! Quiz round generation and answer judging

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::db::{VocabularyStore, WordPair};
use crate::error::{BotError, Result};

/// How many draws are attempted before giving up on finding a word
pub const MAX_SELECTION_ATTEMPTS: usize = 10;

/// Wrong translations offered next to the correct one
pub const DISTRACTOR_COUNT: usize = 3;

/// Chance of drawing from the personal vocabulary on each attempt
pub const PERSONAL_WORD_PROBABILITY: f64 = 0.5;

/// Opaque handle of the chat message that shows a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageRef(pub i32);

/// One question with its answer choices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizRound {
    pub question: String,
    pub correct_answer: String,
    pub distractors: Vec<String>,
    pub message_ref: Option<MessageRef>,
}

impl QuizRound {
    pub fn new(pair: WordPair, distractors: Vec<String>) -> Self {
        Self {
            question: pair.word,
            correct_answer: pair.translation,
            distractors,
            message_ref: None,
        }
    }

    /// Correct answer and distractors in random order
    pub fn shuffled_choices<R: Rng>(&self, rng: &mut R) -> Vec<String> {
        let mut choices = Vec::with_capacity(self.distractors.len() + 1);
        choices.push(self.correct_answer.clone());
        choices.extend(self.distractors.iter().cloned());
        choices.shuffle(rng);
        choices
    }
}

/// Result of checking a submitted answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Judgement {
    Correct { question: String, correct_answer: String },
    Incorrect,
}

/// Pick a word for the next round, avoiding `previous_word`.
///
/// Each attempt tries the personal vocabulary with probability
/// [`PERSONAL_WORD_PROBABILITY`], falling back to the base vocabulary when
/// that draw is skipped or comes back empty. Distractors always come from the
/// base vocabulary and may number fewer than [`DISTRACTOR_COUNT`].
pub fn select_round<S, R>(
    store: &S,
    rng: &mut R,
    user_id: i64,
    previous_word: Option<&str>,
) -> Result<QuizRound>
where
    S: VocabularyStore + ?Sized,
    R: Rng,
{
    for attempt in 1..=MAX_SELECTION_ATTEMPTS {
        let mut candidate = None;
        if rng.gen_bool(PERSONAL_WORD_PROBABILITY) {
            candidate = store.random_user_word(user_id, previous_word)?;
        }
        if candidate.is_none() {
            candidate = store.random_base_word(previous_word)?;
        }

        let Some(pair) = candidate else {
            debug!(user_id, attempt, "no word drawn, retrying");
            continue;
        };

        let distractors = store.random_distractors(&pair.translation, DISTRACTOR_COUNT)?;
        return Ok(QuizRound::new(pair, distractors));
    }

    Err(BotError::NotFound)
}

/// Exact comparison, no case or whitespace normalization
pub fn judge(round: &QuizRound, submitted: &str) -> Judgement {
    if submitted == round.correct_answer {
        Judgement::Correct {
            question: round.question.clone(),
            correct_answer: round.correct_answer.clone(),
        }
    } else {
        Judgement::Incorrect
    }
}
