//! User-facing texts, button actions and reply layouts

use teloxide::utils::html;

use crate::db::WordPair;
use crate::questions::MessageRef;

pub const WELCOME: &str = "\
👋 Привет!
Давай займемся изучением английского языка.
Занятия проходят в удобном для тебя темпе.
У тебя есть возможность использовать тренажёр, как конструктор, и собирать свою собственную базу для обучения.
Для этого необходимо добавить сначала слово на русском языке, а потом его перевод.

📌 Что ты можешь:
- 🔤 Начать тренировку — получить карточку и выбрать перевод.
- 📚 Посмотреть свои слова — проверить, что уже добавил.
- ➕ Добавить слово — самостоятельно пополнять базу.
- ➖ Удалить слово — управлять своей коллекцией.

Ну что, начнём? 😉";

pub const MAIN_MENU: &str = "Главное меню:";
pub const GENERIC_ERROR: &str = "⚠️ Произошла ошибка. Попробуйте позже.";
pub const USER_ERROR: &str = "Ошибка пользователя. Попробуйте снова.";
pub const TRAINING_UNAVAILABLE: &str = "Не удалось получить слова для тренировки.";
pub const STALE_SESSION: &str = "⚠️ Сессия устарела. Начните новую тренировку.";
pub const STALE_NOTICE: &str = "Ошибка: данные вопроса не найдены";
pub const CORRECT_NOTICE: &str = "✅ Верно!";
pub const INCORRECT_NOTICE: &str = "❌ Неверно! Попробуйте еще раз";
pub const ASK_WORD: &str = "📝 Введите слово, которое хотите добавить, на русском языке:";
pub const EMPTY_WORD: &str = "❌ Слово не может быть пустым. Попробуйте снова.";
pub const EMPTY_TRANSLATION: &str = "❌ Перевод не может быть пустым. Попробуйте снова.";
pub const MISSING_SOURCE_WORD: &str = "❌ Не удалось найти исходное слово. Попробуйте снова.";
pub const NO_WORDS: &str = "У вас пока нет добавленных слов.";
pub const CHOOSE_WORD_TO_DELETE: &str = "Выберите слово для удаления:";
pub const DELETE_CANCELLED: &str = "❌ Удаление отменено";

const ANSWER_PREFIX: &str = "answer_";
const ASK_DELETE_PREFIX: &str = "ask_del_";
const CONFIRM_DELETE_PREFIX: &str = "confirm_del_";

/// Button press payloads understood by the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    StartQuiz,
    SubmitAnswer(String),
    AddWord,
    DeleteWord,
    RequestDelete(String),
    ConfirmDelete(String),
    CancelDelete,
    ShowMyWords,
    ReturnToMenu,
}

impl Action {
    /// Callback data carried by the button
    pub fn tag(&self) -> String {
        match self {
            Action::StartQuiz => "start_quiz".to_string(),
            Action::SubmitAnswer(answer) => format!("{}{}", ANSWER_PREFIX, answer),
            Action::AddWord => "add_word".to_string(),
            Action::DeleteWord => "delete_word".to_string(),
            Action::RequestDelete(word) => format!("{}{}", ASK_DELETE_PREFIX, word),
            Action::ConfirmDelete(word) => format!("{}{}", CONFIRM_DELETE_PREFIX, word),
            Action::CancelDelete => "cancel_delete".to_string(),
            Action::ShowMyWords => "my_words".to_string(),
            Action::ReturnToMenu => "main_menu".to_string(),
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        let action = match tag {
            "start_quiz" => Action::StartQuiz,
            "add_word" => Action::AddWord,
            "delete_word" => Action::DeleteWord,
            "cancel_delete" => Action::CancelDelete,
            "my_words" => Action::ShowMyWords,
            "main_menu" => Action::ReturnToMenu,
            _ => {
                if let Some(answer) = tag.strip_prefix(ANSWER_PREFIX) {
                    Action::SubmitAnswer(answer.to_string())
                } else if let Some(word) = tag.strip_prefix(ASK_DELETE_PREFIX) {
                    Action::RequestDelete(word.to_string())
                } else if let Some(word) = tag.strip_prefix(CONFIRM_DELETE_PREFIX) {
                    Action::ConfirmDelete(word.to_string())
                } else {
                    return None;
                }
            }
        };
        Some(action)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub action: Action,
}

impl Button {
    pub fn new(label: impl Into<String>, action: Action) -> Self {
        Self {
            label: label.into(),
            action,
        }
    }
}

/// Inline buttons laid out in rows
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn with_row_width(buttons: Vec<Button>, width: usize) -> Self {
        let rows = buttons
            .chunks(width.max(1))
            .map(<[Button]>::to_vec)
            .collect();
        Self { rows }
    }

    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows.iter().flatten()
    }
}

/// Whether a reply goes out as a new message or replaces an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Send,
    Edit(MessageRef),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Option<Keyboard>,
    pub delivery: Delivery,
    /// Ask the client to open a reply field for free text input
    pub force_reply: bool,
    /// Set on quiz cards so the transport reports the delivered message back
    pub is_card: bool,
    /// Text carries HTML markup
    pub html: bool,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
            delivery: Delivery::Send,
            force_reply: false,
            is_card: false,
            html: false,
        }
    }

    pub fn with_menu(text: impl Into<String>) -> Self {
        Self::text(text).keyboard(main_menu())
    }

    pub fn keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }

    pub fn edit_or_send(mut self, message_ref: Option<MessageRef>) -> Self {
        self.delivery = message_ref.map_or(Delivery::Send, Delivery::Edit);
        self
    }

    pub fn force_reply(mut self) -> Self {
        self.force_reply = true;
        self
    }
}

pub fn main_menu() -> Keyboard {
    Keyboard::with_row_width(
        vec![
            Button::new("🔤 Начать тренировку", Action::StartQuiz),
            Button::new("📚 Мои слова", Action::ShowMyWords),
            Button::new("➕ Добавить слово", Action::AddWord),
            Button::new("➖ Удалить слово", Action::DeleteWord),
        ],
        2,
    )
}

/// Quiz card with already shuffled choices
pub fn card(question: &str, choices: Vec<String>, message_ref: Option<MessageRef>) -> Reply {
    let buttons = choices
        .into_iter()
        .map(|choice| Button::new(choice.clone(), Action::SubmitAnswer(choice)))
        .collect();
    let text = format!("Как переводится слово:\n🇷🇺 <b>{}</b>", html::escape(question));
    let mut reply = Reply::text(text)
        .keyboard(Keyboard::with_row_width(buttons, 2))
        .edit_or_send(message_ref);
    reply.is_card = true;
    reply.html = true;
    reply
}

pub fn correct_answer(question: &str, answer: &str, message_ref: Option<MessageRef>) -> Reply {
    let keyboard = Keyboard {
        rows: vec![vec![
            Button::new("➡️ Следующее слово", Action::StartQuiz),
            Button::new("🏠 В главное меню", Action::ReturnToMenu),
        ]],
    };
    Reply::text(format!("✅ Отлично!\n{} -> {}", question, answer))
        .keyboard(keyboard)
        .edit_or_send(message_ref)
}

pub fn ask_translation(word: &str) -> Reply {
    Reply::text(format!("Теперь введите перевод для слова '{}':", word)).force_reply()
}

pub fn word_added(word: &str, translation: &str, total_words: i64) -> Reply {
    Reply::with_menu(format!(
        "✅ Слово '{}' с переводом '{}' успешно добавлено!\n📊 Теперь вы изучаете слов: {}",
        word, translation, total_words
    ))
}

pub fn word_not_added(word: &str) -> Reply {
    Reply::with_menu(format!("❌ Не удалось добавить слово '{}'", word))
}

pub fn my_words(words: &[WordPair]) -> Reply {
    let list = words
        .iter()
        .map(|pair| format!("{} - {}", pair.word, pair.translation))
        .collect::<Vec<_>>()
        .join("\n");
    Reply::with_menu(format!("📚 Ваши слова ({}):\n{}", words.len(), list))
}

pub fn delete_choices(words: &[WordPair]) -> Reply {
    let mut buttons: Vec<Button> = words
        .iter()
        .map(|pair| Button::new(pair.word.clone(), Action::RequestDelete(pair.word.clone())))
        .collect();
    buttons.push(Button::new("🔙 Назад", Action::ReturnToMenu));
    Reply::text(CHOOSE_WORD_TO_DELETE).keyboard(Keyboard::with_row_width(buttons, 1))
}

pub fn confirm_delete(word: &str) -> Reply {
    let keyboard = Keyboard {
        rows: vec![vec![
            Button::new("✅ Да, удалить", Action::ConfirmDelete(word.to_string())),
            Button::new("❌ Нет, отмена", Action::CancelDelete),
        ]],
    };
    Reply::text(format!("Вы уверены, что хотите удалить слово '{}'?", word)).keyboard(keyboard)
}

pub fn deleted_notice(word: &str) -> String {
    format!("✅ Слово '{}' удалено", word)
}

pub fn deleted(word: &str) -> Reply {
    Reply::with_menu(format!("✅ Слово '{}' успешно удалено!", word))
}

pub fn not_deleted(word: &str) -> String {
    format!("❌ Не удалось удалить слово '{}'", word)
}
