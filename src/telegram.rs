//! Telegram transport built on teloxide

use std::sync::{Arc, Mutex};

use teloxide::prelude::*;
use teloxide::types::{
    ForceReply, InlineKeyboardButton, InlineKeyboardMarkup, MessageId, ParseMode, ReplyMarkup, User,
};
use teloxide::utils::command::BotCommands;
use tracing::{error, info, warn};

use crate::controller::{Command, Controller, Event, Incoming, Outcome};
use crate::db::{SqliteStore, UserInfo};
use crate::messages::{self, Delivery, Keyboard, Reply};
use crate::questions::MessageRef;

pub type SharedController = Arc<Mutex<Controller<SqliteStore>>>;

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync + 'static>>;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Доступные команды:")]
enum BotCommand {
    #[command(description = "начать работу")]
    Start,
    #[command(description = "показать справку")]
    Help,
}

/// Serve updates until the process is interrupted
pub async fn run(bot: Bot, controller: SharedController) {
    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<BotCommand>()
                .endpoint(on_command),
        )
        .branch(Update::filter_message().endpoint(on_message))
        .branch(Update::filter_callback_query().endpoint(on_callback));

    info!("dispatching telegram updates");
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![controller])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn on_command(bot: Bot, msg: Message, cmd: BotCommand, controller: SharedController) -> HandlerResult {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let command = match cmd {
        BotCommand::Start => Command::Start,
        BotCommand::Help => Command::Help,
    };
    let incoming = Incoming {
        chat_id: msg.chat.id.0,
        user: user_info(user),
        event: Event::Command(command),
    };
    let outcome = handle(&controller, &incoming);
    deliver(&bot, &controller, msg.chat.id, outcome.reply).await;
    Ok(())
}

async fn on_message(bot: Bot, msg: Message, controller: SharedController) -> HandlerResult {
    let (Some(user), Some(text)) = (msg.from.as_ref(), msg.text()) else {
        return Ok(());
    };
    let incoming = Incoming {
        chat_id: msg.chat.id.0,
        user: user_info(user),
        event: Event::Text(text.to_string()),
    };
    let outcome = handle(&controller, &incoming);
    deliver(&bot, &controller, msg.chat.id, outcome.reply).await;
    Ok(())
}

async fn on_callback(bot: Bot, q: CallbackQuery, controller: SharedController) -> HandlerResult {
    let Some(chat_id) = q.message.as_ref().map(|m| m.chat().id) else {
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };
    let incoming = Incoming {
        chat_id: chat_id.0,
        user: user_info(&q.from),
        event: Event::Callback(q.data.clone().unwrap_or_default()),
    };
    let outcome = handle(&controller, &incoming);

    let delivered = deliver(&bot, &controller, chat_id, outcome.reply).await;

    let mut answer = bot.answer_callback_query(q.id.clone());
    if let Some(notice) = callback_notice(outcome.notice, delivered) {
        answer = answer.text(notice);
    }
    if let Err(err) = answer.await {
        warn!(chat_id = chat_id.0, error = %err, "failed to answer callback query");
    }
    Ok(())
}

/// Popup text for a button press; a reply that never reached the chat turns into the error notice
fn callback_notice(notice: Option<String>, delivered: bool) -> Option<String> {
    if delivered {
        notice
    } else {
        Some(messages::GENERIC_ERROR.to_string())
    }
}

fn handle(controller: &SharedController, incoming: &Incoming) -> Outcome {
    match controller.lock() {
        Ok(mut guard) => guard.handle(incoming),
        Err(poisoned) => poisoned.into_inner().handle(incoming),
    }
}

fn user_info(user: &User) -> UserInfo {
    UserInfo {
        // Telegram user ids fit in 52 bits
        external_id: user.id.0 as i64,
        username: user.username.clone(),
        display_name: user.first_name.clone(),
    }
}

fn markup(keyboard: &Keyboard) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(keyboard.rows.iter().map(|row| {
        row.iter()
            .map(|button| InlineKeyboardButton::callback(button.label.clone(), button.action.tag()))
            .collect::<Vec<_>>()
    }))
}

/// Send or edit according to the reply, falling back to a new message when an edit fails.
/// Returns false when the reply could not be delivered at all.
async fn deliver(bot: &Bot, controller: &SharedController, chat_id: ChatId, reply: Option<Reply>) -> bool {
    let Some(reply) = reply else {
        return true;
    };

    let delivered = match reply.delivery {
        Delivery::Edit(MessageRef(id)) => {
            let mut request = bot.edit_message_text(chat_id, MessageId(id), reply.text.clone());
            if let Some(keyboard) = &reply.keyboard {
                request = request.reply_markup(markup(keyboard));
            }
            if reply.html {
                request = request.parse_mode(ParseMode::Html);
            }
            match request.await {
                Ok(message) => Some(message.id),
                Err(err) => {
                    warn!(chat_id = chat_id.0, error = %err, "edit failed, sending a new message");
                    send(bot, chat_id, &reply).await
                }
            }
        }
        Delivery::Send => send(bot, chat_id, &reply).await,
    };

    if let (true, Some(message_id)) = (reply.is_card, delivered) {
        match controller.lock() {
            Ok(mut guard) => guard.card_delivered(chat_id.0, MessageRef(message_id.0)),
            Err(poisoned) => poisoned.into_inner().card_delivered(chat_id.0, MessageRef(message_id.0)),
        }
    }
    delivered.is_some()
}

async fn send(bot: &Bot, chat_id: ChatId, reply: &Reply) -> Option<MessageId> {
    let mut request = bot.send_message(chat_id, reply.text.clone());
    if reply.force_reply {
        request = request.reply_markup(ReplyMarkup::ForceReply(ForceReply::new()));
    } else if let Some(keyboard) = &reply.keyboard {
        request = request.reply_markup(ReplyMarkup::InlineKeyboard(markup(keyboard)));
    }
    if reply.html {
        request = request.parse_mode(ParseMode::Html);
    }
    match request.await {
        Ok(message) => Some(message.id),
        Err(err) => {
            error!(chat_id = chat_id.0, error = %err, "failed to send message");
            None
        }
    }
}
