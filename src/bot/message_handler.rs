//! Message Handler module for processing incoming Telegram messages
//!
//! Routes every message either into the suggestion wizard (when a dialogue is
//! in progress) or into the command handlers.

use std::sync::Arc;

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::InlineKeyboardMarkup;
use tracing::{debug, error};

use crate::db::{Database, Dish};
use crate::dialogue::{SuggestDialogue, SuggestState};
use crate::localization::t_lang;
use crate::selection;

use super::dialogue_manager::{
    cancel_wizard, handle_confirmation_input, handle_description_input, handle_name_input,
    handle_photo_input, handle_price_input, start_wizard,
};
use super::ui_builder::{format_dish_card, format_status_list, vote_keyboard};

/// How many of a submitter's dishes the status command lists.
const STATUS_LIMIT: i64 = 20;

fn is_cancel_input(text: &str, language_code: Option<&str>) -> bool {
    text == "/cancel" || text == t_lang("button-cancel", language_code)
}

pub async fn message_handler(
    bot: Bot,
    msg: Message,
    dialogue: SuggestDialogue,
    db: Arc<Database>,
) -> Result<()> {
    // Channel posts and service messages carry no sender to hold a dialogue
    // with
    let Some(user) = msg.from.clone() else {
        return Ok(());
    };
    let voter_id = user.id.to_string();
    let language_code = user.language_code.as_deref();

    let state = dialogue.get().await?.unwrap_or_default();

    if let Some(text) = msg.text() {
        debug!(user_id = %msg.chat.id, state = ?state, "Received text message from user");

        // An explicit start request (re)enters the wizard from any state
        if text == "/suggest" {
            return start_wizard(&bot, &msg, &dialogue, language_code).await;
        }
        // Cancellation wins over every wizard step
        if !matches!(state, SuggestState::Idle) && is_cancel_input(text, language_code) {
            return cancel_wizard(&bot, &msg, &dialogue, language_code).await;
        }

        match state {
            SuggestState::Idle => {
                handle_command(&bot, &msg, &db, &voter_id, text, language_code).await
            }
            SuggestState::AwaitingPhoto => {
                bot.send_message(msg.chat.id, t_lang("error-photo-expected", language_code))
                    .await?;
                Ok(())
            }
            SuggestState::AwaitingName { photo_ref } => {
                handle_name_input(&bot, &msg, &dialogue, photo_ref, text, language_code).await
            }
            SuggestState::AwaitingDescription { photo_ref, name } => {
                handle_description_input(&bot, &msg, &dialogue, photo_ref, name, text, language_code)
                    .await
            }
            SuggestState::AwaitingPrice {
                photo_ref,
                name,
                description,
            } => {
                handle_price_input(
                    &bot,
                    &msg,
                    &dialogue,
                    photo_ref,
                    name,
                    description,
                    text,
                    language_code,
                )
                .await
            }
            SuggestState::AwaitingConfirmation { draft } => {
                handle_confirmation_input(
                    &bot,
                    &msg,
                    &dialogue,
                    &db,
                    &voter_id,
                    draft,
                    text,
                    language_code,
                )
                .await
            }
        }
    } else if msg.photo().is_some() {
        match state {
            SuggestState::AwaitingPhoto => {
                handle_photo_input(&bot, &msg, &dialogue, language_code).await
            }
            SuggestState::Idle => {
                bot.send_message(msg.chat.id, t_lang("unknown-message", language_code))
                    .await?;
                Ok(())
            }
            _ => {
                bot.send_message(msg.chat.id, t_lang("error-text-expected", language_code))
                    .await?;
                Ok(())
            }
        }
    } else {
        // Stickers, documents, voice notes and friends
        let reply_key = if matches!(state, SuggestState::Idle) {
            "unknown-message"
        } else {
            "error-text-expected"
        };
        bot.send_message(msg.chat.id, t_lang(reply_key, language_code))
            .await?;
        Ok(())
    }
}

async fn handle_command(
    bot: &Bot,
    msg: &Message,
    db: &Database,
    voter_id: &str,
    text: &str,
    language_code: Option<&str>,
) -> Result<()> {
    match text {
        "/start" => {
            let welcome_message = format!(
                "{}\n\n{}\n\n{}",
                t_lang("welcome-title", language_code),
                t_lang("welcome-description", language_code),
                t_lang("welcome-commands", language_code)
            );
            bot.send_message(msg.chat.id, welcome_message).await?;
        }
        "/help" => {
            let help_message = format!(
                "{}\n\n{}\n\n{}",
                t_lang("help-title", language_code),
                t_lang("help-steps", language_code),
                t_lang("help-limits", language_code)
            );
            bot.send_message(msg.chat.id, help_message).await?;
        }
        "/status" => {
            status_command(bot, msg, db, voter_id, language_code).await?;
        }
        "/vote" => {
            present_next_dish(bot, msg.chat.id, db, voter_id, language_code).await?;
        }
        "/random" => {
            random_command(bot, msg, db, language_code).await?;
        }
        _ => {
            bot.send_message(msg.chat.id, t_lang("unknown-message", language_code))
                .await?;
        }
    }

    Ok(())
}

/// List the caller's own suggestions with their approval state.
async fn status_command(
    bot: &Bot,
    msg: &Message,
    db: &Database,
    voter_id: &str,
    language_code: Option<&str>,
) -> Result<()> {
    match db.list_by_submitter(voter_id, STATUS_LIMIT).await {
        Ok(dishes) if dishes.is_empty() => {
            bot.send_message(msg.chat.id, t_lang("status-empty", language_code))
                .await?;
        }
        Ok(dishes) => {
            bot.send_message(msg.chat.id, format_status_list(&dishes, language_code))
                .await?;
        }
        Err(e) => {
            error!(voter_id, error = %e, "Failed to list submitter dishes");
            bot.send_message(msg.chat.id, t_lang("error-store", language_code))
                .await?;
        }
    }

    Ok(())
}

/// Show one random approved dish, without vote buttons.
async fn random_command(
    bot: &Bot,
    msg: &Message,
    db: &Database,
    language_code: Option<&str>,
) -> Result<()> {
    match db.get_random_approved(None).await {
        Ok(Some(dish)) => {
            send_dish_card(bot, msg.chat.id, &dish, None, language_code).await?;
        }
        Ok(None) => {
            bot.send_message(msg.chat.id, t_lang("random-empty", language_code))
                .await?;
        }
        Err(e) => {
            error!(error = %e, "Failed to fetch random dish");
            bot.send_message(msg.chat.id, t_lang("error-store", language_code))
                .await?;
        }
    }

    Ok(())
}

/// Select the voter's next dish and present it with vote buttons, or report
/// that the voter has run out of dishes.
pub async fn present_next_dish(
    bot: &Bot,
    chat_id: ChatId,
    db: &Database,
    voter_id: &str,
    language_code: Option<&str>,
) -> Result<()> {
    match selection::next_dish(db, voter_id).await {
        Ok(Some(dish)) => {
            let keyboard = vote_keyboard(dish.id, language_code);
            send_dish_card(bot, chat_id, &dish, Some(keyboard), language_code).await?;
        }
        Ok(None) => {
            bot.send_message(chat_id, t_lang("vote-exhausted", language_code))
                .await?;
        }
        Err(e) => {
            error!(voter_id, error = %e, "Failed to select next dish");
            bot.send_message(chat_id, t_lang("error-store", language_code))
                .await?;
        }
    }

    Ok(())
}

/// Send a dish as a photo with caption when its locator parses as a URL,
/// falling back to a plain text card otherwise.
async fn send_dish_card(
    bot: &Bot,
    chat_id: ChatId,
    dish: &Dish,
    keyboard: Option<InlineKeyboardMarkup>,
    language_code: Option<&str>,
) -> Result<()> {
    let card = format_dish_card(dish, language_code);

    match url::Url::parse(&dish.image_ref) {
        Ok(image_url) => {
            let request = bot
                .send_photo(chat_id, teloxide::types::InputFile::url(image_url))
                .caption(card);
            match keyboard {
                Some(keyboard) => {
                    request.reply_markup(keyboard).await?;
                }
                None => {
                    request.await?;
                }
            }
        }
        Err(_) => {
            let request = bot.send_message(chat_id, card);
            match keyboard {
                Some(keyboard) => {
                    request.reply_markup(keyboard).await?;
                }
                None => {
                    request.await?;
                }
            }
        }
    }

    Ok(())
}
