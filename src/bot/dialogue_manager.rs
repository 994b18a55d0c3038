//! Dialogue Manager module for the suggestion wizard's step transitions

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::KeyboardRemove as ReplyKeyboardRemove;
use tracing::{error, info};

use crate::db::Database;
use crate::dialogue::{
    parse_price, validate_description, validate_dish_name, DishDraft, SuggestDialogue,
    SuggestState,
};
use crate::localization::{t_args_lang, t_lang};

use super::ui_builder::{
    cancel_keyboard, confirm_keyboard, description_keyboard, format_draft_preview,
};

/// Enter the wizard at the photo step, discarding any draft in progress.
pub async fn start_wizard(
    bot: &Bot,
    msg: &Message,
    dialogue: &SuggestDialogue,
    language_code: Option<&str>,
) -> Result<()> {
    let prompt = format!(
        "{}\n\n{}",
        t_lang("suggest-intro", language_code),
        t_lang("suggest-step-photo", language_code)
    );
    bot.send_message(msg.chat.id, prompt)
        .reply_markup(cancel_keyboard(language_code))
        .await?;

    dialogue.update(SuggestState::AwaitingPhoto).await?;
    Ok(())
}

/// Cancel the wizard: destroy the session, never create a dish.
pub async fn cancel_wizard(
    bot: &Bot,
    msg: &Message,
    dialogue: &SuggestDialogue,
    language_code: Option<&str>,
) -> Result<()> {
    dialogue.exit().await?;

    bot.send_message(msg.chat.id, t_lang("suggestion-cancelled", language_code))
        .reply_markup(ReplyKeyboardRemove::new())
        .await?;
    Ok(())
}

/// Handle a photo at the photo step: resolve it into an opaque locator URL.
///
/// The bytes are never downloaded or inspected here; the locator is all the
/// store keeps.
pub async fn handle_photo_input(
    bot: &Bot,
    msg: &Message,
    dialogue: &SuggestDialogue,
    language_code: Option<&str>,
) -> Result<()> {
    let Some(largest_photo) = msg.photo().and_then(|photos| photos.last()) else {
        return Ok(());
    };

    match bot.get_file(largest_photo.file.id.clone()).await {
        Ok(file) => {
            let photo_ref = format!(
                "https://api.telegram.org/file/bot{}/{}",
                bot.token(),
                file.path
            );

            let reply = format!(
                "{}\n\n{}",
                t_lang("photo-received", language_code),
                t_lang("suggest-step-name", language_code)
            );
            bot.send_message(msg.chat.id, reply)
                .reply_markup(cancel_keyboard(language_code))
                .await?;

            dialogue.update(SuggestState::AwaitingName { photo_ref }).await?;
        }
        Err(e) => {
            error!(user_id = %msg.chat.id, error = %e, "Failed to resolve photo file");
            bot.send_message(msg.chat.id, t_lang("error-photo-fetch", language_code))
                .await?;
            // Stay at the photo step so the user can try another photo
        }
    }

    Ok(())
}

/// Handle name input: validate length, then move on to the description step.
pub async fn handle_name_input(
    bot: &Bot,
    msg: &Message,
    dialogue: &SuggestDialogue,
    photo_ref: String,
    name_input: &str,
    language_code: Option<&str>,
) -> Result<()> {
    match validate_dish_name(name_input) {
        Ok(name) => {
            let reply = format!(
                "{}\n\n{}",
                t_args_lang("name-accepted", &[("name", &name)], language_code),
                t_lang("suggest-step-description", language_code)
            );
            bot.send_message(msg.chat.id, reply)
                .reply_markup(description_keyboard(language_code))
                .await?;

            dialogue
                .update(SuggestState::AwaitingDescription { photo_ref, name })
                .await?;
        }
        Err(_) => {
            bot.send_message(msg.chat.id, t_lang("error-name-length", language_code))
                .await?;
            // Keep dialogue state, user can try again
        }
    }

    Ok(())
}

/// Handle description input: `"-"` skips, anything else is kept verbatim.
pub async fn handle_description_input(
    bot: &Bot,
    msg: &Message,
    dialogue: &SuggestDialogue,
    photo_ref: String,
    name: String,
    description_input: &str,
    language_code: Option<&str>,
) -> Result<()> {
    match validate_description(description_input) {
        Ok(description) => {
            let status_key = if description.is_some() {
                "description-accepted"
            } else {
                "description-skipped"
            };
            let reply = format!(
                "{}\n\n{}",
                t_lang(status_key, language_code),
                t_lang("suggest-step-price", language_code)
            );
            bot.send_message(msg.chat.id, reply)
                .reply_markup(cancel_keyboard(language_code))
                .await?;

            dialogue
                .update(SuggestState::AwaitingPrice {
                    photo_ref,
                    name,
                    description,
                })
                .await?;
        }
        Err(_) => {
            bot.send_message(
                msg.chat.id,
                t_lang("error-description-too-long", language_code),
            )
            .await?;
        }
    }

    Ok(())
}

/// Handle price input; on success show the preview and ask for confirmation.
pub async fn handle_price_input(
    bot: &Bot,
    msg: &Message,
    dialogue: &SuggestDialogue,
    photo_ref: String,
    name: String,
    description: Option<String>,
    price_input: &str,
    language_code: Option<&str>,
) -> Result<()> {
    match parse_price(price_input) {
        Ok(price) => {
            let draft = DishDraft {
                photo_ref,
                name,
                description,
                price,
            };

            bot.send_message(msg.chat.id, format_draft_preview(&draft, language_code))
                .reply_markup(confirm_keyboard(language_code))
                .await?;

            dialogue
                .update(SuggestState::AwaitingConfirmation { draft })
                .await?;
        }
        Err("out_of_range") => {
            bot.send_message(msg.chat.id, t_lang("error-price-range", language_code))
                .await?;
        }
        Err(_) => {
            bot.send_message(msg.chat.id, t_lang("error-price-invalid", language_code))
                .await?;
        }
    }

    Ok(())
}

/// Handle the confirmation step.
///
/// Only the affirmative button label commits; any other input is rejection.
/// Either way the session ends here — a store failure is reported but not
/// retried, and no half-written session survives.
pub async fn handle_confirmation_input(
    bot: &Bot,
    msg: &Message,
    dialogue: &SuggestDialogue,
    db: &Database,
    submitter_id: &str,
    draft: DishDraft,
    confirmation_input: &str,
    language_code: Option<&str>,
) -> Result<()> {
    if confirmation_input == t_lang("button-confirm", language_code) {
        match db
            .insert_dish(
                &draft.photo_ref,
                &draft.name,
                draft.description.as_deref(),
                draft.price,
                submitter_id,
            )
            .await
        {
            Ok(dish_id) => {
                info!(submitter_id, dish_id, name = %draft.name, "New dish suggested");
                let reply = format!(
                    "{}\n\n{}",
                    t_lang("suggestion-submitted", language_code),
                    t_lang("suggestion-submitted-hint", language_code)
                );
                bot.send_message(msg.chat.id, reply)
                    .reply_markup(ReplyKeyboardRemove::new())
                    .await?;
            }
            Err(e) => {
                error!(submitter_id, error = %e, "Failed to save dish suggestion");
                bot.send_message(msg.chat.id, t_lang("error-store", language_code))
                    .reply_markup(ReplyKeyboardRemove::new())
                    .await?;
            }
        }

        dialogue.exit().await?;
    } else {
        dialogue.exit().await?;
        bot.send_message(msg.chat.id, t_lang("suggestion-cancelled", language_code))
            .reply_markup(ReplyKeyboardRemove::new())
            .await?;
    }

    Ok(())
}
