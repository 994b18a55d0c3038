//! Callback Handler module for processing vote button presses

use std::sync::Arc;

use anyhow::Result;
use teloxide::prelude::*;
use tracing::{debug, error};

use crate::db::Database;
use crate::localization::t_lang;
use crate::voting::{parse_vote_callback, record_vote, VoteOutcome};

use super::message_handler::present_next_dish;

/// Handle a `vote:<dish_id>:<polarity>` callback.
///
/// A recorded vote is acknowledged and immediately followed by the next dish;
/// a duplicate vote is reported without touching anything.
pub async fn callback_handler(bot: Bot, q: CallbackQuery, db: Arc<Database>) -> Result<()> {
    debug!(user_id = %q.from.id, "Received callback query from user");

    let voter_id = q.from.id.to_string();
    let language_code = q.from.language_code.clone();
    let language_code = language_code.as_deref();

    let Some((dish_id, polarity)) = q.data.as_deref().and_then(parse_vote_callback) else {
        // Stale or foreign payload; just stop the client's spinner
        bot.answer_callback_query(q.id).await?;
        return Ok(());
    };

    match record_vote(&db, &voter_id, dish_id, polarity).await {
        Ok(VoteOutcome::Recorded) => {
            bot.answer_callback_query(q.id.clone())
                .text(t_lang("vote-recorded", language_code))
                .await?;

            if let Some(message) = &q.message {
                // Retire the used vote buttons, then move on to the next dish
                if let Err(e) = bot
                    .edit_message_reply_markup(message.chat().id, message.id())
                    .await
                {
                    debug!(error = %e, "Failed to clear vote keyboard");
                }

                present_next_dish(&bot, message.chat().id, &db, &voter_id, language_code).await?;
            }
        }
        Ok(VoteOutcome::AlreadyVoted) => {
            bot.answer_callback_query(q.id)
                .text(t_lang("vote-already", language_code))
                .await?;
        }
        Err(e) => {
            error!(voter_id = %voter_id, dish_id, error = %e, "Failed to record vote");
            bot.answer_callback_query(q.id)
                .text(t_lang("error-store", language_code))
                .await?;
        }
    }

    Ok(())
}
