//! UI Builder module for creating keyboards and formatting messages

use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup as ReplyKeyboardMarkup,
};

use crate::db::Dish;
use crate::dialogue::DishDraft;
use crate::localization::{t_args_lang, t_lang};
use crate::voting::{vote_callback_data, Polarity};

/// Render a price the way it is shown to users.
pub fn format_price(price: f64) -> String {
    format!("{price:.2}")
}

/// Reply keyboard with a single cancel button, shown during wizard steps.
pub fn cancel_keyboard(language_code: Option<&str>) -> ReplyKeyboardMarkup {
    let mut markup = ReplyKeyboardMarkup::new(vec![vec![KeyboardButton::new(t_lang(
        "button-cancel",
        language_code,
    ))]]);
    markup.resize_keyboard = true;
    markup
}

/// Reply keyboard for the description step: skip sentinel plus cancel.
pub fn description_keyboard(language_code: Option<&str>) -> ReplyKeyboardMarkup {
    let mut markup = ReplyKeyboardMarkup::new(vec![vec![
        KeyboardButton::new(t_lang("button-skip", language_code)),
        KeyboardButton::new(t_lang("button-cancel", language_code)),
    ]]);
    markup.resize_keyboard = true;
    markup
}

/// Reply keyboard for the confirmation step.
pub fn confirm_keyboard(language_code: Option<&str>) -> ReplyKeyboardMarkup {
    let mut markup = ReplyKeyboardMarkup::new(vec![
        vec![KeyboardButton::new(t_lang("button-confirm", language_code))],
        vec![KeyboardButton::new(t_lang("button-reject", language_code))],
    ]);
    markup.resize_keyboard = true;
    markup.one_time_keyboard = true;
    markup
}

/// Inline like/dislike buttons for one dish.
pub fn vote_keyboard(dish_id: i64, language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback(
            t_lang("button-like", language_code),
            vote_callback_data(dish_id, Polarity::Like),
        ),
        InlineKeyboardButton::callback(
            t_lang("button-dislike", language_code),
            vote_callback_data(dish_id, Polarity::Dislike),
        ),
    ]])
}

/// Format the pre-commit preview of a captured suggestion.
pub fn format_draft_preview(draft: &DishDraft, language_code: Option<&str>) -> String {
    let description = draft
        .description
        .clone()
        .unwrap_or_else(|| t_lang("preview-none", language_code));

    format!(
        "{}\n\n{}\n{}\n{}\n{}\n\n{}",
        t_lang("preview-title", language_code),
        t_lang("preview-photo", language_code),
        t_args_lang("preview-name", &[("name", &draft.name)], language_code),
        t_args_lang(
            "preview-description",
            &[("description", &description)],
            language_code,
        ),
        t_args_lang(
            "preview-price",
            &[("price", &format_price(draft.price))],
            language_code,
        ),
        t_lang("preview-question", language_code),
    )
}

/// Format the caption shown under a dish during voting or browsing.
pub fn format_dish_card(dish: &Dish, language_code: Option<&str>) -> String {
    let mut card = dish.name.clone();

    if let Some(description) = &dish.description {
        card.push('\n');
        card.push_str(description);
    }

    card.push('\n');
    card.push_str(&t_args_lang(
        "dish-price",
        &[("price", &format_price(dish.price))],
        language_code,
    ));

    card
}

/// Format a submitter's own dishes as a numbered status list.
pub fn format_status_list(dishes: &[Dish], language_code: Option<&str>) -> String {
    let mut result = t_lang("status-title", language_code);
    result.push('\n');

    for (i, dish) in dishes.iter().enumerate() {
        let marker = if dish.approved {
            t_lang("status-approved", language_code)
        } else {
            t_lang("status-pending", language_code)
        };
        result.push_str(&format!("\n{}. {} - {}", i + 1, dish.name, marker));
    }

    result
}
