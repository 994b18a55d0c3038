//! Suggestion wizard state and input validation.
//!
//! The wizard walks one user through photo → name → description → price →
//! confirmation. Each variant carries exactly the fields validated so far, so
//! a session can never hold half-validated data for a later step.

use serde::{Deserialize, Serialize};
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MAX_CHARS: usize = 500;
pub const PRICE_MAX: f64 = 1_000_000.0;

/// Sentinel the user sends to skip the description step.
pub const DESCRIPTION_SKIP: &str = "-";

/// Conversation state of the suggestion wizard.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum SuggestState {
    /// No suggestion in progress; regular commands are handled here
    #[default]
    Idle,
    AwaitingPhoto,
    AwaitingName {
        photo_ref: String,
    },
    AwaitingDescription {
        photo_ref: String,
        name: String,
    },
    AwaitingPrice {
        photo_ref: String,
        name: String,
        description: Option<String>,
    },
    AwaitingConfirmation {
        draft: DishDraft,
    },
}

/// A fully captured suggestion awaiting the user's confirmation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DishDraft {
    pub photo_ref: String,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
}

/// Type alias for the suggestion dialogue
pub type SuggestDialogue = Dialogue<SuggestState, InMemStorage<SuggestState>>;

/// Validate a dish name: trimmed, 2 to 100 characters.
///
/// Lengths are counted in characters, not bytes, so Cyrillic names get the
/// same limit as ASCII ones.
pub fn validate_dish_name(input: &str) -> Result<String, &'static str> {
    let trimmed = input.trim();
    let chars = trimmed.chars().count();

    if chars < NAME_MIN_CHARS {
        return Err("too_short");
    }
    if chars > NAME_MAX_CHARS {
        return Err("too_long");
    }

    Ok(trimmed.to_string())
}

/// Validate a description: the `"-"` sentinel means no description,
/// anything else is kept verbatim up to 500 characters.
pub fn validate_description(input: &str) -> Result<Option<String>, &'static str> {
    let trimmed = input.trim();

    if trimmed == DESCRIPTION_SKIP || trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > DESCRIPTION_MAX_CHARS {
        return Err("too_long");
    }

    Ok(Some(trimmed.to_string()))
}

/// Parse a price, accepting comma or dot as the fractional separator.
pub fn parse_price(input: &str) -> Result<f64, &'static str> {
    let normalized = input.trim().replace(',', ".");

    let price: f64 = normalized.parse().map_err(|_| "not_a_number")?;
    // f64::parse accepts "inf" and "NaN"; NaN would slip through the range
    // comparison below
    if !price.is_finite() {
        return Err("not_a_number");
    }
    if price < 0.0 || price > PRICE_MAX {
        return Err("out_of_range");
    }

    Ok(price)
}
