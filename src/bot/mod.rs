//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules for better organization:
//! - `message_handler`: Handles incoming commands and wizard step messages
//! - `callback_handler`: Handles vote button callback queries
//! - `dialogue_manager`: Drives the suggestion wizard's state transitions
//! - `ui_builder`: Creates keyboards and formats messages

pub mod callback_handler;
pub mod dialogue_manager;
pub mod message_handler;
pub mod ui_builder;

// Re-export main handler functions for use in main.rs
pub use callback_handler::callback_handler;
pub use message_handler::{message_handler, present_next_dish};

// Re-export formatting helpers used elsewhere
pub use ui_builder::{format_dish_card, format_draft_preview, format_status_list};
