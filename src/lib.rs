//! # Dish Suggestion Telegram Bot
//!
//! A Telegram bot that collects dish suggestions (photo, name, description,
//! price) through a guided dialogue and serves approved dishes back to users
//! for like/dislike voting, preferring the least-voted dishes first.

pub mod bot;
pub mod db;
pub mod dialogue;
pub mod localization;
pub mod selection;
pub mod voting;
