//! Core domain and application logic for the kabar news bot.
//!
//! Framework-agnostic: Telegram, Gemini, the news providers and
//! OpenWeatherMap live behind ports (traits) implemented in adapter crates.

pub mod assistant;
pub mod cache;
pub mod config;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod messaging;
pub mod model;
pub mod news;
pub mod summarizer;
pub mod utils;
pub mod weather;

#[cfg(test)]
mod testing;

pub use errors::{Error, Result};
