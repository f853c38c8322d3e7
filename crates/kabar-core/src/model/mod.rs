//! Generative-language model port.

pub mod client;

pub use client::CompletionClient;
