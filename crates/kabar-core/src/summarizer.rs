//! AI summaries with a degraded fallback.
//!
//! A summary is decoration on top of an article's title and link, so this
//! module never returns an error: every failure maps to [`SummaryFallback`].

use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    model::CompletionClient,
    utils::{collapse_whitespace, truncate_chars},
};

/// What to show when the model cannot produce a summary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SummaryFallback {
    /// Show nothing.
    Empty,
    /// Show the first `max_chars` characters of the source text.
    Excerpt { max_chars: usize },
}

impl SummaryFallback {
    /// `0` selects [`SummaryFallback::Empty`].
    pub fn from_chars(max_chars: usize) -> Self {
        if max_chars == 0 {
            Self::Empty
        } else {
            Self::Excerpt { max_chars }
        }
    }

    fn apply(self, text: &str) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Excerpt { max_chars } => truncate_chars(&collapse_whitespace(text), max_chars),
        }
    }
}

pub struct Summarizer {
    client: Arc<dyn CompletionClient>,
    fallback: SummaryFallback,
}

impl Summarizer {
    pub fn new(client: Arc<dyn CompletionClient>, fallback: SummaryFallback) -> Self {
        Self { client, fallback }
    }

    pub async fn summarize(&self, text: &str, max_sentences: usize) -> String {
        if text.trim().is_empty() {
            return String::new();
        }

        if let Some(key) = self.client.missing_credential() {
            debug!(credential = key, "summarizer not configured, using fallback");
            return self.fallback.apply(text);
        }

        match self.client.complete(&build_prompt(text, max_sentences)).await {
            Ok(summary) if !summary.trim().is_empty() => summary.trim().to_string(),
            Ok(_) => {
                warn!(provider = self.client.provider(), "summary came back empty");
                self.fallback.apply(text)
            }
            Err(e) => {
                warn!(
                    provider = self.client.provider(),
                    kind = e.kind(),
                    error = %e,
                    "summarization failed"
                );
                self.fallback.apply(text)
            }
        }
    }
}

fn build_prompt(content: &str, max_sentences: usize) -> String {
    let content = content.trim();
    let mut prompt = String::with_capacity(content.len() + 96);
    prompt.push_str(&format!(
        "Buat ringkasan singkat (maksimal {max_sentences} kalimat) dari berita berikut:\n\n"
    ));
    prompt.push_str(content);
    prompt
}
