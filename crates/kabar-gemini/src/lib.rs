//! Gemini adapter (text completion).
//!
//! One `generateContent` request per prompt; no conversation state.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use kabar_core::{errors::Error, model::CompletionClient, Result};

#[derive(Clone, Debug)]
pub struct GeminiClient {
    api_key: Option<String>,
    model: String,
    base_url: String,
    http: reqwest::Client,
}

impl GeminiClient {
    /// `api_key: None` builds a client that reports `GEMINI_API_KEY` as
    /// missing instead of calling the API.
    pub fn new(
        api_key: Option<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("gemini http client: {e}")))?;
        Ok(Self {
            api_key,
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// Concatenated text of the first candidate.
fn extract_text(body: &str) -> Result<String> {
    let resp: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| Error::MalformedResponse(format!("gemini json error: {e}")))?;

    let candidate = resp
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| Error::MalformedResponse("gemini returned no candidates".to_string()))?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(Error::MalformedResponse(
            "gemini returned empty text".to_string(),
        ));
    }
    Ok(text)
}

#[async_trait]
impl CompletionClient for GeminiClient {
    fn provider(&self) -> &str {
        "gemini"
    }

    fn missing_credential(&self) -> Option<&'static str> {
        self.api_key.is_none().then_some("GEMINI_API_KEY")
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(Error::MissingCredential("GEMINI_API_KEY"));
        };

        let request = GenerateRequest {
            contents: [Content {
                role: "user",
                parts: [Part { text: prompt }],
            }],
        };

        debug!(model = %self.model, prompt_chars = prompt.chars().count(), "gemini request");
        let resp = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::External(format!("gemini request error: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| Error::External(format!("gemini read error: {e}")))?;

        if !status.is_success() {
            return Err(Error::External(format!(
                "gemini generateContent failed: {status} {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        extract_text(&body)
    }
}
