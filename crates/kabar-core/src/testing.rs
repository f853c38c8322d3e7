//! Port fakes shared by the unit tests.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
};

use async_trait::async_trait;

use crate::{
    domain::{RawArticle, WeatherReading},
    errors::Error,
    model::CompletionClient,
    news::ArticleSource,
    weather::WeatherProvider,
    Result,
};

/// Completion fake that records prompts and replays a scripted outcome.
pub struct FakeCompletion {
    reply: std::result::Result<String, String>,
    missing: Option<&'static str>,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeCompletion {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            missing: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: Err("quota exceeded".to_string()),
            missing: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn without_key() -> Self {
        Self {
            reply: Ok("unused".to_string()),
            missing: Some("GEMINI_API_KEY"),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl CompletionClient for FakeCompletion {
    fn provider(&self) -> &str {
        "fake"
    }

    fn missing_credential(&self) -> Option<&'static str> {
        self.missing
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone().map_err(Error::External)
    }
}

pub enum SourceBehavior {
    Articles(Vec<RawArticle>),
    Unavailable,
    Malformed,
}

pub struct FakeSource {
    behavior: Mutex<SourceBehavior>,
    missing: Option<&'static str>,
    calls: AtomicUsize,
}

impl FakeSource {
    pub fn with(articles: Vec<RawArticle>) -> Self {
        Self::behaving(SourceBehavior::Articles(articles))
    }

    pub fn behaving(behavior: SourceBehavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            missing: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn without_key() -> Self {
        Self {
            missing: Some("NEWS_API_KEY"),
            ..Self::with(Vec::new())
        }
    }

    pub fn set(&self, behavior: SourceBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArticleSource for FakeSource {
    fn name(&self) -> &str {
        "Fake News"
    }

    fn missing_credential(&self) -> Option<&'static str> {
        self.missing
    }

    async fn fetch_latest(&self, limit: usize) -> Result<Vec<RawArticle>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &*self.behavior.lock().unwrap() {
            SourceBehavior::Articles(a) => Ok(a.iter().take(limit).cloned().collect()),
            SourceBehavior::Unavailable => Err(Error::SourceUnavailable(
                "GET https://example.test/rss: connection refused".to_string(),
            )),
            SourceBehavior::Malformed => {
                Err(Error::MalformedResponse("unexpected token at 1:1".to_string()))
            }
        }
    }
}

pub struct FakeWeather {
    outcome: fn(&str) -> Result<WeatherReading>,
    missing: Option<&'static str>,
    pub cities: Mutex<Vec<String>>,
}

impl FakeWeather {
    pub fn sunny() -> Self {
        Self::with(|city| {
            Ok(WeatherReading {
                city: city.to_string(),
                temperature_celsius: 31.5,
                condition: "cerah".to_string(),
                humidity_percent: 70,
            })
        })
    }

    pub fn with(outcome: fn(&str) -> Result<WeatherReading>) -> Self {
        Self {
            outcome,
            missing: None,
            cities: Mutex::new(Vec::new()),
        }
    }

    pub fn without_key() -> Self {
        Self {
            missing: Some("WEATHER_API_KEY"),
            ..Self::sunny()
        }
    }

    pub fn calls(&self) -> usize {
        self.cities.lock().unwrap().len()
    }
}

#[async_trait]
impl WeatherProvider for FakeWeather {
    fn missing_credential(&self) -> Option<&'static str> {
        self.missing
    }

    async fn current(&self, city: &str) -> Result<WeatherReading> {
        self.cities.lock().unwrap().push(city.to_string());
        (self.outcome)(city)
    }
}
