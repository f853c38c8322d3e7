/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a sent message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// Article as yielded by an article source, before summarization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawArticle {
    pub title: String,
    pub link: String,
    pub raw_content: String,
    /// Outlet reported by the provider itself (aggregators only).
    pub source: Option<String>,
}

impl RawArticle {
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        raw_content: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            raw_content: raw_content.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Fully assembled article shown to users.
///
/// An empty `summary` means there was nothing to summarize; a fallback
/// excerpt means summarization failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    pub link: String,
    pub summary: String,
    pub source: String,
}

/// Current weather for a user-supplied city.
#[derive(Clone, Debug, PartialEq)]
pub struct WeatherReading {
    pub city: String,
    pub temperature_celsius: f64,
    pub condition: String,
    pub humidity_percent: i64,
}
