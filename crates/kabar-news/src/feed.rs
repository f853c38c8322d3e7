use async_trait::async_trait;
use scraper::Html;
use tracing::debug;

use kabar_core::{
    domain::RawArticle, errors::Error, news::ArticleSource, utils::collapse_whitespace, Result,
};

use crate::get_body;

pub struct RssSource {
    name: String,
    url: String,
    http: reqwest::Client,
}

impl RssSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            http,
        }
    }
}

#[async_trait]
impl ArticleSource for RssSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_latest(&self, limit: usize) -> Result<Vec<RawArticle>> {
        let body = get_body(&self.http, &self.url).await?;
        let items = parse_feed(&body, limit)?;
        debug!(url = %self.url, count = items.len(), "parsed rss feed");
        Ok(items)
    }
}

fn parse_feed(body: &str, limit: usize) -> Result<Vec<RawArticle>> {
    let channel = rss::Channel::read_from(body.as_bytes())
        .map_err(|e| Error::MalformedResponse(format!("rss parse error: {e}")))?;

    Ok(channel
        .items()
        .iter()
        .take(limit)
        .map(|item| {
            RawArticle::new(
                item.title().unwrap_or_default().trim(),
                item.link().unwrap_or_default().trim(),
                strip_html(item.description().unwrap_or_default()),
            )
        })
        .collect())
}

/// Plain text of an HTML fragment, whitespace collapsed.
fn strip_html(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text: Vec<&str> = fragment.root_element().text().collect();
    collapse_whitespace(&text.join(" "))
}
