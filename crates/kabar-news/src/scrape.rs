use std::collections::HashSet;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

use kabar_core::{
    config::ScrapeSettings, domain::RawArticle, errors::Error, news::ArticleSource,
    utils::collapse_whitespace, Result,
};

use crate::get_body;

struct Selectors {
    item: Selector,
    title: Selector,
    anchor: Selector,
    content: Selector,
}

impl Selectors {
    fn new(settings: &ScrapeSettings) -> Result<Self> {
        Ok(Self {
            item: parse_selector("NEWS_SCRAPE_ITEM_SELECTOR", &settings.item_selector)?,
            title: parse_selector("NEWS_SCRAPE_TITLE_SELECTOR", &settings.title_selector)?,
            anchor: parse_selector("anchor", "a[href]")?,
            content: parse_selector("NEWS_SCRAPE_CONTENT_SELECTOR", &settings.content_selector)?,
        })
    }
}

fn parse_selector(key: &str, css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::Config(format!("{key} {css:?} is not valid CSS: {e}")))
}

/// Scrapes an index page for article cards, then each article page for its
/// body text.
pub struct ScrapeSource {
    name: String,
    index_url: Url,
    selectors: Selectors,
    http: reqwest::Client,
}

impl ScrapeSource {
    pub fn new(
        name: impl Into<String>,
        settings: &ScrapeSettings,
        http: reqwest::Client,
    ) -> Result<Self> {
        let index_url = Url::parse(&settings.index_url).map_err(|e| {
            Error::Config(format!("NEWS_SCRAPE_URL {:?}: {e}", settings.index_url))
        })?;
        Ok(Self {
            name: name.into(),
            index_url,
            selectors: Selectors::new(settings)?,
            http,
        })
    }
}

#[async_trait]
impl ArticleSource for ScrapeSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_latest(&self, limit: usize) -> Result<Vec<RawArticle>> {
        let index = get_body(&self.http, self.index_url.as_str()).await?;
        let entries = parse_index(&index, &self.index_url, &self.selectors, limit);
        debug!(url = %self.index_url, count = entries.len(), "indexed article links");

        let mut articles = Vec::with_capacity(entries.len());
        for (title, link) in entries {
            let content = match get_body(&self.http, &link).await {
                Ok(page) => parse_article(&page, &self.selectors.content),
                Err(e) => {
                    warn!(%link, error = %e, "article page fetch failed");
                    String::new()
                }
            };
            articles.push(RawArticle::new(title, link, content));
        }
        Ok(articles)
    }
}

fn element_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<String>())
}

/// `(title, absolute link)` pairs in document order, de-duplicated by link.
fn parse_index(html: &str, base: &Url, sel: &Selectors, limit: usize) -> Vec<(String, String)> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for card in document.select(&sel.item) {
        if entries.len() >= limit {
            break;
        }

        let anchor = if card.value().name() == "a" && card.value().attr("href").is_some() {
            Some(card)
        } else {
            card.select(&sel.anchor).next()
        };
        let Some(anchor) = anchor else {
            continue;
        };
        let Some(link) = anchor
            .value()
            .attr("href")
            .and_then(|href| base.join(href).ok())
            .map(|u| u.to_string())
        else {
            continue;
        };

        let title = card
            .select(&sel.title)
            .next()
            .map(element_text)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| element_text(anchor));
        if title.is_empty() || !seen.insert(link.clone()) {
            continue;
        }
        entries.push((title, link));
    }
    entries
}

fn parse_article(html: &str, content: &Selector) -> String {
    let document = Html::parse_document(html);
    let parts: Vec<String> = document
        .select(content)
        .map(element_text)
        .filter(|t| !t.is_empty())
        .collect();
    parts.join(" ")
}
