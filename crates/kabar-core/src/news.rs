//! News pipeline: fetch raw articles, summarize each, cache the assembled list.

use std::{fmt::Write as _, sync::Arc};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::{
    cache::TtlCache,
    domain::{Article, RawArticle},
    errors::Error,
    formatting::{convert_markdown_to_html, escape_html},
    messaging::types::ParseMode,
    summarizer::Summarizer,
    Result,
};

/// Provider of raw headline records (RSS feed, scraped page, REST API).
///
/// Implementations return at most `limit` items in the provider's own order
/// and report "nothing published" as an empty vector, never as an error.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// Human-readable provider name, also used as the article source label.
    fn name(&self) -> &str;

    /// Name of the credential this source needs but does not have, if any.
    fn missing_credential(&self) -> Option<&'static str> {
        None
    }

    async fn fetch_latest(&self, limit: usize) -> Result<Vec<RawArticle>>;
}

#[derive(Clone, Copy, Debug)]
pub struct NewsOptions {
    pub limit: usize,
    pub max_sentences: usize,
}

impl Default for NewsOptions {
    fn default() -> Self {
        Self {
            limit: 5,
            max_sentences: 3,
        }
    }
}

pub struct NewsService {
    source: Arc<dyn ArticleSource>,
    summarizer: Summarizer,
    cache: TtlCache<(), Vec<Article>>,
    opts: NewsOptions,
}

impl NewsService {
    pub fn new(
        source: Arc<dyn ArticleSource>,
        summarizer: Summarizer,
        cache: TtlCache<(), Vec<Article>>,
        opts: NewsOptions,
    ) -> Self {
        Self {
            source,
            summarizer,
            cache,
            opts,
        }
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Latest summarized articles, served from cache while fresh.
    pub async fn latest(&self) -> Result<Arc<Vec<Article>>> {
        if let Some(key) = self.source.missing_credential() {
            return Err(Error::MissingCredential(key));
        }
        self.cache.get_or_fetch((), || self.assemble()).await
    }

    async fn assemble(&self) -> Result<Vec<Article>> {
        let raw = self.source.fetch_latest(self.opts.limit).await?;
        info!(
            source = self.source.name(),
            count = raw.len(),
            "fetched articles"
        );

        let mut articles = Vec::with_capacity(raw.len());
        for item in raw.into_iter().take(self.opts.limit) {
            let summary = if item.raw_content.trim().is_empty() {
                debug!(title = %item.title, "no content to summarize");
                String::new()
            } else {
                self.summarizer
                    .summarize(&item.raw_content, self.opts.max_sentences)
                    .await
            };

            articles.push(Article {
                source: item.source.unwrap_or_else(|| self.source.name().to_string()),
                title: item.title,
                link: item.link,
                summary,
            });
        }
        Ok(articles)
    }
}

/// Render articles as one numbered message, preserving their order.
pub fn render_news(articles: &[Article], heading_source: &str, mode: ParseMode) -> String {
    let mut out = String::new();
    match mode {
        ParseMode::Plain => {
            let _ = write!(out, "📰 Berita Terkini dari {heading_source}:\n\n");
            for (i, a) in articles.iter().enumerate() {
                let _ = writeln!(out, "{}. {}", i + 1, a.title);
                if !a.source.is_empty() {
                    let _ = writeln!(out, "   Sumber: {}", a.source);
                }
                if !a.summary.is_empty() {
                    let _ = writeln!(out, "   Ringkasan: {}", a.summary);
                }
                let _ = write!(out, "   Link: {}\n\n", a.link);
            }
        }
        ParseMode::Html => {
            let _ = write!(
                out,
                "📰 <b>Berita Terkini dari {}</b>\n\n",
                escape_html(heading_source)
            );
            for (i, a) in articles.iter().enumerate() {
                let _ = writeln!(out, "{}. <b>{}</b>", i + 1, escape_html(&a.title));
                if !a.source.is_empty() {
                    let _ = writeln!(out, "   <i>Sumber: {}</i>", escape_html(&a.source));
                }
                if !a.summary.is_empty() {
                    let _ = writeln!(
                        out,
                        "   Ringkasan: {}",
                        convert_markdown_to_html(&a.summary)
                    );
                }
                let link = escape_html(&a.link);
                let _ = write!(out, "   Link: <a href=\"{link}\">{link}</a>\n\n");
            }
        }
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summarizer::SummaryFallback;
    use crate::testing::{FakeCompletion, FakeSource, SourceBehavior};
    use crate::utils::test_clock::ManualClock;
    use std::time::Duration;

    fn service(
        source: Arc<FakeSource>,
        model: Arc<FakeCompletion>,
        clock: Arc<ManualClock>,
    ) -> NewsService {
        NewsService::new(
            source,
            Summarizer::new(model, SummaryFallback::from_chars(40)),
            TtlCache::new(Duration::from_secs(900), clock),
            NewsOptions::default(),
        )
    }

    fn raw(n: usize) -> Vec<RawArticle> {
        (1..=n)
            .map(|i| RawArticle::new(format!("Judul {i}"), format!("http://x/{i}"), format!("Isi {i}")))
            .collect()
    }

    #[tokio::test]
    async fn empty_content_is_not_summarized() {
        let source = Arc::new(FakeSource::with(vec![
            RawArticle::new("Tanpa isi", "http://a", "  "),
            RawArticle::new("Dengan isi", "http://b", "Isi B"),
        ]));
        let model = Arc::new(FakeCompletion::replying("Sum B"));
        let news = service(source, model.clone(), Arc::new(ManualClock::new()));

        let articles = news.latest().await.unwrap();
        assert_eq!(articles[0].summary, "");
        assert_eq!(articles[1].summary, "Sum B");
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn failing_summarizer_keeps_every_article() {
        let source = Arc::new(FakeSource::with(raw(3)));
        let news = service(
            source,
            Arc::new(FakeCompletion::failing()),
            Arc::new(ManualClock::new()),
        );

        let articles = news.latest().await.unwrap();
        assert_eq!(articles.len(), 3);
        for (i, a) in articles.iter().enumerate() {
            assert_eq!(a.title, format!("Judul {}", i + 1));
            assert_eq!(a.link, format!("http://x/{}", i + 1));
            assert_eq!(a.summary, format!("Isi {}", i + 1));
            assert_eq!(a.source, "Fake News");
        }
    }

    #[tokio::test]
    async fn fetches_at_most_the_limit_in_source_order() {
        let source = Arc::new(FakeSource::with(raw(8)));
        let news = service(
            source,
            Arc::new(FakeCompletion::replying("s")),
            Arc::new(ManualClock::new()),
        );
        let titles: Vec<_> = news
            .latest()
            .await
            .unwrap()
            .iter()
            .map(|a| a.title.clone())
            .collect();
        assert_eq!(titles, ["Judul 1", "Judul 2", "Judul 3", "Judul 4", "Judul 5"]);
    }

    #[tokio::test]
    async fn provider_source_label_wins() {
        let source = Arc::new(FakeSource::with(vec![
            RawArticle::new("T", "http://t", "").with_source("Kompas")
        ]));
        let news = service(
            source,
            Arc::new(FakeCompletion::replying("s")),
            Arc::new(ManualClock::new()),
        );
        assert_eq!(news.latest().await.unwrap()[0].source, "Kompas");
    }

    #[tokio::test]
    async fn cached_within_window_and_stale_kept_on_failure() {
        let clock = Arc::new(ManualClock::new());
        let source = Arc::new(FakeSource::with(raw(1)));
        let news = service(source.clone(), Arc::new(FakeCompletion::replying("s")), clock.clone());

        let first = news.latest().await.unwrap();
        let second = news.latest().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.calls(), 1);

        clock.advance(Duration::from_secs(901));
        source.set(SourceBehavior::Unavailable);
        assert!(matches!(
            news.latest().await,
            Err(Error::SourceUnavailable(_))
        ));
        assert_eq!(source.calls(), 2);

        source.set(SourceBehavior::Articles(raw(2)));
        let refreshed = news.latest().await.unwrap();
        assert_eq!(refreshed.len(), 2);
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn missing_credential_short_circuits() {
        let source = Arc::new(FakeSource::without_key());
        let news = service(
            source.clone(),
            Arc::new(FakeCompletion::replying("s")),
            Arc::new(ManualClock::new()),
        );
        assert!(matches!(
            news.latest().await,
            Err(Error::MissingCredential("NEWS_API_KEY"))
        ));
        assert_eq!(source.calls(), 0);
    }

    #[test]
    fn renders_numbered_entries_in_order() {
        let articles = vec![Article {
            title: "Title A".to_string(),
            link: "http://a".to_string(),
            summary: "Sum A".to_string(),
            source: "CNN Indonesia".to_string(),
        }];
        let text = render_news(&articles, "CNN Indonesia", ParseMode::Plain);

        let title = text.find("1. Title A").unwrap();
        let summary = text.find("Ringkasan: Sum A").unwrap();
        let link = text.find("http://a").unwrap();
        assert!(title < summary && summary < link);
        assert!(text.starts_with("📰 Berita Terkini dari CNN Indonesia:"));
    }

    #[test]
    fn omits_empty_summary_and_source_lines() {
        let articles = vec![Article {
            title: "T".to_string(),
            link: "http://t".to_string(),
            summary: String::new(),
            source: String::new(),
        }];
        let text = render_news(&articles, "X", ParseMode::Plain);
        assert!(!text.contains("Ringkasan"));
        assert!(!text.contains("Sumber"));
        assert!(text.ends_with("Link: http://t"));
    }

    #[test]
    fn html_mode_escapes_user_visible_text() {
        let articles = vec![Article {
            title: "A < B & C".to_string(),
            link: "http://a?x=1&y=2".to_string(),
            summary: "**Penting**".to_string(),
            source: "S".to_string(),
        }];
        let html = render_news(&articles, "S", ParseMode::Html);
        assert!(html.contains("1. <b>A &lt; B &amp; C</b>"));
        assert!(html.contains(r#"<a href="http://a?x=1&amp;y=2">"#));
        assert!(html.contains("Ringkasan: <b>Penting</b>"));
    }
}
