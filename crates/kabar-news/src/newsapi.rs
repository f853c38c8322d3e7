use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use kabar_core::{
    config::NewsApiSettings, domain::RawArticle, errors::Error, news::ArticleSource, Result,
};

use crate::read_body;

/// NewsAPI `top-headlines`. Needs `NEWS_API_KEY`.
pub struct NewsApiSource {
    name: String,
    settings: NewsApiSettings,
    http: reqwest::Client,
}

impl NewsApiSource {
    pub fn new(name: impl Into<String>, settings: NewsApiSettings, http: reqwest::Client) -> Self {
        Self {
            name: name.into(),
            settings,
            http,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Headlines {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<ApiArticle>,
}

#[derive(Debug, Deserialize)]
struct ApiArticle {
    #[serde(default)]
    source: Option<ApiSource>,
    title: Option<String>,
    url: Option<String>,
    description: Option<String>,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiSource {
    name: Option<String>,
}

#[async_trait]
impl ArticleSource for NewsApiSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn missing_credential(&self) -> Option<&'static str> {
        self.settings.api_key.is_none().then_some("NEWS_API_KEY")
    }

    async fn fetch_latest(&self, limit: usize) -> Result<Vec<RawArticle>> {
        let Some(api_key) = self.settings.api_key.as_deref() else {
            return Err(Error::MissingCredential("NEWS_API_KEY"));
        };

        let url = format!(
            "{}/v2/top-headlines",
            self.settings.base_url.trim_end_matches('/')
        );
        let mut query = vec![
            ("country", self.settings.country.clone()),
            ("pageSize", limit.to_string()),
        ];
        if let Some(language) = &self.settings.language {
            query.push(("language", language.clone()));
        }

        let req = self
            .http
            .get(&url)
            .header("X-Api-Key", api_key)
            .query(&query);
        let body = read_body(req, &url).await?;
        let items = parse_headlines(&body, limit)?;
        debug!(count = items.len(), "parsed newsapi headlines");
        Ok(items)
    }
}

fn parse_headlines(body: &str, limit: usize) -> Result<Vec<RawArticle>> {
    let resp: Headlines = serde_json::from_str(body)
        .map_err(|e| Error::MalformedResponse(format!("newsapi json error: {e}")))?;

    if resp.status != "ok" {
        return Err(Error::SourceUnavailable(format!(
            "newsapi status {:?}: {}",
            resp.status,
            resp.message.unwrap_or_default()
        )));
    }

    Ok(resp
        .articles
        .into_iter()
        .filter_map(|a| {
            let title = a.title.filter(|t| !t.trim().is_empty() && t != "[Removed]")?;
            let url = a.url.filter(|u| !u.trim().is_empty())?;
            let content = a
                .description
                .filter(|d| !d.trim().is_empty())
                .or(a.content)
                .unwrap_or_default();
            let article = RawArticle::new(title.trim(), url.trim(), content.trim());
            Some(match a.source.and_then(|s| s.name) {
                Some(outlet) if !outlet.trim().is_empty() => article.with_source(outlet.trim()),
                _ => article,
            })
        })
        .take(limit)
        .collect())
}
