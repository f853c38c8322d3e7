//! News providers behind `kabar_core::news::ArticleSource`.
//!
//! - [`RssSource`]: an RSS 2.0 feed
//! - [`ScrapeSource`]: an HTML index page plus each linked article
//! - [`NewsApiSource`]: the NewsAPI `top-headlines` endpoint

mod feed;
mod newsapi;
mod scrape;

use std::time::Duration;

use kabar_core::{errors::Error, Result};
use reqwest::StatusCode;

pub use crate::feed::RssSource;
pub use crate::newsapi::NewsApiSource;
pub use crate::scrape::ScrapeSource;

const USER_AGENT: &str = concat!("kabar/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client for every provider.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| Error::Config(format!("news http client: {e}")))
}

/// GET `url` and return the body.
async fn get_body(http: &reqwest::Client, url: &str) -> Result<String> {
    read_body(http.get(url), url).await
}

/// Send `req` and return the body; transport errors and non-success statuses
/// are `SourceUnavailable`.
async fn read_body(req: reqwest::RequestBuilder, label: &str) -> Result<String> {
    let resp = req
        .send()
        .await
        .map_err(|e| Error::SourceUnavailable(format!("GET {label}: {e}")))?;

    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| Error::SourceUnavailable(format!("GET {label}: {e}")))?;

    match status_error(status, label, &body) {
        Some(err) => Err(err),
        None => Ok(body),
    }
}

fn status_error(status: StatusCode, label: &str, body: &str) -> Option<Error> {
    (!status.is_success()).then(|| {
        Error::SourceUnavailable(format!(
            "GET {label}: {status} {}",
            body.chars().take(200).collect::<String>()
        ))
    })
}
