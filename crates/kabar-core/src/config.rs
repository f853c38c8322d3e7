use std::{env, fs, path::Path, time::Duration};

use crate::{errors::Error, messaging::types::ParseMode, Result};

pub const DEFAULT_PERSONALITY: &str =
    "Saya adalah asisten AI profesional yang ramah dan siap membantu Anda.";
pub const DEFAULT_RESPONSE_INSTRUCTION: &str =
    "Respon harus profesional, informatif, dan tetap ramah.";

/// Which article source backs the news command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NewsProviderKind {
    Rss,
    Scrape,
    NewsApi,
}

impl NewsProviderKind {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "rss" | "feed" => Some(Self::Rss),
            "scrape" | "html" => Some(Self::Scrape),
            "newsapi" | "api" => Some(Self::NewsApi),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ScrapeSettings {
    pub index_url: String,
    pub item_selector: String,
    pub title_selector: String,
    pub content_selector: String,
}

#[derive(Clone, Debug)]
pub struct NewsApiSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub country: String,
    pub language: Option<String>,
}

/// Typed configuration for the bot.
#[derive(Clone, Debug)]
pub struct Config {
    // Telegram
    pub telegram_bot_token: String,

    // Gemini
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,

    // News
    pub news_provider: NewsProviderKind,
    pub news_source_name: String,
    pub rss_url: String,
    pub scrape: ScrapeSettings,
    pub news_api: NewsApiSettings,
    pub news_limit: usize,
    pub news_cache_ttl: Duration,
    pub news_parse_mode: ParseMode,
    pub summary_max_sentences: usize,
    pub summary_fallback_chars: usize,

    // Weather
    pub weather_api_key: Option<String>,
    pub weather_base_url: String,
    pub weather_cache_ttl: Duration,

    // Chat persona
    pub bot_personality: String,
    pub response_instruction: String,

    // HTTP
    pub http_timeout: Duration,
}

impl Config {
    /// Load from the process environment, seeding it from `.env` first.
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key-value lookup. Empty values count as absent.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).and_then(non_empty);

        // Required
        let telegram_bot_token = get("TELEGRAM_BOT_TOKEN")
            .or_else(|| get("TELEGRAM_TOKEN"))
            .ok_or_else(|| {
                Error::Config("TELEGRAM_BOT_TOKEN environment variable is required".to_string())
            })?;

        // Gemini
        let gemini_api_key = get("GEMINI_API_KEY");
        let gemini_model = get("GEMINI_MODEL").unwrap_or_else(|| "gemini-2.0-flash".to_string());
        let gemini_base_url = get("GEMINI_BASE_URL")
            .unwrap_or_else(|| "https://generativelanguage.googleapis.com".to_string());

        // News
        let news_provider = match get("NEWS_PROVIDER") {
            Some(raw) => NewsProviderKind::parse(&raw).ok_or_else(|| {
                Error::Config(format!(
                    "NEWS_PROVIDER must be one of rss, scrape, newsapi (got {raw:?})"
                ))
            })?,
            None => NewsProviderKind::Rss,
        };
        let news_source_name = get("NEWS_SOURCE_NAME").unwrap_or_else(|| match news_provider {
            NewsProviderKind::NewsApi => "NewsAPI".to_string(),
            _ => "CNN Indonesia".to_string(),
        });
        let rss_url = get("NEWS_RSS_URL")
            .unwrap_or_else(|| "https://www.cnnindonesia.com/nasional/rss".to_string());
        let scrape = ScrapeSettings {
            index_url: get("NEWS_SCRAPE_URL")
                .unwrap_or_else(|| "https://www.cnnindonesia.com/nasional".to_string()),
            item_selector: get("NEWS_SCRAPE_ITEM_SELECTOR").unwrap_or_else(|| "article".to_string()),
            title_selector: get("NEWS_SCRAPE_TITLE_SELECTOR").unwrap_or_else(|| "h2".to_string()),
            content_selector: get("NEWS_SCRAPE_CONTENT_SELECTOR")
                .unwrap_or_else(|| "div.detail-text p".to_string()),
        };
        let news_api = NewsApiSettings {
            api_key: get("NEWS_API_KEY"),
            base_url: get("NEWS_API_BASE_URL").unwrap_or_else(|| "https://newsapi.org".to_string()),
            country: get("NEWS_API_COUNTRY").unwrap_or_else(|| "id".to_string()),
            language: get("NEWS_API_LANGUAGE"),
        };
        let news_limit = parse_num::<usize>(&get, "NEWS_LIMIT")?.unwrap_or(5).max(1);
        let news_cache_ttl =
            Duration::from_secs(parse_num::<u64>(&get, "NEWS_CACHE_TTL_SECS")?.unwrap_or(15 * 60));
        let news_parse_mode = match get("NEWS_PARSE_MODE") {
            Some(raw) => ParseMode::parse(&raw).ok_or_else(|| {
                Error::Config(format!("NEWS_PARSE_MODE must be plain or html (got {raw:?})"))
            })?,
            None => ParseMode::Plain,
        };
        let summary_max_sentences = parse_num::<usize>(&get, "SUMMARY_MAX_SENTENCES")?
            .unwrap_or(3)
            .max(1);
        let summary_fallback_chars =
            parse_num::<usize>(&get, "SUMMARY_FALLBACK_CHARS")?.unwrap_or(200);

        // Weather
        let weather_api_key = get("WEATHER_API_KEY");
        let weather_base_url = get("WEATHER_BASE_URL")
            .unwrap_or_else(|| "https://api.openweathermap.org".to_string());
        let weather_cache_ttl =
            Duration::from_secs(parse_num::<u64>(&get, "WEATHER_CACHE_TTL_SECS")?.unwrap_or(0));

        // Persona
        let bot_personality =
            get("BOT_PERSONALITY").unwrap_or_else(|| DEFAULT_PERSONALITY.to_string());
        let response_instruction = get("BOT_RESPONSE_INSTRUCTION")
            .unwrap_or_else(|| DEFAULT_RESPONSE_INSTRUCTION.to_string());

        let http_timeout =
            Duration::from_secs(parse_num::<u64>(&get, "HTTP_TIMEOUT_SECS")?.unwrap_or(30).max(1));

        Ok(Self {
            telegram_bot_token,
            gemini_api_key,
            gemini_model,
            gemini_base_url,
            news_provider,
            news_source_name,
            rss_url,
            scrape,
            news_api,
            news_limit,
            news_cache_ttl,
            news_parse_mode,
            summary_max_sentences,
            summary_fallback_chars,
            weather_api_key,
            weather_base_url,
            weather_cache_ttl,
            bot_personality,
            response_instruction,
            http_timeout,
        })
    }
}

fn parse_num<T: std::str::FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>> {
    let Some(raw) = get(key) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|_| Error::Config(format!("{key} must be a non-negative integer (got {raw:?})")))
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim().trim_start_matches("export ").trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
