use std::sync::Arc;

use tracing::{error, info, warn};

use kabar_core::{
    assistant::{Assistant, Persona},
    cache::TtlCache,
    config::{Config, NewsProviderKind},
    news::{ArticleSource, NewsOptions, NewsService},
    summarizer::{Summarizer, SummaryFallback},
    utils::{Clock, SystemClock},
    weather::WeatherService,
};
use kabar_gemini::GeminiClient;
use kabar_news::{NewsApiSource, RssSource, ScrapeSource};
use kabar_weather::OpenWeatherClient;

fn news_source(cfg: &Config) -> Result<Arc<dyn ArticleSource>, kabar_core::Error> {
    let http = kabar_news::http_client(cfg.http_timeout)?;
    let name = cfg.news_source_name.clone();
    let source: Arc<dyn ArticleSource> = match cfg.news_provider {
        NewsProviderKind::Rss => Arc::new(RssSource::new(name, cfg.rss_url.clone(), http)),
        NewsProviderKind::Scrape => Arc::new(ScrapeSource::new(name, &cfg.scrape, http)?),
        NewsProviderKind::NewsApi => Arc::new(NewsApiSource::new(name, cfg.news_api.clone(), http)),
    };
    Ok(source)
}

fn build_assistant(cfg: &Config) -> Result<Assistant, kabar_core::Error> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let completion = Arc::new(GeminiClient::new(
        cfg.gemini_api_key.clone(),
        cfg.gemini_model.clone(),
        cfg.gemini_base_url.clone(),
        cfg.http_timeout,
    )?);
    let summarizer = Summarizer::new(
        completion.clone(),
        SummaryFallback::from_chars(cfg.summary_fallback_chars),
    );

    let news = NewsService::new(
        news_source(cfg)?,
        summarizer,
        TtlCache::new(cfg.news_cache_ttl, clock.clone()),
        NewsOptions {
            limit: cfg.news_limit,
            max_sentences: cfg.summary_max_sentences,
        },
    );

    let weather = WeatherService::new(
        Arc::new(OpenWeatherClient::new(
            cfg.weather_api_key.clone(),
            cfg.weather_base_url.clone(),
            cfg.http_timeout,
        )?),
        TtlCache::new(cfg.weather_cache_ttl, clock),
    );

    Ok(Assistant::new(
        completion,
        news,
        weather,
        Persona {
            personality: cfg.bot_personality.clone(),
            instruction: cfg.response_instruction.clone(),
        },
        cfg.news_parse_mode,
    ))
}

fn warn_missing_credentials(cfg: &Config) {
    for (key, value) in [
        ("GEMINI_API_KEY", &cfg.gemini_api_key),
        ("WEATHER_API_KEY", &cfg.weather_api_key),
    ] {
        if value.is_none() {
            warn!(credential = key, "not set; the related command will report a configuration error");
        }
    }
    if cfg.news_provider == NewsProviderKind::NewsApi && cfg.news_api.api_key.is_none() {
        warn!(credential = "NEWS_API_KEY", "not set; /berita will report a configuration error");
    }
}

#[tokio::main]
async fn main() -> Result<(), kabar_core::Error> {
    kabar_core::logging::init("kabar")?;

    let cfg = match Config::load() {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            error!(error = %e, "invalid configuration");
            return Err(e);
        }
    };
    warn_missing_credentials(&cfg);
    info!(
        provider = ?cfg.news_provider,
        source = %cfg.news_source_name,
        cache_ttl_secs = cfg.news_cache_ttl.as_secs(),
        "news configured"
    );

    let assistant = Arc::new(build_assistant(&cfg)?);

    kabar_telegram::router::run_polling(cfg, assistant)
        .await
        .map_err(|e| kabar_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
