//! Command handlers: start, help, news, weather and free-form chat.
//!
//! Every handler returns a [`Reply`]. Failures from the ports are logged here
//! and turned into fixed user-facing strings; nothing propagates to the
//! dispatcher.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::{
    errors::Error,
    messaging::types::{IncomingUpdate, ParseMode, Reply},
    model::CompletionClient,
    news::{render_news, NewsService},
    weather::{city_from_args, render_weather, WeatherService},
};

pub const MSG_NO_NEWS: &str = "Mohon maaf, tidak ada berita saat ini.";
pub const MSG_NEWS_FAILED: &str = "Terjadi kesalahan saat mengambil berita.";
pub const MSG_NEWS_NOT_CONFIGURED: &str =
    "⚠️ Layanan berita belum dikonfigurasi. Hubungi admin bot.";
pub const MSG_WEATHER_USAGE: &str = "Gunakan format: /cuaca [nama kota]";
pub const MSG_CITY_NOT_FOUND: &str = "Kota tidak ditemukan.";
pub const MSG_WEATHER_FAILED: &str = "Gagal mengambil informasi cuaca.";
pub const MSG_WEATHER_NOT_CONFIGURED: &str =
    "⚠️ Layanan cuaca belum dikonfigurasi. Hubungi admin bot.";
pub const MSG_CHAT_FAILED: &str = "Maaf, terjadi kesalahan dalam memproses pesan.";
pub const MSG_CHAT_NOT_CONFIGURED: &str =
    "⚠️ Layanan AI belum dikonfigurasi. Hubungi admin bot.";

/// Fixed chat persona prepended to every free-form message.
#[derive(Clone, Debug)]
pub struct Persona {
    pub personality: String,
    pub instruction: String,
}

impl Persona {
    fn prompt(&self, message: &str) -> String {
        format!(
            "{}\n{}\n\nPesan dari pengguna: {message}\n\nBalasan:",
            self.personality, self.instruction
        )
    }
}

pub struct Assistant {
    completion: Arc<dyn CompletionClient>,
    news: NewsService,
    weather: WeatherService,
    persona: Persona,
    news_mode: ParseMode,
}

impl Assistant {
    pub fn new(
        completion: Arc<dyn CompletionClient>,
        news: NewsService,
        weather: WeatherService,
        persona: Persona,
        news_mode: ParseMode,
    ) -> Self {
        Self {
            completion,
            news,
            weather,
            persona,
            news_mode,
        }
    }

    /// Route one update. Unknown commands get no reply.
    pub async fn handle(&self, update: &IncomingUpdate) -> Option<Reply> {
        match update {
            IncomingUpdate::Command(cmd) => match cmd.name.as_str() {
                "start" => Some(self.start()),
                "help" => Some(self.help()),
                "berita" | "news" => Some(self.news().await),
                "cuaca" | "weather" => Some(self.weather(&cmd.arg_list()).await),
                other => {
                    info!(command = other, "ignoring unknown command");
                    None
                }
            },
            IncomingUpdate::Text(msg) => {
                if msg.text.trim().is_empty() {
                    return None;
                }
                Some(self.chat(&msg.text).await)
            }
        }
    }

    pub fn start(&self) -> Reply {
        Reply::plain(
            "Halo! Saya adalah asisten AI. Ketik /berita untuk melihat berita terbaru \
atau /cuaca [kota] untuk cek cuaca.",
        )
    }

    pub fn help(&self) -> Reply {
        Reply::plain(format!(
            "Perintah:\n\
/berita - Menampilkan berita terbaru dari {}\n\
/cuaca [kota] - Melihat cuaca di kota Anda\n\
Tanya apa saja, saya akan bantu jawab!",
            self.news.source_name()
        ))
    }

    pub async fn news(&self) -> Reply {
        match self.news.latest().await {
            Ok(articles) if articles.is_empty() => Reply::plain(MSG_NO_NEWS),
            Ok(articles) => {
                let text = render_news(&articles, self.news.source_name(), self.news_mode);
                Reply {
                    text,
                    parse_mode: self.news_mode,
                }
            }
            Err(Error::MissingCredential(key)) => {
                warn!(credential = key, "news requested but provider is not configured");
                Reply::plain(MSG_NEWS_NOT_CONFIGURED)
            }
            Err(Error::SourceUnavailable(detail)) => {
                error!(%detail, "news source unavailable");
                Reply::plain(MSG_NEWS_FAILED)
            }
            Err(Error::MalformedResponse(detail)) => {
                error!(%detail, "news source returned malformed data");
                Reply::plain(MSG_NEWS_FAILED)
            }
            Err(e) => {
                error!(kind = e.kind(), error = %e, "unexpected failure fetching news");
                Reply::plain(MSG_NEWS_FAILED)
            }
        }
    }

    pub async fn weather(&self, args: &[&str]) -> Reply {
        let Some(city) = city_from_args(args) else {
            return Reply::plain(MSG_WEATHER_USAGE);
        };

        match self.weather.lookup(&city).await {
            Ok(reading) => Reply::plain(render_weather(&reading)),
            Err(Error::NotFound(detail)) => {
                info!(%city, %detail, "weather lookup found nothing");
                Reply::plain(MSG_CITY_NOT_FOUND)
            }
            Err(Error::MissingCredential(key)) => {
                warn!(credential = key, "weather requested but provider is not configured");
                Reply::plain(MSG_WEATHER_NOT_CONFIGURED)
            }
            Err(e) => {
                error!(%city, kind = e.kind(), error = %e, "weather lookup failed");
                Reply::plain(MSG_WEATHER_FAILED)
            }
        }
    }

    pub async fn chat(&self, message: &str) -> Reply {
        if let Some(key) = self.completion.missing_credential() {
            warn!(credential = key, "chat requested but model is not configured");
            return Reply::plain(MSG_CHAT_NOT_CONFIGURED);
        }

        match self.completion.complete(&self.persona.prompt(message)).await {
            Ok(text) if !text.trim().is_empty() => Reply::plain(text),
            Ok(_) => {
                error!(provider = self.completion.provider(), "model returned empty reply");
                Reply::plain(MSG_CHAT_FAILED)
            }
            Err(e) => {
                error!(
                    provider = self.completion.provider(),
                    kind = e.kind(),
                    error = %e,
                    "chat completion failed"
                );
                Reply::plain(MSG_CHAT_FAILED)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::TtlCache;
    use crate::domain::{ChatId, RawArticle, UserId};
    use crate::messaging::types::{Command, TextMessage};
    use crate::news::NewsOptions;
    use crate::summarizer::{Summarizer, SummaryFallback};
    use crate::testing::{FakeCompletion, FakeSource, FakeWeather, SourceBehavior};
    use crate::utils::test_clock::ManualClock;
    use std::time::Duration;

    struct Harness {
        source: Arc<FakeSource>,
        model: Arc<FakeCompletion>,
        weather: Arc<FakeWeather>,
        assistant: Assistant,
    }

    fn harness(source: FakeSource, model: FakeCompletion, weather: FakeWeather) -> Harness {
        let source = Arc::new(source);
        let model = Arc::new(model);
        let weather = Arc::new(weather);
        let clock = Arc::new(ManualClock::new());

        let news = NewsService::new(
            source.clone(),
            Summarizer::new(model.clone(), SummaryFallback::from_chars(200)),
            TtlCache::new(Duration::from_secs(900), clock.clone()),
            NewsOptions::default(),
        );
        let weather_service =
            WeatherService::new(weather.clone(), TtlCache::new(Duration::ZERO, clock));
        let assistant = Assistant::new(
            model.clone(),
            news,
            weather_service,
            Persona {
                personality: "Saya asisten.".to_string(),
                instruction: "Jawab singkat.".to_string(),
            },
            ParseMode::Plain,
        );
        Harness {
            source,
            model,
            weather,
            assistant,
        }
    }

    fn command(name: &str, args: &str) -> IncomingUpdate {
        IncomingUpdate::Command(Command {
            chat_id: ChatId(1),
            user_id: UserId(1),
            username: None,
            name: name.to_string(),
            args: args.to_string(),
        })
    }

    fn text(t: &str) -> IncomingUpdate {
        IncomingUpdate::Text(TextMessage {
            chat_id: ChatId(1),
            user_id: UserId(1),
            username: Some("budi".to_string()),
            text: t.to_string(),
        })
    }

    #[tokio::test]
    async fn news_end_to_end() {
        let h = harness(
            FakeSource::with(vec![RawArticle::new("Title A", "http://a", "body A")]),
            FakeCompletion::replying("Sum A"),
            FakeWeather::sunny(),
        );

        let reply = h.assistant.handle(&command("berita", "")).await.unwrap();
        assert_eq!(reply.parse_mode, ParseMode::Plain);
        let t = &reply.text;
        let (title, summary, link) = (
            t.find("1. Title A").unwrap(),
            t.find("Ringkasan: Sum A").unwrap(),
            t.find("http://a").unwrap(),
        );
        assert!(title < summary && summary < link);
        assert!(!t.contains("2. "));
    }

    #[tokio::test]
    async fn zero_articles_is_no_news_not_an_error() {
        let h = harness(FakeSource::with(vec![]), FakeCompletion::replying("x"), FakeWeather::sunny());
        assert_eq!(h.assistant.news().await, Reply::plain(MSG_NO_NEWS));
    }

    #[tokio::test]
    async fn source_errors_become_generic_apology() {
        for behavior in [SourceBehavior::Unavailable, SourceBehavior::Malformed] {
            let h = harness(
                FakeSource::behaving(behavior),
                FakeCompletion::replying("x"),
                FakeWeather::sunny(),
            );
            let reply = h.assistant.news().await;
            assert_eq!(reply.text, MSG_NEWS_FAILED);
            assert!(!reply.text.contains("connection refused"));
        }
    }

    #[tokio::test]
    async fn news_without_credential_reports_configuration() {
        let h = harness(FakeSource::without_key(), FakeCompletion::replying("x"), FakeWeather::sunny());
        assert_eq!(h.assistant.news().await.text, MSG_NEWS_NOT_CONFIGURED);
        assert_eq!(h.source.calls(), 0);
    }

    #[tokio::test]
    async fn news_survives_failing_summaries() {
        let h = harness(
            FakeSource::with(vec![
                RawArticle::new("A", "http://a", "isi a"),
                RawArticle::new("B", "http://b", "isi b"),
            ]),
            FakeCompletion::failing(),
            FakeWeather::sunny(),
        );
        let reply = h.assistant.news().await;
        assert!(reply.text.contains("1. A"));
        assert!(reply.text.contains("2. B"));
        assert!(reply.text.contains("Ringkasan: isi a"));
        assert!(reply.text.contains("Link: http://b"));
    }

    #[tokio::test]
    async fn weather_without_args_shows_usage_and_makes_no_call() {
        let h = harness(FakeSource::with(vec![]), FakeCompletion::replying("x"), FakeWeather::sunny());
        let reply = h.assistant.handle(&command("cuaca", "   ")).await.unwrap();
        assert_eq!(reply.text, MSG_WEATHER_USAGE);
        assert_eq!(h.weather.calls(), 0);
    }

    #[tokio::test]
    async fn weather_joins_multi_word_city() {
        let h = harness(FakeSource::with(vec![]), FakeCompletion::replying("x"), FakeWeather::sunny());
        let reply = h.assistant.handle(&command("weather", "kota  bogor")).await.unwrap();
        assert_eq!(h.weather.cities.lock().unwrap().as_slice(), ["kota bogor"]);
        assert!(reply.text.starts_with("🌤️ Cuaca di Kota Bogor:"));
        assert!(reply.text.contains("Suhu: 31.5°C"));
        assert!(reply.text.contains("Kelembaban: 70%"));
    }

    #[tokio::test]
    async fn weather_non_success_is_city_not_found() {
        let h = harness(
            FakeSource::with(vec![]),
            FakeCompletion::replying("x"),
            FakeWeather::with(|_| Err(Error::NotFound("401 Unauthorized".to_string()))),
        );
        assert_eq!(h.assistant.weather(&["Atlantis"]).await.text, MSG_CITY_NOT_FOUND);
    }

    #[tokio::test]
    async fn weather_transport_failure_is_generic() {
        let h = harness(
            FakeSource::with(vec![]),
            FakeCompletion::replying("x"),
            FakeWeather::with(|_| Err(Error::External("timed out".to_string()))),
        );
        assert_eq!(h.assistant.weather(&["Bandung"]).await.text, MSG_WEATHER_FAILED);
    }

    #[tokio::test]
    async fn weather_without_key_reports_configuration() {
        let h = harness(FakeSource::with(vec![]), FakeCompletion::replying("x"), FakeWeather::without_key());
        assert_eq!(h.assistant.weather(&["Bandung"]).await.text, MSG_WEATHER_NOT_CONFIGURED);
        assert_eq!(h.weather.calls(), 0);
    }

    #[tokio::test]
    async fn chat_prepends_persona_and_replies_verbatim() {
        let h = harness(
            FakeSource::with(vec![]),
            FakeCompletion::replying("  Halo juga! **Tentu**  "),
            FakeWeather::sunny(),
        );
        let reply = h.assistant.handle(&text("apa kabar?")).await.unwrap();
        assert_eq!(reply, Reply::plain("  Halo juga! **Tentu**  "));
        assert_eq!(
            h.model.last_prompt().unwrap(),
            "Saya asisten.\nJawab singkat.\n\nPesan dari pengguna: apa kabar?\n\nBalasan:"
        );
    }

    #[tokio::test]
    async fn chat_has_no_memory_between_turns() {
        let h = harness(FakeSource::with(vec![]), FakeCompletion::replying("ok"), FakeWeather::sunny());
        h.assistant.chat("pertama").await;
        h.assistant.chat("kedua").await;
        let prompt = h.model.last_prompt().unwrap();
        assert!(prompt.contains("kedua"));
        assert!(!prompt.contains("pertama"));
    }

    #[tokio::test]
    async fn chat_failure_is_apology() {
        let h = harness(FakeSource::with(vec![]), FakeCompletion::failing(), FakeWeather::sunny());
        let reply = h.assistant.chat("halo").await;
        assert_eq!(reply.text, MSG_CHAT_FAILED);
        assert!(!reply.text.contains("quota"));
    }

    #[tokio::test]
    async fn chat_without_key_reports_configuration() {
        let h = harness(FakeSource::with(vec![]), FakeCompletion::without_key(), FakeWeather::sunny());
        assert_eq!(h.assistant.chat("halo").await.text, MSG_CHAT_NOT_CONFIGURED);
        assert_eq!(h.model.calls(), 0);
    }

    #[tokio::test]
    async fn start_help_and_unknown_commands() {
        let h = harness(FakeSource::with(vec![]), FakeCompletion::replying("x"), FakeWeather::sunny());
        let start = h.assistant.handle(&command("start", "")).await.unwrap();
        assert!(start.text.contains("/berita"));
        let help = h.assistant.handle(&command("help", "")).await.unwrap();
        assert!(help.text.contains("berita terbaru dari Fake News"));
        assert!(h.assistant.handle(&command("stop", "")).await.is_none());
        assert!(h.assistant.handle(&text("   ")).await.is_none());
    }
}
