//! Weather lookup port and rendering.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    cache::TtlCache, domain::WeatherReading, errors::Error, utils::title_case, Result,
};

/// Current-conditions lookup by free-text city name.
///
/// A provider reports any non-success status for the city as
/// [`Error::NotFound`]; transport and payload problems use the other variants.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    fn missing_credential(&self) -> Option<&'static str> {
        None
    }

    async fn current(&self, city: &str) -> Result<WeatherReading>;
}

pub struct WeatherService {
    provider: Arc<dyn WeatherProvider>,
    cache: TtlCache<String, WeatherReading>,
}

impl WeatherService {
    /// A `cache` with a zero TTL is bypassed: every request goes to the provider.
    pub fn new(provider: Arc<dyn WeatherProvider>, cache: TtlCache<String, WeatherReading>) -> Self {
        Self { provider, cache }
    }

    pub async fn lookup(&self, city: &str) -> Result<Arc<WeatherReading>> {
        if let Some(key) = self.provider.missing_credential() {
            return Err(Error::MissingCredential(key));
        }
        if self.cache.ttl().is_zero() {
            return self.provider.current(city).await.map(Arc::new);
        }
        self.cache
            .get_or_fetch(city.to_lowercase(), || self.provider.current(city))
            .await
    }
}

/// Reconstruct a multi-word city from command arguments.
pub fn city_from_args(args: &[&str]) -> Option<String> {
    let city = args
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if city.is_empty() {
        None
    } else {
        Some(city)
    }
}

pub fn render_weather(w: &WeatherReading) -> String {
    format!(
        "🌤️ Cuaca di {}:\nSuhu: {}°C\nKondisi: {}\nKelembaban: {}%",
        title_case(&w.city),
        w.temperature_celsius,
        w.condition,
        w.humidity_percent
    )
}
