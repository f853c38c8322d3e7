//! OpenWeatherMap adapter (current conditions).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use kabar_core::{domain::WeatherReading, errors::Error, weather::WeatherProvider, Result};

#[derive(Clone, Debug)]
pub struct OpenWeatherClient {
    api_key: Option<String>,
    base_url: String,
    http: reqwest::Client,
}

impl OpenWeatherClient {
    pub fn new(api_key: Option<String>, base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("weather http client: {e}")))?;
        Ok(Self {
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    main: Main,
    weather: Vec<Condition>,
}

#[derive(Debug, Deserialize)]
struct Main {
    temp: f64,
    humidity: i64,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: String,
}

/// Any non-success status, 401/429/5xx included, reads as an unknown city.
fn status_error(status: StatusCode, city: &str) -> Option<Error> {
    (!status.is_success())
        .then(|| Error::NotFound(format!("openweathermap {status} for {city:?}")))
}

fn parse_current(city: &str, body: &str) -> Result<WeatherReading> {
    let current: CurrentWeather = serde_json::from_str(body)
        .map_err(|e| Error::MalformedResponse(format!("openweathermap json error: {e}")))?;
    let condition = current
        .weather
        .into_iter()
        .next()
        .ok_or_else(|| Error::MalformedResponse("openweathermap: empty weather list".to_string()))?;

    Ok(WeatherReading {
        city: city.to_string(),
        temperature_celsius: current.main.temp,
        condition: condition.description,
        humidity_percent: current.main.humidity,
    })
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    fn missing_credential(&self) -> Option<&'static str> {
        self.api_key.is_none().then_some("WEATHER_API_KEY")
    }

    async fn current(&self, city: &str) -> Result<WeatherReading> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(Error::MissingCredential("WEATHER_API_KEY"));
        };

        let resp = self
            .http
            .get(format!("{}/data/2.5/weather", self.base_url))
            .query(&[("q", city), ("appid", api_key), ("units", "metric"), ("lang", "id")])
            .send()
            .await
            .map_err(|e| Error::External(format!("openweathermap request error: {e}")))?;

        if let Some(err) = status_error(resp.status(), city) {
            return Err(err);
        }

        let body = resp
            .text()
            .await
            .map_err(|e| Error::External(format!("openweathermap read error: {e}")))?;
        debug!(%city, "weather fetched");
        parse_current(city, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_current_conditions() {
        let body = r#"{
          "coord": {"lon": 106.85, "lat": -6.21},
          "weather": [{"id": 803, "main": "Clouds", "description": "awan pecah", "icon": "04d"}],
          "main": {"temp": 31.2, "feels_like": 36.4, "pressure": 1008, "humidity": 66},
          "name": "Jakarta",
          "cod": 200
        }"#;
        let reading = parse_current("jakarta", body).unwrap();
        assert_eq!(
            reading,
            WeatherReading {
                city: "jakarta".to_string(),
                temperature_celsius: 31.2,
                condition: "awan pecah".to_string(),
                humidity_percent: 66,
            }
        );
    }

    #[test]
    fn non_success_statuses_are_city_not_found() {
        for status in [
            StatusCode::NOT_FOUND,
            StatusCode::UNAUTHORIZED,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::BAD_GATEWAY,
        ] {
            let err = status_error(status, "Atlantis").unwrap();
            assert!(matches!(err, Error::NotFound(msg) if msg.contains("Atlantis")));
        }
        assert!(status_error(StatusCode::OK, "Jakarta").is_none());
    }

    #[test]
    fn missing_fields_are_malformed() {
        let body = r#"{"weather": [], "main": {"temp": 20.0, "humidity": 50}}"#;
        assert!(matches!(parse_current("x", body), Err(Error::MalformedResponse(_))));
        let body = r#"{"cod": "404", "message": "city not found"}"#;
        assert!(matches!(parse_current("x", body), Err(Error::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn missing_key_is_reported_without_request() {
        let client =
            OpenWeatherClient::new(None, "http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        assert_eq!(client.missing_credential(), Some("WEATHER_API_KEY"));
        assert!(matches!(
            client.current("Jakarta").await,
            Err(Error::MissingCredential("WEATHER_API_KEY"))
        ));
    }
}
