use std::time::Duration;

use chrono::NaiveDateTime;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use utoipa::ToSchema;

use crate::fetch_error::WeatherError;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CurrentConditions {
    pub temperature_c: f64,
    pub humidity_pct: f64,
    /// Rain over the last hour, 0 when the API omits it
    pub rainfall_mm: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ForecastEntry {
    pub timestamp: NaiveDateTime,
    pub temperature_c: f64,
    /// Midpoint of min and max
    pub mean_c: f64,
    pub min_c: f64,
    pub max_c: f64,
    pub humidity_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct WeatherReport {
    pub city: String,
    pub current: CurrentConditions,
    pub forecast: Vec<ForecastEntry>,
}

#[derive(Deserialize)]
struct MainBlock {
    temp: f64,
    humidity: f64,
    temp_min: Option<f64>,
    temp_max: Option<f64>,
}

#[derive(Deserialize)]
struct RainBlock {
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
}

#[derive(Deserialize)]
struct CurrentResponse {
    main: MainBlock,
    rain: Option<RainBlock>,
}

#[derive(Deserialize)]
struct ForecastItem {
    dt_txt: String,
    main: MainBlock,
}

#[derive(Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    cod: serde_json::Value,
    #[serde(default)]
    list: Vec<ForecastItem>,
}

/// Client for an OpenWeatherMap-compatible API
#[derive(Clone)]
pub struct WeatherClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl WeatherClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, WeatherError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// Current conditions plus forecast for `city`, `None` when the current
    /// conditions cannot be read. A forecast that answers with an error status
    /// or a `cod` other than `"200"` gives an empty forecast.
    #[instrument(skip(self))]
    pub async fn fetch(&self, city: &str) -> Option<WeatherReport> {
        match self.try_fetch(city).await {
            Ok(report) => Some(report),
            Err(e) => {
                warn!("Weather lookup for {} failed: {}", city, e);
                None
            }
        }
    }

    async fn try_fetch(&self, city: &str) -> Result<WeatherReport, WeatherError> {
        let current = self.fetch_current(city).await?;
        let forecast = self.fetch_forecast(city).await?;
        debug!(
            "Weather for {}: {}°C, {}% humidity, {} forecast entries",
            city,
            current.temperature_c,
            current.humidity_pct,
            forecast.len()
        );

        Ok(WeatherReport {
            city: city.to_string(),
            current,
            forecast,
        })
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        city: &str,
    ) -> Result<T, WeatherError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
                ("lang", "pt_br"),
            ])
            .send()
            .await?;

        let status = response.status();
        debug!("GET {} returned {}", url, status);
        if !status.is_success() {
            return Err(WeatherError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| WeatherError::Parse(e.to_string()))
    }

    pub async fn fetch_current(&self, city: &str) -> Result<CurrentConditions, WeatherError> {
        let payload: CurrentResponse = self.get_json("weather", city).await?;
        Ok(CurrentConditions {
            temperature_c: payload.main.temp,
            humidity_pct: payload.main.humidity,
            rainfall_mm: payload.rain.and_then(|r| r.one_hour).unwrap_or(0.0),
        })
    }

    pub async fn fetch_forecast(&self, city: &str) -> Result<Vec<ForecastEntry>, WeatherError> {
        let payload: ForecastResponse = match self.get_json("forecast", city).await {
            Err(WeatherError::Status(code)) => {
                warn!("Forecast for {} returned status {}, ignoring it", city, code);
                return Ok(Vec::new());
            }
            other => other?,
        };

        if payload.cod.as_str() != Some("200") {
            warn!("Forecast payload for {} has cod {}, ignoring it", city, payload.cod);
            return Ok(Vec::new());
        }

        let entries = payload
            .list
            .into_iter()
            .filter_map(|item| {
                let timestamp = NaiveDateTime::parse_from_str(&item.dt_txt, "%Y-%m-%d %H:%M:%S")
                    .map_err(|_| debug!("Skipping forecast entry with time '{}'", item.dt_txt))
                    .ok()?;
                let min = item.main.temp_min.unwrap_or(item.main.temp);
                let max = item.main.temp_max.unwrap_or(item.main.temp);
                Some(ForecastEntry {
                    timestamp,
                    temperature_c: item.main.temp,
                    mean_c: (min + max) / 2.0,
                    min_c: min,
                    max_c: max,
                    humidity_pct: item.main.humidity,
                })
            })
            .collect();

        Ok(entries)
    }
}
