//! Client for the Open-Meteo forecast API.
//!
//! Open-Meteo is keyless, so this client never reports
//! [`SourceError::ApiKeyMissing`]. Rate limiting (429), auth/validation
//! statuses, and malformed bodies map onto the [`SourceError`] union;
//! transient failures are retried with exponential back-off.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use skysync_core::weather::{
    CurrentConditions, DailyForecast, HourlyForecast, MinutelyForecast, Weather,
};
use skysync_core::{Location, WeatherFeature};

use crate::error::SourceError;
use crate::retry::retry_with_backoff;
use crate::source::WeatherSource;

pub const OPEN_METEO_ID: &str = "openmeteo";

const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com";
const FORECAST_DAYS: u8 = 7;

pub struct OpenMeteoSource {
    client: reqwest::Client,
    base_url: String,
    /// Maximum number of retry attempts after the first failure.
    max_retries: u32,
    /// Base delay for exponential backoff, in milliseconds.
    backoff_base_ms: u64,
}

impl OpenMeteoSource {
    /// Creates an `OpenMeteoSource` with configured timeout, `User-Agent`,
    /// and retry policy. Set `max_retries` to `0` to disable retries.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Unexpected`] if the underlying HTTP client
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()
            .map_err(|e| SourceError::Unexpected(e.to_string()))?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            max_retries,
            backoff_base_ms,
        })
    }

    /// Points the client at a different API origin. Used by tests to target
    /// a local mock server.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn fetch_once(
        &self,
        location: &Location,
        want_minutely: bool,
    ) -> Result<Weather, SourceError> {
        let mut query: Vec<(&str, String)> = vec![
            ("latitude", format!("{:.4}", location.latitude)),
            ("longitude", format!("{:.4}", location.longitude)),
            ("timezone", "UTC".to_string()),
            ("timeformat", "unixtime".to_string()),
            ("wind_speed_unit", "ms".to_string()),
            ("forecast_days", FORECAST_DAYS.to_string()),
            (
                "current",
                "temperature_2m,relative_humidity_2m,surface_pressure,wind_speed_10m,weather_code"
                    .to_string(),
            ),
            (
                "hourly",
                "temperature_2m,precipitation,wind_speed_10m".to_string(),
            ),
            (
                "daily",
                "temperature_2m_min,temperature_2m_max,precipitation_sum".to_string(),
            ),
        ];
        if want_minutely {
            query.push(("minutely_15", "precipitation".to_string()));
        }

        let url = format!("{}/v1/forecast", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| SourceError::from_transport(&e))?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok());
            return Err(SourceError::RateLimited { retry_after_secs });
        }

        let body = response
            .text()
            .await
            .map_err(|e| SourceError::from_transport(&e))?;

        if status == reqwest::StatusCode::BAD_REQUEST {
            // Open-Meteo answers 400 with {"error": true, "reason": "..."} for
            // out-of-range or malformed coordinates.
            let reason = serde_json::from_str::<OmError>(&body)
                .map(|e| e.reason)
                .unwrap_or_else(|_| body.clone());
            return Err(SourceError::InvalidLocation { reason });
        }

        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed =
            serde_json::from_str::<OmResponse>(&body).map_err(|e| SourceError::Deserialize {
                context: format!("forecast for {}", location.display_name),
                source: e,
            })?;

        Ok(convert(&parsed, Utc::now()))
    }
}

#[async_trait]
impl WeatherSource for OpenMeteoSource {
    fn id(&self) -> &str {
        OPEN_METEO_ID
    }

    fn name(&self) -> &str {
        "Open-Meteo"
    }

    /// Fetch a forecast snapshot, retrying transient failures.
    ///
    /// # Errors
    ///
    /// - [`SourceError::InvalidLocation`] — unusable coordinates, or the API
    ///   rejected them (HTTP 400).
    /// - [`SourceError::RateLimited`] — HTTP 429 after all retries exhausted.
    /// - [`SourceError::Status`] — any other non-2xx status (5xx retried,
    ///   4xx not).
    /// - [`SourceError::NetworkUnavailable`] / [`SourceError::Timeout`] —
    ///   transport failure after all retries exhausted.
    /// - [`SourceError::Deserialize`] — response body is not the expected
    ///   shape (not retried).
    async fn fetch(
        &self,
        location: &Location,
        features: &[WeatherFeature],
    ) -> Result<Weather, SourceError> {
        if !location.is_usable() {
            return Err(SourceError::InvalidLocation {
                reason: format!(
                    "coordinates ({}, {}) are not usable",
                    location.latitude, location.longitude
                ),
            });
        }
        let want_minutely = features.contains(&WeatherFeature::Minutely);
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.fetch_once(location, want_minutely)
        })
        .await
    }
}

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct OmError {
    reason: String,
}

#[derive(Debug, Deserialize)]
struct OmResponse {
    #[serde(default)]
    current: Option<OmCurrent>,
    #[serde(default)]
    hourly: Option<OmHourly>,
    #[serde(default)]
    daily: Option<OmDaily>,
    #[serde(default)]
    minutely_15: Option<OmMinutely>,
}

#[derive(Debug, Deserialize)]
struct OmCurrent {
    temperature_2m: f64,
    #[serde(default)]
    relative_humidity_2m: Option<f64>,
    #[serde(default)]
    surface_pressure: Option<f64>,
    #[serde(default)]
    wind_speed_10m: Option<f64>,
    #[serde(default)]
    weather_code: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct OmHourly {
    time: Vec<i64>,
    #[serde(default)]
    temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    precipitation: Vec<Option<f64>>,
    #[serde(default)]
    wind_speed_10m: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct OmDaily {
    time: Vec<i64>,
    #[serde(default)]
    temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_sum: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct OmMinutely {
    time: Vec<i64>,
    #[serde(default)]
    precipitation: Vec<Option<f64>>,
}

fn convert(response: &OmResponse, fetched_at: DateTime<Utc>) -> Weather {
    let mut weather = Weather::empty(fetched_at);

    if let Some(current) = &response.current {
        weather.current = Some(CurrentConditions {
            temperature_c: current.temperature_2m,
            wind_speed_ms: current.wind_speed_10m,
            relative_humidity_pct: current.relative_humidity_2m,
            pressure_hpa: current.surface_pressure,
            condition: current.weather_code.map(|c| wmo_condition(c).to_string()),
        });
    }

    if let Some(hourly) = &response.hourly {
        weather.hourly = hourly
            .time
            .iter()
            .enumerate()
            .filter_map(|(i, &ts)| {
                let time = DateTime::from_timestamp(ts, 0)?;
                Some(HourlyForecast {
                    time,
                    temperature_c: hourly.temperature_2m.get(i).copied().flatten(),
                    precipitation_mm: hourly.precipitation.get(i).copied().flatten(),
                    wind_speed_ms: hourly.wind_speed_10m.get(i).copied().flatten(),
                })
            })
            .collect();
    }

    if let Some(daily) = &response.daily {
        weather.daily = daily
            .time
            .iter()
            .enumerate()
            .filter_map(|(i, &ts)| {
                let date = DateTime::from_timestamp(ts, 0)?.date_naive();
                Some(DailyForecast {
                    date,
                    temperature_min_c: daily.temperature_2m_min.get(i).copied().flatten(),
                    temperature_max_c: daily.temperature_2m_max.get(i).copied().flatten(),
                    precipitation_mm: daily.precipitation_sum.get(i).copied().flatten(),
                })
            })
            .collect();
    }

    if let Some(minutely) = &response.minutely_15 {
        weather.minutely = minutely
            .time
            .iter()
            .enumerate()
            .filter_map(|(i, &ts)| {
                let time = DateTime::from_timestamp(ts, 0)?;
                Some(MinutelyForecast {
                    time,
                    precipitation_mm: minutely.precipitation.get(i).copied().flatten(),
                })
            })
            .collect();
    }

    weather
}

/// Condition text for a WMO weather interpretation code.
fn wmo_condition(code: u8) -> &'static str {
    match code {
        0 => "clear sky",
        1..=3 => "partly cloudy",
        45 | 48 => "fog",
        51..=57 => "drizzle",
        61..=67 => "rain",
        71..=77 => "snow",
        80..=82 => "rain showers",
        85 | 86 => "snow showers",
        95..=99 => "thunderstorm",
        _ => "unknown",
    }
}
