use anyhow::{Context, Result};
use reqwest::Url;
use serde::{Deserialize, de::DeserializeOwned};
use std::sync::Arc;

use crate::{
    error::{FetchResult, WeatherError},
    model::{
        CityMetadata, Condition, Coordinates, CurrentConditions, ForecastEntry, ForecastSummary,
        UnitSystem, round_half_up,
    },
    summary::summarize_forecast,
};

use super::Transport;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// Provider icon artwork for a condition icon id.
pub fn icon_url(icon: &str) -> Option<String> {
    if icon.is_empty() {
        None
    } else {
        Some(format!("https://openweathermap.org/img/wn/{icon}@2x.png"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    Current,
    Forecast,
}

impl Endpoint {
    fn path(self) -> &'static str {
        match self {
            Endpoint::Current => "weather",
            Endpoint::Forecast => "forecast",
        }
    }

    fn fallback_message(self) -> &'static str {
        match self {
            Endpoint::Current => "Failed to fetch weather data.",
            Endpoint::Forecast => "Failed to fetch forecast.",
        }
    }
}

/// Client for OpenWeather's current-conditions and 5-day/3-hour endpoints.
///
/// Every outcome is returned as a [`FetchResult`]; nothing escapes as a panic.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: Option<String>,
    base_url: String,
    transport: Arc<dyn Transport>,
}

impl OpenWeatherClient {
    pub fn new(
        api_key: Option<String>,
        base_url: &str,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url).with_context(|| format!("Invalid provider base URL: {base_url}"))?;

        Ok(Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url,
            transport,
        })
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    pub async fn fetch_current_conditions(
        &self,
        city: &str,
        units: UnitSystem,
    ) -> FetchResult<CurrentConditions> {
        let parsed: OwCurrentResponse = self.get_json(Endpoint::Current, city, units).await?;
        Ok(parsed.into())
    }

    pub async fn fetch_forecast_summary(
        &self,
        city: &str,
        units: UnitSystem,
    ) -> FetchResult<ForecastSummary> {
        let parsed: OwForecastResponse = self.get_json(Endpoint::Forecast, city, units).await?;

        let entries: Vec<ForecastEntry> = parsed.list.into_iter().map(Into::into).collect();
        let days = summarize_forecast(&entries);
        tracing::debug!(city, samples = entries.len(), days = days.len(), "summarized forecast");

        Ok(ForecastSummary {
            city: parsed.city.map(Into::into).unwrap_or_default(),
            days,
        })
    }

    fn endpoint_url(&self, endpoint: Endpoint, city: &str, units: UnitSystem, api_key: &str) -> FetchResult<Url> {
        let raw = format!("{}/{}", self.base_url, endpoint.path());
        Url::parse_with_params(
            &raw,
            &[("q", city), ("units", units.as_str()), ("appid", api_key)],
        )
        .map_err(|e| WeatherError::Transport(e.to_string()))
    }

    /// Fetches one endpoint and decodes a 2xx body into `R`.
    ///
    /// A non-2xx answer whose body carries no JSON `message` still counts as a provider
    /// error: it keeps the real status and uses the endpoint's fallback message.
    async fn get_json<R: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        city: &str,
        units: UnitSystem,
    ) -> FetchResult<R> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            tracing::warn!(endpoint = endpoint.path(), "no API key configured, skipping request");
            WeatherError::MissingCredential
        })?;

        let url = self.endpoint_url(endpoint, city, units, api_key)?;
        tracing::debug!(endpoint = endpoint.path(), city, %units, "requesting");

        let res = self.transport.get(&url).await.map_err(|e| {
            tracing::warn!(endpoint = endpoint.path(), error = %format!("{e:#}"), "request failed");
            WeatherError::Transport(e.to_string())
        })?;

        if !res.is_success() {
            let message = provider_message(&res.body)
                .map(|m| format!("Error: {m}"))
                .unwrap_or_else(|| endpoint.fallback_message().to_string());
            tracing::warn!(
                endpoint = endpoint.path(),
                status = res.status,
                body = %truncate_body(&res.body),
                "provider returned an error"
            );
            return Err(WeatherError::Provider { status: res.status, message });
        }

        serde_json::from_str(&res.body).map_err(|e| {
            tracing::warn!(endpoint = endpoint.path(), error = %e, "unexpected response shape");
            WeatherError::Decode(e.to_string())
        })
    }
}

fn provider_message(body: &str) -> Option<String> {
    serde_json::from_str::<OwError>(body)
        .ok()
        .and_then(|e| e.message)
        .filter(|m| !m.trim().is_empty())
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct OwError {
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OwMain {
    temp: Option<f64>,
    feels_like: Option<f64>,
    humidity: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    #[serde(default)]
    main: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    icon: String,
}

impl From<OwWeather> for Condition {
    fn from(w: OwWeather) -> Self {
        Condition {
            main: w.main,
            description: w.description,
            icon: w.icon,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct OwWind {
    speed: Option<f64>,
    deg: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct OwSys {
    country: Option<String>,
    sunrise: Option<i64>,
    sunset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    #[serde(default)]
    name: String,
    #[serde(default)]
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    #[serde(default)]
    wind: OwWind,
    #[serde(default)]
    sys: OwSys,
    #[serde(default)]
    timezone: i32,
}

impl From<OwCurrentResponse> for CurrentConditions {
    fn from(r: OwCurrentResponse) -> Self {
        CurrentConditions {
            city: r.name,
            country: r.sys.country.unwrap_or_default(),
            temperature: r.main.temp.map(round_half_up),
            feels_like: r.main.feels_like.map(round_half_up),
            condition: r.weather.into_iter().next().map(Into::into),
            humidity_pct: r.main.humidity,
            wind_speed: r.wind.speed,
            wind_deg: r.wind.deg,
            sunrise: r.sys.sunrise,
            sunset: r.sys.sunset,
            timezone_offset: r.timezone,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    id: Option<i64>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    country: String,
    coord: Option<OwCoord>,
    population: Option<u64>,
    #[serde(default)]
    timezone: i32,
    sunrise: Option<i64>,
    sunset: Option<i64>,
}

impl From<OwCity> for CityMetadata {
    fn from(c: OwCity) -> Self {
        CityMetadata {
            id: c.id,
            name: c.name,
            country: c.country,
            coordinates: c.coord.map(|c| Coordinates { lat: c.lat, lon: c.lon }),
            population: c.population,
            timezone_offset: c.timezone,
            sunrise: c.sunrise,
            sunset: c.sunset,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    #[serde(default)]
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

impl From<OwForecastEntry> for ForecastEntry {
    fn from(e: OwForecastEntry) -> Self {
        ForecastEntry {
            timestamp: e.dt,
            temperature: e.main.temp,
            condition: e.weather.into_iter().next().map(Into::into),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    city: Option<OwCity>,
    #[serde(default)]
    list: Vec<OwForecastEntry>,
}
