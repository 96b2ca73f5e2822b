use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unit system applied to both temperature and wind speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    /// Token sent to the provider as the `units` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "metric",
            UnitSystem::Imperial => "imperial",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            UnitSystem::Metric => UnitSystem::Imperial,
            UnitSystem::Imperial => UnitSystem::Metric,
        }
    }

    pub fn temperature_suffix(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "°C",
            UnitSystem::Imperial => "°F",
        }
    }

    pub fn wind_speed_suffix(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "m/s",
            UnitSystem::Imperial => "mph",
        }
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for UnitSystem {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "metric" => Ok(UnitSystem::Metric),
            "imperial" => Ok(UnitSystem::Imperial),
            _ => Err(anyhow::anyhow!(
                "Unknown unit system '{value}'. Supported: metric, imperial."
            )),
        }
    }
}

/// Weather condition as reported by the provider (category, description, icon id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    /// Category, e.g. "Clouds" or "Rain".
    pub main: String,
    pub description: String,
    pub icon: String,
}

/// Current conditions for a single city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub city: String,
    pub country: String,
    /// Rounded to the nearest whole unit.
    pub temperature: Option<i32>,
    pub feels_like: Option<i32>,
    pub condition: Option<Condition>,
    pub humidity_pct: Option<u8>,
    pub wind_speed: Option<f64>,
    pub wind_deg: Option<f64>,
    /// UTC epoch seconds.
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
    /// Seconds east of UTC.
    pub timezone_offset: i32,
}

impl CurrentConditions {
    pub fn condition_main(&self) -> &str {
        self.condition.as_ref().map(|c| c.main.as_str()).unwrap_or("")
    }

    pub fn condition_description(&self) -> &str {
        self.condition
            .as_ref()
            .map(|c| c.description.as_str())
            .unwrap_or("")
    }
}

/// One 3-hour forecast sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    /// UTC epoch seconds.
    pub timestamp: i64,
    pub temperature: Option<f64>,
    pub condition: Option<Condition>,
}

impl ForecastEntry {
    pub fn time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }
}

/// Aggregate of one calendar day of forecast samples.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySummary {
    /// Short weekday name, e.g. "Mon".
    pub day: String,
    pub date: NaiveDate,
    /// `None` when no sample of the day carried a temperature.
    pub min: Option<i32>,
    pub max: Option<i32>,
    pub icon: String,
    pub main: String,
    pub description: String,
}

impl DaySummary {
    pub fn date_iso(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// City metadata attached to a forecast response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CityMetadata {
    pub id: Option<i64>,
    pub name: String,
    pub country: String,
    pub coordinates: Option<Coordinates>,
    pub population: Option<u64>,
    pub timezone_offset: i32,
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSummary {
    pub city: CityMetadata,
    pub days: Vec<DaySummary>,
}

/// Rounds to the nearest integer, with halves going toward positive infinity.
pub fn round_half_up(value: f64) -> i32 {
    // `value + 0.5` is inexact just below a half, so compare the fraction instead.
    let floor = value.floor();
    let rounded = if value - floor >= 0.5 { floor + 1.0 } else { floor };
    rounded as i32
}
