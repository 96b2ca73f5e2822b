//! Human-friendly terminal output for search results.

use chrono::DateTime;
use crossterm::style::{Color, Stylize};
use serde::Serialize;
use weather_core::{
    CurrentConditions, FetchResult, ForecastSummary, SearchOutcome, Theme, UnitSystem,
    WeatherError, model::round_half_up, provider::openweather::icon_url,
};

const PLACEHOLDER: &str = "—";

const COMPASS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

const ACCENT: Color = Color::Rgb { r: 59, g: 130, b: 246 };
const ERROR: Color = Color::Rgb { r: 239, g: 68, b: 68 };
const WARN: Color = Color::Rgb { r: 245, g: 158, b: 11 };

/// Terminal palette for the active theme.
#[derive(Debug, Clone, Copy)]
pub struct Style {
    pub theme: Theme,
    pub color: bool,
}

impl Style {
    pub fn new(theme: Theme, color: bool) -> Self {
        Self { theme, color }
    }

    fn paint(&self, color: Color, bold: bool, text: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        let styled = text.with(color);
        if bold {
            styled.bold().to_string()
        } else {
            styled.to_string()
        }
    }

    pub fn accent(&self, text: &str) -> String {
        self.paint(ACCENT, true, text)
    }

    pub fn muted(&self, text: &str) -> String {
        let color = match self.theme {
            Theme::Light => Color::Rgb { r: 100, g: 116, b: 139 },
            Theme::Dark => Color::Rgb { r: 156, g: 163, b: 175 },
        };
        self.paint(color, false, text)
    }

    pub fn text(&self, text: &str) -> String {
        let color = match self.theme {
            Theme::Light => Color::Rgb { r: 17, g: 24, b: 39 },
            Theme::Dark => Color::Rgb { r: 229, g: 231, b: 235 },
        };
        self.paint(color, false, text)
    }

    pub fn error(&self, text: &str) -> String {
        self.paint(ERROR, true, text)
    }

    pub fn warn(&self, text: &str) -> String {
        self.paint(WARN, true, text)
    }
}

/// 16-point compass direction for a wind bearing in degrees.
pub fn deg_to_compass(deg: f64) -> &'static str {
    if !deg.is_finite() {
        return "";
    }
    let idx = (deg.rem_euclid(360.0) / 22.5).round() as usize % COMPASS.len();
    COMPASS[idx]
}

/// `HH:MM` wall-clock time at a UTC offset given in seconds.
pub fn format_local_time(unix_seconds: i64, offset_seconds: i32) -> Option<String> {
    let local = unix_seconds.checked_add(i64::from(offset_seconds))?;
    DateTime::from_timestamp(local, 0).map(|t| t.format("%H:%M").to_string())
}

fn or_placeholder(value: Option<String>) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

fn wind_display(current: &CurrentConditions, units: UnitSystem) -> String {
    let Some(speed) = current.wind_speed else {
        return PLACEHOLDER.to_string();
    };
    let mut out = format!("{} {}", round_half_up(speed), units.wind_speed_suffix());
    let dir = current.wind_deg.map(deg_to_compass).unwrap_or("");
    if !dir.is_empty() {
        out.push(' ');
        out.push_str(dir);
    }
    out
}

// Pad before painting: escape sequences must not count toward the column width.
fn row(style: &Style, label: &str, value: &str) -> String {
    let label = format!("{label:<11}");
    format!("  {} {}\n", style.muted(&label), style.text(value))
}

pub fn render_current(current: &CurrentConditions, units: UnitSystem, style: &Style) -> String {
    let temp_unit = units.temperature_suffix();
    let mut out = String::new();

    let mut title = current.city.clone();
    if !current.country.is_empty() {
        title.push_str(", ");
        title.push_str(&current.country);
    }
    out.push_str(&style.accent(&title));
    out.push('\n');

    let temp = current
        .temperature
        .map(|t| format!("{t}{temp_unit}"))
        .unwrap_or_else(|| PLACEHOLDER.to_string());
    out.push_str(&format!("  {}", style.text(&temp)));
    let description = current.condition_description();
    if !description.is_empty() {
        out.push_str(&format!("  {}", style.muted(description)));
    }
    out.push('\n');

    let feels = current.feels_like.map(|t| format!("{t}{temp_unit}"));
    let humidity = current.humidity_pct.map(|h| format!("{h}%"));
    let sunrise = current
        .sunrise
        .and_then(|t| format_local_time(t, current.timezone_offset));
    let sunset = current
        .sunset
        .and_then(|t| format_local_time(t, current.timezone_offset));

    out.push_str(&row(style, "Feels like", &or_placeholder(feels)));
    out.push_str(&row(
        style,
        "Condition",
        &or_placeholder(Some(current.condition_main().to_string())),
    ));
    out.push_str(&row(style, "Humidity", &or_placeholder(humidity)));
    out.push_str(&row(style, "Wind", &wind_display(current, units)));
    out.push_str(&row(style, "Sunrise", &or_placeholder(sunrise)));
    out.push_str(&row(style, "Sunset", &or_placeholder(sunset)));

    let icon = current.condition.as_ref().and_then(|c| icon_url(&c.icon));
    if let Some(icon) = icon {
        out.push_str(&row(style, "Icon", &icon));
    }

    out
}

pub fn render_forecast(forecast: &ForecastSummary, units: UnitSystem, style: &Style) -> String {
    if forecast.days.is_empty() {
        return String::new();
    }

    let temp_unit = units.temperature_suffix();
    let mut out = format!("{}\n", style.accent("5-Day Forecast"));

    for day in &forecast.days {
        let max = day.max.map(|t| format!("{t}{temp_unit}"));
        let min = day.min.map(|t| format!("{t}{temp_unit}"));
        let condition = if day.main.is_empty() { PLACEHOLDER } else { day.main.as_str() };

        out.push_str(&format!(
            "  {} {}  {:>6} / {:<6}  {}\n",
            style.text(&day.day),
            style.muted(&day.date_iso()),
            or_placeholder(max),
            or_placeholder(min),
            style.text(condition),
        ));
    }

    out
}

pub fn render_error(label: &str, err: &WeatherError, style: &Style) -> String {
    format!("{} {}\n", style.error(&format!("⚠ {label}:")), err.user_message())
}

pub fn missing_key_banner(style: &Style) -> String {
    format!(
        "{}\n",
        style.warn(
            "Missing API key. Set WEATHER_API_KEY or OPENWEATHER_API_KEY, or run \
             `weather configure`. (Hide this with --quiet.)"
        )
    )
}

/// Renders whichever parts of the outcome succeeded, and an error line for each failure.
pub fn render_outcome(outcome: &SearchOutcome, style: &Style) -> String {
    let units = outcome.query.units;
    let mut out = String::new();

    match &outcome.current {
        Ok(current) => out.push_str(&render_current(current, units, style)),
        Err(err) => out.push_str(&render_error("Current conditions", err, style)),
    }

    match &outcome.forecast {
        Ok(forecast) => {
            let rendered = render_forecast(forecast, units, style);
            if !rendered.is_empty() {
                out.push('\n');
                out.push_str(&rendered);
            }
        }
        // Both failing for the same reason is reported once.
        Err(err) if outcome.current.as_ref().err() == Some(err) => {}
        Err(err) => out.push_str(&render_error("Forecast", err, style)),
    }

    out
}

fn result_json<T: Serialize>(result: &FetchResult<T>) -> serde_json::Value {
    match result {
        Ok(data) => serde_json::json!({ "ok": true, "data": data }),
        Err(err) => serde_json::json!({
            "ok": false,
            "status": err.status(),
            "error": err.user_message(),
        }),
    }
}

pub fn outcome_json(outcome: &SearchOutcome) -> serde_json::Value {
    serde_json::json!({
        "city": outcome.query.city,
        "units": outcome.query.units,
        "current": result_json(&outcome.current),
        "forecast": result_json(&outcome.forecast),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use weather_core::{CityMetadata, Condition, DaySummary, SearchQuery};

    fn plain() -> Style {
        Style::new(Theme::Light, false)
    }

    fn colored(theme: Theme) -> Style {
        crossterm::style::force_color_output(true);
        Style::new(theme, true)
    }

    fn strip_ansi(text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut chars = text.chars();
        while let Some(c) = chars.next() {
            if c == '\x1b' {
                // CSI sequences emitted for styling all end in 'm'.
                chars.by_ref().find(|&c| c == 'm');
            } else {
                out.push(c);
            }
        }
        out
    }

    fn london() -> CurrentConditions {
        CurrentConditions {
            city: "London".into(),
            country: "GB".into(),
            temperature: Some(15),
            feels_like: Some(14),
            condition: Some(Condition {
                main: "Clouds".into(),
                description: "overcast clouds".into(),
                icon: "04d".into(),
            }),
            humidity_pct: Some(80),
            wind_speed: Some(3.1),
            wind_deg: Some(200.0),
            sunrise: Some(1_700_000_000),
            sunset: Some(1_700_040_000),
            timezone_offset: 0,
        }
    }

    fn forecast() -> ForecastSummary {
        ForecastSummary {
            city: CityMetadata::default(),
            days: vec![DaySummary {
                day: "Tue".into(),
                date: NaiveDate::from_ymd_opt(2023, 11, 14).unwrap(),
                min: Some(3),
                max: Some(9),
                icon: "10d".into(),
                main: "Rain".into(),
                description: "light rain".into(),
            }],
        }
    }

    fn outcome(
        current: FetchResult<CurrentConditions>,
        forecast: FetchResult<ForecastSummary>,
    ) -> SearchOutcome {
        SearchOutcome {
            generation: 1,
            query: SearchQuery { city: "London".into(), units: UnitSystem::Metric },
            current,
            forecast,
        }
    }

    #[test]
    fn compass_points() {
        assert_eq!(deg_to_compass(0.0), "N");
        assert_eq!(deg_to_compass(200.0), "SSW");
        assert_eq!(deg_to_compass(359.0), "N");
        assert_eq!(deg_to_compass(90.0), "E");
        assert_eq!(deg_to_compass(-45.0), "NW");
        assert_eq!(deg_to_compass(f64::NAN), "");
    }

    #[test]
    fn local_time_applies_offset() {
        // 1700000000 is 22:13:20 UTC.
        assert_eq!(format_local_time(1_700_000_000, 0).as_deref(), Some("22:13"));
        assert_eq!(format_local_time(1_700_000_000, 3_600).as_deref(), Some("23:13"));
        assert_eq!(format_local_time(1_700_000_000, -5 * 3_600).as_deref(), Some("17:13"));
    }

    #[test]
    fn current_card_lists_details() {
        let text = render_current(&london(), UnitSystem::Metric, &plain());

        assert!(text.contains("London, GB"));
        assert!(text.contains("15°C"));
        assert!(text.contains("14°C"));
        assert!(text.contains("80%"));
        assert!(text.contains("3 m/s SSW"));
        assert!(text.contains("22:13"));
        assert!(text.contains("https://openweathermap.org/img/wn/04d@2x.png"));
    }

    #[test]
    fn current_card_uses_placeholders_for_missing_values() {
        let mut current = london();
        current.feels_like = None;
        current.wind_speed = None;
        current.sunrise = None;

        let text = render_current(&current, UnitSystem::Imperial, &plain());
        assert!(text.contains("15°F"));
        assert!(text.matches(PLACEHOLDER).count() >= 3);
    }

    #[test]
    fn imperial_wind_unit() {
        let text = render_current(&london(), UnitSystem::Imperial, &plain());
        assert!(text.contains("3 mph SSW"));
    }

    #[test]
    fn forecast_rows() {
        let text = render_forecast(&forecast(), UnitSystem::Metric, &plain());
        assert!(text.contains("5-Day Forecast"));
        assert!(text.contains("Tue"));
        assert!(text.contains("2023-11-14"));
        assert!(text.contains("9°C"));
        assert!(text.contains("Rain"));
    }

    #[test]
    fn empty_forecast_renders_nothing() {
        let empty = ForecastSummary { city: CityMetadata::default(), days: vec![] };
        assert!(render_forecast(&empty, UnitSystem::Metric, &plain()).is_empty());
    }

    #[test]
    fn forecast_failure_still_shows_current() {
        let text = render_outcome(
            &outcome(
                Ok(london()),
                Err(WeatherError::Transport("timeout".into())),
            ),
            &plain(),
        );

        assert!(text.contains("London, GB"));
        assert!(text.contains("Forecast:"));
        assert!(text.contains("Network error"));
    }

    #[test]
    fn current_failure_still_shows_forecast() {
        let err = WeatherError::Provider { status: 404, message: "Error: city not found".into() };
        let text = render_outcome(&outcome(Err(err), Ok(forecast())), &plain());

        assert!(text.contains("city not found"));
        assert!(text.contains("5-Day Forecast"));
    }

    #[test]
    fn identical_failures_are_reported_once() {
        let text = render_outcome(
            &outcome(Err(WeatherError::MissingCredential), Err(WeatherError::MissingCredential)),
            &plain(),
        );
        assert_eq!(text.matches("Missing API key").count(), 1);
    }

    #[test]
    fn colors_only_when_enabled() {
        assert!(colored(Theme::Dark).accent("x").starts_with("\x1b["));
        assert_eq!(plain().accent("x"), "x");
        assert_ne!(colored(Theme::Light).muted("x"), colored(Theme::Dark).muted("x"));
    }

    #[test]
    fn colored_rows_align_with_plain_rows() {
        let plain_row = row(&plain(), "Wind", "3 m/s");
        let colored_row = row(&colored(Theme::Dark), "Wind", "3 m/s");

        assert_eq!(plain_row, "  Wind        3 m/s\n");
        assert_ne!(colored_row, plain_row);
        assert_eq!(strip_ansi(&colored_row), plain_row);
    }

    #[test]
    fn colored_card_matches_plain_card_once_stripped() {
        for theme in [Theme::Light, Theme::Dark] {
            let plain_card = render_current(&london(), UnitSystem::Metric, &plain());
            let colored_card = render_current(&london(), UnitSystem::Metric, &colored(theme));
            assert_eq!(strip_ansi(&colored_card), plain_card);

            let plain_days = render_forecast(&forecast(), UnitSystem::Metric, &plain());
            let colored_days = render_forecast(&forecast(), UnitSystem::Metric, &colored(theme));
            assert_eq!(strip_ansi(&colored_days), plain_days);
        }
    }

    #[test]
    fn json_shape_mirrors_results() {
        let value = outcome_json(&outcome(
            Ok(london()),
            Err(WeatherError::Provider { status: 500, message: "Error: boom".into() }),
        ));

        assert_eq!(value["units"], "metric");
        assert_eq!(value["current"]["ok"], true);
        assert_eq!(value["current"]["data"]["temperature"], 15);
        assert_eq!(value["forecast"]["ok"], false);
        assert_eq!(value["forecast"]["status"], 500);
        assert_eq!(value["forecast"]["error"], "Error: boom");
    }
}
