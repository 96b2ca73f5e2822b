//! Core library for the Ocean Weather client.
//!
//! This crate defines:
//! - Credential resolution and on-disk configuration
//! - The OpenWeather client and its transport seam
//! - Reduction of the 3-hour forecast feed into daily summaries
//! - Search sessions that discard out-of-order results
//! - Unit and theme preferences over a key-value store
//!
//! It is used by `weather-cli`, but can also be reused by other front ends.

pub mod config;
pub mod error;
pub mod model;
pub mod prefs;
pub mod provider;
pub mod session;
pub mod summary;

pub use config::{Config, CredentialSource};
pub use error::{FetchResult, WeatherError};
pub use model::{
    CityMetadata, Condition, CurrentConditions, DaySummary, ForecastEntry, ForecastSummary,
    UnitSystem,
};
pub use prefs::{FilePreferenceStore, MemoryPreferenceStore, PreferenceStore, Preferences, Theme};
pub use provider::{HttpResponse, OpenWeatherClient, ReqwestTransport, Transport};
pub use session::{SearchOutcome, SearchQuery, SearchSession, SearchStatus};
