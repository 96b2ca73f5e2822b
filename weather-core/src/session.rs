//! One search cycle: both fetches in parallel, stale results discarded.

use parking_lot::Mutex;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use crate::{
    error::FetchResult,
    model::{CurrentConditions, ForecastSummary, UnitSystem},
    provider::OpenWeatherClient,
};

/// What a search asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub city: String,
    pub units: UnitSystem,
}

/// The two independent results of one search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub generation: u64,
    pub query: SearchQuery,
    pub current: FetchResult<CurrentConditions>,
    pub forecast: FetchResult<ForecastSummary>,
}

impl SearchOutcome {
    pub fn all_failed(&self) -> bool {
        self.current.is_err() && self.forecast.is_err()
    }
}

#[derive(Debug, Clone)]
pub enum SearchStatus {
    /// The outcome became the session's latest state.
    Applied(Arc<SearchOutcome>),
    /// A newer search was issued while this one was in flight.
    Stale { generation: u64, latest: u64 },
}

/// Tags every search with a generation number and only keeps the newest.
#[derive(Debug)]
pub struct SearchSession {
    client: OpenWeatherClient,
    issued: AtomicU64,
    latest: Mutex<Option<Arc<SearchOutcome>>>,
}

impl SearchSession {
    pub fn new(client: OpenWeatherClient) -> Self {
        Self {
            client,
            issued: AtomicU64::new(0),
            latest: Mutex::new(None),
        }
    }

    /// Latest generation handed out, `0` before any search.
    pub fn latest_generation(&self) -> u64 {
        self.issued.load(Ordering::SeqCst)
    }

    /// Most recently applied outcome.
    pub fn snapshot(&self) -> Option<Arc<SearchOutcome>> {
        self.latest.lock().clone()
    }

    pub async fn search(&self, city: &str, units: UnitSystem) -> SearchStatus {
        let generation = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let query = SearchQuery {
            city: city.trim().to_string(),
            units,
        };
        tracing::debug!(generation, city = %query.city, %units, "search issued");

        let (current, forecast) = tokio::join!(
            self.client.fetch_current_conditions(&query.city, units),
            self.client.fetch_forecast_summary(&query.city, units),
        );

        self.commit(SearchOutcome {
            generation,
            query,
            current,
            forecast,
        })
    }

    fn commit(&self, outcome: SearchOutcome) -> SearchStatus {
        // Hold the slot while comparing so a concurrent commit cannot interleave.
        let mut slot = self.latest.lock();
        let latest = self.issued.load(Ordering::SeqCst);

        if outcome.generation != latest {
            tracing::debug!(generation = outcome.generation, latest, "discarding stale search result");
            return SearchStatus::Stale {
                generation: outcome.generation,
                latest,
            };
        }

        let outcome = Arc::new(outcome);
        *slot = Some(outcome.clone());
        SearchStatus::Applied(outcome)
    }
}
