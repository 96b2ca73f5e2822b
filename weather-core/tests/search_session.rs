//! Ordering tests for SearchSession with a transport that holds back chosen cities.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Url;
use tokio::sync::Notify;
use weather_core::{
    HttpResponse, OpenWeatherClient, SearchSession, SearchStatus, Transport, UnitSystem,
    provider::openweather::DEFAULT_BASE_URL,
};

/// Answers with the queried city name; requests for `held_city` wait for `release`.
#[derive(Debug)]
struct GatedTransport {
    held_city: String,
    started: Notify,
    release: Notify,
    requests: Mutex<Vec<String>>,
}

impl GatedTransport {
    fn holding(city: &str) -> Self {
        Self {
            held_city: city.to_string(),
            started: Notify::new(),
            release: Notify::new(),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Transport for GatedTransport {
    async fn get(&self, url: &Url) -> Result<HttpResponse> {
        let city = url
            .query_pairs()
            .find(|(k, _)| k == "q")
            .map(|(_, v)| v.into_owned())
            .unwrap_or_default();
        self.requests.lock().push(city.clone());

        if city == self.held_city {
            self.started.notify_one();
            self.release.notified().await;
        }

        let body = if url.path().ends_with("/forecast") {
            serde_json::json!({ "list": [], "city": { "name": city } })
        } else {
            serde_json::json!({ "name": city, "main": { "temp": 10.0 } })
        };

        Ok(HttpResponse {
            status: 200,
            body: body.to_string(),
        })
    }
}

#[tokio::test]
async fn test_stale_response_does_not_overwrite_newer_result() {
    let transport = Arc::new(GatedTransport::holding("Paris"));
    let client =
        OpenWeatherClient::new(Some("KEY".into()), DEFAULT_BASE_URL, transport.clone()).unwrap();
    let session = Arc::new(SearchSession::new(client));

    // Generation 1 stalls inside the transport.
    let first = tokio::spawn({
        let session = session.clone();
        async move { session.search("Paris", UnitSystem::Metric).await }
    });
    transport.started.notified().await;
    assert_eq!(session.latest_generation(), 1);

    // Generation 2 completes while generation 1 is still in flight.
    let second = session.search("London", UnitSystem::Metric).await;
    assert!(matches!(second, SearchStatus::Applied(ref o) if o.generation == 2));

    // Let generation 1 finish last.
    transport.release.notify_waiters();
    transport.release.notify_one();
    let first = first.await.unwrap();

    assert!(matches!(first, SearchStatus::Stale { generation: 1, latest: 2 }));

    let snapshot = session.snapshot().unwrap();
    assert_eq!(snapshot.generation, 2);
    assert_eq!(snapshot.query.city, "London");
    assert_eq!(snapshot.current.as_ref().unwrap().city, "London");
    assert_eq!(snapshot.forecast.as_ref().unwrap().city.name, "London");
}

#[tokio::test]
async fn test_both_requests_of_a_search_are_issued() {
    let transport = Arc::new(GatedTransport::holding("<none>"));
    let client =
        OpenWeatherClient::new(Some("KEY".into()), DEFAULT_BASE_URL, transport.clone()).unwrap();
    let session = SearchSession::new(client);

    let status = session.search("Madrid", UnitSystem::Imperial).await;

    assert!(matches!(status, SearchStatus::Applied(_)));
    assert_eq!(
        *transport.requests.lock(),
        vec!["Madrid".to_string(), "Madrid".to_string()]
    );
}
