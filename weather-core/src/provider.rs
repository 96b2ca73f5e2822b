//! Provider access: the HTTP transport seam and the OpenWeather client built on it.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::{fmt::Debug, time::Duration};

pub mod openweather;

pub use openweather::OpenWeatherClient;
pub use reqwest::Url;

/// Raw HTTP answer handed back by a [`Transport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs a GET request. An `Err` means no HTTP response was obtained at all.
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    async fn get(&self, url: &Url) -> Result<HttpResponse>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ocean-weather/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { http })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &Url) -> Result<HttpResponse> {
        let res = self
            .http
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url.path()))?;

        let status = res.status().as_u16();
        let body = res
            .text()
            .await
            .context("Failed to read response body")?;

        Ok(HttpResponse { status, body })
    }
}
