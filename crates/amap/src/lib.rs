//! AMap (高德) REST v3 web service client.
//!
//! Bodies are handed back as JSON without interpretation; the orchestrator
//! decides what counts as a hit.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client as Http, Request};
use serde_json::Value;
use tracing::debug;

use orchestrator_core::model::Coordinate;
use orchestrator_core::ports::MapPort;

pub const DEFAULT_BASE_URL: &str = "https://restapi.amap.com";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const GEOCODE_PATH: &str = "/v3/geocode/geo";
const DISTANCE_PATH: &str = "/v3/distance";
const WALKING_PATH: &str = "/v3/direction/walking";
const TRANSIT_PATH: &str = "/v3/direction/transit/integrated";
/// Straight-line measurement for `/v3/distance`.
const STRAIGHT_LINE: &str = "1";

#[derive(Clone, Debug)]
pub struct AmapClient {
    http: Http,
    key: String,
    base_url: String,
}

impl AmapClient {
    pub fn new(key: String) -> Result<Self> {
        Self::with_timeout(key, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(key: String, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: Http::builder()
                .pool_max_idle_per_host(8)
                .timeout(timeout)
                .build()?,
            key,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// AMAP_API_KEY, optionally AMAP_BASE_URL.
    pub fn from_env() -> Result<Self> {
        let key = std::env::var("AMAP_API_KEY").context("AMAP_API_KEY not set")?;
        let client = Self::new(key)?;
        Ok(match std::env::var("AMAP_BASE_URL") {
            Ok(url) if !url.trim().is_empty() => client.with_base_url(url),
            _ => client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build(&self, path: &str, params: &[(&str, &str)]) -> Result<Request> {
        let url = format!("{}{}", self.base_url, path);
        let request = self
            .http
            .get(url)
            .query(&[("key", self.key.as_str()), ("output", "JSON")])
            .query(params)
            .build()?;
        Ok(request)
    }

    async fn get(&self, path: &'static str, params: &[(&str, &str)]) -> Result<Value> {
        let request = self.build(path, params)?;
        debug!(path, ?params, "amap request");

        let resp = self.http.execute(request).await.context("request failed")?;
        if !resp.status().is_success() {
            return Err(anyhow!("amap {} {}: {}", path, resp.status(), resp.text().await.unwrap_or_default()));
        }
        let body: Value = resp.json().await.context("invalid json")?;
        debug!(path, status = ?body.get("status"), info = ?body.get("info"), "amap reply");
        Ok(body)
    }
}

#[async_trait]
impl MapPort for AmapClient {
    async fn geocode(&self, address: &str) -> Result<Value> {
        self.get(GEOCODE_PATH, &[("address", address)]).await
    }

    async fn distance(&self, origin: &Coordinate, destination: &Coordinate) -> Result<Value> {
        self.get(
            DISTANCE_PATH,
            &[("origins", origin.as_str()), ("destination", destination.as_str()), ("type", STRAIGHT_LINE)],
        )
        .await
    }

    async fn walking_route(&self, origin: &Coordinate, destination: &Coordinate) -> Result<Value> {
        self.get(WALKING_PATH, &[("origin", origin.as_str()), ("destination", destination.as_str())])
            .await
    }

    async fn transit_route(&self, origin: &Coordinate, destination: &Coordinate, city: &str) -> Result<Value> {
        self.get(
            TRANSIT_PATH,
            &[
                ("origin", origin.as_str()),
                ("destination", destination.as_str()),
                ("city", city),
                ("cityd", city),
            ],
        )
        .await
    }
}
