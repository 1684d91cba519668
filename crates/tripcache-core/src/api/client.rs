//! HTTP adapter for the trip service.
//!
//! This module provides the `HttpStore` struct, a [`RemoteStore`] that talks
//! JSON to the service under a configurable base URL.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client, Method, RequestBuilder, Response, Url};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use super::{RemoteStore, StoreError, StoreResult};
use crate::config::Config;
use crate::models::{JournalEntry, Tag, Trip, TripDetail, TripPatch, TripSummary};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// HTTP client for the trip service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpStore {
    client: Client,
    base_url: Arc<Url>,
}

impl HttpStore {
    /// Create a store for the service rooted at `base_url`
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid API base URL: {}", base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("API base URL cannot carry a path: {}", base_url);
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: Arc::new(base_url),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::with_timeout(
            &config.api_base_url,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Build the URL for a path below the base URL. Segments are
    /// percent-encoded, so opaque ids can be passed as-is.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = (*self.base_url).clone();
        // Checked in the constructor: the base URL always has a path.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(response: Response) -> StoreResult<Option<Response>> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            // Rate limited - signal to retry
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(StoreError::from_status(status, &body))
        }
    }

    /// Send a request, backing off and retrying while the service answers 429.
    async fn send<F>(&self, url: &Url, build: F) -> StoreResult<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = build()
                .header(header::ACCEPT, "application/json")
                .send()
                .await
                .map_err(|e| {
                    warn!(url = %url, error = %e, "Request failed");
                    StoreError::from_transport(&e)
                })?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => return Ok(response),
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(StoreError::Unavailable("rate limited".to_string()));
                    }
                    warn!(url = %url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2; // Exponential backoff
                }
            }
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> StoreResult<T> {
        debug!(url = %url, "GET");
        let response = self.send(&url, || self.client.get(url.clone())).await?;
        response
            .json()
            .await
            .map_err(|e| StoreError::from_transport(&e))
    }

    async fn send_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: &B,
    ) -> StoreResult<T> {
        debug!(url = %url, method = %method, "Sending JSON body");
        let response = self
            .send(&url, || self.client.request(method.clone(), url.clone()).json(body))
            .await?;
        response
            .json()
            .await
            .map_err(|e| StoreError::from_transport(&e))
    }

    /// DELETE answers 204 with no body, so nothing is parsed.
    async fn delete(&self, url: Url) -> StoreResult<()> {
        debug!(url = %url, "DELETE");
        self.send(&url, || self.client.delete(url.clone())).await?;
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for HttpStore {
    async fn list_trips(&self) -> StoreResult<Vec<TripSummary>> {
        self.get(self.endpoint(&["trips"])).await
    }

    async fn trip_detail(&self, id: &str) -> StoreResult<TripDetail> {
        self.get(self.endpoint(&["trips", id])).await
    }

    async fn delete_trip(&self, id: &str) -> StoreResult<()> {
        self.delete(self.endpoint(&["trips", id])).await
    }

    async fn create_trip(&self, trip: &Trip) -> StoreResult<Trip> {
        self.send_json(Method::POST, self.endpoint(&["trips"]), trip)
            .await
    }

    async fn update_trip(&self, id: &str, patch: &TripPatch) -> StoreResult<Trip> {
        self.send_json(Method::PATCH, self.endpoint(&["trips", id]), patch)
            .await
    }

    async fn save_entry(&self, entry: &JournalEntry) -> StoreResult<JournalEntry> {
        let url = self.endpoint(&["trips", &entry.trip_id, "logs", &entry.id]);
        self.send_json(Method::PUT, url, entry).await
    }

    async fn delete_entry(&self, trip_id: &str, entry_id: &str) -> StoreResult<()> {
        self.delete(self.endpoint(&["trips", trip_id, "logs", entry_id]))
            .await
    }

    async fn list_tags(&self) -> StoreResult<Vec<Tag>> {
        self.get(self.endpoint(&["tags"])).await
    }
}
