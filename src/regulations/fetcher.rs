//! Rate-limited HTTP fetching against the quota-tracked Regulations.gov API
//!
//! The remote API grants a fixed number of requests per hour and per key, and
//! reports what is left in the `X-RateLimit-Remaining` header of every
//! response. The remaining quota is carried as an explicit [`RateLimit`] value:
//! it goes into every [`RateLimitedFetcher::fetch`] call and a refreshed value
//! comes back out, so there is exactly one counter and it is never shared.

use reqwest::header::HeaderMap;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::regulations::urls::redact;
use crate::regulations::{RegulationsApi, RegulationsError};

/// Remaining requests in the current quota window
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RateLimit(i64);

impl RateLimit {
    pub fn new(remaining: i64) -> Self {
        Self(remaining)
    }

    /// Quota state after the API refused a request for being over quota
    pub fn exhausted() -> Self {
        Self(0)
    }

    pub fn remaining(&self) -> i64 {
        self.0
    }

    /// True while `remaining - headroom > 0`
    pub fn has_headroom(&self, headroom: i64) -> bool {
        self.0 - headroom > 0
    }

    /// Read the quota from response headers.
    ///
    /// A response without the header still spent one request, so the previous
    /// value is decremented rather than kept.
    pub fn from_headers(headers: &HeaderMap, previous: RateLimit) -> Self {
        Self::header_value(headers).unwrap_or(Self(previous.0.saturating_sub(1)))
    }

    fn header_value(headers: &HeaderMap) -> Option<Self> {
        headers
            .get(RegulationsApi::RATE_LIMIT_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<i64>().ok())
            .map(Self)
    }
}

impl std::fmt::Display for RateLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Issues GET requests one at a time, pausing for a fixed cooldown whenever the
/// quota runs out.
#[derive(Debug, Clone)]
pub struct RateLimitedFetcher {
    client: Client,
    probe_url: String,
    cooldown: Duration,
    headroom: i64,
    reset_quota: RateLimit,
}

impl RateLimitedFetcher {
    /// `probe_url` is requested after each cooldown to learn the refreshed quota
    pub fn new(client: Client, config: &Config, probe_url: impl Into<String>) -> Self {
        Self {
            client,
            probe_url: probe_url.into(),
            cooldown: config.cooldown(),
            headroom: config.rate_limits.headroom,
            reset_quota: RateLimit::new(config.rate_limits.initial_quota),
        }
    }

    /// GET `url`, waiting out the quota window first if it is exhausted.
    ///
    /// Returns the successful response together with the quota reported by it.
    /// Non-2xx responses other than 429 are returned as errors.
    pub async fn fetch(
        &self,
        url: &str,
        rate_limit: RateLimit,
    ) -> Result<(Response, RateLimit), RegulationsError> {
        let mut rate_limit = rate_limit;

        loop {
            if !rate_limit.has_headroom(self.headroom) {
                rate_limit = self.cool_down(rate_limit).await?;
                continue;
            }

            debug!("GET {} (quota remaining: {})", redact(url), rate_limit);
            let response = self
                .client
                .get(url)
                .header("Accept", "application/vnd.api+json, application/json")
                .send()
                .await
                .map_err(|e| RegulationsError::Http(e.without_url()))?;

            let status = response.status();
            let updated = RateLimit::from_headers(response.headers(), rate_limit);

            if status == StatusCode::TOO_MANY_REQUESTS {
                warn!("API refused {} as over quota", redact(url));
                rate_limit = RateLimit::exhausted();
                continue;
            }

            if !status.is_success() {
                return Err(RegulationsError::ApiError {
                    status_code: status.as_u16(),
                    url: redact(url),
                });
            }

            debug!("HTTP {} for {} (quota remaining: {})", status, redact(url), updated);
            return Ok((response, updated));
        }
    }

    /// GET `url` and decode its JSON body
    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        url: &str,
        rate_limit: RateLimit,
    ) -> Result<(T, RateLimit), RegulationsError> {
        let (response, rate_limit) = self.fetch(url, rate_limit).await?;
        let body = response
            .text()
            .await
            .map_err(|e| RegulationsError::Http(e.without_url()))?;
        let parsed = serde_json::from_str(&body).map_err(|source| RegulationsError::MalformedEnvelope {
            url: redact(url),
            source,
        })?;
        Ok((parsed, rate_limit))
    }

    /// Ask the API for the current quota without going through the cooldown logic.
    ///
    /// When the probe response carries no quota header the window is assumed to
    /// have rolled over.
    pub async fn check_quota(&self) -> Result<RateLimit, RegulationsError> {
        debug!("Checking quota via {}", redact(&self.probe_url));
        let response = self
            .client
            .get(&self.probe_url)
            .send()
            .await
            .map_err(|e| RegulationsError::Http(e.without_url()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Ok(RateLimit::exhausted());
        }
        if !status.is_success() {
            return Err(RegulationsError::ApiError {
                status_code: status.as_u16(),
                url: redact(&self.probe_url),
            });
        }

        Ok(RateLimit::header_value(response.headers()).unwrap_or(self.reset_quota))
    }

    async fn cool_down(&self, rate_limit: RateLimit) -> Result<RateLimit, RegulationsError> {
        warn!(
            "Quota nearly exhausted ({} requests left), waiting {} seconds",
            rate_limit,
            self.cooldown.as_secs()
        );
        println!(
            "⏳ Rate limit reached ({} requests left), pausing for {} minutes",
            rate_limit,
            self.cooldown.as_secs() / 60
        );

        tokio::time::sleep(self.cooldown).await;

        let refreshed = self.check_quota().await?;
        info!("Quota after cooldown: {}", refreshed);
        Ok(refreshed)
    }
}
