//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the harvest, including:
//! - Building HTTP clients with the configured user agent and timeouts
//! - Custom card fetches, where a redirect means "no card for this unit"
//! - Document fetches with retry for transient failures
//! - Error classification

use crate::config::HarvestConfig;
use crate::HarvestError;
use reqwest::{header::LOCATION, redirect::Policy, Client, StatusCode};
use std::time::Duration;
use url::Url;

/// Result of a single fetch
#[derive(Debug)]
pub enum FetchOutcome {
    /// The server returned a document
    Document {
        /// HTTP status code
        status_code: u16,
        /// Response body
        body: String,
    },

    /// The server answered with a redirect that was not followed
    Redirected {
        /// HTTP status code
        status_code: u16,
        /// Location header, if present
        location: Option<String>,
    },
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - Harvest settings (user agent and timeouts)
/// * `redirects` - Redirect policy for this client
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &HarvestConfig, redirects: Policy) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .redirect(redirects)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Returns true if retrying the request might succeed
///
/// | Condition | Transient |
/// |-----------|-----------|
/// | Timeout / connection failure | yes |
/// | HTTP 5xx | yes |
/// | HTTP 429 | yes |
/// | Any other HTTP status | no |
/// | Anything else | no |
pub fn is_transient(error: &HarvestError) -> bool {
    match error {
        HarvestError::Http { source, .. } => source.is_timeout() || source.is_connect(),
        HarvestError::HttpStatus { status, .. } => {
            *status >= 500 || *status == StatusCode::TOO_MANY_REQUESTS.as_u16()
        }
        _ => false,
    }
}

/// Shared HTTP access for discovery and the workers
///
/// Holds two clients over the same settings: one that follows redirects for
/// listing and overview pages, and one that never does, so a redirected custom
/// card request can be recognised.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    no_redirect_client: Client,
    retry_delay: Duration,
}

impl Fetcher {
    pub fn new(config: &HarvestConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config, Policy::limited(10))?,
            no_redirect_client: build_http_client(config, Policy::none())?,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    /// Fetches a page without following redirects
    ///
    /// A 3xx answer is returned as `FetchOutcome::Redirected`, not an error.
    pub async fn fetch_no_redirect(&self, url: &Url) -> Result<FetchOutcome, HarvestError> {
        get(&self.no_redirect_client, url).await
    }

    /// Fetches a document, following redirects
    ///
    /// # Errors
    ///
    /// Network failures and non-success statuses are returned as errors.
    pub async fn fetch_document(&self, url: &Url) -> Result<String, HarvestError> {
        match get(&self.client, url).await? {
            FetchOutcome::Document { body, .. } => Ok(body),
            FetchOutcome::Redirected { status_code, .. } => Err(HarvestError::HttpStatus {
                url: url.to_string(),
                status: status_code,
            }),
        }
    }

    /// Fetches a document, retrying transient failures
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to fetch
    /// * `retries` - Extra attempts after the first one
    pub async fn fetch_document_with_retry(
        &self,
        url: &Url,
        retries: u32,
    ) -> Result<String, HarvestError> {
        let mut attempt = 0;
        loop {
            match self.fetch_document(url).await {
                Ok(body) => return Ok(body),
                Err(e) if attempt < retries && is_transient(&e) => {
                    attempt += 1;
                    tracing::warn!(
                        "Transient failure fetching {} (attempt {}/{}): {}",
                        url,
                        attempt,
                        retries + 1,
                        e
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

async fn get(client: &Client, url: &Url) -> Result<FetchOutcome, HarvestError> {
    let started = std::time::Instant::now();

    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|source| HarvestError::Http {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();

    if status.is_redirection() {
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        tracing::debug!("{} redirected ({}) to {:?}", url, status, location);
        return Ok(FetchOutcome::Redirected {
            status_code: status.as_u16(),
            location,
        });
    }

    if !status.is_success() {
        return Err(HarvestError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response.text().await.map_err(|source| HarvestError::Http {
        url: url.to_string(),
        source,
    })?;

    tracing::debug!(
        "Fetched {} ({} bytes) in {:?}",
        url,
        body.len(),
        started.elapsed()
    );

    Ok(FetchOutcome::Document {
        status_code: status.as_u16(),
        body,
    })
}
