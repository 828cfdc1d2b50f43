//! # CREST2 Module
//!
//! HTTP access to the CREST2 telemetry endpoint exposed alongside
//! Automobilista 2.
//!
//! This module handles:
//! - Building the endpoint URL from host and port
//! - Fetching one snapshot per call with a hard timeout
//! - Turning every failure (network, timeout, status, body) into "no data"

pub mod snapshot;
pub mod source;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;

use crate::config::CrestConfig;
use crate::error::{CrestLoggerError, Result};
use snapshot::RawSnapshot;
pub use source::TelemetrySource;

/// Path of the full telemetry document on the CREST2 server
pub const API_PATH: &str = "/crest2/v1/api";

/// Build the endpoint URL for a host and port
pub fn endpoint_url(host: &str, port: u16) -> String {
    format!("http://{}:{}{}", host, port, API_PATH)
}

/// CREST2 HTTP client
///
/// Owns a single `reqwest::Client` so connections are reused between polls.
#[derive(Debug, Clone)]
pub struct CrestClient {
    client: reqwest::Client,
    url: String,
}

impl CrestClient {
    /// Create a client for the endpoint described by `config`
    ///
    /// # Errors
    ///
    /// Returns `Http` if the underlying client cannot be built
    pub fn new(config: &CrestConfig) -> Result<Self> {
        Self::with_url(endpoint_url(&config.host, config.port), config.timeout())
    }

    /// Create a client for an explicit URL
    pub fn with_url(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CrestLoggerError::Http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// The URL polled by this client
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn fetch_body(&self) -> Option<Bytes> {
        let response = match self.client.get(&self.url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!("CREST2 request failed: {}", e);
                return None;
            }
        };

        if response.status() != StatusCode::OK {
            debug!("CREST2 returned status {}", response.status());
            return None;
        }

        match response.bytes().await {
            Ok(body) => Some(body),
            Err(e) => {
                debug!("Failed to read CREST2 response body: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl TelemetrySource for CrestClient {
    async fn fetch(&mut self) -> Option<RawSnapshot> {
        let body = self.fetch_body().await?;
        let snapshot = RawSnapshot::from_body(&body);

        if snapshot.is_none() {
            debug!("Discarding CREST2 response without a timestamp ({} bytes)", body.len());
        }

        snapshot
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}
