// crates/schema-sync-service/src/source/http.rs
// ============================================================================
// Module: Schema Sync HTTP Source
// Description: HTTP-backed source for remote schema content.
// Purpose: Fetch schema and manifest bytes via HTTP GET.
// Dependencies: reqwest, url
// ============================================================================

//! ## Overview
//! [`HttpSource`] resolves `http://` and `https://` URLs into payload bytes.
//! Non-success status codes fail closed.
//! Invariants:
//! - Every request carries the configured user agent; the release manifest API
//!   rejects anonymous clients.
//! - Payload bytes are capped at [`crate::source::MAX_SOURCE_BYTES`], both by
//!   declared length and by bytes actually read.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use schema_sync_config::HttpConfig;
use url::Url;

use crate::source::FetchRequest;
use crate::source::MAX_SOURCE_BYTES;
use crate::source::Source;
use crate::source::SourceError;
use crate::source::SourcePayload;
use crate::source::enforce_max_bytes;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum number of redirects followed per request.
const MAX_REDIRECTS: usize = 5;

// ============================================================================
// SECTION: HTTP Source
// ============================================================================

/// HTTP-backed payload source.
///
/// # Invariants
/// - Responses exceeding [`crate::source::MAX_SOURCE_BYTES`] are rejected.
/// - At most five redirects are followed.
#[derive(Debug, Clone)]
pub struct HttpSource {
    /// HTTP client used for fetch requests.
    client: Client,
}

impl HttpSource {
    /// Builds an HTTP source with the provided timeout and user agent.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the HTTP client cannot be constructed.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, SourceError> {
        let client = Client::builder()
            .redirect(Policy::limited(MAX_REDIRECTS))
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|err| SourceError::Http(err.to_string()))?;
        Ok(Self {
            client,
        })
    }

    /// Builds an HTTP source from the `[http]` config section.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the HTTP client cannot be constructed.
    pub fn from_config(config: &HttpConfig) -> Result<Self, SourceError> {
        Self::new(config.timeout(), &config.user_agent)
    }

    /// Creates an HTTP source with a preconfigured client.
    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self {
            client,
        }
    }
}

#[async_trait]
impl Source for HttpSource {
    async fn fetch(&self, request: &FetchRequest) -> Result<SourcePayload, SourceError> {
        let url =
            Url::parse(&request.location).map_err(|err| SourceError::InvalidUri(err.to_string()))?;
        match url.scheme() {
            "http" | "https" => {}
            scheme => return Err(SourceError::UnsupportedScheme(scheme.to_string())),
        }

        let mut response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|err| SourceError::Http(format!("{}: {err}", request.label())))?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound(request.label().to_string()));
        }
        if !status.is_success() {
            return Err(SourceError::Http(format!("{}: http status {status}", request.label())));
        }

        if let Some(length) = response.content_length() {
            enforce_max_bytes(usize::try_from(length).unwrap_or(usize::MAX))?;
        }
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|err| SourceError::Http(format!("{}: {err}", request.label())))?
        {
            let total = bytes.len().saturating_add(chunk.len());
            if total > MAX_SOURCE_BYTES {
                return Err(SourceError::TooLarge {
                    max_bytes: MAX_SOURCE_BYTES,
                    actual_bytes: total,
                });
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok(SourcePayload {
            bytes,
            content_type,
        })
    }
}
