//! HTTP fetch seam and status classification
//!
//! The resilience pipeline and client are written against the [`Fetch`]
//! trait; production uses [`ReqwestFetch`], tests inject scripted fakes.

use crate::error::{RegistryError, Result};
use async_trait::async_trait;
use url::Url;

/// A fetched HTTP response, reduced to what the client needs
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
    /// Parsed `Retry-After` header, seconds
    pub retry_after: Option<u64>,
}

/// One GET attempt against the upstream. Implementations do not retry or
/// time out; the resilience pipeline owns both.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<HttpResponse>;
}

/// Map a response status onto the error taxonomy.
///
/// 2xx passes through; 404 is not-found; 429 is rate-limited with
/// `Retry-After` (60 s when absent, the pack's convention); everything else
/// becomes an availability error carrying the status line.
pub fn check_status(response: HttpResponse) -> Result<HttpResponse> {
    match response.status {
        200..=299 => Ok(response),
        404 => Err(RegistryError::NotFound("resource not found".to_string())),
        429 => Err(RegistryError::RateLimited {
            retry_after_secs: response.retry_after.unwrap_or(60),
        }),
        status => Err(RegistryError::unavailable_status(
            status,
            format!("HTTP {status}"),
        )),
    }
}

/// Production fetcher backed by a shared `reqwest` client
pub struct ReqwestFetch {
    client: reqwest::Client,
}

impl ReqwestFetch {
    /// Build the shared client with the configured User-Agent. The connect
    /// timeout is generous; per-attempt deadlines live in the pipeline.
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| RegistryError::unavailable_transport(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetch for ReqwestFetch {
    async fn fetch(&self, url: &Url) -> Result<HttpResponse> {
        let response = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| RegistryError::unavailable_transport(e.to_string()))?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        let body = response
            .text()
            .await
            .map_err(|e| RegistryError::unavailable_transport(e.to_string()))?;

        Ok(HttpResponse {
            status,
            body,
            retry_after,
        })
    }
}
