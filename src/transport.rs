//! HTTP seam between the failover client and the network

use std::time::Duration;

use async_trait::async_trait;
use log::{error, trace};

use crate::error::{Error, Result};

/// A prepared POST, already in the provider's wire format
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest
{   pub url: String
  , pub headers: Vec<(String, String)>
  , pub query: Vec<(String, String)>
  , pub body: serde_json::Value
}

/// Raw status and body; interpretation belongs to the provider family
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse
{   pub status: u16
  , pub body: String
}

impl HttpResponse
{   pub fn is_success(&self) -> bool
    {   (200..300).contains(&self.status)
    }
}

/// Anything that can deliver a POST and hand back the raw response.
/// Errors are transport-level messages (connect, TLS, read failures).
#[async_trait]
pub trait Transport: Send + Sync
{   async fn post(
      &self
    , request: &HttpRequest
    ) -> std::result::Result<HttpResponse, String>;
}

/// `reqwest`-backed transport
#[derive(Debug, Clone)]
pub struct ReqwestTransport
{   http_client: reqwest::Client
}

/// Slack between the per-attempt deadline and the HTTP client's own
/// timeout, so a hung provider is reported as a timeout of the attempt
const HTTP_TIMEOUT_GRACE: Duration = Duration::from_secs(5);

/// HTTP-layer timeout for an attempt deadline of `attempt`
pub fn http_timeout(attempt: Duration) -> Duration
{   attempt.saturating_add(HTTP_TIMEOUT_GRACE)
}

impl ReqwestTransport
{   /// `attempt_timeout` is the failover deadline; the HTTP layer only
    /// backstops it
    pub fn new(attempt_timeout: Duration) -> Result<Self>
    {   let http_client = reqwest::Client::builder()
          .timeout(http_timeout(attempt_timeout))
          .build()
          .map_err(|e| {
            error!("Failed to build HTTP client: {}", e);
            Error::InvalidConfiguration(e.to_string())
          })?;
        Ok(ReqwestTransport { http_client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport
{   async fn post(
      &self
    , request: &HttpRequest
    ) -> std::result::Result<HttpResponse, String>
    {   trace!("POST {} body: {}", request.url, request.body);

        let mut builder = self.http_client
          .post(&request.url)
          .header("Content-Type", "application/json")
          .json(&request.body);
        if !request.query.is_empty()
        {   builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers
        {   builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
          .send()
          .await
          .map_err(|e| e.without_url().to_string())?;

        let status = response.status().as_u16();
        let body = response
          .text()
          .await
          .map_err(|e| {
            format!("failed to read body: {}", e.without_url())
          })?;

        trace!("Response status {} body: {}", status, body);
        Ok(HttpResponse { status, body })
    }
}
