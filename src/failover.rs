//! Ordered provider failover.
//!
//! Providers are tried strictly in chain order, one attempt each. The first
//! usable answer wins; every failure (transport, status, body shape, JSON
//! content) only eliminates that provider. Exhausting the chain yields a
//! single `Error::AllProvidersFailed` carrying one diagnostic per provider.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::config::{ClientConfig, FailoverChain, ProviderSpec};
use crate::content::parse_json_content;
use crate::error::{Error, Result};
use crate::providers;
use crate::request::{AttemptOutcome, CanonicalRequest, CanonicalResponse};
use crate::transport::{ReqwestTransport, Transport};

/// Stateless failover executor; cheap to clone and share
#[derive(Clone)]
pub struct FailoverClient
{   transport: Arc<dyn Transport>
  , timeout: Duration
}

impl FailoverClient
{   /// `timeout` bounds every single provider attempt
    pub fn new(transport: Arc<dyn Transport>, timeout: Duration) -> Self
    {   debug!("Creating FailoverClient, attempt timeout {:?}", timeout);
        FailoverClient { transport, timeout }
    }

    /// HTTP-backed client using the configured timeout
    pub fn from_config(config: &ClientConfig) -> Result<Self>
    {   let transport = ReqwestTransport::new(config.timeout())?;
        Ok(Self::new(Arc::new(transport), config.timeout()))
    }

    pub fn timeout(&self) -> Duration
    {   self.timeout
    }

    /// Return the first provider's normalized answer
    pub async fn execute(
      &self
    , request: &CanonicalRequest
    , chain: &FailoverChain
    , context: &str
    ) -> Result<CanonicalResponse>
    {   self.execute_with_cancel(
          request
        , chain
        , context
        , &CancellationToken::new()
        ).await
    }

    /// `execute`, abandoning the chain as soon as `cancel` fires
    pub async fn execute_with_cancel(
      &self
    , request: &CanonicalRequest
    , chain: &FailoverChain
    , context: &str
    , cancel: &CancellationToken
    ) -> Result<CanonicalResponse>
    {   self.execute_traced(request, chain, context, cancel)
          .await
          .map(|(response, _)| response)
    }

    /// `execute`, also returning the attempt log (failures first, then the
    /// winning attempt)
    pub async fn execute_traced(
      &self
    , request: &CanonicalRequest
    , chain: &FailoverChain
    , context: &str
    , cancel: &CancellationToken
    ) -> Result<(CanonicalResponse, Vec<AttemptOutcome>)>
    {   self.run_chain(request, chain, context, false, cancel, |spec, text| {
          Ok(CanonicalResponse
          {   content: text
            , provider: spec.name.clone()
            , model: spec.model.clone()
          })
        }).await
    }

    /// Ask for JSON and deserialize it. Content that does not parse fails
    /// that provider and the chain moves on.
    pub async fn execute_json<T>(
      &self
    , request: &CanonicalRequest
    , chain: &FailoverChain
    , context: &str
    ) -> Result<T>
    where T: DeserializeOwned
    {   self.execute_json_with(
          request
        , chain
        , context
        , &CancellationToken::new()
        , |_: &T| Ok(())
        ).await
    }

    /// `execute_json` with a semantic check; a rejected value counts as a
    /// content parse failure for that provider
    pub async fn execute_json_with<T, V>(
      &self
    , request: &CanonicalRequest
    , chain: &FailoverChain
    , context: &str
    , cancel: &CancellationToken
    , validate: V
    ) -> Result<T>
    where T: DeserializeOwned
        , V: Fn(&T) -> std::result::Result<(), String>
    {   self.run_chain(request, chain, context, true, cancel, |spec, text| {
          let value: T = parse_json_content(&text)
            .and_then(|value| validate(&value).map(|_| value))
            .map_err(|message| Error::ProviderContentParse
            {   provider: spec.name.clone()
              , message
            })?;
          Ok(value)
        })
        .await
        .map(|(value, _)| value)
    }

    async fn run_chain<T, F>(
      &self
    , request: &CanonicalRequest
    , chain: &FailoverChain
    , context: &str
    , json: bool
    , cancel: &CancellationToken
    , finish: F
    ) -> Result<(T, Vec<AttemptOutcome>)>
    where F: Fn(&ProviderSpec, String) -> Result<T>
    {   request.validate()?;

        info!(
          "{} - starting provider chain [{}]"
        , context
        , chain.names().join(" -> ")
        );

        let mut attempts: Vec<AttemptOutcome>
          = Vec::with_capacity(chain.len());

        for spec in chain.providers()
        {   if cancel.is_cancelled()
            {   info!("{} - cancelled before {}", context, spec.name);
                return Err(Error::Cancelled);
            }

            debug!("{} - trying {} ({})", context, spec.name, spec.model);
            let result = match self.attempt(spec, request, json, cancel).await
            {   Ok(text) => finish(spec, text)
              , Err(e) => Err(e)
            };

            match result
            {   Ok(value) => {
                  info!("{} - {} succeeded", context, spec.name);
                  attempts.push(AttemptOutcome::success(&spec.name));
                  return Ok((value, attempts));
                }
              , Err(Error::Cancelled) => {
                  info!("{} - cancelled during {}", context, spec.name);
                  return Err(Error::Cancelled);
                }
              , Err(e) => {
                  warn!("{} - {} failed: {}", context, spec.name, e);
                  attempts.push(AttemptOutcome::failure(&spec.name, &e));
                }
            }
        }

        error!(
          "{} - all {} providers failed"
        , context
        , attempts.len()
        );
        Err(Error::AllProvidersFailed
        {   context: context.to_string()
          , attempts
        })
    }

    /// One call to one provider, bounded by the timeout and the token
    async fn attempt(
      &self
    , spec: &ProviderSpec
    , request: &CanonicalRequest
    , json: bool
    , cancel: &CancellationToken
    ) -> Result<String>
    {   let prepared = providers::prepare(spec, request, json)?;

        let outcome = tokio::select!
        {   biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled)
          , outcome = tokio::time::timeout(
              self.timeout
            , self.transport.post(&prepared)
            ) => outcome
        };

        let response = match outcome
        {   Err(_) => {
              return Err(Error::ProviderTimeout
              {   provider: spec.name.clone()
                , timeout_ms: self.timeout.as_millis() as u64
              });
            }
          , Ok(Err(message)) => {
              return Err(Error::ProviderTransport
              {   provider: spec.name.clone()
                , status: None
                , message
              });
            }
          , Ok(Ok(response)) => response
        };

        providers::normalize(spec, &response)
    }
}
