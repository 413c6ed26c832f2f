use thiserror::Error as ThisError;

use crate::request::AttemptOutcome;

/// Readable text for a UI when the whole chain is down
pub const USER_FACING_FAILURE: &str
  = "AI service unavailable. Please check your configuration and try again.";

/// Custom error type for chorus operations
/// Implements Clone for sending through channels
#[derive(Debug, Clone, PartialEq, ThisError)]
pub enum Error
{   /// Network failure or non-2xx status from one provider
    #[error("{provider} transport error{}: {message}"
      , .status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default())]
    ProviderTransport
    {   provider: String
      , status: Option<u16>
      , message: String
    }
  , /// A single attempt exceeded the per-attempt timeout
    #[error("{provider} timed out after {timeout_ms}ms")]
    ProviderTimeout
    {   provider: String
      , timeout_ms: u64
    }
  , /// Body arrived but the expected content field was absent
    #[error("{provider} response shape error: {message}")]
    ProviderResponseShape
    {   provider: String
      , message: String
    }
  , /// Expected-JSON content did not parse, even after fence stripping
    #[error("{provider} content parse error: {message}")]
    ProviderContentParse
    {   provider: String
      , message: String
    }
  , /// API key is missing for a provider
    #[error("Missing API key for: {0}")]
    MissingApiKey(String)
  , /// Every provider in the chain failed
    #[error("All providers failed for {context}: {}", summarize(.attempts))]
    AllProvidersFailed
    {   context: String
      , attempts: Vec<AttemptOutcome>
    }
  , /// Request rejected before any provider was contacted
    #[error("Invalid request: {0}")]
    InvalidRequest(String)
  , /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String)
  , /// Caller cancelled the request
    #[error("Request cancelled")]
    Cancelled
  , /// Generic error
    #[error("Error: {0}")]
    Other(String)
}

fn summarize(attempts: &[AttemptOutcome]) -> String
{   attempts
      .iter()
      .map(|a| format!(
        "{}: {}"
      , a.provider
      , a.error.as_deref().unwrap_or("unknown error")
      ))
      .collect::<Vec<_>>()
      .join("; ")
}

impl Error
{   /// True for errors that only eliminate the current provider
    pub fn is_provider_failure(&self) -> bool
    {   matches!(
          self
        , Error::ProviderTransport { .. }
          | Error::ProviderTimeout { .. }
          | Error::ProviderResponseShape { .. }
          | Error::ProviderContentParse { .. }
          | Error::MissingApiKey(_)
        )
    }

    /// Message suitable for showing to an end user.
    /// Raw per-provider diagnostics stay in the logs.
    pub fn user_message(&self) -> String
    {   match self
        {   Error::AllProvidersFailed { .. } => {
              USER_FACING_FAILURE.to_string()
            }
          , Error::Cancelled => {
              "Request cancelled.".to_string()
            }
          , Error::InvalidRequest(msg) => {
              format!("Invalid request: {}", msg)
            }
          , _ => USER_FACING_FAILURE.to_string()
        }
    }
}

impl From<String> for Error
{   fn from(s: String) -> Self
    {   Error::Other(s)
    }
}

impl From<&str> for Error
{   fn from(s: &str) -> Self
    {   Error::Other(s.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
