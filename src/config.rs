//! Configuration for chorus providers and failover behavior

use std::path::Path;
use std::time::Duration;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const OPENAI_CHAT_URL: &str
  = "https://api.openai.com/v1/chat/completions";
pub const OLLAMA_CLOUD_BASE: &str = "https://ollama.com";
pub const GEMINI_API_BASE: &str
  = "https://generativelanguage.googleapis.com/v1beta";

/// How a canonical request is put on the wire and read back
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequestShape
{   /// OpenAI / Ollama compatible `chat/completions`
    ChatCompletions
  , /// Gemini `generateContent`
    GenerativeContent
  , /// Application proxy that forwards to `upstream` and answers `{content}`
    ChatProxy
    {   upstream: String
    }
}

/// Where the API key goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Auth
{   /// `Authorization: Bearer <key>`
    Bearer
  , /// `?key=<key>` query parameter
    QueryKey
  , /// No credentials (e.g. a same-origin proxy)
    None
}

/// One backend in a failover chain. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSpec
{   /// Display label used in logs and error messages
    pub name: String
  , /// URL (for generative content: the API base)
    pub endpoint: String
  , /// Backend-specific model id
    pub model: String
  , pub shape: RequestShape
  , pub auth: Auth
  , #[serde(skip_serializing)]
    pub api_key: Option<String>
}

impl ProviderSpec
{   pub fn new(
      name: impl Into<String>
    , endpoint: impl Into<String>
    , model: impl Into<String>
    , shape: RequestShape
    , auth: Auth
    , api_key: Option<String>
    ) -> Self
    {   ProviderSpec
        {   name: name.into()
          , endpoint: endpoint.into()
          , model: model.into()
          , shape
          , auth
          , api_key
        }
    }
}

/// Ordered providers; earlier entries are strictly preferred
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailoverChain
{   providers: Vec<ProviderSpec>
}

impl FailoverChain
{   pub fn new(providers: Vec<ProviderSpec>) -> Result<Self>
    {   if providers.is_empty()
        {   return Err(Error::InvalidConfiguration(
              "failover chain needs at least one provider".to_string()
            ));
        }
        debug!(
          "Creating failover chain with {} providers"
        , providers.len()
        );
        Ok(FailoverChain { providers })
    }

    pub fn providers(&self) -> &[ProviderSpec]
    {   &self.providers
    }

    pub fn len(&self) -> usize
    {   self.providers.len()
    }

    pub fn is_empty(&self) -> bool
    {   self.providers.is_empty()
    }

    pub fn names(&self) -> Vec<String>
    {   self.providers.iter().map(|p| p.name.clone()).collect()
    }
}

/// Provider entry as written in a config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig
{   pub name: String
  , pub endpoint: String
  , pub model: String
  , pub shape: RequestShape
  , #[serde(default = "default_auth")]
    pub auth: Auth
  , /// Environment variable holding the API key
    #[serde(default)]
    pub api_key_env: Option<String>
}

fn default_auth() -> Auth
{   Auth::Bearer
}

fn default_timeout_secs() -> u64
{   DEFAULT_TIMEOUT_SECS
}

/// chorus configuration, built once at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig
{   /// Per-attempt timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64
  , /// Providers in priority order
    pub providers: Vec<ProviderConfig>
}

impl Default for ClientConfig
{   fn default() -> Self
    {   ClientConfig
        {   timeout_secs: DEFAULT_TIMEOUT_SECS
          , providers: vec![]
        }
    }
}

impl ClientConfig
{   /// Load from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self>
    {   let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
          Error::InvalidConfiguration(format!(
            "cannot read {}: {}"
          , path.display()
          , e
          ))
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self>
    {   serde_json::from_str(raw).map_err(|e| {
          Error::InvalidConfiguration(e.to_string())
        })
    }

    /// Default OpenAI -> Ollama Cloud -> Gemini chain from the process
    /// environment
    pub fn from_env() -> Self
    {   Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` with an explicit variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self
    {   let ollama_base = lookup("OLLAMA_API_URL")
          .unwrap_or_else(|| OLLAMA_CLOUD_BASE.to_string());
        let gemini_key_env
          = if lookup("GEMINI_API_KEY").is_some()
            {   "GEMINI_API_KEY"
            } else
            {   "API_KEY"
            };

        ClientConfig
        {   timeout_secs: DEFAULT_TIMEOUT_SECS
          , providers: vec![
              ProviderConfig
              {   name: "OpenAI".to_string()
                , endpoint: OPENAI_CHAT_URL.to_string()
                , model: "gpt-4o".to_string()
                , shape: RequestShape::ChatCompletions
                , auth: Auth::Bearer
                , api_key_env: Some("OPENAI_API_KEY".to_string())
              }
            , ProviderConfig
              {   name: "Ollama Cloud".to_string()
                , endpoint: format!(
                    "{}/v1/chat/completions"
                  , ollama_base.trim_end_matches('/')
                  )
                , model: "kimi-k2:1t-cloud".to_string()
                , shape: RequestShape::ChatCompletions
                , auth: Auth::Bearer
                , api_key_env: Some("OLLAMA_API_KEY".to_string())
              }
            , ProviderConfig
              {   name: "Google Gemini".to_string()
                , endpoint: GEMINI_API_BASE.to_string()
                , model: "gemini-2.0-flash-exp".to_string()
                , shape: RequestShape::GenerativeContent
                , auth: Auth::QueryKey
                , api_key_env: Some(gemini_key_env.to_string())
              }
            ]
        }
    }

    pub fn timeout(&self) -> Duration
    {   Duration::from_secs(self.timeout_secs)
    }

    /// Resolve API keys from the process environment into a chain
    pub fn chain(&self) -> Result<FailoverChain>
    {   self.chain_with(|key| std::env::var(key).ok())
    }

    /// Resolve API keys with an explicit lookup into a chain.
    /// A missing key is not an error here; that provider will fail its
    /// attempt and the chain moves on.
    pub fn chain_with(
      &self
    , lookup: impl Fn(&str) -> Option<String>
    ) -> Result<FailoverChain>
    {   if self.timeout_secs == 0
        {   return Err(Error::InvalidConfiguration(
              "timeout_secs must be greater than zero".to_string()
            ));
        }

        let providers = self.providers
          .iter()
          .map(|p| {
            let api_key = p.api_key_env
              .as_deref()
              .and_then(|var| lookup(var))
              .filter(|key| !key.trim().is_empty());
            if api_key.is_none() && p.auth != Auth::None
            {   warn!("No API key configured for {}", p.name);
            }
            ProviderSpec::new(
              p.name.clone()
            , p.endpoint.clone()
            , p.model.clone()
            , p.shape.clone()
            , p.auth
            , api_key
            )
          })
          .collect();

        FailoverChain::new(providers)
    }
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn default_chain_order_and_keys()
    {   let config = ClientConfig::from_lookup(|key| match key
        {   "OPENAI_API_KEY" => Some("sk-test".to_string())
          , "API_KEY" => Some("gem-test".to_string())
          , _ => None
        });
        let chain = config
          .chain_with(|key| match key
          {   "OPENAI_API_KEY" => Some("sk-test".to_string())
            , "API_KEY" => Some("gem-test".to_string())
            , _ => None
          })
          .unwrap();

        assert_eq!(
          chain.names()
        , vec!["OpenAI", "Ollama Cloud", "Google Gemini"]
        );
        let providers = chain.providers();
        assert_eq!(providers[0].api_key.as_deref(), Some("sk-test"));
        assert_eq!(providers[1].api_key, None);
        assert_eq!(providers[2].api_key.as_deref(), Some("gem-test"));
        assert_eq!(providers[2].auth, Auth::QueryKey);
    }

    #[test]
    fn ollama_url_override()
    {   let config = ClientConfig::from_lookup(|key| match key
        {   "OLLAMA_API_URL" => Some("https://api.ollama.cloud/".to_string())
          , _ => None
        });
        assert_eq!(
          config.providers[1].endpoint
        , "https://api.ollama.cloud/v1/chat/completions"
        );
    }

    #[test]
    fn empty_chain_rejected()
    {   assert!(matches!(
          FailoverChain::new(vec![])
        , Err(Error::InvalidConfiguration(_))
        ));
        assert!(ClientConfig::default().chain_with(|_| None).is_err());
    }

    #[test]
    fn json_config_round()
    {   let raw = r#"{
          "timeout_secs": 5,
          "providers": [
            { "name": "Proxy", "endpoint": "http://localhost:3000/api/chat",
              "model": "gpt-4o", "auth": "none",
              "shape": { "type": "chat_proxy", "upstream": "openai" } },
            { "name": "Gemini", "endpoint": "https://example.test/v1beta",
              "model": "gemini-2.0-flash", "auth": "query_key",
              "shape": { "type": "generative_content" },
              "api_key_env": "GEMINI_API_KEY" }
          ]
        }"#;
        let config = ClientConfig::from_json_str(raw).unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(5));

        let chain = config.chain_with(|_| None).unwrap();
        assert_eq!(
          chain.providers()[0].shape
        , RequestShape::ChatProxy { upstream: "openai".to_string() }
        );
        assert_eq!(chain.providers()[1].auth, Auth::QueryKey);
    }

    #[test]
    fn timeout_defaults_when_absent()
    {   let config = ClientConfig::from_json_str(r#"{ "providers": [] }"#)
          .unwrap();
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }
}
