//! The application's own chat proxy (`POST /api/chat`).
//! Forwards to an upstream provider and answers with `{content}`.

use serde::{Deserialize, Serialize};

use crate::config::ProviderSpec;
use crate::error::{Error, Result};
use crate::request::CanonicalRequest;

use super::chat_completions::ChatMessage;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyRequest
{   pub provider: String
  , pub model: String
  , pub messages: Vec<ChatMessage>
  , pub temperature: f32
  , pub top_p: f32
  , pub max_tokens: u32
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProxyResponse
{   #[serde(default)]
    pub content: Option<String>
  , #[serde(default)]
    pub model: Option<String>
  , #[serde(default)]
    pub provider: Option<String>
}

pub fn request_body(
  spec: &ProviderSpec
, upstream: &str
, request: &CanonicalRequest
) -> Result<serde_json::Value>
{   let body = ProxyRequest
    {   provider: upstream.to_string()
      , model: spec.model.clone()
      , messages: request.messages
          .iter()
          .map(|m| ChatMessage
          {   role: m.role.as_str().to_string()
            , content: m.content.clone()
          })
          .collect()
      , temperature: request.temperature
      , top_p: request.top_p
      , max_tokens: request.max_tokens
    };
    serde_json::to_value(&body).map_err(|e| Error::Other(e.to_string()))
}

pub fn extract_content(body: &str) -> std::result::Result<String, String>
{   let response: ProxyResponse = serde_json::from_str(body)
      .map_err(|e| format!("malformed response body: {}", e))?;
    response.content
      .filter(|text| !text.trim().is_empty())
      .ok_or_else(|| "proxy response has no content".to_string())
}
