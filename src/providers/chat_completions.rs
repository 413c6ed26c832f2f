//! OpenAI-compatible `chat/completions` (OpenAI, Ollama Cloud)

use serde::{Deserialize, Serialize};

use crate::config::ProviderSpec;
use crate::error::{Error, Result};
use crate::request::CanonicalRequest;

// ===== Message Types =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage
{   pub role: String
  , pub content: String
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseFormat
{   #[serde(rename = "type")]
    pub kind: String
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest
{   pub model: String
  , pub messages: Vec<ChatMessage>
  , pub temperature: f32
  , pub top_p: f32
  , pub max_tokens: u32
  , pub stream: bool
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse
{   #[serde(default)]
    pub choices: Vec<Choice>
  , /// Proxies that already normalized the reply
    #[serde(default)]
    pub content: Option<String>
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice
{   pub message: ChoiceMessage
  , pub finish_reason: Option<String>
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage
{   #[serde(default)]
    pub content: Option<String>
}

pub fn request_body(
  spec: &ProviderSpec
, request: &CanonicalRequest
, json: bool
) -> Result<serde_json::Value>
{   let body = ChatRequest
    {   model: spec.model.clone()
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
      , stream: false
      , response_format: json.then(|| ResponseFormat
        {   kind: "json_object".to_string()
        })
    };
    serde_json::to_value(&body).map_err(|e| Error::Other(e.to_string()))
}

/// `choices[0].message.content`, else a top-level `content`
pub fn extract_content(body: &str) -> std::result::Result<String, String>
{   let response: ChatResponse = serde_json::from_str(body)
      .map_err(|e| format!("malformed response body: {}", e))?;

    let from_choices = response.choices
      .into_iter()
      .next()
      .and_then(|c| c.message.content);

    from_choices
      .or(response.content)
      .filter(|text| !text.trim().is_empty())
      .ok_or_else(|| "no content in choices[0].message".to_string())
}
