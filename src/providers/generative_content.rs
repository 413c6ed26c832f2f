//! Gemini-family `generateContent`

use serde::{Deserialize, Serialize};

use crate::config::ProviderSpec;
use crate::error::{Error, Result};
use crate::request::{CanonicalRequest, Role};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part
{   #[serde(default)]
    pub text: Option<String>
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content
{   #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>
  , #[serde(default)]
    pub parts: Vec<Part>
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig
{   pub temperature: f32
  , pub top_p: f32
  , pub max_output_tokens: u32
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest
{   pub contents: Vec<Content>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>
  , pub generation_config: GenerationConfig
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateContentResponse
{   #[serde(default)]
    pub candidates: Vec<Candidate>
}

#[derive(Debug, Clone, Deserialize)]
pub struct Candidate
{   pub content: Option<Content>
}

pub fn url(spec: &ProviderSpec) -> String
{   format!(
      "{}/models/{}:generateContent"
    , spec.endpoint.trim_end_matches('/')
    , spec.model
    )
}

/// System messages become `systemInstruction`; assistant turns are `model`
pub fn request_body(
  request: &CanonicalRequest
, json: bool
) -> Result<serde_json::Value>
{   let system: Vec<&str> = request.messages
      .iter()
      .filter(|m| m.role == Role::System)
      .map(|m| m.content.as_str())
      .collect();

    let contents = request.messages
      .iter()
      .filter(|m| m.role != Role::System)
      .map(|m| Content
      {   role: Some(match m.role
          {   Role::Assistant => "model".to_string()
            , _ => "user".to_string()
          })
        , parts: vec![Part { text: Some(m.content.clone()) }]
      })
      .collect();

    let body = GenerateContentRequest
    {   contents
      , system_instruction: (!system.is_empty()).then(|| Content
        {   role: None
          , parts: vec![Part { text: Some(system.join("\n\n")) }]
        })
      , generation_config: GenerationConfig
        {   temperature: request.temperature
          , top_p: request.top_p
          , max_output_tokens: request.max_tokens
          , response_mime_type: json.then(|| {
              "application/json".to_string()
            })
        }
    };
    serde_json::to_value(&body).map_err(|e| Error::Other(e.to_string()))
}

/// Concatenated `candidates[0].content.parts[].text`
pub fn extract_content(body: &str) -> std::result::Result<String, String>
{   let response: GenerateContentResponse = serde_json::from_str(body)
      .map_err(|e| format!("malformed response body: {}", e))?;

    let parts = response.candidates
      .into_iter()
      .next()
      .and_then(|c| c.content)
      .map(|c| c.parts)
      .ok_or_else(|| "no candidates[0].content.parts".to_string())?;

    let text: String = parts
      .into_iter()
      .filter_map(|p| p.text)
      .collect();

    if text.trim().is_empty()
    {   return Err("candidate parts contained no text".to_string());
    }
    Ok(text)
}
