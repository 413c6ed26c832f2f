//! Provider families: request shaping and response normalization

pub mod chat_completions;
pub mod chat_proxy;
pub mod generative_content;

use serde::Deserialize;

use crate::config::{Auth, ProviderSpec, RequestShape};
use crate::content::preview;
use crate::error::{Error, Result};
use crate::request::CanonicalRequest;
use crate::transport::{HttpRequest, HttpResponse};

/// Translate a canonical request into `spec`'s wire format.
/// `json` asks the provider for JSON output where it supports that.
pub fn prepare(
  spec: &ProviderSpec
, request: &CanonicalRequest
, json: bool
) -> Result<HttpRequest>
{   let (headers, query) = credentials(spec)?;
    let (url, body) = match &spec.shape
    {   RequestShape::ChatCompletions => (
          spec.endpoint.clone()
        , chat_completions::request_body(spec, request, json)?
        )
      , RequestShape::GenerativeContent => (
          generative_content::url(spec)
        , generative_content::request_body(request, json)?
        )
      , RequestShape::ChatProxy { upstream } => (
          spec.endpoint.clone()
        , chat_proxy::request_body(spec, upstream, request)?
        )
    };
    Ok(HttpRequest { url, headers, query, body })
}

/// Turn a raw response into generated text, or the reason it is unusable
pub fn normalize(
  spec: &ProviderSpec
, response: &HttpResponse
) -> Result<String>
{   if !response.is_success()
    {   return Err(status_error(spec, response));
    }
    let content = match spec.shape
    {   RequestShape::ChatCompletions => {
          chat_completions::extract_content(&response.body)
        }
      , RequestShape::GenerativeContent => {
          generative_content::extract_content(&response.body)
        }
      , RequestShape::ChatProxy { .. } => {
          chat_proxy::extract_content(&response.body)
        }
    };
    content.map_err(|message| Error::ProviderResponseShape
    {   provider: spec.name.clone()
      , message
    })
}

fn credentials(spec: &ProviderSpec)
  -> Result<(Vec<(String, String)>, Vec<(String, String)>)>
{   let key = || {
      spec.api_key
        .clone()
        .ok_or_else(|| Error::MissingApiKey(spec.name.clone()))
    };
    match spec.auth
    {   Auth::Bearer => Ok((
          vec![(
            "Authorization".to_string()
          , format!("Bearer {}", key()?)
          )]
        , vec![]
        ))
      , Auth::QueryKey => Ok((
          vec![]
        , vec![("key".to_string(), key()?)]
        ))
      , Auth::None => Ok((vec![], vec![]))
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope
{   error: ErrorBody
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorBody
{   Detailed
    {   message: String
    }
  , Plain(String)
}

fn status_error(spec: &ProviderSpec, response: &HttpResponse) -> Error
{   let message = match serde_json::from_str::<ErrorEnvelope>(&response.body)
    {   Ok(ErrorEnvelope { error: ErrorBody::Detailed { message } })
        | Ok(ErrorEnvelope { error: ErrorBody::Plain(message) }) => message
      , Err(_) if response.body.trim().is_empty() => {
          "empty error body".to_string()
        }
      , Err(_) => preview(response.body.trim(), 200)
    };
    Error::ProviderTransport
    {   provider: spec.name.clone()
      , status: Some(response.status)
      , message
    }
}

#[cfg(test)]
mod tests
{   use super::*;

    fn spec(auth: Auth, key: Option<&str>) -> ProviderSpec
    {   ProviderSpec::new(
          "A"
        , "https://a.test/v1/chat/completions"
        , "m"
        , RequestShape::ChatCompletions
        , auth
        , key.map(str::to_string)
        )
    }

    #[test]
    fn bearer_header_injected()
    {   let prepared = prepare(
          &spec(Auth::Bearer, Some("k1"))
        , &CanonicalRequest::from_prompt("hi")
        , false
        ).unwrap();
        assert_eq!(
          prepared.headers
        , vec![("Authorization".to_string(), "Bearer k1".to_string())]
        );
        assert!(prepared.query.is_empty());
    }

    #[test]
    fn missing_key_fails_the_attempt()
    {   let err = prepare(
          &spec(Auth::Bearer, None)
        , &CanonicalRequest::from_prompt("hi")
        , false
        ).unwrap_err();
        assert_eq!(err, Error::MissingApiKey("A".to_string()));
        assert!(err.is_provider_failure());
    }

    #[test]
    fn status_error_prefers_provider_message()
    {   let response = HttpResponse
        {   status: 429
          , body: r#"{"error":{"message":"Rate limit reached"}}"#.to_string()
        };
        let err = normalize(&spec(Auth::None, None), &response).unwrap_err();
        assert_eq!(err, Error::ProviderTransport
        {   provider: "A".to_string()
          , status: Some(429)
          , message: "Rate limit reached".to_string()
        });
    }

    #[test]
    fn status_error_with_text_body()
    {   let response = HttpResponse
        {   status: 500
          , body: "upstream exploded".to_string()
        };
        let err = normalize(&spec(Auth::None, None), &response).unwrap_err();
        assert!(err.to_string().contains("HTTP 500"));
        assert!(err.to_string().contains("upstream exploded"));
    }
}
