#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chorus::{
  Auth, FailoverChain, FailoverClient, HttpRequest, HttpResponse
, ProviderSpec, RequestShape, Transport
};

/// What a scripted endpoint does when called
#[derive(Debug, Clone)]
pub enum Scripted
{   Reply(u16, String)
  , NetworkError(String)
  , Hang
  , /// Hang when the request body mentions the marker, otherwise behave as
    /// the inner script
    HangWhen(String, Box<Scripted>)
}

/// In-memory transport keyed by URL; records every call in order
#[derive(Default)]
pub struct ScriptedTransport
{   scripts: Mutex<HashMap<String, Scripted>>
  , calls: Mutex<Vec<HttpRequest>>
}

impl ScriptedTransport
{   pub fn new() -> Arc<Self>
    {   Arc::new(ScriptedTransport::default())
    }

    pub fn script(&self, url: &str, behaviour: Scripted)
    {   self.scripts
          .lock()
          .unwrap()
          .insert(url.to_string(), behaviour);
    }

    pub fn calls(&self) -> Vec<HttpRequest>
    {   self.calls.lock().unwrap().clone()
    }

    pub fn called_urls(&self) -> Vec<String>
    {   self.calls().into_iter().map(|c| c.url).collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport
{   async fn post(
      &self
    , request: &HttpRequest
    ) -> Result<HttpResponse, String>
    {   self.calls.lock().unwrap().push(request.clone());
        let mut behaviour = self.scripts
          .lock()
          .unwrap()
          .get(&request.url)
          .cloned()
          .unwrap_or_else(|| Scripted::Reply(404, "no script".to_string()));

        while let Scripted::HangWhen(marker, otherwise) = behaviour
        {   behaviour = if request.body.to_string().contains(&marker)
            {   Scripted::Hang
            } else
            {   *otherwise
            };
        }

        match behaviour
        {   Scripted::Reply(status, body) => {
              Ok(HttpResponse { status, body })
            }
          , Scripted::NetworkError(message) => Err(message)
          , Scripted::Hang | Scripted::HangWhen(..) => {
              std::future::pending::<Result<HttpResponse, String>>().await
            }
        }
    }
}

pub fn url_for(name: &str) -> String
{   format!("https://{}.test/v1/chat/completions", name)
}

/// Chat-completions provider without credentials
pub fn provider(name: &str) -> ProviderSpec
{   ProviderSpec::new(
      name
    , url_for(name)
    , format!("{}-model", name)
    , RequestShape::ChatCompletions
    , Auth::None
    , None
    )
}

pub fn chain_of(names: &[&str]) -> FailoverChain
{   FailoverChain::new(names.iter().map(|n| provider(n)).collect())
      .unwrap()
}

pub fn client_with(transport: &Arc<ScriptedTransport>) -> FailoverClient
{   FailoverClient::new(transport.clone(), Duration::from_secs(5))
}

/// OpenAI-style success body
pub fn choices_body(content: &str) -> String
{   serde_json::json!({
      "choices": [{
        "message": { "role": "assistant", "content": content }
      , "finish_reason": "stop"
      }]
    }).to_string()
}

pub fn ok(content: &str) -> Scripted
{   Scripted::Reply(200, choices_body(content))
}
