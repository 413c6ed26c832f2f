//! Canonical request and response types for chorus

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_TOP_P: f32 = 0.9;
pub const DEFAULT_MAX_TOKENS: u32 = 2000;

/// Speaker of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role
{   System
  , User
  , Assistant
}

impl Role
{   pub fn as_str(&self) -> &'static str
    {   match self
        {   Role::System => "system"
          , Role::User => "user"
          , Role::Assistant => "assistant"
        }
    }
}

/// One message of a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage
{   pub role: Role
  , pub content: String
}

impl ChatMessage
{   pub fn system(content: impl Into<String>) -> Self
    {   ChatMessage { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self
    {   ChatMessage { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self
    {   ChatMessage { role: Role::Assistant, content: content.into() }
    }
}

/// Provider-agnostic request.
/// Built fresh for every user action and never mutated by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRequest
{   /// Ordered conversation, oldest first
    pub messages: Vec<ChatMessage>
  , /// Sampling temperature, 0.0 to 1.0
    pub temperature: f32
  , /// Nucleus sampling bound, 0.0 to 1.0
    pub top_p: f32
  , /// Upper bound on generated tokens
    pub max_tokens: u32
}

impl CanonicalRequest
{   /// Request with the default generation parameters
    pub fn new(messages: Vec<ChatMessage>) -> Self
    {   CanonicalRequest
        {   messages
          , temperature: DEFAULT_TEMPERATURE
          , top_p: DEFAULT_TOP_P
          , max_tokens: DEFAULT_MAX_TOKENS
        }
    }

    /// Single user message
    pub fn from_prompt(prompt: impl Into<String>) -> Self
    {   Self::new(vec![ChatMessage::user(prompt)])
    }

    /// System instruction followed by one user message
    pub fn with_system(
      system: impl Into<String>
    , prompt: impl Into<String>
    ) -> Self
    {   Self::new(vec![
          ChatMessage::system(system)
        , ChatMessage::user(prompt)
        ])
    }

    pub fn temperature(mut self, temperature: f32) -> Self
    {   self.temperature = temperature;
        self
    }

    pub fn top_p(mut self, top_p: f32) -> Self
    {   self.top_p = top_p;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self
    {   self.max_tokens = max_tokens;
        self
    }

    /// Reject requests that no provider should ever see
    pub fn validate(&self) -> Result<()>
    {   if self.messages.is_empty()
        {   return Err(Error::InvalidRequest(
              "messages must not be empty".to_string()
            ));
        }
        if !(0.0..=1.0).contains(&self.temperature)
        {   return Err(Error::InvalidRequest(format!(
              "temperature {} outside 0.0..=1.0"
            , self.temperature
            )));
        }
        if !(0.0..=1.0).contains(&self.top_p)
        {   return Err(Error::InvalidRequest(format!(
              "top_p {} outside 0.0..=1.0"
            , self.top_p
            )));
        }
        if self.max_tokens == 0
        {   return Err(Error::InvalidRequest(
              "max_tokens must be greater than zero".to_string()
            ));
        }
        Ok(())
    }
}

/// Normalized provider response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalResponse
{   /// Generated text
    pub content: String
  , /// Display name of the provider that answered
    pub provider: String
  , /// Model that generated it
    pub model: String
}

/// Diagnostic record of one provider attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptOutcome
{   pub provider: String
  , pub succeeded: bool
  , pub error: Option<String>
}

impl AttemptOutcome
{   pub fn success(provider: &str) -> Self
    {   AttemptOutcome
        {   provider: provider.to_string()
          , succeeded: true
          , error: None
        }
    }

    pub fn failure(provider: &str, error: &Error) -> Self
    {   AttemptOutcome
        {   provider: provider.to_string()
          , succeeded: false
          , error: Some(error.to_string())
        }
    }
}
