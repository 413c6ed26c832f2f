pub mod error;
pub mod config;
pub mod content;
pub mod request;
pub mod transport;
pub mod providers;
pub mod failover;
pub mod client;
pub mod services;

pub use client::FailoverBackend;
pub use config::{Auth, ClientConfig, FailoverChain, ProviderSpec, RequestShape};
pub use error::Error;
pub use failover::FailoverClient;
pub use request::{
  AttemptOutcome, CanonicalRequest, CanonicalResponse, ChatMessage, Role
};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};

use tokio_util::sync::CancellationToken;

/*

chorus: one async client in front of several hosted LLM APIs, with an
ordered failover chain so a request only reaches the next provider when
the previous one has definitively failed.

chorus/
├── Cargo.toml
├── src/
│   ├── lib.rs          # Re-exports and the backend command types
│   ├── error.rs        # Error taxonomy
│   ├── config.rs       # Provider specs, chains, env/JSON loading
│   ├── request.rs      # Canonical request/response types
│   ├── content.rs      # Markdown fence stripping, JSON content parsing
│   ├── transport.rs    # HTTP seam (reqwest)
│   ├── providers/      # Wire shapes per provider family
│   ├── failover.rs     # The ordered failover executor
│   ├── client.rs       # Backend task fed over channels
│   ├── services/       # Feature prompts on top of the executor
│   └── bin/chorus.rs   # Command line front end
└── tests/

*/

/// CHORUS BACKEND INTERFACE:

// ===== Execute =====

pub type ExecuteReply = Result<CanonicalResponse, crate::error::Error>;
pub type ExecuteReplySender
  = tokio::sync::mpsc::UnboundedSender<ExecuteReply>;

pub struct ExecuteArgs
{   pub request: CanonicalRequest
  , pub context: String
  , pub cancel: CancellationToken
  , pub reply: ExecuteReplySender
}

// ===== ExecuteJson =====

pub type ExecuteJsonReply
  = Result<serde_json::Value, crate::error::Error>;
pub type ExecuteJsonReplySender
  = tokio::sync::mpsc::UnboundedSender<ExecuteJsonReply>;

pub struct ExecuteJsonArgs
{   pub request: CanonicalRequest
  , pub context: String
  , pub cancel: CancellationToken
  , pub reply: ExecuteJsonReplySender
}

// ===== GetChain =====

pub type GetChainReply = Result<Vec<String>, crate::error::Error>;
pub type GetChainReplySender
  = tokio::sync::mpsc::UnboundedSender<GetChainReply>;

pub struct GetChainArgs
{   pub reply: GetChainReplySender
}

// ===== KillProcess =====

pub type KillProcessReply = Result<(), crate::error::Error>;
pub type KillProcessReplySender
  = tokio::sync::mpsc::UnboundedSender<KillProcessReply>;

pub struct KillProcessArgs
{   pub reply: KillProcessReplySender
}

// ===== ChorusHand (sender side) =====

pub struct ChorusHand
{   pub execute_tx
      : tokio::sync::mpsc::UnboundedSender<ExecuteArgs>
  , pub execute_json_tx
      : tokio::sync::mpsc::UnboundedSender<ExecuteJsonArgs>
  , pub get_chain_tx
      : tokio::sync::mpsc::UnboundedSender<GetChainArgs>
  , pub kill_process_tx
      : tokio::sync::mpsc::UnboundedSender<KillProcessArgs>
}

// ===== ChorusFoot (receiver side) =====

pub struct ChorusFoot
{   pub execute_rx
      : tokio::sync::mpsc::UnboundedReceiver<ExecuteArgs>
  , pub execute_json_rx
      : tokio::sync::mpsc::UnboundedReceiver<ExecuteJsonArgs>
  , pub get_chain_rx
      : tokio::sync::mpsc::UnboundedReceiver<GetChainArgs>
  , pub kill_process_rx
      : tokio::sync::mpsc::UnboundedReceiver<KillProcessArgs>
}
