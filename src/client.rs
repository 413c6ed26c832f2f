use std::sync::Arc;

use log::{debug, error, info};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::{ClientConfig, FailoverChain};
use crate::failover::FailoverClient;
use crate::request::CanonicalRequest;
use crate::ChorusFoot;

/// Public API for the chorus backend - owns the task
pub struct FailoverBackend
{   hand: crate::ChorusHand
  , shutdown: CancellationToken
  , _task_handle: tokio::task::JoinHandle<()>
}

impl FailoverBackend
{   /// Create and spawn a new backend serving `chain`.
    /// Returns immediately - spawns background task
    pub fn new(client: FailoverClient, chain: FailoverChain) -> Self
    {   debug!("Creating FailoverBackend with task ownership");

        let (execute_tx, execute_rx)
          = mpsc::unbounded_channel();
        let (execute_json_tx, execute_json_rx)
          = mpsc::unbounded_channel();
        let (get_chain_tx, get_chain_rx)
          = mpsc::unbounded_channel();
        let (kill_process_tx, kill_process_rx)
          = mpsc::unbounded_channel();

        let hand = crate::ChorusHand
        {   execute_tx
          , execute_json_tx
          , get_chain_tx
          , kill_process_tx
        };

        let foot = crate::ChorusFoot
        {   execute_rx
          , execute_json_rx
          , get_chain_rx
          , kill_process_rx
        };

        let shutdown = CancellationToken::new();
        let loop_shutdown = shutdown.clone();
        let _task_handle = tokio::spawn(async move {
          run_backend_loop(foot, client, chain, loop_shutdown).await
        });

        FailoverBackend
        {   hand
          , shutdown
          , _task_handle
        }
    }

    /// HTTP-backed backend built from configuration
    pub fn from_config(
      config: &ClientConfig
    ) -> Result<Self, crate::error::Error>
    {   let client = FailoverClient::from_config(config)?;
        let chain = config.chain()?;
        Ok(Self::new(client, chain))
    }

    /// Queue a request - returns almost immediately
    pub async fn execute(
      &self
    , request: CanonicalRequest
    , context: impl Into<String>
    ) -> Result<
        mpsc::UnboundedReceiver<crate::ExecuteReply>,
        crate::error::Error
      >
    {   self.execute_cancellable(
          request
        , context
        , CancellationToken::new()
        ).await
    }

    /// Queue a request the caller can abort through `cancel`
    pub async fn execute_cancellable(
      &self
    , request: CanonicalRequest
    , context: impl Into<String>
    , cancel: CancellationToken
    ) -> Result<
        mpsc::UnboundedReceiver<crate::ExecuteReply>,
        crate::error::Error
      >
    {   let context = context.into();
        debug!("execute queuing command: {}", context);
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        let cmd = crate::ExecuteArgs
        {   request
          , context
          , cancel
          , reply: reply_tx
        };

        self.hand.execute_tx
          .send(cmd)
          .map_err(|_| disconnected())?;

        Ok(reply_rx)
    }

    /// Queue a JSON request - returns almost immediately
    pub async fn execute_json(
      &self
    , request: CanonicalRequest
    , context: impl Into<String>
    ) -> Result<
        mpsc::UnboundedReceiver<crate::ExecuteJsonReply>,
        crate::error::Error
      >
    {   self.execute_json_cancellable(
          request
        , context
        , CancellationToken::new()
        ).await
    }

    /// Queue a JSON request the caller can abort through `cancel`
    pub async fn execute_json_cancellable(
      &self
    , request: CanonicalRequest
    , context: impl Into<String>
    , cancel: CancellationToken
    ) -> Result<
        mpsc::UnboundedReceiver<crate::ExecuteJsonReply>,
        crate::error::Error
      >
    {   let context = context.into();
        debug!("execute_json queuing command: {}", context);
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        let cmd = crate::ExecuteJsonArgs
        {   request
          , context
          , cancel
          , reply: reply_tx
        };

        self.hand.execute_json_tx
          .send(cmd)
          .map_err(|_| disconnected())?;

        Ok(reply_rx)
    }

    /// Provider names in priority order - returns almost immediately
    pub async fn get_chain(
      &self
    ) -> Result<
        mpsc::UnboundedReceiver<crate::GetChainReply>,
        crate::error::Error
      >
    {   debug!("get_chain queuing command");
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        self.hand.get_chain_tx
          .send(crate::GetChainArgs { reply: reply_tx })
          .map_err(|_| disconnected())?;

        Ok(reply_rx)
    }

    /// Gracefully shutdown the backend, cancelling in-flight requests
    pub async fn shutdown(self)
      -> Result<(), crate::error::Error>
    {   debug!("Shutting down FailoverBackend");
        let (reply_tx, mut reply_rx)
          = mpsc::unbounded_channel();

        self.hand.kill_process_tx
          .send(crate::KillProcessArgs { reply: reply_tx })
          .map_err(|_| {
            error!("Backend channel already closed");
            self.shutdown.cancel();
            crate::error::Error::Other(
              "Backend already shutdown".to_string()
            )
          })?;

        // Wait for shutdown confirmation
        if let Some(result) = reply_rx.recv().await
        {   debug!("Backend shutdown confirmed");
            result
        } else
        {   error!("Backend exited without confirming shutdown");
            Err(crate::error::Error::Other(
              "Backend disconnected".to_string()
            ))
        }
    }
}

fn disconnected() -> crate::error::Error
{   error!("Backend channel closed");
    crate::error::Error::Other("Backend disconnected".to_string())
}

/// Cancelled when either the caller or the backend gives up
fn request_token(
  shutdown: &CancellationToken
, caller: CancellationToken
) -> CancellationToken
{   let token = shutdown.child_token();
    let linked = token.clone();
    tokio::spawn(async move {
      tokio::select!
      {   _ = caller.cancelled() => linked.cancel()
        , _ = linked.cancelled() => {}
      }
    });
    token
}

/// Main backend event loop
///
/// tokio::select! is ONLY for fast queueing. Every request is spawned onto
/// its own task, so concurrent requests never wait on each other and share
/// nothing but the immutable chain.
async fn run_backend_loop(
  foot: crate::ChorusFoot
, client: FailoverClient
, chain: FailoverChain
, shutdown: CancellationToken
)
{   debug!("Starting FailoverBackend event loop");
    let chain = Arc::new(chain);
    let ChorusFoot
    {   mut execute_rx
      , mut execute_json_rx
      , mut get_chain_rx
      , mut kill_process_rx
    } = foot;

    loop
    { tokio::select!
      { Some(cmd) = execute_rx.recv() => {
          debug!("Received Execute: {}", cmd.context);
          let crate::ExecuteArgs { request, context, cancel, reply } = cmd;
          let client = client.clone();
          let chain = Arc::clone(&chain);
          let cancel = request_token(&shutdown, cancel);
          tokio::spawn(async move {
            let result = client
              .execute_with_cancel(&request, &chain, &context, &cancel)
              .await;
            cancel.cancel();
            let _ = reply.send(result);
          });
        }
      , Some(cmd) = execute_json_rx.recv() => {
          debug!("Received ExecuteJson: {}", cmd.context);
          let crate::ExecuteJsonArgs { request, context, cancel, reply }
            = cmd;
          let client = client.clone();
          let chain = Arc::clone(&chain);
          let cancel = request_token(&shutdown, cancel);
          tokio::spawn(async move {
            let result = client
              .execute_json_with::<serde_json::Value, _>(
                &request
              , &chain
              , &context
              , &cancel
              , |_| Ok(())
              )
              .await;
            cancel.cancel();
            let _ = reply.send(result);
          });
        }
      , Some(cmd) = get_chain_rx.recv() => {
          debug!("Received GetChain");
          let _ = cmd.reply.send(Ok(chain.names()));
        }
      , Some(cmd) = kill_process_rx.recv() => {
          debug!("Received KillProcess");
          shutdown.cancel();
          let _ = cmd.reply.send(Ok(()));
          info!("FailoverBackend shutting down");
          break;
        }
      , else => {
          debug!("All command channels closed");
          shutdown.cancel();
          break;
        }
      }
    }
}
