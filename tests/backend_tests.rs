mod common;

use std::time::Duration;

use chorus::{CanonicalRequest, Error, FailoverBackend};
use common::*;
use tokio_util::sync::CancellationToken;

fn backend(transport: &std::sync::Arc<ScriptedTransport>, names: &[&str])
  -> FailoverBackend
{   FailoverBackend::new(client_with(transport), chain_of(names))
}

#[tokio::test]
async fn execute_replies_through_channel()
{   let transport = ScriptedTransport::new();
    transport.script(&url_for("a"), Scripted::Reply(500, "down".into()));
    transport.script(&url_for("b"), ok("Shalom"));
    let backend = backend(&transport, &["a", "b"]);

    let mut rx = backend
      .execute(CanonicalRequest::from_prompt("greet me"), "backend-exec")
      .await
      .unwrap();
    let response = rx.recv().await.unwrap().unwrap();

    assert_eq!(response.content, "Shalom");
    assert_eq!(response.provider, "b");
    backend.shutdown().await.unwrap();
}

#[tokio::test]
async fn get_chain_reports_priority_order()
{   let transport = ScriptedTransport::new();
    let backend = backend(&transport, &["first", "second", "third"]);

    let mut rx = backend.get_chain().await.unwrap();
    assert_eq!(
      rx.recv().await.unwrap().unwrap()
    , vec!["first", "second", "third"]
    );
    backend.shutdown().await.unwrap();
}

#[tokio::test]
async fn execute_json_returns_parsed_value()
{   let transport = ScriptedTransport::new();
    transport.script(&url_for("a"), ok("```json\n{\"score\": 88}\n```"));
    let backend = backend(&transport, &["a"]);

    let mut rx = backend
      .execute_json(CanonicalRequest::from_prompt("score"), "backend-json")
      .await
      .unwrap();
    let value = rx.recv().await.unwrap().unwrap();

    assert_eq!(value["score"], 88);
    backend.shutdown().await.unwrap();
}

#[tokio::test]
async fn one_backend_serves_requests_concurrently()
{   let transport = ScriptedTransport::new();
    transport.script(
      &url_for("a")
    , Scripted::HangWhen("stall here".into(), Box::new(ok("fast answer")))
    );
    let backend = backend(&transport, &["a"]);

    let cancel = CancellationToken::new();
    let mut slow_rx = backend
      .execute_cancellable(
        CanonicalRequest::from_prompt("stall here")
      , "slow"
      , cancel.clone()
      )
      .await
      .unwrap();
    while transport.calls().is_empty()
    {   tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let mut fast_rx = backend
      .execute(CanonicalRequest::from_prompt("go"), "fast")
      .await
      .unwrap();
    let answer = tokio::time::timeout(Duration::from_secs(2), fast_rx.recv())
      .await
      .unwrap()
      .unwrap()
      .unwrap();
    assert_eq!(answer.content, "fast answer");
    assert_eq!(transport.calls().len(), 2);

    cancel.cancel();
    let outcome = tokio::time::timeout(Duration::from_secs(2), slow_rx.recv())
      .await
      .unwrap()
      .unwrap();
    assert_eq!(outcome, Err(Error::Cancelled));

    backend.shutdown().await.unwrap();
}

#[tokio::test]
async fn json_request_can_be_cancelled_by_caller()
{   let transport = ScriptedTransport::new();
    transport.script(&url_for("hung"), Scripted::Hang);
    transport.script(&url_for("next"), ok("{\"never\": true}"));
    let backend = backend(&transport, &["hung", "next"]);

    let cancel = CancellationToken::new();
    let mut rx = backend
      .execute_json_cancellable(
        CanonicalRequest::from_prompt("score")
      , "json-cancel"
      , cancel.clone()
      )
      .await
      .unwrap();
    while transport.calls().is_empty()
    {   tokio::time::sleep(Duration::from_millis(5)).await;
    }
    cancel.cancel();

    let outcome = tokio::time::timeout(Duration::from_secs(2), rx.recv())
      .await
      .unwrap()
      .unwrap();
    assert_eq!(outcome, Err(Error::Cancelled));
    assert_eq!(transport.called_urls(), vec![url_for("hung")]);
    backend.shutdown().await.unwrap();
}

#[tokio::test]
async fn shutdown_cancels_in_flight_requests()
{   let transport = ScriptedTransport::new();
    transport.script(&url_for("hung"), Scripted::Hang);
    let backend = backend(&transport, &["hung"]);

    let mut rx = backend
      .execute(CanonicalRequest::from_prompt("wait"), "in-flight")
      .await
      .unwrap();

    // let the request reach the transport first
    while transport.calls().is_empty()
    {   tokio::time::sleep(Duration::from_millis(5)).await;
    }
    backend.shutdown().await.unwrap();

    let outcome = tokio::time::timeout(Duration::from_secs(2), rx.recv())
      .await
      .unwrap()
      .unwrap();
    assert_eq!(outcome, Err(Error::Cancelled));
}

#[tokio::test]
async fn invalid_request_is_reported_not_dropped()
{   let transport = ScriptedTransport::new();
    let backend = backend(&transport, &["a"]);

    let mut rx = backend
      .execute(CanonicalRequest::new(vec![]), "invalid")
      .await
      .unwrap();
    let outcome = rx.recv().await.unwrap();

    assert!(matches!(outcome, Err(Error::InvalidRequest(_))));
    assert!(transport.calls().is_empty());
    backend.shutdown().await.unwrap();
}
