mod common;

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;

use common::RecordingTransport;
use neoapi::{
    instrument, instrument_result, track_future, Client, ClientConfig, Endpoint, TrackOptions,
};

fn client() -> (Client, Arc<RecordingTransport>) {
    let transport = Arc::new(RecordingTransport::new());
    let config = ClientConfig::default().with_api_key("test-key");
    let client = Client::with_transport(config, transport.clone()).expect("client should build");
    (client, transport)
}

#[tokio::test]
async fn instrumented_function_tracks_each_return_value() {
    let (client, transport) = client();
    let shout = instrument(
        client.clone(),
        TrackOptions::default().project("pipeline"),
        |text: &str| text.to_uppercase(),
    );

    assert_eq!(shout("hello"), "HELLO");
    assert_eq!(shout("again"), "AGAIN");
    client.shutdown().await.unwrap();

    assert_eq!(transport.texts(), vec!["HELLO", "AGAIN"]);
    let (endpoint, event) = &transport.received()[0];
    assert_eq!(*endpoint, Endpoint::Save);
    assert_eq!(event.project.as_deref(), Some("pipeline"));
    assert_eq!(event.group.as_deref(), Some("default_group"));
}

#[tokio::test]
async fn fallible_function_tracks_only_successes() {
    let (client, transport) = client();
    let parse = instrument_result(
        client.clone(),
        TrackOptions::default(),
        |raw: &str| raw.parse::<u32>().map_err(|e| e.to_string()),
    );

    assert_eq!(parse("42"), Ok(42));
    assert!(parse("not a number").is_err());
    client.shutdown().await.unwrap();

    assert_eq!(transport.texts(), vec!["42"]);
}

#[tokio::test]
async fn awaited_future_output_is_tracked_with_analysis_flags() {
    let (client, transport) = client();
    let options = TrackOptions::default().group("chat").analyze(true);

    let answer = track_future(&client, &options, async { json!({ "answer": "yes" }) }).await;
    assert_eq!(answer, json!({ "answer": "yes" }));
    client.shutdown().await.unwrap();

    let received = transport.received();
    assert_eq!(received.len(), 1);
    let (endpoint, event) = &received[0];
    assert_eq!(*endpoint, Endpoint::Analyze);
    assert_eq!(event.text, r#"{"answer":"yes"}"#);
    assert_eq!(event.group.as_deref(), Some("chat"));
    assert_eq!(event.response, Some(json!({ "answer": "yes" })));
}
