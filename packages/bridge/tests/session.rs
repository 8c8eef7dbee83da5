//! Session lifecycle against a scripted in-memory server.

use serde_json::json;
use std::time::Duration;
use tokio::io::{duplex, split, AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::sync::mpsc;
use windlint_bridge::protocol::{
    decode, encode, methods, FrameDecoder, Message, MessageKind, RequestId,
};
use windlint_bridge::{
    bridge_suggestions, suggest_with_bridge, suggestions_from_diagnostics, BridgeConfig,
    BridgeError, BridgeResult, BridgeState, DiagnosticsBridge,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Behavior {
    /// Push diagnostics for every opened document.
    Publish,
    /// Answer the handshake, never push diagnostics.
    Silent,
    /// Ask for workspace configuration after the handshake.
    AskConfiguration,
    /// Close the connection right after the handshake.
    HangUp,
    /// Never answer anything.
    Mute,
}

async fn fake_server(stream: DuplexStream, behavior: Behavior, events: mpsc::UnboundedSender<String>) {
    let (mut reader, mut writer) = split(stream);
    let mut decoder = FrameDecoder::new();
    let mut chunk = [0u8; 512];

    loop {
        let read = match reader.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(read) => read,
        };
        decoder.push(&chunk[..read]);

        while let Some(frame) = decoder.next_frame() {
            let message = decode(&frame).unwrap();
            let mut replies = Vec::new();

            if message.kind() == MessageKind::Response {
                let _ = events.send(format!("response:{}", message.result.unwrap_or_default()));
                continue;
            }

            let method = message.method.clone().unwrap_or_default();
            let _ = events.send(method.clone());
            match method.as_str() {
                methods::INITIALIZE if behavior != Behavior::Mute => {
                    replies.push(Message::response(message.id.clone().unwrap(), json!({ "capabilities": {} })));
                }
                methods::INITIALIZED if behavior == Behavior::AskConfiguration => {
                    replies.push(Message::request(
                        RequestId::Number(99),
                        methods::WORKSPACE_CONFIGURATION,
                        json!({ "items": [{ "section": "tailwindCSS" }] }),
                    ));
                }
                methods::INITIALIZED if behavior == Behavior::HangUp => return,
                methods::DID_OPEN if behavior == Behavior::Publish => {
                    let uri = message.params.as_ref().unwrap()["textDocument"]["uri"].clone();
                    replies.push(Message::notification(
                        methods::PUBLISH_DIAGNOSTICS,
                        json!({
                            "uri": uri,
                            "diagnostics": [
                                { "code": "cssConflict", "message": "`mt-4` applies the same CSS as `mt-6`" },
                                { "code": "suggestCanonicalClasses", "message": "The class `flex-grow` can be written as `grow`" }
                            ]
                        }),
                    ));
                }
                _ => {}
            }

            for reply in replies {
                if writer.write_all(&encode(&reply).unwrap()).await.is_err() {
                    return;
                }
            }
        }
    }
}

fn config(timeout_ms: u64) -> BridgeConfig {
    BridgeConfig {
        timeout: Duration::from_millis(timeout_ms),
        settings: json!({ "tailwindCSS": { "classAttributes": ["class", "className"] } }),
        ..BridgeConfig::default()
    }
}

async fn connect(
    behavior: Behavior,
    timeout_ms: u64,
) -> (DiagnosticsBridge, mpsc::UnboundedReceiver<String>, BridgeResult<()>) {
    let (client, server) = duplex(4096);
    let (events, received) = mpsc::unbounded_channel();
    tokio::spawn(fake_server(server, behavior, events));

    let bridge = DiagnosticsBridge::new(config(timeout_ms));
    let (reader, writer) = split(client);
    let connected = bridge.connect(reader, writer).await;
    (bridge, received, connected)
}

async fn next_event(events: &mut mpsc::UnboundedReceiver<String>) -> String {
    tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("server event in time")
        .expect("server still running")
}

#[tokio::test]
async fn test_handshake_and_diagnostics() {
    let (bridge, mut events, connected) = connect(Behavior::Publish, 1000).await;
    connected.unwrap();
    assert_eq!(bridge.state().await, BridgeState::Ready);

    let diagnostics = bridge
        .diagnostics("file:///tmp/a.html", "html", r#"<div class="flex-grow">"#)
        .await
        .unwrap();
    assert_eq!(diagnostics.len(), 2);

    let suggestions = suggestions_from_diagnostics(&diagnostics);
    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0].canonical, "grow");

    let mut seen = Vec::new();
    for _ in 0..4 {
        seen.push(next_event(&mut events).await);
    }
    assert_eq!(
        seen,
        [methods::INITIALIZE, methods::INITIALIZED, methods::DID_OPEN, methods::DID_CLOSE]
    );

    bridge.shutdown().await;
    assert_eq!(bridge.state().await, BridgeState::Stopped);
}

#[tokio::test]
async fn test_concurrent_ensure_started_initializes_once() {
    let (client, server) = duplex(4096);
    let (events, mut received) = mpsc::unbounded_channel();
    tokio::spawn(fake_server(server, Behavior::Publish, events));

    let bridge = &DiagnosticsBridge::new(config(1000));
    let transport = &std::sync::Mutex::new(Some(client));
    let start = || async move {
        let stream = transport.lock().unwrap().take().ok_or(BridgeError::Closed)?;
        let (reader, writer) = split(stream);
        bridge.connect(reader, writer).await
    };

    let (first, second) = tokio::join!(
        bridge.ensure_started_with(start),
        bridge.ensure_started_with(start)
    );
    first.unwrap();
    second.unwrap();
    assert_eq!(bridge.state().await, BridgeState::Ready);

    assert_eq!(next_event(&mut received).await, methods::INITIALIZE);
    assert_eq!(next_event(&mut received).await, methods::INITIALIZED);
    let extra = tokio::time::timeout(Duration::from_millis(100), received.recv()).await;
    assert!(extra.is_err(), "unexpected server traffic: {extra:?}");

    let diagnostics = bridge
        .diagnostics("file:///tmp/e.html", "html", r#"<div class="flex-grow">"#)
        .await
        .unwrap();
    assert_eq!(diagnostics.len(), 2);

    bridge.shutdown().await;
}

#[tokio::test]
async fn test_missing_push_times_out_empty() {
    let (bridge, _events, connected) = connect(Behavior::Silent, 100).await;
    connected.unwrap();

    for _ in 0..2 {
        let diagnostics = bridge
            .diagnostics("file:///tmp/b.html", "html", "mt-4")
            .await
            .unwrap();
        assert!(diagnostics.is_empty());
    }
    assert_eq!(bridge.state().await, BridgeState::Ready);
}

#[tokio::test]
async fn test_document_calls_before_ready_fail() {
    let bridge = DiagnosticsBridge::new(config(100));
    assert_eq!(bridge.state().await, BridgeState::Stopped);

    let result = bridge.diagnostics("file:///tmp/c.html", "html", "mt-4").await;
    assert!(matches!(result, Err(BridgeError::NotReady)));
}

#[tokio::test]
async fn test_unanswered_handshake_times_out() {
    let (bridge, _events, connected) = connect(Behavior::Mute, 100).await;
    assert!(matches!(connected, Err(BridgeError::Timeout { .. })));
    assert_eq!(bridge.state().await, BridgeState::Stopped);
}

#[tokio::test]
async fn test_configuration_requests_get_settings() {
    let (bridge, mut events, connected) = connect(Behavior::AskConfiguration, 1000).await;
    connected.unwrap();

    let mut response = String::new();
    for _ in 0..3 {
        let event = next_event(&mut events).await;
        if let Some(payload) = event.strip_prefix("response:") {
            response = payload.to_string();
        }
    }
    let payload: serde_json::Value = serde_json::from_str(&response).unwrap();
    assert_eq!(payload, json!([{ "tailwindCSS": { "classAttributes": ["class", "className"] } }]));

    bridge.shutdown().await;
}

#[tokio::test]
async fn test_server_exit_clears_ready() {
    let (bridge, _events, connected) = connect(Behavior::HangUp, 1000).await;
    connected.unwrap();

    let stopped = async {
        while bridge.state().await != BridgeState::Stopped {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    };
    tokio::time::timeout(Duration::from_secs(2), stopped)
        .await
        .expect("reader notices the closed connection");

    let result = bridge.diagnostics("file:///tmp/d.html", "html", "mt-4").await;
    assert!(matches!(result, Err(BridgeError::NotReady)));
}

#[tokio::test]
async fn test_spawn_failure_falls_back_to_local() {
    let bridge = DiagnosticsBridge::new(BridgeConfig {
        command: "windlint-test-no-such-server".to_string(),
        ..config(100)
    });

    assert!(matches!(bridge.start().await, Err(BridgeError::Spawn { .. })));
    assert_eq!(bridge.state().await, BridgeState::Stopped);

    assert!(bridge_suggestions(&bridge, "flex-grow", "a.html").await.is_empty());
    let suggestions = suggest_with_bridge(&bridge, "flex-grow", "a.html").await;
    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0].canonical, "grow");
}
