//! Integration tests for the realtime client against an in-process
//! notification server (a plain tokio-tungstenite accept loop).

use std::sync::Arc;
use std::sync::Once;
use std::time::Duration;

use anyhow::Result;
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, accept_async};

use pledgeboard_client::identifiers::{RoomId, UserId};
use pledgeboard_client::realtime::{
    CONNECTION_FAILED_EVENT, Endpoint, RealtimeClient, ReconnectPolicy, UNKNOWN_MESSAGE_EVENT,
};

// ============================================================================
// Harness
// ============================================================================

fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

/// Binds a local notification server and derives the client endpoint.
async fn bind_server() -> Result<(TcpListener, Endpoint)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    let endpoint = Endpoint::custom(&format!("ws://127.0.0.1:{port}"))?;
    Ok((listener, endpoint))
}

/// Accepts one WebSocket connection.
async fn accept_ws(listener: &TcpListener) -> WebSocketStream<TcpStream> {
    let (stream, _addr) = listener.accept().await.expect("tcp accept");
    accept_async(stream).await.expect("websocket upgrade")
}

/// Reads the next text frame as JSON, skipping control traffic.
async fn read_json(ws: &mut WebSocketStream<TcpStream>) -> Value {
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => {
                return serde_json::from_str(&text).expect("valid json frame");
            }
            Some(Ok(_)) => continue,
            other => panic!("expected text frame, got {other:?}"),
        }
    }
}

/// Sends a JSON value as a text frame.
async fn send_json(ws: &mut WebSocketStream<TcpStream>, value: Value) {
    ws.send(Message::Text(value.to_string().into()))
        .await
        .expect("send frame");
}

/// Polls a condition until it holds or a 5 s deadline passes.
async fn wait_for(what: &str, condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {what}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

fn fast_policy() -> ReconnectPolicy {
    ReconnectPolicy::new(Duration::from_millis(20), 5)
}

fn client_for(endpoint: Endpoint) -> RealtimeClient {
    RealtimeClient::builder()
        .endpoint(endpoint)
        .reconnect_policy(fast_policy())
        .build()
        .expect("client")
}

fn user() -> UserId {
    UserId::new("u42").expect("user id")
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn connect_sends_auth_and_reaches_ready() -> Result<()> {
    init_tracing();
    let (listener, endpoint) = bind_server().await?;
    let client = client_for(endpoint);

    let server = tokio::spawn(async move {
        let mut ws = accept_ws(&listener).await;
        let auth = read_json(&mut ws).await;
        assert_eq!(auth["type"], "auth");
        assert_eq!(auth["user_id"], "u42");
        assert_eq!(auth["token"], "session-token");

        send_json(&mut ws, json!({"type": "welcome", "connection_id": "conn-1"})).await;
        send_json(&mut ws, json!({"type": "auth_success"})).await;
        tokio::time::sleep(Duration::from_secs(10)).await;
    });

    client.connect(user(), "session-token").await?;
    wait_for("ready", || client.state().is_ready()).await;

    assert_eq!(client.attempts(), 0);
    assert_eq!(
        client.connection_id().map(|id| id.as_str().to_string()),
        Some("conn-1".to_string())
    );

    client.disconnect();
    server.abort();
    Ok(())
}

#[tokio::test]
async fn auth_rejection_surfaces_once_without_retry() -> Result<()> {
    init_tracing();
    let (listener, endpoint) = bind_server().await?;
    let client = client_for(endpoint);

    let (verdict_tx, mut verdict_rx) = mpsc::unbounded_channel();
    client.set_auth_handler(move |ok| {
        let _ = verdict_tx.send(ok);
    });

    let server = tokio::spawn(async move {
        let mut ws = accept_ws(&listener).await;
        let _auth = read_json(&mut ws).await;
        send_json(&mut ws, json!({"type": "auth_error", "message": "bad token"})).await;

        // The client must not retry authentication on its own; nothing else
        // should arrive on this transport.
        let followup =
            tokio::time::timeout(Duration::from_millis(300), read_json(&mut ws)).await;
        assert!(followup.is_err(), "unexpected frame after auth rejection");
    });

    client.connect(user(), "expired-token").await?;

    let verdict = tokio::time::timeout(Duration::from_secs(5), verdict_rx.recv())
        .await?
        .expect("auth verdict");
    assert!(!verdict);
    assert!(!client.state().is_ready());

    server.await?;
    client.disconnect();
    Ok(())
}

// ============================================================================
// Heartbeat
// ============================================================================

#[tokio::test]
async fn heartbeat_pings_at_interval_while_ready() -> Result<()> {
    init_tracing();
    let (listener, endpoint) = bind_server().await?;
    let client = RealtimeClient::builder()
        .endpoint(endpoint)
        .reconnect_policy(fast_policy())
        .heartbeat_interval(Duration::from_millis(50))
        .build()?;

    let (pings_tx, mut pings_rx) = mpsc::unbounded_channel();
    let server = tokio::spawn(async move {
        let mut ws = accept_ws(&listener).await;
        let _auth = read_json(&mut ws).await;
        send_json(&mut ws, json!({"type": "auth_success"})).await;

        for _ in 0..2 {
            let frame = read_json(&mut ws).await;
            assert_eq!(frame["type"], "ping");
            assert!(frame["timestamp"].is_u64());
            send_json(&mut ws, json!({"type": "pong"})).await;
            let _ = pings_tx.send(());
        }
        tokio::time::sleep(Duration::from_secs(10)).await;
    });

    client.connect(user(), "session-token").await?;

    for _ in 0..2 {
        tokio::time::timeout(Duration::from_secs(5), pings_rx.recv())
            .await?
            .expect("ping received");
    }

    client.disconnect();
    server.abort();
    Ok(())
}

// ============================================================================
// Dispatch
// ============================================================================

#[tokio::test]
async fn messages_dispatch_in_arrival_order_with_unknown_channel() -> Result<()> {
    init_tracing();
    let (listener, endpoint) = bind_server().await?;
    let client = client_for(endpoint);

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    for event in ["notification", "pending_notifications", UNKNOWN_MESSAGE_EVENT] {
        let tx = events_tx.clone();
        let name = event.to_string();
        client.add_listener(
            event,
            Arc::new(move |payload| {
                let _ = tx.send((name.clone(), payload.clone()));
            }),
        );
    }

    let server = tokio::spawn(async move {
        let mut ws = accept_ws(&listener).await;
        let _auth = read_json(&mut ws).await;
        send_json(&mut ws, json!({"type": "auth_success"})).await;
        send_json(
            &mut ws,
            json!({"type": "notification", "data": {"message": "New pledge: 50 EUR"}}),
        )
        .await;
        send_json(
            &mut ws,
            json!({"type": "pending_notifications", "notifications": [{}, {}], "count": 2}),
        )
        .await;
        send_json(&mut ws, json!({"type": "campaign_update", "progress": 0.8})).await;
        tokio::time::sleep(Duration::from_secs(10)).await;
    });

    client.connect(user(), "session-token").await?;

    let mut received = Vec::new();
    for _ in 0..3 {
        let event = tokio::time::timeout(Duration::from_secs(5), events_rx.recv())
            .await?
            .expect("event");
        received.push(event);
    }

    assert_eq!(received[0].0, "notification");
    assert_eq!(received[0].1["data"]["message"], "New pledge: 50 EUR");
    assert_eq!(received[1].0, "pending_notifications");
    assert_eq!(received[1].1["count"], 2);
    assert_eq!(received[2].0, UNKNOWN_MESSAGE_EVENT);
    assert_eq!(received[2].1["type"], "campaign_update");

    client.disconnect();
    server.abort();
    Ok(())
}

#[tokio::test]
async fn room_helpers_send_on_open_transport() -> Result<()> {
    init_tracing();
    let (listener, endpoint) = bind_server().await?;
    let client = client_for(endpoint);
    let room = RoomId::new("project-9")?;

    assert!(!client.join_room(room.clone()));

    let (frames_tx, mut frames_rx) = mpsc::unbounded_channel();
    let server = tokio::spawn(async move {
        let mut ws = accept_ws(&listener).await;
        let _auth = read_json(&mut ws).await;
        send_json(&mut ws, json!({"type": "auth_success"})).await;

        for _ in 0..3 {
            let frame = read_json(&mut ws).await;
            let _ = frames_tx.send(frame);
        }
        tokio::time::sleep(Duration::from_secs(10)).await;
    });

    client.connect(user(), "session-token").await?;
    wait_for("ready", || client.state().is_ready()).await;

    assert!(client.join_room(room.clone()));
    assert!(client.subscribe_to_notifications());
    assert!(client.leave_room(room));

    let join = tokio::time::timeout(Duration::from_secs(5), frames_rx.recv())
        .await?
        .expect("join frame");
    assert_eq!(join["type"], "join_room");
    assert_eq!(join["room_id"], "project-9");

    let subscribe = tokio::time::timeout(Duration::from_secs(5), frames_rx.recv())
        .await?
        .expect("subscribe frame");
    assert_eq!(subscribe["type"], "subscribe_notifications");

    let leave = tokio::time::timeout(Duration::from_secs(5), frames_rx.recv())
        .await?
        .expect("leave frame");
    assert_eq!(leave["type"], "leave_room");

    client.disconnect();
    server.abort();
    Ok(())
}

// ============================================================================
// Reconnection
// ============================================================================

#[tokio::test]
async fn unclean_drop_reconnects_and_resets_attempts() -> Result<()> {
    init_tracing();
    let (listener, endpoint) = bind_server().await?;
    let client = client_for(endpoint);

    let (reconnected_tx, reconnected_rx) = oneshot::channel();
    let server = tokio::spawn(async move {
        // First connection: authenticate, then drop the TCP stream without
        // a close frame.
        let mut ws = accept_ws(&listener).await;
        let _auth = read_json(&mut ws).await;
        send_json(&mut ws, json!({"type": "auth_success"})).await;
        drop(ws);

        // The backoff retry re-authenticates.
        let mut ws = accept_ws(&listener).await;
        let auth = read_json(&mut ws).await;
        assert_eq!(auth["type"], "auth");
        assert_eq!(auth["user_id"], "u42");
        send_json(&mut ws, json!({"type": "auth_success"})).await;
        let _ = reconnected_tx.send(());
        tokio::time::sleep(Duration::from_secs(10)).await;
    });

    client.connect(user(), "session-token").await?;

    tokio::time::timeout(Duration::from_secs(5), reconnected_rx).await??;
    wait_for("ready with attempts reset", || {
        client.state().is_ready() && client.attempts() == 0
    })
    .await;

    client.disconnect();
    server.abort();
    Ok(())
}

#[tokio::test]
async fn exhausted_attempts_emit_connection_failed() -> Result<()> {
    init_tracing();
    // Reserve a port with no listener behind it.
    let (listener, endpoint) = bind_server().await?;
    drop(listener);

    let client = RealtimeClient::builder()
        .endpoint(endpoint)
        .reconnect_policy(ReconnectPolicy::new(Duration::from_millis(10), 3))
        .build()?;

    let (failed_tx, mut failed_rx) = mpsc::unbounded_channel();
    client.add_listener(
        CONNECTION_FAILED_EVENT,
        Arc::new(move |payload| {
            let _ = failed_tx.send(payload["attempts"].as_u64());
        }),
    );

    let result = client.connect(user(), "session-token").await;
    assert!(result.is_err());

    let attempts = tokio::time::timeout(Duration::from_secs(5), failed_rx.recv())
        .await?
        .expect("connection_failed payload");
    assert_eq!(attempts, Some(3));

    // No further automatic retries after the event.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!client.state().is_reconnecting());
    assert!(failed_rx.try_recv().is_err());
    Ok(())
}

#[tokio::test]
async fn disconnect_cancels_pending_reconnect_timer() -> Result<()> {
    init_tracing();
    // Reserve a port, keep it closed for the initial dial.
    let (listener, endpoint) = bind_server().await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let client = RealtimeClient::builder()
        .endpoint(endpoint)
        .reconnect_policy(ReconnectPolicy::new(Duration::from_millis(150), 5))
        .build()?;

    let result = client.connect(user(), "session-token").await;
    assert!(result.is_err());
    assert!(client.state().is_reconnecting());

    // Cancel while the 150 ms retry timer is pending, then start a server
    // on the very port the retry would have dialed.
    client.disconnect();
    let listener = TcpListener::bind(addr).await?;

    let fired = tokio::time::timeout(Duration::from_millis(500), listener.accept()).await;
    assert!(fired.is_err(), "cancelled reconnect timer still dialed out");
    assert_eq!(client.attempts(), 0);
    Ok(())
}
