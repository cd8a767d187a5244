//! WebSocket streaming and ingest over a real socket.

mod common;

use std::time::Duration;

use cardio_core::alert::AlertEvent;
use cardio_core::reading::{Reading, VitalType};
use common::{eventually, spawn_app, test_state};
use futures::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

async fn next_text<S>(stream: &mut S) -> String
where
    S: futures::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let frame = tokio::time::timeout(RECV_TIMEOUT, stream.next())
            .await
            .expect("frame before timeout")
            .expect("stream open")
            .expect("valid frame");
        if let Message::Text(text) = frame {
            return text.as_str().to_string();
        }
    }
}

// ---------------------------------------------------------------------------
// Test: inbound text frames are ingested, malformed ones dropped
// ---------------------------------------------------------------------------

#[tokio::test]
async fn inbound_lines_reach_the_store() {
    let state = test_state();
    let store = state.store.clone();
    let addr = spawn_app(state).await;

    let (mut socket, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
        .await
        .expect("websocket handshake");

    socket
        .send(Message::Text("this is not a reading".into()))
        .await
        .expect("send");
    socket
        .send(Message::Text(
            "Patient ID: 2, Timestamp: 1700000000000, Label: SystolicPressure, Data: 185.0".into(),
        ))
        .await
        .expect("send");
    socket
        .send(Message::Text("2,1700000001000,Alert,triggered".into()))
        .await
        .expect("send");

    assert!(eventually(|| store.reading_count(2) == 2).await);
    let readings = store.query(2, 0, i64::MAX);
    assert_eq!(
        readings[0],
        Reading::new(2, VitalType::SystolicPressure, 185.0, 1_700_000_000_000)
    );
    assert_eq!(readings[1].vital, VitalType::AlertMarker);
    assert_eq!(store.list_patients().len(), 1);
}

// ---------------------------------------------------------------------------
// Test: hub messages are streamed as text frames
// ---------------------------------------------------------------------------

#[tokio::test]
async fn published_messages_are_streamed() {
    let state = test_state();
    let hub = state.hub.clone();
    let addr = spawn_app(state).await;

    let (socket, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
        .await
        .expect("websocket handshake");
    let (_sink, mut stream) = socket.split();

    assert!(eventually_async_subscribers(&hub, 1).await);

    hub.publish_reading(Reading::new(1, VitalType::HeartRate, 72.0, 1_000))
        .await;
    hub.publish_alert(AlertEvent::new(1, "Heart Rate Alert", 1_000))
        .await;

    assert_eq!(
        next_text(&mut stream).await,
        "Patient ID: 1, Timestamp: 1000, Label: HeartRate, Data: 72.0"
    );
    assert_eq!(
        next_text(&mut stream).await,
        "Alert Triggered:\nPatient ID: 1\nCondition: Heart Rate Alert\nTimestamp: 1000"
    );
}

// ---------------------------------------------------------------------------
// Test: disconnect removes the subscriber
// ---------------------------------------------------------------------------

#[tokio::test]
async fn closing_the_socket_unsubscribes() {
    let state = test_state();
    let hub = state.hub.clone();
    let addr = spawn_app(state).await;

    let (mut socket, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
        .await
        .expect("websocket handshake");
    assert!(eventually_async_subscribers(&hub, 1).await);

    socket.close(None).await.expect("close handshake");
    assert!(eventually_async_subscribers(&hub, 0).await);
}

async fn eventually_async_subscribers(hub: &cardio_events::BroadcastHub, expected: usize) -> bool {
    for _ in 0..200 {
        if hub.subscriber_count().await == expected {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
