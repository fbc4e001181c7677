//! Feed WebSocket connection handling.
//!
//! Builds the per-meeting feed URL and runs the receive loop that
//! turns incoming frames into transcript records.

use futures_util::StreamExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{error, info, trace, warn};

use super::FeedEvent;
use crate::records::{ChatRecord, Transcript};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Build the feed URL for a meeting.
///
/// The meeting id is passed through verbatim as a query parameter.
pub(crate) fn build_feed_url(ws_base: &str, meeting_id: &str) -> String {
    // Remove trailing slash if present
    let base = ws_base.trim_end_matches('/');

    // Convert https:// to wss:// in case an HTTP base was configured
    let ws_endpoint = base.replace("https://", "wss://").replace("http://", "ws://");

    format!("{}/v1/ws?meeting_id={}", ws_endpoint, meeting_id)
}

/// Spawn the receive task that handles incoming feed frames.
pub(super) fn spawn_receive_task(
    mut ws_stream: WsStream,
    transcript: Arc<Mutex<Transcript>>,
    event_tx: broadcast::Sender<FeedEvent>,
    closed: Arc<AtomicBool>,
    mut close_rx: mpsc::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;

                _ = close_rx.recv() => {
                    info!("Feed receive task closing on request");
                    let _ = ws_stream.close(None).await;
                    break;
                }
                msg_result = ws_stream.next() => {
                    match msg_result {
                        Some(Ok(Message::Text(text))) => {
                            // A frame racing the close signal is dropped
                            if closed.load(Ordering::SeqCst) {
                                continue;
                            }
                            apply_frame(&text, &transcript, &event_tx);
                        }
                        Some(Ok(Message::Close(_))) => {
                            info!("Feed closed by server");
                            if !closed.load(Ordering::SeqCst) {
                                let _ = event_tx.send(FeedEvent::ConnectionLost);
                            }
                            break;
                        }
                        Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {
                            trace!("Feed WebSocket keepalive");
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            error!("Feed receive error: {}", e);
                            if !closed.load(Ordering::SeqCst) {
                                let _ = event_tx.send(FeedEvent::ConnectionLost);
                            }
                            break;
                        }
                        None => {
                            info!("Feed stream ended");
                            if !closed.load(Ordering::SeqCst) {
                                let _ = event_tx.send(FeedEvent::ConnectionLost);
                            }
                            break;
                        }
                    }
                }
            }
        }

        let _ = event_tx.send(FeedEvent::Closed);
    })
}

/// Parse one feed frame and append it to the transcript.
///
/// Malformed frames are logged and dropped without disturbing the
/// records already delivered.
fn apply_frame(
    text: &str,
    transcript: &Arc<Mutex<Transcript>>,
    event_tx: &broadcast::Sender<FeedEvent>,
) -> Option<ChatRecord> {
    match serde_json::from_str::<ChatRecord>(text) {
        Ok(record) => {
            if let Ok(mut t) = transcript.lock() {
                t.push(record.clone());
            }
            let _ = event_tx.send(FeedEvent::Record(record.clone()));
            Some(record)
        }
        Err(e) => {
            warn!("Failed to parse feed frame: {} - {}", e, text);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_transcript() -> Arc<Mutex<Transcript>> {
        Arc::new(Mutex::new(Transcript::default()))
    }

    #[test]
    fn test_build_feed_url() {
        let url = build_feed_url("ws://localhost:6065", "42");
        assert_eq!(url, "ws://localhost:6065/v1/ws?meeting_id=42");
    }

    #[test]
    fn test_build_feed_url_trailing_slash() {
        let url = build_feed_url("ws://localhost:6065/", "42");
        assert_eq!(url, "ws://localhost:6065/v1/ws?meeting_id=42");
    }

    #[test]
    fn test_build_feed_url_converts_http_scheme() {
        assert_eq!(
            build_feed_url("https://api.example.com", "42"),
            "wss://api.example.com/v1/ws?meeting_id=42"
        );
        assert_eq!(
            build_feed_url("http://api.example.com", "9"),
            "ws://api.example.com/v1/ws?meeting_id=9"
        );
    }

    #[test]
    fn test_apply_frame_appends_record() {
        let transcript = test_transcript();
        let (event_tx, mut event_rx) = broadcast::channel(8);

        let frame = r#"{"UserID":"U1","UserName":"Alice","Text":"hi","RecordedAt":"2024-01-01T00:00:00Z"}"#;
        let record = apply_frame(frame, &transcript, &event_tx).expect("Frame should parse");

        assert_eq!(record.user_name, "Alice");
        assert_eq!(transcript.lock().unwrap().len(), 1);
        assert_eq!(transcript.lock().unwrap().records()[0].text, "hi");

        match event_rx.try_recv().expect("Event should be broadcast") {
            FeedEvent::Record(r) => assert_eq!(r.user_id, "U1"),
            other => panic!("Unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_apply_frame_preserves_delivery_order() {
        let transcript = test_transcript();
        let (event_tx, _) = broadcast::channel(8);

        for text in ["one", "two", "three"] {
            let frame = format!(
                r#"{{"UserID":1,"UserName":"Alice","Text":"{}","RecordedAt":"2024-01-01T00:00:00Z"}}"#,
                text
            );
            apply_frame(&frame, &transcript, &event_tx);
        }

        let guard = transcript.lock().unwrap();
        let texts: Vec<&str> = guard.records().iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_apply_frame_drops_malformed_json() {
        let transcript = test_transcript();
        let (event_tx, _) = broadcast::channel(8);

        assert!(apply_frame("not json at all", &transcript, &event_tx).is_none());
        assert!(apply_frame("{\"UserID\":", &transcript, &event_tx).is_none());
        assert!(transcript.lock().unwrap().is_empty());
    }

    #[test]
    fn test_apply_frame_drops_incomplete_record() {
        let transcript = test_transcript();
        let (event_tx, _) = broadcast::channel(8);

        let frame = r#"{"UserID":"U1","UserName":"Alice"}"#;
        assert!(apply_frame(frame, &transcript, &event_tx).is_none());
        assert!(transcript.lock().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_frame_between_valid_frames() {
        let transcript = test_transcript();
        let (event_tx, _) = broadcast::channel(8);

        let valid = r#"{"UserID":"U1","UserName":"Alice","Text":"first","RecordedAt":"2024-01-01T00:00:00Z"}"#;
        apply_frame(valid, &transcript, &event_tx);
        apply_frame("garbage", &transcript, &event_tx);
        let valid2 = r#"{"UserID":"U2","UserName":"Bob","Text":"second","RecordedAt":"2024-01-01T00:00:01Z"}"#;
        apply_frame(valid2, &transcript, &event_tx);

        let guard = transcript.lock().unwrap();
        assert_eq!(guard.len(), 2);
        assert_eq!(guard.records()[0].text, "first");
        assert_eq!(guard.records()[1].text, "second");
    }
}
