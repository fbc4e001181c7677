//! Live transcript feed.
//!
//! Maintains the WebSocket subscription to the backend's per-meeting
//! transcript stream. Each parsed frame is appended to the shared
//! transcript and broadcast to subscribers. A dropped connection is
//! reported once and not retried: the user rejoins the room to get a
//! fresh feed.

mod connection;

pub(crate) use connection::build_feed_url;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tracing::{error, info};

use crate::records::{ChatRecord, Transcript};

/// Timeout for the WebSocket handshake in seconds.
const WS_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Feed event for subscribers
#[derive(Clone, Debug)]
pub(crate) enum FeedEvent {
    /// A new transcript record was delivered
    Record(ChatRecord),
    /// The connection was lost; no reconnect is attempted
    ConnectionLost,
    /// The feed task has exited
    Closed,
}

/// Feed errors
#[derive(Debug, thiserror::Error)]
pub(crate) enum FeedError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Connection timed out")]
    ConnectionTimeout,
}

/// Handle to one live feed connection.
///
/// There is exactly one connection per handle. Closing is idempotent:
/// the first call tears the connection down, later calls are no-ops.
pub(crate) struct FeedHandle {
    event_tx: broadcast::Sender<FeedEvent>,
    closed: Arc<AtomicBool>,
    close_tx: mpsc::Sender<()>,
    task: tokio::task::JoinHandle<()>,
}

impl FeedHandle {
    /// Connect to the transcript feed for a meeting.
    ///
    /// Spawns the receive task that appends parsed frames to
    /// `transcript` in delivery order.
    pub(crate) async fn connect(
        ws_base: &str,
        meeting_id: &str,
        transcript: Arc<Mutex<Transcript>>,
    ) -> Result<Self, FeedError> {
        let feed_url = build_feed_url(ws_base, meeting_id);
        info!(feed_url = %feed_url, "Connecting to transcript feed");

        let ws_result = timeout(
            Duration::from_secs(WS_CONNECT_TIMEOUT_SECS),
            connect_async(feed_url.as_str()),
        )
        .await;

        let ws_stream = match ws_result {
            Ok(Ok((stream, _response))) => stream,
            Ok(Err(e)) => {
                error!("Feed connection failed: {}", e);
                return Err(FeedError::ConnectionError(e.to_string()));
            }
            Err(_) => {
                error!("Feed connection timed out");
                return Err(FeedError::ConnectionTimeout);
            }
        };

        info!("Connected to transcript feed");

        let (event_tx, _) = broadcast::channel(100);
        let (close_tx, close_rx) = mpsc::channel::<()>(1);
        let closed = Arc::new(AtomicBool::new(false));

        let task = connection::spawn_receive_task(
            ws_stream,
            transcript,
            event_tx.clone(),
            closed.clone(),
            close_rx,
        );

        Ok(Self {
            event_tx,
            closed,
            close_tx,
            task,
        })
    }

    /// Subscribe to feed events
    pub(crate) fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.event_tx.subscribe()
    }

    /// Close the feed connection.
    ///
    /// Returns true on the call that actually initiated the close and
    /// false for every later call.
    pub(crate) fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::SeqCst) {
            return false;
        }
        // The receive task may already have exited, in which case the
        // channel is gone and there is nothing left to signal.
        let _ = self.close_tx.try_send(());
        info!("Feed close requested");
        true
    }

    /// Close the feed and wait for the receive task to exit.
    pub(crate) async fn shutdown(self) {
        self.close();
        let _ = self.task.await;
        info!("Feed shut down");
    }
}
