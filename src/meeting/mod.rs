//! Meeting session management.
//!
//! A `MeetingSession` ties together everything that lives for one
//! joined room: the shared transcript, the feed connection and the
//! captured assistant context. Leaving the room tears all of it down.

pub(crate) mod summary;
mod termination;

pub(crate) use termination::{
    export_phase, skip_phase, summarize_phase, TerminationError, TerminationFlow,
};

use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::info;

use crate::capture::SelectionContext;
use crate::feed::{FeedEvent, FeedError, FeedHandle};
use crate::records::Transcript;

/// State for one joined meeting room.
pub(crate) struct MeetingSession {
    meeting_id: String,
    user_id: String,
    transcript: Arc<Mutex<Transcript>>,
    feed: FeedHandle,
    context: Option<SelectionContext>,
}

impl MeetingSession {
    /// Join a meeting room and open its transcript feed.
    ///
    /// Creating a new session is the only way to open a feed, so a
    /// session can never hold more than one connection.
    pub(crate) async fn join(
        ws_base: &str,
        meeting_id: &str,
        user_id: &str,
    ) -> Result<Self, FeedError> {
        let transcript = Arc::new(Mutex::new(Transcript::default()));
        let feed = FeedHandle::connect(ws_base, meeting_id, transcript.clone()).await?;

        info!(meeting_id = %meeting_id, user_id = %user_id, "Joined meeting");

        Ok(Self {
            meeting_id: meeting_id.to_string(),
            user_id: user_id.to_string(),
            transcript,
            feed,
            context: None,
        })
    }

    pub(crate) fn meeting_id(&self) -> &str {
        &self.meeting_id
    }

    pub(crate) fn user_id(&self) -> &str {
        &self.user_id
    }

    pub(crate) fn transcript(&self) -> &Arc<Mutex<Transcript>> {
        &self.transcript
    }

    pub(crate) fn feed(&self) -> &FeedHandle {
        &self.feed
    }

    /// Subscribe to feed events
    pub(crate) fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.feed.subscribe()
    }

    /// Replace the captured context with a new selection.
    ///
    /// There is at most one context at a time; capturing again
    /// overwrites the previous selection and moves the highlight.
    pub(crate) fn apply_capture(&mut self, context: SelectionContext) -> &SelectionContext {
        self.context.insert(context)
    }

    /// The captured context snippet, if any.
    pub(crate) fn context_snippet(&self) -> Option<&str> {
        self.context.as_ref().map(|c| c.snippet.as_str())
    }

    /// Index of the transcript record the current context came from.
    pub(crate) fn highlighted_index(&self) -> Option<usize> {
        self.context.as_ref().map(|c| c.source_index)
    }

    /// Leave the room: close the feed and drop the transcript.
    pub(crate) async fn leave(self) {
        self.feed.shutdown().await;
        if let Ok(mut t) = self.transcript.lock() {
            info!(meeting_id = %self.meeting_id, records = t.len(), "Left meeting");
            t.clear();
        }
    }
}
