//! Session termination flow.
//!
//! Disconnecting from a meeting runs a strictly sequential flow: close
//! the feed, fetch the full transcript from the backend, generate a
//! summary with Gemini, then let the user export it as a PDF or skip.
//! The state machine guards against re-entry so a double disconnect
//! triggers the flow at most once.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::time::{timeout, Duration};
use tracing::{info, warn};

use super::summary;
use crate::api::ApiClient;
use crate::error::{ApiError, GeminiError};
use crate::export::{self, ExportError};
use crate::feed::FeedHandle;
use crate::gemini::GeminiClient;
use crate::records::{ChatRecord, Transcript};

/// Timeout for the summary generation call.
const SUMMARY_TIMEOUT: Duration = Duration::from_secs(120);

/// States of the termination flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TerminationState {
    /// The meeting is live, no disconnect requested
    Live,
    /// Feed closed, transcript being fetched from the backend
    Ending,
    /// Waiting for Gemini to produce the summary
    Summarizing,
    /// Summary available, waiting for the export decision
    SummaryReady,
    /// PDF export in progress
    Exporting,
    /// Export declined
    Skipped,
    /// Flow complete, session over
    Ended,
    /// The flow failed before a summary was available
    Failed,
}

/// Termination errors
#[derive(Debug, thiserror::Error)]
pub(crate) enum TerminationError {
    #[error("A disconnect is already in progress")]
    AlreadyEnding,

    #[error("Meeting id {0:?} is not numeric")]
    BadMeetingId(String),

    #[error("User id {0:?} is not numeric")]
    BadUserId(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Gemini(#[from] GeminiError),
}

/// State machine driving one meeting's termination.
///
/// Created alongside the session in `Live` and advanced only by the
/// flow functions below. All transitions are one-way; once the flow
/// has left `Live` it can never be started again.
pub(crate) struct TerminationFlow {
    state: TerminationState,
    meeting_id: String,
    user_id: String,
}

impl TerminationFlow {
    pub(crate) fn new(meeting_id: &str, user_id: &str) -> Self {
        Self {
            state: TerminationState::Live,
            meeting_id: meeting_id.to_string(),
            user_id: user_id.to_string(),
        }
    }

    pub(crate) fn state(&self) -> TerminationState {
        self.state
    }

    pub(crate) fn meeting_id(&self) -> &str {
        &self.meeting_id
    }

    /// Start the flow. Rejects every call after the first so repeated
    /// disconnect requests cannot run the flow twice.
    pub(crate) fn begin(&mut self) -> Result<(), TerminationError> {
        if self.state != TerminationState::Live {
            warn!(state = ?self.state, "Disconnect requested while flow already started");
            return Err(TerminationError::AlreadyEnding);
        }
        self.advance(TerminationState::Ending);
        Ok(())
    }

    fn summarizing(&mut self) {
        self.advance_from(TerminationState::Ending, TerminationState::Summarizing);
    }

    fn summary_ready(&mut self) {
        self.advance_from(TerminationState::Summarizing, TerminationState::SummaryReady);
    }

    fn begin_export(&mut self) {
        self.advance_from(TerminationState::SummaryReady, TerminationState::Exporting);
    }

    fn skip(&mut self) {
        self.advance_from(TerminationState::SummaryReady, TerminationState::Skipped);
    }

    fn finish(&mut self) {
        match self.state {
            TerminationState::Exporting | TerminationState::Skipped => {
                self.advance(TerminationState::Ended);
            }
            _ => warn!(state = ?self.state, "Cannot finish from this state"),
        }
    }

    fn fail(&mut self) {
        match self.state {
            TerminationState::Ending | TerminationState::Summarizing => {
                self.advance(TerminationState::Failed);
            }
            _ => warn!(state = ?self.state, "Cannot fail from this state"),
        }
    }

    fn advance_from(&mut self, expected: TerminationState, next: TerminationState) {
        if self.state == expected {
            self.advance(next);
        } else {
            warn!(state = ?self.state, next = ?next, "Unexpected termination transition");
        }
    }

    fn advance(&mut self, next: TerminationState) {
        info!(from = ?self.state, to = ?next, "Termination state change");
        self.state = next;
    }
}

/// Run the flow up to a ready summary.
///
/// Closes the feed and clears the transcript, then fetches the full
/// transcript from the backend and asks Gemini for the summary. The
/// synthesized placeholder records are reported through `on_record` as
/// they enter the transcript. On failure the flow moves to `Failed`
/// and the error is returned; the session still ends.
pub(crate) async fn summarize_phase(
    flow: &mut TerminationFlow,
    feed: &FeedHandle,
    transcript: &Arc<Mutex<Transcript>>,
    api: &ApiClient,
    gemini: &GeminiClient,
    on_record: impl FnMut(&ChatRecord),
) -> Result<String, TerminationError> {
    flow.begin()?;

    match run_summarize(flow, feed, transcript, api, gemini, on_record).await {
        Ok(summary) => {
            flow.summary_ready();
            Ok(summary)
        }
        Err(e) => {
            flow.fail();
            Err(e)
        }
    }
}

async fn run_summarize(
    flow: &mut TerminationFlow,
    feed: &FeedHandle,
    transcript: &Arc<Mutex<Transcript>>,
    api: &ApiClient,
    gemini: &GeminiClient,
    mut on_record: impl FnMut(&ChatRecord),
) -> Result<String, TerminationError> {
    feed.close();

    if let Ok(mut t) = transcript.lock() {
        t.clear();
    }

    // The backend expects numeric ids
    let meeting_id: i64 = flow
        .meeting_id
        .trim()
        .parse()
        .map_err(|_| TerminationError::BadMeetingId(flow.meeting_id.clone()))?;
    let user_id: i64 = flow
        .user_id
        .trim()
        .parse()
        .map_err(|_| TerminationError::BadUserId(flow.user_id.clone()))?;

    let texts = api.end_meeting(meeting_id, user_id).await?;
    flow.summarizing();

    let placeholders = summary::placeholder_records(&flow.user_id);
    if let Ok(mut t) = transcript.lock() {
        t.reset_with(placeholders.clone());
    }
    for record in &placeholders {
        on_record(record);
    }

    let prompt = summary::build_summary_prompt(&texts);
    let answer = match timeout(SUMMARY_TIMEOUT, gemini.generate(None, &prompt)).await {
        Ok(result) => result?,
        Err(_) => {
            warn!("Summary generation timed out after {:?}", SUMMARY_TIMEOUT);
            return Err(GeminiError::Timeout.into());
        }
    };

    let summary_text = summary::summary_or_fallback(answer);
    if let Ok(mut t) = transcript.lock() {
        t.replace_last(summary::summary_record(&summary_text));
    }

    info!(summary_len = summary_text.len(), "Meeting summary ready");
    Ok(summary_text)
}

/// Export the summary as a PDF.
///
/// The flow ends whether or not the export succeeds; an export failure
/// must not trap the user in the meeting.
pub(crate) fn export_phase(
    flow: &mut TerminationFlow,
    summary_text: &str,
) -> Result<PathBuf, ExportError> {
    flow.begin_export();
    let result = export::export_summary(flow.meeting_id(), summary_text);
    flow.finish();
    result
}

/// Decline the export and end the flow.
pub(crate) fn skip_phase(flow: &mut TerminationFlow) {
    flow.skip();
    flow.finish();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_moves_to_ending() {
        let mut flow = TerminationFlow::new("42", "7");
        assert_eq!(flow.state(), TerminationState::Live);

        flow.begin().expect("First begin should succeed");
        assert_eq!(flow.state(), TerminationState::Ending);
    }

    #[test]
    fn test_double_begin_is_rejected() {
        let mut flow = TerminationFlow::new("42", "7");

        flow.begin().expect("First begin should succeed");
        let second = flow.begin();

        assert!(matches!(second, Err(TerminationError::AlreadyEnding)));
        assert_eq!(flow.state(), TerminationState::Ending);
    }

    #[test]
    fn test_begin_after_ended_is_rejected() {
        let mut flow = TerminationFlow::new("42", "7");
        flow.begin().expect("Should begin");
        flow.summarizing();
        flow.summary_ready();
        flow.skip();
        flow.finish();
        assert_eq!(flow.state(), TerminationState::Ended);

        assert!(matches!(flow.begin(), Err(TerminationError::AlreadyEnding)));
        assert_eq!(flow.state(), TerminationState::Ended);
    }

    #[test]
    fn test_export_path_reaches_ended() {
        let mut flow = TerminationFlow::new("42", "7");
        flow.begin().expect("Should begin");
        flow.summarizing();
        flow.summary_ready();
        flow.begin_export();
        assert_eq!(flow.state(), TerminationState::Exporting);

        flow.finish();
        assert_eq!(flow.state(), TerminationState::Ended);
    }

    #[test]
    fn test_skip_path_reaches_ended() {
        let mut flow = TerminationFlow::new("42", "7");
        flow.begin().expect("Should begin");
        flow.summarizing();
        flow.summary_ready();

        skip_phase(&mut flow);
        assert_eq!(flow.state(), TerminationState::Ended);
    }

    #[test]
    fn test_fail_from_ending() {
        let mut flow = TerminationFlow::new("42", "7");
        flow.begin().expect("Should begin");

        flow.fail();
        assert_eq!(flow.state(), TerminationState::Failed);
    }

    #[test]
    fn test_fail_from_summarizing() {
        let mut flow = TerminationFlow::new("42", "7");
        flow.begin().expect("Should begin");
        flow.summarizing();

        flow.fail();
        assert_eq!(flow.state(), TerminationState::Failed);
    }

    #[test]
    fn test_fail_is_not_reachable_after_summary_ready() {
        let mut flow = TerminationFlow::new("42", "7");
        flow.begin().expect("Should begin");
        flow.summarizing();
        flow.summary_ready();

        flow.fail();
        assert_eq!(flow.state(), TerminationState::SummaryReady);
    }

    #[test]
    fn test_transitions_from_wrong_state_do_not_move() {
        let mut flow = TerminationFlow::new("42", "7");

        flow.summarizing();
        assert_eq!(flow.state(), TerminationState::Live);

        flow.skip();
        assert_eq!(flow.state(), TerminationState::Live);

        flow.finish();
        assert_eq!(flow.state(), TerminationState::Live);
    }
}
