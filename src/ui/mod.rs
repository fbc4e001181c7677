//! Terminal user interface.
//!
//! Owns the sign-in flow, the join form and the live meeting loop. The
//! meeting loop multiplexes feed events, stdin commands and the capture
//! hotkey over a single select loop; the end-meeting flow runs inside
//! it so the session can never outlive an abandoned summary.

mod message;
mod visibility;

use std::io::Write as _;
use std::time::Duration;

use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::api::ApiClient;
use crate::assistant::{AssistantPanel, Speaker, ASSISTANT_NAME, THINKING_TEXT};
use crate::auth;
use crate::capture;
use crate::config::Config;
use crate::error::GeminiError;
use crate::export::markdown::{parse_markdown, MarkdownSegment};
use crate::feed::FeedEvent;
use crate::gemini::GeminiClient;
use crate::hotkeys::HotkeyAction;
use crate::meeting::{self, MeetingSession, TerminationError, TerminationFlow};
use crate::session::{self, StoredSession};

use message::render_record;
use visibility::{VisibilityCell, VisibilityView};

/// Column width transcript lines are aligned against.
const DISPLAY_WIDTH: usize = 100;

/// Interval between progress lines while a summary is generating.
const PROGRESS_INTERVAL: Duration = Duration::from_secs(5);

const JOIN_FORM_MISSING: &str = "Please enter both Room ID and User ID.";

type InputLines = Lines<BufReader<Stdin>>;

/// Run the client until the user quits.
pub(crate) async fn run(
    config: &'static Config,
    hotkey_rx: mpsc::Receiver<HotkeyAction>,
    capture_enabled: bool,
) -> anyhow::Result<()> {
    let mut ui = Ui::new(config, hotkey_rx, capture_enabled)?;
    ui.run().await
}

struct JoinForm {
    meeting_id: String,
    user_id: String,
}

struct Ui {
    config: &'static Config,
    api: ApiClient,
    gemini: Option<GeminiClient>,
    input: InputLines,
    hotkey_rx: mpsc::Receiver<HotkeyAction>,
    capture_active: bool,
    footer: VisibilityCell,
}

impl Ui {
    fn new(
        config: &'static Config,
        hotkey_rx: mpsc::Receiver<HotkeyAction>,
        capture_enabled: bool,
    ) -> anyhow::Result<Self> {
        let api = ApiClient::new(&config.backend.api_base)?;
        let gemini = match GeminiClient::new(&config.gemini) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!("Assistant disabled: {}", e);
                None
            }
        };

        Ok(Self {
            config,
            api,
            gemini,
            input: BufReader::new(tokio::io::stdin()).lines(),
            hotkey_rx,
            capture_active: capture_enabled,
            footer: VisibilityCell::new(true),
        })
    }

    async fn run(&mut self) -> anyhow::Result<()> {
        print_banner();

        let stored = self.establish_session().await?;
        let footer_view = self.footer.view();

        loop {
            print_footer(self.config, &footer_view);

            let Some(form) = self.read_join_form(stored.as_ref()).await? else {
                break;
            };

            if !self.run_meeting(&form).await? {
                break;
            }
        }

        println!("Goodbye.");
        Ok(())
    }

    /// Reuse a stored session or walk the user through sign-in.
    ///
    /// Returns `None` when sign-in is unavailable or declined; the
    /// client then runs without prefilled ids.
    async fn establish_session(&mut self) -> anyhow::Result<Option<StoredSession>> {
        if let Some(stored) = session::load_session() {
            info!("Reusing stored session");
            println!("{}", "Welcome back.".green());
            return Ok(Some(stored));
        }

        let Some(base) = self.config.links.oauth_authorize.as_deref() else {
            warn!("No OAuth authorize URL configured, continuing without sign-in");
            return Ok(None);
        };

        let url = auth::authorize_url(base);
        println!("{}", "Sign in with Discord to continue.".bold());
        if auth::open_authorize_page(&url) {
            println!("A browser window should have opened. If not, visit:");
        } else {
            println!("Open this page in your browser:");
        }
        println!("  {}", url.underline());

        let Some(code) = self.prompt("Paste the authorization code", None).await? else {
            return Ok(None);
        };
        if code.is_empty() {
            warn!("Empty authorization code, continuing without sign-in");
            return Ok(None);
        }

        match auth::exchange_code(&self.config.backend.api_base, &code).await {
            Ok(established) => {
                if let Err(e) = session::save_session(&established) {
                    warn!("Could not persist session: {}", e);
                }
                println!("{}", "Signed in.".green());
                Ok(Some(established))
            }
            Err(e) => {
                error!("Sign-in failed: {}", e);
                println!("{}", "Sign-in failed, continuing without a session.".red());
                Ok(None)
            }
        }
    }

    /// Prompt for room and user ids until both are present.
    async fn read_join_form(
        &mut self,
        stored: Option<&StoredSession>,
    ) -> anyhow::Result<Option<JoinForm>> {
        println!("{}", "Join a meeting room (/quit to exit).".bold());

        loop {
            let default_meeting = stored.and_then(|s| s.meeting_id.as_deref());
            let Some(meeting_id) = self.prompt("Room ID", default_meeting).await? else {
                return Ok(None);
            };

            let default_user = stored.and_then(|s| s.user_id.as_deref());
            let Some(user_id) = self.prompt("User ID", default_user).await? else {
                return Ok(None);
            };

            if meeting_id.is_empty() || user_id.is_empty() {
                println!("{}", JOIN_FORM_MISSING.yellow());
                continue;
            }

            return Ok(Some(JoinForm {
                meeting_id,
                user_id,
            }));
        }
    }

    /// One joined meeting, from connect to leave.
    ///
    /// Returns `false` when the user quit the client entirely.
    async fn run_meeting(&mut self, form: &JoinForm) -> anyhow::Result<bool> {
        self.footer.set(false);

        let ws_base = &self.config.backend.ws_base;
        let mut session =
            match MeetingSession::join(ws_base, &form.meeting_id, &form.user_id).await {
                Ok(session) => session,
                Err(e) => {
                    error!("Failed to join room {}: {}", form.meeting_id, e);
                    println!(
                        "{}",
                        format!("Could not connect to room {}.", form.meeting_id).red()
                    );
                    self.footer.set(true);
                    return Ok(true);
                }
            };

        println!();
        println!(
            "{}",
            format!("Joined room {} as user {}.", form.meeting_id, form.user_id)
                .green()
                .bold()
        );
        println!(
            "Type a question for {}, {} to end the meeting, {} to quit.",
            ASSISTANT_NAME,
            "/disconnect".bold(),
            "/quit".bold()
        );
        if self.capture_active {
            println!("Select transcript text and press Ctrl+I (Cmd+I on macOS) to capture it as context.");
        }
        println!();

        let mut events = session.subscribe();
        let mut panel = AssistantPanel::new();
        let dialog = VisibilityCell::new(false);

        let keep_running = loop {
            tokio::select! {
                event = events.recv() => match event {
                    Ok(FeedEvent::Record(record)) => {
                        println!(
                            "{}",
                            render_record(&record, session.user_id(), false, DISPLAY_WIDTH)
                        );
                    }
                    Ok(FeedEvent::ConnectionLost) => {
                        warn!("Feed connection lost");
                        println!("{}", "Connection to the room was lost.".red());
                    }
                    Ok(FeedEvent::Closed) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Dropped feed events, rendering resumed");
                    }
                    Err(broadcast::error::RecvError::Closed) => {}
                },
                line = self.input.next_line() => match line? {
                    None => break false,
                    Some(line) => {
                        let line = line.trim().to_string();
                        if line.is_empty() {
                            continue;
                        }
                        if line == "/quit" {
                            break false;
                        }
                        if line == "/disconnect" {
                            self.run_disconnect(&dialog, &session).await?;
                            break true;
                        }
                        self.ask_assistant(&mut panel, &line, &session).await;
                    }
                },
                action = self.hotkey_rx.recv(), if self.capture_active => match action {
                    Some(HotkeyAction::CaptureContext) => handle_capture(&mut session),
                    None => {
                        warn!("Hotkey listener stopped");
                        self.capture_active = false;
                    }
                },
            }
        };

        session.leave().await;
        self.footer.set(true);
        Ok(keep_running)
    }

    /// Forward a typed question to the assistant panel and print the
    /// outcome.
    async fn ask_assistant(
        &self,
        panel: &mut AssistantPanel,
        line: &str,
        session: &MeetingSession,
    ) {
        let Some(gemini) = self.gemini.as_ref() else {
            println!(
                "{}",
                "The assistant is unavailable: GEMINI_API_KEY is not set.".yellow()
            );
            return;
        };

        if panel.is_waiting() {
            println!(
                "{}",
                "The assistant is still working on the previous question.".yellow()
            );
            return;
        }

        println!("{}", THINKING_TEXT.italic().dimmed());

        match panel.send(line, session.context_snippet(), gemini).await {
            Ok(()) => {
                if let Some(last) = panel.messages().last() {
                    if last.speaker == Speaker::Assistant {
                        println!("{}", format!("{}:", ASSISTANT_NAME).cyan().bold());
                        print_markdown(&last.text);
                    }
                }
            }
            Err(e) => {
                println!("{}", format!("The assistant request failed: {}", e).red());
            }
        }
    }

    /// Drive the end-meeting flow: summary first, then export or skip.
    async fn run_disconnect(
        &mut self,
        dialog: &VisibilityCell,
        session: &MeetingSession,
    ) -> anyhow::Result<()> {
        if dialog.is_visible() {
            return Ok(());
        }
        dialog.set(true);

        println!();
        println!("{}", "Generating Meeting Summary".bold());
        println!("{}", "Please wait while the meeting is wrapped up...".dimmed());

        let ticker = spawn_progress_ticker(dialog.view());

        let mut flow = TerminationFlow::new(session.meeting_id(), session.user_id());
        let result = match self.gemini.as_ref() {
            Some(gemini) => {
                meeting::summarize_phase(
                    &mut flow,
                    session.feed(),
                    session.transcript(),
                    &self.api,
                    gemini,
                    |record| {
                        println!(
                            "{}",
                            render_record(record, session.user_id(), false, DISPLAY_WIDTH)
                        );
                    },
                )
                .await
            }
            None => Err(TerminationError::Gemini(GeminiError::MissingApiKey)),
        };

        dialog.set(false);
        let _ = ticker.await;

        match result {
            Ok(summary) => {
                println!();
                print_markdown(&summary);
                println!();

                let wants_pdf = self
                    .prompt_yes_no("Do you want to download the meeting summary as a PDF? [y/N]: ")
                    .await?;

                if wants_pdf {
                    match meeting::export_phase(&mut flow, &summary) {
                        Ok(path) => {
                            println!(
                                "{}",
                                format!("Saved meeting summary to {}", path.display()).green()
                            );
                        }
                        Err(e) => {
                            error!("PDF export failed: {}", e);
                            println!("{}", "Failed to generate meeting summary PDF.".red());
                        }
                    }
                } else {
                    meeting::skip_phase(&mut flow);
                    capture::copy_to_clipboard(&summary);
                    println!("Summary copied to the clipboard.");
                }
            }
            Err(e) => {
                error!("Meeting summary failed: {}", e);
                println!("{}", "Failed to generate the meeting summary.".red());
            }
        }

        info!(state = ?flow.state(), "Termination flow finished");
        println!("{}", "Meeting ended.".bold());
        Ok(())
    }

    async fn prompt(
        &mut self,
        label: &str,
        default: Option<&str>,
    ) -> anyhow::Result<Option<String>> {
        match default {
            Some(d) if !d.is_empty() => print!("{} [{}]: ", label, d),
            _ => print!("{}: ", label),
        }
        std::io::stdout().flush()?;

        let Some(line) = self.input.next_line().await? else {
            return Ok(None);
        };
        let line = line.trim().to_string();
        if line == "/quit" {
            return Ok(None);
        }
        if line.is_empty() {
            if let Some(d) = default.filter(|d| !d.is_empty()) {
                return Ok(Some(d.to_string()));
            }
        }
        Ok(Some(line))
    }

    async fn prompt_yes_no(&mut self, prompt: &str) -> anyhow::Result<bool> {
        print!("{}", prompt);
        std::io::stdout().flush()?;

        match self.input.next_line().await? {
            Some(line) => {
                let answer = line.trim().to_ascii_lowercase();
                Ok(answer == "y" || answer == "yes")
            }
            None => Ok(false),
        }
    }
}

/// Capture the clipboard selection as assistant context and echo the
/// owning record with the highlight marker.
fn handle_capture(session: &mut MeetingSession) {
    let transcript_empty = session
        .transcript()
        .lock()
        .map(|t| t.is_empty())
        .unwrap_or(true);
    if transcript_empty {
        println!(
            "{}",
            "Nothing to capture yet, the transcript is empty.".yellow()
        );
        return;
    }

    let Some(context) = capture::capture_selection(session.transcript()) else {
        println!(
            "{}",
            "No transcript match for the current selection.".yellow()
        );
        return;
    };

    let snippet = session.apply_capture(context).snippet.clone();
    info!(snippet_len = snippet.len(), "Captured assistant context");
    println!("{}", format!("Captured context: {}", snippet).yellow());

    if let Some(index) = session.highlighted_index() {
        if let Ok(transcript) = session.transcript().lock() {
            if let Some(record) = transcript.records().get(index) {
                println!(
                    "{}",
                    render_record(record, session.user_id(), true, DISPLAY_WIDTH)
                );
            }
        }
    }
}

/// Print a quiet progress line every few seconds while the dialog is
/// visible.
fn spawn_progress_ticker(mut view: VisibilityView) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                changed = view.changed() => match changed {
                    Some(true) => {}
                    Some(false) | None => break,
                },
                _ = tokio::time::sleep(PROGRESS_INTERVAL) => {
                    println!("{}", "Still working on the summary...".dimmed());
                }
            }
        }
    })
}

fn print_banner() {
    println!();
    println!("{}", "AudioUS".cyan().bold());
    println!("{}", "Live meeting transcripts with an AI assistant.".dimmed());
    println!();
}

fn print_footer(config: &Config, footer: &VisibilityView) {
    if !footer.get() {
        return;
    }
    if let Some(link) = config.links.payment.as_deref() {
        println!("{}", format!("Support AudioUS: {}", link).dimmed());
    }
}

/// Render markdown segments with terminal styling.
fn print_markdown(text: &str) {
    let mut line = String::new();
    let mut after_block = false;

    for segment in parse_markdown(text) {
        match segment {
            MarkdownSegment::Header1(t) => {
                flush_line(&mut line);
                println!("{}", t.bold().underline());
                after_block = true;
            }
            MarkdownSegment::Header2(t) => {
                flush_line(&mut line);
                println!("{}", t.bold());
                after_block = true;
            }
            MarkdownSegment::Header3(t) => {
                flush_line(&mut line);
                println!("{}", t.bold().italic());
                after_block = true;
            }
            MarkdownSegment::BulletPoint(t) => {
                flush_line(&mut line);
                println!("  \u{2022} {}", t);
                after_block = true;
            }
            MarkdownSegment::BlockQuote(t) => {
                flush_line(&mut line);
                println!("{}", format!("  > {}", t).italic());
                after_block = true;
            }
            MarkdownSegment::CodeLine(t) => {
                flush_line(&mut line);
                println!("{}", format!("    {}", t).dimmed());
                after_block = true;
            }
            MarkdownSegment::Bold(t) => {
                line.push_str(&t.bold().to_string());
            }
            MarkdownSegment::Italic(t) => {
                line.push_str(&t.italic().to_string());
            }
            MarkdownSegment::Normal(t) => {
                if t == "\n" {
                    if after_block {
                        after_block = false;
                    } else {
                        println!("{}", line);
                        line.clear();
                    }
                } else {
                    line.push_str(&t);
                }
            }
        }
    }

    flush_line(&mut line);
}

fn flush_line(line: &mut String) {
    if !line.is_empty() {
        println!("{}", line);
        line.clear();
    }
}
