//! Global hotkey management
//!
//! Provides the selection-capture shortcut. The hotkey works even when
//! the terminal is in the background, so text selected in any window
//! can be captured as assistant context.

use global_hotkey::{
    hotkey::{Code, HotKey, Modifiers},
    GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState,
};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Action requested through a global hotkey.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HotkeyAction {
    /// Capture the current selection as assistant context
    CaptureContext,
}

/// Initialize global hotkeys for the application
///
/// Currently registered hotkeys:
/// - Control + I: capture selection as assistant context
/// - Command + I (macOS): same action with the platform modifier
pub(crate) fn init_hotkeys() -> Result<GlobalHotKeyManager, String> {
    let manager = GlobalHotKeyManager::new()
        .map_err(|e| format!("Failed to create hotkey manager: {}", e))?;

    let capture_hotkey = HotKey::new(Some(Modifiers::CONTROL), Code::KeyI);

    manager
        .register(capture_hotkey)
        .map_err(|e| format!("Failed to register capture hotkey: {}", e))?;

    info!("Registered global hotkey: Control + I (capture context)");

    #[cfg(target_os = "macos")]
    {
        let capture_hotkey_cmd = HotKey::new(Some(Modifiers::SUPER), Code::KeyI);

        manager
            .register(capture_hotkey_cmd)
            .map_err(|e| format!("Failed to register capture hotkey: {}", e))?;

        info!("Registered global hotkey: Command + I (capture context)");
    }

    Ok(manager)
}

/// Get the hotkey ID for capture (Control + I)
fn capture_hotkey_id() -> u32 {
    let hotkey = HotKey::new(Some(Modifiers::CONTROL), Code::KeyI);
    hotkey.id()
}

/// Get the hotkey ID for capture with the macOS modifier (Command + I)
#[cfg(target_os = "macos")]
fn capture_hotkey_cmd_id() -> u32 {
    let hotkey = HotKey::new(Some(Modifiers::SUPER), Code::KeyI);
    hotkey.id()
}

/// Start listening for hotkey events
///
/// This spawns a background thread (not a tokio task) that polls for
/// hotkey events and forwards the matching action over `action_tx`.
/// The thread exits when the receiving side is dropped.
pub(crate) fn start_hotkey_listener(action_tx: mpsc::Sender<HotkeyAction>) {
    let capture_id = capture_hotkey_id();
    #[cfg(target_os = "macos")]
    let capture_cmd_id = capture_hotkey_cmd_id();

    std::thread::spawn(move || {
        let receiver = GlobalHotKeyEvent::receiver();

        info!("Hotkey listener started on dedicated thread");

        loop {
            // Use try_recv with sleep to avoid blocking issues
            match receiver.try_recv() {
                Ok(event) => {
                    // Only handle key press, ignore key release
                    if event.state != HotKeyState::Pressed {
                        continue;
                    }

                    let is_capture = event.id == capture_id;
                    #[cfg(target_os = "macos")]
                    let is_capture = is_capture || event.id == capture_cmd_id;

                    if is_capture {
                        info!("Capture hotkey pressed");
                        if action_tx.blocking_send(HotkeyAction::CaptureContext).is_err() {
                            warn!("Hotkey channel closed, stopping listener");
                            break;
                        }
                    }
                }
                Err(_) => {
                    // No event, sleep briefly to avoid busy-waiting
                    std::thread::sleep(Duration::from_millis(50));
                }
            }
        }
    });
}
