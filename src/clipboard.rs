//! OS clipboard access
//!
//! On X11 and Wayland the selection lives in the process that set it. Since
//! `q` exits right after copying, a copy of `q` is started in the background
//! to keep serving the selection until another application takes it over.

use crate::error::{Result, ShellqError};
use std::io::Read;

/// Environment variable that turns a `q` process into a selection holder
pub const SELECTION_HOLDER_ENV: &str = "SHELLQ_CLIPBOARD_HOLDER";

/// Write-only clipboard
pub trait Clipboard {
    /// Replaces the clipboard contents with `text`
    ///
    /// # Errors
    ///
    /// Returns a clipboard error when no clipboard is reachable or the
    /// write is refused
    fn copy(&mut self, text: &str) -> Result<()>;
}

/// The platform clipboard
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn copy(&mut self, text: &str) -> Result<()> {
        let mut clipboard = arboard::Clipboard::new().map_err(clipboard_error)?;
        clipboard
            .set_text(text.to_string())
            .map_err(clipboard_error)?;

        #[cfg(target_os = "linux")]
        spawn_selection_holder(text)?;

        tracing::debug!(bytes = text.len(), "Copied to clipboard");
        Ok(())
    }
}

fn clipboard_error(e: arboard::Error) -> anyhow::Error {
    ShellqError::Clipboard(e.to_string()).into()
}

/// Returns true when this process was started to hold the selection
pub fn is_selection_holder() -> bool {
    std::env::var_os(SELECTION_HOLDER_ENV).is_some()
}

/// Reads text from `input` and owns the clipboard selection with it
///
/// On Linux this blocks until another application replaces the selection.
/// Empty input leaves the clipboard untouched.
///
/// # Errors
///
/// Returns a clipboard error when no clipboard is reachable
pub fn hold_selection(mut input: impl Read) -> Result<()> {
    let mut text = String::new();
    input.read_to_string(&mut text)?;
    if text.is_empty() {
        return Ok(());
    }

    let mut clipboard = arboard::Clipboard::new().map_err(clipboard_error)?;

    #[cfg(target_os = "linux")]
    {
        use arboard::SetExtLinux;
        clipboard.set().wait().text(text).map_err(clipboard_error)?;
    }
    #[cfg(not(target_os = "linux"))]
    clipboard.set_text(text).map_err(clipboard_error)?;

    Ok(())
}

#[cfg(target_os = "linux")]
fn spawn_selection_holder(text: &str) -> Result<()> {
    use std::io::Write;

    let exe = std::env::current_exe()?;
    let mut child = selection_holder_command(&exe).spawn()?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(text.as_bytes())?;
    }
    tracing::debug!(pid = child.id(), "Started clipboard selection holder");
    Ok(())
}

#[cfg(target_os = "linux")]
fn selection_holder_command(exe: &std::path::Path) -> std::process::Command {
    use std::os::unix::process::CommandExt;
    use std::process::{Command, Stdio};

    let mut command = Command::new(exe);
    command
        .env(SELECTION_HOLDER_ENV, "1")
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        // Own process group, so signals aimed at the shell's job miss it
        .process_group(0);
    command
}

/// Suggestion shown when copying fails on this platform
pub fn remediation_hint() -> &'static str {
    if cfg!(target_os = "macos") {
        "Make sure the terminal is allowed to access the pasteboard."
    } else if cfg!(target_os = "windows") {
        "Make sure no other application is holding the clipboard open."
    } else {
        "No X11 or Wayland display is reachable. Run q inside a graphical session with DISPLAY or WAYLAND_DISPLAY set."
    }
}
