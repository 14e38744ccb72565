//! Terminal setup and teardown for the inline viewport
//!
//! The session renders into a few rows at the bottom of the normal screen
//! rather than the alternate screen, so finished output stays in the
//! terminal's scrollback after `q` exits.

use crate::error::{Result, ShellqError};
use crossterm::event::{DisableBracketedPaste, EnableBracketedPaste};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use ratatui::backend::CrosstermBackend;
use ratatui::{Terminal, TerminalOptions, Viewport};
use std::io::{self, Stdout};

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Rows reserved for the live viewport
pub const VIEWPORT_HEIGHT: u16 = 12;

fn terminal_error(error: io::Error) -> ShellqError {
    ShellqError::Terminal(error.to_string())
}

/// Current terminal size as `(columns, rows)`
pub fn size() -> Result<(u16, u16)> {
    Ok(crossterm::terminal::size().map_err(terminal_error)?)
}

/// Enters raw mode and creates the inline viewport
pub fn init() -> Result<Tui> {
    let (_, rows) = size()?;
    let height = VIEWPORT_HEIGHT.min(rows.saturating_sub(1)).max(1);

    enable_raw_mode().map_err(terminal_error)?;
    execute!(io::stdout(), EnableBracketedPaste).map_err(terminal_error)?;

    let backend = CrosstermBackend::new(io::stdout());
    let terminal = Terminal::with_options(
        backend,
        TerminalOptions {
            viewport: Viewport::Inline(height),
        },
    )
    .map_err(terminal_error)?;

    Ok(terminal)
}

/// Leaves raw mode
pub fn restore() -> Result<()> {
    execute!(io::stdout(), DisableBracketedPaste).map_err(terminal_error)?;
    disable_raw_mode().map_err(terminal_error)?;
    Ok(())
}

/// Clears the viewport and restores the terminal
pub fn finish(mut terminal: Tui) -> Result<()> {
    terminal.clear().map_err(terminal_error)?;
    terminal.show_cursor().map_err(terminal_error)?;
    restore()
}

/// Install panic hook to restore terminal on panic
pub fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore();
        original_hook(panic_info);
    }));
}
