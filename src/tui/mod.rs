//! Interactive terminal session
//!
//! [`controller`] holds the state machine and is free of I/O. This module
//! wires it to the terminal: events go in, effects come out and are carried
//! out here (spawning the query task, copying to the clipboard, exiting).

pub mod controller;
pub mod event;
pub mod input;
pub mod markdown;
pub mod terminal;
pub mod view;

use crate::clipboard::{self, Clipboard, SystemClipboard};
use crate::error::Result;
use crate::providers::Message;
use crate::session::{Conversation, LlmClient};
use controller::{Effect, InteractiveController, SessionEvent};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use event::{AppEvent, EventHandler};
use input::InputEdit;
use std::time::Duration;
use tokio::sync::mpsc;

/// Pause before tearing down so the final output is flushed
const EXIT_DELAY: Duration = Duration::from_millis(50);

/// Runs the interactive prompt until the user quits
///
/// # Arguments
///
/// * `client` - Client for the selected model
/// * `prompt` - The model's seed messages
/// * `initial_query` - Request given on the command line, submitted at once
///
/// # Errors
///
/// Returns a terminal error if the terminal cannot be set up or drawn.
/// Query failures are shown in the session and do not end it.
pub async fn run_interactive(
    client: LlmClient,
    prompt: Vec<Message>,
    initial_query: Option<String>,
) -> Result<()> {
    terminal::install_panic_hook();
    let mut tui = terminal::init()?;
    let result = event_loop(&mut tui, client, prompt, initial_query).await;
    let finished = terminal::finish(tui);
    result.and(finished)
}

async fn event_loop(
    tui: &mut terminal::Tui,
    client: LlmClient,
    prompt: Vec<Message>,
    initial_query: Option<String>,
) -> Result<()> {
    let mut events = EventHandler::new();
    let mut controller = InteractiveController::new(
        Conversation::new(prompt),
        client.provider_name(),
        clipboard::remediation_hint(),
    );
    let mut width = view::content_width(terminal::size()?.0);

    let mut effect = match initial_query {
        Some(query) if !query.trim().is_empty() => controller.start_with(&query),
        _ => Effect::None,
    };

    loop {
        // Copy reports back synchronously, so settle effects before drawing
        while let Effect::Copy(text) = effect {
            let copied = SystemClipboard.copy(&text).map_err(|e| e.to_string());
            effect = controller.handle(SessionEvent::Copied(copied));
        }

        view::print_above(tui, controller.drain_output(), width)?;

        match effect {
            Effect::StartQuery(messages) => spawn_query(client.clone(), messages, events.sender()),
            Effect::Exit => {
                tokio::time::sleep(EXIT_DELAY).await;
                return Ok(());
            }
            Effect::None | Effect::Copy(_) => {}
        }

        tui.draw(|frame| view::draw(frame, &controller, width))?;

        let Some(app_event) = events.next().await else {
            return Ok(());
        };
        effect = match app_event {
            AppEvent::Resize(columns, _) => {
                width = view::content_width(columns);
                tui.autoresize()?;
                Effect::None
            }
            AppEvent::Paste(text) => {
                for c in text.chars() {
                    controller.handle(SessionEvent::Edit(InputEdit::Insert(c)));
                }
                Effect::None
            }
            AppEvent::Key(key) => match key_to_event(key) {
                Some(event) => controller.handle(event),
                None => Effect::None,
            },
            AppEvent::Tick => controller.handle(SessionEvent::Tick),
            AppEvent::Delta(text) => controller.handle(SessionEvent::Delta(text)),
            AppEvent::Finished(result) => controller.handle(SessionEvent::Finished(result)),
        };
    }
}

fn spawn_query(client: LlmClient, messages: Vec<Message>, tx: mpsc::UnboundedSender<AppEvent>) {
    tokio::spawn(async move {
        let updates = tx.clone();
        let result = client
            .stream_reply(&messages, |text| {
                let _ = updates.send(AppEvent::Delta(text.to_string()));
            })
            .await
            .map_err(|e| e.to_string());
        let _ = tx.send(AppEvent::Finished(result));
    });
}

/// Maps a key press to a controller event
pub fn key_to_event(key: KeyEvent) -> Option<SessionEvent> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c') | KeyCode::Char('d') if ctrl => Some(SessionEvent::Cancel),
        KeyCode::Esc => Some(SessionEvent::Cancel),
        KeyCode::Enter => Some(SessionEvent::Submit),
        _ => InputEdit::from_key(key).map(SessionEvent::Edit),
    }
}
