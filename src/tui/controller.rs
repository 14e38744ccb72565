//! Interactive session state machine
//!
//! The controller is pure: it consumes [`SessionEvent`]s one at a time and
//! answers each with an [`Effect`] for the event loop to carry out. Network
//! results come back as events too, so the controller never awaits anything
//! and every transition can be exercised without a terminal or a server.

use crate::code_block::{extract_first_code_block, starts_with_code_block};
use crate::hints::{connection_hint, ConnectionHint};
use crate::providers::Message;
use crate::session::Conversation;
use crate::tui::input::{InputEdit, InputField};
use std::fmt;

/// Placeholder before the first query
pub const PLACEHOLDER_INITIAL: &str = "Describe a shell command, or ask a question.";
/// Placeholder when the last command was a pure code reply
pub const PLACEHOLDER_COPY_ALL: &str = "Follow up, ENTER to copy & quit, CTRL+C to quit";
/// Placeholder when the last command came from a reply with prose
pub const PLACEHOLDER_COPY_CODE: &str = "Follow up, ENTER to copy (code only), CTRL+C to quit";
/// Placeholder when no command has been extracted yet
pub const PLACEHOLDER_NO_COMMAND: &str = "Follow up, ENTER or CTRL+C to quit";

/// Spinner frames shown while waiting for the first fragment
pub const SPINNER_FRAMES: [&str; 8] = ["⣾ ", "⣽ ", "⣻ ", "⢿ ", "⡿ ", "⣟ ", "⣯ ", "⣷ "];

/// Screen state of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Prompt is shown and editable
    AwaitingInput,
    /// A query is in flight and nothing has arrived yet
    Loading,
    /// A query is in flight and its reply is rendering live
    StreamingResponse,
    /// The latest command is being written to the clipboard
    CopyAndExit,
    /// The session is over
    Terminated,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::AwaitingInput => "awaiting-input",
            SessionState::Loading => "loading",
            SessionState::StreamingResponse => "streaming-response",
            SessionState::CopyAndExit => "copy-and-exit",
            SessionState::Terminated => "terminated",
        };
        write!(f, "{}", name)
    }
}

/// Input to the state machine
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Enter pressed
    Submit,
    /// Interrupt, escape or end-of-input pressed
    Cancel,
    /// Prompt edited
    Edit(InputEdit),
    /// Periodic timer
    Tick,
    /// Full reply text so far for the in-flight query
    Delta(String),
    /// The in-flight query finished with the complete reply or an error text
    Finished(Result<String, String>),
    /// The clipboard write requested by [`Effect::Copy`] completed
    Copied(Result<(), String>),
}

/// Work the event loop must perform after a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Nothing to do
    None,
    /// Send this conversation to the provider in the background
    StartQuery(Vec<Message>),
    /// Write this text to the clipboard, then report back with `Copied`
    Copy(String),
    /// Restore the terminal and leave
    Exit,
}

/// Output that scrolls above the live view
#[derive(Debug, Clone, PartialEq)]
pub enum Printable {
    /// The submitted query
    Echo(String),
    /// A complete reply, as markdown
    Response {
        /// Reply text
        text: String,
        /// Whether the reply opens with a code fence
        starts_with_code: bool,
    },
    /// A failed query
    ConnectionError {
        /// Provider display name
        provider: &'static str,
        /// Raw error text
        error: String,
        /// Suggested fix, when one is known
        hint: Option<ConnectionHint>,
    },
    /// Informational message
    Notice(String),
    /// A failure that ends the session
    Failure {
        /// What went wrong
        message: String,
        /// How to fix it
        hint: Option<String>,
    },
}

/// State machine behind the interactive prompt
#[derive(Debug)]
pub struct InteractiveController {
    state: SessionState,
    conversation: Conversation,
    provider: &'static str,
    input: InputField,
    latest_command: Option<String>,
    latest_is_pure_code: bool,
    answered: bool,
    live_text: String,
    spinner_frame: usize,
    clipboard_hint: &'static str,
    outbox: Vec<Printable>,
}

impl InteractiveController {
    /// Creates a controller waiting for input
    ///
    /// # Arguments
    ///
    /// * `conversation` - History seeded with the model's prompt
    /// * `provider` - Provider display name for error panels
    /// * `clipboard_hint` - Advice shown when copying fails
    pub fn new(
        conversation: Conversation,
        provider: &'static str,
        clipboard_hint: &'static str,
    ) -> Self {
        Self {
            state: SessionState::AwaitingInput,
            conversation,
            provider,
            input: InputField::new(),
            latest_command: None,
            latest_is_pure_code: false,
            answered: false,
            live_text: String::new(),
            spinner_frame: 0,
            clipboard_hint,
            outbox: Vec::new(),
        }
    }

    /// Submits `query` as if it had been typed, for requests given as
    /// command-line arguments
    pub fn start_with(&mut self, query: &str) -> Effect {
        self.input.set_value(query);
        self.handle(SessionEvent::Submit)
    }

    /// Applies one event
    ///
    /// # Returns
    ///
    /// The effect the caller must carry out. Events that make no sense in
    /// the current state leave it unchanged and return [`Effect::None`].
    pub fn handle(&mut self, event: SessionEvent) -> Effect {
        let before = self.state;
        let effect = match (self.state, event) {
            (SessionState::Terminated, _) => Effect::None,
            (_, SessionEvent::Cancel) => {
                self.state = SessionState::Terminated;
                Effect::Exit
            }
            (SessionState::AwaitingInput, SessionEvent::Submit) => self.submit(),
            (SessionState::AwaitingInput, SessionEvent::Edit(edit)) => {
                self.input.apply(edit);
                Effect::None
            }
            (SessionState::Loading, SessionEvent::Tick) => {
                self.spinner_frame = (self.spinner_frame + 1) % SPINNER_FRAMES.len();
                Effect::None
            }
            (
                SessionState::Loading | SessionState::StreamingResponse,
                SessionEvent::Delta(text),
            ) => {
                self.live_text = text;
                self.state = SessionState::StreamingResponse;
                Effect::None
            }
            (
                SessionState::Loading | SessionState::StreamingResponse,
                SessionEvent::Finished(result),
            ) => {
                self.finish(result);
                Effect::None
            }
            (SessionState::CopyAndExit, SessionEvent::Copied(result)) => {
                self.report_copy(result);
                self.state = SessionState::Terminated;
                Effect::Exit
            }
            _ => Effect::None,
        };

        if self.state != before {
            tracing::debug!(from = %before, to = %self.state, "Session state changed");
        }
        effect
    }

    fn submit(&mut self) -> Effect {
        let query = self.input.value().trim().to_string();

        if query.is_empty() {
            return match &self.latest_command {
                Some(command) => {
                    self.state = SessionState::CopyAndExit;
                    Effect::Copy(command.clone())
                }
                None => {
                    self.state = SessionState::Terminated;
                    Effect::Exit
                }
            };
        }

        self.input.take();
        self.conversation.push_user(query.as_str());
        self.outbox.push(Printable::Echo(query));
        self.live_text.clear();
        self.spinner_frame = 0;
        self.state = SessionState::Loading;
        Effect::StartQuery(self.conversation.messages().to_vec())
    }

    fn finish(&mut self, result: Result<String, String>) {
        self.live_text.clear();
        self.state = SessionState::AwaitingInput;

        match result {
            Ok(reply) => {
                let extraction = extract_first_code_block(&reply);
                if !extraction.is_empty() {
                    self.latest_command = Some(extraction.content);
                    self.latest_is_pure_code = extraction.is_pure_code;
                }
                self.answered = true;
                self.outbox.push(Printable::Response {
                    starts_with_code: starts_with_code_block(&reply),
                    text: reply.clone(),
                });
                self.conversation.push_assistant(reply);
            }
            Err(error) => {
                tracing::warn!(provider = self.provider, error = %error, "Query failed");
                self.outbox.push(Printable::ConnectionError {
                    provider: self.provider,
                    hint: connection_hint(self.provider, &error),
                    error,
                });
            }
        }
    }

    fn report_copy(&mut self, result: Result<(), String>) {
        match result {
            Ok(()) => {
                let message = if self.latest_is_pure_code {
                    "Copied to clipboard."
                } else {
                    "Copied only code to clipboard."
                };
                self.outbox.push(Printable::Notice(message.to_string()));
            }
            Err(error) => {
                self.outbox.push(Printable::Failure {
                    message: format!("Failed to copy to clipboard: {}", error),
                    hint: Some(self.clipboard_hint.to_string()),
                });
            }
        }
    }

    /// Takes everything queued for the scrollback, oldest first
    pub fn drain_output(&mut self) -> Vec<Printable> {
        std::mem::take(&mut self.outbox)
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Prompt text shown while the input is empty
    pub fn placeholder(&self) -> &'static str {
        match (&self.latest_command, self.answered) {
            (Some(_), _) if self.latest_is_pure_code => PLACEHOLDER_COPY_ALL,
            (Some(_), _) => PLACEHOLDER_COPY_CODE,
            (None, true) => PLACEHOLDER_NO_COMMAND,
            (None, false) => PLACEHOLDER_INITIAL,
        }
    }

    /// Prompt contents
    pub fn input(&self) -> &InputField {
        &self.input
    }

    /// Reply text received so far for the in-flight query
    pub fn live_text(&self) -> &str {
        &self.live_text
    }

    /// Current spinner frame
    pub fn spinner(&self) -> &'static str {
        SPINNER_FRAMES[self.spinner_frame]
    }

    /// Command that Enter on an empty prompt would copy
    pub fn latest_command(&self) -> Option<&str> {
        self.latest_command.as_deref()
    }

    /// Conversation history
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }
}
