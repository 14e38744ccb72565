//! Drawing of the live viewport and of scrollback output

use crate::code_block::starts_with_code_block;
use crate::error::Result;
use crate::tui::controller::{InteractiveController, Printable, SessionState};
use crate::tui::markdown;
use crate::tui::terminal::Tui;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Widget};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

/// Widest the content is ever rendered
pub const MAX_WIDTH: u16 = 100;
/// Columns left free on terminals narrower than [`MAX_WIDTH`]
pub const SAFE_ZONE_PADDING: u16 = 10;

/// Lines inserted above the viewport per call
const INSERT_CHUNK: usize = 16;

const PROMPT: &str = "> ";

fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

/// Content width for a terminal `columns` wide
pub fn content_width(columns: u16) -> u16 {
    if columns < MAX_WIDTH {
        columns.saturating_sub(SAFE_ZONE_PADDING).max(20)
    } else {
        MAX_WIDTH
    }
}

/// Draws the live part of the screen for the current state
pub fn draw(frame: &mut Frame<'_>, controller: &InteractiveController, width: u16) {
    let area = frame.area();
    let area = Rect {
        width: area.width.min(width),
        ..area
    };

    match controller.state() {
        SessionState::AwaitingInput => draw_prompt(frame, controller, area),
        SessionState::Loading => {
            let spinner = Span::styled(controller.spinner(), Style::default().fg(Color::Indexed(205)));
            frame.render_widget(Paragraph::new(Line::from(spinner)), area);
        }
        SessionState::StreamingResponse => {
            let lines = response_lines(controller.live_text(), width);
            let skip = lines.len().saturating_sub(area.height as usize);
            let tail: Vec<Line<'static>> = lines.into_iter().skip(skip).collect();
            frame.render_widget(Paragraph::new(tail), area);
        }
        SessionState::CopyAndExit | SessionState::Terminated => {}
    }
}

fn draw_prompt(frame: &mut Frame<'_>, controller: &InteractiveController, area: Rect) {
    let input = controller.input();
    let line = if input.is_empty() {
        Line::from(vec![
            Span::raw(PROMPT),
            Span::styled(controller.placeholder(), dim()),
        ])
    } else {
        Line::from(vec![Span::raw(PROMPT), Span::raw(input.value().to_string())])
    };
    frame.render_widget(Paragraph::new(line), area);

    let before_cursor: String = input.value().chars().take(input.cursor()).collect();
    let x = (PROMPT.width() + before_cursor.width()) as u16;
    let x = area.x + x.min(area.width.saturating_sub(1));
    frame.set_cursor_position((x, area.y));
}

/// Renders reply markdown, separating prose replies from the echo line
pub fn response_lines(text: &str, width: u16) -> Vec<Line<'static>> {
    let mut lines = markdown::render(text, width);
    if !starts_with_code_block(text) {
        lines.insert(0, Line::default());
    }
    lines
}

/// Lines for one scrollback entry
pub fn printable_lines(printable: &Printable, width: u16) -> Vec<Line<'static>> {
    match printable {
        Printable::Echo(query) => vec![Line::from(Span::styled(format!("{}{}", PROMPT, query), dim()))],
        Printable::Response {
            text,
            starts_with_code,
        } => {
            let mut lines = markdown::render(text, width);
            if !starts_with_code {
                lines.insert(0, Line::default());
            }
            lines
        }
        Printable::ConnectionError {
            provider,
            error,
            hint,
        } => {
            let red = Style::default().fg(Color::Red);
            let green = Style::default().fg(Color::Green);
            let mut lines = vec![
                Line::default(),
                Line::from(Span::styled(
                    format!("  Error: Failed to connect to {}.", provider),
                    red,
                )),
                Line::default(),
            ];
            lines.extend(
                error
                    .lines()
                    .map(|l| Line::from(Span::styled(format!("  {}", l), dim()))),
            );
            if let Some(hint) = hint {
                lines.push(Line::default());
                lines.push(Line::from(vec![
                    Span::raw("  "),
                    Span::styled("Hint:", green),
                    Span::raw(format!(" {}", hint.message)),
                ]));
                lines.push(Line::default());
                lines.push(Line::from(vec![
                    Span::raw("  "),
                    Span::styled("->", green),
                    Span::raw(" "),
                    Span::styled(hint.link, dim()),
                ]));
            }
            lines.push(Line::default());
            lines
        }
        Printable::Notice(message) => vec![Line::from(Span::styled(message.clone(), dim()))],
        Printable::Failure { message, hint } => {
            let mut lines = vec![Line::from(Span::styled(
                format!("Error: {}", message),
                Style::default().fg(Color::Red),
            ))];
            if let Some(hint) = hint {
                lines.push(Line::from(Span::styled(hint.clone(), dim())));
            }
            lines
        }
    }
}

/// Prints entries above the live viewport, oldest first
pub fn print_above(terminal: &mut Tui, printables: Vec<Printable>, width: u16) -> Result<()> {
    for printable in &printables {
        let lines = printable_lines(printable, width);
        for chunk in lines.chunks(INSERT_CHUNK) {
            let chunk = chunk.to_vec();
            terminal.insert_before(chunk.len() as u16, |buf| {
                Paragraph::new(chunk).render(buf.area, buf);
            })?;
        }
    }
    Ok(())
}
