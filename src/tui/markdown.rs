//! Markdown to styled terminal lines
//!
//! Replies are rendered with a two-column margin and word wrapped to the
//! content width. Code blocks are never wrapped or reflowed so commands
//! stay exactly as the model wrote them.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

const MARGIN: &str = "  ";

/// Renders markdown into lines no wider than `width` columns
///
/// Input may be an incomplete prefix of a document; an unterminated code
/// fence renders as a code block running to the end.
pub fn render(markdown: &str, width: u16) -> Vec<Line<'static>> {
    let mut renderer = Renderer::new(width as usize);
    let parser = Parser::new_ext(markdown, Options::ENABLE_STRIKETHROUGH);
    for event in parser {
        renderer.handle(event);
    }
    renderer.finish()
}

/// Simple style stack for tracking nested inline styles
#[derive(Debug, Default)]
struct StyleStack {
    styles: Vec<Style>,
}

impl StyleStack {
    fn push(&mut self, style: Style) {
        self.styles.push(style);
    }

    fn pop(&mut self) {
        self.styles.pop();
    }

    fn current(&self) -> Style {
        self.styles
            .iter()
            .fold(Style::default(), |acc, s| acc.patch(*s))
    }
}

struct Renderer {
    width: usize,
    lines: Vec<Line<'static>>,
    segments: Vec<Span<'static>>,
    styles: StyleStack,
    lists: Vec<Option<u64>>,
    item_prefix: Option<String>,
    quote_depth: usize,
    in_code_block: bool,
}

fn code_style() -> Style {
    Style::default().fg(Color::LightYellow)
}

fn inline_code_style() -> Style {
    Style::default().fg(Color::LightRed)
}

fn heading_style(level: HeadingLevel) -> Style {
    let style = Style::default().add_modifier(Modifier::BOLD);
    match level {
        HeadingLevel::H1 => style.fg(Color::Cyan).add_modifier(Modifier::UNDERLINED),
        HeadingLevel::H2 => style.fg(Color::Cyan),
        _ => style,
    }
}

impl Renderer {
    fn new(width: usize) -> Self {
        Self {
            width: width.max(MARGIN.len() + 10),
            lines: Vec::new(),
            segments: Vec::new(),
            styles: StyleStack::default(),
            lists: Vec::new(),
            item_prefix: None,
            quote_depth: 0,
            in_code_block: false,
        }
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if self.in_code_block {
                    self.code_text(&text);
                } else {
                    self.push_text(&text, self.styles.current());
                }
            }
            Event::Code(code) => self.push_text(&code, inline_code_style()),
            Event::SoftBreak => self.push_text(" ", self.styles.current()),
            Event::HardBreak => self.flush(),
            Event::Rule => {
                self.flush();
                let rule = "─".repeat(self.width.saturating_sub(MARGIN.len()).min(40));
                self.lines.push(Line::from(vec![
                    Span::raw(MARGIN),
                    Span::styled(rule, Style::default().fg(Color::DarkGray)),
                ]));
                self.blank();
            }
            Event::Html(html) | Event::InlineHtml(html) => {
                self.push_text(&html, self.styles.current())
            }
            Event::TaskListMarker(done) => {
                self.push_text(if done { "[x] " } else { "[ ] " }, self.styles.current())
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush();
                self.styles.push(heading_style(level));
            }
            Tag::CodeBlock(kind) => {
                self.flush();
                self.in_code_block = true;
                if let CodeBlockKind::Fenced(lang) = kind {
                    if !lang.is_empty() {
                        tracing::trace!(language = %lang, "Rendering code block");
                    }
                }
            }
            Tag::List(start) => {
                self.flush();
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush();
                let depth = self.lists.len().saturating_sub(1);
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{}. ", n);
                        *n += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                self.item_prefix = Some(format!("{}{}", "  ".repeat(depth), marker));
            }
            Tag::BlockQuote(_) => {
                self.flush();
                self.quote_depth += 1;
                self.styles.push(Style::default().add_modifier(Modifier::ITALIC));
            }
            Tag::Emphasis => self.styles.push(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.styles.push(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => self
                .styles
                .push(Style::default().add_modifier(Modifier::CROSSED_OUT)),
            Tag::Link { .. } => self.styles.push(
                Style::default()
                    .fg(Color::Blue)
                    .add_modifier(Modifier::UNDERLINED),
            ),
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                self.flush();
                if self.lists.is_empty() {
                    self.blank();
                }
            }
            TagEnd::Heading(_) => {
                self.flush();
                self.styles.pop();
                self.blank();
            }
            TagEnd::CodeBlock => {
                self.in_code_block = false;
                self.blank();
            }
            TagEnd::List(_) => {
                self.flush();
                self.lists.pop();
                if self.lists.is_empty() {
                    self.blank();
                }
            }
            TagEnd::Item => self.flush(),
            TagEnd::BlockQuote(_) => {
                self.flush();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.styles.pop();
                self.blank();
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link => {
                self.styles.pop()
            }
            _ => {}
        }
    }

    fn prefix(&self) -> String {
        format!("{}{}", MARGIN, "│ ".repeat(self.quote_depth))
    }

    fn code_text(&mut self, text: &str) {
        let prefix = self.prefix();
        for line in text.lines() {
            self.lines.push(Line::from(vec![
                Span::raw(prefix.clone()),
                Span::styled(line.to_string(), code_style()),
            ]));
        }
    }

    fn push_text(&mut self, text: &str, style: Style) {
        if !text.is_empty() {
            self.segments.push(Span::styled(text.to_string(), style));
        }
    }

    fn blank(&mut self) {
        if self.lines.last().is_some_and(|line| line.width() > 0) {
            self.lines.push(Line::default());
        }
    }

    /// Wraps the pending inline segments into lines
    fn flush(&mut self) {
        let item_prefix = self.item_prefix.take();
        if self.segments.is_empty() {
            if let Some(marker) = item_prefix {
                self.item_prefix = Some(marker);
            }
            return;
        }

        let base = self.prefix();
        let first_prefix = format!("{}{}", base, item_prefix.as_deref().unwrap_or(""));
        let rest_prefix = format!(
            "{}{}",
            base,
            " ".repeat(item_prefix.as_deref().map_or(0, UnicodeWidthStr::width))
        );
        let segments = std::mem::take(&mut self.segments);
        let wrapped = wrap_segments(segments, self.width, &first_prefix, &rest_prefix);
        self.lines.extend(wrapped);
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush();
        while self.lines.last().is_some_and(|line| line.width() == 0) {
            self.lines.pop();
        }
        self.lines
    }
}

/// Word wraps styled segments
fn wrap_segments(
    segments: Vec<Span<'static>>,
    width: usize,
    first_prefix: &str,
    rest_prefix: &str,
) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut current: Vec<Span<'static>> = vec![Span::raw(first_prefix.to_string())];
    let mut used = first_prefix.width();
    let mut line_has_words = false;

    for segment in segments {
        let style = segment.style;
        for token in split_keep_whitespace(&segment.content) {
            let is_space = token.chars().all(char::is_whitespace);
            let token_width = token.width();

            if is_space {
                if line_has_words && used + token_width <= width {
                    current.push(Span::styled(token.to_string(), style));
                    used += token_width;
                }
                continue;
            }

            if line_has_words && used + token_width > width {
                lines.push(Line::from(std::mem::take(&mut current)));
                current.push(Span::raw(rest_prefix.to_string()));
                used = rest_prefix.width();
                line_has_words = false;
            }

            let mut remaining = token;
            while used + remaining.width() > width && remaining.chars().count() > 1 {
                let room = width.saturating_sub(used).max(1);
                let split = split_at_width(remaining, room);
                current.push(Span::styled(remaining[..split].to_string(), style));
                lines.push(Line::from(std::mem::take(&mut current)));
                current.push(Span::raw(rest_prefix.to_string()));
                used = rest_prefix.width();
                remaining = &remaining[split..];
            }
            current.push(Span::styled(remaining.to_string(), style));
            used += remaining.width();
            line_has_words = true;
        }
    }

    if line_has_words {
        lines.push(Line::from(current));
    }
    lines
}

/// Splits text into alternating runs of whitespace and non-whitespace
fn split_keep_whitespace(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut in_space: Option<bool> = None;
    for (i, c) in text.char_indices() {
        let space = c.is_whitespace();
        if in_space.is_some_and(|s| s != space) {
            tokens.push(&text[start..i]);
            start = i;
        }
        in_space = Some(space);
    }
    if start < text.len() {
        tokens.push(&text[start..]);
    }
    tokens
}

/// Byte index of the longest prefix of `text` fitting in `columns`, at least
/// one character
fn split_at_width(text: &str, columns: usize) -> usize {
    let mut used = 0;
    for (i, c) in text.char_indices() {
        let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > columns && i > 0 {
            return i;
        }
        used += w;
    }
    text.len()
}
