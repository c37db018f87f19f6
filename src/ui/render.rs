use crate::app::{EntryKind, TranscriptEntry, UiState};
use crate::models::{supports_thinking, AVAILABLE_MODELS};
use crate::ui::input::InputLine;
use crate::ui::layout::{centered_rect, MAX_INPUT_ROWS};
use crate::ui::wrap::{cursor_position, truncate_with_ellipsis, wrap_rows};
use ratatui::{
    layout::{Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use serde_json::Value;

const PROMPT: &str = "> ";
const CONFIRM_ARG_LINES: usize = 8;

/// Rows the prompt needs for `input` at `width` columns, prompt included.
pub fn input_rows(input: &str, width: u16) -> u16 {
    let text_width = width.saturating_sub(PROMPT.len() as u16).max(1) as usize;
    let rows = wrap_rows(input, text_width).len();
    (rows as u16).clamp(1, MAX_INPUT_ROWS)
}

pub fn render_input(frame: &mut Frame<'_>, area: Rect, input: &InputLine, busy: bool) {
    if area.height == 0 || area.width <= PROMPT.len() as u16 {
        return;
    }
    let style = Style::default().bg(Color::Rgb(24, 24, 24));

    if busy && input.is_empty() {
        let hint = Line::styled(
            format!("{PROMPT}waiting for the agent (Ctrl+C to cancel)"),
            style.fg(Color::DarkGray),
        );
        frame.render_widget(Paragraph::new(hint).style(style), area);
        return;
    }

    let width = area.width.saturating_sub(PROMPT.len() as u16).max(1) as usize;
    let rows = wrap_rows(input.buffer(), width);
    let (cursor_row, cursor_col) = cursor_position(input.buffer(), input.cursor(), width);
    let visible = area.height as usize;
    let first = (cursor_row + 1).saturating_sub(visible);

    let lines: Vec<Line<'static>> = (first..first + visible)
        .map(|idx| {
            let prefix = if idx == 0 { PROMPT } else { "  " };
            let row = rows.get(idx).map(String::as_str).unwrap_or_default();
            Line::from(format!("{prefix}{row}"))
        })
        .collect();
    frame.render_widget(Paragraph::new(lines).style(style.fg(Color::Gray)), area);

    if !busy {
        let x = (area.x + PROMPT.len() as u16 + cursor_col as u16)
            .min(area.x + area.width.saturating_sub(1));
        let y = area.y + (cursor_row - first) as u16;
        frame.set_cursor_position((x, y));
    }
}

pub fn render_status(frame: &mut Frame<'_>, area: Rect, status: &str, state: UiState) {
    if area.height == 0 || area.width == 0 {
        return;
    }
    let color = match state {
        UiState::Idle => Color::DarkGray,
        UiState::AwaitingResponse => Color::Cyan,
        UiState::ModelSelect | UiState::ToolConfirm => Color::Yellow,
    };
    frame.render_widget(
        Paragraph::new(truncate_with_ellipsis(status, area.width as usize))
            .style(Style::default().fg(color)),
        area,
    );
}

fn entry_style(entry: &TranscriptEntry) -> Style {
    if entry.is_error {
        return Style::default().fg(Color::Red);
    }
    match entry.kind {
        EntryKind::Welcome => Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
        EntryKind::User => Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
        EntryKind::Agent => Style::default().fg(Color::White),
        EntryKind::Tool => Style::default().fg(Color::Yellow),
        EntryKind::Thought => Style::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::ITALIC),
    }
}

fn entry_text(entry: &TranscriptEntry) -> String {
    let body = if entry.is_folded() {
        let mut lines = entry.content.lines();
        let first = lines.next().unwrap_or_default().to_string();
        if lines.next().is_some() {
            format!("{first} ▸")
        } else {
            first
        }
    } else {
        entry.content.clone()
    };
    match entry.kind {
        EntryKind::User => format!("{PROMPT}{body}"),
        _ => body,
    }
}

/// Wrapped, styled rows for every non-empty entry, separated by a blank row.
/// `owners[row]` names the collapsible entry a row belongs to.
#[derive(Debug, Default)]
pub struct TranscriptLayout {
    pub lines: Vec<Line<'static>>,
    pub owners: Vec<Option<usize>>,
}

pub fn transcript_layout(entries: &[TranscriptEntry], width: usize) -> TranscriptLayout {
    let mut layout = TranscriptLayout::default();
    for (index, entry) in entries.iter().enumerate() {
        if entry.content.is_empty() {
            continue;
        }
        if !layout.lines.is_empty() {
            layout.lines.push(Line::default());
            layout.owners.push(None);
        }
        let style = entry_style(entry);
        let owner = entry.is_collapsible().then_some(index);
        for row in wrap_rows(&entry_text(entry), width) {
            layout.lines.push(Line::styled(row, style));
            layout.owners.push(owner);
        }
    }
    layout
}

/// Where the transcript was drawn, kept so clicks can be traced back to the
/// entry under the pointer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TranscriptView {
    pub area: Rect,
    pub top: usize,
    pub max_scroll: usize,
    owners: Vec<Option<usize>>,
}

impl TranscriptView {
    /// The collapsible entry drawn at screen cell (`column`, `row`).
    pub fn entry_at(&self, column: u16, row: u16) -> Option<usize> {
        if !self.area.contains(Position::new(column, row)) {
            return None;
        }
        let line = self.top + usize::from(row - self.area.y);
        self.owners.get(line).copied().flatten()
    }
}

/// Draws the transcript pinned to the bottom, lifted by `scroll_from_bottom`
/// rows. `max_scroll` in the result is the largest offset that still shows
/// content.
pub fn render_transcript(
    frame: &mut Frame<'_>,
    area: Rect,
    entries: &[TranscriptEntry],
    scroll_from_bottom: usize,
) -> TranscriptView {
    if area.height == 0 || area.width == 0 {
        return TranscriptView::default();
    }
    let TranscriptLayout { lines, owners } = transcript_layout(entries, area.width as usize);
    let max_scroll = lines.len().saturating_sub(area.height as usize);
    let top = u16::try_from(max_scroll - scroll_from_bottom.min(max_scroll)).unwrap_or(u16::MAX);
    frame.render_widget(Paragraph::new(lines).scroll((top, 0)), area);
    TranscriptView {
        area,
        top: usize::from(top),
        max_scroll,
        owners,
    }
}

fn modal(frame: &mut Frame<'_>, width: u16, height: u16, title: String) -> Rect {
    let area = centered_rect(frame.area(), width, height);
    frame.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .style(Style::default().fg(Color::Yellow));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    inner
}

pub fn render_model_select(frame: &mut Frame<'_>, cursor: usize, current: &str) {
    let height = AVAILABLE_MODELS.len() as u16 + 4;
    let inner = modal(frame, 48, height, " Select model ".to_string());

    let mut lines: Vec<Line<'static>> = AVAILABLE_MODELS
        .iter()
        .enumerate()
        .map(|(idx, model)| {
            let marker = if idx == cursor { "› " } else { "  " };
            let mut spans = vec![Span::raw(format!("{marker}{model}"))];
            if supports_thinking(model) {
                spans.push(Span::styled(" thinking", Style::default().fg(Color::Magenta)));
            }
            if *model == current {
                spans.push(Span::styled(" (current)", Style::default().fg(Color::DarkGray)));
            }
            let line = Line::from(spans);
            if idx == cursor {
                line.style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD))
            } else {
                line.style(Style::default().fg(Color::Gray))
            }
        })
        .collect();
    lines.push(Line::default());
    lines.push(Line::styled(
        "↑/↓ move · Enter select · Esc cancel",
        Style::default().fg(Color::DarkGray),
    ));
    frame.render_widget(Paragraph::new(lines), inner);
}

pub fn render_tool_confirm(frame: &mut Frame<'_>, tool_name: &str, arguments: &Value) {
    let pretty = serde_json::to_string_pretty(arguments).unwrap_or_else(|_| arguments.to_string());
    let mut lines = vec![
        Line::styled(
            "The agent wants to run this tool:",
            Style::default().fg(Color::White),
        ),
        Line::default(),
    ];
    let arg_lines: Vec<&str> = pretty.lines().collect();
    for line in arg_lines.iter().take(CONFIRM_ARG_LINES) {
        lines.push(Line::styled(line.to_string(), Style::default().fg(Color::Gray)));
    }
    if arg_lines.len() > CONFIRM_ARG_LINES {
        lines.push(Line::styled("…", Style::default().fg(Color::DarkGray)));
    }
    lines.push(Line::default());
    lines.push(Line::styled(
        "y approve · n or Esc deny",
        Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD),
    ));

    let height = lines.len() as u16 + 2;
    let inner = modal(frame, 72, height, format!(" Run {tool_name}? "));
    frame.render_widget(Paragraph::new(lines), inner);
}
