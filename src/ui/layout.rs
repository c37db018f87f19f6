use ratatui::layout::{Constraint, Direction, Layout, Rect};

pub const MAX_INPUT_ROWS: u16 = 6;

/// Transcript on top, a one-row status bar, then the prompt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScreenLayout {
    pub transcript: Rect,
    pub status: Rect,
    pub input: Rect,
}

pub fn split_screen(area: Rect, input_rows: u16) -> ScreenLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(input_rows.clamp(1, MAX_INPUT_ROWS)),
        ])
        .split(area);

    ScreenLayout {
        transcript: chunks[0],
        status: chunks[1],
        input: chunks[2],
    }
}

/// A `width` x `height` box centered in `area`, shrunk to fit.
pub fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}
