use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Top-level layout splits the terminal into: title bar (top), content area (middle), status bar (bottom).
pub struct AppLayout {
    pub title_bar: Rect,
    pub content: Rect,
    pub status_bar: Rect,
}

impl AppLayout {
    pub fn new(area: Rect) -> Self {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // title bar
                Constraint::Min(3),    // content area
                Constraint::Length(1), // status bar
            ])
            .split(area);

        Self {
            title_bar: chunks[0],
            content: chunks[1],
            status_bar: chunks[2],
        }
    }
}

/// Search/filter bar above the grid.
pub struct GridLayout {
    pub filter_bar: Rect,
    pub table: Rect,
}

impl GridLayout {
    pub fn new(area: Rect) -> Self {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2), // search + column filter lines
                Constraint::Min(3),    // grid
            ])
            .split(area);

        Self {
            filter_bar: chunks[0],
            table: chunks[1],
        }
    }
}
