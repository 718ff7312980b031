pub mod layout;
pub mod theme;

/// Which part of the screen receives keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Grid,
    FilterBar,
    ColumnSelector,
    DraftForm,
}

/// Centered popup rect no larger than `width` x `height`, leaving `margin`
/// cells around it on small terminals.
pub fn centered_popup(area: ratatui::layout::Rect, width: u16, height: u16, margin: u16) -> ratatui::layout::Rect {
    let width = width.min(area.width.saturating_sub(margin));
    let height = height.min(area.height.saturating_sub(margin));
    let x = (area.width.saturating_sub(width)) / 2;
    let y = (area.height.saturating_sub(height)) / 2;
    ratatui::layout::Rect::new(area.x + x, area.y + y, width, height)
}
