use ratatui::style::{Color, Modifier, Style};

/// Color palette and style constants for the TUI.
pub struct Theme;

impl Theme {
    // Title bar
    pub fn title_bar() -> Style {
        Style::default()
            .fg(Color::White)
            .bg(Color::Black)
            .add_modifier(Modifier::BOLD)
    }

    // Grid
    pub fn table_header() -> Style {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    }

    pub fn table_header_sorted() -> Style {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    }

    pub fn table_row_normal() -> Style {
        Style::default().fg(Color::White)
    }

    pub fn table_row_selected() -> Style {
        Style::default().fg(Color::Black).bg(Color::LightCyan)
    }

    pub fn table_row_alt() -> Style {
        Style::default().fg(Color::White).bg(Color::Rgb(25, 25, 30))
    }

    pub fn cell_selected() -> Style {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    }

    pub fn cell_editing() -> Style {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    }

    pub fn cell_read_only() -> Style {
        Style::default().fg(Color::DarkGray)
    }

    // Borders and panels
    pub fn border_focused() -> Style {
        Style::default().fg(Color::Cyan)
    }

    pub fn border_unfocused() -> Style {
        Style::default().fg(Color::DarkGray)
    }

    // Status bar
    pub fn status_bar() -> Style {
        Style::default().fg(Color::White).bg(Color::DarkGray)
    }

    pub fn status_saving() -> Style {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    }

    pub fn status_dirty() -> Style {
        Style::default()
            .fg(Color::LightMagenta)
            .add_modifier(Modifier::BOLD)
    }

    pub fn status_error() -> Style {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    }

    pub fn status_key_hint() -> Style {
        Style::default().fg(Color::DarkGray)
    }

    // Filter bar
    pub fn filter_active() -> Style {
        Style::default().fg(Color::Yellow)
    }

    pub fn filter_inactive() -> Style {
        Style::default().fg(Color::DarkGray)
    }

    // Help popup
    pub fn help_key() -> Style {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    }

    pub fn help_description() -> Style {
        Style::default().fg(Color::White)
    }

    // Forms and lists
    pub fn label() -> Style {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    }

    pub fn value() -> Style {
        Style::default().fg(Color::White)
    }

    pub fn missing_field() -> Style {
        Style::default().fg(Color::Red)
    }

    pub fn title() -> Style {
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD)
    }
}
