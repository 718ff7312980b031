use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use crate::event::{Action, AppMessage};
use crate::ui::centered_popup;
use crate::ui::theme::Theme;

use super::Component;

const POPUP_WIDTH: u16 = 68;
const POPUP_HEIGHT: u16 = 28;
const POPUP_MARGIN: u16 = 4;

pub struct HelpPopup {
    pub visible: bool,
}

impl HelpPopup {
    pub fn new() -> Self {
        Self { visible: false }
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    fn keybindings() -> Vec<(&'static str, &'static str)> {
        vec![
            ("q", "Quit (twice with unsaved changes)"),
            ("?", "Toggle this help"),
            ("j/k or Up/Down", "Select row"),
            ("h/l or Left/Right", "Select column"),
            ("g / G", "First / last row on page"),
            ("Enter or e", "Edit cell (Enter commits, Esc cancels)"),
            ("s", "Sort by column (asc, desc, off)"),
            ("/", "Search all columns"),
            ("f", "Column filter, e.g. year >= 2020 AND status = 'sold'"),
            ("x", "Clear search and filters"),
            ("c", "Choose visible columns"),
            ("n / p, PgDn / PgUp", "Next / previous page"),
            ("+ / -", "Larger / smaller pages"),
            ("a", "Add a row"),
            ("w", "Save changes"),
            ("R", "Reset sort, filters, columns and page"),
            ("Esc", "Cancel / close popup"),
        ]
    }
}

impl Component for HelpPopup {
    fn handle_key(&mut self, key: KeyEvent) -> Option<Action> {
        if !self.visible {
            return None;
        }

        match key.code {
            KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') => {
                self.visible = false;
                None
            }
            _ => None, // swallow everything while open
        }
    }

    fn handle_message(&mut self, _msg: &AppMessage) -> Option<Action> {
        None
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, _focused: bool) {
        if !self.visible {
            return;
        }

        let popup = centered_popup(area, POPUP_WIDTH, POPUP_HEIGHT, POPUP_MARGIN);
        frame.render_widget(Clear, popup);

        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::styled(" lotgrid keyboard shortcuts", Theme::title()));
        lines.push(Line::raw(""));

        for (key, desc) in Self::keybindings() {
            lines.push(Line::from(vec![
                Span::styled(format!("  {:20}", key), Theme::help_key()),
                Span::styled(desc, Theme::help_description()),
            ]));
        }

        lines.push(Line::raw(""));
        lines.push(Line::styled(
            " Press ? or Esc to close",
            Theme::status_key_hint(),
        ));

        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Help ")
            .border_style(Theme::border_focused());

        let paragraph = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false });

        frame.render_widget(paragraph, popup);
    }

    fn is_input_mode(&self) -> bool {
        self.visible
    }
}
