use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState};
use ratatui::Frame;

use crate::event::{Action, AppMessage};
use crate::ui::centered_popup;
use crate::ui::theme::Theme;

use super::Component;

const POPUP_WIDTH: u16 = 50;
const POPUP_HEIGHT: u16 = 20;
const POPUP_MARGIN: u16 = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
struct ColumnEntry {
    key: String,
    label: String,
    visible: bool,
}

/// Popup listing every column with a visibility checkbox.
pub struct ColumnSelector {
    entries: Vec<ColumnEntry>,
    list_state: ListState,
    pub visible: bool,
}

impl ColumnSelector {
    pub fn new() -> Self {
        Self {
            entries: vec![],
            list_state: ListState::default(),
            visible: false,
        }
    }

    /// Replace the entries with `(key, label, visible)` triples, keeping the
    /// highlighted row where possible.
    pub fn set_columns<I>(&mut self, columns: I)
    where
        I: IntoIterator<Item = (String, String, bool)>,
    {
        self.entries = columns
            .into_iter()
            .map(|(key, label, visible)| ColumnEntry {
                key,
                label,
                visible,
            })
            .collect();

        let selected = match self.list_state.selected() {
            _ if self.entries.is_empty() => None,
            Some(i) => Some(i.min(self.entries.len() - 1)),
            None => Some(0),
        };
        self.list_state.select(selected);
    }

    pub fn show(&mut self) {
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    /// Keys of the checked columns, in display order.
    pub fn visible_keys(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.visible)
            .map(|e| e.key.clone())
            .collect()
    }
}

impl Component for ColumnSelector {
    fn handle_key(&mut self, key: KeyEvent) -> Option<Action> {
        if !self.visible {
            return None;
        }

        match key.code {
            KeyCode::Esc | KeyCode::Char('c') => {
                self.visible = false;
                None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                let i = self.list_state.selected().unwrap_or(0);
                if i > 0 {
                    self.list_state.select(Some(i - 1));
                }
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let i = self.list_state.selected().unwrap_or(0);
                if i + 1 < self.entries.len() {
                    self.list_state.select(Some(i + 1));
                }
                None
            }
            KeyCode::Char(' ') | KeyCode::Enter => {
                let entry = self.entries.get_mut(self.list_state.selected()?)?;
                entry.visible = !entry.visible;
                Some(Action::ToggleColumn(entry.key.clone()))
            }
            _ => None,
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

        let items: Vec<ListItem> = self
            .entries
            .iter()
            .map(|entry| {
                let checkbox = if entry.visible { "[x]" } else { "[ ]" };
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{checkbox} "), Theme::label()),
                    Span::styled(entry.label.clone(), Theme::value()),
                    Span::styled(format!("  ({})", entry.key), Theme::status_key_hint()),
                ]))
            })
            .collect();

        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Columns (space=toggle, esc=close) ")
            .border_style(Theme::border_focused());

        let list = List::new(items)
            .block(block)
            .highlight_style(Theme::table_row_selected());

        frame.render_stateful_widget(list, popup, &mut self.list_state);
    }

    fn is_input_mode(&self) -> bool {
        self.visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn sample() -> ColumnSelector {
        let mut cs = ColumnSelector::new();
        cs.set_columns(vec![
            ("id".to_string(), "ID".to_string(), true),
            ("make".to_string(), "Make".to_string(), false),
            ("price".to_string(), "Price".to_string(), true),
        ]);
        cs
    }

    #[test]
    fn column_selector_initial() {
        let cs = ColumnSelector::new();
        assert!(!cs.visible);
        assert!(cs.entries.is_empty());
        assert!(cs.list_state.selected().is_none());
    }

    #[test]
    fn visible_keys_follow_checkboxes() {
        let cs = sample();
        assert_eq!(cs.visible_keys(), vec!["id", "price"]);
        assert_eq!(cs.list_state.selected(), Some(0));
    }

    #[test]
    fn toggle_emits_column_key() {
        let mut cs = sample();
        cs.show();
        cs.handle_key(key(KeyCode::Down));
        let action = cs.handle_key(key(KeyCode::Char(' ')));
        assert_eq!(action, Some(Action::ToggleColumn("make".into())));
        assert_eq!(cs.visible_keys(), vec!["id", "make", "price"]);
    }

    #[test]
    fn hidden_selector_ignores_keys() {
        let mut cs = sample();
        assert_eq!(cs.handle_key(key(KeyCode::Enter)), None);
    }

    #[test]
    fn escape_closes() {
        let mut cs = sample();
        cs.show();
        cs.handle_key(key(KeyCode::Esc));
        assert!(!cs.visible);
        assert!(!cs.is_input_mode());
    }

    #[test]
    fn refresh_keeps_selection_in_range() {
        let mut cs = sample();
        cs.list_state.select(Some(2));
        cs.set_columns(vec![("id".to_string(), "ID".to_string(), true)]);
        assert_eq!(cs.list_state.selected(), Some(0));
    }
}
