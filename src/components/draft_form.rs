use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use crate::event::{Action, AppMessage};
use crate::grid::Draft;
use crate::ui::centered_popup;
use crate::ui::theme::Theme;

use super::Component;

const POPUP_WIDTH: u16 = 60;
const POPUP_MARGIN: u16 = 4;
const LABEL_WIDTH: usize = 16;

/// Add-row popup. Owns the draft so typed values survive closing the form.
pub struct DraftForm {
    pub draft: Draft,
    /// `(key, label)` for each draft field, in column order.
    labels: Vec<(String, String)>,
    selected: usize,
    /// Cursor within the selected field, in characters.
    cursor: usize,
    error: Option<String>,
    /// Fields flagged by the last rejected submit.
    flagged: Vec<String>,
    pub visible: bool,
}

impl DraftForm {
    pub fn new(draft: Draft, labels: Vec<(String, String)>) -> Self {
        Self {
            draft,
            labels,
            selected: 0,
            cursor: 0,
            error: None,
            flagged: vec![],
            visible: false,
        }
    }

    pub fn show(&mut self) {
        self.visible = true;
        self.cursor = self.current_len();
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    /// Show why the last submit was rejected. `missing` fields are highlighted.
    pub fn set_error(&mut self, message: impl Into<String>, missing: Vec<String>) {
        self.error = Some(message.into());
        self.flagged = missing;
    }

    /// Clear the form after a successful insert.
    pub fn clear(&mut self) {
        self.draft.reset();
        self.error = None;
        self.flagged.clear();
        self.selected = 0;
        self.cursor = 0;
    }

    fn selected_key(&self) -> Option<&str> {
        self.labels.get(self.selected).map(|(k, _)| k.as_str())
    }

    fn current_len(&self) -> usize {
        self.selected_key()
            .and_then(|k| self.draft.get(k))
            .map_or(0, |v| v.chars().count())
    }

    fn select(&mut self, index: usize) {
        self.selected = index;
        self.cursor = self.current_len();
    }

    fn edit_current(&mut self, edit: impl FnOnce(&mut String, &mut usize)) {
        let Some(key) = self.labels.get(self.selected).map(|(k, _)| k.clone()) else {
            return;
        };
        if let Some(value) = self.draft.get_mut(&key) {
            edit(value, &mut self.cursor);
            if !value.trim().is_empty() {
                self.flagged.retain(|k| *k != key);
            }
        }
    }
}

fn byte_at(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map_or(text.len(), |(i, _)| i)
}

impl Component for DraftForm {
    fn handle_key(&mut self, key: KeyEvent) -> Option<Action> {
        if !self.visible {
            return None;
        }

        match key.code {
            KeyCode::Esc => {
                self.visible = false;
                None
            }
            KeyCode::Enter => Some(Action::SubmitDraft),
            KeyCode::Up | KeyCode::BackTab => {
                if self.selected > 0 {
                    self.select(self.selected - 1);
                }
                None
            }
            KeyCode::Down | KeyCode::Tab => {
                if self.selected + 1 < self.labels.len() {
                    self.select(self.selected + 1);
                }
                None
            }
            KeyCode::Left => {
                self.cursor = self.cursor.saturating_sub(1);
                None
            }
            KeyCode::Right => {
                if self.cursor < self.current_len() {
                    self.cursor += 1;
                }
                None
            }
            KeyCode::Home => {
                self.cursor = 0;
                None
            }
            KeyCode::End => {
                self.cursor = self.current_len();
                None
            }
            KeyCode::Backspace => {
                self.edit_current(|value, cursor| {
                    if *cursor > 0 {
                        value.remove(byte_at(value, *cursor - 1));
                        *cursor -= 1;
                    }
                });
                None
            }
            KeyCode::Delete => {
                self.edit_current(|value, cursor| {
                    if *cursor < value.chars().count() {
                        value.remove(byte_at(value, *cursor));
                    }
                });
                None
            }
            KeyCode::Char(c) => {
                self.edit_current(|value, cursor| {
                    value.insert(byte_at(value, *cursor), c);
                    *cursor += 1;
                });
                None
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

        // One line per field, a blank, the error, the hint and the borders.
        let height = self.labels.len() as u16 + 6;
        let popup = centered_popup(area, POPUP_WIDTH, height, POPUP_MARGIN);
        frame.render_widget(Clear, popup);

        let mut lines: Vec<Line> = Vec::new();
        for (i, (key, label)) in self.labels.iter().enumerate() {
            let value = self.draft.get(key).unwrap_or_default();
            let selected = i == self.selected;
            let label_style = if self.flagged.iter().any(|k| k == key) {
                Theme::missing_field()
            } else {
                Theme::label()
            };
            let value_style = if selected {
                Theme::cell_editing()
            } else {
                Theme::value()
            };
            let marker = if selected { "> " } else { "  " };
            lines.push(Line::from(vec![
                Span::styled(marker, Theme::label()),
                Span::styled(format!("{:LABEL_WIDTH$}", label), label_style),
                Span::styled(format!(" {value} "), value_style),
            ]));
        }

        lines.push(Line::raw(""));
        match &self.error {
            Some(err) => lines.push(Line::styled(format!(" {err}"), Theme::status_error())),
            None => lines.push(Line::raw("")),
        }
        lines.push(Line::styled(
            " Enter: add row | Up/Down: field | Esc: close",
            Theme::status_key_hint(),
        ));

        if let Some(value) = self.selected_key().and_then(|k| self.draft.get(k)) {
            let prefix: usize = value.chars().take(self.cursor).count();
            // border + marker + label + leading space
            let x = popup.x + 1 + 2 + LABEL_WIDTH as u16 + 1 + prefix as u16;
            let y = popup.y + 1 + self.selected as u16;
            if x < popup.right() && y < popup.bottom() {
                frame.set_cursor_position((x, y));
            }
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .title(" New row ")
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
