use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::event::{Action, AppMessage};
use crate::ui::theme::Theme;

use super::Component;

const SEARCH_LABEL: &str = " Search: ";
const FILTER_LABEL: &str = " Filter: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    /// Global substring search over every column.
    Search,
    /// Column filter expression, e.g. `year >= 2020 AND status = 'sold'`.
    Expression,
}

/// One editable line of the bar.
#[derive(Debug, Default)]
struct InputLine {
    text: String,
    /// Cursor position in characters.
    cursor: usize,
    /// Last submitted text, restored on Esc.
    applied: String,
}

impl InputLine {
    fn byte_at(&self, char_index: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_index)
            .map_or(self.text.len(), |(i, _)| i)
    }

    fn len(&self) -> usize {
        self.text.chars().count()
    }
}

pub struct FilterBar {
    search: InputLine,
    expression: InputLine,
    /// Which line is being edited, if any.
    editing: Option<FilterField>,
    search_enabled: bool,
    expression_enabled: bool,
}

impl FilterBar {
    pub fn new(search_enabled: bool, expression_enabled: bool) -> Self {
        Self {
            search: InputLine::default(),
            expression: InputLine::default(),
            editing: None,
            search_enabled,
            expression_enabled,
        }
    }

    /// Start editing `field`. Returns `false` when the field is disabled.
    pub fn start_editing(&mut self, field: FilterField) -> bool {
        let enabled = match field {
            FilterField::Search => self.search_enabled,
            FilterField::Expression => self.expression_enabled,
        };
        if !enabled {
            return false;
        }
        self.editing = Some(field);
        let line = self.line_mut(field);
        line.cursor = line.len();
        true
    }

    /// Put the submitted text back after the grid rejected it.
    pub fn reopen(&mut self, field: FilterField) {
        self.editing = Some(field);
    }

    pub fn applied_search(&self) -> &str {
        &self.search.applied
    }

    pub fn applied_expression(&self) -> &str {
        &self.expression.applied
    }

    /// Forget all text, as after clearing every filter.
    pub fn clear(&mut self) {
        self.search = InputLine::default();
        self.expression = InputLine::default();
        self.editing = None;
    }

    fn line_mut(&mut self, field: FilterField) -> &mut InputLine {
        match field {
            FilterField::Search => &mut self.search,
            FilterField::Expression => &mut self.expression,
        }
    }

    fn render_line(
        &self,
        frame: &mut Frame,
        area: Rect,
        field: FilterField,
        label: &'static str,
        enabled: bool,
        hint: &'static str,
    ) {
        let line = match field {
            FilterField::Search => &self.search,
            FilterField::Expression => &self.expression,
        };
        let editing = self.editing == Some(field);

        let (text, style) = if !enabled {
            ("(disabled)".to_string(), Theme::filter_inactive())
        } else if editing {
            (line.text.clone(), Theme::filter_active())
        } else if line.text.is_empty() {
            (hint.to_string(), Theme::filter_inactive())
        } else {
            (line.text.clone(), Theme::value())
        };

        if editing {
            let cursor_x = area.x + label.len() as u16 + line.cursor as u16;
            frame.set_cursor_position((cursor_x, area.y));
        }

        let paragraph = Paragraph::new(Line::from(vec![
            Span::styled(label, Theme::label()),
            Span::styled(text, style),
        ]));
        frame.render_widget(paragraph, area);
    }
}

impl Component for FilterBar {
    fn handle_key(&mut self, key: KeyEvent) -> Option<Action> {
        let field = self.editing?;
        let line = self.line_mut(field);

        match key.code {
            KeyCode::Enter => {
                let text = line.text.trim().to_string();
                line.text = text.clone();
                line.applied = text.clone();
                self.editing = None;
                Some(match field {
                    FilterField::Search => Action::SubmitSearch(text),
                    FilterField::Expression => Action::SubmitFilter(text),
                })
            }
            KeyCode::Esc => {
                line.text = line.applied.clone();
                self.editing = None;
                None
            }
            KeyCode::Backspace => {
                if line.cursor > 0 {
                    let at = line.byte_at(line.cursor - 1);
                    line.text.remove(at);
                    line.cursor -= 1;
                }
                None
            }
            KeyCode::Delete => {
                if line.cursor < line.len() {
                    let at = line.byte_at(line.cursor);
                    line.text.remove(at);
                }
                None
            }
            KeyCode::Left => {
                line.cursor = line.cursor.saturating_sub(1);
                None
            }
            KeyCode::Right => {
                if line.cursor < line.len() {
                    line.cursor += 1;
                }
                None
            }
            KeyCode::Home => {
                line.cursor = 0;
                None
            }
            KeyCode::End => {
                line.cursor = line.len();
                None
            }
            KeyCode::Char(c) => {
                let at = line.byte_at(line.cursor);
                line.text.insert(at, c);
                line.cursor += 1;
                None
            }
            _ => None,
        }
    }

    fn handle_message(&mut self, _msg: &AppMessage) -> Option<Action> {
        None
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, _focused: bool) {
        let search_area = Rect::new(area.x, area.y, area.width, area.height.min(1));
        self.render_line(
            frame,
            search_area,
            FilterField::Search,
            SEARCH_LABEL,
            self.search_enabled,
            "(press / to search all columns)",
        );

        if area.height > 1 {
            let expr_area = Rect::new(area.x, area.y + 1, area.width, 1);
            self.render_line(
                frame,
                expr_area,
                FilterField::Expression,
                FILTER_LABEL,
                self.expression_enabled,
                "(press f, e.g. year >= 2020 AND status = 'sold')",
            );
        }
    }

    fn is_input_mode(&self) -> bool {
        self.editing.is_some()
    }
}
