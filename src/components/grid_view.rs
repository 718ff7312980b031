use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Constraint, Rect};
use ratatui::text::Text;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};
use ratatui::Frame;

use crate::event::{Action, AppMessage};
use crate::grid::{CellEditor, CellPosition, CellValue, GridWindow, SortDirection, WindowRow};
use crate::ui::theme::Theme;

use super::Component;

const DEFAULT_MAX_VISIBLE_COLS: usize = 12;
const MIN_COLUMN_WIDTH: usize = 4;
const MAX_COLUMN_WIDTH: usize = 40;
const ROW_NUMBER_WIDTH: u16 = 5;
const COLUMN_PADDING: u16 = 2;
const CURSOR_MARK: char = '▏';

/// Header of one visible column.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderCell {
    pub key: String,
    pub label: String,
    pub sort: Option<SortDirection>,
    pub editable: bool,
}

impl HeaderCell {
    fn title(&self) -> String {
        match self.sort {
            Some(direction) => format!("{} {}", self.label, direction.arrow()),
            None => self.label.clone(),
        }
    }
}

/// The visible page of the grid, with a selected cell and the inline editor.
pub struct GridView {
    headers: Vec<HeaderCell>,
    rows: Vec<WindowRow>,
    filtered_count: usize,
    total_count: usize,
    page_index: usize,
    page_count: usize,
    table_state: TableState,
    selected_col: usize,
    h_scroll: usize,
    max_visible_cols: usize,
    editor: CellEditor,
}

impl GridView {
    pub fn new() -> Self {
        Self {
            headers: vec![],
            rows: vec![],
            filtered_count: 0,
            total_count: 0,
            page_index: 0,
            page_count: 1,
            table_state: TableState::default(),
            selected_col: 0,
            h_scroll: 0,
            max_visible_cols: DEFAULT_MAX_VISIBLE_COLS,
            editor: CellEditor::new(),
        }
    }

    /// Replace what is shown. The selection stays on the same screen position,
    /// pulled back when the page got shorter.
    pub fn set_window(&mut self, headers: Vec<HeaderCell>, window: GridWindow) {
        self.headers = headers;
        self.rows = window.rows;
        self.filtered_count = window.filtered_count;
        self.total_count = window.total_count;
        self.page_index = window.page_index;
        self.page_count = window.page_count;

        if self.rows.is_empty() {
            self.table_state.select(None);
        } else {
            let i = self.table_state.selected().unwrap_or(0);
            self.table_state.select(Some(i.min(self.rows.len() - 1)));
        }
        self.selected_col = self.selected_col.min(self.headers.len().saturating_sub(1));
        self.h_scroll = self.h_scroll.min(self.selected_col);
    }

    /// Source index and key of the selected cell.
    pub fn selected_cell(&self) -> Option<(usize, &HeaderCell)> {
        let row = self.rows.get(self.table_state.selected()?)?;
        let header = self.headers.get(self.selected_col)?;
        Some((row.source_index, header))
    }

    /// Open the inline editor. Returns the edit of a session that was still
    /// open, if any.
    pub fn begin_edit(
        &mut self,
        position: CellPosition,
        current: &CellValue,
        options: Option<&[CellValue]>,
    ) -> Option<crate::grid::CellEdit> {
        self.editor.begin(position, current, options)
    }

    pub fn is_editing(&self) -> bool {
        self.editor.is_active()
    }

    fn move_up(&mut self) {
        let i = self.table_state.selected().unwrap_or(0);
        if i > 0 {
            self.table_state.select(Some(i - 1));
        }
    }

    fn move_down(&mut self) {
        let i = self.table_state.selected().unwrap_or(0);
        if i + 1 < self.rows.len() {
            self.table_state.select(Some(i + 1));
        }
    }

    fn move_left(&mut self) {
        if self.selected_col > 0 {
            self.selected_col -= 1;
        }
        if self.selected_col < self.h_scroll {
            self.h_scroll = self.selected_col;
        }
    }

    fn move_right(&mut self) {
        if self.selected_col + 1 < self.headers.len() {
            self.selected_col += 1;
        }
        if self.selected_col >= self.h_scroll + self.max_visible_cols {
            self.h_scroll = self.selected_col + 1 - self.max_visible_cols;
        }
    }

    fn jump_top(&mut self) {
        if !self.rows.is_empty() {
            self.table_state.select(Some(0));
        }
    }

    fn jump_bottom(&mut self) {
        if !self.rows.is_empty() {
            self.table_state.select(Some(self.rows.len() - 1));
        }
    }

    fn handle_editor_key(&mut self, key: KeyEvent) -> Option<Action> {
        if self.editor.is_choosing() {
            return match key.code {
                KeyCode::Up | KeyCode::Char('k') | KeyCode::Left => {
                    self.editor.select_prev();
                    None
                }
                KeyCode::Down | KeyCode::Char('j') | KeyCode::Right => {
                    self.editor.select_next();
                    None
                }
                KeyCode::Enter => self.editor.choose().map(Action::CommitEdit),
                KeyCode::Esc => {
                    self.editor.cancel();
                    None
                }
                _ => None,
            };
        }

        match key.code {
            KeyCode::Enter | KeyCode::Tab => self.editor.commit().map(Action::CommitEdit),
            KeyCode::Esc => {
                self.editor.cancel();
                None
            }
            KeyCode::Backspace => {
                self.editor.backspace();
                None
            }
            KeyCode::Delete => {
                self.editor.delete();
                None
            }
            KeyCode::Left => {
                self.editor.move_left();
                None
            }
            KeyCode::Right => {
                self.editor.move_right();
                None
            }
            KeyCode::Home => {
                self.editor.home();
                None
            }
            KeyCode::End => {
                self.editor.end();
                None
            }
            KeyCode::Char(c) => {
                self.editor.insert_char(c);
                None
            }
            _ => None,
        }
    }

    /// Text for a cell, replaced by the editor contents when it is being edited.
    fn cell_text(&self, source_index: usize, key: &str, display: &str) -> (String, bool) {
        let editing_here = self
            .editor
            .position()
            .is_some_and(|p| p.row_index == source_index && p.key == key);
        if !editing_here {
            return (display.to_string(), false);
        }

        if let Some((options, selected)) = self.editor.choices() {
            let choice = options.get(selected).map(|o| o.to_string()).unwrap_or_default();
            return (format!("◂ {} ▸", choice), true);
        }
        let buffer = self.editor.buffer().unwrap_or_default();
        let cursor = self.editor.cursor().unwrap_or(0);
        let mut text: String = buffer.chars().take(cursor).collect();
        text.push(CURSOR_MARK);
        text.extend(buffer.chars().skip(cursor));
        (text, true)
    }

    fn title(&self) -> String {
        if self.filtered_count == self.total_count {
            format!(
                " Rows {} | page {}/{} ",
                self.total_count,
                self.page_index + 1,
                self.page_count
            )
        } else {
            format!(
                " Rows {} of {} | page {}/{} ",
                self.filtered_count,
                self.total_count,
                self.page_index + 1,
                self.page_count
            )
        }
    }
}

impl Component for GridView {
    fn handle_key(&mut self, key: KeyEvent) -> Option<Action> {
        if self.editor.is_active() {
            return self.handle_editor_key(key);
        }

        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.move_up();
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.move_down();
                None
            }
            KeyCode::Left | KeyCode::Char('h') => {
                self.move_left();
                None
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.move_right();
                None
            }
            KeyCode::Char('g') => {
                self.jump_top();
                None
            }
            KeyCode::Char('G') => {
                self.jump_bottom();
                None
            }
            KeyCode::Enter | KeyCode::Char('e') => {
                let (row_index, header) = self.selected_cell()?;
                if !header.editable {
                    return None;
                }
                Some(Action::BeginEdit {
                    row_index,
                    key: header.key.clone(),
                })
            }
            KeyCode::Char('s') => {
                let (_, header) = self.selected_cell()?;
                Some(Action::ToggleSort(header.key.clone()))
            }
            KeyCode::Char('n') | KeyCode::PageDown | KeyCode::Char(']') => Some(Action::NextPage),
            KeyCode::Char('p') | KeyCode::PageUp | KeyCode::Char('[') => Some(Action::PrevPage),
            KeyCode::Char('+') => Some(Action::GrowPage),
            KeyCode::Char('-') => Some(Action::ShrinkPage),
            KeyCode::Char('/') => Some(Action::FocusSearch),
            KeyCode::Char('f') => Some(Action::FocusFilter),
            KeyCode::Char('x') => Some(Action::ClearFilters),
            KeyCode::Char('c') => Some(Action::ToggleColumnSelector),
            KeyCode::Char('a') => Some(Action::OpenDraft),
            KeyCode::Char('w') => Some(Action::Save),
            KeyCode::Char('R') => Some(Action::ResetView),
            _ => None,
        }
    }

    fn handle_message(&mut self, _msg: &AppMessage) -> Option<Action> {
        None
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, focused: bool) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(self.title())
            .border_style(if focused {
                Theme::border_focused()
            } else {
                Theme::border_unfocused()
            });

        if self.headers.is_empty() || self.rows.is_empty() {
            let message = if self.headers.is_empty() {
                "All columns are hidden. Press 'c' to choose columns."
            } else if self.total_count == 0 {
                "No rows yet. Press 'a' to add one."
            } else {
                "No rows match. Press 'x' to clear filters."
            };
            frame.render_widget(Paragraph::new(message).block(block), area);
            return;
        }

        let total_cols = self.headers.len();
        let end_col = (self.h_scroll + self.max_visible_cols).min(total_cols);
        let visible_col_range = self.h_scroll..end_col;
        let selected_row = self.table_state.selected();

        let col_widths: Vec<u16> = visible_col_range
            .clone()
            .map(|col_idx| {
                let header_width = self.headers[col_idx].title().chars().count();
                let max_data_width = self
                    .rows
                    .iter()
                    .map(|row| row.cells.get(col_idx).map_or(0, |cell| cell.chars().count()))
                    .max()
                    .unwrap_or(0);
                let width = header_width
                    .max(max_data_width)
                    .clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH);
                width as u16
            })
            .collect();

        let mut header_cells = vec![Cell::from("  #").style(Theme::table_header())];
        for col_idx in visible_col_range.clone() {
            let header = &self.headers[col_idx];
            let style = if header.sort.is_some() {
                Theme::table_header_sorted()
            } else {
                Theme::table_header()
            };
            header_cells.push(Cell::from(Text::from(header.title())).style(style));
        }
        let header = Row::new(header_cells).height(1);

        let rows: Vec<Row> = self
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let style = if i % 2 == 0 {
                    Theme::table_row_normal()
                } else {
                    Theme::table_row_alt()
                };

                let mut cells = vec![Cell::from(format!("{:>4}", row.source_index + 1)).style(style)];
                for col_idx in visible_col_range.clone() {
                    let header = &self.headers[col_idx];
                    let display = row.cells.get(col_idx).map(String::as_str).unwrap_or_default();
                    let (text, editing) = self.cell_text(row.source_index, &header.key, display);
                    let cell_style = if editing {
                        Theme::cell_editing()
                    } else if selected_row == Some(i) && col_idx == self.selected_col {
                        Theme::cell_selected()
                    } else if !header.editable {
                        style.patch(Theme::cell_read_only())
                    } else {
                        style
                    };
                    cells.push(Cell::from(text).style(cell_style));
                }
                Row::new(cells).height(1)
            })
            .collect();

        let mut widths = vec![Constraint::Length(ROW_NUMBER_WIDTH)];
        for w in &col_widths {
            widths.push(Constraint::Length(*w + COLUMN_PADDING));
        }

        let table = Table::new(rows, &widths)
            .header(header)
            .block(block)
            .row_highlight_style(Theme::table_row_selected());

        frame.render_stateful_widget(table, area, &mut self.table_state);
    }

    fn is_input_mode(&self) -> bool {
        self.editor.is_active()
    }
}
