use super::value::CellValue;

/// A cell addressed by its index in the canonical row set and its column key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellPosition {
    pub row_index: usize,
    pub key: String,
}

impl CellPosition {
    pub fn new(row_index: usize, key: impl Into<String>) -> Self {
        Self {
            row_index,
            key: key.into(),
        }
    }
}

/// The single value change an edit session produces.
#[derive(Debug, Clone, PartialEq)]
pub struct CellEdit {
    pub row_index: usize,
    pub key: String,
    pub value: CellValue,
}

#[derive(Debug, Clone, PartialEq, Default)]
enum Session {
    #[default]
    Display,
    Text {
        position: CellPosition,
        original: CellValue,
        buffer: String,
        cursor: usize,
    },
    Choice {
        position: CellPosition,
        options: Vec<CellValue>,
        selected: usize,
    },
}

/// Inline editor for one cell at a time.
///
/// Edits stay local to the editor until the session is committed, and every
/// session commits at most once.
#[derive(Debug, Clone, Default)]
pub struct CellEditor {
    session: Session,
}

impl CellEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session on `position` seeded from `current`.
    ///
    /// With `options` the editor offers a choice list instead of free text.
    /// A session that was still open is blurred first and its edit returned.
    pub fn begin(
        &mut self,
        position: CellPosition,
        current: &CellValue,
        options: Option<&[CellValue]>,
    ) -> Option<CellEdit> {
        let blurred = self.commit();
        self.session = match options {
            Some(options) if !options.is_empty() => Session::Choice {
                position,
                selected: options.iter().position(|o| o == current).unwrap_or(0),
                options: options.to_vec(),
            },
            _ => {
                let buffer = current.to_string();
                Session::Text {
                    position,
                    original: current.clone(),
                    cursor: buffer.chars().count(),
                    buffer,
                }
            }
        };
        blurred
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.session, Session::Display)
    }

    pub fn is_choosing(&self) -> bool {
        matches!(self.session, Session::Choice { .. })
    }

    pub fn position(&self) -> Option<&CellPosition> {
        match &self.session {
            Session::Display => None,
            Session::Text { position, .. } | Session::Choice { position, .. } => Some(position),
        }
    }

    pub fn buffer(&self) -> Option<&str> {
        match &self.session {
            Session::Text { buffer, .. } => Some(buffer),
            _ => None,
        }
    }

    /// Cursor position in characters.
    pub fn cursor(&self) -> Option<usize> {
        match &self.session {
            Session::Text { cursor, .. } => Some(*cursor),
            _ => None,
        }
    }

    pub fn choices(&self) -> Option<(&[CellValue], usize)> {
        match &self.session {
            Session::Choice {
                options, selected, ..
            } => Some((options, *selected)),
            _ => None,
        }
    }

    pub fn insert_char(&mut self, c: char) {
        if let Session::Text { buffer, cursor, .. } = &mut self.session {
            let at = byte_offset(buffer, *cursor);
            buffer.insert(at, c);
            *cursor += 1;
        }
    }

    pub fn backspace(&mut self) {
        if let Session::Text { buffer, cursor, .. } = &mut self.session {
            if *cursor > 0 {
                let at = byte_offset(buffer, *cursor - 1);
                buffer.remove(at);
                *cursor -= 1;
            }
        }
    }

    pub fn delete(&mut self) {
        if let Session::Text { buffer, cursor, .. } = &mut self.session {
            if *cursor < buffer.chars().count() {
                let at = byte_offset(buffer, *cursor);
                buffer.remove(at);
            }
        }
    }

    pub fn move_left(&mut self) {
        if let Session::Text { cursor, .. } = &mut self.session {
            *cursor = cursor.saturating_sub(1);
        }
    }

    pub fn move_right(&mut self) {
        if let Session::Text { buffer, cursor, .. } = &mut self.session {
            if *cursor < buffer.chars().count() {
                *cursor += 1;
            }
        }
    }

    pub fn home(&mut self) {
        if let Session::Text { cursor, .. } = &mut self.session {
            *cursor = 0;
        }
    }

    pub fn end(&mut self) {
        if let Session::Text { buffer, cursor, .. } = &mut self.session {
            *cursor = buffer.chars().count();
        }
    }

    pub fn select_next(&mut self) {
        if let Session::Choice {
            options, selected, ..
        } = &mut self.session
        {
            if *selected + 1 < options.len() {
                *selected += 1;
            }
        }
    }

    pub fn select_prev(&mut self) {
        if let Session::Choice { selected, .. } = &mut self.session {
            *selected = selected.saturating_sub(1);
        }
    }

    /// Confirm the session. Returns the edit once; later calls return `None`.
    ///
    /// An unchanged buffer yields the original value so that a no-op edit
    /// leaves the row equal to what it was.
    pub fn commit(&mut self) -> Option<CellEdit> {
        match std::mem::take(&mut self.session) {
            Session::Display => None,
            Session::Text {
                position,
                original,
                buffer,
                ..
            } => {
                let value = if buffer == original.to_string() {
                    original
                } else {
                    CellValue::Text(buffer)
                };
                Some(CellEdit {
                    row_index: position.row_index,
                    key: position.key,
                    value,
                })
            }
            Session::Choice {
                position,
                mut options,
                selected,
            } => {
                if selected >= options.len() {
                    return None;
                }
                Some(CellEdit {
                    row_index: position.row_index,
                    key: position.key,
                    value: options.swap_remove(selected),
                })
            }
        }
    }

    /// Pick the highlighted option. Choosing commits immediately.
    pub fn choose(&mut self) -> Option<CellEdit> {
        if !self.is_choosing() {
            return None;
        }
        self.commit()
    }

    /// Drop the session without producing an edit.
    pub fn cancel(&mut self) {
        self.session = Session::Display;
    }
}

fn byte_offset(s: &str, char_index: usize) -> usize {
    s.char_indices()
        .nth(char_index)
        .map_or(s.len(), |(i, _)| i)
}
