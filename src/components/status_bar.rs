use crossterm::event::KeyEvent;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::event::{Action, AppMessage};
use crate::ui::theme::Theme;

use super::Component;

const MESSAGE_DISPLAY_MAX_LEN: usize = 48;

pub struct StatusBar {
    pub filtered_rows: usize,
    pub total_rows: usize,
    pub page_index: usize,
    pub page_count: usize,
    pub visible_columns: usize,
    pub total_columns: usize,
    pub dirty: bool,
    pub saving: bool,
    pub error_message: Option<String>,
    pub info_message: Option<String>,
}

impl StatusBar {
    pub fn new() -> Self {
        Self {
            filtered_rows: 0,
            total_rows: 0,
            page_index: 0,
            page_count: 1,
            visible_columns: 0,
            total_columns: 0,
            dirty: false,
            saving: false,
            error_message: None,
            info_message: None,
        }
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error_message = Some(message.into());
        self.info_message = None;
    }

    pub fn set_info(&mut self, message: impl Into<String>) {
        self.info_message = Some(message.into());
        self.error_message = None;
    }

    pub fn clear_messages(&mut self) {
        self.error_message = None;
        self.info_message = None;
    }
}

fn truncate(message: &str) -> String {
    if message.chars().count() > MESSAGE_DISPLAY_MAX_LEN {
        let head: String = message.chars().take(MESSAGE_DISPLAY_MAX_LEN - 3).collect();
        format!("{head}...")
    } else {
        message.to_string()
    }
}

impl Component for StatusBar {
    fn handle_key(&mut self, _key: KeyEvent) -> Option<Action> {
        None
    }

    fn handle_message(&mut self, msg: &AppMessage) -> Option<Action> {
        match msg {
            AppMessage::SaveFinished { result, .. } => {
                self.saving = false;
                match result {
                    Ok(()) => self.set_info("Saved"),
                    Err(err) => self.set_error(format!("Save failed: {err}")),
                }
            }
        }
        None
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, _focused: bool) {
        let mut spans = Vec::new();

        let rows = if self.filtered_rows == self.total_rows {
            format!(" Rows: {}", self.total_rows)
        } else {
            format!(" Rows: {}/{} (filtered)", self.filtered_rows, self.total_rows)
        };
        spans.push(Span::styled(rows, Theme::status_bar()));
        spans.push(Span::styled(
            format!(" | Page {}/{}", self.page_index + 1, self.page_count.max(1)),
            Theme::status_bar(),
        ));
        if self.total_columns > 0 {
            spans.push(Span::styled(
                format!(" | Cols: {}/{}", self.visible_columns, self.total_columns),
                Theme::status_bar(),
            ));
        }

        if self.saving {
            spans.push(Span::styled(" | Saving...", Theme::status_saving()));
        } else if self.dirty {
            spans.push(Span::styled(" | Unsaved changes", Theme::status_dirty()));
        }

        if let Some(ref err) = self.error_message {
            spans.push(Span::styled(
                format!(" | Error: {}", truncate(err)),
                Theme::status_error(),
            ));
        } else if let Some(ref info) = self.info_message {
            spans.push(Span::styled(format!(" | {}", truncate(info)), Theme::status_bar()));
        }

        let hints = " w:save q:quit ?:help ";
        let used_width: usize = spans.iter().map(|s| s.width()).sum();
        let remaining = (area.width as usize).saturating_sub(used_width);
        if remaining > hints.len() {
            spans.push(Span::styled(
                " ".repeat(remaining - hints.len()),
                Theme::status_bar(),
            ));
            spans.push(Span::styled(hints, Theme::status_key_hint()));
        }

        let bar = Paragraph::new(Line::from(spans)).style(Theme::status_bar());
        frame.render_widget(bar, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_status_bar_defaults() {
        let bar = StatusBar::new();
        assert_eq!(bar.total_rows, 0);
        assert!(!bar.dirty);
        assert!(!bar.saving);
        assert!(bar.error_message.is_none());
    }

    #[test]
    fn successful_save_clears_saving() {
        let mut bar = StatusBar::new();
        bar.saving = true;
        bar.set_error("old failure");
        bar.handle_message(&AppMessage::SaveFinished {
            generation: 1,
            result: Ok(()),
        });
        assert!(!bar.saving);
        assert!(bar.error_message.is_none());
        assert_eq!(bar.info_message.as_deref(), Some("Saved"));
    }

    #[test]
    fn failed_save_shows_error() {
        let mut bar = StatusBar::new();
        bar.saving = true;
        bar.handle_message(&AppMessage::SaveFinished {
            generation: 3,
            result: Err("disk full".into()),
        });
        assert!(!bar.saving);
        assert_eq!(bar.error_message.as_deref(), Some("Save failed: disk full"));
    }

    #[test]
    fn info_replaces_error() {
        let mut bar = StatusBar::new();
        bar.set_error("bad filter");
        bar.set_info("Row 13 added");
        assert!(bar.error_message.is_none());
        assert_eq!(bar.info_message.as_deref(), Some("Row 13 added"));
    }

    #[test]
    fn long_messages_are_truncated() {
        let long = "x".repeat(100);
        let shown = truncate(&long);
        assert_eq!(shown.chars().count(), MESSAGE_DISPLAY_MAX_LEN);
        assert!(shown.ends_with("..."));
        assert_eq!(truncate("short"), "short");
    }
}
