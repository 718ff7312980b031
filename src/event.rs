use crossterm::event::{self, Event, KeyEvent};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::grid::CellEdit;

#[derive(Debug, PartialEq)]
pub enum Action {
    Quit,
    ToggleHelp,
    ToggleColumnSelector,
    FocusSearch,
    FocusFilter,
    SubmitSearch(String),
    SubmitFilter(String),
    ClearFilters,
    ToggleColumn(String),
    ToggleSort(String),
    NextPage,
    PrevPage,
    GrowPage,
    ShrinkPage,
    BeginEdit { row_index: usize, key: String },
    CommitEdit(CellEdit),
    OpenDraft,
    SubmitDraft,
    Save,
    ResetView,
}

/// Messages sent from background tasks back to the main UI thread.
#[derive(Debug)]
pub enum AppMessage {
    SaveFinished {
        generation: u64,
        result: Result<(), String>,
    },
}

pub fn spawn_event_reader(tx: mpsc::UnboundedSender<Event>) {
    tokio::task::spawn_blocking(move || loop {
        if event::poll(Duration::from_millis(50)).unwrap_or(false) {
            if let Ok(ev) = event::read() {
                if tx.send(ev).is_err() {
                    break;
                }
            }
        }
    });
}

pub fn to_key_event(ev: &Event) -> Option<KeyEvent> {
    match ev {
        Event::Key(key) if key.kind == event::KeyEventKind::Press => Some(*key),
        _ => None,
    }
}
