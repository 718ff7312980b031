use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use crossterm::event::{Event, KeyCode, KeyEvent};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::cli::{Cli, Command, DemoTable};
use crate::components::column_selector::ColumnSelector;
use crate::components::draft_form::DraftForm;
use crate::components::filter_bar::{FilterBar, FilterField};
use crate::components::grid_view::{GridView, HeaderCell};
use crate::components::help_popup::HelpPopup;
use crate::components::status_bar::StatusBar;
use crate::components::Component;
use crate::event::{spawn_event_reader, to_key_event, Action, AppMessage};
use crate::grid::{CellEdit, CellPosition, Column, Features, Grid, GridError, Row, SaveRequest};
use crate::logging;
use crate::model::dealership;
use crate::model::json_row::JsonRow;
use crate::store;
use crate::ui::layout::{AppLayout, GridLayout};
use crate::ui::theme::Theme;
use crate::ui::Focus;

const PAGE_SIZE_STEP: usize = 5;

struct App<R: Row> {
    grid: Grid<R>,
    title: String,
    grid_view: GridView,
    filter_bar: FilterBar,
    column_selector: ColumnSelector,
    draft_form: DraftForm,
    status_bar: StatusBar,
    help_popup: HelpPopup,
    focus: Focus,
    /// Set by the first quit request while there are unsaved changes.
    quit_armed: bool,
}

impl<R> App<R>
where
    R: Row + Send + Sync + 'static,
{
    fn new(grid: Grid<R>, title: impl Into<String>) -> Self {
        let features = grid.features();
        let labels = grid
            .columns()
            .iter()
            .filter(|c| c.key() != R::ID_KEY && c.is_editable())
            .map(|c| (c.key().to_string(), c.label().to_string()))
            .collect();
        let draft_form = DraftForm::new(grid.new_draft(), labels);

        let mut app = Self {
            grid,
            title: title.into(),
            grid_view: GridView::new(),
            filter_bar: FilterBar::new(features.enable_search, features.enable_column_filter),
            column_selector: ColumnSelector::new(),
            draft_form,
            status_bar: StatusBar::new(),
            help_popup: HelpPopup::new(),
            focus: Focus::Grid,
            quit_armed: false,
        };
        app.refresh();
        app
    }

    /// Push the grid's current window and counters into the components.
    fn refresh(&mut self) {
        let window = self.grid.window();
        let sort = self.grid.sort_state();
        let headers: Vec<HeaderCell> = window
            .columns
            .iter()
            .filter_map(|&i| self.grid.columns().get(i))
            .map(|c| HeaderCell {
                key: c.key().to_string(),
                label: c.label().to_string(),
                sort: sort.direction_for(c.key()),
                editable: c.is_editable(),
            })
            .collect();

        self.status_bar.filtered_rows = window.filtered_count;
        self.status_bar.total_rows = window.total_count;
        self.status_bar.page_index = window.page_index;
        self.status_bar.page_count = window.page_count;
        self.status_bar.visible_columns = window.columns.len();
        self.status_bar.total_columns = self.grid.columns().len();
        self.status_bar.dirty = self.grid.has_changes();
        self.status_bar.saving = self.grid.is_saving();

        let grid = &self.grid;
        self.column_selector.set_columns(grid.columns().iter().map(|c| {
            (
                c.key().to_string(),
                c.label().to_string(),
                grid.is_column_visible(c.key()),
            )
        }));
        self.grid_view.set_window(headers, window);
    }

    fn draw(&mut self, frame: &mut Frame) {
        let layout = AppLayout::new(frame.area());

        let mut title = format!(" lotgrid | {}", self.title);
        if self.grid.has_changes() {
            title.push_str(" [modified]");
        }
        frame.render_widget(
            Paragraph::new(title).style(Theme::title_bar()),
            layout.title_bar,
        );

        let grid_layout = GridLayout::new(layout.content);
        self.filter_bar.render(
            frame,
            grid_layout.filter_bar,
            self.focus == Focus::FilterBar,
        );
        self.grid_view
            .render(frame, grid_layout.table, self.focus == Focus::Grid);
        self.status_bar.render(frame, layout.status_bar, false);

        self.column_selector
            .render(frame, frame.area(), self.focus == Focus::ColumnSelector);
        self.draft_form
            .render(frame, frame.area(), self.focus == Focus::DraftForm);
        self.help_popup.render(frame, frame.area(), true);
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<Action> {
        if self.help_popup.visible {
            return self.help_popup.handle_key(key);
        }

        if self.column_selector.visible {
            let action = self.column_selector.handle_key(key);
            if !self.column_selector.visible {
                self.focus = Focus::Grid;
            }
            return action;
        }

        if self.draft_form.visible {
            let action = self.draft_form.handle_key(key);
            if !self.draft_form.visible {
                self.focus = Focus::Grid;
            }
            return action;
        }

        if self.filter_bar.is_input_mode() {
            let action = self.filter_bar.handle_key(key);
            if !self.filter_bar.is_input_mode() {
                self.focus = Focus::Grid;
            }
            return action;
        }

        if self.grid_view.is_input_mode() {
            return self.grid_view.handle_key(key);
        }

        match key.code {
            KeyCode::Char('q') => Some(Action::Quit),
            KeyCode::Char('?') => Some(Action::ToggleHelp),
            _ => self.grid_view.handle_key(key),
        }
    }

    /// Apply `action`. Returns `true` when the app should exit.
    fn handle_action(&mut self, action: Action, msg_tx: &mpsc::UnboundedSender<AppMessage>) -> bool {
        if action != Action::Quit {
            self.quit_armed = false;
        }
        let features = self.grid.features();

        match action {
            Action::Quit => {
                if !self.grid.has_changes() || self.quit_armed {
                    return true;
                }
                self.quit_armed = true;
                self.status_bar
                    .set_error("Unsaved changes: press q again to quit, w to save");
            }
            Action::ToggleHelp => self.help_popup.toggle(),
            Action::ToggleColumnSelector => {
                if self.column_selector.visible {
                    self.column_selector.hide();
                    self.focus = Focus::Grid;
                } else if !features.enable_column_filter {
                    self.report(GridError::FeatureDisabled("column filtering"));
                } else {
                    self.column_selector.show();
                    self.focus = Focus::ColumnSelector;
                }
            }
            Action::FocusSearch => self.focus_filter_bar(FilterField::Search, "search"),
            Action::FocusFilter => {
                self.focus_filter_bar(FilterField::Expression, "column filtering")
            }
            Action::SubmitSearch(text) => {
                self.focus = Focus::Grid;
                match self.grid.set_global_filter(text) {
                    Ok(()) => self.status_bar.clear_messages(),
                    Err(err) => self.report(err),
                }
            }
            Action::SubmitFilter(text) => {
                self.focus = Focus::Grid;
                match self.grid.apply_filter_expression(&text) {
                    Ok(0) => self.status_bar.set_info("Column filters cleared"),
                    Ok(n) => self.status_bar.set_info(format!("{n} column filter(s) applied")),
                    Err(err) => {
                        self.report(err);
                        self.filter_bar.reopen(FilterField::Expression);
                        self.focus = Focus::FilterBar;
                    }
                }
            }
            Action::ClearFilters => {
                self.grid.clear_filters();
                self.filter_bar.clear();
                self.status_bar.set_info("Filters cleared");
            }
            Action::ToggleColumn(key) => {
                if let Err(err) = self.grid.toggle_column_visibility(&key) {
                    self.report(err);
                }
            }
            Action::ToggleSort(key) => {
                if let Err(err) = self.grid.toggle_sort(&key) {
                    self.report(err);
                }
            }
            Action::NextPage => self.grid.next_page(),
            Action::PrevPage => self.grid.previous_page(),
            Action::GrowPage | Action::ShrinkPage if !features.enable_pagination => {
                self.report(GridError::FeatureDisabled("pagination"));
            }
            Action::GrowPage => {
                let size = self.grid.pagination().page_size();
                self.grid.set_page_size(size + PAGE_SIZE_STEP);
            }
            Action::ShrinkPage => {
                let size = self.grid.pagination().page_size();
                self.grid
                    .set_page_size(size.saturating_sub(PAGE_SIZE_STEP).max(1));
            }
            Action::BeginEdit { row_index, key } => self.begin_edit(row_index, key),
            Action::CommitEdit(edit) => self.commit_edit(edit),
            Action::OpenDraft => {
                if features.enable_add_row {
                    self.draft_form.show();
                    self.focus = Focus::DraftForm;
                } else {
                    self.report(GridError::FeatureDisabled("adding rows"));
                }
            }
            Action::SubmitDraft => self.submit_draft(),
            Action::Save => self.start_save(msg_tx),
            Action::ResetView => {
                self.grid.reset_view();
                self.filter_bar.clear();
                self.status_bar.set_info("View reset");
            }
        }

        self.refresh();
        false
    }

    fn handle_message(&mut self, msg: &AppMessage) {
        if let AppMessage::SaveFinished { generation, result } = msg {
            if self.grid.finish_save(*generation, result.clone()).is_none() {
                return;
            }
        }
        self.status_bar.handle_message(msg);
        self.refresh();
    }

    fn report(&mut self, err: GridError) {
        if !err.is_recoverable() {
            tracing::error!(error = %err, "grid operation failed");
        }
        self.status_bar.set_error(err.to_string());
    }

    fn focus_filter_bar(&mut self, field: FilterField, feature: &'static str) {
        if self.filter_bar.start_editing(field) {
            self.focus = Focus::FilterBar;
        } else {
            self.report(GridError::FeatureDisabled(feature));
        }
    }

    fn begin_edit(&mut self, row_index: usize, key: String) {
        let current = match self.grid.value_at(row_index, &key) {
            Ok(value) => value,
            Err(err) => return self.report(err),
        };
        let options = self.grid.column(&key).and_then(Column::choices);
        let stale = self
            .grid_view
            .begin_edit(CellPosition::new(row_index, key), &current, options);
        if let Some(edit) = stale {
            self.commit_edit(edit);
        }
    }

    fn commit_edit(&mut self, edit: CellEdit) {
        match self.grid.apply_edit(edit) {
            Ok(true) => self.status_bar.clear_messages(),
            Ok(false) => {}
            Err(err) => self.report(err),
        }
    }

    fn submit_draft(&mut self) {
        match self.grid.insert_row(&mut self.draft_form.draft) {
            Ok(id) => {
                self.draft_form.clear();
                self.draft_form.hide();
                self.focus = Focus::Grid;
                self.status_bar.set_info(format!("Row {id} added"));
            }
            Err(err) => {
                let missing = match &err {
                    GridError::Validation { missing, .. } => missing.clone(),
                    _ => vec![],
                };
                self.draft_form.set_error(err.to_string(), missing);
            }
        }
    }

    fn start_save(&mut self, msg_tx: &mpsc::UnboundedSender<AppMessage>) {
        let SaveRequest { generation, rows } = match self.grid.begin_save() {
            Ok(Some(request)) => request,
            Ok(None) => return self.status_bar.set_info("No changes to save"),
            Err(err) => return self.report(err),
        };

        let Some(handler) = self.grid.on_save() else {
            tracing::info!(generation, "no save handler; keeping changes in memory");
            return self.handle_message(&AppMessage::SaveFinished {
                generation,
                result: Ok(()),
            });
        };

        self.status_bar.saving = true;
        let msg_tx = msg_tx.clone();
        tokio::spawn(async move {
            let result = handler(rows).await.map_err(|e| format!("{:#}", e));
            let _ = msg_tx.send(AppMessage::SaveFinished { generation, result });
        });
    }
}

// --- Startup ---

pub async fn run(cli: Cli) -> Result<()> {
    if let Some(path) = &cli.log_file {
        logging::init_file_logging(path)?;
    }
    let features = cli.grid.features();
    let page_size = cli.grid.page_size;

    match cli.command {
        Command::Open { path, columns } => {
            let rows: Vec<JsonRow> = store::load_rows(&path).await?;
            let columns = store::infer_columns(&rows, columns.as_deref())?;
            let grid = Grid::new(columns, rows, features)
                .context("invalid column configuration")?
                .with_page_size(page_size)
                .with_on_save(store::file_saver(path.clone()));
            run_grid(grid, path.display().to_string()).await
        }
        Command::Demo { table, out } => match table {
            DemoTable::Cars => {
                let grid = demo_grid(
                    dealership::car_columns(),
                    dealership::sample_cars(),
                    features,
                    page_size,
                    out,
                )?;
                run_grid(grid, "Cars").await
            }
            DemoTable::Sales => {
                let grid = demo_grid(
                    dealership::sale_columns(),
                    dealership::sample_sales(),
                    features,
                    page_size,
                    out,
                )?;
                run_grid(grid, "Sales").await
            }
            DemoTable::Maintenance => {
                let grid = demo_grid(
                    dealership::maintenance_columns(),
                    dealership::sample_maintenance(),
                    features,
                    page_size,
                    out,
                )?;
                run_grid(grid, "Maintenance").await
            }
            DemoTable::Inquiries => {
                let grid = demo_grid(
                    dealership::inquiry_columns(),
                    dealership::sample_inquiries(),
                    features,
                    page_size,
                    out,
                )?;
                run_grid(grid, "Inquiries").await
            }
            DemoTable::Report => {
                let grid = demo_grid(
                    dealership::report_columns(),
                    dealership::sample_report(),
                    features,
                    page_size,
                    out,
                )?;
                run_grid(grid, "Profit report").await
            }
        },
    }
}

fn demo_grid<R>(
    columns: Vec<Column<R>>,
    rows: Vec<R>,
    features: Features,
    page_size: usize,
    out: Option<PathBuf>,
) -> Result<Grid<R>>
where
    R: Row + Serialize + Send + Sync + 'static,
{
    let grid = Grid::new(columns, rows, features)
        .context("invalid column configuration")?
        .with_page_size(page_size);
    Ok(match out {
        Some(path) => grid.with_on_save(store::file_saver(path)),
        None => grid,
    })
}

// --- Terminal setup ---

async fn run_grid<R>(grid: Grid<R>, title: impl Into<String>) -> Result<()>
where
    R: Row + Send + Sync + 'static,
{
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = io::stdout().execute(LeaveAlternateScreen);
        original_hook(info);
    }));

    enable_raw_mode().context("failed to enable raw mode")?;
    io::stdout()
        .execute(EnterAlternateScreen)
        .context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, App::new(grid, title)).await;

    disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;

    result
}

// --- Event loop ---

async fn run_app<R>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    mut app: App<R>,
) -> Result<()>
where
    R: Row + Send + Sync + 'static,
{
    let (msg_tx, mut msg_rx) = mpsc::unbounded_channel::<AppMessage>();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();
    spawn_event_reader(event_tx);

    loop {
        terminal.draw(|frame| app.draw(frame))?;

        tokio::select! {
            Some(event) = event_rx.recv() => {
                let Some(key) = to_key_event(&event) else { continue };
                let Some(action) = app.handle_key(key) else { continue };
                if app.handle_action(action, &msg_tx) {
                    return Ok(());
                }
            }
            Some(msg) = msg_rx.recv() => {
                app.handle_message(&msg);
            }
        }
    }
}
