use std::sync::Arc;

use super::column::{Column, ColumnVisibility, Row};
use super::draft::{next_id, Draft};
use super::editor::CellEdit;
use super::error::GridError;
use super::filter::{parse_filter, ColumnFilter, FilterState};
use super::pagination::Pagination;
use super::save::{OnSave, SaveCoordinator, SaveRequest};
use super::sort::{SortDirection, SortState};
use super::value::CellValue;

/// Optional parts of the grid. Everything is on by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Features {
    pub enable_search: bool,
    pub enable_column_filter: bool,
    pub enable_pagination: bool,
    pub enable_add_row: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            enable_search: true,
            enable_column_filter: true,
            enable_pagination: true,
            enable_add_row: true,
        }
    }
}

/// One rendered row of the visible window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowRow {
    /// Position in the canonical row set, used to address edits.
    pub source_index: usize,
    /// Display text per visible column.
    pub cells: Vec<String>,
}

/// The rows a view should draw, after filter, sort and pagination.
#[derive(Debug, Clone, PartialEq)]
pub struct GridWindow {
    /// Indices into [`Grid::columns`] of the visible columns, in order.
    pub columns: Vec<usize>,
    pub rows: Vec<WindowRow>,
    pub filtered_count: usize,
    pub total_count: usize,
    pub page_index: usize,
    pub page_count: usize,
}

/// Editable data grid over rows of type `T`.
///
/// Owns the canonical rows. Every row change goes through
/// [`Grid::update_cell`] or [`Grid::insert_row`], each of which swaps in a new
/// collection in one assignment.
pub struct Grid<T: Row> {
    columns: Vec<Column<T>>,
    rows: Vec<Arc<T>>,
    features: Features,
    sort: SortState,
    filters: FilterState,
    visibility: ColumnVisibility,
    pagination: Pagination,
    saver: SaveCoordinator<T>,
    on_save: Option<OnSave<T>>,
}

impl<T: Row> Grid<T> {
    /// Build a grid, checking that every column resolves on the row type.
    pub fn new(columns: Vec<Column<T>>, rows: Vec<T>, features: Features) -> Result<Self, GridError> {
        validate_columns(&columns, &rows)?;
        let rows: Vec<Arc<T>> = rows.into_iter().map(Arc::new).collect();
        Ok(Self {
            saver: SaveCoordinator::new(&rows),
            columns,
            rows,
            features,
            sort: SortState::default(),
            filters: FilterState::default(),
            visibility: ColumnVisibility::default(),
            pagination: Pagination::default(),
            on_save: None,
        })
    }

    pub fn with_on_save(mut self, on_save: OnSave<T>) -> Self {
        self.on_save = Some(on_save);
        self
    }

    /// Replace every row with externally loaded data and treat it as saved.
    ///
    /// A save still in flight is abandoned; its result will be ignored.
    pub fn reseed(&mut self, rows: Vec<T>) -> Result<(), GridError> {
        validate_columns(&self.columns, &rows)?;
        self.rows = rows.into_iter().map(Arc::new).collect();
        self.saver.rebaseline(&self.rows);
        self.clamp_page();
        tracing::info!(rows = self.rows.len(), "rows reseeded");
        Ok(())
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.pagination = Pagination::new(page_size);
        self
    }

    pub fn columns(&self) -> &[Column<T>] {
        &self.columns
    }

    pub fn column(&self, key: &str) -> Option<&Column<T>> {
        self.columns.iter().find(|c| c.key() == key)
    }

    fn require_column(&self, key: &str) -> Result<&Column<T>, GridError> {
        self.column(key).ok_or_else(|| GridError::Configuration {
            key: key.to_string(),
            detail: "no column with this key".into(),
        })
    }

    pub fn rows(&self) -> &[Arc<T>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&T> {
        self.rows.get(index).map(|r| r.as_ref())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn features(&self) -> Features {
        self.features
    }

    pub fn on_save(&self) -> Option<OnSave<T>> {
        self.on_save.clone()
    }

    // --- Sorting ---

    pub fn sort_state(&self) -> &SortState {
        &self.sort
    }

    /// Activate the sort control of column `key`.
    pub fn toggle_sort(&mut self, key: &str) -> Result<(), GridError> {
        self.require_column(key)?;
        self.sort.cycle(key);
        Ok(())
    }

    pub fn set_sort(&mut self, key: &str, direction: SortDirection) -> Result<(), GridError> {
        self.require_column(key)?;
        self.sort.set(key, direction);
        Ok(())
    }

    pub fn clear_sort(&mut self) {
        self.sort.clear();
    }

    // --- Filtering ---

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn set_global_filter(&mut self, text: impl Into<String>) -> Result<(), GridError> {
        if !self.features.enable_search {
            return Err(GridError::FeatureDisabled("search"));
        }
        self.filters.set_global(text);
        self.clamp_page();
        Ok(())
    }

    /// Set the filter of column `key`, replacing any filter already on it.
    pub fn set_column_filter(&mut self, key: &str, filter: ColumnFilter) -> Result<(), GridError> {
        if !self.features.enable_column_filter {
            return Err(GridError::FeatureDisabled("column filtering"));
        }
        self.require_column(key)?;
        self.filters.set_column(key, filter);
        self.clamp_page();
        Ok(())
    }

    pub fn remove_column_filter(&mut self, key: &str) {
        self.filters.remove_column(key);
        self.clamp_page();
    }

    /// Replace all column filters with the ones parsed from `expression`.
    /// An empty expression clears them. Returns how many clauses applied.
    pub fn apply_filter_expression(&mut self, expression: &str) -> Result<usize, GridError> {
        if !self.features.enable_column_filter {
            return Err(GridError::FeatureDisabled("column filtering"));
        }
        if expression.trim().is_empty() {
            self.filters.clear_columns();
            self.clamp_page();
            return Ok(0);
        }

        let clauses = parse_filter(expression)?;
        for (key, _) in &clauses {
            self.require_column(key)
                .map_err(|_| GridError::FilterSyntax(format!("unknown column '{}'", key)))?;
        }

        // Clauses on the same column are ANDed into one filter.
        let mut next = self.filters.clone();
        next.clear_columns();
        let count = clauses.len();
        for (key, filter) in clauses {
            next.narrow_column(&key, filter)?;
        }
        self.filters = next;
        self.clamp_page();
        Ok(count)
    }

    /// Drop the global and every per-column filter.
    pub fn clear_filters(&mut self) {
        self.filters.clear();
        self.clamp_page();
    }

    // --- Visibility ---

    pub fn is_column_visible(&self, key: &str) -> bool {
        self.visibility.is_visible(key)
    }

    pub fn toggle_column_visibility(&mut self, key: &str) -> Result<(), GridError> {
        self.require_column(key)?;
        self.visibility.toggle(key);
        Ok(())
    }

    /// Show exactly `keys`, hiding every other column.
    pub fn set_visible_columns(&mut self, keys: &[String]) -> Result<(), GridError> {
        for key in keys {
            self.require_column(key)?;
        }
        for col in &self.columns {
            let visible = keys.iter().any(|k| k == col.key());
            self.visibility.set(col.key(), visible);
        }
        Ok(())
    }

    pub fn visible_columns(&self) -> Vec<&Column<T>> {
        self.columns
            .iter()
            .filter(|c| self.visibility.is_visible(c.key()))
            .collect()
    }

    // --- Pagination ---

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    pub fn next_page(&mut self) {
        let total = self.filtered_count();
        self.pagination.next_page(total);
    }

    pub fn previous_page(&mut self) {
        self.pagination.previous_page();
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        let total = self.filtered_count();
        self.pagination.set_page_size(page_size, total);
    }

    fn clamp_page(&mut self) {
        let total = self.filtered_count();
        self.pagination.clamp(total);
    }

    /// Reset sort, filters, visibility and page, leaving rows untouched.
    pub fn reset_view(&mut self) {
        self.sort.clear();
        self.filters.clear();
        self.visibility.reset();
        self.pagination.reset();
    }

    // --- Derivation ---

    /// Indices of rows passing the filters, in sorted order.
    pub fn filtered_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| {
                self.filters.matches(
                    row.as_ref(),
                    &self.columns,
                    self.features.enable_search,
                    self.features.enable_column_filter,
                )
            })
            .map(|(i, _)| i)
            .collect();
        self.sort.apply(&self.rows, &mut indices);
        indices
    }

    pub fn filtered_count(&self) -> usize {
        self.filtered_indices().len()
    }

    /// Filter, sort, then paginate. Pure: reading the window changes nothing.
    pub fn window(&self) -> GridWindow {
        let indices = self.filtered_indices();
        let filtered_count = indices.len();

        let (page, page_index, page_count) = if self.features.enable_pagination {
            let range = self.pagination.range(filtered_count);
            (
                &indices[range],
                self.pagination.clamped_index(filtered_count),
                self.pagination.page_count(filtered_count),
            )
        } else {
            (&indices[..], 0, 1)
        };

        let columns: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| self.visibility.is_visible(c.key()))
            .map(|(i, _)| i)
            .collect();

        let rows = page
            .iter()
            .map(|&source_index| {
                let row = &self.rows[source_index];
                WindowRow {
                    source_index,
                    cells: columns
                        .iter()
                        .map(|&c| {
                            let col = &self.columns[c];
                            col.display(&col.value(row))
                        })
                        .collect(),
                }
            })
            .collect();

        GridWindow {
            columns,
            rows,
            filtered_count,
            total_count: self.rows.len(),
            page_index,
            page_count,
        }
    }

    // --- Editing ---

    pub fn value_at(&self, row_index: usize, key: &str) -> Result<CellValue, GridError> {
        let col = self.require_column(key)?;
        let row = self.rows.get(row_index).ok_or(GridError::RowOutOfRange {
            index: row_index,
            len: self.rows.len(),
        })?;
        Ok(col.value(row))
    }

    /// The single mutation entry point for cell edits.
    ///
    /// Replaces one field of one row. The edited row is rebuilt and the other
    /// rows are shared with the previous collection. Returns whether the row
    /// actually changed.
    pub fn update_cell(
        &mut self,
        row_index: usize,
        key: &str,
        value: CellValue,
    ) -> Result<bool, GridError> {
        let col = self.require_column(key)?;
        if !col.is_editable() {
            return Err(GridError::ReadOnlyColumn {
                key: key.to_string(),
            });
        }
        let current = self.rows.get(row_index).ok_or(GridError::RowOutOfRange {
            index: row_index,
            len: self.rows.len(),
        })?;

        let mut edited = T::clone(current);
        edited
            .set(key, value)
            .map_err(|e| GridError::from_field(key, e))?;
        if edited == **current {
            return Ok(false);
        }

        let mut next = self.rows.clone();
        next[row_index] = Arc::new(edited);
        self.rows = next;
        self.clamp_page();
        Ok(true)
    }

    pub fn apply_edit(&mut self, edit: CellEdit) -> Result<bool, GridError> {
        self.update_cell(edit.row_index, &edit.key, edit.value)
    }

    // --- Insertion ---

    pub fn new_draft(&self) -> Draft {
        Draft::for_columns(&self.columns)
    }

    /// Validate `draft` and append it as a new row.
    ///
    /// On failure the draft is left as it was so the user can correct it. On
    /// success it is blanked. Returns the new row's identifier.
    pub fn insert_row(&mut self, draft: &mut Draft) -> Result<i64, GridError> {
        if !self.features.enable_add_row {
            return Err(GridError::FeatureDisabled("adding rows"));
        }
        let id = next_id(&self.rows)?;
        let row = draft.build(T::template(&self.rows), id)?;

        let mut next = self.rows.clone();
        next.push(Arc::new(row));
        self.rows = next;
        draft.reset();
        self.clamp_page();
        tracing::info!(id, rows = self.rows.len(), "row inserted");
        Ok(id)
    }

    // --- Saving ---

    /// Whether the live rows differ from the last saved snapshot.
    pub fn has_changes(&self) -> bool {
        self.saver.has_changes(&self.rows)
    }

    pub fn is_saving(&self) -> bool {
        self.saver.is_saving()
    }

    pub fn last_save_error(&self) -> Option<&str> {
        self.saver.last_error()
    }

    pub fn saved_rows(&self) -> &[Arc<T>] {
        self.saver.snapshot()
    }

    /// First half of a save: hand the current rows out for persistence.
    ///
    /// `Ok(None)` when there is nothing to save. Edits keep working while the
    /// request is out; they belong to the next save.
    pub fn begin_save(&mut self) -> Result<Option<SaveRequest<T>>, GridError> {
        self.saver.begin(&self.rows)
    }

    /// Second half of a save. Results for an attempt that is no longer in
    /// flight return `None` and change nothing.
    pub fn finish_save(
        &mut self,
        generation: u64,
        result: Result<(), String>,
    ) -> Option<Result<(), GridError>> {
        self.saver.finish(generation, result)
    }

    /// Persist the rows through the configured handler.
    ///
    /// Without a handler the current rows are accepted as saved. Returns
    /// `Ok(false)` when there was nothing to save.
    pub async fn save(&mut self) -> Result<bool, GridError> {
        let Some(request) = self.begin_save()? else {
            return Ok(false);
        };
        let result = match self.on_save.clone() {
            Some(handler) => handler(request.rows).await.map_err(|e| format!("{:#}", e)),
            None => Ok(()),
        };
        match self.finish_save(request.generation, result) {
            Some(Err(err)) => Err(err),
            _ => Ok(true),
        }
    }
}

fn validate_columns<T: Row>(columns: &[Column<T>], rows: &[T]) -> Result<(), GridError> {
    for col in columns {
        if let Some(fields) = T::fields() {
            if !fields.contains(&col.key()) {
                tracing::error!(key = col.key(), "column does not exist on row type");
                return Err(GridError::Configuration {
                    key: col.key().to_string(),
                    detail: format!("row type has fields {}", fields.join(", ")),
                });
            }
        }
        if let Some(index) = rows.iter().position(|r| r.get(col.key()).is_none()) {
            tracing::error!(key = col.key(), row = index, "column does not resolve on row");
            return Err(GridError::Configuration {
                key: col.key().to_string(),
                detail: format!("missing on row {}", index),
            });
        }
    }
    Ok(())
}
