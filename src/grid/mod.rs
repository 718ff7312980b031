//! Generic editable data grid.
//!
//! The grid owns the canonical rows and derives everything else (the filtered
//! set, its order and the visible page) from them on demand.

pub mod column;
pub mod draft;
pub mod editor;
pub mod error;
pub mod filter;
pub mod pagination;
pub mod save;
pub mod sort;
pub mod table;
pub mod value;

pub use column::{Column, ColumnVisibility, Row};
pub use draft::Draft;
pub use editor::{CellEdit, CellEditor, CellPosition};
pub use error::{FieldError, GridError};
pub use filter::{parse_filter, ColumnFilter, FilterState};
pub use pagination::{Pagination, DEFAULT_PAGE_SIZE};
pub use save::{on_save, OnSave, SaveRequest};
pub use sort::{Sort, SortDirection, SortState};
pub use table::{Features, Grid, GridWindow, WindowRow};
pub use value::CellValue;
