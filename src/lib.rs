//! Editable data grid engine with a terminal front end for dealership
//! inventory, sales and maintenance records.
//!
//! [`grid`] is the UI-independent engine. [`model`] holds the dealership row
//! types and a schemaless JSON row, [`store`] reads and writes JSON files, and
//! the remaining modules make up the terminal application.

pub mod app;
pub mod cli;
pub mod components;
pub mod event;
pub mod grid;
pub mod logging;
pub mod model;
pub mod store;
pub mod ui;
