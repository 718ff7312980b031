pub mod json_file;

pub use json_file::{file_saver, infer_columns, load_rows, write_rows};
