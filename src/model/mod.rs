pub mod dealership;
pub mod json_row;
