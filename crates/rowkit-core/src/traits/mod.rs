//! Core traits for row API behavior.

mod rows;

pub use rows::RowApi;
