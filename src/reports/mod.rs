//! Catalog output
//!
//! The catalog is written as tab-separated text with a header row. Cells are sanitized when records are
//! rendered, so no quoting is needed and the output can be pasted straight into a spreadsheet.

mod tsv;

pub use tsv::generate as generate_tsv;
