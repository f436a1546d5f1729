//! CSV formats for the BookMyRoom tables.
//!
//! Row structs carry the exact column names of each file, and the reader and
//! writer are shared by every entity. Files are plain UTF-8 without a BOM.

pub mod reader;
pub mod rows;
pub mod writer;

pub use reader::open_reader;
pub use rows::CsvTable;
pub use writer::write_table;
