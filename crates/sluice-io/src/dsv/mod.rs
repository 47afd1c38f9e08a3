//! Delimiter-separated values: dialects, parse/format stages, the column
//! selector resolver and per-field operators.

pub mod dialect;
pub mod file;
pub mod format;
pub mod ops;
pub mod parse;
pub mod select;

pub use dialect::{Dialect, Quoting};
pub use file::{
    CsvFileReader, CsvFileWriter, DsvFileReader, DsvFileWriter, TsvFileReader, TsvFileWriter,
};
pub use format::DsvFormat;
pub use ops::{Deselect, FieldFilter, FieldMap, Select, ToMapping};
pub use parse::DsvParse;
pub use select::Selector;
