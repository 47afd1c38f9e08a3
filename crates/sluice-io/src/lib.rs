//! sluice-io: resource adapters and the DSV layer.
//!
//! `file` provides the resources (`TextFile`, `TextBuffer`), `stream` turns
//! them into chain ends (line and chunk sources, write relays), and `dsv`
//! builds record parsing, formatting and column operators on top.

#![forbid(unsafe_code)]

pub mod dsv;
pub mod file;
pub mod stream;

pub use dsv::{
    CsvFileReader, CsvFileWriter, Deselect, Dialect, DsvFileReader, DsvFileWriter, DsvFormat,
    DsvParse, FieldFilter, FieldMap, Quoting, Select, Selector, ToMapping, TsvFileReader,
    TsvFileWriter,
};
pub use file::{TextBuffer, TextFile};
pub use stream::{FileReadStream, FileWriteStream, ReadStream, WriteStream};
