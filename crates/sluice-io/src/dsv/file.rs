//! DSV files: line reader plus parser, formatter plus file writer.

use std::path::Path;

use sluice_core::{Pipe, Relay, Result, Source, StageExt};

use super::dialect::Dialect;
use super::format::DsvFormat;
use super::parse::DsvParse;
use crate::stream::{FileReadStream, FileWriteStream};

/// Records of a DSV file. The header (when the dialect has one) and the
/// file's name, seek and close are reachable through the returned source.
pub struct DsvFileReader;

impl DsvFileReader {
    pub fn open<P: AsRef<Path>>(path: P, dialect: Dialect) -> Result<Source<Vec<String>>> {
        let parsed = FileReadStream::open(path)?.relay(DsvParse::new(dialect))?;
        Ok(Source::from_stage(parsed))
    }
}

pub struct CsvFileReader;

impl CsvFileReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Source<Vec<String>>> {
        DsvFileReader::open(path, Dialect::csv())
    }
}

pub struct TsvFileReader;

impl TsvFileReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Source<Vec<String>>> {
        DsvFileReader::open(path, Dialect::tsv())
    }
}

/// A source-less fragment formatting records into a new file. Items pass
/// through as formatted text.
pub struct DsvFileWriter;

impl DsvFileWriter {
    pub fn create<P: AsRef<Path>>(path: P, dialect: Dialect) -> Result<Pipe<Vec<String>, String>> {
        // Formatted text already ends with the dialect terminator.
        let sink = FileWriteStream::create_with_terminator(path, "")?;
        Pipe::new(Relay::new(DsvFormat::new(dialect))).then(sink)
    }
}

pub struct CsvFileWriter;

impl CsvFileWriter {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Pipe<Vec<String>, String>> {
        DsvFileWriter::create(path, Dialect::csv())
    }
}

pub struct TsvFileWriter;

impl TsvFileWriter {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Pipe<Vec<String>, String>> {
        DsvFileWriter::create(path, Dialect::tsv())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(tag: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("sluice-dsv-{tag}-{}.csv", std::process::id()))
    }

    #[test]
    fn test_write_then_read_back() {
        let path = temp_path("roundtrip");
        let text = "id,note\n1,\"a, b\"\n2,plain\n".to_string();
        let mut written = Source::new(vec![text])
            .relay(DsvParse::csv())
            .and_then(|parsed| parsed.then(CsvFileWriter::create(&path)?))
            .unwrap();
        assert_eq!(
            written.collect_items().unwrap(),
            vec!["id,note\n", "1,\"a, b\"\n", "2,plain\n"]
        );
        drop(written);

        let mut reader = CsvFileReader::open(&path).unwrap();
        assert_eq!(
            reader.fields().unwrap(),
            Some(vec!["id".to_string(), "note".to_string()])
        );
        assert!(reader.resource_name().unwrap().ends_with(".csv"));
        assert_eq!(
            reader.collect_items().unwrap(),
            vec![
                vec!["1".to_string(), "a, b".to_string()],
                vec!["2".to_string(), "plain".to_string()],
            ]
        );
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_tsv_writer_uses_tabs() {
        let path = temp_path("tabs");
        let rows = vec![vec!["x".to_string(), "y".to_string()]];
        let mut written = Source::new(rows)
            .then(TsvFileWriter::create(&path).unwrap())
            .unwrap();
        written.run().unwrap();
        drop(written);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "x\ty\n");
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = TsvFileReader::open(temp_path("absent-nowhere"))
            .err()
            .expect("missing file must fail");
        assert!(matches!(err, sluice_core::Error::Io(_)));
    }
}
