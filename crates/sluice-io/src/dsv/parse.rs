//! Incremental DSV parsing over pulled text chunks.
//!
//! Upstream items are arbitrary slices of the text (lines, fixed-size chunks);
//! records may span item boundaries. The parser keeps csv-core's state between
//! pulls and never reads ahead more than one upstream item.
//!
//! csv-core skips blank lines; here a blank line is an empty record, the
//! form [`DsvFormat`](super::format::DsvFormat) writes for one.

use sluice_core::{Context, Cursor, Error, Operator, Result};

use super::dialect::Dialect;

const INITIAL_OUTPUT: usize = 1024;
const INITIAL_ENDS: usize = 16;

/// Text chunks in, records out. With `has_header` the first record becomes
/// this stage's header instead of an item.
pub struct DsvParse {
    dialect: Dialect,
    header: Option<Vec<String>>,
}

impl DsvParse {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            header: None,
        }
    }

    pub fn csv() -> Self {
        Self::new(Dialect::csv())
    }

    pub fn tsv() -> Self {
        Self::new(Dialect::tsv())
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }
}

impl Operator for DsvParse {
    type Input = String;
    type Output = Vec<String>;
    type Cursor = DsvParseCursor;

    fn name(&self) -> &'static str {
        "dsv_parse"
    }

    fn initialize(&mut self, ctx: &mut Context<'_, String>) -> Result<DsvParseCursor> {
        let mut cursor =
            DsvParseCursor::new(self.dialect.reader()?, self.dialect.terminator_byte()?);
        if self.dialect.has_header {
            self.header = cursor.next_record(ctx)?;
            #[cfg(feature = "tracing")]
            tracing::trace!(fields = ?self.header, "dsv header");
        }
        Ok(cursor)
    }

    fn header(&self) -> Option<&[String]> {
        self.header.as_deref()
    }
}

pub struct DsvParseCursor {
    reader: csv_core::Reader,
    /// `None` for any of `\r`, `\n`, `\r\n`.
    terminator: Option<u8>,
    at_record_start: bool,
    /// The last record ended on `\r`, so a following `\n` belongs to it.
    after_cr: bool,
    input: Vec<u8>,
    consumed: usize,
    eof: bool,
    output: Vec<u8>,
    out_len: usize,
    ends: Vec<usize>,
    ends_len: usize,
}

impl DsvParseCursor {
    fn new(reader: csv_core::Reader, terminator: Option<u8>) -> Self {
        Self {
            reader,
            terminator,
            at_record_start: true,
            after_cr: false,
            input: Vec::new(),
            consumed: 0,
            eof: false,
            output: vec![0; INITIAL_OUTPUT],
            out_len: 0,
            ends: vec![0; INITIAL_ENDS],
            ends_len: 0,
        }
    }

    fn next_record(&mut self, ctx: &mut Context<'_, String>) -> Result<Option<Vec<String>>> {
        use csv_core::ReadRecordResult;

        loop {
            if self.consumed == self.input.len() && !self.eof {
                match ctx.pull()? {
                    Some(chunk) => {
                        self.input = chunk.into_bytes();
                        self.consumed = 0;
                    }
                    None => self.eof = true,
                }
                // An empty chunk would read as end of input.
                continue;
            }

            if self.at_record_start {
                if let Some(&byte) = self.input.get(self.consumed) {
                    let after_cr = std::mem::take(&mut self.after_cr);
                    if after_cr && byte == b'\n' {
                        self.consumed += 1;
                        continue;
                    }
                    if self.is_terminator(byte) {
                        self.consumed += 1;
                        self.after_cr = byte == b'\r';
                        return Ok(Some(Vec::new()));
                    }
                }
            }

            let (result, nin, nout, nend) = self.reader.read_record(
                &self.input[self.consumed..],
                &mut self.output[self.out_len..],
                &mut self.ends[self.ends_len..],
            );
            self.consumed += nin;
            self.out_len += nout;
            self.ends_len += nend;
            if nin > 0 {
                self.at_record_start = false;
            }

            match result {
                ReadRecordResult::InputEmpty => {}
                ReadRecordResult::OutputFull => {
                    let len = self.output.len();
                    self.output.resize(len * 2, 0);
                }
                ReadRecordResult::OutputEndsFull => {
                    let len = self.ends.len();
                    self.ends.resize(len * 2, 0);
                }
                ReadRecordResult::Record => {
                    self.at_record_start = true;
                    self.after_cr = nin > 0 && self.input[self.consumed - 1] == b'\r';
                    return self.take_record().map(Some);
                }
                ReadRecordResult::End => return Ok(None),
            }
        }
    }

    fn is_terminator(&self, byte: u8) -> bool {
        match self.terminator {
            Some(terminator) => byte == terminator,
            None => byte == b'\r' || byte == b'\n',
        }
    }

    fn take_record(&mut self) -> Result<Vec<String>> {
        let mut fields = Vec::with_capacity(self.ends_len);
        let mut start = 0;
        for &end in &self.ends[..self.ends_len] {
            let field = std::str::from_utf8(&self.output[start..end]).map_err(|e| {
                Error::Dsv(format!(
                    "field {} of record {} is not UTF-8: {e}",
                    fields.len(),
                    self.reader.line()
                ))
            })?;
            fields.push(field.to_string());
            start = end;
        }
        self.out_len = 0;
        self.ends_len = 0;
        Ok(fields)
    }
}

impl Cursor<String> for DsvParseCursor {
    type Output = Vec<String>;

    fn next_item(&mut self, ctx: &mut Context<'_, String>) -> Result<Option<Vec<String>>> {
        self.next_record(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sluice_core::{Source, Stage, StageExt};

    fn rows(items: &[&[&str]]) -> Vec<Vec<String>> {
        items
            .iter()
            .map(|r| r.iter().map(|f| f.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_first_record_is_header() {
        let mut chain = Source::new(vec!["id,name\n".to_string(), "1,ann\n2,bo\n".to_string()])
            .relay(DsvParse::csv())
            .unwrap();
        assert_eq!(
            chain.fields().unwrap(),
            Some(vec!["id".to_string(), "name".to_string()])
        );
        assert_eq!(chain.collect_items().unwrap(), rows(&[&["1", "ann"], &["2", "bo"]]));
    }

    #[test]
    fn test_records_span_chunks() {
        let text = "a,\"quoted, \"\"field\"\"\"\nlast,row";
        let chunks: Vec<String> = text
            .chars()
            .collect::<Vec<_>>()
            .chunks(3)
            .map(|c| c.iter().collect())
            .collect();
        let mut chain = Source::new(chunks)
            .relay(DsvParse::new(Dialect::csv().without_header()))
            .unwrap();
        assert_eq!(
            chain.collect_items().unwrap(),
            rows(&[&["a", "quoted, \"field\""], &["last", "row"]])
        );
        assert!(chain.header().is_none());
    }

    #[test]
    fn test_tsv_and_custom_terminator() {
        let mut tsv = Source::new(vec!["x\ty\n1\t2\n".to_string()])
            .relay(DsvParse::tsv())
            .unwrap();
        assert_eq!(tsv.collect_items().unwrap(), rows(&[&["1", "2"]]));

        let dialect = Dialect::with_delimiter('|').terminated_by(";").without_header();
        let mut semi = Source::new(vec!["a|b;c|d;".to_string()])
            .relay(DsvParse::new(dialect))
            .unwrap();
        assert_eq!(semi.collect_items().unwrap(), rows(&[&["a", "b"], &["c", "d"]]));
    }

    #[test]
    fn test_blank_lines_are_empty_records() {
        let mut chain = Source::new(vec!["a\n\n".to_string(), "\"\"\nb\n".to_string()])
            .relay(DsvParse::new(Dialect::csv().without_header()))
            .unwrap();
        assert_eq!(
            chain.collect_items().unwrap(),
            rows(&[&["a"], &[], &[""], &["b"]])
        );

        // CRLF split across chunks must not read as an extra blank line.
        let mut crlf = Source::new(vec!["a\r".to_string(), "\n\r\nb\r\n".to_string()])
            .relay(DsvParse::new(Dialect::csv().without_header()))
            .unwrap();
        assert_eq!(
            crlf.collect_items().unwrap(),
            rows(&[&["a"], &[], &["b"]])
        );

        let dialect = Dialect::with_delimiter('|').terminated_by(";").without_header();
        let mut semi = Source::new(vec![";x|y;".to_string()])
            .relay(DsvParse::new(dialect))
            .unwrap();
        assert_eq!(semi.collect_items().unwrap(), rows(&[&[], &["x", "y"]]));
    }

    #[test]
    fn test_empty_input_has_no_header() {
        let mut chain = Source::new(Vec::<String>::new())
            .relay(DsvParse::csv())
            .unwrap();
        assert_eq!(chain.fields().unwrap(), None);
        assert!(chain.collect_items().unwrap().is_empty());
    }

    #[test]
    fn test_invalid_dialect_fails_at_materialize() {
        let mut chain = Source::new(vec!["a".to_string()])
            .relay(DsvParse::new(Dialect::with_delimiter('§')))
            .unwrap();
        assert!(matches!(chain.materialize(), Err(Error::Config(_))));
    }
}
