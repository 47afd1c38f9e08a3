//! DSV formatting with a bounded, rotating text buffer.

use sluice_core::{Context, Cursor, Error, Operator, PipelineConfig, Result};

use super::dialect::Dialect;

/// Records in, formatted text out (one item per record, terminator included).
///
/// A record with no fields is written as a bare terminator, the blank line
/// [`DsvParse`](super::parse::DsvParse) reads back as an empty record.
///
/// The upstream header, when there is one, is formatted first. Rows are
/// written into an in-memory buffer and each item is the text appended since
/// the previous one; once the buffer grows past `limit` bytes it is dropped
/// and a fresh writer takes over, so memory stays bounded however long the
/// stream runs.
pub struct DsvFormat {
    dialect: Dialect,
    limit: usize,
}

impl DsvFormat {
    pub fn new(dialect: Dialect) -> Self {
        Self::with_config(dialect, &PipelineConfig::default())
    }

    pub fn with_config(dialect: Dialect, config: &PipelineConfig) -> Self {
        Self {
            dialect,
            limit: config.format_buffer_limit_bytes,
        }
    }

    pub fn csv() -> Self {
        Self::new(Dialect::csv())
    }

    pub fn tsv() -> Self {
        Self::new(Dialect::tsv())
    }

    /// Override the rotation threshold.
    pub fn buffer_limit(mut self, bytes: usize) -> Self {
        self.limit = bytes;
        self
    }
}

impl Operator for DsvFormat {
    type Input = Vec<String>;
    type Output = String;
    type Cursor = DsvFormatCursor;

    fn name(&self) -> &'static str {
        "dsv_format"
    }

    fn initialize(&mut self, ctx: &mut Context<'_, Vec<String>>) -> Result<DsvFormatCursor> {
        Ok(DsvFormatCursor {
            writer: self.dialect.writer(Vec::new())?,
            dialect: self.dialect.clone(),
            limit: self.limit,
            emitted: 0,
            pending_header: ctx.header().map(<[String]>::to_vec),
        })
    }
}

pub struct DsvFormatCursor {
    writer: csv::Writer<Vec<u8>>,
    dialect: Dialect,
    limit: usize,
    emitted: usize,
    pending_header: Option<Vec<String>>,
}

impl DsvFormatCursor {
    fn rotate(&mut self) -> Result<()> {
        #[cfg(feature = "tracing")]
        tracing::trace!(
            buffered = self.writer.get_ref().len(),
            limit = self.limit,
            "rotating dsv buffer"
        );
        self.writer = self.dialect.writer(Vec::new())?;
        self.emitted = 0;
        Ok(())
    }
}

impl Cursor<Vec<String>> for DsvFormatCursor {
    type Output = String;

    fn next_item(&mut self, ctx: &mut Context<'_, Vec<String>>) -> Result<Option<String>> {
        let record = match self.pending_header.take() {
            Some(header) => header,
            None => match ctx.pull()? {
                Some(record) => record,
                None => return Ok(None),
            },
        };

        if record.is_empty() {
            // csv would write `""`, which reads back as one empty field.
            return Ok(Some(self.dialect.terminator.clone()));
        }
        if self.writer.get_ref().len() > self.limit {
            self.rotate()?;
        }
        self.writer
            .write_record(&record)
            .map_err(|e| Error::Dsv(format!("cannot format record: {e}")))?;
        self.writer.flush()?;

        let buffer = self.writer.get_ref();
        let text = std::str::from_utf8(&buffer[self.emitted..])
            .map_err(|e| Error::Dsv(format!("formatted record is not UTF-8: {e}")))?
            .to_string();
        self.emitted = buffer.len();
        Ok(Some(text))
    }
}
