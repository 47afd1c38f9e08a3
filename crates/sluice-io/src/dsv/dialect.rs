//! Delimiter-separated text dialects.

use serde::{Deserialize, Serialize};

use sluice_core::{Error, Result};

/// When the formatter quotes a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quoting {
    /// Only fields containing a delimiter, quote or line break.
    Necessary,
    Always,
    NonNumeric,
    Never,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dialect {
    pub delimiter: char,
    pub quote: char,
    /// A quote inside a quoted field is written (and read) as two quotes.
    pub double_quote: bool,
    /// Escape character used instead of doubling when `double_quote` is off.
    pub escape: Option<char>,
    /// Record terminator: `"\n"`, `"\r\n"` or any single ASCII character.
    pub terminator: String,
    pub quoting: Quoting,
    /// Whether the first parsed record is a header rather than data.
    pub has_header: bool,
}

impl Default for Dialect {
    fn default() -> Self {
        Self::csv()
    }
}

impl Dialect {
    /// Comma-separated, `"` quoted, doubled quotes, `\n` terminated.
    pub fn csv() -> Self {
        Self {
            delimiter: ',',
            quote: '"',
            double_quote: true,
            escape: None,
            terminator: "\n".to_string(),
            quoting: Quoting::Necessary,
            has_header: true,
        }
    }

    /// Same as [`Dialect::csv`] with a tab delimiter.
    pub fn tsv() -> Self {
        Self::with_delimiter('\t')
    }

    pub fn with_delimiter(delimiter: char) -> Self {
        Self {
            delimiter,
            ..Self::csv()
        }
    }

    pub fn terminated_by(mut self, terminator: impl Into<String>) -> Self {
        self.terminator = terminator.into();
        self
    }

    pub fn quoting(mut self, quoting: Quoting) -> Self {
        self.quoting = quoting;
        self
    }

    pub fn without_header(mut self) -> Self {
        self.has_header = false;
        self
    }

    pub fn validate(&self) -> Result<()> {
        ascii("delimiter", self.delimiter)?;
        ascii("quote", self.quote)?;
        if let Some(escape) = self.escape {
            ascii("escape", escape)?;
        }
        self.terminator_byte().map(|_| ())
    }

    /// `None` means "any of `\r`, `\n`, `\r\n`".
    pub(crate) fn terminator_byte(&self) -> Result<Option<u8>> {
        match self.terminator.as_str() {
            "\n" | "\r\n" => Ok(None),
            t if t.len() == 1 && t.is_ascii() => Ok(Some(t.as_bytes()[0])),
            t => Err(Error::Config(format!(
                "unsupported DSV terminator {t:?}; use \\n, \\r\\n or one ASCII character"
            ))),
        }
    }

    pub(crate) fn reader(&self) -> Result<csv_core::Reader> {
        self.validate()?;
        let terminator = match self.terminator_byte()? {
            Some(byte) => csv_core::Terminator::Any(byte),
            None => csv_core::Terminator::CRLF,
        };
        Ok(csv_core::ReaderBuilder::new()
            .delimiter(self.delimiter as u8)
            .quote(self.quote as u8)
            .double_quote(self.double_quote)
            .escape(self.escape.map(|c| c as u8))
            .terminator(terminator)
            .build())
    }

    pub(crate) fn writer<W: std::io::Write>(&self, sink: W) -> Result<csv::Writer<W>> {
        self.validate()?;
        let terminator = match (self.terminator.as_str(), self.terminator_byte()?) {
            ("\r\n", _) => csv::Terminator::CRLF,
            (_, Some(byte)) => csv::Terminator::Any(byte),
            (_, None) => csv::Terminator::Any(b'\n'),
        };
        let style = match self.quoting {
            Quoting::Necessary => csv::QuoteStyle::Necessary,
            Quoting::Always => csv::QuoteStyle::Always,
            Quoting::NonNumeric => csv::QuoteStyle::NonNumeric,
            Quoting::Never => csv::QuoteStyle::Never,
        };
        let mut builder = csv::WriterBuilder::new();
        builder
            .delimiter(self.delimiter as u8)
            .quote(self.quote as u8)
            .double_quote(self.double_quote)
            .terminator(terminator)
            .quote_style(style)
            .flexible(true);
        if let Some(escape) = self.escape {
            builder.escape(escape as u8);
        }
        Ok(builder.from_writer(sink))
    }
}

fn ascii(what: &str, c: char) -> Result<()> {
    if c.is_ascii() {
        Ok(())
    } else {
        Err(Error::Config(format!("DSV {what} must be ASCII, got {c:?}")))
    }
}
