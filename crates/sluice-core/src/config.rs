//! Pipeline configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default rotation threshold for the DSV formatter's text buffer.
pub const DEFAULT_FORMAT_BUFFER_LIMIT: usize = 256 * 1024 * 1024;

/// Default chunk size, in characters, for chunked text readers.
pub const DEFAULT_READ_CHUNK_CHARS: usize = 8192;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Once the formatter's buffer grows past this many bytes it is dropped
    /// and a fresh writer takes over.
    pub format_buffer_limit_bytes: usize,

    /// Characters per item produced by `ReadStream`.
    pub read_chunk_chars: usize,

    /// Appended after every item a `WriteStream` writes.
    pub line_terminator: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            format_buffer_limit_bytes: DEFAULT_FORMAT_BUFFER_LIMIT,
            read_chunk_chars: DEFAULT_READ_CHUNK_CHARS,
            line_terminator: "\n".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `SLUICE_FORMAT_BUFFER_LIMIT`: formatter buffer limit in bytes
    /// - `SLUICE_READ_CHUNK_CHARS`: chunk size for chunked readers
    /// - `SLUICE_LINE_TERMINATOR`: terminator written after each item
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("SLUICE_FORMAT_BUFFER_LIMIT") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.format_buffer_limit_bytes = v;
            }
        }

        if let Ok(s) = std::env::var("SLUICE_READ_CHUNK_CHARS") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.read_chunk_chars = v;
            }
        }

        if let Ok(s) = std::env::var("SLUICE_LINE_TERMINATOR") {
            cfg.line_terminator = s;
        }

        cfg
    }

    pub fn validate(&self) -> Result<()> {
        if self.format_buffer_limit_bytes == 0 {
            return Err(Error::Config(
                "format_buffer_limit_bytes must be greater than zero".into(),
            ));
        }
        if self.read_chunk_chars == 0 {
            return Err(Error::Config(
                "read_chunk_chars must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
