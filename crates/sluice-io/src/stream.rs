//! Stream adapters between resources and chains.
//!
//! Readers are sources: `FileReadStream` yields lines, `ReadStream` yields
//! fixed-size text chunks. Writers are relays carrying their sink as the
//! local resource: each item is written, followed by a terminator, and then
//! forwarded unchanged.

use std::io;
use std::marker::PhantomData;
use std::path::Path;

use sluice_core::{
    Capability, Context, Cursor, Error, Operator, Origin, PipelineConfig, Relay, Resource, Result,
    Source,
};

use crate::file::TextFile;

/// Lines of a text file, terminators kept.
pub struct FileReadStream {
    file: TextFile,
}

impl FileReadStream {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Source<String>> {
        Ok(Source::from_origin(Self {
            file: TextFile::open(path)?,
        }))
    }
}

impl Origin for FileReadStream {
    type Item = String;

    fn kind(&self) -> &'static str {
        "file_read_stream"
    }

    fn produce(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let n = self.file.read_line(&mut line)?;
        Ok((n > 0).then_some(line))
    }

    fn capability(&self, capability: Capability) -> Option<&(dyn Resource + 'static)> {
        if self.file.supports(capability) {
            Some(&self.file)
        } else {
            None
        }
    }

    fn capability_mut(
        &mut self,
        capability: Capability,
    ) -> Option<&mut (dyn Resource + 'static)> {
        if self.file.supports(capability) {
            Some(&mut self.file)
        } else {
            None
        }
    }

    fn enter(&mut self) -> Result<()> {
        self.file.enter()
    }

    fn exit(&mut self) -> Result<()> {
        self.file.exit()
    }
}

/// Fixed-size text chunks (counted in chars) read from any readable resource.
/// The last chunk may be shorter.
pub struct ReadStream<R> {
    resource: R,
    chunk_chars: usize,
    pending: Vec<u8>,
    eof: bool,
}

impl<R: Resource + 'static> ReadStream<R> {
    pub fn new(resource: R, chunk_chars: usize) -> Result<Source<String>> {
        if chunk_chars == 0 {
            return Err(Error::Config("chunk size must be greater than zero".into()));
        }
        if !resource.supports(Capability::Read) {
            return Err(Error::NotIterable {
                type_name: std::any::type_name::<R>(),
            });
        }
        Ok(Source::from_origin(Self {
            resource,
            chunk_chars,
            pending: Vec::new(),
            eof: false,
        }))
    }

    /// Chunk size taken from `config.read_chunk_chars`.
    pub fn with_config(resource: R, config: &PipelineConfig) -> Result<Source<String>> {
        Self::new(resource, config.read_chunk_chars)
    }

    fn take(&mut self, len: usize) -> String {
        let rest = self.pending.split_off(len);
        let chunk = std::mem::replace(&mut self.pending, rest);
        String::from_utf8_lossy(&chunk).into_owned()
    }
}

impl<R: Resource + 'static> Origin for ReadStream<R> {
    type Item = String;

    fn kind(&self) -> &'static str {
        "read_stream"
    }

    fn produce(&mut self) -> Result<Option<String>> {
        let mut buf = [0u8; 8192];
        loop {
            let valid = match std::str::from_utf8(&self.pending) {
                Ok(text) => text.len(),
                Err(e) if e.error_len().is_some() => {
                    return Err(Error::Io(io::Error::new(io::ErrorKind::InvalidData, e)));
                }
                Err(e) => e.valid_up_to(),
            };
            let text = std::str::from_utf8(&self.pending[..valid])
                .map_err(|e| Error::Io(io::Error::new(io::ErrorKind::InvalidData, e)))?;
            if let Some((end, _)) = text.char_indices().nth(self.chunk_chars) {
                return Ok(Some(self.take(end)));
            }
            if self.eof {
                if self.pending.is_empty() {
                    return Ok(None);
                }
                if valid < self.pending.len() {
                    return Err(Error::Io(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "stream ended inside a UTF-8 sequence",
                    )));
                }
                let len = self.pending.len();
                return Ok(Some(self.take(len)));
            }
            let n = self.resource.read(&mut buf)?;
            if n == 0 {
                self.eof = true;
            } else {
                self.pending.extend_from_slice(&buf[..n]);
            }
        }
    }

    fn capability(&self, capability: Capability) -> Option<&(dyn Resource + 'static)> {
        if self.resource.supports(capability) {
            Some(&self.resource)
        } else {
            None
        }
    }

    fn capability_mut(
        &mut self,
        capability: Capability,
    ) -> Option<&mut (dyn Resource + 'static)> {
        if self.resource.supports(capability) {
            Some(&mut self.resource)
        } else {
            None
        }
    }

    fn enter(&mut self) -> Result<()> {
        self.resource.enter()
    }

    fn exit(&mut self) -> Result<()> {
        self.resource.exit()
    }
}

/// Writes each item plus a terminator into the relay's resource.
pub struct WriteStream<T> {
    terminator: String,
    _item: PhantomData<fn(T)>,
}

impl<T: AsRef<str> + 'static> WriteStream<T> {
    /// A relay writing into `resource`, one item per line.
    pub fn new<R: Resource + 'static>(resource: R) -> Relay<Self> {
        Self::with_terminator(resource, "\n")
    }

    pub fn with_terminator<R: Resource + 'static>(
        resource: R,
        terminator: impl Into<String>,
    ) -> Relay<Self> {
        let op = Self {
            terminator: terminator.into(),
            _item: PhantomData,
        };
        Relay::with_resource(op, resource)
    }

    /// Terminator taken from `config.line_terminator`.
    pub fn with_config<R: Resource + 'static>(resource: R, config: &PipelineConfig) -> Relay<Self> {
        Self::with_terminator(resource, config.line_terminator.clone())
    }

    pub fn terminator(&self) -> &str {
        &self.terminator
    }
}

pub struct WriteCursor {
    terminator: Vec<u8>,
}

impl<T: AsRef<str>> Cursor<T> for WriteCursor {
    type Output = T;

    fn next_item(&mut self, ctx: &mut Context<'_, T>) -> Result<Option<T>> {
        let Some(item) = ctx.pull()? else {
            return Ok(None);
        };
        let sink = ctx.resource(Capability::Write)?;
        write_all(sink, item.as_ref().as_bytes())?;
        write_all(sink, &self.terminator)?;
        Ok(Some(item))
    }
}

impl<T: AsRef<str> + 'static> Operator for WriteStream<T> {
    type Input = T;
    type Output = T;
    type Cursor = WriteCursor;

    fn name(&self) -> &'static str {
        "write_stream"
    }

    fn initialize(&mut self, ctx: &mut Context<'_, T>) -> Result<WriteCursor> {
        // Fail at materialization, not at the first item.
        ctx.resource(Capability::Write)?;
        Ok(WriteCursor {
            terminator: self.terminator.as_bytes().to_vec(),
        })
    }

    fn finalize(&mut self, ctx: &mut Context<'_, T>) -> Result<()> {
        if let Ok(sink) = ctx.resource(Capability::Flush) {
            sink.flush()?;
        }
        Ok(())
    }
}

fn write_all(sink: &mut (dyn Resource + 'static), mut buf: &[u8]) -> Result<()> {
    while !buf.is_empty() {
        let n = sink.write(buf)?;
        if n == 0 {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::WriteZero,
                "resource accepted no bytes",
            )));
        }
        buf = &buf[n..];
    }
    Ok(())
}

/// A [`WriteStream`] into a freshly created (or truncated) file.
pub struct FileWriteStream;

impl FileWriteStream {
    pub fn create<T, P>(path: P) -> Result<Relay<WriteStream<T>>>
    where
        T: AsRef<str> + 'static,
        P: AsRef<Path>,
    {
        Ok(WriteStream::new(TextFile::create(path)?))
    }

    pub fn create_with_terminator<T, P>(
        path: P,
        terminator: impl Into<String>,
    ) -> Result<Relay<WriteStream<T>>>
    where
        T: AsRef<str> + 'static,
        P: AsRef<Path>,
    {
        Ok(WriteStream::with_terminator(TextFile::create(path)?, terminator))
    }
}
