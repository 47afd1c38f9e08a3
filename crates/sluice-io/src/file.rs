//! File-like resources: an on-disk text file and an in-memory text buffer.

use std::cell::RefCell;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::rc::Rc;

use sluice_core::{Capability, Error, Resource, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Read,
    Write,
}

enum Handle {
    Reader(BufReader<File>),
    Writer(BufWriter<File>),
}

/// A text file opened for reading or for writing. Leaving a scope closes it.
pub struct TextFile {
    name: String,
    mode: Mode,
    handle: Option<Handle>,
}

impl TextFile {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Ok(Self {
            name: path.as_ref().display().to_string(),
            mode: Mode::Read,
            handle: Some(Handle::Reader(BufReader::new(file))),
        })
    }

    /// Create (or truncate) `path` for writing.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path.as_ref())?;
        Ok(Self {
            name: path.as_ref().display().to_string(),
            mode: Mode::Write,
            handle: Some(Handle::Writer(BufWriter::new(file))),
        })
    }

    fn handle(&mut self) -> Result<&mut Handle> {
        match self.handle.as_mut() {
            Some(handle) => Ok(handle),
            None => Err(Error::Closed {
                name: self.name.clone(),
            }),
        }
    }
}

impl Resource for TextFile {
    fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::Name | Capability::Seek | Capability::Close | Capability::Scope => true,
            Capability::Read | Capability::ReadLine => self.mode == Mode::Read,
            Capability::Write | Capability::Flush => self.mode == Mode::Write,
        }
    }

    fn name(&self) -> Option<&str> {
        Some(self.name.as_str())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self.handle()? {
            Handle::Reader(reader) => Ok(reader.read(buf)?),
            Handle::Writer(_) => Err(Error::missing(Capability::Read)),
        }
    }

    fn read_line(&mut self, buf: &mut String) -> Result<usize> {
        match self.handle()? {
            Handle::Reader(reader) => Ok(reader.read_line(buf)?),
            Handle::Writer(_) => Err(Error::missing(Capability::ReadLine)),
        }
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        match self.handle()? {
            Handle::Writer(writer) => Ok(writer.write(buf)?),
            Handle::Reader(_) => Err(Error::missing(Capability::Write)),
        }
    }

    fn flush(&mut self) -> Result<()> {
        match self.handle()? {
            Handle::Writer(writer) => Ok(writer.flush()?),
            Handle::Reader(_) => Err(Error::missing(Capability::Flush)),
        }
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        match self.handle()? {
            Handle::Reader(reader) => Ok(reader.seek(pos)?),
            Handle::Writer(writer) => Ok(writer.seek(pos)?),
        }
    }

    /// Flushes pending output. Closing twice is a no-op.
    fn close(&mut self) -> Result<()> {
        if let Some(Handle::Writer(mut writer)) = self.handle.take() {
            writer.flush()?;
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.handle.is_none()
    }

    fn exit(&mut self) -> Result<()> {
        self.close()
    }
}

/// Growable in-memory text. Clones share the same contents but keep their
/// own position, so a test can hand one clone to a chain and inspect another.
#[derive(Debug, Clone, Default)]
pub struct TextBuffer {
    data: Rc<RefCell<Vec<u8>>>,
    pos: usize,
    name: Option<String>,
    closed: bool,
}

impl TextBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_text(text: &str) -> Self {
        Self {
            data: Rc::new(RefCell::new(text.as_bytes().to_vec())),
            ..Self::default()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Everything written so far, regardless of position or closed state.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.data.borrow()).into_owned()
    }

    pub fn len(&self) -> usize {
        self.data.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::Closed {
                name: self.name.clone().unwrap_or_else(|| "<buffer>".to_string()),
            });
        }
        Ok(())
    }
}

impl Resource for TextBuffer {
    fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::Name => self.name.is_some(),
            _ => true,
        }
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.check_open()?;
        let data = self.data.borrow();
        let rest = data.get(self.pos..).unwrap_or_default();
        let n = rest.len().min(buf.len());
        buf[..n].copy_from_slice(&rest[..n]);
        self.pos += n;
        Ok(n)
    }

    fn read_line(&mut self, buf: &mut String) -> Result<usize> {
        self.check_open()?;
        let data = self.data.borrow();
        let rest = data.get(self.pos..).unwrap_or_default();
        let n = rest
            .iter()
            .position(|&b| b == b'\n')
            .map_or(rest.len(), |i| i + 1);
        let line = std::str::from_utf8(&rest[..n])
            .map_err(|e| Error::Io(io::Error::new(io::ErrorKind::InvalidData, e)))?;
        buf.push_str(line);
        self.pos += n;
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.check_open()?;
        let mut data = self.data.borrow_mut();
        let end = self.pos + buf.len();
        if end > data.len() {
            data.resize(end, 0);
        }
        data[self.pos..end].copy_from_slice(buf);
        self.pos = end;
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<()> {
        self.check_open()
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        self.check_open()?;
        let len = self.len() as i64;
        let target = match pos {
            SeekFrom::Start(n) => n as i64,
            SeekFrom::End(offset) => len + offset,
            SeekFrom::Current(offset) => self.pos as i64 + offset,
        };
        if target < 0 {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before start of buffer",
            )));
        }
        self.pos = target as usize;
        Ok(target as u64)
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn exit(&mut self) -> Result<()> {
        self.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_reads_lines_with_terminators() {
        let mut buf = TextBuffer::from_text("a,b\nc,d\nlast");
        let mut line = String::new();
        assert_eq!(buf.read_line(&mut line).unwrap(), 4);
        assert_eq!(line, "a,b\n");
        line.clear();
        buf.read_line(&mut line).unwrap();
        buf.read_line(&mut line).unwrap();
        assert_eq!(line, "c,d\nlast");
        assert_eq!(buf.read_line(&mut line).unwrap(), 0);
    }

    #[test]
    fn test_buffer_clones_share_contents() {
        let buf = TextBuffer::new();
        let mut writer = buf.clone();
        writer.write(b"hello ").unwrap();
        writer.write(b"world").unwrap();
        assert_eq!(buf.contents(), "hello world");

        writer.seek(SeekFrom::Start(0)).unwrap();
        writer.write(b"J").unwrap();
        assert_eq!(buf.contents(), "Jello world");
    }

    #[test]
    fn test_closed_buffer_rejects_io() {
        let mut buf = TextBuffer::from_text("x").named("mem");
        buf.close().unwrap();
        assert!(buf.is_closed());
        let err = buf.read(&mut [0u8; 4]).unwrap_err();
        assert!(matches!(err, Error::Closed { ref name } if name == "mem"));
    }

    #[test]
    fn test_text_file_round_trip() {
        let path = std::env::temp_dir().join(format!("sluice-textfile-{}.txt", std::process::id()));
        let mut out = TextFile::create(&path).unwrap();
        assert!(out.supports(Capability::Write));
        assert!(!out.supports(Capability::ReadLine));
        out.write(b"one\ntwo\n").unwrap();
        out.exit().unwrap();
        assert!(out.is_closed());
        assert!(matches!(out.flush(), Err(Error::Closed { .. })));

        let mut input = TextFile::open(&path).unwrap();
        let mut line = String::new();
        input.read_line(&mut line).unwrap();
        assert_eq!(line, "one\n");
        input.seek(SeekFrom::Start(0)).unwrap();
        let mut all = [0u8; 16];
        let n = input.read(&mut all).unwrap();
        assert_eq!(&all[..n], b"one\ntwo\n");
        std::fs::remove_file(&path).unwrap();
    }
}
