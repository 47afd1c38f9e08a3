//! Capability interface for resources carried by a chain.
//!
//! A `Source` may wrap a resource (an open file, an in-memory buffer) and a
//! `Relay` may carry one of its own (an output sink). Stages never re-declare
//! resource operations; `Stage::capability_mut` walks local resource first,
//! then upstream, until some resource answers `supports(cap) == true`.

use std::fmt;
use std::io::SeekFrom;

use crate::error::{Error, Result};

/// Operations a chain can forward to the resource that owns them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Name,
    Read,
    ReadLine,
    Write,
    Flush,
    Seek,
    Close,
    /// Scoped acquisition (enter/exit).
    Scope,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Name => "name",
            Capability::Read => "read",
            Capability::ReadLine => "read_line",
            Capability::Write => "write",
            Capability::Flush => "flush",
            Capability::Seek => "seek",
            Capability::Close => "close",
            Capability::Scope => "scope",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file-like resource. Every operation defaults to "not provided"; an
/// implementation overrides the ones it lists in `supports`.
pub trait Resource {
    /// Whether this resource answers `capability`. Delegation stops at the
    /// first resource that returns true.
    fn supports(&self, capability: Capability) -> bool;

    fn name(&self) -> Option<&str> {
        None
    }

    fn read(&mut self, _buf: &mut [u8]) -> Result<usize> {
        Err(Error::missing(Capability::Read))
    }

    /// Append one line (terminator included) to `buf`; returns bytes read, 0 at EOF.
    fn read_line(&mut self, _buf: &mut String) -> Result<usize> {
        Err(Error::missing(Capability::ReadLine))
    }

    fn write(&mut self, _buf: &[u8]) -> Result<usize> {
        Err(Error::missing(Capability::Write))
    }

    fn flush(&mut self) -> Result<()> {
        Err(Error::missing(Capability::Flush))
    }

    fn seek(&mut self, _pos: SeekFrom) -> Result<u64> {
        Err(Error::missing(Capability::Seek))
    }

    fn close(&mut self) -> Result<()> {
        Err(Error::missing(Capability::Close))
    }

    fn is_closed(&self) -> bool {
        false
    }

    /// Called when a scope over the owning stage opens. No-op by default.
    fn enter(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called when a scope over the owning stage closes. No-op by default.
    fn exit(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<R: Resource + ?Sized> Resource for Box<R> {
    fn supports(&self, capability: Capability) -> bool {
        (**self).supports(capability)
    }
    fn name(&self) -> Option<&str> {
        (**self).name()
    }
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }
    fn read_line(&mut self, buf: &mut String) -> Result<usize> {
        (**self).read_line(buf)
    }
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        (**self).write(buf)
    }
    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        (**self).seek(pos)
    }
    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
    fn enter(&mut self) -> Result<()> {
        (**self).enter()
    }
    fn exit(&mut self) -> Result<()> {
        (**self).exit()
    }
}
