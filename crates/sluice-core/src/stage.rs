//! The stage contract shared by every pipeline element.
//!
//! A chain is a singly-linked list owned by its tail: each stage owns at most
//! one upstream. Nothing runs until the tail is pulled. The first pull
//! materializes the chain root-first (each stage builds its cursor after its
//! upstream has built one), and each stage finalizes once, when its own
//! sequence reports exhaustion.
//!
//! Relays are usually written as an [`Operator`] (configuration, run once at
//! materialization) producing a [`Cursor`] (per-item state), and wrapped in
//! [`crate::Relay`], which supplies the upstream slot, the memoization cell,
//! the finalization latch and capability delegation.

use std::any::{type_name, Any};
use std::fmt;
use std::io::SeekFrom;

use crate::error::{Error, Result};
use crate::relay::Relay;
use crate::resource::{Capability, Resource};

/// Owned, type-erased stage yielding `T`.
pub type BoxStage<T> = Box<dyn Stage<Item = T>>;

/// A pipeline element: a `Source` or a `Relay`.
pub trait Stage {
    type Item;

    /// Stable, human-readable stage kind (used in errors and traces).
    fn kind(&self) -> &'static str;

    /// Materialize this stage and, before it, everything upstream.
    ///
    /// Idempotent: initialization runs at most once per stage instance.
    fn materialize(&mut self) -> Result<()>;

    fn is_materialized(&self) -> bool;

    /// Pull one item, materializing first if needed. `Ok(None)` means the
    /// sequence is exhausted; the first exhaustion runs finalization.
    fn next_item(&mut self) -> Result<Option<Self::Item>>;

    fn is_finalized(&self) -> bool;

    /// Whether this stage's own upstream slot is filled. Always false for sources.
    fn has_upstream(&self) -> bool;

    /// Whether some stage in this chain still has an empty upstream slot.
    fn is_open(&self) -> bool;

    /// Number of stages reachable by following upstream links, this one included.
    fn chain_depth(&self) -> usize;

    /// Install `upstream` at the root-most empty slot of this chain.
    ///
    /// A relay with an empty slot takes the stage; a relay whose slot is
    /// filled forwards the call to its upstream; a source always fails with
    /// [`Error::SourceHasUpstream`].
    fn set_upstream(&mut self, upstream: AnyStage) -> Result<()>;

    /// Nearest column header in the chain, if a stage provides one.
    fn header(&self) -> Option<&[String]> {
        None
    }

    /// Nearest resource in the chain providing `capability`.
    fn capability(&self, capability: Capability) -> Option<&(dyn Resource + 'static)>;

    fn capability_mut(&mut self, capability: Capability)
        -> Option<&mut (dyn Resource + 'static)>;

    /// Open a scope over this stage and its upstream resources.
    fn enter(&mut self) -> Result<()>;

    /// Close the scope opened by [`Stage::enter`].
    fn exit(&mut self) -> Result<()>;
}

impl<S: Stage + ?Sized> Stage for Box<S> {
    type Item = S::Item;

    fn kind(&self) -> &'static str {
        (**self).kind()
    }
    fn materialize(&mut self) -> Result<()> {
        (**self).materialize()
    }
    fn is_materialized(&self) -> bool {
        (**self).is_materialized()
    }
    fn next_item(&mut self) -> Result<Option<Self::Item>> {
        (**self).next_item()
    }
    fn is_finalized(&self) -> bool {
        (**self).is_finalized()
    }
    fn has_upstream(&self) -> bool {
        (**self).has_upstream()
    }
    fn is_open(&self) -> bool {
        (**self).is_open()
    }
    fn chain_depth(&self) -> usize {
        (**self).chain_depth()
    }
    fn set_upstream(&mut self, upstream: AnyStage) -> Result<()> {
        (**self).set_upstream(upstream)
    }
    fn header(&self) -> Option<&[String]> {
        (**self).header()
    }
    fn capability(&self, capability: Capability) -> Option<&(dyn Resource + 'static)> {
        (**self).capability(capability)
    }
    fn capability_mut(
        &mut self,
        capability: Capability,
    ) -> Option<&mut (dyn Resource + 'static)> {
        (**self).capability_mut(capability)
    }
    fn enter(&mut self) -> Result<()> {
        (**self).enter()
    }
    fn exit(&mut self) -> Result<()> {
        (**self).exit()
    }
}

/// A boxed stage with its item type erased, handed to [`Stage::set_upstream`].
///
/// The open slot that finally receives it recovers the concrete
/// `BoxStage<T>`; a mismatch surfaces as [`Error::UpstreamType`].
pub struct AnyStage {
    inner: Box<dyn Any>,
    item_type: &'static str,
}

impl AnyStage {
    pub fn new<T: 'static>(stage: BoxStage<T>) -> Self {
        Self {
            inner: Box::new(stage),
            item_type: type_name::<T>(),
        }
    }

    /// Name of the item type the wrapped stage yields.
    pub fn item_type(&self) -> &'static str {
        self.item_type
    }

    pub fn downcast<T: 'static>(self) -> std::result::Result<BoxStage<T>, AnyStage> {
        let item_type = self.item_type;
        match self.inner.downcast::<BoxStage<T>>() {
            Ok(stage) => Ok(*stage),
            Err(inner) => Err(AnyStage { inner, item_type }),
        }
    }
}

impl fmt::Debug for AnyStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyStage")
            .field("item_type", &self.item_type)
            .finish()
    }
}

/// What an operator sees of its relay: the upstream (if any) and the relay's
/// own resource (if any).
pub struct Context<'a, T> {
    stage: &'static str,
    upstream: Option<&'a mut (dyn Stage<Item = T> + 'static)>,
    resource: Option<&'a mut (dyn Resource + 'static)>,
}

impl<'a, T> Context<'a, T> {
    pub fn new(
        stage: &'static str,
        upstream: Option<&'a mut (dyn Stage<Item = T> + 'static)>,
        resource: Option<&'a mut (dyn Resource + 'static)>,
    ) -> Self {
        Self {
            stage,
            upstream,
            resource,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.upstream.is_some()
    }

    /// Pull one item from upstream.
    pub fn pull(&mut self) -> Result<Option<T>> {
        self.upstream()?.next_item()
    }

    pub fn upstream(&mut self) -> Result<&mut (dyn Stage<Item = T> + 'static)> {
        match self.upstream.as_mut() {
            Some(upstream) => Ok(&mut **upstream),
            None => Err(Error::EmptyUpstream { stage: self.stage }),
        }
    }

    pub fn header(&self) -> Option<&[String]> {
        self.upstream.as_ref().and_then(|upstream| upstream.header())
    }

    /// The relay's own resource, which must provide `capability`.
    pub fn resource(&mut self, capability: Capability) -> Result<&mut (dyn Resource + 'static)> {
        match self.resource.as_mut() {
            Some(resource) if resource.supports(capability) => Ok(&mut **resource),
            _ => Err(Error::missing(capability)),
        }
    }
}

/// Relay configuration: builds a cursor once the upstream is materialized.
pub trait Operator: 'static {
    type Input: 'static;
    type Output: 'static;
    type Cursor: Cursor<Self::Input, Output = Self::Output>;

    /// Stable operator name.
    fn name(&self) -> &'static str;

    /// Operators that can run without an upstream (pure concatenation) return false.
    fn requires_upstream(&self) -> bool {
        true
    }

    /// Build the lazy sequence. Runs exactly once per relay.
    fn initialize(&mut self, ctx: &mut Context<'_, Self::Input>) -> Result<Self::Cursor>;

    /// Runs once, after the cursor first reports exhaustion.
    fn finalize(&mut self, _ctx: &mut Context<'_, Self::Input>) -> Result<()> {
        Ok(())
    }

    /// Header this operator produces, overriding the upstream's.
    fn header(&self) -> Option<&[String]> {
        None
    }
}

/// Per-item state of a materialized relay.
pub trait Cursor<In> {
    type Output;

    fn next_item(&mut self, ctx: &mut Context<'_, In>) -> Result<Option<Self::Output>>;
}

/// Iterator over a stage. Yields `Err` at most once, then stops.
pub struct Iter<'a, S: ?Sized> {
    stage: &'a mut S,
    failed: bool,
}

impl<'a, S: Stage + ?Sized> Iterator for Iter<'a, S> {
    type Item = Result<S::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.stage.next_item() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// Chain assembly, draining, scopes and forwarded resource calls.
pub trait StageExt: Stage {
    /// Join `downstream` after this stage and return it.
    ///
    /// The stage lands in the root-most open slot of `downstream`, so a
    /// fragment assembled without a source attaches as one unit.
    fn then<D>(self, mut downstream: D) -> Result<D>
    where
        Self: Sized + 'static,
        Self::Item: 'static,
        D: Stage,
    {
        downstream.set_upstream(AnyStage::new::<Self::Item>(Box::new(self)))?;
        Ok(downstream)
    }

    /// Feed this stage into a fresh relay around `operator`.
    ///
    /// Unlike [`StageExt::then`] the operator's input type is tied to this
    /// stage's item type, so generic operators need no annotations.
    fn relay<O>(self, operator: O) -> Result<Relay<O>>
    where
        Self: Sized + 'static,
        O: Operator<Input = Self::Item>,
    {
        self.then(Relay::new(operator))
    }

    fn boxed(self) -> BoxStage<Self::Item>
    where
        Self: Sized + 'static,
    {
        Box::new(self)
    }

    /// Lazily iterate. Not restartable: a second call resumes where the first stopped.
    fn iter(&mut self) -> Iter<'_, Self> {
        Iter {
            stage: self,
            failed: false,
        }
    }

    /// Drain the stage, discarding items.
    fn run(&mut self) -> Result<&mut Self> {
        while self.next_item()?.is_some() {}
        Ok(self)
    }

    /// Drain the stage, handing each item to `hook`.
    fn run_with<F>(&mut self, mut hook: F) -> Result<&mut Self>
    where
        F: FnMut(Self::Item),
    {
        while let Some(item) = self.next_item()? {
            hook(item);
        }
        Ok(self)
    }

    fn collect_items(&mut self) -> Result<Vec<Self::Item>> {
        let mut out = Vec::new();
        while let Some(item) = self.next_item()? {
            out.push(item);
        }
        Ok(out)
    }

    /// Materialize and return the nearest header in the chain.
    fn fields(&mut self) -> Result<Option<Vec<String>>> {
        self.materialize()?;
        Ok(self.header().map(|h| h.to_vec()))
    }

    /// Run `f` between exactly one `enter` and one `exit`. `exit` runs even
    /// when `f` fails; the first error wins.
    fn scoped<R, F>(&mut self, f: F) -> Result<R>
    where
        F: FnOnce(&mut Self) -> Result<R>,
    {
        self.enter()?;
        let out = f(self);
        let exited = self.exit();
        match (out, exited) {
            (Ok(value), Ok(())) => Ok(value),
            (Err(e), _) | (Ok(_), Err(e)) => Err(e),
        }
    }

    fn lookup(&self, capability: Capability) -> Result<&(dyn Resource + 'static)> {
        self.capability(capability)
            .ok_or(Error::missing(capability))
    }

    fn lookup_mut(&mut self, capability: Capability) -> Result<&mut (dyn Resource + 'static)> {
        self.capability_mut(capability)
            .ok_or(Error::missing(capability))
    }

    fn resource_name(&self) -> Result<&str> {
        self.lookup(Capability::Name)?
            .name()
            .ok_or(Error::missing(Capability::Name))
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.lookup_mut(Capability::Read)?.read(buf)
    }

    /// Read the nearest readable resource to its end.
    fn read_to_string(&mut self) -> Result<String> {
        let resource = self.lookup_mut(Capability::Read)?;
        let mut bytes = Vec::new();
        let mut chunk = [0u8; 8192];
        loop {
            let n = resource.read(&mut chunk)?;
            if n == 0 {
                break;
            }
            bytes.extend_from_slice(&chunk[..n]);
        }
        String::from_utf8(bytes)
            .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
    }

    fn read_line(&mut self, buf: &mut String) -> Result<usize> {
        self.lookup_mut(Capability::ReadLine)?.read_line(buf)
    }

    fn write_bytes(&mut self, buf: &[u8]) -> Result<usize> {
        self.lookup_mut(Capability::Write)?.write(buf)
    }

    fn flush(&mut self) -> Result<()> {
        self.lookup_mut(Capability::Flush)?.flush()
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        self.lookup_mut(Capability::Seek)?.seek(pos)
    }

    fn close(&mut self) -> Result<()> {
        self.lookup_mut(Capability::Close)?.close()
    }

    fn is_closed(&self) -> Result<bool> {
        Ok(self.lookup(Capability::Close)?.is_closed())
    }
}

impl<S: Stage + ?Sized> StageExt for S {}
