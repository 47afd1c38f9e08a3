//! The root of every chain.
//!
//! A `Source` wraps an [`Origin`]: a plain iterator, a resource plus a
//! generator that pulls items out of it, or a whole chain re-exposed as one
//! stage. Resource operations and scopes delegate to the origin.

use std::any::type_name;
use std::iter::Fuse;
use std::ops::Shr;

use crate::error::{Error, Result};
use crate::pipe::Pipe;
use crate::relay::Relay;
use crate::resource::{Capability, Resource};
use crate::stage::{AnyStage, BoxStage, Operator, Stage, StageExt};

/// What a [`Source`] draws items from.
pub trait Origin: 'static {
    type Item;

    fn kind(&self) -> &'static str {
        "source"
    }

    /// Runs once, when the owning source materializes.
    fn prepare(&mut self) -> Result<()> {
        Ok(())
    }

    fn produce(&mut self) -> Result<Option<Self::Item>>;

    fn header(&self) -> Option<&[String]> {
        None
    }

    fn capability(&self, _capability: Capability) -> Option<&(dyn Resource + 'static)> {
        None
    }

    fn capability_mut(
        &mut self,
        _capability: Capability,
    ) -> Option<&mut (dyn Resource + 'static)> {
        None
    }

    fn enter(&mut self) -> Result<()> {
        Ok(())
    }

    fn exit(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Origin over an in-memory iterator.
struct Items<I: Iterator> {
    iter: Fuse<I>,
}

impl<I> Origin for Items<I>
where
    I: Iterator + 'static,
{
    type Item = I::Item;

    fn produce(&mut self) -> Result<Option<Self::Item>> {
        Ok(self.iter.next())
    }
}

/// Origin over a resource plus a function pulling one item out of it.
struct Generated<R, F> {
    resource: R,
    generator: F,
    exhausted: bool,
}

impl<R, F, T> Origin for Generated<R, F>
where
    R: Resource + 'static,
    F: FnMut(&mut R) -> Result<Option<T>> + 'static,
{
    type Item = T;

    fn produce(&mut self) -> Result<Option<T>> {
        if self.exhausted {
            return Ok(None);
        }
        let item = (self.generator)(&mut self.resource)?;
        self.exhausted = item.is_none();
        Ok(item)
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

/// Origin over a complete chain.
struct Nested<T> {
    stage: BoxStage<T>,
}

impl<T: 'static> Origin for Nested<T> {
    type Item = T;

    fn kind(&self) -> &'static str {
        self.stage.kind()
    }

    fn prepare(&mut self) -> Result<()> {
        self.stage.materialize()
    }

    fn produce(&mut self) -> Result<Option<T>> {
        self.stage.next_item()
    }

    fn header(&self) -> Option<&[String]> {
        self.stage.header()
    }

    fn capability(&self, capability: Capability) -> Option<&(dyn Resource + 'static)> {
        self.stage.capability(capability)
    }

    fn capability_mut(
        &mut self,
        capability: Capability,
    ) -> Option<&mut (dyn Resource + 'static)> {
        self.stage.capability_mut(capability)
    }

    fn enter(&mut self) -> Result<()> {
        self.stage.enter()
    }

    fn exit(&mut self) -> Result<()> {
        self.stage.exit()
    }
}

/// A stage with no upstream.
pub struct Source<T> {
    origin: Box<dyn Origin<Item = T>>,
    materialized: bool,
    finalized: bool,
}

impl<T: 'static> Source<T> {
    /// Wrap an existing sequence.
    pub fn new<I>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: 'static,
    {
        Self::from_origin(Items {
            iter: items.into_iter().fuse(),
        })
    }

    /// Wrap `resource`, drawing items with `generator` until it returns `None`.
    pub fn with_generator<R, F>(resource: R, generator: F) -> Self
    where
        R: Resource + 'static,
        F: FnMut(&mut R) -> Result<Option<T>> + 'static,
    {
        Self::from_origin(Generated {
            resource,
            generator,
            exhausted: false,
        })
    }

    /// Re-expose a complete chain as the root of a new one.
    pub fn from_stage<S>(stage: S) -> Self
    where
        S: Stage<Item = T> + 'static,
    {
        Self::from_origin(Nested {
            stage: Box::new(stage),
        })
    }

    pub fn from_origin<O>(origin: O) -> Self
    where
        O: Origin<Item = T>,
    {
        Self {
            origin: Box::new(origin),
            materialized: false,
            finalized: false,
        }
    }
}

impl Source<String> {
    /// Wrap a line-readable resource; items are its lines, terminators kept.
    ///
    /// Fails with [`Error::NotIterable`] when the resource cannot read lines.
    pub fn from_resource<R>(resource: R) -> Result<Self>
    where
        R: Resource + 'static,
    {
        if !resource.supports(Capability::ReadLine) {
            return Err(Error::NotIterable {
                type_name: type_name::<R>(),
            });
        }
        Ok(Self::with_generator(resource, |r: &mut R| {
            let mut line = String::new();
            let n = r.read_line(&mut line)?;
            Ok((n > 0).then_some(line))
        }))
    }
}

impl<T: 'static> Stage for Source<T> {
    type Item = T;

    fn kind(&self) -> &'static str {
        self.origin.kind()
    }

    fn materialize(&mut self) -> Result<()> {
        if self.materialized {
            return Ok(());
        }
        self.origin.prepare()?;
        self.materialized = true;
        #[cfg(feature = "tracing")]
        tracing::trace!(stage = self.origin.kind(), "materialized");
        Ok(())
    }

    fn is_materialized(&self) -> bool {
        self.materialized
    }

    fn next_item(&mut self) -> Result<Option<T>> {
        self.materialize()?;
        match self.origin.produce()? {
            Some(item) => Ok(Some(item)),
            None => {
                if !self.finalized {
                    self.finalized = true;
                    #[cfg(feature = "tracing")]
                    tracing::trace!(stage = self.origin.kind(), "finalized");
                }
                Ok(None)
            }
        }
    }

    fn is_finalized(&self) -> bool {
        self.finalized
    }

    fn has_upstream(&self) -> bool {
        false
    }

    fn is_open(&self) -> bool {
        false
    }

    fn chain_depth(&self) -> usize {
        1
    }

    fn set_upstream(&mut self, _upstream: AnyStage) -> Result<()> {
        Err(Error::SourceHasUpstream)
    }

    fn header(&self) -> Option<&[String]> {
        self.origin.header()
    }

    fn capability(&self, capability: Capability) -> Option<&(dyn Resource + 'static)> {
        self.origin.capability(capability)
    }

    fn capability_mut(
        &mut self,
        capability: Capability,
    ) -> Option<&mut (dyn Resource + 'static)> {
        self.origin.capability_mut(capability)
    }

    fn enter(&mut self) -> Result<()> {
        #[cfg(feature = "tracing")]
        tracing::trace!(stage = self.origin.kind(), "enter");
        self.origin.enter()
    }

    fn exit(&mut self) -> Result<()> {
        #[cfg(feature = "tracing")]
        tracing::trace!(stage = self.origin.kind(), "exit");
        self.origin.exit()
    }
}

/// `source >> relay` is `source.then(relay)`, with the item types checked
/// at compile time.
impl<T: 'static, O> Shr<Relay<O>> for Source<T>
where
    O: Operator<Input = T>,
{
    type Output = Result<Relay<O>>;

    fn shr(self, downstream: Relay<O>) -> Self::Output {
        self.then(downstream)
    }
}

impl<T: 'static, Out: 'static> Shr<Pipe<T, Out>> for Source<T> {
    type Output = Result<Pipe<T, Out>>;

    fn shr(self, downstream: Pipe<T, Out>) -> Self::Output {
        self.then(downstream)
    }
}
