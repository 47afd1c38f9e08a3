//! A stage with exactly one upstream slot.
//!
//! `Relay` owns the slot, the memoized cursor, the finalization latch and an
//! optional local resource; the per-item behavior comes from an [`Operator`].

use std::any::type_name;
use std::ops::Shr;

use crate::error::{Error, Result};
use crate::pipe::Pipe;
use crate::resource::{Capability, Resource};
use crate::stage::{AnyStage, BoxStage, Context, Cursor, Operator, Stage, StageExt};

pub struct Relay<O: Operator> {
    operator: O,
    upstream: Option<BoxStage<O::Input>>,
    /// Local capability object, consulted before the upstream.
    resource: Option<Box<dyn Resource>>,
    cursor: Option<O::Cursor>,
    finalized: bool,
}

impl<O: Operator> Relay<O> {
    pub fn new(operator: O) -> Self {
        Self {
            operator,
            upstream: None,
            resource: None,
            cursor: None,
            finalized: false,
        }
    }

    /// A relay carrying its own resource (e.g. an output sink).
    pub fn with_resource<R>(operator: O, resource: R) -> Self
    where
        R: Resource + 'static,
    {
        Self {
            resource: Some(Box::new(resource)),
            ..Self::new(operator)
        }
    }

    pub fn operator(&self) -> &O {
        &self.operator
    }

    pub fn operator_mut(&mut self) -> &mut O {
        &mut self.operator
    }

    /// The filled upstream slot; [`Error::EmptyUpstream`] if it is empty.
    pub fn upstream(&self) -> Result<&(dyn Stage<Item = O::Input> + 'static)> {
        self.upstream.as_deref().ok_or(Error::EmptyUpstream {
            stage: self.operator.name(),
        })
    }

    pub fn upstream_mut(&mut self) -> Result<&mut (dyn Stage<Item = O::Input> + 'static)> {
        let stage = self.operator.name();
        self.upstream
            .as_deref_mut()
            .ok_or(Error::EmptyUpstream { stage })
    }

    pub fn resource(&self) -> Option<&(dyn Resource + 'static)> {
        self.resource.as_deref()
    }
}

impl<O: Operator> Stage for Relay<O> {
    type Item = O::Output;

    fn kind(&self) -> &'static str {
        self.operator.name()
    }

    fn materialize(&mut self) -> Result<()> {
        if self.cursor.is_some() {
            return Ok(());
        }
        let stage = self.operator.name();
        match self.upstream.as_mut() {
            Some(upstream) => upstream.materialize()?,
            None if self.operator.requires_upstream() => {
                return Err(Error::EmptyUpstream { stage });
            }
            None => {}
        }
        let mut ctx = Context::new(
            stage,
            self.upstream.as_deref_mut(),
            self.resource.as_deref_mut(),
        );
        let cursor = self.operator.initialize(&mut ctx)?;
        self.cursor = Some(cursor);
        #[cfg(feature = "tracing")]
        tracing::trace!(stage, "materialized");
        Ok(())
    }

    fn is_materialized(&self) -> bool {
        self.cursor.is_some()
    }

    fn next_item(&mut self) -> Result<Option<O::Output>> {
        if self.finalized {
            return Ok(None);
        }
        self.materialize()?;
        let stage = self.operator.name();
        let cursor = self
            .cursor
            .as_mut()
            .ok_or_else(|| Error::Invariant(format!("{stage}: no cursor after materialize")))?;
        let mut ctx = Context::new(
            stage,
            self.upstream.as_deref_mut(),
            self.resource.as_deref_mut(),
        );
        match cursor.next_item(&mut ctx)? {
            Some(item) => Ok(Some(item)),
            None => {
                self.finalized = true;
                self.operator.finalize(&mut ctx)?;
                #[cfg(feature = "tracing")]
                tracing::trace!(stage, "finalized");
                Ok(None)
            }
        }
    }

    fn is_finalized(&self) -> bool {
        self.finalized
    }

    fn has_upstream(&self) -> bool {
        self.upstream.is_some()
    }

    fn is_open(&self) -> bool {
        self.upstream.as_ref().map_or(true, |upstream| upstream.is_open())
    }

    fn chain_depth(&self) -> usize {
        1 + self.upstream.as_ref().map_or(0, |upstream| upstream.chain_depth())
    }

    /// Fill the empty slot, or hand `upstream` on to the filled one.
    fn set_upstream(&mut self, upstream: AnyStage) -> Result<()> {
        if let Some(existing) = self.upstream.as_mut() {
            return existing.set_upstream(upstream);
        }
        match upstream.downcast::<O::Input>() {
            Ok(stage) => {
                #[cfg(feature = "tracing")]
                tracing::trace!(stage = self.operator.name(), upstream = stage.kind(), "spliced");
                self.upstream = Some(stage);
                Ok(())
            }
            Err(other) => Err(Error::UpstreamType {
                expected: type_name::<O::Input>(),
                found: other.item_type(),
            }),
        }
    }

    fn header(&self) -> Option<&[String]> {
        self.operator
            .header()
            .or_else(|| self.upstream.as_ref().and_then(|upstream| upstream.header()))
    }

    fn capability(&self, capability: Capability) -> Option<&(dyn Resource + 'static)> {
        match self.resource.as_deref() {
            Some(resource) if resource.supports(capability) => Some(resource),
            _ => self
                .upstream
                .as_ref()
                .and_then(|upstream| upstream.capability(capability)),
        }
    }

    fn capability_mut(
        &mut self,
        capability: Capability,
    ) -> Option<&mut (dyn Resource + 'static)> {
        if self
            .resource
            .as_ref()
            .is_some_and(|resource| resource.supports(capability))
        {
            return self.resource.as_deref_mut();
        }
        self.upstream
            .as_mut()
            .and_then(|upstream| upstream.capability_mut(capability))
    }

    /// Local resource first, then the upstream chain.
    fn enter(&mut self) -> Result<()> {
        let stage = self.operator.name();
        #[cfg(feature = "tracing")]
        tracing::trace!(stage, "enter");
        if let Some(resource) = self.resource.as_mut() {
            resource.enter()?;
        }
        let entered = match self.upstream.as_mut() {
            Some(upstream) => upstream.enter(),
            None if self.operator.requires_upstream() => Err(Error::EmptyUpstream { stage }),
            None => Ok(()),
        };
        if entered.is_err() {
            if let Some(Err(_local)) = self.resource.as_mut().map(|resource| resource.exit()) {
                #[cfg(feature = "tracing")]
                tracing::trace!(stage, error = %_local, "local exit failed during enter unwind");
            }
        }
        entered
    }

    /// Local resource released first, then the upstream chain.
    fn exit(&mut self) -> Result<()> {
        #[cfg(feature = "tracing")]
        tracing::trace!(stage = self.operator.name(), "exit");
        let local = match self.resource.as_mut() {
            Some(resource) => resource.exit(),
            None => Ok(()),
        };
        let upstream = match self.upstream.as_mut() {
            Some(upstream) => upstream.exit(),
            None => Ok(()),
        };
        local.and(upstream)
    }
}

/// `upstream >> relay` is `upstream.then(relay)`, with the link between the
/// two checked at compile time.
impl<O1, O2> Shr<Relay<O2>> for Relay<O1>
where
    O1: Operator,
    O2: Operator<Input = O1::Output>,
{
    type Output = Result<Relay<O2>>;

    fn shr(self, downstream: Relay<O2>) -> Self::Output {
        self.then(downstream)
    }
}

impl<O, Out> Shr<Pipe<O::Output, Out>> for Relay<O>
where
    O: Operator,
    Out: 'static,
{
    type Output = Result<Pipe<O::Output, Out>>;

    fn shr(self, downstream: Pipe<O::Output, Out>) -> Self::Output {
        self.then(downstream)
    }
}
