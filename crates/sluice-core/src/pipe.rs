//! Source-less chain fragments.
//!
//! A `Pipe<In, Out>` is a run of relays assembled without a source. Its open
//! end accepts a stage yielding `In`; its tail yields `Out`. A pipe is itself
//! a stage, so it can be spliced after a source with `then` or `>>`, joined to
//! another pipe with [`Pipe::compose`], or attached explicitly with
//! [`Pipe::splice`].

use std::marker::PhantomData;
use std::ops::Shr;

use crate::error::Result;
use crate::relay::Relay;
use crate::resource::{Capability, Resource};
use crate::stage::{AnyStage, BoxStage, Operator, Stage};

pub struct Pipe<In, Out> {
    tail: BoxStage<Out>,
    _input: PhantomData<fn(In)>,
}

impl<In: 'static, Out: 'static> Pipe<In, Out> {
    pub fn new<O>(relay: Relay<O>) -> Self
    where
        O: Operator<Input = In, Output = Out>,
    {
        Self {
            tail: Box::new(relay),
            _input: PhantomData,
        }
    }

    /// Append `relay` after the current tail.
    pub fn then<O>(self, mut relay: Relay<O>) -> Result<Pipe<In, O::Output>>
    where
        O: Operator<Input = Out>,
    {
        relay.set_upstream(AnyStage::new(self.tail))?;
        Ok(Pipe {
            tail: Box::new(relay),
            _input: PhantomData,
        })
    }

    /// Append another fragment; its open end receives this pipe's tail.
    pub fn compose<X: 'static>(self, next: Pipe<Out, X>) -> Result<Pipe<In, X>> {
        let mut tail = next.tail;
        tail.set_upstream(AnyStage::new(self.tail))?;
        Ok(Pipe {
            tail,
            _input: PhantomData,
        })
    }

    /// Attach `upstream` at the open end and return the completed chain.
    pub fn splice<S>(mut self, upstream: S) -> Result<BoxStage<Out>>
    where
        S: Stage<Item = In> + 'static,
    {
        self.tail.set_upstream(AnyStage::new::<In>(Box::new(upstream)))?;
        Ok(self.tail)
    }

    pub fn into_stage(self) -> BoxStage<Out> {
        self.tail
    }
}

impl<In: 'static, Out: 'static> Stage for Pipe<In, Out> {
    type Item = Out;

    fn kind(&self) -> &'static str {
        "pipe"
    }

    fn materialize(&mut self) -> Result<()> {
        self.tail.materialize()
    }

    fn is_materialized(&self) -> bool {
        self.tail.is_materialized()
    }

    fn next_item(&mut self) -> Result<Option<Out>> {
        self.tail.next_item()
    }

    fn is_finalized(&self) -> bool {
        self.tail.is_finalized()
    }

    fn has_upstream(&self) -> bool {
        self.tail.has_upstream()
    }

    fn is_open(&self) -> bool {
        self.tail.is_open()
    }

    fn chain_depth(&self) -> usize {
        self.tail.chain_depth()
    }

    fn set_upstream(&mut self, upstream: AnyStage) -> Result<()> {
        self.tail.set_upstream(upstream)
    }

    fn header(&self) -> Option<&[String]> {
        self.tail.header()
    }

    fn capability(&self, capability: Capability) -> Option<&(dyn Resource + 'static)> {
        self.tail.capability(capability)
    }

    fn capability_mut(
        &mut self,
        capability: Capability,
    ) -> Option<&mut (dyn Resource + 'static)> {
        self.tail.capability_mut(capability)
    }

    fn enter(&mut self) -> Result<()> {
        self.tail.enter()
    }

    fn exit(&mut self) -> Result<()> {
        self.tail.exit()
    }
}

/// `pipe >> relay` appends the relay; the result is still a pipe.
impl<In: 'static, Out: 'static, O> Shr<Relay<O>> for Pipe<In, Out>
where
    O: Operator<Input = Out>,
{
    type Output = Result<Pipe<In, O::Output>>;

    fn shr(self, relay: Relay<O>) -> Self::Output {
        self.then(relay)
    }
}

impl<In: 'static, Out: 'static, X: 'static> Shr<Pipe<Out, X>> for Pipe<In, Out> {
    type Output = Result<Pipe<In, X>>;

    fn shr(self, next: Pipe<Out, X>) -> Self::Output {
        self.compose(next)
    }
}
