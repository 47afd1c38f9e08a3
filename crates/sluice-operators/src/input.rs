//! Conversion of operator arguments into stages.
//!
//! Multi-input operators (chain, zip, map-with) hold independent sub-chains.
//! Anything that is already a stage is boxed as is; plain vectors are wrapped
//! in a [`Source`].

use sluice_core::{BoxStage, Operator, Pipe, Relay, Source};

pub trait IntoStage<T> {
    fn into_stage(self) -> BoxStage<T>;
}

impl<T: 'static> IntoStage<T> for Source<T> {
    fn into_stage(self) -> BoxStage<T> {
        Box::new(self)
    }
}

impl<O: Operator> IntoStage<O::Output> for Relay<O> {
    fn into_stage(self) -> BoxStage<O::Output> {
        Box::new(self)
    }
}

impl<In: 'static, Out: 'static> IntoStage<Out> for Pipe<In, Out> {
    fn into_stage(self) -> BoxStage<Out> {
        Pipe::into_stage(self)
    }
}

impl<T: 'static> IntoStage<T> for BoxStage<T> {
    fn into_stage(self) -> BoxStage<T> {
        self
    }
}

impl<T: 'static> IntoStage<T> for Vec<T> {
    fn into_stage(self) -> BoxStage<T> {
        Box::new(Source::new(self))
    }
}
