//! Lifecycle hooks: run user code at materialization, at finalization, or
//! on every item, forwarding the upstream unchanged.

use std::marker::PhantomData;

use sluice_core::{Context, Cursor, Error, Operator, Result};

/// Cursor forwarding every upstream item untouched.
pub struct Passthrough;

impl<T> Cursor<T> for Passthrough {
    type Output = T;

    fn next_item(&mut self, ctx: &mut Context<'_, T>) -> Result<Option<T>> {
        ctx.pull()
    }
}

/// Calls `f` once, when the relay materializes.
pub struct OnInitialize<T, F> {
    f: F,
    _item: PhantomData<fn(T)>,
}

impl<T, F> OnInitialize<T, F>
where
    F: FnMut() -> Result<()>,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _item: PhantomData,
        }
    }
}

impl<T: 'static, F> Operator for OnInitialize<T, F>
where
    F: FnMut() -> Result<()> + 'static,
{
    type Input = T;
    type Output = T;
    type Cursor = Passthrough;

    fn name(&self) -> &'static str {
        "on_initialize"
    }

    fn initialize(&mut self, _ctx: &mut Context<'_, T>) -> Result<Passthrough> {
        (self.f)()?;
        Ok(Passthrough)
    }
}

/// Calls `f` once, when the relay's sequence is exhausted.
pub struct OnFinalize<T, F> {
    f: F,
    _item: PhantomData<fn(T)>,
}

impl<T, F> OnFinalize<T, F>
where
    F: FnMut() -> Result<()>,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _item: PhantomData,
        }
    }
}

impl<T: 'static, F> Operator for OnFinalize<T, F>
where
    F: FnMut() -> Result<()> + 'static,
{
    type Input = T;
    type Output = T;
    type Cursor = Passthrough;

    fn name(&self) -> &'static str {
        "on_finalize"
    }

    fn initialize(&mut self, _ctx: &mut Context<'_, T>) -> Result<Passthrough> {
        Ok(Passthrough)
    }

    fn finalize(&mut self, _ctx: &mut Context<'_, T>) -> Result<()> {
        (self.f)()
    }
}

/// Calls `f` with each item before forwarding it.
pub struct Inspect<T, F> {
    f: Option<F>,
    _item: PhantomData<fn(T)>,
}

impl<T, F> Inspect<T, F>
where
    F: FnMut(&T),
{
    pub fn new(f: F) -> Self {
        Self {
            f: Some(f),
            _item: PhantomData,
        }
    }
}

pub struct InspectCursor<F> {
    f: F,
}

impl<T, F> Cursor<T> for InspectCursor<F>
where
    F: FnMut(&T),
{
    type Output = T;

    fn next_item(&mut self, ctx: &mut Context<'_, T>) -> Result<Option<T>> {
        let item = ctx.pull()?;
        if let Some(item) = &item {
            (self.f)(item);
        }
        Ok(item)
    }
}

impl<T: 'static, F> Operator for Inspect<T, F>
where
    F: FnMut(&T) + 'static,
{
    type Input = T;
    type Output = T;
    type Cursor = InspectCursor<F>;

    fn name(&self) -> &'static str {
        "inspect"
    }

    fn initialize(&mut self, _ctx: &mut Context<'_, T>) -> Result<InspectCursor<F>> {
        let f = self
            .f
            .take()
            .ok_or_else(|| Error::Invariant("inspect initialized twice".into()))?;
        Ok(InspectCursor { f })
    }
}
