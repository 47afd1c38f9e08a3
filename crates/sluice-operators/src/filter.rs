//! Keep the items a predicate accepts.

use std::marker::PhantomData;

use sluice_core::{Context, Cursor, Error, Operator, Result};

pub struct Filter<T, P> {
    predicate: Option<P>,
    _item: PhantomData<fn(T)>,
}

impl<T, P> Filter<T, P>
where
    P: FnMut(&T) -> bool,
{
    pub fn new(predicate: P) -> Self {
        Self {
            predicate: Some(predicate),
            _item: PhantomData,
        }
    }
}

pub struct FilterCursor<P> {
    predicate: P,
}

impl<T, P> Cursor<T> for FilterCursor<P>
where
    P: FnMut(&T) -> bool,
{
    type Output = T;

    fn next_item(&mut self, ctx: &mut Context<'_, T>) -> Result<Option<T>> {
        while let Some(item) = ctx.pull()? {
            if (self.predicate)(&item) {
                return Ok(Some(item));
            }
        }
        Ok(None)
    }
}

impl<T: 'static, P> Operator for Filter<T, P>
where
    P: FnMut(&T) -> bool + 'static,
{
    type Input = T;
    type Output = T;
    type Cursor = FilterCursor<P>;

    fn name(&self) -> &'static str {
        "filter"
    }

    fn initialize(&mut self, _ctx: &mut Context<'_, T>) -> Result<FilterCursor<P>> {
        let predicate = self
            .predicate
            .take()
            .ok_or_else(|| Error::Invariant("filter initialized twice".into()))?;
        Ok(FilterCursor { predicate })
    }
}
