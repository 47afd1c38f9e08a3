//! Discard the first `n` items.

use std::marker::PhantomData;

use sluice_core::{Context, Cursor, Operator, Result};

pub struct Skip<T> {
    skip: usize,
    _item: PhantomData<fn() -> T>,
}

impl<T> Skip<T> {
    pub fn new(skip: usize) -> Self {
        Self {
            skip,
            _item: PhantomData,
        }
    }
}

pub struct SkipCursor {
    pending: usize,
}

impl<T> Cursor<T> for SkipCursor {
    type Output = T;

    fn next_item(&mut self, ctx: &mut Context<'_, T>) -> Result<Option<T>> {
        while self.pending > 0 {
            if ctx.pull()?.is_none() {
                self.pending = 0;
                return Ok(None);
            }
            self.pending -= 1;
        }
        ctx.pull()
    }
}

impl<T: 'static> Operator for Skip<T> {
    type Input = T;
    type Output = T;
    type Cursor = SkipCursor;

    fn name(&self) -> &'static str {
        "skip"
    }

    fn initialize(&mut self, _ctx: &mut Context<'_, T>) -> Result<SkipCursor> {
        Ok(SkipCursor { pending: self.skip })
    }
}
