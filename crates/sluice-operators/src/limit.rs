//! Yield at most `n` items.

use std::marker::PhantomData;

use sluice_core::{Context, Cursor, Operator, Result};

pub struct Limit<T> {
    limit: usize,
    _item: PhantomData<fn() -> T>,
}

impl<T> Limit<T> {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            _item: PhantomData,
        }
    }
}

pub struct LimitCursor {
    remaining: usize,
}

impl<T> Cursor<T> for LimitCursor {
    type Output = T;

    fn next_item(&mut self, ctx: &mut Context<'_, T>) -> Result<Option<T>> {
        // Stop without pulling once the quota is spent.
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        ctx.pull()
    }
}

impl<T: 'static> Operator for Limit<T> {
    type Input = T;
    type Output = T;
    type Cursor = LimitCursor;

    fn name(&self) -> &'static str {
        "limit"
    }

    fn initialize(&mut self, _ctx: &mut Context<'_, T>) -> Result<LimitCursor> {
        Ok(LimitCursor {
            remaining: self.limit,
        })
    }
}
