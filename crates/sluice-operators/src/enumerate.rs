//! Pair each item with its zero-based position.

use std::marker::PhantomData;

use sluice_core::{Context, Cursor, Operator, Result};

pub struct Enumerate<T> {
    _item: PhantomData<fn() -> T>,
}

impl<T> Enumerate<T> {
    pub fn new() -> Self {
        Self { _item: PhantomData }
    }
}

impl<T> Default for Enumerate<T> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct EnumerateCursor {
    index: usize,
}

impl<T> Cursor<T> for EnumerateCursor {
    type Output = (usize, T);

    fn next_item(&mut self, ctx: &mut Context<'_, T>) -> Result<Option<(usize, T)>> {
        let Some(item) = ctx.pull()? else {
            return Ok(None);
        };
        let index = self.index;
        self.index += 1;
        Ok(Some((index, item)))
    }
}

impl<T: 'static> Operator for Enumerate<T> {
    type Input = T;
    type Output = (usize, T);
    type Cursor = EnumerateCursor;

    fn name(&self) -> &'static str {
        "enumerate"
    }

    fn initialize(&mut self, _ctx: &mut Context<'_, T>) -> Result<EnumerateCursor> {
        Ok(EnumerateCursor { index: 0 })
    }
}
