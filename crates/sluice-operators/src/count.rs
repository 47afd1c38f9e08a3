//! Count the items passing through.

use std::cell::Cell;
use std::marker::PhantomData;
use std::rc::Rc;

use sluice_core::{Context, Cursor, Operator, Result};

/// Shared view of a [`Count`] relay's tally.
#[derive(Debug, Clone, Default)]
pub struct Counter(Rc<Cell<usize>>);

impl Counter {
    pub fn get(&self) -> usize {
        self.0.get()
    }

    fn bump(&self) {
        self.0.set(self.0.get() + 1);
    }
}

pub struct Count<T> {
    counter: Counter,
    _item: PhantomData<fn(T)>,
}

impl<T> Count<T> {
    pub fn new() -> Self {
        Self {
            counter: Counter::default(),
            _item: PhantomData,
        }
    }

    pub fn counter(&self) -> Counter {
        self.counter.clone()
    }
}

impl<T> Default for Count<T> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct CountCursor {
    counter: Counter,
}

impl<T> Cursor<T> for CountCursor {
    type Output = T;

    fn next_item(&mut self, ctx: &mut Context<'_, T>) -> Result<Option<T>> {
        let item = ctx.pull()?;
        if item.is_some() {
            self.counter.bump();
        }
        Ok(item)
    }
}

impl<T: 'static> Operator for Count<T> {
    type Input = T;
    type Output = T;
    type Cursor = CountCursor;

    fn name(&self) -> &'static str {
        "count"
    }

    fn initialize(&mut self, _ctx: &mut Context<'_, T>) -> Result<CountCursor> {
        Ok(CountCursor {
            counter: self.counter.clone(),
        })
    }
}
