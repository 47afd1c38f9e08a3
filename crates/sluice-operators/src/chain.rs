//! Concatenate the upstream with extra sequences.
//!
//! The upstream slot is optional here: a chain with no upstream is a pure
//! concatenation of its extras.

use std::collections::VecDeque;

use sluice_core::{BoxStage, Context, Cursor, Operator, Result, Stage};

use crate::input::IntoStage;

pub struct Chain<T> {
    extras: Vec<BoxStage<T>>,
}

impl<T: 'static> Chain<T> {
    pub fn new() -> Self {
        Self { extras: Vec::new() }
    }

    /// Append one more sequence, yielded after everything before it.
    pub fn with<S: IntoStage<T>>(mut self, extra: S) -> Self {
        self.extras.push(extra.into_stage());
        self
    }

    pub fn from_stages<I, S>(extras: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: IntoStage<T>,
    {
        Self {
            extras: extras.into_iter().map(IntoStage::into_stage).collect(),
        }
    }
}

impl<T: 'static> Default for Chain<T> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ChainCursor<T> {
    upstream_done: bool,
    extras: VecDeque<BoxStage<T>>,
}

impl<T> Cursor<T> for ChainCursor<T> {
    type Output = T;

    fn next_item(&mut self, ctx: &mut Context<'_, T>) -> Result<Option<T>> {
        if !self.upstream_done {
            if ctx.is_attached() {
                if let Some(item) = ctx.pull()? {
                    return Ok(Some(item));
                }
            }
            self.upstream_done = true;
        }
        while let Some(extra) = self.extras.front_mut() {
            if let Some(item) = extra.next_item()? {
                return Ok(Some(item));
            }
            self.extras.pop_front();
        }
        Ok(None)
    }
}

impl<T: 'static> Operator for Chain<T> {
    type Input = T;
    type Output = T;
    type Cursor = ChainCursor<T>;

    fn name(&self) -> &'static str {
        "chain"
    }

    fn requires_upstream(&self) -> bool {
        false
    }

    fn initialize(&mut self, _ctx: &mut Context<'_, T>) -> Result<ChainCursor<T>> {
        Ok(ChainCursor {
            upstream_done: false,
            extras: std::mem::take(&mut self.extras).into(),
        })
    }
}
