//! Record when a relay was created, materialized and finalized.

use std::cell::Cell;
use std::marker::PhantomData;
use std::rc::Rc;
use std::time::{Duration, Instant};

use sluice_core::{Context, Operator, Result};

use crate::hooks::Passthrough;

#[derive(Debug)]
struct Marks {
    created_at: Instant,
    initialized_at: Cell<Option<Instant>>,
    finalized_at: Cell<Option<Instant>>,
}

/// Shared view of a [`Timing`] relay's timestamps.
#[derive(Debug, Clone)]
pub struct TimingHandle(Rc<Marks>);

impl TimingHandle {
    pub fn created_at(&self) -> Instant {
        self.0.created_at
    }

    pub fn initialized_at(&self) -> Option<Instant> {
        self.0.initialized_at.get()
    }

    pub fn finalized_at(&self) -> Option<Instant> {
        self.0.finalized_at.get()
    }

    /// Time between materialization and finalization, once both happened.
    pub fn elapsed(&self) -> Option<Duration> {
        Some(self.finalized_at()?.duration_since(self.initialized_at()?))
    }
}

pub struct Timing<T> {
    handle: TimingHandle,
    _item: PhantomData<fn(T)>,
}

impl<T> Timing<T> {
    pub fn new() -> Self {
        Self {
            handle: TimingHandle(Rc::new(Marks {
                created_at: Instant::now(),
                initialized_at: Cell::new(None),
                finalized_at: Cell::new(None),
            })),
            _item: PhantomData,
        }
    }

    pub fn handle(&self) -> TimingHandle {
        self.handle.clone()
    }
}

impl<T> Default for Timing<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Operator for Timing<T> {
    type Input = T;
    type Output = T;
    type Cursor = Passthrough;

    fn name(&self) -> &'static str {
        "timing"
    }

    fn initialize(&mut self, _ctx: &mut Context<'_, T>) -> Result<Passthrough> {
        self.handle.0.initialized_at.set(Some(Instant::now()));
        Ok(Passthrough)
    }

    fn finalize(&mut self, _ctx: &mut Context<'_, T>) -> Result<()> {
        self.handle.0.finalized_at.set(Some(Instant::now()));
        Ok(())
    }
}
