//! Lock-step pairing of the upstream with other sequences.
//!
//! Every input is pulled once per output item, upstream first; the first
//! input to run out ends the sequence.

use sluice_core::{BoxStage, Context, Cursor, Error, Operator, Result, Stage};

use crate::input::IntoStage;

/// Pairs upstream items with items of one other sequence.
pub struct Zip<A, B> {
    other: Option<BoxStage<B>>,
    _item: std::marker::PhantomData<fn() -> A>,
}

impl<A: 'static, B: 'static> Zip<A, B> {
    pub fn new<S: IntoStage<B>>(other: S) -> Self {
        Self {
            other: Some(other.into_stage()),
            _item: std::marker::PhantomData,
        }
    }
}

pub struct ZipCursor<B> {
    other: BoxStage<B>,
}

impl<A, B> Cursor<A> for ZipCursor<B> {
    type Output = (A, B);

    fn next_item(&mut self, ctx: &mut Context<'_, A>) -> Result<Option<(A, B)>> {
        let Some(a) = ctx.pull()? else {
            return Ok(None);
        };
        Ok(self.other.next_item()?.map(|b| (a, b)))
    }
}

impl<A: 'static, B: 'static> Operator for Zip<A, B> {
    type Input = A;
    type Output = (A, B);
    type Cursor = ZipCursor<B>;

    fn name(&self) -> &'static str {
        "zip"
    }

    fn initialize(&mut self, _ctx: &mut Context<'_, A>) -> Result<ZipCursor<B>> {
        let other = self
            .other
            .take()
            .ok_or_else(|| Error::Invariant("zip initialized twice".into()))?;
        Ok(ZipCursor { other })
    }
}

/// Collects one item from the upstream and from each other sequence into a row.
pub struct ZipMany<T> {
    others: Vec<BoxStage<T>>,
}

impl<T: 'static> ZipMany<T> {
    pub fn new<I, S>(others: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: IntoStage<T>,
    {
        Self {
            others: others.into_iter().map(IntoStage::into_stage).collect(),
        }
    }
}

pub struct ZipManyCursor<T> {
    others: Vec<BoxStage<T>>,
}

impl<T> ZipManyCursor<T> {
    pub(crate) fn new(others: Vec<BoxStage<T>>) -> Self {
        Self { others }
    }
}

impl<T> Cursor<T> for ZipManyCursor<T> {
    type Output = Vec<T>;

    fn next_item(&mut self, ctx: &mut Context<'_, T>) -> Result<Option<Vec<T>>> {
        let Some(first) = ctx.pull()? else {
            return Ok(None);
        };
        let mut row = Vec::with_capacity(self.others.len() + 1);
        row.push(first);
        for other in &mut self.others {
            match other.next_item()? {
                Some(item) => row.push(item),
                None => return Ok(None),
            }
        }
        Ok(Some(row))
    }
}

impl<T: 'static> Operator for ZipMany<T> {
    type Input = T;
    type Output = Vec<T>;
    type Cursor = ZipManyCursor<T>;

    fn name(&self) -> &'static str {
        "zip_many"
    }

    fn initialize(&mut self, _ctx: &mut Context<'_, T>) -> Result<ZipManyCursor<T>> {
        Ok(ZipManyCursor::new(std::mem::take(&mut self.others)))
    }
}
