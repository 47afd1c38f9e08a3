//! Per-item transformation.
//!
//! [`Map`] applies a function to each upstream item, [`MapWith`] applies a
//! two-argument function across the upstream and one other sequence,
//! [`MapMany`] applies a function to rows drawn from any number of sequences,
//! and [`StarMap`] spreads a tuple item over the function's parameters.

use std::marker::PhantomData;

use sluice_core::{BoxStage, Context, Cursor, Error, Operator, Result, Stage};

use crate::input::IntoStage;
use crate::zip::ZipManyCursor;

pub struct Map<A, B, F> {
    f: Option<F>,
    _types: PhantomData<fn(A) -> B>,
}

impl<A, B, F> Map<A, B, F>
where
    F: FnMut(A) -> B,
{
    pub fn new(f: F) -> Self {
        Self {
            f: Some(f),
            _types: PhantomData,
        }
    }
}

pub struct MapCursor<F> {
    f: F,
}

impl<A, B, F> Cursor<A> for MapCursor<F>
where
    F: FnMut(A) -> B,
{
    type Output = B;

    fn next_item(&mut self, ctx: &mut Context<'_, A>) -> Result<Option<B>> {
        Ok(ctx.pull()?.map(&mut self.f))
    }
}

impl<A: 'static, B: 'static, F> Operator for Map<A, B, F>
where
    F: FnMut(A) -> B + 'static,
{
    type Input = A;
    type Output = B;
    type Cursor = MapCursor<F>;

    fn name(&self) -> &'static str {
        "map"
    }

    fn initialize(&mut self, _ctx: &mut Context<'_, A>) -> Result<MapCursor<F>> {
        let f = take_fn(&mut self.f, "map")?;
        Ok(MapCursor { f })
    }
}

pub struct MapWith<A, B, C, F> {
    other: Option<BoxStage<B>>,
    f: Option<F>,
    _types: PhantomData<fn(A) -> C>,
}

impl<A, B: 'static, C, F> MapWith<A, B, C, F>
where
    F: FnMut(A, B) -> C,
{
    pub fn new<S: IntoStage<B>>(other: S, f: F) -> Self {
        Self {
            other: Some(other.into_stage()),
            f: Some(f),
            _types: PhantomData,
        }
    }
}

pub struct MapWithCursor<B, F> {
    other: BoxStage<B>,
    f: F,
}

impl<A, B, C, F> Cursor<A> for MapWithCursor<B, F>
where
    F: FnMut(A, B) -> C,
{
    type Output = C;

    fn next_item(&mut self, ctx: &mut Context<'_, A>) -> Result<Option<C>> {
        let Some(a) = ctx.pull()? else {
            return Ok(None);
        };
        Ok(self.other.next_item()?.map(|b| (self.f)(a, b)))
    }
}

impl<A: 'static, B: 'static, C: 'static, F> Operator for MapWith<A, B, C, F>
where
    F: FnMut(A, B) -> C + 'static,
{
    type Input = A;
    type Output = C;
    type Cursor = MapWithCursor<B, F>;

    fn name(&self) -> &'static str {
        "map_with"
    }

    fn initialize(&mut self, _ctx: &mut Context<'_, A>) -> Result<MapWithCursor<B, F>> {
        let other = self
            .other
            .take()
            .ok_or_else(|| Error::Invariant("map_with initialized twice".into()))?;
        let f = take_fn(&mut self.f, "map_with")?;
        Ok(MapWithCursor { other, f })
    }
}

/// Maps rows of lock-step items, upstream first then `others` in order.
/// Stops when any input runs out.
pub struct MapMany<T, U, F> {
    others: Option<Vec<BoxStage<T>>>,
    f: Option<F>,
    _types: PhantomData<fn(T) -> U>,
}

impl<T: 'static, U, F> MapMany<T, U, F>
where
    F: FnMut(Vec<T>) -> U,
{
    pub fn new<I, S>(others: I, f: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: IntoStage<T>,
    {
        Self {
            others: Some(others.into_iter().map(IntoStage::into_stage).collect()),
            f: Some(f),
            _types: PhantomData,
        }
    }
}

pub struct MapManyCursor<T, F> {
    rows: ZipManyCursor<T>,
    f: F,
}

impl<T, U, F> Cursor<T> for MapManyCursor<T, F>
where
    F: FnMut(Vec<T>) -> U,
{
    type Output = U;

    fn next_item(&mut self, ctx: &mut Context<'_, T>) -> Result<Option<U>> {
        Ok(self.rows.next_item(ctx)?.map(&mut self.f))
    }
}

impl<T: 'static, U: 'static, F> Operator for MapMany<T, U, F>
where
    F: FnMut(Vec<T>) -> U + 'static,
{
    type Input = T;
    type Output = U;
    type Cursor = MapManyCursor<T, F>;

    fn name(&self) -> &'static str {
        "map_many"
    }

    fn initialize(&mut self, _ctx: &mut Context<'_, T>) -> Result<MapManyCursor<T, F>> {
        let others = self
            .others
            .take()
            .ok_or_else(|| Error::Invariant("map_many initialized twice".into()))?;
        let f = take_fn(&mut self.f, "map_many")?;
        Ok(MapManyCursor {
            rows: ZipManyCursor::new(others),
            f,
        })
    }
}

/// A function callable with the fields of the tuple `Args`.
pub trait Spread<Args> {
    type Output;

    fn spread(&mut self, args: Args) -> Self::Output;
}

macro_rules! impl_spread {
    ($($arg:ident),+) => {
        impl<Func, Ret, $($arg),+> Spread<($($arg,)+)> for Func
        where
            Func: FnMut($($arg),+) -> Ret,
        {
            type Output = Ret;

            #[allow(non_snake_case)]
            fn spread(&mut self, ($($arg,)+): ($($arg,)+)) -> Ret {
                (*self)($($arg),+)
            }
        }
    };
}

impl_spread!(A);
impl_spread!(A, B);
impl_spread!(A, B, C);
impl_spread!(A, B, C, D);
impl_spread!(A, B, C, D, E);

pub struct StarMap<Args, F> {
    f: Option<F>,
    _args: PhantomData<fn(Args)>,
}

impl<Args, F> StarMap<Args, F>
where
    F: Spread<Args>,
{
    pub fn new(f: F) -> Self {
        Self {
            f: Some(f),
            _args: PhantomData,
        }
    }
}

pub struct StarMapCursor<F> {
    f: F,
}

impl<Args, F> Cursor<Args> for StarMapCursor<F>
where
    F: Spread<Args>,
{
    type Output = F::Output;

    fn next_item(&mut self, ctx: &mut Context<'_, Args>) -> Result<Option<F::Output>> {
        Ok(ctx.pull()?.map(|args| self.f.spread(args)))
    }
}

impl<Args: 'static, F> Operator for StarMap<Args, F>
where
    F: Spread<Args> + 'static,
    F::Output: 'static,
{
    type Input = Args;
    type Output = F::Output;
    type Cursor = StarMapCursor<F>;

    fn name(&self) -> &'static str {
        "star_map"
    }

    fn initialize(&mut self, _ctx: &mut Context<'_, Args>) -> Result<StarMapCursor<F>> {
        let f = take_fn(&mut self.f, "star_map")?;
        Ok(StarMapCursor { f })
    }
}

fn take_fn<F>(slot: &mut Option<F>, stage: &str) -> Result<F> {
    slot.take()
        .ok_or_else(|| Error::Invariant(format!("{stage} initialized twice")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sluice_core::{Source, StageExt};

    #[test]
    fn test_map_applies_function() {
        let mut chain = Source::new(vec![1, 2, 3])
            .relay(Map::new(|x: i32| x * 10))
            .unwrap();
        assert_eq!(chain.collect_items().unwrap(), vec![10, 20, 30]);
    }

    #[test]
    fn test_map_with_runs_positionally() {
        let mut chain = Source::new(vec![1, 2, 3])
            .relay(MapWith::new(vec![10, 20], |a: i32, b: i32| a + b))
            .unwrap();
        assert_eq!(chain.collect_items().unwrap(), vec![11, 22]);
    }

    #[test]
    fn test_map_many_sums_columns() {
        let mut chain = Source::new(vec![1, 2, 3, 4])
            .relay(MapMany::new(
                vec![vec![10, 20, 30, 40], vec![100, 200, 300]],
                |row: Vec<i32>| row.iter().sum::<i32>(),
            ))
            .unwrap();
        assert_eq!(chain.collect_items().unwrap(), vec![111, 222, 333]);
    }

    #[test]
    fn test_map_many_without_others_sees_single_rows() {
        let mut chain = Source::new(vec!["a", "b"])
            .relay(MapMany::new(Vec::<Vec<&str>>::new(), |row: Vec<&str>| row.len()))
            .unwrap();
        assert_eq!(chain.collect_items().unwrap(), vec![1, 1]);
    }

    #[test]
    fn test_star_map_spreads_tuples() {
        let mut chain = Source::new(vec![(2, 5), (3, 2), (10, 3)])
            .relay(StarMap::new(|base: i64, exp: u32| base.pow(exp)))
            .unwrap();
        assert_eq!(chain.collect_items().unwrap(), vec![32, 9, 1000]);
    }

    #[test]
    fn test_star_map_three_fields() {
        let mut chain = Source::new(vec![("a", 1, true), ("b", 2, false)])
            .relay(StarMap::new(|s: &str, n: usize, flag: bool| {
                if flag {
                    s.repeat(n)
                } else {
                    String::new()
                }
            }))
            .unwrap();
        assert_eq!(chain.collect_items().unwrap(), vec!["a".to_string(), String::new()]);
    }
}
