//! Running fold. The first item is yielded as is; every later output is
//! `f(previous output, item)`.

use std::marker::PhantomData;
use std::ops::Add;

use sluice_core::{Context, Cursor, Error, Operator, Result};

pub struct Accumulate<T, F> {
    f: Option<F>,
    _item: PhantomData<fn(T) -> T>,
}

impl<T, F> Accumulate<T, F>
where
    F: FnMut(&T, T) -> T,
{
    pub fn new(f: F) -> Self {
        Self {
            f: Some(f),
            _item: PhantomData,
        }
    }
}

fn add<T: Add<Output = T> + Clone>(acc: &T, item: T) -> T {
    acc.clone() + item
}

impl<T> Accumulate<T, fn(&T, T) -> T>
where
    T: Add<Output = T> + Clone,
{
    /// Running sum.
    pub fn sum() -> Self {
        Self::new(add::<T>)
    }
}

pub struct AccumulateCursor<T, F> {
    f: F,
    acc: Option<T>,
}

impl<T: Clone, F> Cursor<T> for AccumulateCursor<T, F>
where
    F: FnMut(&T, T) -> T,
{
    type Output = T;

    fn next_item(&mut self, ctx: &mut Context<'_, T>) -> Result<Option<T>> {
        let Some(item) = ctx.pull()? else {
            return Ok(None);
        };
        let next = match self.acc.take() {
            Some(acc) => (self.f)(&acc, item),
            None => item,
        };
        self.acc = Some(next.clone());
        Ok(Some(next))
    }
}

impl<T: Clone + 'static, F> Operator for Accumulate<T, F>
where
    F: FnMut(&T, T) -> T + 'static,
{
    type Input = T;
    type Output = T;
    type Cursor = AccumulateCursor<T, F>;

    fn name(&self) -> &'static str {
        "accumulate"
    }

    fn initialize(&mut self, _ctx: &mut Context<'_, T>) -> Result<AccumulateCursor<T, F>> {
        let f = self
            .f
            .take()
            .ok_or_else(|| Error::Invariant("accumulate initialized twice".into()))?;
        Ok(AccumulateCursor { f, acc: None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sluice_core::{Source, StageExt};

    #[test]
    fn test_default_fold_is_addition() {
        let mut chain = Source::new(vec![1, 2, 3, 4]).relay(Accumulate::sum()).unwrap();
        assert_eq!(chain.collect_items().unwrap(), vec![1, 3, 6, 10]);
    }

    #[test]
    fn test_custom_fold() {
        let mut chain = Source::new(vec![3, 1, 4, 1, 5])
            .relay(Accumulate::new(|acc: &i32, x: i32| (*acc).max(x)))
            .unwrap();
        assert_eq!(chain.collect_items().unwrap(), vec![3, 3, 4, 4, 5]);
    }

    #[test]
    fn test_accumulate_strings() {
        let words = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let mut chain = Source::new(words)
            .relay(Accumulate::new(|acc: &String, x: String| format!("{acc}{x}")))
            .unwrap();
        assert_eq!(chain.collect_items().unwrap(), vec!["a", "ab", "abc"]);
    }
}
