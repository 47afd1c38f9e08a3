//! Group consecutive items sharing a key.
//!
//! Each group is buffered into a single-pass [`Source`] before it is
//! yielded. The first item of the next group is held back until the outer
//! sequence advances.

use std::marker::PhantomData;

use sluice_core::{Context, Cursor, Error, Operator, Result, Source};

pub struct GroupBy<T, K, F> {
    key: Option<F>,
    _types: PhantomData<fn(T) -> K>,
}

impl<T, K, F> GroupBy<T, K, F>
where
    F: FnMut(&T) -> K,
    K: PartialEq,
{
    pub fn new(key: F) -> Self {
        Self {
            key: Some(key),
            _types: PhantomData,
        }
    }
}

pub struct GroupByCursor<T, K, F> {
    key: F,
    pending: Option<(K, T)>,
}

impl<T: 'static, K, F> Cursor<T> for GroupByCursor<T, K, F>
where
    F: FnMut(&T) -> K,
    K: PartialEq,
{
    type Output = (K, Source<T>);

    fn next_item(&mut self, ctx: &mut Context<'_, T>) -> Result<Option<(K, Source<T>)>> {
        let (group_key, first) = match self.pending.take() {
            Some(pending) => pending,
            None => match ctx.pull()? {
                Some(item) => ((self.key)(&item), item),
                None => return Ok(None),
            },
        };
        let mut run = vec![first];
        while let Some(item) = ctx.pull()? {
            let key = (self.key)(&item);
            if key == group_key {
                run.push(item);
            } else {
                self.pending = Some((key, item));
                break;
            }
        }
        Ok(Some((group_key, Source::new(run))))
    }
}

impl<T: 'static, K: 'static, F> Operator for GroupBy<T, K, F>
where
    F: FnMut(&T) -> K + 'static,
    K: PartialEq,
{
    type Input = T;
    type Output = (K, Source<T>);
    type Cursor = GroupByCursor<T, K, F>;

    fn name(&self) -> &'static str {
        "group_by"
    }

    fn initialize(&mut self, _ctx: &mut Context<'_, T>) -> Result<GroupByCursor<T, K, F>> {
        let key = self
            .key
            .take()
            .ok_or_else(|| Error::Invariant("group_by initialized twice".into()))?;
        Ok(GroupByCursor { key, pending: None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sluice_core::{Stage, StageExt};

    #[test]
    fn test_group_by_splits_consecutive_runs() {
        let mut chain = Source::new("aaabbcaa".chars())
            .relay(GroupBy::new(|c: &char| *c))
            .unwrap();
        let mut groups = Vec::new();
        while let Some((key, mut group)) = chain.next_item().unwrap() {
            groups.push((key, group.collect_items().unwrap().len()));
        }
        assert_eq!(groups, vec![('a', 3), ('b', 2), ('c', 1), ('a', 2)]);
    }

    #[test]
    fn test_group_by_derived_key() {
        let mut chain = Source::new(vec![1, 3, 5, 2, 4, 7])
            .relay(GroupBy::new(|x: &i32| x % 2 == 0))
            .unwrap();
        let groups: Vec<(bool, Vec<i32>)> = chain
            .collect_items()
            .unwrap()
            .into_iter()
            .map(|(k, mut g)| (k, g.collect_items().unwrap()))
            .collect();
        assert_eq!(
            groups,
            vec![(false, vec![1, 3, 5]), (true, vec![2, 4]), (false, vec![7])]
        );
    }

    #[test]
    fn test_group_sequence_is_single_pass() {
        let mut chain = Source::new(vec![1, 1]).relay(GroupBy::new(|x: &i32| *x)).unwrap();
        let (_, mut group) = chain.next_item().unwrap().unwrap();
        assert_eq!(group.collect_items().unwrap(), vec![1, 1]);
        assert!(group.collect_items().unwrap().is_empty());
    }
}
