//! Chain assembly, laziness and lifecycle across crates.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use sluice::operators::{filter, limit, map, on_finalize, on_initialize, skip, zip};
use sluice::prelude::*;

/// A resource that only records scope calls.
struct Recorder {
    scopes: Rc<Cell<(usize, usize)>>,
}

impl Resource for Recorder {
    fn supports(&self, capability: Capability) -> bool {
        capability == Capability::Scope
    }

    fn enter(&mut self) -> Result<()> {
        let (enters, exits) = self.scopes.get();
        self.scopes.set((enters + 1, exits));
        Ok(())
    }

    fn exit(&mut self) -> Result<()> {
        let (enters, exits) = self.scopes.get();
        self.scopes.set((enters, exits + 1));
        Ok(())
    }
}

#[test]
fn test_materialize_runs_initialization_once() {
    let inits = Rc::new(Cell::new(0));
    let seen = Rc::clone(&inits);
    let mut chain = (Source::new(vec![1, 2]) >> on_initialize(move || {
        seen.set(seen.get() + 1);
        Ok(())
    }))
    .unwrap();

    assert_eq!(inits.get(), 0);
    chain.materialize().unwrap();
    chain.materialize().unwrap();
    assert!(chain.is_materialized());
    assert_eq!(inits.get(), 1);
    assert_eq!(chain.collect_items().unwrap(), vec![1, 2]);
    assert_eq!(inits.get(), 1);
}

#[test]
fn test_join_order_does_not_change_the_chain() {
    fn plus(n: i32) -> Relay<sluice::operators::Map<i32, i32, impl FnMut(i32) -> i32>> {
        map(move |x: i32| x + n)
    }

    let mut left = Source::new(vec![0, 10])
        .then(plus(1))
        .and_then(|c| c.then(plus(2)))
        .unwrap();
    let mut right = Source::new(vec![0, 10])
        .then(plus(1).then(plus(2)).unwrap())
        .unwrap();

    assert_eq!(left.chain_depth(), 3);
    assert_eq!(right.chain_depth(), 3);
    assert!(!right.is_open());
    assert_eq!(left.collect_items().unwrap(), right.collect_items().unwrap());
}

#[test]
fn test_prebuilt_fragments_splice_in_later() {
    let fragment = (Pipe::new(skip(1)) >> map(|x: i32| x * 100)).unwrap();
    let fragment = (fragment >> limit(2)).unwrap();
    assert!(fragment.is_open());

    let mut chain = (Source::new(vec![1, 2, 3, 4]) >> fragment).unwrap();
    assert_eq!(chain.collect_items().unwrap(), vec![200, 300]);
}

#[test]
fn test_source_never_takes_an_upstream() {
    let mut source = Source::new(vec![1]);
    for attempt in [
        AnyStage::new(Source::new(vec![2]).boxed()),
        AnyStage::new(Source::new(vec!["text"]).boxed()),
    ] {
        assert!(matches!(
            source.set_upstream(attempt),
            Err(Error::SourceHasUpstream)
        ));
    }
}

#[test]
fn test_relay_without_source_cannot_run() {
    let mut orphan = limit::<i32>(3);
    assert!(matches!(
        orphan.next_item(),
        Err(Error::EmptyUpstream { .. })
    ));
}

#[test]
fn test_splice_type_mismatch_is_reported() {
    let numbers = limit::<i32>(1);
    let err = Source::new(vec!["a".to_string()])
        .then(numbers)
        .err()
        .expect("mismatched splice must fail");
    assert!(matches!(err, Error::UpstreamType { .. }));
}

#[test]
fn test_pulling_one_item_pulls_one_upstream() {
    let pulled = Rc::new(Cell::new(0));
    let counter = Rc::clone(&pulled);
    let source = Source::with_generator(Recorder { scopes: Rc::default() }, move |_| {
        counter.set(counter.get() + 1);
        Ok(Some(counter.get()))
    });
    let mut chain = (source >> map(|x: usize| x * 2)).unwrap();

    assert_eq!(pulled.get(), 0);
    assert_eq!(chain.next_item().unwrap(), Some(2));
    assert_eq!(pulled.get(), 1);
    assert_eq!(chain.next_item().unwrap(), Some(4));
    assert_eq!(pulled.get(), 2);
}

#[test]
fn test_finalize_runs_root_to_tail() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let (first, second) = (Rc::clone(&log), Rc::clone(&log));
    let mut chain = (Source::new(vec![1, 2, 3]) >> on_finalize(move || {
        first.borrow_mut().push("first");
        Ok(())
    }))
    .and_then(|c| {
        c >> on_finalize(move || {
            second.borrow_mut().push("second");
            Ok(())
        })
    })
    .unwrap();

    chain.run().unwrap();
    assert_eq!(*log.borrow(), vec!["first", "second"]);
    assert!(chain.is_finalized());
    assert_eq!(chain.next_item().unwrap(), None);
    assert_eq!(log.borrow().len(), 2);
}

#[test]
fn test_early_exit_skips_finalize() {
    let finalized = Rc::new(Cell::new(false));
    let flag = Rc::clone(&finalized);
    let mut chain = (Source::new(vec![1, 2, 3]) >> on_finalize(move || {
        flag.set(true);
        Ok(())
    }))
    .unwrap();

    let first: Vec<i32> = chain.iter().take(1).map(|r| r.unwrap()).collect();
    assert_eq!(first, vec![1]);
    drop(chain);
    assert!(!finalized.get());
}

#[test]
fn test_scoped_chain_enters_and_exits_once() {
    let scopes = Rc::new(Cell::new((0, 0)));
    let mut remaining = 3;
    let source = Source::with_generator(
        Recorder {
            scopes: Rc::clone(&scopes),
        },
        move |_| {
            remaining -= 1;
            Ok((remaining >= 0).then_some(remaining))
        },
    );
    let mut chain = (source >> filter(|x: &i32| x % 2 == 0))
        .and_then(|c| c >> map(|x: i32| x + 1))
        .unwrap();

    let items = chain.scoped(|c| c.collect_items()).unwrap();
    assert_eq!(items, vec![3, 1]);
    assert_eq!(scopes.get(), (1, 1));
}

#[test]
fn test_limit_skip_zip_properties() {
    let take = |n: usize| {
        (Source::new(vec![0, 1, 2, 3, 4]) >> limit(n))
            .unwrap()
            .collect_items()
            .unwrap()
    };
    assert_eq!(take(3), vec![0, 1, 2]);
    assert!(take(0).is_empty());
    assert_eq!(take(100).len(), 5);

    let drop_first = |n: usize| {
        (Source::new(vec![0, 1, 2, 3]) >> skip(n))
            .unwrap()
            .collect_items()
            .unwrap()
    };
    assert_eq!(drop_first(2), vec![2, 3]);
    assert!(drop_first(10).is_empty());

    let mut zipped = (Source::new(vec![1, 2, 3]) >> zip(vec!['a', 'b'])).unwrap();
    assert_eq!(zipped.collect_items().unwrap(), vec![(1, 'a'), (2, 'b')]);
}

#[test]
fn test_nested_chain_acts_as_source() {
    let inner = (Source::new(vec![5, 6, 7]) >> limit(2)).unwrap();
    let mut outer = (Source::from_stage(inner) >> map(|x: i32| x - 5)).unwrap();
    assert_eq!(outer.chain_depth(), 2);
    assert_eq!(outer.collect_items().unwrap(), vec![0, 1]);
}
