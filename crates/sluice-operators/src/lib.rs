#![forbid(unsafe_code)]
//! sluice-operators: generic relays over any item type.
//!
//! Design intent:
//! - One operator per module; each is an `Operator` whose cursor pulls from
//!   the upstream on demand, one item per output where possible.
//! - Multi-input operators own independent sub-chains (see [`IntoStage`]).
//! - The free functions below wrap each operator in a `Relay`, ready for
//!   `>>` or `then`.

pub mod input;

pub mod accumulate;
pub mod chain;
pub mod count;
pub mod enumerate;
pub mod filter;
pub mod group_by;
pub mod hooks;
pub mod limit;
pub mod map;
pub mod skip;
pub mod timing;
pub mod zip;

use std::ops::Add;

use sluice_core::{Relay, Result};

pub use accumulate::Accumulate;
pub use chain::Chain;
pub use count::{Count, Counter};
pub use enumerate::Enumerate;
pub use filter::Filter;
pub use group_by::GroupBy;
pub use hooks::{Inspect, OnFinalize, OnInitialize, Passthrough};
pub use input::IntoStage;
pub use limit::Limit;
pub use map::{Map, MapMany, MapWith, Spread, StarMap};
pub use skip::Skip;
pub use timing::{Timing, TimingHandle};
pub use zip::{Zip, ZipMany};

pub fn limit<T: 'static>(n: usize) -> Relay<Limit<T>> {
    Relay::new(Limit::new(n))
}

pub fn skip<T: 'static>(n: usize) -> Relay<Skip<T>> {
    Relay::new(Skip::new(n))
}

/// Upstream first, then `extras` in order.
pub fn chain<T, I, S>(extras: I) -> Relay<Chain<T>>
where
    T: 'static,
    I: IntoIterator<Item = S>,
    S: IntoStage<T>,
{
    Relay::new(Chain::from_stages(extras))
}

pub fn enumerate<T: 'static>() -> Relay<Enumerate<T>> {
    Relay::new(Enumerate::new())
}

pub fn zip<A: 'static, B: 'static, S: IntoStage<B>>(other: S) -> Relay<Zip<A, B>> {
    Relay::new(Zip::new(other))
}

pub fn zip_many<T, I, S>(others: I) -> Relay<ZipMany<T>>
where
    T: 'static,
    I: IntoIterator<Item = S>,
    S: IntoStage<T>,
{
    Relay::new(ZipMany::new(others))
}

pub fn map<A, B, F>(f: F) -> Relay<Map<A, B, F>>
where
    A: 'static,
    B: 'static,
    F: FnMut(A) -> B + 'static,
{
    Relay::new(Map::new(f))
}

pub fn map_with<A, B, C, F, S>(other: S, f: F) -> Relay<MapWith<A, B, C, F>>
where
    A: 'static,
    B: 'static,
    C: 'static,
    F: FnMut(A, B) -> C + 'static,
    S: IntoStage<B>,
{
    Relay::new(MapWith::new(other, f))
}

/// `f` over rows of the upstream plus each of `others`, in lock-step.
pub fn map_many<T, U, F, I, S>(others: I, f: F) -> Relay<MapMany<T, U, F>>
where
    T: 'static,
    U: 'static,
    F: FnMut(Vec<T>) -> U + 'static,
    I: IntoIterator<Item = S>,
    S: IntoStage<T>,
{
    Relay::new(MapMany::new(others, f))
}

pub fn star_map<Args, F>(f: F) -> Relay<StarMap<Args, F>>
where
    Args: 'static,
    F: Spread<Args> + 'static,
    F::Output: 'static,
{
    Relay::new(StarMap::new(f))
}

pub fn filter<T, P>(predicate: P) -> Relay<Filter<T, P>>
where
    T: 'static,
    P: FnMut(&T) -> bool + 'static,
{
    Relay::new(Filter::new(predicate))
}

pub fn group_by<T, K, F>(key: F) -> Relay<GroupBy<T, K, F>>
where
    T: 'static,
    K: PartialEq + 'static,
    F: FnMut(&T) -> K + 'static,
{
    Relay::new(GroupBy::new(key))
}

pub fn accumulate<T, F>(f: F) -> Relay<Accumulate<T, F>>
where
    T: Clone + 'static,
    F: FnMut(&T, T) -> T + 'static,
{
    Relay::new(Accumulate::new(f))
}

/// Running sum, the default fold.
pub fn sum<T>() -> Relay<Accumulate<T, fn(&T, T) -> T>>
where
    T: Add<Output = T> + Clone + 'static,
{
    Relay::new(Accumulate::sum())
}

pub fn on_initialize<T, F>(f: F) -> Relay<OnInitialize<T, F>>
where
    T: 'static,
    F: FnMut() -> Result<()> + 'static,
{
    Relay::new(OnInitialize::new(f))
}

pub fn on_finalize<T, F>(f: F) -> Relay<OnFinalize<T, F>>
where
    T: 'static,
    F: FnMut() -> Result<()> + 'static,
{
    Relay::new(OnFinalize::new(f))
}

pub fn inspect<T, F>(f: F) -> Relay<Inspect<T, F>>
where
    T: 'static,
    F: FnMut(&T) + 'static,
{
    Relay::new(Inspect::new(f))
}

/// A counting relay plus the handle to read its tally.
pub fn count<T: 'static>() -> (Relay<Count<T>>, Counter) {
    let op = Count::new();
    let counter = op.counter();
    (Relay::new(op), counter)
}

/// A timing relay plus the handle to read its timestamps.
pub fn timing<T: 'static>() -> (Relay<Timing<T>>, TimingHandle) {
    let op = Timing::new();
    let handle = op.handle();
    (Relay::new(op), handle)
}
