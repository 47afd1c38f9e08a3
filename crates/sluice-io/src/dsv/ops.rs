//! Per-field record operators.
//!
//! Each resolves its selector once, against the upstream header, when the
//! relay materializes. Without a header only index selectors resolve.

use std::collections::{BTreeMap, BTreeSet};
use std::mem;

use sluice_core::{Context, Cursor, Error, Operator, Result};

use super::select::Selector;

type Record = Vec<String>;

fn resolve(selector: &Selector, ctx: &Context<'_, Record>) -> Result<BTreeSet<usize>> {
    selector.resolve(ctx.header().unwrap_or(&[]))
}

fn take_once<F>(slot: &mut Option<F>, stage: &str) -> Result<F> {
    slot.take()
        .ok_or_else(|| Error::Invariant(format!("{stage} initialized twice")))
}

/// Keep records whose selected fields all satisfy the predicate.
/// A selector matching nothing keeps every record.
pub struct FieldFilter<P> {
    predicate: Option<P>,
    selector: Selector,
}

impl<P> FieldFilter<P>
where
    P: FnMut(&str) -> bool,
{
    pub fn new(predicate: P, selector: impl Into<Selector>) -> Self {
        Self {
            predicate: Some(predicate),
            selector: selector.into(),
        }
    }
}

pub struct FieldFilterCursor<P> {
    predicate: P,
    positions: Vec<usize>,
}

impl<P> Cursor<Record> for FieldFilterCursor<P>
where
    P: FnMut(&str) -> bool,
{
    type Output = Record;

    fn next_item(&mut self, ctx: &mut Context<'_, Record>) -> Result<Option<Record>> {
        while let Some(record) = ctx.pull()? {
            let predicate = &mut self.predicate;
            let keep = self
                .positions
                .iter()
                .filter_map(|&i| record.get(i))
                .all(|field| predicate(field.as_str()));
            if keep {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }
}

impl<P> Operator for FieldFilter<P>
where
    P: FnMut(&str) -> bool + 'static,
{
    type Input = Record;
    type Output = Record;
    type Cursor = FieldFilterCursor<P>;

    fn name(&self) -> &'static str {
        "field_filter"
    }

    fn initialize(&mut self, ctx: &mut Context<'_, Record>) -> Result<FieldFilterCursor<P>> {
        Ok(FieldFilterCursor {
            positions: resolve(&self.selector, ctx)?.into_iter().collect(),
            predicate: take_once(&mut self.predicate, "field_filter")?,
        })
    }
}

/// Replace each selected field with `f(field)`.
pub struct FieldMap<F> {
    f: Option<F>,
    selector: Selector,
}

impl<F> FieldMap<F>
where
    F: FnMut(String) -> String,
{
    pub fn new(f: F, selector: impl Into<Selector>) -> Self {
        Self {
            f: Some(f),
            selector: selector.into(),
        }
    }
}

pub struct FieldMapCursor<F> {
    f: F,
    positions: Vec<usize>,
}

impl<F> Cursor<Record> for FieldMapCursor<F>
where
    F: FnMut(String) -> String,
{
    type Output = Record;

    fn next_item(&mut self, ctx: &mut Context<'_, Record>) -> Result<Option<Record>> {
        let Some(mut record) = ctx.pull()? else {
            return Ok(None);
        };
        for &i in &self.positions {
            if let Some(field) = record.get_mut(i) {
                *field = (self.f)(mem::take(field));
            }
        }
        Ok(Some(record))
    }
}

impl<F> Operator for FieldMap<F>
where
    F: FnMut(String) -> String + 'static,
{
    type Input = Record;
    type Output = Record;
    type Cursor = FieldMapCursor<F>;

    fn name(&self) -> &'static str {
        "field_map"
    }

    fn initialize(&mut self, ctx: &mut Context<'_, Record>) -> Result<FieldMapCursor<F>> {
        Ok(FieldMapCursor {
            positions: resolve(&self.selector, ctx)?.into_iter().collect(),
            f: take_once(&mut self.f, "field_map")?,
        })
    }
}

enum Plan {
    Keep(Vec<usize>),
    Drop(BTreeSet<usize>),
}

pub struct ProjectCursor {
    plan: Plan,
}

impl Cursor<Record> for ProjectCursor {
    type Output = Record;

    fn next_item(&mut self, ctx: &mut Context<'_, Record>) -> Result<Option<Record>> {
        let Some(mut record) = ctx.pull()? else {
            return Ok(None);
        };
        let projected = match &self.plan {
            Plan::Keep(positions) => positions
                .iter()
                .filter_map(|&i| record.get_mut(i).map(mem::take))
                .collect(),
            Plan::Drop(dropped) => record
                .into_iter()
                .enumerate()
                .filter(|(i, _)| !dropped.contains(i))
                .map(|(_, field)| field)
                .collect(),
        };
        Ok(Some(projected))
    }
}

/// Keep only the selected columns, in header order.
pub struct Select {
    selector: Selector,
    header: Option<Vec<String>>,
}

impl Select {
    pub fn new(selector: impl Into<Selector>) -> Self {
        Self {
            selector: selector.into(),
            header: None,
        }
    }
}

impl Operator for Select {
    type Input = Record;
    type Output = Record;
    type Cursor = ProjectCursor;

    fn name(&self) -> &'static str {
        "select"
    }

    fn initialize(&mut self, ctx: &mut Context<'_, Record>) -> Result<ProjectCursor> {
        let mut positions = resolve(&self.selector, ctx)?;
        if let Some(header) = ctx.header() {
            positions.retain(|&i| i < header.len());
            self.header = Some(positions.iter().map(|&i| header[i].clone()).collect());
        }
        Ok(ProjectCursor {
            plan: Plan::Keep(positions.into_iter().collect()),
        })
    }

    fn header(&self) -> Option<&[String]> {
        self.header.as_deref()
    }
}

/// Drop the selected columns.
pub struct Deselect {
    selector: Selector,
    header: Option<Vec<String>>,
}

impl Deselect {
    pub fn new(selector: impl Into<Selector>) -> Self {
        Self {
            selector: selector.into(),
            header: None,
        }
    }
}

impl Operator for Deselect {
    type Input = Record;
    type Output = Record;
    type Cursor = ProjectCursor;

    fn name(&self) -> &'static str {
        "deselect"
    }

    fn initialize(&mut self, ctx: &mut Context<'_, Record>) -> Result<ProjectCursor> {
        let dropped = resolve(&self.selector, ctx)?;
        let plan = match ctx.header() {
            Some(header) => {
                let kept: Vec<usize> = (0..header.len()).filter(|i| !dropped.contains(i)).collect();
                self.header = Some(kept.iter().map(|&i| header[i].clone()).collect());
                Plan::Keep(kept)
            }
            None => Plan::Drop(dropped),
        };
        Ok(ProjectCursor { plan })
    }

    fn header(&self) -> Option<&[String]> {
        self.header.as_deref()
    }
}

/// Records as `header -> value` maps. Requires an upstream header; fields
/// beyond the header are dropped.
#[derive(Default)]
pub struct ToMapping;

impl ToMapping {
    pub fn new() -> Self {
        Self
    }
}

pub struct ToMappingCursor {
    header: Vec<String>,
}

impl Cursor<Record> for ToMappingCursor {
    type Output = BTreeMap<String, String>;

    fn next_item(
        &mut self,
        ctx: &mut Context<'_, Record>,
    ) -> Result<Option<BTreeMap<String, String>>> {
        Ok(ctx
            .pull()?
            .map(|record| self.header.iter().cloned().zip(record).collect()))
    }
}

impl Operator for ToMapping {
    type Input = Record;
    type Output = BTreeMap<String, String>;
    type Cursor = ToMappingCursor;

    fn name(&self) -> &'static str {
        "to_mapping"
    }

    fn initialize(&mut self, ctx: &mut Context<'_, Record>) -> Result<ToMappingCursor> {
        let header = ctx
            .header()
            .ok_or_else(|| Error::Dsv("to_mapping needs an upstream header".into()))?;
        Ok(ToMappingCursor {
            header: header.to_vec(),
        })
    }
}
