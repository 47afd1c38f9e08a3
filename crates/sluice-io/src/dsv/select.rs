//! Column selectors and their resolution against a header.
//!
//! A selector names columns by pattern (matched against the whole field
//! name), by position, or by any combination of those. Resolution is pure:
//! it reads the header and returns a set of positions, never an error for
//! zero matches.

use std::collections::BTreeSet;

use regex::Regex;

use sluice_core::{Error, Result};

#[derive(Debug, Clone)]
pub enum Selector {
    /// A regular expression; plain names are patterns that match themselves.
    Pattern(String),
    Regex(Regex),
    /// A column position. Kept even when it lies beyond the header.
    Index(usize),
    /// Union of every sub-selector.
    Any(Vec<Selector>),
}

impl Selector {
    pub fn resolve(&self, header: &[String]) -> Result<BTreeSet<usize>> {
        let mut positions = BTreeSet::new();
        self.collect(header, &mut positions)?;
        Ok(positions)
    }

    fn collect(&self, header: &[String], positions: &mut BTreeSet<usize>) -> Result<()> {
        match self {
            Selector::Pattern(pattern) => full_matches(pattern, header, positions)?,
            Selector::Regex(regex) => full_matches(regex.as_str(), header, positions)?,
            Selector::Index(index) => {
                positions.insert(*index);
            }
            Selector::Any(selectors) => {
                for selector in selectors {
                    selector.collect(header, positions)?;
                }
            }
        }
        Ok(())
    }
}

fn full_matches(pattern: &str, header: &[String], positions: &mut BTreeSet<usize>) -> Result<()> {
    let anchored = Regex::new(&format!("^(?:{pattern})$"))
        .map_err(|e| Error::Selector(format!("invalid field pattern {pattern:?}: {e}")))?;
    positions.extend(
        header
            .iter()
            .enumerate()
            .filter(|(_, name)| anchored.is_match(name))
            .map(|(i, _)| i),
    );
    Ok(())
}

impl From<&str> for Selector {
    fn from(pattern: &str) -> Self {
        Selector::Pattern(pattern.to_string())
    }
}

impl From<String> for Selector {
    fn from(pattern: String) -> Self {
        Selector::Pattern(pattern)
    }
}

impl From<Regex> for Selector {
    fn from(regex: Regex) -> Self {
        Selector::Regex(regex)
    }
}

impl From<usize> for Selector {
    fn from(index: usize) -> Self {
        Selector::Index(index)
    }
}

impl<S: Into<Selector>> From<Vec<S>> for Selector {
    fn from(selectors: Vec<S>) -> Self {
        Selector::Any(selectors.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<Selector>, const N: usize> From<[S; N]> for Selector {
    fn from(selectors: [S; N]) -> Self {
        Selector::Any(selectors.into_iter().map(Into::into).collect())
    }
}

impl<A: Into<Selector>, B: Into<Selector>> From<(A, B)> for Selector {
    fn from((a, b): (A, B)) -> Self {
        Selector::Any(vec![a.into(), b.into()])
    }
}

impl<A: Into<Selector>, B: Into<Selector>, C: Into<Selector>> From<(A, B, C)> for Selector {
    fn from((a, b, c): (A, B, C)) -> Self {
        Selector::Any(vec![a.into(), b.into(), c.into()])
    }
}
