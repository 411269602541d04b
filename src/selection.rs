//! Choosing which TOC entries to split out.
//!
//! Entries are addressed by their 1-based position in the listing printed by
//! `tocsplit toc`, using the same comma/range syntax as page lists:
//! `"1,3"`, `"2-5"`, `"4-end"`.

use anyhow::{anyhow, Result};
use regex::Regex;

use crate::pdf::toc::TocEntry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRange {
    pub start: IndexRef,
    pub end: Option<IndexRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexRef {
    Number(usize),
    End,
}

impl IndexRange {
    /// Parse a single item like "3", "2-5", "5-2", "4-end"
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow!("Empty selection"));
        }

        if let Some(dash_pos) = s.find('-') {
            if dash_pos == 0 {
                return Err(anyhow!("Invalid selection: {}", s));
            }

            let start = parse_index_ref(&s[..dash_pos])?;
            let end = parse_index_ref(&s[dash_pos + 1..])?;

            Ok(IndexRange {
                start,
                end: Some(end),
            })
        } else {
            Ok(IndexRange {
                start: parse_index_ref(s)?,
                end: None,
            })
        }
    }

    /// Expand into 1-based entry numbers, lowest first.
    pub fn expand(&self, total: usize) -> Result<Vec<usize>> {
        let resolve = |r: &IndexRef| match r {
            IndexRef::Number(n) => *n,
            IndexRef::End => total,
        };

        let start = resolve(&self.start);
        let end = self.end.as_ref().map(resolve).unwrap_or(start);

        if start == 0 || end == 0 {
            return Err(anyhow!("Entry numbers must be >= 1"));
        }

        let (low, high) = if start <= end { (start, end) } else { (end, start) };
        if high > total {
            return Err(anyhow!(
                "Entry {} exceeds the {} table of contents entries",
                high,
                total
            ));
        }

        Ok((low..=high).collect())
    }
}

fn parse_index_ref(s: &str) -> Result<IndexRef> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("end") {
        Ok(IndexRef::End)
    } else {
        s.parse::<usize>()
            .map(IndexRef::Number)
            .map_err(|_| anyhow!("Invalid entry number: {}", s))
    }
}

/// Parse a selection like "1-3,7,9-end" into sorted, de-duplicated 0-based indices.
pub fn parse_selection(s: &str, total: usize) -> Result<Vec<usize>> {
    let mut indices = Vec::new();
    for part in s.split(',') {
        indices.extend(IndexRange::parse(part)?.expand(total)?);
    }
    indices.sort_unstable();
    indices.dedup();
    Ok(indices.into_iter().map(|n| n - 1).collect())
}

/// The ways a user can pick entries. Selectors combine by union.
#[derive(Debug, Default, Clone)]
pub struct Selector {
    pub indices: Option<String>,
    /// Every top-level entry, i.e. every entry at the shallowest level present.
    pub all: bool,
    pub level: Option<u32>,
    pub pattern: Option<Regex>,
}

impl Selector {
    pub fn is_empty(&self) -> bool {
        self.indices.is_none() && !self.all && self.level.is_none() && self.pattern.is_none()
    }

    /// Set `selected` on every entry this selector picks, then clear it on
    /// entries nested under another selected entry. Returns how many entries
    /// are selected afterwards.
    pub fn apply(&self, entries: &mut [TocEntry]) -> Result<usize> {
        let by_index = match &self.indices {
            Some(expr) => parse_selection(expr, entries.len())?,
            None => Vec::new(),
        };
        let top_level = entries.iter().map(|e| e.level).min();

        for (i, entry) in entries.iter_mut().enumerate() {
            let picked = (self.all && Some(entry.level) == top_level)
                || by_index.binary_search(&i).is_ok()
                || self.level == Some(entry.level)
                || self
                    .pattern
                    .as_ref()
                    .is_some_and(|re| re.is_match(&entry.title));
            entry.selected |= picked;
        }

        drop_nested_selections(entries);

        Ok(entries.iter().filter(|e| e.selected).count())
    }
}

/// A selected entry already covers everything up to its next entry at the
/// same or a higher level, so nothing inside that span stays selected.
pub fn drop_nested_selections(entries: &mut [TocEntry]) {
    // Level of the selected entry whose span we are currently inside.
    let mut covering: Option<u32> = None;

    for entry in entries.iter_mut() {
        if let Some(level) = covering {
            if entry.level > level {
                if entry.selected {
                    tracing::debug!(title = %entry.title, "dropping entry nested in a selected one");
                    entry.selected = false;
                }
                continue;
            }
            covering = None;
        }
        if entry.selected {
            covering = Some(entry.level);
        }
    }
}
