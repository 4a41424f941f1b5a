//! Single-pass cursors over a key interval of a property index.

use std::collections::{btree_map, BTreeMap};
use std::iter::FusedIterator;

use serde::{Deserialize, Serialize};

use crate::index::key::NumberKey;
use crate::types::EntityId;

/// Identifiers sharing one key, keyed by insertion sequence so ties stay in
/// insertion order and removal is logarithmic.
pub(crate) type Postings = BTreeMap<u64, EntityId>;

/// Key order in which a cursor visits the interval.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanOrder {
    /// Smallest key first.
    #[default]
    Ascending,
    /// Largest key first.
    Descending,
}

enum Source<'a> {
    Strings(btree_map::Range<'a, String, Postings>),
    Numbers(btree_map::Range<'a, NumberKey, Postings>),
    Exhausted,
}

/// Read-only, single-pass enumeration of the identifiers whose key lies in an
/// interval. Borrows the index, so the index cannot change while it is open.
///
/// Keys are visited in the requested order; identifiers under one key are
/// always yielded in insertion order. Dropping the cursor releases it.
pub struct IndexCursor<'a> {
    source: Source<'a>,
    order: ScanOrder,
    bucket: Option<btree_map::Values<'a, u64, EntityId>>,
}

impl<'a> IndexCursor<'a> {
    /// Cursor that yields nothing.
    pub fn empty() -> Self {
        Self {
            source: Source::Exhausted,
            order: ScanOrder::Ascending,
            bucket: None,
        }
    }

    pub(crate) fn strings(range: btree_map::Range<'a, String, Postings>, order: ScanOrder) -> Self {
        Self {
            source: Source::Strings(range),
            order,
            bucket: None,
        }
    }

    pub(crate) fn numbers(
        range: btree_map::Range<'a, NumberKey, Postings>,
        order: ScanOrder,
    ) -> Self {
        Self {
            source: Source::Numbers(range),
            order,
            bucket: None,
        }
    }

    /// Key order of the scan.
    pub fn order(&self) -> ScanOrder {
        self.order
    }

    /// Whether the cursor has nothing left to yield.
    pub fn is_exhausted(&self) -> bool {
        self.bucket.as_ref().map_or(true, |ids| ids.len() == 0)
            && matches!(self.source, Source::Exhausted)
    }

    fn next_bucket(&mut self) -> Option<btree_map::Values<'a, u64, EntityId>> {
        let descending = self.order == ScanOrder::Descending;
        let next = match &mut self.source {
            Source::Strings(range) if descending => range.next_back().map(|(_, ids)| ids.values()),
            Source::Strings(range) => range.next().map(|(_, ids)| ids.values()),
            Source::Numbers(range) if descending => range.next_back().map(|(_, ids)| ids.values()),
            Source::Numbers(range) => range.next().map(|(_, ids)| ids.values()),
            Source::Exhausted => None,
        };
        if next.is_none() {
            self.source = Source::Exhausted;
        }
        next
    }
}

impl Iterator for IndexCursor<'_> {
    type Item = EntityId;

    fn next(&mut self) -> Option<EntityId> {
        loop {
            if let Some(id) = self.bucket.as_mut().and_then(|ids| ids.next()) {
                return Some(*id);
            }
            self.bucket = Some(self.next_bucket()?);
        }
    }
}

impl FusedIterator for IndexCursor<'_> {}
