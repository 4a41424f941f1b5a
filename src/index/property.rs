//! Ordered property index for one (label, property) pair.

use std::collections::BTreeMap;
use std::ops::Bound;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::Result;
use crate::index::cursor::{IndexCursor, Postings, ScanOrder};
use crate::index::key::{KeyRange, NumberKey, Slot};
use crate::query::value::{Domain, Value};
use crate::types::EntityId;

/// Two independent ordered sub-indexes (string keys and numeric keys) mapping
/// each key to the entities holding it.
///
/// Every entity occupies at most one slot: re-inserting an entity under a new
/// value moves it. Boolean values are not indexed.
#[derive(Clone, Debug)]
pub struct PropertyIndex {
    label: String,
    property: String,
    strings: BTreeMap<String, Postings>,
    numbers: BTreeMap<NumberKey, Postings>,
    /// Current key of each entity and its insertion sequence within it.
    slots: FxHashMap<EntityId, (Slot, u64)>,
    next_seq: u64,
}

impl PropertyIndex {
    /// Creates an empty index.
    pub fn new(label: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            property: property.into(),
            strings: BTreeMap::new(),
            numbers: BTreeMap::new(),
            slots: FxHashMap::default(),
            next_seq: 0,
        }
    }

    /// Builds an index from `(entity, value)` pairs. Entities without the
    /// property (`None`) or with a boolean value are skipped.
    pub fn build<I, V>(label: impl Into<String>, property: impl Into<String>, source: I) -> Self
    where
        I: IntoIterator<Item = (EntityId, V)>,
        V: Into<Option<Value>>,
    {
        let mut index = Self::new(label, property);
        let mut skipped = 0usize;
        for (id, value) in source {
            match value.into() {
                Some(value) if index.insert(id, &value) => {}
                _ => skipped += 1,
            }
        }
        debug!(
            label = %index.label,
            property = %index.property,
            entries = index.len(),
            skipped,
            "index.build"
        );
        index
    }

    /// Indexed label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Indexed property.
    pub fn property(&self) -> &str {
        &self.property
    }

    /// Number of indexed entities across both sub-indexes.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no entity is indexed.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Whether `id` currently occupies a slot.
    pub fn contains(&self, id: EntityId) -> bool {
        self.slots.contains_key(&id)
    }

    /// Number of distinct keys in one sub-index.
    pub fn distinct_keys(&self, domain: Domain) -> usize {
        match domain {
            Domain::String => self.strings.len(),
            Domain::Numeric => self.numbers.len(),
            Domain::Boolean => 0,
        }
    }

    /// Indexes `id` under `value`, appending it after entities already
    /// holding an equal key. Returns `false` if the value is not indexable, in
    /// which case any previous slot of `id` is vacated.
    pub fn insert(&mut self, id: EntityId, value: &Value) -> bool {
        let Some(slot) = Slot::from_value(value) else {
            self.vacate(id);
            return false;
        };
        if self.current_slot(id) == Some(&slot) {
            return true;
        }
        self.vacate(id);
        let seq = self.next_seq;
        self.next_seq += 1;
        match &slot {
            Slot::String(key) => {
                self.strings.entry(key.clone()).or_default().insert(seq, id);
            }
            Slot::Number(key) => {
                self.numbers.entry(*key).or_default().insert(seq, id);
            }
        }
        self.slots.insert(id, (slot, seq));
        true
    }

    /// Removes `id` if it is currently indexed under `value`.
    pub fn remove(&mut self, id: EntityId, value: &Value) -> bool {
        let Some(slot) = Slot::from_value(value) else {
            return false;
        };
        if self.current_slot(id) != Some(&slot) {
            return false;
        }
        self.vacate(id)
    }

    fn current_slot(&self, id: EntityId) -> Option<&Slot> {
        self.slots.get(&id).map(|(slot, _)| slot)
    }

    fn vacate(&mut self, id: EntityId) -> bool {
        let Some((slot, seq)) = self.slots.remove(&id) else {
            return false;
        };
        match slot {
            Slot::String(key) => remove_posting(&mut self.strings, &key, seq),
            Slot::Number(key) => remove_posting(&mut self.numbers, &key, seq),
        }
        true
    }

    /// Opens a cursor over the keys of `domain` between `lower` and `upper`.
    ///
    /// Bound values must belong to `domain`; booleans cannot be scanned.
    pub fn range_scan(
        &self,
        domain: Domain,
        lower: Bound<Value>,
        upper: Bound<Value>,
        order: ScanOrder,
    ) -> Result<IndexCursor<'_>> {
        let range = KeyRange::from_bounds(domain, lower, upper)?;
        Ok(self.scan(&range, order))
    }

    /// Opens a cursor over a prepared key range. Empty ranges give an empty
    /// cursor.
    pub fn scan(&self, range: &KeyRange, order: ScanOrder) -> IndexCursor<'_> {
        if range.is_empty() {
            return IndexCursor::empty();
        }
        match range {
            KeyRange::String(interval) => {
                IndexCursor::strings(self.strings.range::<String, _>(interval.as_bounds()), order)
            }
            KeyRange::Number(interval) => {
                let range = self.numbers.range::<NumberKey, _>(interval.as_bounds());
                IndexCursor::numbers(range, order)
            }
        }
    }
}

fn remove_posting<K: Ord>(map: &mut BTreeMap<K, Postings>, key: &K, seq: u64) {
    if let Some(ids) = map.get_mut(key) {
        ids.remove(&seq);
        if ids.is_empty() {
            map.remove(key);
        }
    }
}
