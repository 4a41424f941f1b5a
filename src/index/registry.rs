//! Per-graph registry of property indexes.

use std::fmt;

use rustc_hash::FxHashMap;
use tracing::{debug, info};

use crate::error::{QueryError, Result};
use crate::index::property::PropertyIndex;
use crate::query::ast::{IndexClause, IndexOp};
use crate::query::value::Value;
use crate::types::EntityId;

/// Owns every property index of one graph, keyed by (label, property).
///
/// The registry is passed explicitly to the planner; its lifetime is tied to
/// the graph that owns it.
#[derive(Debug, Default)]
pub struct IndexRegistry {
    indexes: FxHashMap<(String, String), PropertyIndex>,
}

/// Result of running an index DDL clause.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum IndexOutcome {
    /// The index was built (or rebuilt) with `entries` indexed entities.
    Created {
        /// Indexed label.
        label: String,
        /// Indexed property.
        property: String,
        /// Entities placed in the index.
        entries: usize,
    },
    /// The index was removed.
    Dropped {
        /// Label of the removed index.
        label: String,
        /// Property of the removed index.
        property: String,
    },
}

impl fmt::Display for IndexOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexOutcome::Created { .. } => f.write_str("Added 1 index."),
            IndexOutcome::Dropped { .. } => f.write_str("Removed 1 index."),
        }
    }
}

impl IndexRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the index for `(label, property)` from `source`, replacing any
    /// existing one.
    pub fn create_index<I, V>(&mut self, label: &str, property: &str, source: I) -> &PropertyIndex
    where
        I: IntoIterator<Item = (EntityId, V)>,
        V: Into<Option<Value>>,
    {
        let index = PropertyIndex::build(label, property, source);
        info!(label, property, entries = index.len(), "index.create");
        let key = (label.to_owned(), property.to_owned());
        self.indexes.insert(key.clone(), index);
        &self.indexes[&key]
    }

    /// Drops the index for `(label, property)`.
    pub fn delete_index(&mut self, label: &str, property: &str) -> Result<()> {
        let key = (label.to_owned(), property.to_owned());
        match self.indexes.remove(&key) {
            Some(index) => {
                info!(label, property, entries = index.len(), "index.delete");
                Ok(())
            }
            None => Err(QueryError::index_not_found(label, property)),
        }
    }

    /// Looks up an index; `IndexNotFound` when absent.
    pub fn get(&self, label: &str, property: &str) -> Result<&PropertyIndex> {
        self.indexes
            .get(&(label.to_owned(), property.to_owned()))
            .ok_or_else(|| QueryError::index_not_found(label, property))
    }

    /// Mutable lookup; `IndexNotFound` when absent.
    pub fn get_mut(&mut self, label: &str, property: &str) -> Result<&mut PropertyIndex> {
        self.indexes
            .get_mut(&(label.to_owned(), property.to_owned()))
            .ok_or_else(|| QueryError::index_not_found(label, property))
    }

    /// Whether `(label, property)` is indexed.
    pub fn contains(&self, label: &str, property: &str) -> bool {
        self.indexes
            .contains_key(&(label.to_owned(), property.to_owned()))
    }

    /// Number of indexes.
    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    /// Whether no index exists.
    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    /// All indexes, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &PropertyIndex> {
        self.indexes.values()
    }

    /// Runs a CREATE/DROP INDEX clause. `source` supplies the label's
    /// `(entity, value)` pairs and is only consulted for CREATE.
    pub fn apply<F, I, V>(&mut self, clause: &IndexClause, source: F) -> Result<IndexOutcome>
    where
        F: FnOnce(&str, &str) -> I,
        I: IntoIterator<Item = (EntityId, V)>,
        V: Into<Option<Value>>,
    {
        let (label, property) = (clause.label.as_str(), clause.property.as_str());
        match clause.op {
            IndexOp::Create => {
                let entries = self.create_index(label, property, source(label, property)).len();
                Ok(IndexOutcome::Created {
                    label: label.to_owned(),
                    property: property.to_owned(),
                    entries,
                })
            }
            IndexOp::Drop => {
                self.delete_index(label, property)?;
                Ok(IndexOutcome::Dropped {
                    label: label.to_owned(),
                    property: property.to_owned(),
                })
            }
        }
    }

    /// Keeps an index in step with a property change on `id`. Returns `false`
    /// when no index covers `(label, property)`.
    pub fn update_property(
        &mut self,
        label: &str,
        property: &str,
        id: EntityId,
        old: Option<&Value>,
        new: Option<&Value>,
    ) -> bool {
        let Ok(index) = self.get_mut(label, property) else {
            return false;
        };
        if let Some(old) = old {
            index.remove(id, old);
        }
        if let Some(new) = new {
            index.insert(id, new);
        }
        debug!(label, property, entity = id.0, "index.update");
        true
    }
}
