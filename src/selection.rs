//! Sparse selection matrices built from index cursors.
//!
//! A selection is the square boolean diagonal over the entity universe that
//! the traversal engine multiplies into its adjacency products: cell
//! `(id, id)` is set for every selected entity, nothing else is.

use std::collections::BTreeSet;

use tracing::debug;

use crate::error::{QueryError, Result};
use crate::index::cursor::IndexCursor;
use crate::types::EntityId;

/// Square `dim x dim` boolean matrix with entries only on the diagonal.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SelectionMatrix {
    dim: u64,
    ids: Vec<EntityId>,
}

impl SelectionMatrix {
    /// Empty selection over a universe of `dim` entities.
    pub fn new(dim: u64) -> Self {
        Self {
            dim,
            ids: Vec::new(),
        }
    }

    /// Builds a selection from arbitrary ids; duplicates collapse.
    pub fn from_ids<I>(dim: u64, ids: I) -> Result<Self>
    where
        I: IntoIterator<Item = EntityId>,
    {
        let mut set = BTreeSet::new();
        for id in ids {
            check_bounds(id, dim)?;
            set.insert(id);
        }
        Ok(Self {
            dim,
            ids: set.into_iter().collect(),
        })
    }

    /// Row count.
    pub fn nrows(&self) -> u64 {
        self.dim
    }

    /// Column count; equals the row count.
    pub fn ncols(&self) -> u64 {
        self.dim
    }

    /// Number of set cells.
    pub fn nvals(&self) -> usize {
        self.ids.len()
    }

    /// Whether nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Whether cell `(row, col)` is set.
    pub fn get(&self, row: u64, col: u64) -> bool {
        row == col && self.contains(EntityId(row))
    }

    /// Whether `id` is selected.
    pub fn contains(&self, id: EntityId) -> bool {
        self.ids.binary_search(&id).is_ok()
    }

    /// Selected ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.ids.iter().copied()
    }
}

fn check_bounds(id: EntityId, universe: u64) -> Result<()> {
    if id.0 >= universe {
        return Err(QueryError::IdentifierOutOfRange { id, universe });
    }
    Ok(())
}

/// Drains `cursor` into a selection over `universe` entities.
///
/// The cursor is exhausted afterwards, even on error; converting it again
/// yields an empty selection. Fails if any id lies outside the universe.
pub fn cursor_to_selection(
    cursor: &mut IndexCursor<'_>,
    universe: u64,
) -> Result<SelectionMatrix> {
    let ids: Vec<EntityId> = cursor.by_ref().collect();
    let selection = SelectionMatrix::from_ids(universe, ids)?;
    debug!(universe, selected = selection.nvals(), "selection.build");
    Ok(selection)
}
