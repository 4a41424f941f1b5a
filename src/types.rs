#![forbid(unsafe_code)]

//! Identifiers shared across the index and selection layers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a graph entity inside the traversal engine's entity-count
/// domain. Doubles as the row/column coordinate of a selection matrix.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(value: u64) -> Self {
        EntityId(value)
    }
}
