//! Filter trees, property indexes, and index-scan planning for a
//! matrix-based graph query engine.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Error type and result alias.
pub mod error;
/// Property indexes and cursors.
pub mod index;
/// Filters, clause model, and planning.
pub mod query;
/// Cursor to selection-matrix bridge.
pub mod selection;
/// Shared identifier types.
pub mod types;

pub use error::{QueryError, Result};
pub use types::EntityId;
