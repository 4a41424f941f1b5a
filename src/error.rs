//! Error type for filter construction, evaluation, and planning.

use std::io;

use thiserror::Error;

use crate::query::value::Domain;
use crate::types::EntityId;

/// Result alias for fallible query operations.
pub type Result<T> = std::result::Result<T, QueryError>;

/// Errors surfaced by filter construction, evaluation, and index planning.
///
/// None of these are fatal to the host: construction errors abort planning of
/// a single query, `IndexNotFound` routes the caller to a full scan.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Neither side of a predicate is a property reference.
    #[error("predicate requires at least one property operand")]
    InvalidOperandKind,
    /// Values of different domains were compared.
    #[error("cannot compare {left} value with {right} value")]
    DomainMismatch {
        /// Domain of the property value.
        left: Domain,
        /// Domain of the value it was compared with.
        right: Domain,
    },
    /// No index exists for the (label, property) pair.
    #[error("no index on :{label}({property})")]
    IndexNotFound {
        /// Requested label.
        label: String,
        /// Requested property.
        property: String,
    },
    /// The domain has no sub-index.
    #[error("{0} values are not indexed")]
    UnindexedDomain(Domain),
    /// Function name not recognised.
    #[error("unknown function '{0}'")]
    UnknownFunction(String),
    /// Function applied to an unsupported argument.
    #[error("invalid argument to {function}(): {reason}")]
    InvalidFunctionArgument {
        /// Canonical function name.
        function: &'static str,
        /// What was wrong with the argument.
        reason: String,
    },
    /// Entity id does not fit the selection matrix.
    #[error("entity {id} outside selection universe of {universe}")]
    IdentifierOutOfRange {
        /// Offending id.
        id: EntityId,
        /// Selection dimension.
        universe: u64,
    },
    /// Clause combination or alias usage rejected.
    #[error("invalid query: {0}")]
    InvalidQuery(String),
    /// Malformed planner configuration.
    #[error("configuration error: {0}")]
    Config(String),
    /// Reading configuration failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl QueryError {
    pub(crate) fn index_not_found(label: &str, property: &str) -> Self {
        QueryError::IndexNotFound {
            label: label.to_owned(),
            property: property.to_owned(),
        }
    }

    /// Returns `true` for errors the planner treats as a signal to fall back
    /// to a full scan rather than abort.
    pub fn is_fallback(&self) -> bool {
        matches!(self, QueryError::IndexNotFound { .. })
    }
}
