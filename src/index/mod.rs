#![forbid(unsafe_code)]

//! Ordered secondary indexes over node properties.

/// Cursors over index key intervals.
pub mod cursor;

/// Index keys and key intervals.
pub mod key;

/// Per-(label, property) index.
pub mod property;

/// Registry of indexes keyed by (label, property).
pub mod registry;

pub use cursor::{IndexCursor, ScanOrder};
pub use key::{Interval, KeyRange};
pub use property::PropertyIndex;
pub use registry::{IndexOutcome, IndexRegistry};
