//! Planner configuration, loadable from TOML.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, Result};
use crate::index::cursor::ScanOrder;

/// Options that steer index selection and bound filter complexity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlannerOptions {
    /// Whether the planner may answer filters through property indexes.
    pub index_scan: bool,
    /// Key order of index cursors.
    pub scan_order: ScanOrder,
    /// Maximum WHERE tree depth accepted by validation.
    pub max_filter_depth: usize,
    /// Maximum number of predicates in a WHERE tree.
    pub max_filter_predicates: usize,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self {
            index_scan: true,
            scan_order: ScanOrder::Ascending,
            max_filter_depth: 256,
            max_filter_predicates: 10_000,
        }
    }
}

impl PlannerOptions {
    /// Parses options from a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|err| QueryError::Config(err.to_string()))
    }

    /// Reads options from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Enables or disables index-accelerated plans.
    pub fn index_scan(mut self, enabled: bool) -> Self {
        self.index_scan = enabled;
        self
    }

    /// Sets the cursor key order.
    pub fn scan_order(mut self, order: ScanOrder) -> Self {
        self.scan_order = order;
        self
    }

    /// Sets the maximum WHERE depth.
    pub fn max_filter_depth(mut self, depth: usize) -> Self {
        self.max_filter_depth = depth;
        self
    }

    /// Sets the maximum predicate count.
    pub fn max_filter_predicates(mut self, count: usize) -> Self {
        self.max_filter_predicates = count;
        self
    }
}
