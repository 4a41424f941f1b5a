//! In-memory row of alias bindings used to evaluate filters.

use rustc_hash::FxHashMap;

use crate::query::filter::Bindings;
use crate::query::value::Value;

/// Properties of a single bound entity.
pub type PropertyMap = FxHashMap<String, Value>;

/// A row mapping each alias to the properties of the entity it is bound to.
#[derive(Clone, Debug, Default)]
pub struct Record {
    entities: FxHashMap<String, PropertyMap>,
}

impl Record {
    /// Row with no bindings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `alias` to an entity with the given properties, replacing any
    /// previous binding.
    pub fn bind<I, K>(&mut self, alias: impl Into<String>, props: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let props = props.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self.entities.insert(alias.into(), props);
        self
    }

    /// Binds `alias` to an existing property map.
    pub fn bind_map(&mut self, alias: impl Into<String>, props: PropertyMap) -> &mut Self {
        self.entities.insert(alias.into(), props);
        self
    }
}

impl Bindings for Record {
    fn property(&self, alias: &str, property: &str) -> Option<&Value> {
        self.entities.get(alias)?.get(property)
    }
}
