#![allow(dead_code)]

use std::sync::Once;

use graphmat_query::index::IndexRegistry;
use graphmat_query::query::record::{PropertyMap, Record};
use graphmat_query::query::{CompareOp, FilterNode, Operand, Value};
use graphmat_query::EntityId;

static TRACING: Once = Once::new();

/// Routes library events to the test writer; honours `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// In-memory node store for one label.
pub struct People {
    pub rows: Vec<(EntityId, PropertyMap)>,
}

impl People {
    /// `count` people with `age = i % 50`, `name = "p{i:03}"`, and every
    /// seventh one flagged `active = true`.
    pub fn generate(count: u64) -> Self {
        let rows = (0..count)
            .map(|i| {
                let mut props = PropertyMap::default();
                props.insert("age".into(), Value::from((i % 50) as i64));
                props.insert("name".into(), Value::from(format!("p{i:03}")));
                props.insert("active".into(), Value::from(i % 7 == 0));
                (EntityId(i), props)
            })
            .collect();
        Self { rows }
    }

    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.rows.iter().map(|(id, _)| *id)
    }

    pub fn column(&self, property: &str) -> Vec<(EntityId, Option<Value>)> {
        self.rows
            .iter()
            .map(|(id, props)| (*id, props.get(property).cloned()))
            .collect()
    }

    pub fn bind(&self, alias: &str, id: EntityId) -> Record {
        let mut row = Record::new();
        if let Some((_, props)) = self.rows.iter().find(|(row_id, _)| *row_id == id) {
            row.bind_map(alias, props.clone());
        }
        row
    }

    pub fn registry(&self, properties: &[&str]) -> IndexRegistry {
        let mut registry = IndexRegistry::new();
        for property in properties {
            registry.create_index("Person", property, self.column(property));
        }
        registry
    }
}

pub fn pred(alias: &str, prop: &str, op: CompareOp, value: impl Into<Value>) -> FilterNode {
    FilterNode::predicate(Operand::property(alias, prop), op, Operand::constant(value))
        .expect("valid predicate")
}
