//! Per-entity data sources
//!
//! Each module declares one entity as the vendor returns it, its filter
//! table, the list callback for its endpoint, the flattener and the
//! computed result block. Everything else comes from
//! [`FilteredDataSource`](crate::datasource::FilteredDataSource).

pub mod database_engines;
pub mod databases;
pub mod firewalls;
pub mod images;
pub mod instance_types;
pub mod regions;
pub mod stackscripts;
pub mod users;
pub mod volumes;
pub mod vpcs;

use linode_core::resource::Value;
use linode_core::schema::{AttributeSchema, AttributeType, BlockNesting, BlockSchema};

use crate::client::SharedApi;
use crate::datasource::ListDataSource;

/// Every list data source, sharing one API handle
pub fn all(api: &SharedApi) -> Vec<Box<dyn ListDataSource>> {
    vec![
        Box::new(database_engines::data_source(api.clone())),
        Box::new(databases::data_source(api.clone())),
        Box::new(firewalls::data_source(api.clone())),
        Box::new(images::data_source(api.clone())),
        Box::new(instance_types::data_source(api.clone())),
        Box::new(regions::data_source(api.clone())),
        Box::new(stackscripts::data_source(api.clone())),
        Box::new(users::data_source(api.clone())),
        Box::new(volumes::data_source(api.clone())),
        Box::new(vpcs::data_source(api.clone())),
    ]
}

/// Build a flattened object from `(attribute, value)` pairs
pub(crate) fn object<const N: usize>(fields: [(&str, Value); N]) -> Value {
    Value::Map(
        fields
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect(),
    )
}

pub(crate) fn string_list() -> AttributeType {
    AttributeType::List(Box::new(AttributeType::String))
}

pub(crate) fn string_set() -> AttributeType {
    AttributeType::Set(Box::new(AttributeType::String))
}

/// Result block whose attributes are all computed
pub(crate) fn results_block(name: &str, fields: Vec<(&str, AttributeType)>) -> BlockSchema {
    nested_block(name, BlockNesting::List, fields)
}

pub(crate) fn nested_block(
    name: &str,
    nesting: BlockNesting,
    fields: Vec<(&str, AttributeType)>,
) -> BlockSchema {
    fields.into_iter().fold(
        BlockSchema::new(name, nesting).computed(),
        |block, (field, attr_type)| block.attribute(AttributeSchema::new(field, attr_type).computed()),
    )
}
