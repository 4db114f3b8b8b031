//! linode_databases - Managed database instances
//!
//! The instances endpoint accepts no server-side filters, so every entry is
//! evaluated locally.

use linode_core::provider::BoxFuture;
use linode_core::resource::Value;
use linode_core::schema::{AttributeType, BlockSchema};
use linode_filter::{FieldValue, FilterConfig, FilterType, ListResult};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use super::{object, results_block, string_set};
use crate::client::{SharedApi, list_entities};
use crate::datasource::FilteredDataSource;

const ENDPOINT: &str = "databases/instances";

#[derive(Debug, Clone, Deserialize)]
pub struct Database {
    pub id: i64,
    pub label: String,
    pub engine: String,
    pub version: String,
    pub region: String,
    pub status: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub cluster_size: i64,
    #[serde(default)]
    pub encrypted: bool,
    #[serde(default)]
    pub ssl_connection: bool,
    #[serde(default)]
    pub replication_type: Option<String>,
    #[serde(default)]
    pub allow_list: Vec<String>,
    #[serde(default)]
    pub hosts: Hosts,
    #[serde(default)]
    pub instance_uri: String,
    pub created: String,
    #[serde(default)]
    pub updated: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Hosts {
    #[serde(default)]
    pub primary: Option<String>,
    #[serde(default)]
    pub secondary: Option<String>,
}

pub fn filter_config() -> FilterConfig<Database> {
    FilterConfig::<Database>::new()
        .local("engine", FilterType::String, |d| FieldValue::from(&d.engine))
        .local("region", FilterType::String, |d| FieldValue::from(&d.region))
        .local("status", FilterType::String, |d| FieldValue::from(&d.status))
        .local("type", FilterType::String, |d| FieldValue::from(&d.node_type))
        .local("version", FilterType::String, |d| FieldValue::from(&d.version))
        .local("allow_list", FilterType::String, |d| FieldValue::list(&d.allow_list))
        .local("cluster_size", FilterType::Int, |d| FieldValue::from(d.cluster_size))
        .local("created", FilterType::String, |d| FieldValue::from(&d.created))
        .local("encrypted", FilterType::Bool, |d| FieldValue::from(d.encrypted))
        .local("host_primary", FilterType::String, |d| FieldValue::from(d.hosts.primary.as_ref()))
        .local("host_secondary", FilterType::String, |d| {
            FieldValue::from(d.hosts.secondary.as_ref())
        })
        .local("id", FilterType::Int, |d| FieldValue::from(d.id))
        .local("instance_uri", FilterType::String, |d| FieldValue::from(&d.instance_uri))
        .local("label", FilterType::String, |d| FieldValue::from(&d.label))
        .local("updated", FilterType::String, |d| FieldValue::from(d.updated.as_ref()))
}

fn list<'a>(
    cancel: &'a CancellationToken,
    api: &'a SharedApi,
    filter: &'a str,
) -> BoxFuture<'a, ListResult<Database>> {
    Box::pin(list_entities(api, ENDPOINT, filter, cancel))
}

fn flatten(db: &Database) -> Value {
    object([
        ("id", Value::from(db.id)),
        ("label", Value::from(&db.label)),
        ("engine", Value::from(&db.engine)),
        ("version", Value::from(&db.version)),
        ("region", Value::from(&db.region)),
        ("status", Value::from(&db.status)),
        ("type", Value::from(&db.node_type)),
        ("cluster_size", Value::from(db.cluster_size)),
        ("encrypted", Value::from(db.encrypted)),
        ("ssl_connection", Value::from(db.ssl_connection)),
        ("replication_type", Value::from(db.replication_type.as_ref())),
        ("allow_list", Value::from(db.allow_list.clone())),
        ("host_primary", Value::from(db.hosts.primary.as_ref())),
        ("host_secondary", Value::from(db.hosts.secondary.as_ref())),
        ("instance_uri", Value::from(&db.instance_uri)),
        ("created", Value::from(&db.created)),
        ("updated", Value::from(db.updated.as_ref())),
    ])
}

fn results() -> BlockSchema {
    results_block(
        "databases",
        vec![
            ("id", AttributeType::Int),
            ("label", AttributeType::String),
            ("engine", AttributeType::String),
            ("version", AttributeType::String),
            ("region", AttributeType::String),
            ("status", AttributeType::String),
            ("type", AttributeType::String),
            ("cluster_size", AttributeType::Int),
            ("encrypted", AttributeType::Bool),
            ("ssl_connection", AttributeType::Bool),
            ("replication_type", AttributeType::String),
            ("allow_list", string_set()),
            ("host_primary", AttributeType::String),
            ("host_secondary", AttributeType::String),
            ("instance_uri", AttributeType::String),
            ("created", AttributeType::String),
            ("updated", AttributeType::String),
        ],
    )
}

pub fn data_source(api: SharedApi) -> FilteredDataSource<Database> {
    FilteredDataSource::new("linode_databases", api, filter_config(), list, flatten, results())
        .with_description("Lists Managed Database instances on the account.")
}
