//! linode_volumes - Block Storage volumes

use linode_core::provider::BoxFuture;
use linode_core::resource::Value;
use linode_core::schema::{AttributeType, BlockSchema};
use linode_filter::{FieldValue, FilterConfig, FilterType, ListResult};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use super::{object, results_block, string_set};
use crate::client::{SharedApi, list_entities};
use crate::datasource::FilteredDataSource;

const ENDPOINT: &str = "volumes";

#[derive(Debug, Clone, Deserialize)]
pub struct Volume {
    pub id: i64,
    pub label: String,
    pub region: String,
    pub size: i64,
    pub status: String,
    #[serde(default)]
    pub linode_id: Option<i64>,
    #[serde(default)]
    pub filesystem_path: String,
    #[serde(default)]
    pub encryption: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created: String,
    #[serde(default)]
    pub updated: Option<String>,
}

pub fn filter_config() -> FilterConfig<Volume> {
    FilterConfig::<Volume>::new()
        .api("label", FilterType::String, |v| FieldValue::from(&v.label))
        .api("tags", FilterType::String, |v| FieldValue::list(&v.tags))
        .local("id", FilterType::Int, |v| FieldValue::from(v.id))
        .local("region", FilterType::String, |v| FieldValue::from(&v.region))
        .local("size", FilterType::Int, |v| FieldValue::from(v.size))
        .local("status", FilterType::String, |v| FieldValue::from(&v.status))
        .local("linode_id", FilterType::Int, |v| FieldValue::from(v.linode_id))
        .local("filesystem_path", FilterType::String, |v| FieldValue::from(&v.filesystem_path))
        .local("encryption", FilterType::String, |v| FieldValue::from(v.encryption.as_ref()))
        .local("created", FilterType::String, |v| FieldValue::from(&v.created))
        .local("updated", FilterType::String, |v| FieldValue::from(v.updated.as_ref()))
}

fn list<'a>(
    cancel: &'a CancellationToken,
    api: &'a SharedApi,
    filter: &'a str,
) -> BoxFuture<'a, ListResult<Volume>> {
    Box::pin(list_entities(api, ENDPOINT, filter, cancel))
}

fn flatten(volume: &Volume) -> Value {
    object([
        ("id", Value::from(volume.id)),
        ("label", Value::from(&volume.label)),
        ("region", Value::from(&volume.region)),
        ("size", Value::from(volume.size)),
        ("status", Value::from(&volume.status)),
        ("linode_id", Value::from(volume.linode_id)),
        ("filesystem_path", Value::from(&volume.filesystem_path)),
        ("encryption", Value::from(volume.encryption.as_ref())),
        ("tags", Value::from(volume.tags.clone())),
        ("created", Value::from(&volume.created)),
        ("updated", Value::from(volume.updated.as_ref())),
    ])
}

fn results() -> BlockSchema {
    results_block(
        "volumes",
        vec![
            ("id", AttributeType::Int),
            ("label", AttributeType::String),
            ("region", AttributeType::String),
            ("size", AttributeType::Int),
            ("status", AttributeType::String),
            ("linode_id", AttributeType::Int),
            ("filesystem_path", AttributeType::String),
            ("encryption", AttributeType::String),
            ("tags", string_set()),
            ("created", AttributeType::String),
            ("updated", AttributeType::String),
        ],
    )
}

pub fn data_source(api: SharedApi) -> FilteredDataSource<Volume> {
    FilteredDataSource::new("linode_volumes", api, filter_config(), list, flatten, results())
        .with_description("Lists Block Storage volumes on the account.")
}
