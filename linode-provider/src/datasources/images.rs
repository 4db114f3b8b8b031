//! linode_images - Public and private disk images

use linode_core::provider::BoxFuture;
use linode_core::resource::Value;
use linode_core::schema::{AttributeType, BlockSchema};
use linode_filter::{FieldValue, FilterConfig, FilterType, LatestKey, ListResult};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use super::{object, results_block, string_list};
use crate::client::{SharedApi, list_entities};
use crate::datasource::FilteredDataSource;

const ENDPOINT: &str = "images";

#[derive(Debug, Clone, Deserialize)]
pub struct Image {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created: String,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub status: String,
    #[serde(rename = "type", default)]
    pub image_type: String,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub expiry: Option<String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

pub fn filter_config() -> FilterConfig<Image> {
    FilterConfig::<Image>::new()
        .api("deprecated", FilterType::Bool, |i| FieldValue::from(i.deprecated))
        .api("is_public", FilterType::Bool, |i| FieldValue::from(i.is_public))
        .api("label", FilterType::String, |i| FieldValue::from(&i.label))
        .api("size", FilterType::Int, |i| FieldValue::from(i.size))
        .api("vendor", FilterType::String, |i| FieldValue::from(i.vendor.as_ref()))
        .local("capabilities", FilterType::String, |i| FieldValue::list(&i.capabilities))
        .local("created", FilterType::String, |i| FieldValue::from(&i.created))
        .local("created_by", FilterType::String, |i| FieldValue::from(i.created_by.as_ref()))
        .local("description", FilterType::String, |i| FieldValue::from(i.description.as_ref()))
        .local("id", FilterType::String, |i| FieldValue::from(&i.id))
        .local("status", FilterType::String, |i| FieldValue::from(&i.status))
        .local("tags", FilterType::String, |i| FieldValue::list(&i.tags))
        .local("type", FilterType::String, |i| FieldValue::from(&i.image_type))
}

fn list<'a>(
    cancel: &'a CancellationToken,
    api: &'a SharedApi,
    filter: &'a str,
) -> BoxFuture<'a, ListResult<Image>> {
    Box::pin(list_entities(api, ENDPOINT, filter, cancel))
}

fn flatten(image: &Image) -> Value {
    object([
        ("id", Value::from(&image.id)),
        ("label", Value::from(&image.label)),
        ("description", Value::from(image.description.as_ref())),
        ("created", Value::from(&image.created)),
        ("created_by", Value::from(image.created_by.as_ref())),
        ("deprecated", Value::from(image.deprecated)),
        ("is_public", Value::from(image.is_public)),
        ("size", Value::from(image.size)),
        ("status", Value::from(&image.status)),
        ("type", Value::from(&image.image_type)),
        ("vendor", Value::from(image.vendor.as_ref())),
        ("expiry", Value::from(image.expiry.as_ref())),
        ("capabilities", Value::from(image.capabilities.clone())),
        ("tags", Value::from(image.tags.clone())),
    ])
}

fn results() -> BlockSchema {
    results_block(
        "images",
        vec![
            ("id", AttributeType::String),
            ("label", AttributeType::String),
            ("description", AttributeType::String),
            ("created", AttributeType::String),
            ("created_by", AttributeType::String),
            ("deprecated", AttributeType::Bool),
            ("is_public", AttributeType::Bool),
            ("size", AttributeType::Int),
            ("status", AttributeType::String),
            ("type", AttributeType::String),
            ("vendor", AttributeType::String),
            ("expiry", AttributeType::String),
            ("capabilities", string_list()),
            ("tags", string_list()),
        ],
    )
}

pub fn data_source(api: SharedApi) -> FilteredDataSource<Image> {
    FilteredDataSource::new("linode_images", api, filter_config(), list, flatten, results())
        .with_description("Lists the images available to the account.")
        .with_latest(LatestKey::<Image>::timestamp("created", |i| FieldValue::from(&i.created)))
}
