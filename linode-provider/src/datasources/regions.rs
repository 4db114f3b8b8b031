//! linode_regions - Data center regions

use linode_core::provider::BoxFuture;
use linode_core::resource::Value;
use linode_core::schema::{AttributeType, BlockNesting, BlockSchema};
use linode_filter::{FieldValue, FilterConfig, FilterType, ListResult};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use super::{nested_block, object, results_block, string_set};
use crate::client::{SharedApi, list_entities};
use crate::datasource::FilteredDataSource;

const ENDPOINT: &str = "regions";

#[derive(Debug, Clone, Deserialize)]
pub struct Region {
    pub id: String,
    pub label: String,
    pub country: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    pub status: String,
    #[serde(default)]
    pub site_type: String,
    #[serde(default)]
    pub resolvers: Resolvers,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Resolvers {
    #[serde(default)]
    pub ipv4: String,
    #[serde(default)]
    pub ipv6: String,
}

pub fn filter_config() -> FilterConfig<Region> {
    FilterConfig::<Region>::new()
        .api("country", FilterType::String, |r| FieldValue::from(&r.country))
        .api("site_type", FilterType::String, |r| FieldValue::from(&r.site_type))
        .api("status", FilterType::String, |r| FieldValue::from(&r.status))
        .local("capabilities", FilterType::String, |r| FieldValue::list(&r.capabilities))
        .local("id", FilterType::String, |r| FieldValue::from(&r.id))
        .local("label", FilterType::String, |r| FieldValue::from(&r.label))
}

fn list<'a>(
    cancel: &'a CancellationToken,
    api: &'a SharedApi,
    filter: &'a str,
) -> BoxFuture<'a, ListResult<Region>> {
    Box::pin(list_entities(api, ENDPOINT, filter, cancel))
}

fn flatten(region: &Region) -> Value {
    object([
        ("id", Value::from(&region.id)),
        ("label", Value::from(&region.label)),
        ("country", Value::from(&region.country)),
        ("capabilities", Value::from(region.capabilities.clone())),
        ("status", Value::from(&region.status)),
        ("site_type", Value::from(&region.site_type)),
        (
            "resolvers",
            Value::List(vec![object([
                ("ipv4", Value::from(&region.resolvers.ipv4)),
                ("ipv6", Value::from(&region.resolvers.ipv6)),
            ])]),
        ),
    ])
}

fn results() -> BlockSchema {
    results_block(
        "regions",
        vec![
            ("id", AttributeType::String),
            ("label", AttributeType::String),
            ("country", AttributeType::String),
            ("capabilities", string_set()),
            ("status", AttributeType::String),
            ("site_type", AttributeType::String),
        ],
    )
    .block(nested_block(
        "resolvers",
        BlockNesting::List,
        vec![("ipv4", AttributeType::String), ("ipv6", AttributeType::String)],
    ))
}

pub fn data_source(api: SharedApi) -> FilteredDataSource<Region> {
    FilteredDataSource::new("linode_regions", api, filter_config(), list, flatten, results())
        .with_description("Lists the regions Linode services are available in.")
}
