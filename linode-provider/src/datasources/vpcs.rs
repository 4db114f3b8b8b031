//! linode_vpcs - Virtual Private Clouds

use linode_core::provider::BoxFuture;
use linode_core::resource::Value;
use linode_core::schema::{AttributeType, BlockSchema};
use linode_filter::{FieldValue, FilterConfig, FilterType, ListResult};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use super::{object, results_block};
use crate::client::{SharedApi, list_entities};
use crate::datasource::FilteredDataSource;

const ENDPOINT: &str = "vpcs";

#[derive(Debug, Clone, Deserialize)]
pub struct Vpc {
    pub id: i64,
    pub label: String,
    #[serde(default)]
    pub description: String,
    pub region: String,
    pub created: String,
    #[serde(default)]
    pub updated: Option<String>,
}

pub fn filter_config() -> FilterConfig<Vpc> {
    FilterConfig::<Vpc>::new()
        .api("id", FilterType::Int, |v| FieldValue::from(v.id))
        .api("label", FilterType::String, |v| FieldValue::from(&v.label))
        .api("description", FilterType::String, |v| FieldValue::from(&v.description))
        .api("region", FilterType::String, |v| FieldValue::from(&v.region))
        .local("created", FilterType::String, |v| FieldValue::from(&v.created))
        .local("updated", FilterType::String, |v| FieldValue::from(v.updated.as_ref()))
}

fn list<'a>(
    cancel: &'a CancellationToken,
    api: &'a SharedApi,
    filter: &'a str,
) -> BoxFuture<'a, ListResult<Vpc>> {
    Box::pin(list_entities(api, ENDPOINT, filter, cancel))
}

fn flatten(vpc: &Vpc) -> Value {
    object([
        ("id", Value::from(vpc.id)),
        ("label", Value::from(&vpc.label)),
        ("description", Value::from(&vpc.description)),
        ("region", Value::from(&vpc.region)),
        ("created", Value::from(&vpc.created)),
        ("updated", Value::from(vpc.updated.as_ref())),
    ])
}

fn results() -> BlockSchema {
    results_block(
        "vpcs",
        vec![
            ("id", AttributeType::Int),
            ("label", AttributeType::String),
            ("description", AttributeType::String),
            ("region", AttributeType::String),
            ("created", AttributeType::String),
            ("updated", AttributeType::String),
        ],
    )
}

pub fn data_source(api: SharedApi) -> FilteredDataSource<Vpc> {
    FilteredDataSource::new("linode_vpcs", api, filter_config(), list, flatten, results())
        .with_description("Lists the VPCs on the account.")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::datasources::testing::{filter, query, read, strings};
    use crate::memory::InMemoryApi;

    fn vpcs(n: usize) -> Vec<serde_json::Value> {
        (0..n)
            .map(|i| {
                json!({
                    "id": i,
                    "label": format!("vpc-{:03}", i),
                    "region": if i % 2 == 0 { "us-east" } else { "us-ord" },
                    "created": "2024-01-01T00:00:00"
                })
            })
            .collect()
    }

    #[tokio::test]
    async fn every_page_is_read_and_filtered() {
        let memory = Arc::new(
            InMemoryApi::new()
                .with_endpoint(ENDPOINT, vpcs(60))
                .with_page_size(25),
        );
        let ds = data_source(memory.clone());
        let config = query(vec![filter("label", &["vpc-0[0-4]"], Some("regex"))]);

        let state = read(&ds, &config).await.unwrap();

        assert_eq!(memory.requests().len(), 3);
        // vendor order is kept
        assert_eq!(strings(&state, "vpcs", "label")[..3], ["vpc-000", "vpc-001", "vpc-002"]);
        assert_eq!(strings(&state, "vpcs", "label").len(), 50);
    }

    #[tokio::test]
    async fn values_are_a_set() {
        let memory = Arc::new(InMemoryApi::new().with_endpoint(ENDPOINT, vpcs(4)));
        let ds = data_source(memory.clone());
        let state = read(&ds, &query(vec![filter("region", &["us-ord", "us-ord"], None)]))
            .await
            .unwrap();

        assert_eq!(
            memory.requests()[0].1.filter.as_deref(),
            Some(r#"{"+and":[{"+or":[{"region":"us-ord"}]}],"+order":"desc"}"#)
        );
        assert_eq!(strings(&state, "vpcs", "label"), vec!["vpc-001", "vpc-003"]);
    }
}
