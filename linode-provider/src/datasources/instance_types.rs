//! linode_instance_types - Linode plans

use linode_core::provider::BoxFuture;
use linode_core::resource::Value;
use linode_core::schema::{AttributeType, BlockNesting, BlockSchema};
use linode_filter::{FieldValue, FilterConfig, FilterType, ListResult};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use super::{nested_block, object, results_block};
use crate::client::{SharedApi, list_entities};
use crate::datasource::FilteredDataSource;

const ENDPOINT: &str = "linode/types";

#[derive(Debug, Clone, Deserialize)]
pub struct InstanceType {
    pub id: String,
    pub label: String,
    pub class: String,
    pub disk: i64,
    pub memory: i64,
    pub vcpus: i64,
    #[serde(default)]
    pub gpus: i64,
    #[serde(default)]
    pub network_out: i64,
    #[serde(default)]
    pub transfer: i64,
    #[serde(default)]
    pub successor: Option<String>,
    #[serde(default)]
    pub price: Price,
    #[serde(default)]
    pub addons: Addons,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Price {
    #[serde(default)]
    pub hourly: f64,
    #[serde(default)]
    pub monthly: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Addons {
    #[serde(default)]
    pub backups: BackupsAddon,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackupsAddon {
    #[serde(default)]
    pub price: Price,
}

pub fn filter_config() -> FilterConfig<InstanceType> {
    FilterConfig::<InstanceType>::new()
        .api("class", FilterType::String, |t| FieldValue::from(&t.class))
        .api("disk", FilterType::Int, |t| FieldValue::from(t.disk))
        .api("gpus", FilterType::Int, |t| FieldValue::from(t.gpus))
        .api("label", FilterType::String, |t| FieldValue::from(&t.label))
        .api("memory", FilterType::Int, |t| FieldValue::from(t.memory))
        .api("network_out", FilterType::Int, |t| FieldValue::from(t.network_out))
        .api("transfer", FilterType::Int, |t| FieldValue::from(t.transfer))
        .api("vcpus", FilterType::Int, |t| FieldValue::from(t.vcpus))
        .local("id", FilterType::String, |t| FieldValue::from(&t.id))
        .local("successor", FilterType::String, |t| FieldValue::from(t.successor.as_ref()))
}

fn list<'a>(
    cancel: &'a CancellationToken,
    api: &'a SharedApi,
    filter: &'a str,
) -> BoxFuture<'a, ListResult<InstanceType>> {
    Box::pin(list_entities(api, ENDPOINT, filter, cancel))
}

fn flatten_price(price: &Price) -> Value {
    object([
        ("hourly", Value::from(price.hourly)),
        ("monthly", Value::from(price.monthly)),
    ])
}

fn flatten(t: &InstanceType) -> Value {
    object([
        ("id", Value::from(&t.id)),
        ("label", Value::from(&t.label)),
        ("class", Value::from(&t.class)),
        ("disk", Value::from(t.disk)),
        ("memory", Value::from(t.memory)),
        ("vcpus", Value::from(t.vcpus)),
        ("gpus", Value::from(t.gpus)),
        ("network_out", Value::from(t.network_out)),
        ("transfer", Value::from(t.transfer)),
        ("successor", Value::from(t.successor.as_ref())),
        ("price", Value::List(vec![flatten_price(&t.price)])),
        (
            "addons",
            Value::List(vec![object([(
                "backups",
                Value::List(vec![object([(
                    "price",
                    Value::List(vec![flatten_price(&t.addons.backups.price)]),
                )])]),
            )])]),
        ),
    ])
}

fn price_block() -> BlockSchema {
    nested_block(
        "price",
        BlockNesting::List,
        vec![("hourly", AttributeType::Float), ("monthly", AttributeType::Float)],
    )
}

fn results() -> BlockSchema {
    results_block(
        "types",
        vec![
            ("id", AttributeType::String),
            ("label", AttributeType::String),
            ("class", AttributeType::String),
            ("disk", AttributeType::Int),
            ("memory", AttributeType::Int),
            ("vcpus", AttributeType::Int),
            ("gpus", AttributeType::Int),
            ("network_out", AttributeType::Int),
            ("transfer", AttributeType::Int),
            ("successor", AttributeType::String),
        ],
    )
    .block(price_block())
    .block(
        nested_block("addons", BlockNesting::List, Vec::new()).block(
            nested_block("backups", BlockNesting::List, Vec::new()).block(price_block()),
        ),
    )
}

pub fn data_source(api: SharedApi) -> FilteredDataSource<InstanceType> {
    FilteredDataSource::new("linode_instance_types", api, filter_config(), list, flatten, results())
        .with_description("Lists the Linode plans available for deployment.")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::datasources::testing::{api, column, filter, query, read, sent_filter, strings};

    fn types() -> Vec<serde_json::Value> {
        vec![
            json!({
                "id": "g6-nanode-1", "label": "Nanode 1GB", "class": "nanode", "disk": 25600,
                "memory": 1024, "vcpus": 1, "network_out": 1000, "transfer": 1000,
                "price": { "hourly": 0.0075, "monthly": 5.0 },
                "addons": { "backups": { "price": { "hourly": 0.003, "monthly": 2.0 } } }
            }),
            json!({
                "id": "g6-standard-2", "label": "Linode 4GB", "class": "standard", "disk": 81920,
                "memory": 4096, "vcpus": 2, "network_out": 4000, "transfer": 4000,
                "price": { "hourly": 0.036, "monthly": 24.0 }
            }),
            json!({
                "id": "g6-dedicated-2", "label": "Dedicated 4GB", "class": "dedicated", "disk": 81920,
                "memory": 4096, "vcpus": 2, "network_out": 4000, "transfer": 4000,
                "successor": "g7-dedicated-2",
                "price": { "hourly": 0.054, "monthly": 36.0 }
            }),
        ]
    }

    #[tokio::test]
    async fn int_filters_are_sent_as_strings() {
        let memory = api(ENDPOINT, types());
        let ds = data_source(memory.clone());
        let mut config = query(vec![
            filter("vcpus", &["2"], None),
            filter("class", &["standard", "dedicated"], None),
        ]);
        config.insert("order_by".to_string(), Value::from("class"));
        config.insert("order".to_string(), Value::from("asc"));

        let state = read(&ds, &config).await.unwrap();

        let sent = sent_filter(&memory);
        assert!(sent.contains(r#"{"+or":[{"vcpus":"2"}]}"#));
        assert!(sent.ends_with(r#""+order":"asc","+order_by":"class"}"#));
        assert_eq!(
            strings(&state, "types", "id"),
            vec!["g6-dedicated-2", "g6-standard-2"]
        );
    }

    #[tokio::test]
    async fn nested_prices_are_flattened() {
        let ds = data_source(api(ENDPOINT, types()));
        let state = read(&ds, &query(vec![filter("id", &["nanode"], Some("substring"))]))
            .await
            .unwrap();

        let price = column(&state, "types", "price")[0].as_list().unwrap()[0]
            .as_map()
            .unwrap()
            .clone();
        assert_eq!(price["monthly"], Value::Float(5.0));

        let addons = column(&state, "types", "addons")[0].as_list().unwrap()[0]
            .as_map()
            .unwrap()
            .clone();
        let backups = addons["backups"].as_list().unwrap()[0].as_map().unwrap();
        let backup_price = backups["price"].as_list().unwrap()[0].as_map().unwrap();
        assert_eq!(backup_price["hourly"], Value::Float(0.003));
    }

    #[tokio::test]
    async fn missing_successor_matches_empty_string() {
        let ds = data_source(api(ENDPOINT, types()));
        let state = read(&ds, &query(vec![filter("successor", &[""], None)]))
            .await
            .unwrap();
        assert_eq!(
            strings(&state, "types", "id"),
            vec!["g6-nanode-1", "g6-standard-2"]
        );
    }
}
