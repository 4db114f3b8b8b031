//! linode_firewalls - Cloud Firewalls with their rules and devices

use linode_core::provider::BoxFuture;
use linode_core::resource::Value;
use linode_core::schema::{AttributeType, BlockNesting, BlockSchema};
use linode_filter::{FieldValue, FilterConfig, FilterType, ListResult};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use super::{nested_block, object, results_block, string_list, string_set};
use crate::client::{SharedApi, list_entities};
use crate::datasource::FilteredDataSource;

const ENDPOINT: &str = "networking/firewalls";

#[derive(Debug, Clone, Deserialize)]
pub struct Firewall {
    pub id: i64,
    pub label: String,
    pub status: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub rules: RuleSet,
    #[serde(default)]
    pub entities: Vec<Device>,
    pub created: String,
    #[serde(default)]
    pub updated: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleSet {
    #[serde(default)]
    pub inbound: Vec<Rule>,
    #[serde(default)]
    pub inbound_policy: String,
    #[serde(default)]
    pub outbound: Vec<Rule>,
    #[serde(default)]
    pub outbound_policy: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Rule {
    #[serde(default)]
    pub label: Option<String>,
    pub action: String,
    pub protocol: String,
    #[serde(default)]
    pub ports: Option<String>,
    #[serde(default)]
    pub addresses: Addresses,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Addresses {
    #[serde(default)]
    pub ipv4: Vec<String>,
    #[serde(default)]
    pub ipv6: Vec<String>,
}

/// Entity the firewall is attached to
#[derive(Debug, Clone, Deserialize)]
pub struct Device {
    pub id: i64,
    #[serde(rename = "type")]
    pub device_type: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl Firewall {
    /// IDs of the Linodes the firewall is attached to
    pub fn linodes(&self) -> Vec<i64> {
        self.entities
            .iter()
            .filter(|d| d.device_type == "linode")
            .map(|d| d.id)
            .collect()
    }
}

pub fn filter_config() -> FilterConfig<Firewall> {
    FilterConfig::<Firewall>::new()
        .api("id", FilterType::Int, |f| FieldValue::from(f.id))
        .api("label", FilterType::String, |f| FieldValue::from(&f.label))
        .api("tags", FilterType::String, |f| FieldValue::list(&f.tags))
        .local("status", FilterType::String, |f| FieldValue::from(&f.status))
        .local("created", FilterType::String, |f| FieldValue::from(&f.created))
        .local("updated", FilterType::String, |f| FieldValue::from(f.updated.as_ref()))
}

fn list<'a>(
    cancel: &'a CancellationToken,
    api: &'a SharedApi,
    filter: &'a str,
) -> BoxFuture<'a, ListResult<Firewall>> {
    Box::pin(list_entities(api, ENDPOINT, filter, cancel))
}

fn flatten_rule(rule: &Rule) -> Value {
    object([
        ("label", Value::from(rule.label.as_ref())),
        ("action", Value::from(&rule.action)),
        ("protocol", Value::from(&rule.protocol)),
        ("ports", Value::from(rule.ports.as_ref())),
        ("ipv4", Value::from(rule.addresses.ipv4.clone())),
        ("ipv6", Value::from(rule.addresses.ipv6.clone())),
    ])
}

fn flatten_device(device: &Device) -> Value {
    object([
        ("entity_id", Value::from(device.id)),
        ("type", Value::from(&device.device_type)),
        ("label", Value::from(device.label.as_ref())),
        ("url", Value::from(device.url.as_ref())),
    ])
}

fn flatten(firewall: &Firewall) -> Value {
    object([
        ("id", Value::from(firewall.id)),
        ("label", Value::from(&firewall.label)),
        ("tags", Value::from(firewall.tags.clone())),
        ("disabled", Value::from(firewall.status == "disabled")),
        ("status", Value::from(&firewall.status)),
        ("inbound_policy", Value::from(&firewall.rules.inbound_policy)),
        ("outbound_policy", Value::from(&firewall.rules.outbound_policy)),
        ("linodes", Value::from(firewall.linodes())),
        ("created", Value::from(&firewall.created)),
        ("updated", Value::from(firewall.updated.as_ref())),
        (
            "inbound",
            Value::List(firewall.rules.inbound.iter().map(flatten_rule).collect()),
        ),
        (
            "outbound",
            Value::List(firewall.rules.outbound.iter().map(flatten_rule).collect()),
        ),
        (
            "devices",
            Value::List(firewall.entities.iter().map(flatten_device).collect()),
        ),
    ])
}

fn rule_block(name: &str) -> BlockSchema {
    nested_block(
        name,
        BlockNesting::List,
        vec![
            ("label", AttributeType::String),
            ("action", AttributeType::String),
            ("protocol", AttributeType::String),
            ("ports", AttributeType::String),
            ("ipv4", string_list()),
            ("ipv6", string_list()),
        ],
    )
}

fn results() -> BlockSchema {
    results_block(
        "firewalls",
        vec![
            ("id", AttributeType::Int),
            ("label", AttributeType::String),
            ("tags", string_set()),
            ("disabled", AttributeType::Bool),
            ("status", AttributeType::String),
            ("inbound_policy", AttributeType::String),
            ("outbound_policy", AttributeType::String),
            ("linodes", AttributeType::Set(Box::new(AttributeType::Int))),
            ("created", AttributeType::String),
            ("updated", AttributeType::String),
        ],
    )
    .block(rule_block("inbound"))
    .block(rule_block("outbound"))
    .block(nested_block(
        "devices",
        BlockNesting::List,
        vec![
            ("entity_id", AttributeType::Int),
            ("type", AttributeType::String),
            ("label", AttributeType::String),
            ("url", AttributeType::String),
        ],
    ))
}

pub fn data_source(api: SharedApi) -> FilteredDataSource<Firewall> {
    FilteredDataSource::new("linode_firewalls", api, filter_config(), list, flatten, results())
        .with_description("Lists Cloud Firewalls on the account.")
}
