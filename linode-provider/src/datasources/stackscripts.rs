//! linode_stackscripts - Deployment scripts

use linode_core::provider::BoxFuture;
use linode_core::resource::Value;
use linode_core::schema::{AttributeType, BlockNesting, BlockSchema};
use linode_filter::{FieldValue, FilterConfig, FilterType, LatestKey, ListResult};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use super::{nested_block, object, results_block, string_list};
use crate::client::{SharedApi, list_entities};
use crate::datasource::FilteredDataSource;

const ENDPOINT: &str = "linode/stackscripts";

#[derive(Debug, Clone, Deserialize)]
pub struct StackScript {
    pub id: i64,
    pub label: String,
    #[serde(default)]
    pub script: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub rev_note: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub mine: bool,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub deployments_active: i64,
    #[serde(default)]
    pub deployments_total: i64,
    #[serde(default)]
    pub user_gravatar_id: String,
    #[serde(default)]
    pub username: String,
    pub created: String,
    #[serde(default)]
    pub updated: Option<String>,
    #[serde(default)]
    pub user_defined_fields: Vec<UserDefinedField>,
}

/// Variable a StackScript asks for at deployment
#[derive(Debug, Clone, Deserialize)]
pub struct UserDefinedField {
    pub label: String,
    pub name: String,
    #[serde(default)]
    pub example: Option<String>,
    #[serde(rename = "oneOf", default)]
    pub one_of: Option<String>,
    #[serde(rename = "manyOf", default)]
    pub many_of: Option<String>,
    #[serde(default)]
    pub default: Option<String>,
}

pub fn filter_config() -> FilterConfig<StackScript> {
    FilterConfig::<StackScript>::new()
        .api("deployments_total", FilterType::Int, |s| FieldValue::from(s.deployments_total))
        .api("description", FilterType::String, |s| FieldValue::from(&s.description))
        .api("is_public", FilterType::Bool, |s| FieldValue::from(s.is_public))
        .api("label", FilterType::String, |s| FieldValue::from(&s.label))
        .local("rev_note", FilterType::String, |s| FieldValue::from(&s.rev_note))
        .local("mine", FilterType::Bool, |s| FieldValue::from(s.mine))
        .local("deployments_active", FilterType::Int, |s| FieldValue::from(s.deployments_active))
        .local("images", FilterType::String, |s| FieldValue::list(&s.images))
        .local("username", FilterType::String, |s| FieldValue::from(&s.username))
}

fn list<'a>(
    cancel: &'a CancellationToken,
    api: &'a SharedApi,
    filter: &'a str,
) -> BoxFuture<'a, ListResult<StackScript>> {
    Box::pin(list_entities(api, ENDPOINT, filter, cancel))
}

fn flatten_udf(udf: &UserDefinedField) -> Value {
    object([
        ("label", Value::from(&udf.label)),
        ("name", Value::from(&udf.name)),
        ("example", Value::from(udf.example.as_ref())),
        ("one_of", Value::from(udf.one_of.as_ref())),
        ("many_of", Value::from(udf.many_of.as_ref())),
        ("default", Value::from(udf.default.as_ref())),
    ])
}

fn flatten(script: &StackScript) -> Value {
    object([
        ("id", Value::from(script.id)),
        ("label", Value::from(&script.label)),
        ("script", Value::from(&script.script)),
        ("description", Value::from(&script.description)),
        ("rev_note", Value::from(&script.rev_note)),
        ("is_public", Value::from(script.is_public)),
        ("images", Value::from(script.images.clone())),
        ("deployments_active", Value::from(script.deployments_active)),
        ("deployments_total", Value::from(script.deployments_total)),
        ("user_gravatar_id", Value::from(&script.user_gravatar_id)),
        ("username", Value::from(&script.username)),
        ("created", Value::from(&script.created)),
        ("updated", Value::from(script.updated.as_ref())),
        (
            "user_defined_fields",
            Value::List(script.user_defined_fields.iter().map(flatten_udf).collect()),
        ),
    ])
}

fn results() -> BlockSchema {
    results_block(
        "stackscripts",
        vec![
            ("id", AttributeType::Int),
            ("label", AttributeType::String),
            ("script", AttributeType::String),
            ("description", AttributeType::String),
            ("rev_note", AttributeType::String),
            ("is_public", AttributeType::Bool),
            ("images", string_list()),
            ("deployments_active", AttributeType::Int),
            ("deployments_total", AttributeType::Int),
            ("user_gravatar_id", AttributeType::String),
            ("username", AttributeType::String),
            ("created", AttributeType::String),
            ("updated", AttributeType::String),
        ],
    )
    .block(nested_block(
        "user_defined_fields",
        BlockNesting::List,
        vec![
            ("label", AttributeType::String),
            ("name", AttributeType::String),
            ("example", AttributeType::String),
            ("one_of", AttributeType::String),
            ("many_of", AttributeType::String),
            ("default", AttributeType::String),
        ],
    ))
}

pub fn data_source(api: SharedApi) -> FilteredDataSource<StackScript> {
    FilteredDataSource::new("linode_stackscripts", api, filter_config(), list, flatten, results())
        .with_description("Lists StackScripts visible to the account.")
        .with_latest(LatestKey::<StackScript>::timestamp("created", |s| FieldValue::from(&s.created)))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::datasources::testing::{api, column, filter, query, read, sent_filter, strings};

    fn scripts() -> Vec<serde_json::Value> {
        vec![
            json!({
                "id": 10, "label": "nginx", "description": "web server", "is_public": true,
                "mine": false, "images": ["linode/debian12", "linode/ubuntu22.04"],
                "deployments_total": 120, "username": "linode", "created": "2022-01-01T00:00:00",
                "user_defined_fields": [
                    { "label": "Hostname", "name": "hostname", "example": "web01" },
                    { "label": "Size", "name": "size", "oneOf": "small,large", "default": "small" }
                ]
            }),
            json!({
                "id": 11, "label": "nginx-dev", "description": "web server", "is_public": true,
                "mine": true, "images": ["linode/alpine3.19"], "deployments_total": 3,
                "username": "me", "created": "2023-06-01T12:00:00.500"
            }),
        ]
    }

    #[tokio::test]
    async fn user_defined_fields_are_flattened() {
        let ds = data_source(api(ENDPOINT, scripts()));
        let state = read(&ds, &query(vec![filter("username", &["linode"], None)]))
            .await
            .unwrap();

        let udfs = column(&state, "stackscripts", "user_defined_fields");
        let udfs = udfs[0].as_list().unwrap();
        assert_eq!(udfs.len(), 2);
        let size = udfs[1].as_map().unwrap();
        assert_eq!(size["one_of"].as_str(), Some("small,large"));
        assert_eq!(size["many_of"], Value::Null);
    }

    #[tokio::test]
    async fn images_are_matched_element_wise() {
        let memory = api(ENDPOINT, scripts());
        let ds = data_source(memory.clone());
        let config = query(vec![
            filter("label", &["nginx"], Some("sub")),
            filter("images", &["linode/alpine3.19"], None),
        ]);

        let state = read(&ds, &config).await.unwrap();

        // substring entries stay local even on api fields
        assert_eq!(sent_filter(&memory), r#"{"+and":[],"+order":"desc"}"#);
        assert_eq!(strings(&state, "stackscripts", "label"), vec!["nginx-dev"]);
    }

    #[tokio::test]
    async fn latest_accepts_fractional_seconds() {
        let ds = data_source(api(ENDPOINT, scripts()));
        let mut config = query(vec![filter("description", &["web server"], None)]);
        config.insert("latest".to_string(), Value::Bool(true));

        let state = read(&ds, &config).await.unwrap();
        assert_eq!(column(&state, "stackscripts", "id"), vec![&Value::Int(11)]);
    }

    #[tokio::test]
    async fn bool_filter_on_local_field() {
        let ds = data_source(api(ENDPOINT, scripts()));
        let state = read(&ds, &query(vec![filter("mine", &["true"], None)]))
            .await
            .unwrap();
        assert_eq!(strings(&state, "stackscripts", "username"), vec!["me"]);
    }
}
