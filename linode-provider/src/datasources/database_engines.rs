//! linode_database_engines - Managed database engine versions

use linode_core::provider::BoxFuture;
use linode_core::resource::Value;
use linode_core::schema::{AttributeType, BlockSchema};
use linode_filter::{FieldValue, FilterConfig, FilterType, LatestKey, ListResult};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use super::{object, results_block};
use crate::client::{SharedApi, list_entities};
use crate::datasource::FilteredDataSource;

const ENDPOINT: &str = "databases/engines";

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseEngine {
    pub id: String,
    pub engine: String,
    pub version: String,
}

pub fn filter_config() -> FilterConfig<DatabaseEngine> {
    FilterConfig::<DatabaseEngine>::new()
        .api("engine", FilterType::String, |e| FieldValue::from(&e.engine))
        .api("version", FilterType::String, |e| FieldValue::from(&e.version))
        .local("id", FilterType::String, |e| FieldValue::from(&e.id))
}

fn list<'a>(
    cancel: &'a CancellationToken,
    api: &'a SharedApi,
    filter: &'a str,
) -> BoxFuture<'a, ListResult<DatabaseEngine>> {
    Box::pin(list_entities(api, ENDPOINT, filter, cancel))
}

fn flatten(engine: &DatabaseEngine) -> Value {
    object([
        ("id", Value::from(&engine.id)),
        ("engine", Value::from(&engine.engine)),
        ("version", Value::from(&engine.version)),
    ])
}

fn results() -> BlockSchema {
    results_block(
        "engines",
        vec![
            ("id", AttributeType::String),
            ("engine", AttributeType::String),
            ("version", AttributeType::String),
        ],
    )
}

pub fn data_source(api: SharedApi) -> FilteredDataSource<DatabaseEngine> {
    FilteredDataSource::new("linode_database_engines", api, filter_config(), list, flatten, results())
        .with_description("Lists the engines and versions available for Managed Databases.")
        .with_latest(LatestKey::<DatabaseEngine>::version("version", |e| FieldValue::from(&e.version)))
}

#[cfg(test)]
mod tests {
    use linode_core::provider::DataSource;
    use serde_json::json;

    use super::*;
    use crate::datasources::testing::{api, filter, query, read, sent_filter, strings};

    fn engines() -> Vec<serde_json::Value> {
        vec![
            json!({ "id": "mysql/8", "engine": "mysql", "version": "8" }),
            json!({ "id": "postgresql/13", "engine": "postgresql", "version": "13" }),
            json!({ "id": "redis/7", "engine": "redis", "version": "7" }),
        ]
    }

    #[tokio::test]
    async fn exact_engine_filter_is_pushed_to_the_api() {
        let memory = api(ENDPOINT, engines());
        let ds = data_source(memory.clone());
        let mut config = query(vec![filter("engine", &["mysql", "postgresql"], Some("exact"))]);
        config.insert("order".to_string(), Value::from("asc"));
        config.insert("order_by".to_string(), Value::from("engine"));

        let state = read(&ds, &config).await.unwrap();

        assert_eq!(
            sent_filter(&memory),
            r#"{"+and":[{"+or":[{"engine":"mysql"},{"engine":"postgresql"}]}],"+order":"asc","+order_by":"engine"}"#
        );
        assert_eq!(strings(&state, "engines", "engine"), vec!["mysql", "postgresql"]);
        assert_eq!(strings(&state, "engines", "version"), vec!["8", "13"]);
    }

    #[tokio::test]
    async fn latest_picks_the_highest_version() {
        let memory = api(
            ENDPOINT,
            vec![
                json!({ "id": "mysql/1.2.3", "engine": "mysql", "version": "1.2.3" }),
                json!({ "id": "mysql/1.3.1", "engine": "mysql", "version": "1.3.1" }),
                json!({ "id": "mysql/1.2.10", "engine": "mysql", "version": "1.2.10" }),
            ],
        );
        let ds = data_source(memory);
        let mut config = query(vec![filter("engine", &["mysql"], None)]);
        config.insert("latest".to_string(), Value::Bool(true));

        let state = read(&ds, &config).await.unwrap();
        assert_eq!(strings(&state, "engines", "version"), vec!["1.3.1"]);
    }

    #[tokio::test]
    async fn unparsable_version_fails_latest_selection() {
        let memory = api(
            ENDPOINT,
            vec![json!({ "id": "mysql/x", "engine": "mysql", "version": "eight" })],
        );
        let ds = data_source(memory);
        let config = std::collections::HashMap::from([("latest".to_string(), Value::Bool(true))]);

        let diags = read(&ds, &config).await.unwrap_err();
        assert!(diags.has_error());
        assert!(diags.to_string().contains("eight"));
    }

    #[tokio::test]
    async fn local_id_regex() {
        let ds = data_source(api(ENDPOINT, engines()));
        let config = query(vec![filter("id", &["^(mysql|redis)/"], Some("re"))]);

        let state = read(&ds, &config).await.unwrap();
        assert_eq!(strings(&state, "engines", "id"), vec!["mysql/8", "redis/7"]);
    }

    #[test]
    fn schema_exposes_latest() {
        let schema = data_source(api(ENDPOINT, Vec::new())).schema();
        assert!(schema.attributes.contains_key("latest"));
        assert!(schema.blocks.contains_key("engines"));
    }
}
