//! Generic filtered-list data source
//!
//! Every list-style data source is a [`FilteredDataSource`] over its entity
//! type. Only the field table, the list callback, the flattener and the
//! result block differ between them.

use std::collections::HashMap;

use linode_core::diagnostics::Diagnostics;
use linode_core::provider::{BoxFuture, DataSource};
use linode_core::resource::{ResourceId, State, Value};
use linode_core::schema::{BlockSchema, ResourceSchema};
use linode_filter::{FilterConfig, FilterQuery, LatestKey, ListFn};
use log::info;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::client::SharedApi;

/// Converts an entity into the host value stored in the result block
pub type Flatten<T> = fn(&T) -> Value;

/// What a read would send and evaluate, without calling the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryPlan {
    pub id: String,
    /// `X-Filter` header value
    pub filter: String,
    /// Names of the entries evaluated client-side
    pub local_filters: Vec<String>,
    pub latest: bool,
}

/// A data source backed by the filter engine
pub trait ListDataSource: DataSource {
    /// Compute the identifier and queries of a read without listing
    fn plan(&self, config: &HashMap<String, Value>) -> Result<QueryPlan, Diagnostics>;

    fn as_data_source(&self) -> &dyn DataSource;
}

pub struct FilteredDataSource<T> {
    name: &'static str,
    description: Option<&'static str>,
    api: SharedApi,
    filter_config: FilterConfig<T>,
    list: ListFn<SharedApi, T>,
    flatten: Flatten<T>,
    results: BlockSchema,
    latest: Option<LatestKey<T>>,
}

impl<T> FilteredDataSource<T> {
    /// `results` names the computed block the flattened entities land in
    pub fn new(
        name: &'static str,
        api: SharedApi,
        filter_config: FilterConfig<T>,
        list: ListFn<SharedApi, T>,
        flatten: Flatten<T>,
        results: BlockSchema,
    ) -> Self {
        Self {
            name,
            description: None,
            api,
            filter_config,
            list,
            flatten,
            results: results.computed(),
            latest: None,
        }
    }

    pub fn with_description(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    /// Expose the `latest` attribute, selecting by `key`
    pub fn with_latest(mut self, key: LatestKey<T>) -> Self {
        self.latest = Some(key);
        self
    }

    pub fn filter_config(&self) -> &FilterConfig<T> {
        &self.filter_config
    }
}

impl<T: Send + 'static> FilteredDataSource<T> {
    fn checked_query(&self, config: &HashMap<String, Value>) -> Result<FilterQuery, Diagnostics> {
        let diags = self.validate(config);
        if diags.has_error() {
            return Err(diags);
        }
        let query = FilterQuery::from_attributes(config)?;
        self.filter_config
            .check_query(&query.filters, query.order_by.as_deref())?;
        Ok(query)
    }

    /// List, filter and optionally narrow to the latest entity
    pub async fn read_entities(
        &self,
        query: &FilterQuery,
        cancel: &CancellationToken,
    ) -> Result<Vec<T>, Diagnostics> {
        Ok(self
            .filter_config
            .read_query(cancel, &self.api, query, self.list, self.latest.as_ref())
            .await?)
    }
}

impl<T: Send + 'static> DataSource for FilteredDataSource<T> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn schema(&self) -> ResourceSchema {
        let mut schema = ResourceSchema::new(self.name)
            .attribute(self.filter_config.id_schema())
            .attribute(self.filter_config.order_schema())
            .attribute(self.filter_config.order_by_schema())
            .block(self.filter_config.schema())
            .block(self.results.clone());
        if self.latest.is_some() {
            schema = schema.attribute(self.filter_config.latest_schema());
        }
        if let Some(description) = self.description {
            schema = schema.with_description(description);
        }
        schema
    }

    fn read(
        &self,
        id: &ResourceId,
        config: &HashMap<String, Value>,
        cancel: &CancellationToken,
    ) -> BoxFuture<'_, Result<State, Diagnostics>> {
        let id = id.clone();
        let config = config.clone();
        let cancel = cancel.clone();
        Box::pin(async move {
            let query = self.checked_query(&config)?;
            let identifier = self.filter_config.generate_id(&query.filters)?;
            let entities = self.read_entities(&query, &cancel).await?;

            let results: Vec<Value> = entities.iter().map(self.flatten).collect();
            info!("Read {} ({}): {} result(s)", id, identifier, results.len());

            let mut attributes = config;
            attributes.insert("id".to_string(), Value::from(identifier.as_str()));
            attributes.insert(self.results.name.clone(), Value::List(results));
            Ok(State::new(id, attributes).with_identifier(identifier))
        })
    }
}

impl<T: Send + 'static> ListDataSource for FilteredDataSource<T> {
    fn plan(&self, config: &HashMap<String, Value>) -> Result<QueryPlan, Diagnostics> {
        let query = self.checked_query(config)?;
        let filter = self.filter_config.construct_filter_string(
            &query.filters,
            query.order,
            query.order_by.as_deref(),
        )?;
        let local_filters = self
            .filter_config
            .local_filters(&query.filters)
            .into_iter()
            .map(|f| f.name.clone())
            .collect();
        Ok(QueryPlan {
            id: self.filter_config.generate_id(&query.filters)?,
            filter,
            local_filters,
            latest: query.latest && self.latest.is_some(),
        })
    }

    fn as_data_source(&self) -> &dyn DataSource {
        self
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use linode_core::schema::{AttributeSchema, AttributeType, BlockNesting};
    use linode_filter::{FieldValue, FilterType};
    use serde::Deserialize;
    use serde_json::json;

    use super::*;
    use crate::client::list_entities;
    use crate::memory::InMemoryApi;

    #[derive(Debug, Deserialize)]
    struct Widget {
        id: i64,
        label: String,
        color: String,
    }

    fn list_widgets<'a>(
        cancel: &'a CancellationToken,
        api: &'a SharedApi,
        filter: &'a str,
    ) -> BoxFuture<'a, linode_filter::ListResult<Widget>> {
        Box::pin(list_entities(api, "widgets", filter, cancel))
    }

    fn flatten_widget(w: &Widget) -> Value {
        Value::Map(HashMap::from([
            ("id".to_string(), Value::Int(w.id)),
            ("label".to_string(), Value::from(&w.label)),
            ("color".to_string(), Value::from(&w.color)),
        ]))
    }

    fn widgets(api: SharedApi) -> FilteredDataSource<Widget> {
        let config = FilterConfig::new()
            .api("label", FilterType::String, |w: &Widget| FieldValue::from(&w.label))
            .api("id", FilterType::Int, |w: &Widget| FieldValue::from(w.id))
            .local("color", FilterType::String, |w: &Widget| FieldValue::from(&w.color));
        let results = BlockSchema::new("widgets", BlockNesting::List)
            .attribute(AttributeSchema::new("id", AttributeType::Int))
            .attribute(AttributeSchema::new("label", AttributeType::String))
            .attribute(AttributeSchema::new("color", AttributeType::String));
        FilteredDataSource::new("test_widgets", api, config, list_widgets, flatten_widget, results)
    }

    fn api() -> Arc<InMemoryApi> {
        Arc::new(InMemoryApi::new().with_endpoint(
            "widgets",
            vec![
                json!({ "id": 1, "label": "alpha", "color": "red" }),
                json!({ "id": 2, "label": "beta", "color": "blue" }),
                json!({ "id": 3, "label": "gamma", "color": "red" }),
            ],
        ))
    }

    fn filter(name: &str, values: &[&str], match_by: Option<&str>) -> Value {
        Value::Map(HashMap::from([
            ("name".to_string(), Value::from(name)),
            (
                "values".to_string(),
                Value::List(values.iter().map(|v| Value::from(*v)).collect()),
            ),
            ("match_by".to_string(), Value::from(match_by)),
        ]))
    }

    fn labels(state: &State) -> Vec<String> {
        state.attributes["widgets"]
            .as_list()
            .unwrap()
            .iter()
            .map(|w| w.as_map().unwrap()["label"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn read_splits_api_and_local_filters() {
        let memory = api();
        let ds = widgets(memory.clone());
        let config = HashMap::from([(
            "filter".to_string(),
            Value::List(vec![
                filter("label", &["alpha", "beta", "gamma"], None),
                filter("color", &["red"], None),
            ]),
        )]);
        let state = ds
            .read(&ResourceId::new("test_widgets", "red"), &config, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(labels(&state), vec!["alpha", "gamma"]);
        assert_eq!(state.attributes["id"].as_str(), state.identifier.as_deref());
        assert_eq!(state.attributes.get("filter"), config.get("filter"));

        let (_, options) = &memory.requests()[0];
        assert_eq!(
            options.filter.as_deref(),
            Some(r#"{"+and":[{"+or":[{"label":"alpha"},{"label":"beta"},{"label":"gamma"}]}],"+order":"desc"}"#)
        );
    }

    #[tokio::test]
    async fn validation_errors_stop_the_read() {
        let memory = api();
        let ds = widgets(memory.clone());
        let config = HashMap::from([(
            "filter".to_string(),
            Value::List(vec![filter("bogus", &["x"], None)]),
        )]);
        let diags = ds
            .read(&ResourceId::new("test_widgets", "bad"), &config, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(diags.to_string().contains("\"bogus\" is not a filterable field"));
        assert!(memory.requests().is_empty());
    }

    #[tokio::test]
    async fn list_failures_become_diagnostics() {
        let ds = widgets(Arc::new(InMemoryApi::new()));
        let diags = ds
            .read(
                &ResourceId::new("test_widgets", "x"),
                &HashMap::new(),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert_eq!(
            diags.to_string(),
            "Error: Failed to list resources: Unknown endpoint: widgets"
        );
    }

    #[tokio::test]
    async fn cancelled_read_always_reports_cancellation() {
        let memory = api();
        let ds = widgets(memory.clone());
        let cancel = CancellationToken::new();
        cancel.cancel();

        for _ in 0..200 {
            let diags = ds
                .read(&ResourceId::new("test_widgets", "x"), &HashMap::new(), &cancel)
                .await
                .unwrap_err();
            let d = diags.iter().next().unwrap();
            assert_eq!(d.summary, "Read cancelled", "got {}", diags);
        }
        assert!(memory.requests().is_empty());
    }

    #[tokio::test]
    async fn cancelled_list_entities_maps_to_cancelled() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let config = FilterConfig::<Widget>::new()
            .api("label", FilterType::String, |w| FieldValue::from(&w.label));
        let shared: SharedApi = api();

        for _ in 0..200 {
            let err = config
                .get_and_filter(&cancel, &shared, &[], list_widgets, None, None)
                .await
                .unwrap_err();
            assert!(matches!(err, linode_filter::FilterError::Cancelled), "got {:?}", err);
        }
    }

    #[test]
    fn schema_exposes_filter_surface() {
        let schema = widgets(api()).schema();
        assert!(schema.attributes.contains_key("id"));
        assert!(schema.attributes.contains_key("order"));
        assert!(schema.attributes.contains_key("order_by"));
        assert!(!schema.attributes.contains_key("latest"));
        assert!(schema.blocks.contains_key("filter"));
        assert!(schema.blocks["widgets"].computed);
    }

    #[test]
    fn plan_reports_queries_without_listing() {
        let memory = api();
        let ds = widgets(memory.clone());
        let config = HashMap::from([
            (
                "filter".to_string(),
                Value::List(vec![
                    filter("id", &["2"], None),
                    filter("label", &["^b"], Some("re")),
                ]),
            ),
            ("order_by".to_string(), Value::from("id")),
            ("order".to_string(), Value::from("asc")),
        ]);
        let plan = ds.plan(&config).unwrap();

        assert_eq!(
            plan.filter,
            r#"{"+and":[{"+or":[{"id":"2"}]}],"+order":"asc","+order_by":"id"}"#
        );
        assert_eq!(plan.local_filters, vec!["label"]);
        assert_eq!(plan.id.len(), 64);
        assert!(!plan.latest);
        assert!(memory.requests().is_empty());
    }

    #[test]
    fn plan_rejects_local_order_by() {
        let ds = widgets(api());
        let config = HashMap::from([("order_by".to_string(), Value::from("color"))]);
        let diags = ds.plan(&config).unwrap_err();
        assert!(diags.to_string().contains("\"color\" is an unsupported order_by field"));
    }
}
