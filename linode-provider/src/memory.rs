//! In-memory API
//!
//! Serves list endpoints from JSON fixtures and evaluates the subset of
//! `X-Filter` the query builder emits (`+and` of `+or` clauses of exact
//! matches, `+order_by` and `+order`). Used by tests and by offline reads
//! in the CLI.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value as Json;

use crate::client::{ClientError, ClientResult, LinodeApi, ListOptions, MAX_PAGE_SIZE, Page};

pub struct InMemoryApi {
    endpoints: HashMap<String, Vec<Json>>,
    page_size: u32,
    requests: Mutex<Vec<(String, ListOptions)>>,
}

impl Default for InMemoryApi {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryApi {
    pub fn new() -> Self {
        Self {
            endpoints: HashMap::new(),
            page_size: MAX_PAGE_SIZE,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>, items: Vec<Json>) -> Self {
        self.endpoints.insert(endpoint.into(), items);
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Load endpoints from a fixture document mapping endpoint paths to
    /// arrays of objects, e.g. `{"images": [...], "linode/types": [...]}`
    pub fn from_fixture(fixture: &Json) -> ClientResult<Self> {
        let Json::Object(map) = fixture else {
            return Err(ClientError::Decode(
                "fixture must be an object mapping endpoints to arrays".to_string(),
            ));
        };
        let mut api = Self::new();
        for (endpoint, items) in map {
            let Json::Array(items) = items else {
                return Err(ClientError::Decode(format!(
                    "fixture endpoint '{}' must be an array",
                    endpoint
                )));
            };
            api = api.with_endpoint(endpoint.clone(), items.clone());
        }
        Ok(api)
    }

    /// Requests received so far, in order
    pub fn requests(&self) -> Vec<(String, ListOptions)> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn record(&self, endpoint: &str, options: &ListOptions) {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((endpoint.to_string(), options.clone()));
    }
}

#[async_trait]
impl LinodeApi for InMemoryApi {
    async fn list_page(&self, endpoint: &str, options: &ListOptions) -> ClientResult<Page> {
        self.record(endpoint, options);

        let items = self
            .endpoints
            .get(endpoint)
            .ok_or_else(|| ClientError::UnknownEndpoint(endpoint.to_string()))?;
        let items = match &options.filter {
            Some(filter) => apply_filter(items, filter)?,
            None => items.clone(),
        };

        let page_size = options.page_size.max(1) as usize;
        let results = items.len();
        let pages = results.div_ceil(page_size).max(1);
        let start = (options.page.max(1) as usize - 1) * page_size;
        let data = items.into_iter().skip(start).take(page_size).collect();

        Ok(Page {
            data,
            page: options.page,
            pages: pages as u32,
            results: results as u32,
        })
    }

    fn page_size(&self) -> u32 {
        self.page_size
    }
}

fn invalid_filter(message: impl Into<String>) -> ClientError {
    ClientError::Api {
        status: 400,
        message: format!("Invalid X-Filter: {}", message.into()),
    }
}

fn apply_filter(items: &[Json], filter: &str) -> ClientResult<Vec<Json>> {
    let document: Json = serde_json::from_str(filter).map_err(|e| invalid_filter(e.to_string()))?;
    let Json::Object(document) = document else {
        return Err(invalid_filter("not an object"));
    };

    let clauses = match document.get("+and") {
        None => Vec::new(),
        Some(Json::Array(clauses)) => clauses.clone(),
        Some(_) => return Err(invalid_filter("+and must be an array")),
    };

    let mut kept = Vec::new();
    for item in items {
        let mut all = true;
        for clause in &clauses {
            if !clause_matches(item, clause)? {
                all = false;
                break;
            }
        }
        if all {
            kept.push(item.clone());
        }
    }

    if let Some(Json::String(order_by)) = document.get("+order_by") {
        let descending = !matches!(document.get("+order"), Some(Json::String(o)) if o == "asc");
        kept.sort_by(|a, b| {
            let ord = compare_fields(a.get(order_by), b.get(order_by));
            if descending { ord.reverse() } else { ord }
        });
    }
    Ok(kept)
}

fn clause_matches(item: &Json, clause: &Json) -> ClientResult<bool> {
    match clause {
        Json::Object(map) => match map.get("+or") {
            Some(Json::Array(alternatives)) => {
                for alternative in alternatives {
                    if clause_matches(item, alternative)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Some(_) => Err(invalid_filter("+or must be an array")),
            None => Ok(map
                .iter()
                .all(|(key, expected)| field_matches(item.get(key), expected))),
        },
        _ => Err(invalid_filter("clauses must be objects")),
    }
}

fn field_matches(actual: Option<&Json>, expected: &Json) -> bool {
    match actual {
        Some(Json::Array(elements)) => elements
            .iter()
            .any(|e| scalar_string(e) == scalar_string(expected)),
        Some(value) => scalar_string(value) == scalar_string(expected),
        None => false,
    }
}

fn scalar_string(value: &Json) -> String {
    match value {
        Json::Null => String::new(),
        Json::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn compare_fields(a: Option<&Json>, b: Option<&Json>) -> Ordering {
    match (a, b) {
        (Some(Json::Number(x)), Some(Json::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(x), Some(y)) => scalar_string(x).cmp(&scalar_string(y)),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
