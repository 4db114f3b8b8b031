//! X-Filter query builder
//!
//! Exact-match entries on api-filterable fields are pushed to the vendor as
//! a JSON document of the form
//! `{"+and":[{"+or":[{"field":"value"},...]},...],"+order":"desc","+order_by":"field"}`.
//! Everything else is left to the local pass.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::{FilterConfig, unknown_field_message};
use crate::error::FilterError;
use crate::model::{FilterModel, Order};

#[derive(Debug, Serialize)]
struct ApiFilter<'a> {
    #[serde(rename = "+and")]
    and: Vec<OrClause<'a>>,
    #[serde(rename = "+order")]
    order: Order,
    #[serde(rename = "+order_by", skip_serializing_if = "Option::is_none")]
    order_by: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct OrClause<'a> {
    #[serde(rename = "+or")]
    or: Vec<BTreeMap<&'a str, &'a str>>,
}

impl<T> FilterConfig<T> {
    /// Build the `X-Filter` header value for a filter set.
    ///
    /// Clauses follow the order of the entries and values follow the order
    /// of each entry's values, so identical inputs give identical bytes.
    pub fn construct_filter_string(
        &self,
        filters: &[FilterModel],
        order: Option<Order>,
        order_by: Option<&str>,
    ) -> Result<String, FilterError> {
        let mut and = Vec::new();
        for filter in filters {
            if !self.contains(&filter.name) {
                return Err(FilterError::configuration(unknown_field_message(
                    &filter.name,
                    &self.names(),
                )));
            }
            if !self.is_api_entry(filter) {
                continue;
            }
            let or = filter
                .values
                .iter()
                .map(|value| BTreeMap::from([(filter.name.as_str(), value.as_str())]))
                .collect();
            and.push(OrClause { or });
        }

        let document = ApiFilter {
            and,
            order: order.unwrap_or_default(),
            order_by,
        };
        Ok(serde_json::to_string(&document)?)
    }
}
