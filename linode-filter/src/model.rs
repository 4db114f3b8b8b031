//! Filter model - User-supplied predicates and ordering
//!
//! Decodes the `filter`, `order`, `order_by` and `latest` attributes of a
//! data source configuration into typed values.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use linode_core::diagnostics::AttributePath;
use linode_core::resource::Value;
use serde::Serialize;

use crate::error::FilterError;

/// How a filter entry compares its values with a field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchBy {
    #[default]
    Exact,
    Substring,
    Regex,
}

impl MatchBy {
    /// Accepted spellings of `match_by`, compared case-insensitively
    pub const ALLOWED: &'static [&'static str] = &["exact", "substring", "sub", "regex", "re"];

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchBy::Exact => "exact",
            MatchBy::Substring => "substring",
            MatchBy::Regex => "regex",
        }
    }
}

impl FromStr for MatchBy {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "" | "exact" => Ok(MatchBy::Exact),
            "substring" | "sub" => Ok(MatchBy::Substring),
            "regex" | "re" => Ok(MatchBy::Regex),
            _ => Err(FilterError::configuration(format!(
                "\"{}\" is not a valid match_by. Valid values: {}",
                s,
                Self::ALLOWED.join(", ")
            ))),
        }
    }
}

impl fmt::Display for MatchBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Sort direction forwarded to the vendor API
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    Asc,
    #[default]
    Desc,
}

impl Order {
    pub const ALLOWED: &'static [&'static str] = &["asc", "desc"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Order::Asc => "asc",
            Order::Desc => "desc",
        }
    }
}

impl FromStr for Order {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Order::Asc),
            "desc" => Ok(Order::Desc),
            _ => Err(FilterError::configuration(format!(
                "\"{}\" is not a valid order. Valid values: {}",
                s,
                Self::ALLOWED.join(", ")
            ))),
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One `filter` entry: the named field must match any of `values`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterModel {
    pub name: String,
    /// Disjunction of accepted values, deduplicated in first-seen order
    pub values: Vec<String>,
    pub match_by: MatchBy,
}

impl FilterModel {
    pub fn new<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut deduped: Vec<String> = Vec::new();
        for value in values {
            let value = value.into();
            if !deduped.contains(&value) {
                deduped.push(value);
            }
        }
        Self {
            name: name.into(),
            values: deduped,
            match_by: MatchBy::Exact,
        }
    }

    pub fn with_match_by(mut self, match_by: MatchBy) -> Self {
        self.match_by = match_by;
        self
    }

    /// Decode one element of the `filter` block
    pub fn from_value(value: &Value, path: &AttributePath) -> Result<Self, FilterError> {
        let Value::Map(fields) = value else {
            return Err(FilterError::configuration("filter entry must be an object").at(path.clone()));
        };

        let name = match fields.get("name") {
            Some(Value::String(name)) => name.clone(),
            _ => {
                return Err(FilterError::configuration("filter entry requires a string name")
                    .at(path.child("name")));
            }
        };

        let values_path = path.child("values");
        let raw_values = match fields.get("values") {
            Some(Value::List(items)) if !items.is_empty() => items,
            _ => {
                return Err(
                    FilterError::configuration("filter entry requires at least one value")
                        .at(values_path),
                );
            }
        };
        let mut values = Vec::with_capacity(raw_values.len());
        for (index, item) in raw_values.iter().enumerate() {
            match item {
                Value::String(s) => values.push(s.clone()),
                _ => {
                    return Err(FilterError::configuration("filter values must be strings")
                        .at(values_path.index(index)));
                }
            }
        }

        let match_by = match fields.get("match_by") {
            None | Some(Value::Null) => MatchBy::Exact,
            Some(Value::String(s)) => s
                .parse()
                .map_err(|e: FilterError| e.at(path.child("match_by")))?,
            Some(_) => {
                return Err(FilterError::configuration("match_by must be a string")
                    .at(path.child("match_by")));
            }
        };

        Ok(FilterModel::new(name, values).with_match_by(match_by))
    }
}

/// Everything a list read needs from the configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterQuery {
    pub filters: Vec<FilterModel>,
    /// Unset means the vendor default, `desc`
    pub order: Option<Order>,
    pub order_by: Option<String>,
    /// Narrow the result to its most recent element
    pub latest: bool,
}

impl FilterQuery {
    pub fn new(filters: Vec<FilterModel>) -> Self {
        Self {
            filters,
            ..Default::default()
        }
    }

    pub fn with_order(mut self, order: Order) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    pub fn with_latest(mut self, latest: bool) -> Self {
        self.latest = latest;
        self
    }

    /// Decode the filter-related attributes of a data source configuration.
    /// Attributes that are absent or null take their defaults.
    pub fn from_attributes(attributes: &HashMap<String, Value>) -> Result<Self, FilterError> {
        let filter_path = AttributePath::attribute("filter");
        let filters = match attributes.get("filter") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::List(items)) => items
                .iter()
                .enumerate()
                .map(|(i, item)| FilterModel::from_value(item, &filter_path.index(i)))
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => {
                return Err(FilterError::configuration("filter must be a list of blocks")
                    .at(filter_path));
            }
        };

        let order = match attributes.get("order") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(
                s.parse()
                    .map_err(|e: FilterError| e.at(AttributePath::attribute("order")))?,
            ),
            Some(_) => {
                return Err(FilterError::configuration("order must be a string")
                    .at(AttributePath::attribute("order")));
            }
        };

        let order_by = match attributes.get("order_by") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                return Err(FilterError::configuration("order_by must be a string")
                    .at(AttributePath::attribute("order_by")));
            }
        };

        let latest = match attributes.get("latest") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(_) => {
                return Err(FilterError::configuration("latest must be a boolean")
                    .at(AttributePath::attribute("latest")));
            }
        };

        Ok(Self {
            filters,
            order,
            order_by,
            latest,
        })
    }
}
