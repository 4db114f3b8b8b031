//! Filter configuration - Which fields a data source can filter on
//!
//! One [`FilterConfig`] is built per data source when it is constructed and
//! is read-only afterwards. It drives schema generation, plan-time
//! validation, the `X-Filter` query, the local pass and the identifier.

use std::collections::BTreeMap;
use std::fmt;

use linode_core::resource::Value;
use linode_core::schema::{AttributeSchema, AttributeType, BlockNesting, BlockSchema, validators};

use crate::error::FilterError;
use crate::field::{Accessor, FieldValue};
use crate::model::{FilterModel, MatchBy};
use crate::validate;

/// Declared type of a filterable field, used to check user-supplied values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    String,
    Int,
    Bool,
    Float,
}

impl FilterType {
    /// Check that a user-supplied string parses as this type
    pub fn check(&self, value: &str) -> Result<(), String> {
        let ok = match self {
            FilterType::String => true,
            FilterType::Int => value.parse::<i64>().is_ok(),
            FilterType::Bool => value == "true" || value == "false",
            FilterType::Float => value.parse::<f64>().is_ok(),
        };
        if ok {
            Ok(())
        } else {
            Err(format!("\"{}\" is not a valid {} value", value, self))
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterType::String => write!(f, "string"),
            FilterType::Int => write!(f, "int"),
            FilterType::Bool => write!(f, "bool"),
            FilterType::Float => write!(f, "float"),
        }
    }
}

/// A filterable field of entity type `T`
pub struct FilterAttribute<T> {
    /// The vendor API can filter and order on this field server-side
    pub api_filterable: bool,
    pub filter_type: FilterType,
    pub accessor: Accessor<T>,
}

impl<T> Clone for FilterAttribute<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for FilterAttribute<T> {}

impl<T> fmt::Debug for FilterAttribute<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterAttribute")
            .field("api_filterable", &self.api_filterable)
            .field("filter_type", &self.filter_type)
            .finish()
    }
}

/// Filterable fields of one data source, keyed by their external name
pub struct FilterConfig<T> {
    fields: BTreeMap<&'static str, FilterAttribute<T>>,
}

impl<T> Default for FilterConfig<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for FilterConfig<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.fields.iter()).finish()
    }
}

impl<T> FilterConfig<T> {
    pub fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }

    /// Register a field the vendor API can filter and order on
    pub fn api(self, name: &'static str, filter_type: FilterType, accessor: Accessor<T>) -> Self {
        self.field(
            name,
            FilterAttribute {
                api_filterable: true,
                filter_type,
                accessor,
            },
        )
    }

    /// Register a field that is only filtered client-side
    pub fn local(self, name: &'static str, filter_type: FilterType, accessor: Accessor<T>) -> Self {
        self.field(
            name,
            FilterAttribute {
                api_filterable: false,
                filter_type,
                accessor,
            },
        )
    }

    /// Register a field. The first registration of a name wins.
    pub fn field(mut self, name: &'static str, attribute: FilterAttribute<T>) -> Self {
        self.fields.entry(name).or_insert(attribute);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FilterAttribute<T>> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn is_api_filterable(&self, name: &str) -> bool {
        self.get(name).is_some_and(|a| a.api_filterable)
    }

    /// All filterable names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        self.fields.keys().copied().collect()
    }

    /// Names usable server-side and for `order_by`, sorted
    pub fn api_filterable_names(&self) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|(_, a)| a.api_filterable)
            .map(|(name, _)| *name)
            .collect()
    }

    pub(crate) fn types(&self) -> BTreeMap<String, FilterType> {
        self.fields
            .iter()
            .map(|(name, a)| (name.to_string(), a.filter_type))
            .collect()
    }

    /// Read the named field of an entity
    pub fn resolve(&self, entity: &T, name: &str) -> Result<FieldValue, FilterError> {
        let attribute = self
            .get(name)
            .ok_or_else(|| FilterError::configuration(unknown_field_message(name, &self.names())))?;
        Ok((attribute.accessor)(entity))
    }

    /// Whether an entry is sent to the vendor instead of evaluated locally
    pub fn is_api_entry(&self, filter: &FilterModel) -> bool {
        filter.match_by == MatchBy::Exact && self.is_api_filterable(&filter.name)
    }

    /// Reject unknown filter names and an `order_by` that is not
    /// api-filterable. Runs again at read time, independent of the host's
    /// plan-time validation.
    pub fn check_query(
        &self,
        filters: &[FilterModel],
        order_by: Option<&str>,
    ) -> Result<(), FilterError> {
        for filter in filters {
            if !self.contains(&filter.name) {
                return Err(FilterError::configuration(unknown_field_message(
                    &filter.name,
                    &self.names(),
                )));
            }
        }
        if let Some(order_by) = order_by
            && !self.is_api_filterable(order_by)
        {
            return Err(FilterError::configuration(order_by_message(
                order_by,
                &self.api_filterable_names(),
            )));
        }
        Ok(())
    }

    /// `filter` block descriptor with its validators
    pub fn schema(&self) -> BlockSchema {
        BlockSchema::new("filter", BlockNesting::Set)
            .with_description(
                "Entries are combined with AND; the values of one entry are combined with OR.",
            )
            .attribute(
                AttributeSchema::new("name", AttributeType::String)
                    .required()
                    .with_description("The name of the field to filter by.")
                    .with_validator(validate::name_validator(self)),
            )
            .attribute(
                AttributeSchema::new("values", AttributeType::Set(Box::new(AttributeType::String)))
                    .required()
                    .with_description("The value(s) to be used in the filter.")
                    .with_validator(validators::non_empty_list()),
            )
            .attribute(
                AttributeSchema::new("match_by", AttributeType::String)
                    .with_default(Value::from(MatchBy::Exact.as_str()))
                    .with_description("The type of comparison to use: exact, substring or regex.")
                    .with_validator(validate::match_by_validator()),
            )
            .with_validator(validate::values_validator(self))
    }

    pub fn order_schema(&self) -> AttributeSchema {
        AttributeSchema::new("order", AttributeType::String)
            .with_default(Value::from("desc"))
            .with_description("The order in which results should be returned: asc or desc.")
            .with_validator(validate::order_validator())
    }

    pub fn order_by_schema(&self) -> AttributeSchema {
        AttributeSchema::new("order_by", AttributeType::String)
            .with_description("The attribute to order the results by.")
            .with_validator(validate::order_by_validator(self))
    }

    pub fn latest_schema(&self) -> AttributeSchema {
        AttributeSchema::new("latest", AttributeType::Bool)
            .with_default(Value::Bool(false))
            .with_description("If true, only the most recent element is returned.")
    }

    pub fn id_schema(&self) -> AttributeSchema {
        AttributeSchema::new("id", AttributeType::String)
            .computed()
            .with_description("Deterministic digest of the filter set.")
    }
}

pub(crate) fn unknown_field_message(name: &str, valid: &[&str]) -> String {
    format!(
        "\"{}\" is not a filterable field. Valid filters: {}",
        name,
        valid.join(", ")
    )
}

pub(crate) fn order_by_message(name: &str, valid: &[&str]) -> String {
    format!(
        "\"{}\" is an unsupported order_by field. Valid fields: {}",
        name,
        valid.join(", ")
    )
}
