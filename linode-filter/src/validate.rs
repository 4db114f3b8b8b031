//! Plan-time validators generated from a [`FilterConfig`]
//!
//! Each validator takes a snapshot of the field table so it can be attached
//! to a schema and outlive the config that produced it.

use std::collections::BTreeMap;

use linode_core::resource::Value;
use linode_core::schema::Validator;

use crate::config::{FilterConfig, FilterType, order_by_message, unknown_field_message};
use crate::model::{MatchBy, Order};

/// Reject filter names that are not keys of the config
pub fn name_validator<T>(config: &FilterConfig<T>) -> Validator {
    let names = config.names();
    Validator::new("name must be a filterable field", move |value| {
        match value.as_str() {
            Some(name) if !names.iter().any(|n| *n == name) => {
                Err(unknown_field_message(name, &names))
            }
            _ => Ok(()),
        }
    })
}

/// Reject `order_by` values that are not api-filterable
pub fn order_by_validator<T>(config: &FilterConfig<T>) -> Validator {
    let names = config.api_filterable_names();
    Validator::new("order_by must be an api-filterable field", move |value| {
        match value.as_str() {
            Some(name) if !names.iter().any(|n| *n == name) => {
                Err(order_by_message(name, &names))
            }
            _ => Ok(()),
        }
    })
}

/// Accept any case-insensitive spelling of a match mode
pub fn match_by_validator() -> Validator {
    Validator::new(
        format!("match_by must be one of: {}", MatchBy::ALLOWED.join(", ")),
        |value| match value.as_str() {
            Some(s) => s.parse::<MatchBy>().map(|_| ()).map_err(|e| e.to_string()),
            None => Ok(()),
        },
    )
}

pub fn order_validator() -> Validator {
    Validator::new(
        format!("order must be one of: {}", Order::ALLOWED.join(", ")),
        |value| match value.as_str() {
            Some(s) => s.parse::<Order>().map(|_| ()).map_err(|e| e.to_string()),
            None => Ok(()),
        },
    )
}

/// Check exact-match values against the declared type of their field.
///
/// Substring and regex values are patterns and are not type-checked.
pub fn values_validator<T>(config: &FilterConfig<T>) -> Validator {
    let types: BTreeMap<String, FilterType> = config.types();
    Validator::new("filter values must match the field type", move |element| {
        let Some(fields) = element.as_map() else {
            return Ok(());
        };
        let Some(name) = fields.get("name").and_then(Value::as_str) else {
            return Ok(());
        };
        let Some(filter_type) = types.get(name) else {
            return Ok(());
        };
        let match_by = match fields.get("match_by").and_then(Value::as_str) {
            Some(s) => s.parse::<MatchBy>().unwrap_or_default(),
            None => MatchBy::Exact,
        };
        if match_by != MatchBy::Exact {
            return Ok(());
        }

        let values = fields.get("values").and_then(Value::as_list).unwrap_or_default();
        for value in values.iter().filter_map(Value::as_str) {
            filter_type
                .check(value)
                .map_err(|e| format!("{} for filter \"{}\"", e, name))?;
        }
        Ok(())
    })
}
