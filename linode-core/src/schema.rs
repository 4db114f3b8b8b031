//! Schema - Attribute and block descriptors for data sources
//!
//! Data sources describe their configuration and result shape with these
//! descriptors. The host uses them to decode configuration, and
//! [`ResourceSchema::validate`] runs the attached validators before any
//! network call is made.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::diagnostics::{AttributePath, Diagnostics};
use crate::resource::Value;

/// Attribute type
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeType {
    String,
    Int,
    Float,
    Bool,
    List(Box<AttributeType>),
    /// Unordered collection; the host collapses duplicates
    Set(Box<AttributeType>),
}

impl AttributeType {
    /// Check if a value conforms to this type. `Null` always conforms.
    pub fn validate(&self, value: &Value) -> Result<(), TypeError> {
        match (self, value) {
            (_, Value::Null) => Ok(()),
            (AttributeType::String, Value::String(_)) => Ok(()),
            (AttributeType::Int, Value::Int(_)) => Ok(()),
            (AttributeType::Float, Value::Float(_) | Value::Int(_)) => Ok(()),
            (AttributeType::Bool, Value::Bool(_)) => Ok(()),

            (AttributeType::List(inner) | AttributeType::Set(inner), Value::List(items)) => {
                for (index, item) in items.iter().enumerate() {
                    inner
                        .validate(item)
                        .map_err(|e| TypeError::ListItemError {
                            index,
                            inner: Box::new(e),
                        })?;
                }
                Ok(())
            }

            _ => Err(TypeError::TypeMismatch {
                expected: self.type_name(),
                got: value.type_name(),
            }),
        }
    }

    fn type_name(&self) -> String {
        match self {
            AttributeType::String => "String".to_string(),
            AttributeType::Int => "Int".to_string(),
            AttributeType::Float => "Float".to_string(),
            AttributeType::Bool => "Bool".to_string(),
            AttributeType::List(inner) => format!("List<{}>", inner.type_name()),
            AttributeType::Set(inner) => format!("Set<{}>", inner.type_name()),
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Type error
#[derive(Debug, Clone, thiserror::Error)]
pub enum TypeError {
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Required attribute '{name}' is missing")]
    MissingRequired { name: String },

    #[error("Unknown attribute '{name}'")]
    UnknownAttribute { name: String },

    #[error("Attribute '{name}' is computed and cannot be set")]
    ComputedAttribute { name: String },

    #[error("List item at index {index}: {inner}")]
    ListItemError { index: usize, inner: Box<TypeError> },
}

impl Value {
    pub(crate) fn type_name(&self) -> String {
        match self {
            Value::Null => "Null".to_string(),
            Value::String(_) => "String".to_string(),
            Value::Int(_) => "Int".to_string(),
            Value::Float(_) => "Float".to_string(),
            Value::Bool(_) => "Bool".to_string(),
            Value::List(_) => "List".to_string(),
            Value::Map(_) => "Map".to_string(),
        }
    }
}

type CheckFn = dyn Fn(&Value) -> Result<(), String> + Send + Sync;

/// Plan-time check attached to an attribute or to each element of a block.
///
/// Validators only see non-null values.
#[derive(Clone)]
pub struct Validator {
    description: String,
    check: Arc<CheckFn>,
}

impl Validator {
    pub fn new(
        description: impl Into<String>,
        check: impl Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            description: description.into(),
            check: Arc::new(check),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn validate(&self, value: &Value) -> Result<(), String> {
        (self.check)(value)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("description", &self.description)
            .finish()
    }
}

/// Attribute schema
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    pub name: String,
    pub attr_type: AttributeType,
    pub required: bool,
    /// Set by the provider, never by the user
    pub computed: bool,
    pub default: Option<Value>,
    pub description: Option<String>,
    pub validators: Vec<Validator>,
}

impl AttributeSchema {
    pub fn new(name: impl Into<String>, attr_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attr_type,
            required: false,
            computed: false,
            default: None,
            description: None,
            validators: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }
}

/// How repeated block elements are collected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockNesting {
    List,
    Set,
}

/// Nested block schema (e.g. `filter { name = ..., values = [...] }`)
#[derive(Debug, Clone)]
pub struct BlockSchema {
    pub name: String,
    pub nesting: BlockNesting,
    pub attributes: BTreeMap<String, AttributeSchema>,
    pub blocks: BTreeMap<String, BlockSchema>,
    pub computed: bool,
    pub description: Option<String>,
    /// Run once per element, after its attributes type-check
    pub validators: Vec<Validator>,
}

impl BlockSchema {
    pub fn new(name: impl Into<String>, nesting: BlockNesting) -> Self {
        Self {
            name: name.into(),
            nesting,
            attributes: BTreeMap::new(),
            blocks: BTreeMap::new(),
            computed: false,
            description: None,
            validators: Vec::new(),
        }
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.insert(schema.name.clone(), schema);
        self
    }

    pub fn block(mut self, schema: BlockSchema) -> Self {
        self.blocks.insert(schema.name.clone(), schema);
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }
}

/// Schema of a data source or provider configuration
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    pub resource_type: String,
    pub attributes: BTreeMap<String, AttributeSchema>,
    pub blocks: BTreeMap<String, BlockSchema>,
    pub description: Option<String>,
}

impl ResourceSchema {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            attributes: BTreeMap::new(),
            blocks: BTreeMap::new(),
            description: None,
        }
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.insert(schema.name.clone(), schema);
        self
    }

    pub fn block(mut self, schema: BlockSchema) -> Self {
        self.blocks.insert(schema.name.clone(), schema);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Validate a configuration against this schema.
    ///
    /// Unknown keys, missing required attributes, type mismatches and
    /// validator failures are all reported; validation never stops early.
    pub fn validate(&self, config: &HashMap<String, Value>) -> Diagnostics {
        let mut diags = Diagnostics::new();
        validate_object(
            &self.attributes,
            &self.blocks,
            config,
            &AttributePath::root(),
            &mut diags,
        );
        diags
    }
}

fn validate_object(
    attributes: &BTreeMap<String, AttributeSchema>,
    blocks: &BTreeMap<String, BlockSchema>,
    values: &HashMap<String, Value>,
    path: &AttributePath,
    diags: &mut Diagnostics,
) {
    let mut unknown: Vec<&String> = values
        .keys()
        .filter(|k| !attributes.contains_key(*k) && !blocks.contains_key(*k))
        .collect();
    unknown.sort();
    for name in unknown {
        diags.add_attribute_error(
            path.child(name),
            "Unsupported argument",
            TypeError::UnknownAttribute { name: name.clone() }.to_string(),
        );
    }

    for (name, schema) in attributes {
        let attr_path = path.child(name);
        let value = values.get(name).filter(|v| !v.is_null());

        let Some(value) = value else {
            if schema.required && schema.default.is_none() {
                diags.add_attribute_error(
                    attr_path,
                    "Missing required argument",
                    TypeError::MissingRequired { name: name.clone() }.to_string(),
                );
            }
            continue;
        };

        if schema.computed && !schema.required {
            diags.add_attribute_error(
                attr_path,
                "Invalid configuration",
                TypeError::ComputedAttribute { name: name.clone() }.to_string(),
            );
            continue;
        }

        if let Err(e) = schema.attr_type.validate(value) {
            diags.add_attribute_error(attr_path, "Incorrect attribute value type", e.to_string());
            continue;
        }

        for validator in &schema.validators {
            if let Err(message) = validator.validate(value) {
                diags.add_attribute_error(attr_path.clone(), "Invalid attribute value", message);
            }
        }
    }

    for (name, block) in blocks {
        let block_path = path.child(name);
        let items = match values.get(name) {
            None | Some(Value::Null) => continue,
            Some(Value::List(items)) => items,
            Some(other) => {
                diags.add_attribute_error(
                    block_path,
                    "Incorrect block type",
                    TypeError::TypeMismatch {
                        expected: "List".to_string(),
                        got: other.type_name(),
                    }
                    .to_string(),
                );
                continue;
            }
        };

        if block.computed && !items.is_empty() {
            diags.add_attribute_error(
                block_path,
                "Invalid configuration",
                TypeError::ComputedAttribute { name: name.clone() }.to_string(),
            );
            continue;
        }

        for (index, item) in items.iter().enumerate() {
            let item_path = block_path.index(index);
            let Value::Map(fields) = item else {
                diags.add_attribute_error(
                    item_path,
                    "Incorrect block type",
                    TypeError::TypeMismatch {
                        expected: "Map".to_string(),
                        got: item.type_name(),
                    }
                    .to_string(),
                );
                continue;
            };

            let mut element_diags = Diagnostics::new();
            validate_object(
                &block.attributes,
                &block.blocks,
                fields,
                &item_path,
                &mut element_diags,
            );
            let structurally_valid = !element_diags.has_error();
            diags.extend(element_diags);

            if structurally_valid {
                for validator in &block.validators {
                    if let Err(message) = validator.validate(item) {
                        diags.add_attribute_error(item_path.clone(), "Invalid block", message);
                    }
                }
            }
        }
    }
}

/// Validators shared by data source schemas
pub mod validators {
    use super::*;

    /// Reject empty lists and sets
    pub fn non_empty_list() -> Validator {
        Validator::new("list must contain at least one element", |value| match value {
            Value::List(items) if items.is_empty() => {
                Err("at least one element is required".to_string())
            }
            _ => Ok(()),
        })
    }

    /// Accept integers in `min..=max`
    pub fn int_between(min: i64, max: i64) -> Validator {
        Validator::new(
            format!("value must be between {} and {}", min, max),
            move |value| match value {
                Value::Int(n) if (min..=max).contains(n) => Ok(()),
                Value::Int(n) => Err(format!(
                    "{} is out of range, expected a value between {} and {}",
                    n, min, max
                )),
                _ => Ok(()),
            },
        )
    }

    /// Accept strings starting with one of the prefixes
    pub fn string_prefix(prefixes: &[&str]) -> Validator {
        let prefixes: Vec<String> = prefixes.iter().map(|s| s.to_string()).collect();
        Validator::new(
            format!("value must start with one of: {}", prefixes.join(", ")),
            move |value| match value {
                Value::String(s) if prefixes.iter().any(|p| s.starts_with(p.as_str())) => Ok(()),
                Value::String(s) => Err(format!(
                    "\"{}\" must start with one of: {}",
                    s,
                    prefixes.join(", ")
                )),
                _ => Ok(()),
            },
        )
    }
}
