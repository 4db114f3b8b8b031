//! Field values projected out of decoded entities
//!
//! Every filterable field is read through a typed accessor registered with
//! the [`FilterConfig`](crate::config::FilterConfig). The accessor projects
//! the entity's field into a [`FieldValue`], which the local filter and the
//! latest selector then compare as normalised strings.

/// Typed projection of one entity field
pub type Accessor<T> = fn(&T) -> FieldValue;

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Absent optional field
    Null,
    String(String),
    Int(i64),
    Bool(bool),
    Float(f64),
    /// Matched element-wise: any element satisfying the filter matches
    List(Vec<FieldValue>),
}

impl FieldValue {
    pub fn list<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<FieldValue>,
    {
        FieldValue::List(items.into_iter().map(Into::into).collect())
    }

    /// Normalise a scalar into the string compared against filter values.
    ///
    /// Null becomes the empty string, integers are written in base 10,
    /// booleans as `true`/`false` and floats with no fractional digits.
    /// Lists have no scalar form and return `None`.
    pub fn normalize(&self) -> Option<String> {
        match self {
            FieldValue::Null => Some(String::new()),
            FieldValue::String(s) => Some(s.clone()),
            FieldValue::Int(n) => Some(n.to_string()),
            FieldValue::Bool(b) => Some(b.to_string()),
            FieldValue::Float(f) => Some(format!("{:.0}", f)),
            FieldValue::List(_) => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Apply `pred` to the scalar, or to each element of a list
    pub fn any_scalar(&self, pred: &mut impl FnMut(&str) -> bool) -> bool {
        match self {
            FieldValue::List(items) => items.iter().any(|item| item.any_scalar(&mut *pred)),
            scalar => scalar.normalize().is_some_and(|s| pred(&s)),
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<&String> for FieldValue {
    fn from(s: &String) -> Self {
        FieldValue::String(s.clone())
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Int(n)
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        FieldValue::Int(n.into())
    }
}

impl From<u32> for FieldValue {
    fn from(n: u32) -> Self {
        FieldValue::Int(n.into())
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(items: Vec<T>) -> Self {
        FieldValue::list(items)
    }
}
