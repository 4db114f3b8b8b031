//! Error types for the filter engine

use linode_core::diagnostics::{AttributePath, Diagnostic, Diagnostics};
use thiserror::Error;

/// Boxed error returned by list callbacks
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum FilterError {
    /// Unknown field, non-filterable `order_by`, malformed `match_by` or
    /// a malformed filter entry
    #[error("{message}")]
    Configuration {
        message: String,
        path: Option<AttributePath>,
    },

    #[error("Failed to marshal api filter: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Failed to list resources: {0}")]
    List(#[source] BoxError),

    #[error("Failed to compile regex '{pattern}': {source}")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Failed to select latest element: {0}")]
    LatestSelection(String),

    #[error("Read cancelled")]
    Cancelled,
}

impl FilterError {
    pub fn configuration(message: impl Into<String>) -> Self {
        FilterError::Configuration {
            message: message.into(),
            path: None,
        }
    }

    /// Attach a configuration path. Only configuration errors carry one.
    pub fn at(self, path: AttributePath) -> Self {
        match self {
            FilterError::Configuration { message, .. } => FilterError::Configuration {
                message,
                path: Some(path),
            },
            other => other,
        }
    }

    fn summary(&self) -> &'static str {
        match self {
            FilterError::Configuration { .. } => "Invalid filter configuration",
            FilterError::Encoding(_) => "Failed to encode filter",
            FilterError::List(_) => "Failed to list resources",
            FilterError::Regex { .. } => "Invalid regular expression",
            FilterError::LatestSelection(_) => "Failed to select latest element",
            FilterError::Cancelled => "Read cancelled",
        }
    }

    /// Diagnostic detail, without the summary prefix
    fn detail(&self) -> String {
        match self {
            FilterError::Configuration { message, .. } => message.clone(),
            FilterError::Encoding(source) => source.to_string(),
            FilterError::List(source) => source.to_string(),
            FilterError::Regex { .. } => self.to_string(),
            FilterError::LatestSelection(message) => message.clone(),
            FilterError::Cancelled => "cancellation was requested before the read completed".to_string(),
        }
    }
}

impl From<FilterError> for Diagnostic {
    fn from(err: FilterError) -> Self {
        let summary = err.summary();
        let path = match &err {
            FilterError::Configuration { path, .. } => path.clone(),
            _ => None,
        };
        let diagnostic = Diagnostic::error(summary, err.detail());
        match path {
            Some(path) => diagnostic.at(path),
            None => diagnostic,
        }
    }
}

impl From<FilterError> for Diagnostics {
    fn from(err: FilterError) -> Self {
        Diagnostics::from(Diagnostic::from(err))
    }
}
