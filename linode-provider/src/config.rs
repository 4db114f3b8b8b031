//! Provider configuration
//!
//! Built from the host's provider block. Explicit attributes win over the
//! `LINODE_*` environment variables, which win over the defaults.

use std::collections::HashMap;
use std::fmt;

use linode_core::resource::Value;
use linode_core::schema::{AttributeSchema, AttributeType, ResourceSchema, validators};
use thiserror::Error;

use crate::client::{MAX_PAGE_SIZE, MIN_PAGE_SIZE};

pub const DEFAULT_URL: &str = "https://api.linode.com";
pub const DEFAULT_API_VERSION: &str = "v4";

/// Errors that can occur while building the provider configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing API token: set the token attribute or LINODE_TOKEN")]
    MissingToken,

    #[error("Invalid url '{0}': must start with http:// or https://")]
    InvalidUrl(String),

    #[error("Invalid page_size {0}: must be between 25 and 500")]
    InvalidPageSize(i64),

    #[error("Invalid attribute '{name}': expected {expected}")]
    InvalidAttribute { name: String, expected: String },
}

#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Personal access token. Only needed for live reads.
    pub token: Option<String>,
    pub url: String,
    pub api_version: String,
    pub page_size: u32,
    pub ua_prefix: Option<String>,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("url", &self.url)
            .field("api_version", &self.api_version)
            .field("page_size", &self.page_size)
            .field("ua_prefix", &self.ua_prefix)
            .finish()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            token: None,
            url: DEFAULT_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            page_size: MAX_PAGE_SIZE,
            ua_prefix: None,
        }
    }
}

fn get_string(
    attributes: &HashMap<String, Value>,
    key: &str,
) -> Result<Option<String>, ConfigError> {
    match attributes.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ConfigError::InvalidAttribute {
            name: key.to_string(),
            expected: "string".to_string(),
        }),
    }
}

fn get_int(attributes: &HashMap<String, Value>, key: &str) -> Result<Option<i64>, ConfigError> {
    match attributes.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Int(n)) => Ok(Some(*n)),
        Some(_) => Err(ConfigError::InvalidAttribute {
            name: key.to_string(),
            expected: "int".to_string(),
        }),
    }
}

impl ProviderConfig {
    /// Build from provider attributes, falling back to the process
    /// environment
    pub fn from_attributes(attributes: &HashMap<String, Value>) -> Result<Self, ConfigError> {
        Self::from_attributes_with_env(attributes, |key| std::env::var(key).ok())
    }

    /// Build from provider attributes with an explicit environment lookup
    pub fn from_attributes_with_env(
        attributes: &HashMap<String, Value>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let lookup = |key: &str, var: &str| -> Result<Option<String>, ConfigError> {
            Ok(get_string(attributes, key)?.or_else(|| env(var).filter(|v| !v.is_empty())))
        };

        let token = lookup("token", "LINODE_TOKEN")?;
        let url = lookup("url", "LINODE_URL")?.unwrap_or_else(|| DEFAULT_URL.to_string());
        let api_version = lookup("api_version", "LINODE_API_VERSION")?
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string());
        let ua_prefix = lookup("ua_prefix", "LINODE_UA_PREFIX")?;

        let page_size = match get_int(attributes, "page_size")? {
            None => MAX_PAGE_SIZE,
            Some(n) if (MIN_PAGE_SIZE as i64..=MAX_PAGE_SIZE as i64).contains(&n) => n as u32,
            Some(n) => return Err(ConfigError::InvalidPageSize(n)),
        };

        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl(url));
        }

        Ok(Self {
            token,
            url,
            api_version,
            page_size,
            ua_prefix,
        })
    }

    /// Base URL including the API version, without a trailing slash
    pub fn api_url(&self) -> String {
        format!(
            "{}/{}",
            self.url.trim_end_matches('/'),
            self.api_version.trim_matches('/')
        )
    }

    pub fn user_agent(&self) -> String {
        let agent = format!("linode-provider/{}", env!("CARGO_PKG_VERSION"));
        match &self.ua_prefix {
            Some(prefix) => format!("{} {}", prefix, agent),
            None => agent,
        }
    }

    /// Provider block descriptor
    pub fn schema() -> ResourceSchema {
        ResourceSchema::new("linode")
            .with_description("Linode API connection settings")
            .attribute(
                AttributeSchema::new("token", AttributeType::String)
                    .with_description("Personal access token. Falls back to LINODE_TOKEN."),
            )
            .attribute(
                AttributeSchema::new("url", AttributeType::String)
                    .with_default(Value::from(DEFAULT_URL))
                    .with_description("API base URL. Falls back to LINODE_URL.")
                    .with_validator(validators::string_prefix(&["http://", "https://"])),
            )
            .attribute(
                AttributeSchema::new("api_version", AttributeType::String)
                    .with_default(Value::from(DEFAULT_API_VERSION))
                    .with_description("API version. Falls back to LINODE_API_VERSION."),
            )
            .attribute(
                AttributeSchema::new("page_size", AttributeType::Int)
                    .with_default(Value::Int(MAX_PAGE_SIZE as i64))
                    .with_description("Number of elements requested per page.")
                    .with_validator(validators::int_between(
                        MIN_PAGE_SIZE as i64,
                        MAX_PAGE_SIZE as i64,
                    )),
            )
            .attribute(
                AttributeSchema::new("ua_prefix", AttributeType::String)
                    .with_description("Prefix prepended to the User-Agent header."),
            )
    }
}
