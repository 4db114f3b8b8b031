//! Vendor API seam and paginated listing
//!
//! Data sources never talk HTTP directly. They go through [`LinodeApi`],
//! which fetches one page of a list endpoint, and [`list_entities`] walks
//! every page and decodes the elements.

use std::sync::Arc;

use async_trait::async_trait;
use linode_filter::ListResult;
use log::debug;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Largest page the vendor serves
pub const MAX_PAGE_SIZE: u32 = 500;
/// Smallest page the vendor serves
pub const MIN_PAGE_SIZE: u32 = 25;

/// Errors returned by the API seam
#[derive(Debug, Error)]
pub enum ClientError {
    /// The vendor answered with an error status
    #[error("[{status}] {message}")]
    Api { status: u16, message: String },

    /// The request never produced a response
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Unknown endpoint: {0}")]
    UnknownEndpoint(String),

    #[error("Listing cancelled")]
    Cancelled,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    errors: Vec<ErrorReason>,
}

#[derive(Debug, Deserialize)]
struct ErrorReason {
    reason: String,
    #[serde(default)]
    field: Option<String>,
}

impl ClientError {
    /// Build an API error from a status and the raw response body.
    ///
    /// The vendor's `{"errors":[{"reason":...,"field":...}]}` body is
    /// flattened into one message; anything else is kept verbatim.
    pub fn api(status: u16, body: &str) -> Self {
        let message = match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) if !parsed.errors.is_empty() => parsed
                .errors
                .iter()
                .map(|e| match &e.field {
                    Some(field) => format!("{}: {}", field, e.reason),
                    None => e.reason.clone(),
                })
                .collect::<Vec<_>>()
                .join("; "),
            _ => body.trim().to_string(),
        };
        ClientError::Api { status, message }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Query parameters of one page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOptions {
    pub page: u32,
    pub page_size: u32,
    /// Value of the `X-Filter` header
    pub filter: Option<String>,
}

/// One page of a list endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct Page {
    pub data: Vec<serde_json::Value>,
    pub page: u32,
    pub pages: u32,
    #[serde(default)]
    pub results: u32,
}

/// Access to the vendor's list endpoints
#[async_trait]
pub trait LinodeApi: Send + Sync {
    /// Fetch one page of `endpoint` (e.g. "images", "linode/types")
    async fn list_page(&self, endpoint: &str, options: &ListOptions) -> ClientResult<Page>;

    /// Page size used by [`list_entities`]
    fn page_size(&self) -> u32 {
        MAX_PAGE_SIZE
    }
}

/// Shared handle to an API implementation
pub type SharedApi = Arc<dyn LinodeApi>;

/// Fetch every page of `endpoint`, sending the same `X-Filter` with each
/// request, and decode the elements in the order the vendor returned them.
pub async fn list_all<T: DeserializeOwned>(
    api: &dyn LinodeApi,
    endpoint: &str,
    filter: &str,
    cancel: &CancellationToken,
) -> ClientResult<Vec<T>> {
    let mut entities = Vec::new();
    let mut page = 1;
    loop {
        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }

        let options = ListOptions {
            page,
            page_size: api.page_size(),
            filter: Some(filter.to_string()),
        };
        let response = api.list_page(endpoint, &options).await?;
        debug!(
            "Fetched {} page {}/{} ({} element(s))",
            endpoint,
            response.page,
            response.pages,
            response.data.len()
        );

        for raw in response.data {
            let entity = serde_json::from_value(raw)
                .map_err(|e| ClientError::Decode(format!("{}: {}", endpoint, e)))?;
            entities.push(entity);
        }

        if response.pages <= page {
            break;
        }
        page += 1;
    }
    Ok(entities)
}

/// [`list_all`] with the error boxed for a list callback
pub async fn list_entities<T: DeserializeOwned>(
    api: &SharedApi,
    endpoint: &str,
    filter: &str,
    cancel: &CancellationToken,
) -> ListResult<T> {
    Ok(list_all(api.as_ref(), endpoint, filter, cancel).await?)
}
