//! Linode Provider
//!
//! Read-only Linode data sources built on the filtered-list engine.
//!
//! ## Module Structure
//!
//! - `client` - Vendor API seam and paginated listing
//! - `http` - reqwest implementation of the API seam
//! - `memory` - In-memory API used for tests and offline reads
//! - `config` - Provider configuration (token, URL, paging)
//! - `datasource` - Generic filtered data source
//! - `datasources` - Per-entity field tables, list callbacks and flatteners
//! - `provider` - LinodeProvider registry

pub mod client;
pub mod config;
pub mod datasource;
pub mod datasources;
pub mod http;
pub mod memory;
pub mod provider;

// Re-export main types
pub use client::{ClientError, LinodeApi, SharedApi};
pub use config::ProviderConfig;
pub use datasource::{FilteredDataSource, ListDataSource, QueryPlan};
pub use http::HttpClient;
pub use memory::InMemoryApi;
pub use provider::LinodeProvider;
