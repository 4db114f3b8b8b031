//! Linode Provider implementation
//!
//! Registry of the list data sources, all sharing one API handle.

use linode_core::provider::{DataSource, Provider, ProviderError, ProviderResult};
use log::debug;

use crate::client::SharedApi;
use crate::config::ProviderConfig;
use crate::datasource::ListDataSource;
use crate::datasources;
use crate::http::HttpClient;

pub struct LinodeProvider {
    data_sources: Vec<Box<dyn ListDataSource>>,
}

impl LinodeProvider {
    /// Create a provider reading through `api`
    pub fn new(api: SharedApi) -> Self {
        Self {
            data_sources: datasources::all(&api),
        }
    }

    /// Create a provider talking to the live API
    pub fn from_config(config: &ProviderConfig) -> ProviderResult<Self> {
        let client = HttpClient::new(config).map_err(|e| {
            ProviderError::new("Failed to configure Linode client").with_cause(e)
        })?;
        debug!("Configured Linode client for {}", config.api_url());
        Ok(Self::new(std::sync::Arc::new(client)))
    }

    /// Type names of every data source, sorted
    pub fn data_source_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.data_sources.iter().map(|ds| ds.name()).collect();
        names.sort_unstable();
        names
    }

    /// Look up a data source, naming the known ones when `name` is unknown
    pub fn list_data_source(&self, name: &str) -> ProviderResult<&dyn ListDataSource> {
        self.data_sources
            .iter()
            .find(|ds| ds.name() == name)
            .map(|ds| ds.as_ref())
            .ok_or_else(|| {
                ProviderError::new(format!(
                    "Unknown data source '{}'. Known data sources: {}",
                    name,
                    self.data_source_names().join(", ")
                ))
            })
    }
}

impl Provider for LinodeProvider {
    fn name(&self) -> &'static str {
        "linode"
    }

    fn data_sources(&self) -> Vec<&dyn DataSource> {
        self.data_sources.iter().map(|ds| ds.as_data_source()).collect()
    }
}
