//! HTTP implementation of the API seam

use async_trait::async_trait;
use log::debug;

use crate::client::{ClientError, ClientResult, LinodeApi, ListOptions, Page};
use crate::config::{ConfigError, ProviderConfig};

/// Talks to the Linode REST API with a bearer token
pub struct HttpClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
    user_agent: String,
    page_size: u32,
}

impl HttpClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, ConfigError> {
        let token = config.token.clone().ok_or(ConfigError::MissingToken)?;
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: config.api_url(),
            token,
            user_agent: config.user_agent(),
            page_size: config.page_size,
        })
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }
}

#[async_trait]
impl LinodeApi for HttpClient {
    async fn list_page(&self, endpoint: &str, options: &ListOptions) -> ClientResult<Page> {
        let url = self.endpoint_url(endpoint);
        debug!("GET {} page={} page_size={}", url, options.page, options.page_size);

        let mut request = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .query(&[("page", options.page), ("page_size", options.page_size)]);
        if let Some(filter) = &options.filter {
            request = request.header("X-Filter", filter);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ClientError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .map_err(|e| ClientError::Http(e.to_string()))?;
            return Err(ClientError::api(status.as_u16(), &body));
        }

        response
            .json::<Page>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    fn page_size(&self) -> u32 {
        self.page_size
    }
}
