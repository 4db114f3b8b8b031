//! Provider - Traits abstracting data source reads
//!
//! A Provider exposes the data sources of one vendor API. Each data source
//! validates its configuration at plan time and turns it into state at read
//! time.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::resource::{ResourceId, State, Value};
use crate::schema::ResourceSchema;

/// Error type for Provider operations
#[derive(Debug)]
pub struct ProviderError {
    pub message: String,
    pub resource_id: Option<ResourceId>,
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref id) = self.resource_id {
            write!(f, "[{}] {}", id, self.message)?;
        } else {
            write!(f, "{}", self.message)?;
        }
        if let Some(ref cause) = self.cause {
            write!(f, ": {}", cause)?;
        }
        Ok(())
    }
}

impl std::error::Error for ProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|e| e.as_ref() as &dyn std::error::Error)
    }
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            resource_id: None,
            cause: None,
        }
    }

    pub fn for_resource(mut self, id: ResourceId) -> Self {
        self.resource_id = Some(id);
        self
    }

    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}

impl From<ProviderError> for Diagnostic {
    fn from(err: ProviderError) -> Self {
        Diagnostic::error("Provider error", err.to_string())
    }
}

impl From<ProviderError> for Diagnostics {
    fn from(err: ProviderError) -> Self {
        Diagnostics::from(Diagnostic::from(err))
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Return type for async operations
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A read-only data source
pub trait DataSource: Send + Sync {
    /// Data source type name (e.g., "linode_images")
    fn name(&self) -> &'static str;

    /// Configuration and result schema
    fn schema(&self) -> ResourceSchema;

    /// Plan-time validation. Runs before any network call.
    fn validate(&self, config: &HashMap<String, Value>) -> Diagnostics {
        self.schema().validate(config)
    }

    /// Read the data source
    ///
    /// The returned state carries the configuration echoed back, the
    /// computed attributes and the deterministic identifier of the read.
    fn read(
        &self,
        id: &ResourceId,
        config: &HashMap<String, Value>,
        cancel: &CancellationToken,
    ) -> BoxFuture<'_, Result<State, Diagnostics>>;
}

/// Main Provider trait
///
/// Each vendor provider implements this trait to publish its data sources.
pub trait Provider: Send + Sync {
    /// Name of this Provider (e.g., "linode")
    fn name(&self) -> &'static str;

    /// Data sources this Provider can read
    fn data_sources(&self) -> Vec<&dyn DataSource>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AttributeSchema, AttributeType};

    // Mock data source echoing its configuration
    struct EchoDataSource;

    impl DataSource for EchoDataSource {
        fn name(&self) -> &'static str {
            "mock_echo"
        }

        fn schema(&self) -> ResourceSchema {
            ResourceSchema::new("mock_echo")
                .attribute(AttributeSchema::new("label", AttributeType::String).required())
        }

        fn read(
            &self,
            id: &ResourceId,
            config: &HashMap<String, Value>,
            cancel: &CancellationToken,
        ) -> BoxFuture<'_, Result<State, Diagnostics>> {
            let id = id.clone();
            let config = config.clone();
            let cancel = cancel.clone();
            Box::pin(async move {
                if cancel.is_cancelled() {
                    return Err(ProviderError::new("Read cancelled").for_resource(id).into());
                }
                let diags = self.validate(&config);
                if diags.has_error() {
                    return Err(diags);
                }
                Ok(State::new(id, config).with_identifier("mock-id"))
            })
        }
    }

    struct MockProvider {
        echo: EchoDataSource,
    }

    impl Provider for MockProvider {
        fn name(&self) -> &'static str {
            "mock"
        }

        fn data_sources(&self) -> Vec<&dyn DataSource> {
            vec![&self.echo]
        }
    }

    fn label_config(label: &str) -> HashMap<String, Value> {
        let mut config = HashMap::new();
        config.insert("label".to_string(), Value::from(label));
        config
    }

    #[tokio::test]
    async fn read_through_provider() {
        let provider = MockProvider {
            echo: EchoDataSource,
        };
        assert_eq!(provider.name(), "mock");

        let ds = provider
            .data_sources()
            .into_iter()
            .find(|ds| ds.name() == "mock_echo")
            .unwrap();
        let id = ResourceId::new("mock_echo", "test");
        let state = ds
            .read(&id, &label_config("web"), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(state.identifier.as_deref(), Some("mock-id"));
        assert_eq!(state.get("label"), Some(&Value::from("web")));
    }

    #[tokio::test]
    async fn read_reports_validation_errors() {
        let ds = EchoDataSource;
        let id = ResourceId::new("mock_echo", "test");
        let err = ds
            .read(&id, &HashMap::new(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.has_error());
    }

    #[tokio::test]
    async fn cancelled_read_fails() {
        let ds = EchoDataSource;
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = ds
            .read(&ResourceId::new("mock_echo", "x"), &label_config("a"), &cancel)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("[mock_echo.x] Read cancelled"));
    }

    #[test]
    fn provider_error_display_includes_cause() {
        let err = ProviderError::new("Failed to read")
            .for_resource(ResourceId::new("linode_images", "x"))
            .with_cause(std::io::Error::other("boom"));
        assert_eq!(err.to_string(), "[linode_images.x] Failed to read: boom");
    }
}
