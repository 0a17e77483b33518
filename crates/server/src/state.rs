use std::sync::Arc;

use fetchcycle_core::config::SourceConfig;
use fetchcycle_core::{
    Config, FetchError, Getter, HttpGetter, Notifier, SanitizedConfig, StatusStore, Storer,
};

/// Builds the getter for one tenant's import.
pub trait GetterFactory: Send + Sync {
    fn getter_for(&self, tenant_id: &str) -> Result<Arc<dyn Getter>, FetchError>;
}

impl<F> GetterFactory for F
where
    F: Fn(&str) -> Result<Arc<dyn Getter>, FetchError> + Send + Sync,
{
    fn getter_for(&self, tenant_id: &str) -> Result<Arc<dyn Getter>, FetchError> {
        self(tenant_id)
    }
}

/// Creates an `HttpGetter` per tenant from the `[source]` config.
pub struct HttpGetterFactory {
    config: SourceConfig,
}

impl HttpGetterFactory {
    pub fn new(config: SourceConfig) -> Self {
        Self { config }
    }
}

impl GetterFactory for HttpGetterFactory {
    fn getter_for(&self, tenant_id: &str) -> Result<Arc<dyn Getter>, FetchError> {
        Ok(Arc::new(HttpGetter::new(self.config.clone(), tenant_id)?))
    }
}

/// Shared application state
pub struct AppState {
    config: Config,
    status_store: Arc<dyn StatusStore>,
    getter_factory: Option<Arc<dyn GetterFactory>>,
    storer: Option<Arc<dyn Storer>>,
    notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub fn new(
        config: Config,
        status_store: Arc<dyn StatusStore>,
        getter_factory: Option<Arc<dyn GetterFactory>>,
        storer: Option<Arc<dyn Storer>>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            status_store,
            getter_factory,
            storer,
            notifier,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn status_store(&self) -> &Arc<dyn StatusStore> {
        &self.status_store
    }

    /// Getter factory, if a record source is configured.
    pub fn getter_factory(&self) -> Option<&Arc<dyn GetterFactory>> {
        self.getter_factory.as_ref()
    }

    /// Storer, if a record sink is configured.
    pub fn storer(&self) -> Option<&Arc<dyn Storer>> {
        self.storer.as_ref()
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }
}
