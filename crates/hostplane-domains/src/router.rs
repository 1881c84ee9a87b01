//! Request-time host routing

use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, instrument};

use crate::classifier::{HostnameClassifier, Resolution};
use crate::registry::TenantRegistry;
use crate::RegistryError;

/// Registry initialization state, injected into request handling.
///
/// Clones share state, so one value per process (or per test) gives
/// run-once setup without a hidden global.
#[derive(Debug, Clone, Default)]
pub struct InitState {
    ready: Arc<OnceCell<()>>,
}

impl InitState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ready(&self) -> bool {
        self.ready.initialized()
    }

    /// Run `ensure_schema` the first time only. A failed run is retried on the next call.
    pub async fn ensure(&self, registry: &dyn TenantRegistry) -> Result<(), RegistryError> {
        self.ready
            .get_or_try_init(|| async { registry.ensure_schema().await })
            .await
            .map(|_| ())
    }
}

/// Resolves request hosts to tenants
#[derive(Clone)]
pub struct HostRouter {
    classifier: HostnameClassifier,
    registry: Arc<dyn TenantRegistry>,
    init: InitState,
}

impl HostRouter {
    pub fn new(
        classifier: HostnameClassifier,
        registry: Arc<dyn TenantRegistry>,
        init: InitState,
    ) -> Self {
        Self {
            classifier,
            registry,
            init,
        }
    }

    pub fn classifier(&self) -> &HostnameClassifier {
        &self.classifier
    }

    #[instrument(skip(self))]
    pub async fn route(&self, request_host: &str) -> Result<Resolution, RegistryError> {
        self.init.ensure(self.registry.as_ref()).await?;
        let resolution = self
            .classifier
            .resolve(request_host, self.registry.as_ref())
            .await?;
        debug!(?resolution, "Host resolved");
        Ok(resolution)
    }
}
