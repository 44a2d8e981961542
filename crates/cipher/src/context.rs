//! Configuration handed to the facade factories

use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::policy::{CryptoPolicy, UnlimitedPolicy};
use crate::registry::ProviderRegistry;

static GLOBAL: Lazy<CryptoContext> = Lazy::new(CryptoContext::default);

/// Provider registry plus the policy applied at init time
#[derive(Debug, Clone)]
pub struct CryptoContext {
    registry: Arc<ProviderRegistry>,
    policy: Arc<dyn CryptoPolicy>,
}

impl CryptoContext {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self {
            registry,
            policy: Arc::new(UnlimitedPolicy),
        }
    }

    pub fn with_policy(mut self, policy: Arc<dyn CryptoPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Process-wide context: an initially empty registry with no key limits
    pub fn global() -> &'static CryptoContext {
        &GLOBAL
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    pub fn policy(&self) -> &Arc<dyn CryptoPolicy> {
        &self.policy
    }
}

impl Default for CryptoContext {
    fn default() -> Self {
        Self::new(Arc::new(ProviderRegistry::new()))
    }
}
