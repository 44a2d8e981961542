//! Priority-ordered provider registry
//!
//! The registry holds providers in preference order. Lookups return every
//! service registered under an exact key, across trusted providers, in that
//! order. Mode and padding attributes are regular expressions matched in full
//! against the upper-cased requested value.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use regex::Regex;
use tracing::{debug, warn};

use xform_api::provider::{SUPPORTED_MODES, SUPPORTED_PADDINGS};
use xform_api::{Provider, Service, ServiceType};

/// Decides whether a provider may be used at all
pub trait ProviderVerifier: Send + Sync {
    fn verify(&self, provider: &Provider) -> bool;
}

/// Verifier that accepts every provider
#[derive(Debug, Default, Clone, Copy)]
pub struct TrustAll;

impl ProviderVerifier for TrustAll {
    fn verify(&self, _provider: &Provider) -> bool {
        true
    }
}

/// Verifier that accepts only providers whose name is listed
#[derive(Debug, Default, Clone)]
pub struct AllowList {
    names: HashSet<String>,
}

impl AllowList {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl ProviderVerifier for AllowList {
    fn verify(&self, provider: &Provider) -> bool {
        self.names.contains(provider.name())
    }
}

/// Outcome of checking a requested mode or padding against a service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Support {
    /// Explicitly rejected by the service's attribute
    No,
    /// No attribute declared; the engine decides
    Maybe,
    /// Matched by the service's attribute, or nothing was requested
    Yes,
}

/// A service together with the provider that registered it
#[derive(Debug, Clone)]
pub struct Entry {
    provider: Arc<Provider>,
    service: Service,
}

impl Entry {
    pub fn provider(&self) -> &Arc<Provider> {
        &self.provider
    }

    pub fn service(&self) -> &Service {
        &self.service
    }
}

/// Thread-safe, priority-ordered collection of providers
pub struct ProviderRegistry {
    providers: RwLock<Vec<Arc<Provider>>>,
    verifier: RwLock<Arc<dyn ProviderVerifier>>,
    patterns: Mutex<HashMap<String, Option<Regex>>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: RwLock::new(Vec::new()),
            verifier: RwLock::new(Arc::new(TrustAll)),
            patterns: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_verifier(verifier: Arc<dyn ProviderVerifier>) -> Self {
        let registry = Self::new();
        *registry.verifier.write() = verifier;
        registry
    }

    pub fn set_verifier(&self, verifier: Arc<dyn ProviderVerifier>) {
        *self.verifier.write() = verifier;
    }

    /// Append a provider at the lowest priority.
    ///
    /// Returns the 1-based position, or `None` if a provider with the same
    /// name is already installed.
    pub fn add_provider(&self, provider: Provider) -> Option<usize> {
        let mut providers = self.providers.write();
        if providers.iter().any(|p| p.name() == provider.name()) {
            return None;
        }
        debug!(provider = provider.name(), "installing provider");
        providers.push(Arc::new(provider));
        Some(providers.len())
    }

    /// Insert a provider at a 1-based position, clamped to the list end
    pub fn insert_provider_at(&self, provider: Provider, position: usize) -> Option<usize> {
        let mut providers = self.providers.write();
        if providers.iter().any(|p| p.name() == provider.name()) {
            return None;
        }
        let index = position.saturating_sub(1).min(providers.len());
        debug!(provider = provider.name(), position = index + 1, "inserting provider");
        providers.insert(index, Arc::new(provider));
        Some(index + 1)
    }

    pub fn remove_provider(&self, name: &str) -> bool {
        let mut providers = self.providers.write();
        let before = providers.len();
        providers.retain(|p| p.name() != name);
        before != providers.len()
    }

    pub fn provider(&self, name: &str) -> Option<Arc<Provider>> {
        self.providers
            .read()
            .iter()
            .find(|p| p.name() == name)
            .cloned()
    }

    /// Snapshot of the installed providers in priority order
    pub fn providers(&self) -> Vec<Arc<Provider>> {
        self.providers.read().clone()
    }

    pub fn is_trusted(&self, provider: &Provider) -> bool {
        self.verifier.read().verify(provider)
    }

    /// Services registered under exactly `key`, across trusted providers.
    ///
    /// Untrusted providers are skipped without error.
    pub fn entries(&self, service_type: ServiceType, key: &str) -> Vec<Entry> {
        let providers = self.providers();
        let verifier = self.verifier.read().clone();
        let mut found = Vec::new();
        for provider in providers {
            let Some(service) = provider.service(service_type, key) else {
                continue;
            };
            if !verifier.verify(&provider) {
                debug!(provider = provider.name(), key, "skipping untrusted provider");
                continue;
            }
            found.push(Entry {
                service: service.clone(),
                provider: Arc::clone(&provider),
            });
        }
        found
    }

    /// Check a requested mode against the service's declared modes
    pub fn supports_mode(&self, service: &Service, mode: Option<&str>) -> Support {
        self.supports(service, SUPPORTED_MODES, mode)
    }

    /// Check a requested padding against the service's declared paddings
    pub fn supports_padding(&self, service: &Service, padding: Option<&str>) -> Support {
        self.supports(service, SUPPORTED_PADDINGS, padding)
    }

    fn supports(&self, service: &Service, attribute: &str, value: Option<&str>) -> Support {
        let Some(value) = value else {
            return Support::Yes;
        };
        let Some(pattern) = service.attribute(attribute) else {
            return Support::Maybe;
        };

        let mut cache = self.patterns.lock();
        let compiled = cache
            .entry(pattern.to_string())
            .or_insert_with(|| match Regex::new(&format!("^(?:{})$", pattern)) {
                Ok(re) => Some(re),
                Err(err) => {
                    warn!(
                        service = service.algorithm(),
                        attribute,
                        pattern,
                        error = %err,
                        "ignoring service with invalid attribute pattern"
                    );
                    None
                }
            });

        match compiled {
            Some(re) if re.is_match(&value.to_uppercase()) => Support::Yes,
            _ => Support::No,
        }
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self
            .providers
            .read()
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        f.debug_struct("ProviderRegistry")
            .field("providers", &names)
            .finish()
    }
}
