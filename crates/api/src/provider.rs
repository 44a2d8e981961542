//! Provider and service descriptors
//!
//! A provider is a named, ordered bundle of services. Each service advertises
//! one registration key (`AES`, `AES/GCM/NoPadding`, `HmacSHA256`), optional
//! attributes that constrain the modes, paddings and key formats it accepts,
//! and a factory producing fresh engine instances.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::{Key, MacEngine, Result, TransformEngine};

/// Attribute listing the modes a cipher service accepts, as a regular expression
pub const SUPPORTED_MODES: &str = "SupportedModes";
/// Attribute listing the paddings a cipher service accepts, as a regular expression
pub const SUPPORTED_PADDINGS: &str = "SupportedPaddings";
/// Attribute listing the key encoding formats a service accepts, `|` separated
pub const SUPPORTED_KEY_FORMATS: &str = "SupportedKeyFormats";

type CipherFactory = dyn Fn() -> Result<Box<dyn TransformEngine>> + Send + Sync;
type MacFactory = dyn Fn() -> Result<Box<dyn MacEngine>> + Send + Sync;
type KeyPredicate = dyn Fn(&Key) -> bool + Send + Sync;

/// Kind of engine a service produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceType {
    Cipher,
    Mac,
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cipher => f.write_str("Cipher"),
            Self::Mac => f.write_str("Mac"),
        }
    }
}

/// Constructor for fresh engine instances
#[derive(Clone)]
pub enum EngineFactory {
    Cipher(Arc<CipherFactory>),
    Mac(Arc<MacFactory>),
}

impl EngineFactory {
    pub fn cipher<F>(f: F) -> Self
    where
        F: Fn() -> Result<Box<dyn TransformEngine>> + Send + Sync + 'static,
    {
        Self::Cipher(Arc::new(f))
    }

    pub fn mac<F>(f: F) -> Self
    where
        F: Fn() -> Result<Box<dyn MacEngine>> + Send + Sync + 'static,
    {
        Self::Mac(Arc::new(f))
    }

    pub fn service_type(&self) -> ServiceType {
        match self {
            Self::Cipher(_) => ServiceType::Cipher,
            Self::Mac(_) => ServiceType::Mac,
        }
    }
}

/// One registered algorithm of a provider
#[derive(Clone)]
pub struct Service {
    algorithm: String,
    attributes: BTreeMap<String, String>,
    factory: EngineFactory,
    key_filter: Option<Arc<KeyPredicate>>,
}

impl Service {
    pub fn new(algorithm: impl Into<String>, factory: EngineFactory) -> Self {
        Self {
            algorithm: algorithm.into(),
            attributes: BTreeMap::new(),
            factory,
            key_filter: None,
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Restrict the keys this service accepts beyond the advertised formats
    pub fn with_key_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Key) -> bool + Send + Sync + 'static,
    {
        self.key_filter = Some(Arc::new(filter));
        self
    }

    pub fn service_type(&self) -> ServiceType {
        self.factory.service_type()
    }

    /// Registration key, compared case-sensitively
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn factory(&self) -> &EngineFactory {
        &self.factory
    }

    /// Instantiate a cipher engine, if this is a cipher service
    pub fn new_cipher_engine(&self) -> Option<Result<Box<dyn TransformEngine>>> {
        match &self.factory {
            EngineFactory::Cipher(f) => Some(f()),
            EngineFactory::Mac(_) => None,
        }
    }

    /// Instantiate a MAC engine, if this is a MAC service
    pub fn new_mac_engine(&self) -> Option<Result<Box<dyn MacEngine>>> {
        match &self.factory {
            EngineFactory::Mac(f) => Some(f()),
            EngineFactory::Cipher(_) => None,
        }
    }

    /// Whether this service can be initialized with `key`.
    ///
    /// A service with no advertised formats and no filter accepts every key.
    /// A key without an encoding format never matches an advertised list.
    pub fn supports_key(&self, key: &Key) -> bool {
        if let Some(formats) = self.attribute(SUPPORTED_KEY_FORMATS) {
            let matched = key
                .format()
                .map(|fmt| {
                    formats
                        .split('|')
                        .any(|f| f.trim().eq_ignore_ascii_case(fmt))
                })
                .unwrap_or(false);
            if !matched {
                return false;
            }
        }
        match &self.key_filter {
            Some(filter) => filter(key),
            None => true,
        }
    }
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("type", &self.service_type())
            .field("algorithm", &self.algorithm)
            .field("attributes", &self.attributes)
            .field("key_filter", &self.key_filter.is_some())
            .finish()
    }
}

/// Named, versioned bundle of services
#[derive(Debug, Clone)]
pub struct Provider {
    name: String,
    version: String,
    info: String,
    services: Vec<Service>,
}

impl Provider {
    pub fn builder(name: impl Into<String>) -> ProviderBuilder {
        ProviderBuilder {
            name: name.into(),
            version: "1.0".to_string(),
            info: String::new(),
            services: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn info(&self) -> &str {
        &self.info
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    /// Service registered under exactly `algorithm`
    pub fn service(&self, service_type: ServiceType, algorithm: &str) -> Option<&Service> {
        self.services
            .iter()
            .find(|s| s.service_type() == service_type && s.algorithm == algorithm)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} version {}", self.name, self.version)
    }
}

/// Builder for [`Provider`]
#[derive(Debug)]
pub struct ProviderBuilder {
    name: String,
    version: String,
    info: String,
    services: Vec<Service>,
}

impl ProviderBuilder {
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn info(mut self, info: impl Into<String>) -> Self {
        self.info = info.into();
        self
    }

    pub fn service(mut self, service: Service) -> Self {
        self.services.push(service);
        self
    }

    pub fn build(self) -> Provider {
        Provider {
            name: self.name,
            version: self.version,
            info: self.info,
            services: self.services,
        }
    }
}
