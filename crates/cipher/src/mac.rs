//! The `Mac` facade
//!
//! Selection mirrors the cipher facade without mode or padding: services
//! registered under the exact algorithm name are tried in provider order,
//! and the binding is committed by the first `init` whose key the service
//! accepts.

use core::fmt;
use std::sync::Arc;

use tracing::debug;

use xform_api::{
    validate, EngineParams, Error, Key, MacEngine, ParameterSpec, Provider, Result, ServiceType,
};

use crate::context::CryptoContext;
use crate::registry::Entry;

/// Provider-agnostic message authentication facade
pub struct Mac {
    algorithm: String,
    context: CryptoContext,
    entries: Vec<Entry>,
    bound: Option<(Box<dyn MacEngine>, Arc<Provider>)>,
    initialized: bool,
}

impl Mac {
    pub fn get_instance(context: &CryptoContext, algorithm: &str) -> Result<Self> {
        let entries = context.registry().entries(ServiceType::Mac, algorithm);
        if entries.is_empty() {
            return Err(Error::no_such_algorithm(algorithm));
        }
        Ok(Self {
            algorithm: algorithm.to_string(),
            context: context.clone(),
            entries,
            bound: None,
            initialized: false,
        })
    }

    /// MAC from the installed provider named `provider`, bound immediately
    pub fn get_instance_from(
        context: &CryptoContext,
        algorithm: &str,
        provider: &str,
    ) -> Result<Self> {
        validate::parameter(!provider.is_empty(), "provider", "missing provider")?;
        let registry = context.registry();
        let provider = registry
            .provider(provider)
            .ok_or_else(|| Error::NoSuchProvider {
                provider: provider.to_string(),
            })?;
        let service = provider
            .service(ServiceType::Mac, algorithm)
            .ok_or_else(|| Error::no_such_algorithm(algorithm))?;
        if !registry.is_trusted(&provider) {
            return Err(Error::UntrustedProvider {
                provider: provider.name().to_string(),
            });
        }
        let engine = instantiate(service.new_mac_engine(), algorithm)?;
        Ok(Self {
            algorithm: algorithm.to_string(),
            context: context.clone(),
            entries: Vec::new(),
            bound: Some((engine, provider)),
            initialized: false,
        })
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// Provider of the bound engine, binding the first usable one if needed
    pub fn provider(&mut self) -> Result<Arc<Provider>> {
        self.bind_first()?;
        self.bound
            .as_ref()
            .map(|(_, provider)| Arc::clone(provider))
            .ok_or(Error::illegal_state("no engine bound"))
    }

    /// Tag length in bytes
    pub fn mac_len(&mut self) -> Result<usize> {
        self.bind_first()?;
        self.engine().map(|e| e.mac_len())
    }

    fn bind_first(&mut self) -> Result<()> {
        if self.bound.is_some() {
            return Ok(());
        }
        let mut last = None;
        for entry in &self.entries {
            match instantiate(entry.service().new_mac_engine(), &self.algorithm) {
                Ok(engine) => {
                    self.bound = Some((engine, Arc::clone(entry.provider())));
                    return Ok(());
                }
                Err(err) => last = Some(err),
            }
        }
        Err(Error::NoSuchAlgorithm {
            algorithm: self.algorithm.clone(),
            source: last.map(Box::new),
        })
    }

    fn engine(&self) -> Result<&dyn MacEngine> {
        self.bound
            .as_ref()
            .map(|(engine, _)| engine.as_ref())
            .ok_or(Error::illegal_state("no engine bound"))
    }

    fn engine_mut(&mut self) -> Result<&mut dyn MacEngine> {
        validate::state(self.initialized, "MAC not initialized")?;
        match self.bound.as_mut() {
            Some((engine, _)) => Ok(engine.as_mut()),
            None => Err(Error::illegal_state("no engine bound")),
        }
    }

    pub fn init(&mut self, key: &Key) -> Result<()> {
        self.init_with(key, None)
    }

    pub fn init_with_spec(&mut self, key: &Key, spec: &ParameterSpec) -> Result<()> {
        self.init_with(key, Some(EngineParams::Spec(spec)))
    }

    /// Initialize with `key`, selecting an engine that accepts it if none is bound
    pub fn init_with(&mut self, key: &Key, params: Option<EngineParams<'_>>) -> Result<()> {
        self.initialized = false;
        if let Some((engine, _)) = self.bound.as_mut() {
            engine.init(key, params)?;
            self.initialized = true;
            return Ok(());
        }

        let mut first_error = None;
        for entry in &self.entries {
            if !entry.service().supports_key(key) {
                continue;
            }
            let attempt = instantiate(entry.service().new_mac_engine(), &self.algorithm)
                .and_then(|mut engine| engine.init(key, params).map(|_| engine));
            match attempt {
                Ok(engine) => {
                    debug!(
                        algorithm = %self.algorithm,
                        provider = entry.provider().name(),
                        "MAC engine bound at init"
                    );
                    self.bound = Some((engine, Arc::clone(entry.provider())));
                    self.initialized = true;
                    return Ok(());
                }
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }

        Err(match first_error {
            Some(err @ (Error::InvalidKey { .. } | Error::InvalidAlgorithmParameter { .. })) => err,
            Some(err) => Error::invalid_key(
                "provider selection",
                format!("no installed provider supports this key ({})", err),
            ),
            None => Error::invalid_key("provider selection", "no installed provider supports this key"),
        })
    }

    pub fn update(&mut self, input: &[u8]) -> Result<()> {
        self.engine_mut()?.update(input);
        Ok(())
    }

    /// Produce the tag and reset for the next message under the same key
    pub fn finalize(&mut self) -> Result<Vec<u8>> {
        self.engine_mut()?.finalize()
    }

    /// Produce the tag into `output`
    pub fn finalize_into(&mut self, output: &mut [u8]) -> Result<usize> {
        let len = self.engine_mut()?.mac_len();
        validate::output_capacity(output.len(), len)?;
        let tag = self.engine_mut()?.finalize()?;
        output[..tag.len()].copy_from_slice(&tag);
        Ok(tag.len())
    }

    /// Discard accumulated input, keeping the key
    pub fn reset(&mut self) {
        if let Some((engine, _)) = self.bound.as_mut() {
            engine.reset();
        }
    }

    /// Independent copy, including accumulated input
    pub fn duplicate(&self) -> Result<Self> {
        let bound = match &self.bound {
            Some((engine, provider)) => Some((engine.duplicate()?, Arc::clone(provider))),
            None => None,
        };
        Ok(Self {
            algorithm: self.algorithm.clone(),
            context: self.context.clone(),
            entries: self.entries.clone(),
            bound,
            initialized: self.initialized,
        })
    }
}

fn instantiate(
    engine: Option<Result<Box<dyn MacEngine>>>,
    algorithm: &str,
) -> Result<Box<dyn MacEngine>> {
    match engine {
        Some(engine) => engine,
        None => Err(Error::Provider {
            context: "engine factory",
            message: format!("{} is not a MAC service", algorithm),
        }),
    }
}

impl fmt::Debug for Mac {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mac")
            .field("algorithm", &self.algorithm)
            .field(
                "provider",
                &self.bound.as_ref().map(|(_, p)| p.name().to_string()),
            )
            .field("initialized", &self.initialized)
            .finish()
    }
}
