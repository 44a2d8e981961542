//! Engine location over the registry
//!
//! Candidates are walked in resolver order; within one candidate, entries
//! come in provider priority order. An entry is usable when its attributes
//! do not reject the leftover mode and padding, the factory produces an
//! engine, and the engine accepts the leftover mode and padding through its
//! setters. Failures of single entries are recorded and the walk continues.

use std::sync::Arc;

use tracing::debug;

use xform_api::{Error, Provider, Result, Service, ServiceType, TransformEngine};

use crate::registry::{Entry, ProviderRegistry, Support};
use crate::transform::{Candidate, Transform};

/// A registry entry reached through one of the transformation's candidates
#[derive(Debug, Clone)]
pub struct Located {
    entry: Entry,
    candidate: Candidate,
}

impl Located {
    pub fn provider(&self) -> &Arc<Provider> {
        self.entry.provider()
    }

    pub fn service(&self) -> &Service {
        self.entry.service()
    }

    pub fn candidate(&self) -> &Candidate {
        &self.candidate
    }
}

/// Every entry reachable from `transform`, most preferred first
pub fn locate(registry: &ProviderRegistry, transform: &Transform) -> Vec<Located> {
    transform
        .candidates()
        .into_iter()
        .flat_map(|candidate| {
            registry
                .entries(ServiceType::Cipher, candidate.key())
                .into_iter()
                .map(move |entry| Located {
                    entry,
                    candidate: candidate.clone(),
                })
        })
        .collect()
}

/// Instantiate the engine behind `located` and apply the leftover mode and padding
pub fn probe(registry: &ProviderRegistry, located: &Located) -> Result<Box<dyn TransformEngine>> {
    let service = located.service();
    let candidate = located.candidate();

    if registry.supports_mode(service, candidate.apply_mode()) == Support::No {
        return Err(Error::no_such_algorithm(format!(
            "{} does not support mode {}",
            service.algorithm(),
            candidate.apply_mode().unwrap_or_default()
        )));
    }
    if registry.supports_padding(service, candidate.apply_padding()) == Support::No {
        return Err(Error::NoSuchPadding {
            padding: candidate.apply_padding().unwrap_or_default().to_string(),
        });
    }

    instantiate(service, candidate)
}

fn instantiate(service: &Service, candidate: &Candidate) -> Result<Box<dyn TransformEngine>> {
    let mut engine = match service.new_cipher_engine() {
        Some(engine) => engine?,
        None => {
            return Err(Error::Provider {
                context: "engine factory",
                message: format!("{} is not a cipher service", service.algorithm()),
            })
        }
    };
    if let Some(mode) = candidate.apply_mode() {
        engine.set_mode(mode)?;
    }
    if let Some(padding) = candidate.apply_padding() {
        engine.set_padding(padding)?;
    }
    Ok(engine)
}

/// Failures collected while walking entries
#[derive(Debug, Default)]
pub struct Failures {
    last: Option<Error>,
    padding: Option<String>,
    other: bool,
}

impl Failures {
    pub fn record(&mut self, error: Error) {
        match &error {
            Error::NoSuchPadding { padding } => self.padding = Some(padding.clone()),
            _ => self.other = true,
        }
        self.last = Some(error);
    }

    /// Final error once every entry has been tried
    pub fn into_error(self, transformation: &str) -> Error {
        match (self.padding, self.other) {
            (Some(padding), false) => Error::NoSuchPadding { padding },
            _ => Error::NoSuchAlgorithm {
                algorithm: transformation.to_string(),
                source: self.last.map(Box::new),
            },
        }
    }
}

/// First usable entry for a transformation.
///
/// Returns the winning engine together with the located entries starting at
/// the winner, so a later init can fall back to the entries after it.
pub fn first_usable(
    registry: &ProviderRegistry,
    transform: &Transform,
    transformation: &str,
) -> Result<(Box<dyn TransformEngine>, Vec<Located>)> {
    let mut located = locate(registry, transform);
    let mut failures = Failures::default();

    let mut winner = None;
    for (index, entry) in located.iter().enumerate() {
        match probe(registry, entry) {
            Ok(engine) => {
                debug!(
                    transformation,
                    provider = entry.provider().name(),
                    key = entry.candidate().key(),
                    "found usable engine"
                );
                winner = Some((index, engine));
                break;
            }
            Err(err) => {
                debug!(
                    transformation,
                    provider = entry.provider().name(),
                    key = entry.candidate().key(),
                    error = %err,
                    "candidate rejected"
                );
                failures.record(err);
            }
        }
    }

    if let Some((index, engine)) = winner {
        return Ok((engine, located.split_off(index)));
    }
    Err(failures.into_error(transformation))
}

/// Engine from one explicitly chosen provider
///
/// The provider's trust is checked once, on the first candidate it actually
/// registers. Attribute mismatches on padding are remembered so that an
/// exhausted search reports `NoSuchPadding`.
pub fn from_provider(
    registry: &ProviderRegistry,
    transform: &Transform,
    transformation: &str,
    provider: &Provider,
) -> Result<Box<dyn TransformEngine>> {
    let mut checked = false;
    let mut failure: Option<Error> = None;
    let mut padding_error: Option<String> = None;

    for candidate in transform.candidates() {
        let Some(service) = provider.service(ServiceType::Cipher, candidate.key()) else {
            continue;
        };
        if !checked {
            if !registry.is_trusted(provider) {
                return Err(Error::UntrustedProvider {
                    provider: provider.name().to_string(),
                });
            }
            checked = true;
        }
        if registry.supports_mode(service, candidate.apply_mode()) == Support::No {
            continue;
        }
        if registry.supports_padding(service, candidate.apply_padding()) == Support::No {
            padding_error = candidate.apply_padding().map(str::to_string);
            continue;
        }
        match instantiate(service, &candidate) {
            Ok(engine) => {
                debug!(
                    transformation,
                    provider = provider.name(),
                    key = candidate.key(),
                    "bound engine from pinned provider"
                );
                return Ok(engine);
            }
            Err(err) => failure = Some(err),
        }
    }

    match (failure, padding_error) {
        (Some(err @ Error::NoSuchPadding { .. }), _) => Err(err),
        (_, Some(padding)) => Err(Error::NoSuchPadding { padding }),
        (failure, None) => Err(Error::NoSuchAlgorithm {
            algorithm: transformation.to_string(),
            source: failure.map(Box::new),
        }),
    }
}
