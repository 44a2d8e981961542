//! Engine binding of a facade: still searching, or bound for good

use std::sync::Arc;

use tracing::{debug, warn};

use xform_api::{
    EngineParams, Error, Key, OperationMode, Provider, Result, SecureRandom, TransformEngine,
};

use crate::context::CryptoContext;
use crate::locator::{probe, Failures, Located};

pub(crate) enum Binding {
    /// Entries still eligible, most preferred first. `first` is the already
    /// configured engine for `entries[0]`, when one has been built.
    Searching {
        first: Option<Box<dyn TransformEngine>>,
        entries: Vec<Located>,
    },
    Bound {
        engine: Box<dyn TransformEngine>,
        provider: Arc<Provider>,
    },
}

impl Binding {
    pub(crate) fn engine(&self) -> Option<&dyn TransformEngine> {
        match self {
            Self::Bound { engine, .. } => Some(engine.as_ref()),
            Self::Searching { .. } => None,
        }
    }

    pub(crate) fn engine_mut(&mut self) -> Option<&mut dyn TransformEngine> {
        match self {
            Self::Bound { engine, .. } => Some(engine.as_mut()),
            Self::Searching { .. } => None,
        }
    }

    pub(crate) fn provider(&self) -> Option<&Arc<Provider>> {
        match self {
            Self::Bound { provider, .. } => Some(provider),
            Self::Searching { .. } => None,
        }
    }

    /// Bind to the first usable entry without a key.
    pub(crate) fn choose_first(
        &mut self,
        context: &CryptoContext,
        transformation: &str,
    ) -> Result<()> {
        let chosen = match self {
            Self::Bound { .. } => return Ok(()),
            Self::Searching { first, entries } => {
                warn!(transformation, "selecting an engine before init");
                match (first.take(), entries.first()) {
                    (Some(engine), Some(located)) => Ok((engine, Arc::clone(located.provider()))),
                    _ => first_probed(context, entries, transformation),
                }
            }
        };

        let (engine, provider) = chosen?;
        debug!(transformation, provider = provider.name(), "engine bound");
        *self = Self::Bound { engine, provider };
        Ok(())
    }

    /// Initialize the bound engine, or select and bind one that takes `key`.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn init(
        &mut self,
        context: &CryptoContext,
        algorithm: &str,
        transformation: &str,
        mode: OperationMode,
        key: &Key,
        params: Option<EngineParams<'_>>,
        random: &mut dyn SecureRandom,
    ) -> Result<()> {
        let selected = match self {
            Self::Bound { engine, .. } => {
                check_policy(context, algorithm, engine.as_ref(), key, params)?;
                return engine.init(mode, key, params, random);
            }
            Self::Searching { first, entries } => select_for_key(
                context,
                algorithm,
                first.take(),
                entries,
                mode,
                key,
                params,
                random,
            ),
        };

        let (engine, provider) = selected?;
        debug!(
            transformation,
            provider = provider.name(),
            mode = %mode,
            "engine bound at init"
        );
        *self = Self::Bound { engine, provider };
        Ok(())
    }
}

fn first_probed(
    context: &CryptoContext,
    entries: &[Located],
    transformation: &str,
) -> Result<(Box<dyn TransformEngine>, Arc<Provider>)> {
    let mut failures = Failures::default();
    for located in entries {
        match probe(context.registry(), located) {
            Ok(engine) => return Ok((engine, Arc::clone(located.provider()))),
            Err(err) => failures.record(err),
        }
    }
    Err(failures.into_error(transformation))
}

#[allow(clippy::too_many_arguments)]
fn select_for_key(
    context: &CryptoContext,
    algorithm: &str,
    mut first: Option<Box<dyn TransformEngine>>,
    entries: &[Located],
    mode: OperationMode,
    key: &Key,
    params: Option<EngineParams<'_>>,
    random: &mut dyn SecureRandom,
) -> Result<(Box<dyn TransformEngine>, Arc<Provider>)> {
    let mut key_error: Option<Error> = None;
    let mut other_error: Option<Error> = None;

    for (index, located) in entries.iter().enumerate() {
        let provider = located.provider();
        if !located.service().supports_key(key) {
            debug!(provider = provider.name(), "entry declines key");
            continue;
        }
        if !context.registry().is_trusted(provider) {
            continue;
        }

        let prepared = if index == 0 { first.take() } else { None };
        let attempt = try_entry(context, algorithm, located, prepared, mode, key, params, random);

        match attempt {
            Ok(engine) => return Ok((engine, Arc::clone(provider))),
            Err(err) => {
                debug!(provider = provider.name(), error = %err, "entry failed at init");
                match err {
                    Error::InvalidKey { .. } | Error::InvalidAlgorithmParameter { .. } => {
                        key_error.get_or_insert(err);
                    }
                    other => {
                        other_error.get_or_insert(other);
                    }
                }
            }
        }
    }

    if let Some(err) = key_error {
        return Err(err);
    }
    let message = match other_error {
        Some(err) => format!(
            "no installed provider supports this key: {} ({})",
            key.algorithm(),
            err
        ),
        None => format!("no installed provider supports this key: {}", key.algorithm()),
    };
    Err(Error::invalid_key("provider selection", message))
}

#[allow(clippy::too_many_arguments)]
fn try_entry(
    context: &CryptoContext,
    algorithm: &str,
    located: &Located,
    prepared: Option<Box<dyn TransformEngine>>,
    mode: OperationMode,
    key: &Key,
    params: Option<EngineParams<'_>>,
    random: &mut dyn SecureRandom,
) -> Result<Box<dyn TransformEngine>> {
    let mut engine = match prepared {
        Some(engine) => engine,
        None => probe(context.registry(), located)?,
    };
    check_policy(context, algorithm, engine.as_ref(), key, params)?;
    engine.init(mode, key, params, random)?;
    Ok(engine)
}

/// Key-strength check against the context's policy
pub(crate) fn check_policy(
    context: &CryptoContext,
    algorithm: &str,
    engine: &dyn TransformEngine,
    key: &Key,
    params: Option<EngineParams<'_>>,
) -> Result<()> {
    let key_bits = match engine.key_size(key) {
        Ok(bits) => bits,
        Err(Error::UnsupportedOperation { .. }) => key.encoded().len() * 8,
        Err(err) => return Err(err),
    };
    let spec = params.map(EngineParams::spec);
    if context.policy().is_within_policy(algorithm, key_bits, spec) {
        return Ok(());
    }
    if spec.is_some() {
        Err(Error::invalid_algorithm_parameter(
            "crypto policy",
            "illegal key size or default parameters",
        ))
    } else {
        Err(Error::invalid_key(
            "crypto policy",
            format!("illegal key size: {} bits", key_bits),
        ))
    }
}
