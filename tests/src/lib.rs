//! Shared fixtures for the xform integration tests and benchmarks

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use xform_api::{
    EngineFactory, Key, OperationMode, ParameterSpec, Provider, Result, Service, TransformEngine,
};
use xform_cipher::{Cipher, CryptoContext, ProviderRegistry};
use xform_symmetric::AesEngine;

/// Fresh context holding the given providers, in priority order
pub fn context_with(providers: Vec<Provider>) -> CryptoContext {
    let registry = Arc::new(ProviderRegistry::new());
    for provider in providers {
        registry.add_provider(provider);
    }
    CryptoContext::new(registry)
}

/// Fresh context holding only the built-in provider
pub fn builtin_context() -> CryptoContext {
    context_with(vec![xform_symmetric::provider()])
}

pub fn aes_key(len: usize) -> Key {
    let bytes: Vec<u8> = (0..len as u8).map(|b| b.wrapping_mul(31) ^ 0x5c).collect();
    Key::secret("AES", &bytes)
}

pub fn seeded_rng(seed: u64) -> ChaCha20Rng {
    ChaCha20Rng::seed_from_u64(seed)
}

pub fn iv_spec(byte: u8) -> ParameterSpec {
    ParameterSpec::Iv(vec![byte; 16])
}

pub fn gcm_spec(byte: u8) -> ParameterSpec {
    ParameterSpec::Gcm {
        tag_len_bits: 128,
        iv: vec![byte; 12],
    }
}

/// Cipher from `context`, initialized with `spec` when given
pub fn cipher(
    context: &CryptoContext,
    transformation: &str,
    mode: OperationMode,
    key: &Key,
    spec: Option<&ParameterSpec>,
) -> Cipher {
    let mut cipher = Cipher::get_instance(context, transformation).unwrap();
    match spec {
        Some(spec) => cipher.init_with_spec(mode, key, spec).unwrap(),
        None => cipher.init(mode, key).unwrap(),
    }
    cipher
}

/// Push `input` through `cipher` in pieces of `chunk` bytes, then finalize
pub fn run_chunked(cipher: &mut Cipher, input: &[u8], chunk: usize) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for piece in input.chunks(chunk.max(1)) {
        if let Some(produced) = cipher.update(piece)? {
            out.extend(produced);
        }
    }
    out.extend(cipher.finalize()?);
    Ok(out)
}

/// Counts engines created through [`counting_provider`]
#[derive(Clone, Default)]
pub struct Instances(Arc<AtomicUsize>);

impl Instances {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Provider serving `algorithm` with an AES engine preset to `mode` and
/// `padding`, counting every engine it builds
pub fn counting_provider(
    name: &str,
    algorithm: &str,
    preset: Option<(&'static str, &'static str)>,
) -> (Provider, Instances) {
    let instances = Instances::default();
    let counter = instances.clone();
    let factory = EngineFactory::cipher(move || {
        counter.0.fetch_add(1, Ordering::SeqCst);
        let mut engine = AesEngine::new();
        if let Some((mode, padding)) = preset {
            engine.set_mode(mode)?;
            engine.set_padding(padding)?;
        }
        Ok(Box::new(engine) as Box<dyn TransformEngine>)
    });
    let provider = Provider::builder(name)
        .service(Service::new(algorithm, factory))
        .build();
    (provider, instances)
}
