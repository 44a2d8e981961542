//! Engines and providers used by the unit tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use xform_api::provider::{SUPPORTED_KEY_FORMATS, SUPPORTED_MODES, SUPPORTED_PADDINGS};
use xform_api::{
    validate, AlgorithmParameters, EngineFactory, EngineParams, Error, Key, KeyType, MacEngine,
    OperationMode, ParameterSpec, Provider, Result, SecureRandom, Service, TransformEngine,
};

use crate::{CryptoContext, ProviderRegistry};

pub(crate) const XOR_KEY: &[u8] = &[0x5a, 0xa5, 0x3c, 0xc3];

pub(crate) fn xor_key() -> Key {
    Key::secret("XOR", XOR_KEY)
}

fn xor_into(key: &[u8], offset: usize, src: &[u8], dst: &mut [u8]) {
    for (i, (d, s)) in dst.iter_mut().zip(src).enumerate() {
        *d = s ^ key[(offset + i) % key.len()];
    }
}

/// Shared call counter, bumped by every data call an engine receives
#[derive(Debug, Default, Clone)]
pub(crate) struct Calls(Arc<AtomicUsize>);

impl Calls {
    pub(crate) fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Stream engine: repeating-key XOR, accepts mode `CTR` and padding `NoPadding`
pub(crate) struct XorEngine {
    key: Vec<u8>,
    offset: usize,
    iv: Option<Vec<u8>>,
    aad: Vec<u8>,
    calls: Calls,
}

impl XorEngine {
    pub(crate) fn new(calls: Calls) -> Self {
        Self {
            key: Vec::new(),
            offset: 0,
            iv: None,
            aad: Vec::new(),
            calls,
        }
    }
}

impl TransformEngine for XorEngine {
    fn set_mode(&mut self, mode: &str) -> Result<()> {
        if mode.eq_ignore_ascii_case("CTR") {
            Ok(())
        } else {
            Err(Error::no_such_algorithm(format!("unsupported mode {}", mode)))
        }
    }

    fn set_padding(&mut self, padding: &str) -> Result<()> {
        if padding.eq_ignore_ascii_case("NoPadding") {
            Ok(())
        } else {
            Err(Error::NoSuchPadding {
                padding: padding.to_string(),
            })
        }
    }

    fn block_size(&self) -> usize {
        0
    }

    fn output_size(&self, input_len: usize) -> usize {
        input_len
    }

    fn iv(&self) -> Option<Vec<u8>> {
        self.iv.clone()
    }

    fn parameters(&self) -> Option<AlgorithmParameters> {
        self.iv
            .as_ref()
            .map(|iv| AlgorithmParameters::new("XOR", ParameterSpec::Iv(iv.clone())))
    }

    fn init(
        &mut self,
        _mode: OperationMode,
        key: &Key,
        params: Option<EngineParams<'_>>,
        _random: &mut dyn SecureRandom,
    ) -> Result<()> {
        if key.algorithm() != "XOR" || key.encoded().is_empty() {
            return Err(Error::invalid_key("XOR", "wrong key"));
        }
        self.iv = match params.map(EngineParams::spec) {
            None => None,
            Some(ParameterSpec::Iv(iv)) => Some(iv.clone()),
            Some(_) => {
                return Err(Error::invalid_algorithm_parameter(
                    "XOR",
                    "only IV parameters accepted",
                ))
            }
        };
        self.key = key.encoded().to_vec();
        self.offset = 0;
        self.aad.clear();
        Ok(())
    }

    fn update_aad(&mut self, aad: &[u8]) -> Result<()> {
        self.calls.bump();
        self.aad.extend_from_slice(aad);
        Ok(())
    }

    fn update(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        self.calls.bump();
        validate::output_capacity(output.len(), input.len())?;
        xor_into(&self.key, self.offset, input, output);
        self.offset += input.len();
        Ok(input.len())
    }

    fn finalize(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        self.calls.bump();
        validate::output_capacity(output.len(), input.len())?;
        xor_into(&self.key, self.offset, input, output);
        self.offset = 0;
        self.aad.clear();
        Ok(input.len())
    }

    fn wrap(&mut self, key: &Key) -> Result<Vec<u8>> {
        self.calls.bump();
        let mut out = vec![0u8; key.encoded().len()];
        xor_into(&self.key, 0, key.encoded(), &mut out);
        Ok(out)
    }

    fn unwrap(&mut self, wrapped: &[u8], algorithm: &str, key_type: KeyType) -> Result<Key> {
        self.calls.bump();
        let mut out = vec![0u8; wrapped.len()];
        xor_into(&self.key, 0, wrapped, &mut out);
        Ok(Key::new(key_type, algorithm, Some("RAW".into()), &out))
    }

    fn key_size(&self, key: &Key) -> Result<usize> {
        Ok(key.encoded().len() * 8)
    }
}

pub(crate) const BLOCK: usize = 4;

/// Unpadded block engine: XOR per block, buffers partial blocks
pub(crate) struct BlockEngine {
    key: Vec<u8>,
    pending: Vec<u8>,
}

impl BlockEngine {
    pub(crate) fn new() -> Self {
        Self {
            key: Vec::new(),
            pending: Vec::new(),
        }
    }
}

impl TransformEngine for BlockEngine {
    fn block_size(&self) -> usize {
        BLOCK
    }

    fn output_size(&self, input_len: usize) -> usize {
        self.pending.len() + input_len
    }

    fn iv(&self) -> Option<Vec<u8>> {
        None
    }

    fn parameters(&self) -> Option<AlgorithmParameters> {
        None
    }

    fn init(
        &mut self,
        _mode: OperationMode,
        key: &Key,
        _params: Option<EngineParams<'_>>,
        _random: &mut dyn SecureRandom,
    ) -> Result<()> {
        self.key = key.encoded().to_vec();
        self.pending.clear();
        Ok(())
    }

    fn update(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        let total = self.pending.len() + input.len();
        let emit = total / BLOCK * BLOCK;
        validate::output_capacity(output.len(), emit)?;
        let mut joined = std::mem::take(&mut self.pending);
        joined.extend_from_slice(input);
        xor_into(&self.key, 0, &joined[..emit], output);
        self.pending = joined.split_off(emit);
        Ok(emit)
    }

    fn finalize(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        let total = self.pending.len() + input.len();
        if total % BLOCK != 0 {
            self.pending.clear();
            return Err(Error::illegal_block_size(
                "block",
                "input length not a multiple of the block size",
            ));
        }
        validate::output_capacity(output.len(), total)?;
        let mut joined = std::mem::take(&mut self.pending);
        joined.extend_from_slice(input);
        xor_into(&self.key, 0, &joined, output);
        Ok(total)
    }
}

/// Tag is the input length followed by a keyed byte sum
pub(crate) struct SumMac {
    key: u8,
    len: u32,
    sum: u32,
}

impl SumMac {
    pub(crate) fn new() -> Self {
        Self {
            key: 0,
            len: 0,
            sum: 0,
        }
    }
}

impl MacEngine for SumMac {
    fn mac_len(&self) -> usize {
        8
    }

    fn init(&mut self, key: &Key, params: Option<EngineParams<'_>>) -> Result<()> {
        if params.is_some() {
            return Err(Error::invalid_algorithm_parameter("SumMac", "no parameters"));
        }
        self.key = *key
            .encoded()
            .first()
            .ok_or_else(|| Error::invalid_key("SumMac", "empty key"))?;
        self.reset();
        Ok(())
    }

    fn update(&mut self, input: &[u8]) {
        self.len += input.len() as u32;
        for b in input {
            self.sum = self.sum.wrapping_add(u32::from(*b ^ self.key));
        }
    }

    fn finalize(&mut self) -> Result<Vec<u8>> {
        let mut tag = self.len.to_be_bytes().to_vec();
        tag.extend_from_slice(&self.sum.to_be_bytes());
        self.reset();
        Ok(tag)
    }

    fn reset(&mut self) {
        self.len = 0;
        self.sum = 0;
    }

    fn duplicate(&self) -> Result<Box<dyn MacEngine>> {
        Ok(Box::new(Self {
            key: self.key,
            len: self.len,
            sum: self.sum,
        }))
    }
}

pub(crate) fn xor_service(key: &str, calls: &Calls) -> Service {
    let calls = calls.clone();
    Service::new(
        key,
        EngineFactory::cipher(move || {
            Ok(Box::new(XorEngine::new(calls.clone())) as Box<dyn TransformEngine>)
        }),
    )
}

pub(crate) fn block_service(key: &str) -> Service {
    Service::new(
        key,
        EngineFactory::cipher(|| {
            Ok(Box::new(BlockEngine::new()) as Box<dyn TransformEngine>)
        }),
    )
}

pub(crate) fn mac_service(key: &str) -> Service {
    Service::new(
        key,
        EngineFactory::mac(|| Ok(Box::new(SumMac::new()) as Box<dyn MacEngine>)),
    )
}

/// Provider offering `XOR` (with mode/padding attributes), `BLK` and `SUM`
pub(crate) fn mock_provider(name: &str, calls: &Calls) -> Provider {
    Provider::builder(name)
        .info("test engines")
        .service(
            xor_service("XOR", calls)
                .with_attribute(SUPPORTED_MODES, "CTR")
                .with_attribute(SUPPORTED_PADDINGS, "NOPADDING")
                .with_attribute(SUPPORTED_KEY_FORMATS, "RAW"),
        )
        .service(block_service("BLK"))
        .service(mac_service("SUM"))
        .build()
}

pub(crate) fn context_with(providers: Vec<Provider>) -> CryptoContext {
    let registry = ProviderRegistry::new();
    for provider in providers {
        registry.add_provider(provider);
    }
    CryptoContext::new(Arc::new(registry))
}

/// Context holding one mock provider named `Mock`, plus its call counter
pub(crate) fn mock_context() -> (CryptoContext, Calls) {
    let calls = Calls::default();
    (context_with(vec![mock_provider("Mock", &calls)]), calls)
}
