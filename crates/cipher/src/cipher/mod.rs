//! The `Cipher` facade
//!
//! A `Cipher` is requested by transformation name. Engine selection happens
//! in two steps: [`Cipher::get_instance`] only proves that some registered
//! entry can serve the transformation, and the binding to one engine is
//! committed by the first `init` (which can skip entries that decline the
//! key) or by a query that needs an engine. Once bound, the facade never
//! switches engines.
//!
//! # Lifecycle
//!
//! `init` may be called at any time and always starts a fresh operation.
//! `update`, `update_aad` and `finalize` require an init for encryption or
//! decryption; `wrap` and `unwrap` require an init for key wrapping or
//! unwrapping. `finalize` returns the facade to its post-init state whether
//! it succeeds or fails, except for a recoverable [`Error::ShortBuffer`],
//! which leaves everything untouched for a retry.
//!
//! # Concurrency
//!
//! The binding sits behind a mutex so that lazy selection from `&self`
//! queries is atomic. Data operations take `&mut self`; sharing one facade
//! between threads for streaming is not supported.

mod binding;


use core::fmt;
use core::ops::Range;
use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::OsRng;
use tracing::debug;
use zeroize::Zeroizing;

use xform_api::cert::KeyUsage;
use xform_api::{
    validate, AlgorithmParameters, Certificate, EngineParams, Error, Key, KeyType,
    OperationMode, ParameterSpec, Provider, Result, SecureRandom, TransformEngine,
};

use crate::buffer::{adapter, ByteBuffer};
use crate::context::CryptoContext;
use crate::locator;
use crate::transform::Transform;

use binding::Binding;

/// Coarse lifecycle of a facade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// No successful init yet, or the last init failed
    Uninitialized,
    /// Initialized; an operation may be in progress
    Initialized,
    /// The last call was a finalize; ready for a new operation with the same key
    Finalized,
}

/// Provider-agnostic cipher facade
pub struct Cipher {
    transformation: String,
    transform: Transform,
    context: CryptoContext,
    binding: Mutex<Binding>,
    lifecycle: Lifecycle,
    mode: Option<OperationMode>,
    aad_open: bool,
}

impl Cipher {
    /// Cipher for `transformation` from the most preferred provider able to serve it
    pub fn get_instance(context: &CryptoContext, transformation: &str) -> Result<Self> {
        let transform = Transform::parse(transformation)?;
        let (engine, entries) =
            locator::first_usable(context.registry(), &transform, transformation)?;
        Ok(Self::new(
            context,
            transformation,
            transform,
            Binding::Searching {
                first: Some(engine),
                entries,
            },
        ))
    }

    /// Cipher for `transformation` from the installed provider named `provider`
    pub fn get_instance_from(
        context: &CryptoContext,
        transformation: &str,
        provider: &str,
    ) -> Result<Self> {
        validate::parameter(!provider.is_empty(), "provider", "missing provider")?;
        let transform = Transform::parse(transformation)?;
        let provider = context
            .registry()
            .provider(provider)
            .ok_or_else(|| Error::NoSuchProvider {
                provider: provider.to_string(),
            })?;
        Self::bind_pinned(context, transformation, transform, provider)
    }

    /// Cipher for `transformation` from `provider`, installed or not
    pub fn get_instance_with(
        context: &CryptoContext,
        transformation: &str,
        provider: Arc<Provider>,
    ) -> Result<Self> {
        let transform = Transform::parse(transformation)?;
        Self::bind_pinned(context, transformation, transform, provider)
    }

    fn bind_pinned(
        context: &CryptoContext,
        transformation: &str,
        transform: Transform,
        provider: Arc<Provider>,
    ) -> Result<Self> {
        let engine =
            locator::from_provider(context.registry(), &transform, transformation, &provider)?;
        Ok(Self::new(
            context,
            transformation,
            transform,
            Binding::Bound { engine, provider },
        ))
    }

    fn new(
        context: &CryptoContext,
        transformation: &str,
        transform: Transform,
        binding: Binding,
    ) -> Self {
        Self {
            transformation: transformation.to_string(),
            transform,
            context: context.clone(),
            binding: Mutex::new(binding),
            lifecycle: Lifecycle::Uninitialized,
            mode: None,
            aad_open: true,
        }
    }

    /// Largest key size in bits the context's policy allows for `transformation`
    pub fn max_allowed_key_length(context: &CryptoContext, transformation: &str) -> Result<usize> {
        let transform = Transform::parse(transformation)?;
        Ok(context.policy().max_allowed_key_bits(transform.algorithm()))
    }

    /// The transformation this cipher was requested with
    pub fn transformation(&self) -> &str {
        &self.transformation
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Operation mode of the last successful init
    pub fn operation_mode(&self) -> Option<OperationMode> {
        self.mode
    }

    /// Provider of the bound engine, binding one if needed
    pub fn provider(&self) -> Result<Arc<Provider>> {
        self.with_engine(|binding| binding.provider().cloned())
    }

    /// Block size in bytes, 0 for stream transforms
    pub fn block_size(&self) -> Result<usize> {
        self.with_engine(|binding| binding.engine().map(|e| e.block_size()))
    }

    /// IV in use, if the engine has one
    pub fn iv(&self) -> Result<Option<Vec<u8>>> {
        self.with_engine(|binding| binding.engine().map(|e| e.iv()))
    }

    /// Parameters in use, including parameters the engine generated
    pub fn parameters(&self) -> Result<Option<AlgorithmParameters>> {
        self.with_engine(|binding| binding.engine().map(|e| e.parameters()))
    }

    /// Upper bound on the output of the next update or finalize given `input_len` more bytes
    pub fn output_size(&self, input_len: usize) -> Result<usize> {
        validate::state(
            self.lifecycle != Lifecycle::Uninitialized,
            "cipher not initialized",
        )?;
        self.with_engine(|binding| binding.engine().map(|e| e.output_size(input_len)))
    }

    fn with_engine<T>(&self, query: impl FnOnce(&Binding) -> Option<T>) -> Result<T> {
        let mut binding = self.binding.lock();
        binding.choose_first(&self.context, &self.transformation)?;
        query(&binding).ok_or(Error::illegal_state("no engine bound"))
    }

    /// Initialize with a key, drawing randomness from the operating system
    pub fn init(&mut self, mode: OperationMode, key: &Key) -> Result<()> {
        self.init_with(mode, key, None, &mut OsRng)
    }

    pub fn init_with_random(
        &mut self,
        mode: OperationMode,
        key: &Key,
        random: &mut dyn SecureRandom,
    ) -> Result<()> {
        self.init_with(mode, key, None, random)
    }

    pub fn init_with_spec(
        &mut self,
        mode: OperationMode,
        key: &Key,
        spec: &ParameterSpec,
    ) -> Result<()> {
        self.init_with(mode, key, Some(EngineParams::Spec(spec)), &mut OsRng)
    }

    pub fn init_with_parameters(
        &mut self,
        mode: OperationMode,
        key: &Key,
        params: &AlgorithmParameters,
    ) -> Result<()> {
        self.init_with(mode, key, Some(EngineParams::Opaque(params)), &mut OsRng)
    }

    /// Initialize with the public key of `certificate`.
    ///
    /// An X.509 certificate with a critical key usage extension must allow
    /// data encipherment for encryption and key encipherment for wrapping.
    pub fn init_with_certificate(
        &mut self,
        mode: OperationMode,
        certificate: &Certificate,
    ) -> Result<()> {
        self.init_with_certificate_and_random(mode, certificate, &mut OsRng)
    }

    pub fn init_with_certificate_and_random(
        &mut self,
        mode: OperationMode,
        certificate: &Certificate,
        random: &mut dyn SecureRandom,
    ) -> Result<()> {
        self.reset_lifecycle();
        if let Some(usage) = certificate.enforced_key_usage() {
            let denied = match mode {
                OperationMode::Encrypt => !usage.allows(KeyUsage::DATA_ENCIPHERMENT),
                OperationMode::WrapKey => !usage.allows(KeyUsage::KEY_ENCIPHERMENT),
                OperationMode::Decrypt | OperationMode::UnwrapKey => false,
            };
            if denied {
                return Err(Error::invalid_key("certificate", "wrong key usage"));
            }
        }
        self.init_with(mode, certificate.public_key(), None, random)
    }

    /// General init: any parameter form and randomness source.
    ///
    /// Discards any operation in progress. On failure the facade is left
    /// uninitialized.
    pub fn init_with(
        &mut self,
        mode: OperationMode,
        key: &Key,
        params: Option<EngineParams<'_>>,
        random: &mut dyn SecureRandom,
    ) -> Result<()> {
        self.reset_lifecycle();
        self.binding.get_mut().init(
            &self.context,
            self.transform.algorithm(),
            &self.transformation,
            mode,
            key,
            params,
            random,
        )?;
        self.lifecycle = Lifecycle::Initialized;
        self.mode = Some(mode);
        self.aad_open = true;
        debug!(transformation = %self.transformation, mode = %mode, "cipher initialized");
        Ok(())
    }

    fn reset_lifecycle(&mut self) {
        self.lifecycle = Lifecycle::Uninitialized;
        self.mode = None;
        self.aad_open = true;
    }

    fn check_data_state(&self) -> Result<()> {
        validate::state(
            self.lifecycle != Lifecycle::Uninitialized,
            "cipher not initialized",
        )?;
        match self.mode {
            Some(mode) if mode.is_data_mode() => Ok(()),
            _ => Err(Error::illegal_state(
                "cipher not initialized for encryption/decryption",
            )),
        }
    }

    fn engine_mut(&mut self) -> Result<&mut dyn TransformEngine> {
        self.binding
            .get_mut()
            .engine_mut()
            .ok_or(Error::illegal_state("no engine bound"))
    }

    /// Data went through the engine: the AAD phase is over
    fn mark_streaming(&mut self) {
        self.lifecycle = Lifecycle::Initialized;
        self.aad_open = false;
    }

    /// A finalize returned: back to the post-init state unless the caller may retry
    fn finish<T>(&mut self, result: Result<T>) -> Result<T> {
        match &result {
            Err(err) if err.is_recoverable() => {}
            _ => {
                self.lifecycle = Lifecycle::Finalized;
                self.aad_open = true;
            }
        }
        result
    }

    /// Continue a multi-part operation.
    ///
    /// Returns `None` for empty input, without calling the engine.
    pub fn update(&mut self, input: &[u8]) -> Result<Option<Vec<u8>>> {
        self.check_data_state()?;
        if input.is_empty() {
            return Ok(None);
        }
        let output = self.engine_mut()?.update_vec(input)?;
        self.mark_streaming();
        Ok(Some(output))
    }

    /// Continue a multi-part operation, writing into `output`
    pub fn update_into(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        self.check_data_state()?;
        if input.is_empty() {
            return Ok(0);
        }
        let written = self.engine_mut()?.update(input, output)?;
        self.mark_streaming();
        Ok(written)
    }

    /// Continue a multi-part operation whose input and output share `buf`.
    ///
    /// Reads `buf[input]` and writes from `buf[output_offset]`; the regions
    /// may overlap.
    pub fn update_in_place(
        &mut self,
        buf: &mut [u8],
        input: Range<usize>,
        output_offset: usize,
    ) -> Result<usize> {
        self.check_data_state()?;
        check_in_place(buf.len(), &input, output_offset)?;
        if input.is_empty() {
            return Ok(0);
        }
        let src = Zeroizing::new(buf[input].to_vec());
        let written = self.engine_mut()?.update(&src, &mut buf[output_offset..])?;
        self.mark_streaming();
        Ok(written)
    }

    /// Continue a multi-part operation between cursor buffers.
    ///
    /// All of `input`'s remaining bytes are consumed and `output` advances
    /// by the returned count. Views of one storage may overlap.
    pub fn update_buffer(&mut self, input: &mut ByteBuffer, output: &mut ByteBuffer) -> Result<usize> {
        self.check_data_state()?;
        if !input.has_remaining() {
            return Ok(0);
        }
        let written = adapter::transfer(self.engine_mut()?, input, output, false)?;
        self.mark_streaming();
        Ok(written)
    }

    /// Supply additional authenticated data.
    ///
    /// Only legal before the first data update of the current operation,
    /// checked even for empty input.
    pub fn update_aad(&mut self, aad: &[u8]) -> Result<()> {
        self.check_data_state()?;
        validate::state(self.aad_open, "AAD must be supplied before data")?;
        if aad.is_empty() {
            return Ok(());
        }
        self.engine_mut()?.update_aad(aad)
    }

    /// Supply the remaining bytes of `aad` as additional authenticated data
    pub fn update_aad_buffer(&mut self, aad: &mut ByteBuffer) -> Result<()> {
        self.check_data_state()?;
        validate::state(self.aad_open, "AAD must be supplied before data")?;
        if !aad.has_remaining() {
            return Ok(());
        }
        let bytes = Zeroizing::new(aad.remaining_bytes());
        self.engine_mut()?.update_aad(&bytes)?;
        aad.exhaust();
        Ok(())
    }

    /// Complete the operation with no further input
    pub fn finalize(&mut self) -> Result<Vec<u8>> {
        self.finalize_with(&[])
    }

    /// Complete the operation with a last piece of input
    pub fn finalize_with(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        self.check_data_state()?;
        let result = self.engine_mut()?.finalize_vec(input);
        self.finish(result)
    }

    /// Complete the operation, writing into `output`
    pub fn finalize_into(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        self.check_data_state()?;
        let result = self.engine_mut()?.finalize(input, output);
        self.finish(result)
    }

    /// Complete the operation with input and output sharing `buf`
    pub fn finalize_in_place(
        &mut self,
        buf: &mut [u8],
        input: Range<usize>,
        output_offset: usize,
    ) -> Result<usize> {
        self.check_data_state()?;
        check_in_place(buf.len(), &input, output_offset)?;
        let src = Zeroizing::new(buf[input].to_vec());
        let result = self
            .engine_mut()?
            .finalize(&src, &mut buf[output_offset..]);
        self.finish(result)
    }

    /// Complete the operation between cursor buffers
    pub fn finalize_buffer(
        &mut self,
        input: &mut ByteBuffer,
        output: &mut ByteBuffer,
    ) -> Result<usize> {
        self.check_data_state()?;
        let result = adapter::transfer(self.engine_mut()?, input, output, true);
        self.finish(result)
    }

    /// Wrap `key` under the key this cipher was initialized with
    pub fn wrap(&mut self, key: &Key) -> Result<Vec<u8>> {
        validate::state(
            self.lifecycle != Lifecycle::Uninitialized,
            "cipher not initialized",
        )?;
        validate::state(
            self.mode == Some(OperationMode::WrapKey),
            "cipher not initialized for wrapping keys",
        )?;
        self.engine_mut()?.wrap(key)
    }

    /// Recover a wrapped key of `key_type` for `algorithm`
    pub fn unwrap(&mut self, wrapped: &[u8], algorithm: &str, key_type: KeyType) -> Result<Key> {
        validate::state(
            self.lifecycle != Lifecycle::Uninitialized,
            "cipher not initialized",
        )?;
        validate::state(
            self.mode == Some(OperationMode::UnwrapKey),
            "cipher not initialized for unwrapping keys",
        )?;
        self.engine_mut()?.unwrap(wrapped, algorithm, key_type)
    }
}

fn check_in_place(len: usize, input: &Range<usize>, output_offset: usize) -> Result<()> {
    validate::parameter(
        input.start <= input.end && input.end <= len,
        "in-place input",
        "input range out of bounds",
    )?;
    validate::parameter(
        output_offset <= len,
        "in-place output",
        "output offset out of bounds",
    )
}

impl fmt::Display for Cipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match (self.lifecycle, self.mode) {
            (Lifecycle::Uninitialized, _) | (_, None) => "not initialized",
            (_, Some(mode)) => mode.describe(),
        };
        let provider = self.binding.lock().provider().map(|p| p.name().to_string());
        write!(
            f,
            "Cipher.{}, mode: {}, algorithm from: {}",
            self.transformation,
            mode,
            provider.as_deref().unwrap_or("(no provider)")
        )
    }
}

impl fmt::Debug for Cipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cipher")
            .field("transformation", &self.transformation)
            .field("lifecycle", &self.lifecycle)
            .field("mode", &self.mode)
            .field("aad_open", &self.aad_open)
            .finish()
    }
}
