//! Trait definition for cipher transform engines
//!
//! An engine performs the cryptographic work for one algorithm family. The
//! dispatcher instantiates it through a registered factory, applies any mode
//! and padding left over from name resolution, initializes it, and then
//! drives it with update/finalize calls.

use crate::{
    AlgorithmParameters, EngineParams, Error, Key, KeyType, OperationMode, Result, SecureRandom,
};

/// Capability implemented by every cipher engine.
///
/// # Contract
///
/// - `update` and `finalize` must not write more than [`output_size`] bytes
///   for the same input length, and must fail with
///   [`Error::ShortBuffer`] before writing anything when `output` is too small
///   for what they would actually produce.
/// - `finalize` must leave the engine in its post-init state whether it
///   succeeds or fails, so the same key and parameters can be reused.
/// - Optional capabilities default to [`Error::UnsupportedOperation`].
///
/// [`output_size`]: TransformEngine::output_size
pub trait TransformEngine: Send {
    /// Select the chaining mode left over from name resolution
    fn set_mode(&mut self, mode: &str) -> Result<()> {
        Err(Error::no_such_algorithm(format!("unsupported mode {}", mode)))
    }

    /// Select the padding scheme left over from name resolution
    fn set_padding(&mut self, padding: &str) -> Result<()> {
        Err(Error::NoSuchPadding {
            padding: padding.to_string(),
        })
    }

    /// Block size in bytes, 0 for stream transforms
    fn block_size(&self) -> usize;

    /// Upper bound on the output of the next update or finalize given
    /// `input_len` more bytes, including buffered input, padding and tag.
    fn output_size(&self, input_len: usize) -> usize;

    /// Initialization vector in use, if any
    fn iv(&self) -> Option<Vec<u8>>;

    /// Parameters in use, including ones the engine generated itself
    fn parameters(&self) -> Option<AlgorithmParameters>;

    /// Initialize (or re-initialize) for `mode`, discarding any buffered state
    fn init(
        &mut self,
        mode: OperationMode,
        key: &Key,
        params: Option<EngineParams<'_>>,
        random: &mut dyn SecureRandom,
    ) -> Result<()>;

    /// Feed additional authenticated data
    fn update_aad(&mut self, _aad: &[u8]) -> Result<()> {
        Err(Error::unsupported("updateAAD"))
    }

    /// Process `input` into `output`, returning the number of bytes written
    fn update(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize>;

    /// Process `input`, returning the produced bytes
    fn update_vec(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        let mut output = vec![0u8; self.output_size(input.len())];
        let written = self.update(input, &mut output)?;
        output.truncate(written);
        Ok(output)
    }

    /// Process `input` plus everything buffered and complete the operation
    fn finalize(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize>;

    /// Complete the operation, returning the produced bytes
    fn finalize_vec(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        let mut output = vec![0u8; self.output_size(input.len())];
        let written = self.finalize(input, &mut output)?;
        output.truncate(written);
        Ok(output)
    }

    /// Wrap a key under the initialized wrapping key
    fn wrap(&mut self, _key: &Key) -> Result<Vec<u8>> {
        Err(Error::unsupported("wrap"))
    }

    /// Recover a key wrapped by [`TransformEngine::wrap`]
    fn unwrap(&mut self, _wrapped: &[u8], _algorithm: &str, _key_type: KeyType) -> Result<Key> {
        Err(Error::unsupported("unwrap"))
    }

    /// Effective size of `key` in bits
    fn key_size(&self, _key: &Key) -> Result<usize> {
        Err(Error::unsupported("keySize"))
    }
}
