//! Trait definition for message authentication engines

use crate::{EngineParams, Error, Key, Result};

/// Capability implemented by every MAC engine.
pub trait MacEngine: Send {
    /// Length of the produced tag in bytes
    fn mac_len(&self) -> usize;

    /// Initialize with a key, discarding any accumulated input
    fn init(&mut self, key: &Key, params: Option<EngineParams<'_>>) -> Result<()>;

    /// Absorb input
    fn update(&mut self, input: &[u8]);

    /// Produce the tag and return to the post-init state
    fn finalize(&mut self) -> Result<Vec<u8>>;

    /// Discard accumulated input, keeping the key
    fn reset(&mut self);

    /// Independent deep copy of the engine, accumulated state included.
    ///
    /// The copy must share no buffers with `self`.
    fn duplicate(&self) -> Result<Box<dyn MacEngine>> {
        Err(Error::unsupported("duplicate"))
    }
}
