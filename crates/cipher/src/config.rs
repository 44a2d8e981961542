//! Stream adapter configuration

/// Default number of bytes pulled from a source per fill
pub const DEFAULT_CHUNK_SIZE: usize = 512;

/// Settings shared by [`CipherReader`](crate::CipherReader) and
/// [`CipherWriter`](crate::CipherWriter)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StreamConfig {
    /// Bytes read from the source, or fed to the cipher, per step
    pub chunk_size: usize,
    /// Report cryptographic failures raised while closing early.
    ///
    /// Off by default: an abandoned stream discards a failed finalize
    /// silently. For AEAD decryption this means an authentication failure
    /// on a stream that was not read to the end goes unreported.
    pub verify_on_close: bool,
}

impl StreamConfig {
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn verify_on_close(mut self, verify: bool) -> Self {
        self.verify_on_close = verify;
        self
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            verify_on_close: false,
        }
    }
}
