//! Streaming adapters over a [`Cipher`](crate::Cipher)
//!
//! [`CipherReader`] transforms bytes pulled from a source and
//! [`CipherWriter`] transforms bytes pushed to a sink. Both finalize the
//! cipher at the end of the data. Cryptographic failures surface as
//! `std::io::Error` values of kind `InvalidData` wrapping the [`Error`].
//!
//! # Closing early
//!
//! Closing or dropping an adapter before the data is complete still
//! finalizes the cipher to release its state. A failure of that finalize is
//! discarded unless [`StreamConfig::verify_on_close`] is set. With AEAD
//! decryption this hides an authentication failure on a stream that was
//! abandoned before its end; turn verification on when that matters.
//!
//! [`StreamConfig::verify_on_close`]: crate::StreamConfig::verify_on_close

mod reader;
mod writer;


use std::io;

use zeroize::Zeroizing;

use xform_api::{Error, Result};

use crate::Cipher;

pub use reader::{CipherReader, ReadState};
pub use writer::CipherWriter;

/// Map a dispatcher error onto the I/O error channel
pub(crate) fn into_io(err: Error) -> io::Error {
    let kind = if err.is_crypto_failure() {
        io::ErrorKind::InvalidData
    } else {
        io::ErrorKind::Other
    };
    io::Error::new(kind, err)
}

/// Make `buffer` large enough for the output of `len` more input bytes.
///
/// A buffer that is too small is replaced, not grown; the old contents are
/// wiped on drop.
pub(crate) fn ensure_capacity(
    cipher: &Cipher,
    buffer: &mut Zeroizing<Vec<u8>>,
    len: usize,
) -> Result<()> {
    let required = cipher.output_size(len)?;
    if buffer.len() < required {
        *buffer = Zeroizing::new(vec![0u8; required]);
    }
    Ok(())
}

/// Failures a best-effort close may discard
pub(crate) fn is_discardable(err: &Error) -> bool {
    err.is_crypto_failure() || err.is_recoverable()
}

fn detached() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "stream already taken apart")
}
