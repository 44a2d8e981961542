use std::io::{self, Write};

use tracing::warn;
use zeroize::{Zeroize, Zeroizing};

use super::{detached, ensure_capacity, into_io, is_discardable};
use crate::{Cipher, StreamConfig};

/// Writer that passes data through a cipher into a sink
///
/// Every write is processed immediately in pieces of at most `chunk_size`
/// bytes and whatever the cipher produces is forwarded. Input the cipher is
/// still holding, such as a partial block, only reaches the sink on
/// [`close`](CipherWriter::close).
pub struct CipherWriter<W: Write> {
    parts: Option<(W, Cipher)>,
    config: StreamConfig,
    buffer: Zeroizing<Vec<u8>>,
    closed: bool,
}

impl<W: Write> CipherWriter<W> {
    /// Wrap `inner`; `cipher` must already be initialized
    pub fn new(inner: W, cipher: Cipher) -> Self {
        Self::with_config(inner, cipher, StreamConfig::default())
    }

    pub fn with_config(inner: W, cipher: Cipher, config: StreamConfig) -> Self {
        Self {
            parts: Some((inner, cipher)),
            config,
            buffer: Zeroizing::new(Vec::new()),
            closed: false,
        }
    }

    /// Finalize the cipher, forward the last output and flush the sink.
    ///
    /// A cryptographic failure of the finalize is discarded unless
    /// `verify_on_close` is set. I/O failures are always reported.
    pub fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let (inner, cipher) = self.parts.as_mut().ok_or_else(detached)?;
        let finished = ensure_capacity(cipher, &mut self.buffer, 0)
            .and_then(|_| cipher.finalize_into(&[], &mut self.buffer));

        let outcome = match finished {
            Ok(n) => {
                if n > 0 {
                    inner.write_all(&self.buffer[..n])?;
                }
                Ok(())
            }
            Err(err) if is_discardable(&err) && !self.config.verify_on_close => {
                warn!(error = %err, "discarding cipher failure on close");
                Ok(())
            }
            Err(err) => Err(into_io(err)),
        };
        self.buffer.zeroize();
        outcome?;
        inner.flush()
    }

    /// Take back the sink and the cipher without finalizing
    pub fn into_parts(mut self) -> io::Result<(W, Cipher)> {
        self.closed = true;
        self.parts.take().ok_or_else(detached)
    }
}

impl<W: Write> Write for CipherWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.closed {
            return Err(io::Error::new(io::ErrorKind::Other, "stream closed"));
        }
        if buf.is_empty() {
            return Ok(0);
        }
        let (inner, cipher) = self.parts.as_mut().ok_or_else(detached)?;
        for piece in buf.chunks(self.config.chunk_size.max(1)) {
            ensure_capacity(cipher, &mut self.buffer, piece.len()).map_err(into_io)?;
            let n = cipher
                .update_into(piece, &mut self.buffer)
                .map_err(into_io)?;
            if n > 0 {
                inner.write_all(&self.buffer[..n])?;
            }
        }
        Ok(buf.len())
    }

    /// Flush only what the cipher has already produced
    fn flush(&mut self) -> io::Result<()> {
        match self.parts.as_mut() {
            Some((inner, _)) => inner.flush(),
            None => Err(detached()),
        }
    }
}

impl<W: Write> Drop for CipherWriter<W> {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!(error = %err, "cipher writer failed to close");
        }
    }
}
