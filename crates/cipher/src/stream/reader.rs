use std::io::{self, Read};

use tracing::warn;
use zeroize::{Zeroize, Zeroizing};

use xform_api::Result;

use super::{detached, ensure_capacity, into_io, is_discardable};
use crate::{Cipher, StreamConfig};

/// Where a [`CipherReader`] stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadState {
    /// Nothing pending; the next read pulls from the source
    Filling,
    /// Produced bytes are waiting to be delivered
    Draining,
    /// The source ended and everything has been delivered
    Exhausted,
}

/// Reader that passes a source through a cipher
///
/// Each fill pulls up to `chunk_size` bytes from the source and runs them
/// through `update`; at end of source the cipher is finalized. A read never
/// returns 0 while more data may still arrive.
pub struct CipherReader<R: Read> {
    parts: Option<(R, Cipher)>,
    config: StreamConfig,
    chunk: Zeroizing<Vec<u8>>,
    pending: Zeroizing<Vec<u8>>,
    start: usize,
    end: usize,
    state: ReadState,
    done: bool,
    closed: bool,
}

impl<R: Read> CipherReader<R> {
    /// Wrap `inner`; `cipher` must already be initialized
    pub fn new(inner: R, cipher: Cipher) -> Self {
        Self::with_config(inner, cipher, StreamConfig::default())
    }

    pub fn with_config(inner: R, cipher: Cipher, config: StreamConfig) -> Self {
        Self {
            parts: Some((inner, cipher)),
            chunk: Zeroizing::new(vec![0u8; config.chunk_size.max(1)]),
            config,
            pending: Zeroizing::new(Vec::new()),
            start: 0,
            end: 0,
            state: ReadState::Filling,
            done: false,
            closed: false,
        }
    }

    pub fn state(&self) -> ReadState {
        self.state
    }

    /// Bytes produced but not yet delivered
    pub fn pending(&self) -> usize {
        self.end - self.start
    }

    /// Pull from the source until output is produced or the source ends.
    ///
    /// Returns false once everything has been delivered.
    fn fill(&mut self) -> io::Result<bool> {
        loop {
            if self.done {
                self.state = ReadState::Exhausted;
                return Ok(false);
            }
            let (inner, cipher) = self.parts.as_mut().ok_or_else(detached)?;

            let read = loop {
                match inner.read(&mut self.chunk) {
                    Ok(n) => break n,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e),
                }
            };

            let produced = if read == 0 {
                self.done = true;
                ensure_capacity(cipher, &mut self.pending, 0).map_err(into_io)?;
                cipher
                    .finalize_into(&[], &mut self.pending)
                    .map_err(into_io)?
            } else {
                ensure_capacity(cipher, &mut self.pending, read).map_err(into_io)?;
                cipher
                    .update_into(&self.chunk[..read], &mut self.pending)
                    .map_err(into_io)?
            };

            self.start = 0;
            self.end = produced;
            if produced > 0 {
                self.state = ReadState::Draining;
                return Ok(true);
            }
        }
    }

    /// Finish the stream early.
    ///
    /// If the source was not read to the end the cipher is still finalized;
    /// a cryptographic failure from that finalize is discarded unless
    /// `verify_on_close` is set.
    pub fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let result = if self.done {
            Ok(())
        } else {
            self.done = true;
            match self.parts.as_mut() {
                Some((_, cipher)) => finish_early(cipher, &mut self.pending),
                None => Ok(()),
            }
        };
        self.state = ReadState::Exhausted;
        self.start = 0;
        self.end = 0;
        self.pending.zeroize();

        match result {
            Ok(()) => Ok(()),
            Err(err) if is_discardable(&err) && !self.config.verify_on_close => {
                warn!(error = %err, "discarding cipher failure on early close");
                Ok(())
            }
            Err(err) => Err(into_io(err)),
        }
    }

    /// Take back the source and the cipher without finalizing
    pub fn into_parts(mut self) -> io::Result<(R, Cipher)> {
        self.closed = true;
        self.parts.take().ok_or_else(detached)
    }
}

fn finish_early(cipher: &mut Cipher, pending: &mut Zeroizing<Vec<u8>>) -> Result<()> {
    ensure_capacity(cipher, pending, 0)?;
    cipher.finalize_into(&[], pending)?;
    Ok(())
}

impl<R: Read> Read for CipherReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.closed {
            return Ok(0);
        }
        if self.start >= self.end && !self.fill()? {
            return Ok(0);
        }
        if buf.is_empty() {
            return Ok(0);
        }

        let n = buf.len().min(self.end - self.start);
        buf[..n].copy_from_slice(&self.pending[self.start..self.start + n]);
        self.start += n;
        if self.start >= self.end {
            self.state = if self.done {
                ReadState::Exhausted
            } else {
                ReadState::Filling
            };
        }
        Ok(n)
    }
}

impl<R: Read> Drop for CipherReader<R> {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!(error = %err, "cipher reader failed to close");
        }
    }
}
