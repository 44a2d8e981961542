//! Byte-level helpers shared by block mode implementations

use zeroize::Zeroize;

/// XOR `src` into `dst` over their common length
#[inline]
pub fn xor_in_place(dst: &mut [u8], src: &[u8]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d ^= *s;
    }
}

/// Increment a big-endian counter block, wrapping on overflow
#[inline]
pub fn increment_be(counter: &mut [u8]) {
    for byte in counter.iter_mut().rev() {
        let (next, carry) = byte.overflowing_add(1);
        *byte = next;
        if !carry {
            break;
        }
    }
}

/// Round `len` down to a multiple of `block_size`
#[inline]
pub fn floor_blocks(len: usize, block_size: usize) -> usize {
    if block_size == 0 {
        return len;
    }
    len - len % block_size
}

/// Growable byte buffer that wipes released storage
///
/// Holds the partial block an engine carries between calls.
#[derive(Default)]
pub struct Carry {
    data: Vec<u8>,
}

impl Carry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Remove and return the first `n` bytes
    pub fn take_front(&mut self, n: usize) -> Vec<u8> {
        let n = n.min(self.data.len());
        let rest = self.data.split_off(n);
        core::mem::replace(&mut self.data, rest)
    }

    pub fn clear(&mut self) {
        self.data.zeroize();
        self.data.clear();
    }
}

impl Drop for Carry {
    fn drop(&mut self) {
        self.data.zeroize();
    }
}
