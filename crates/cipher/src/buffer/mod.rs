//! Cursor buffers and the buffer-crossing adapter
//!
//! [`ByteBuffer`] is a position/limit view over shared storage. Several views
//! may share one allocation (see [`ByteBuffer::duplicate`] and
//! [`ByteBuffer::slice`]), which is how callers express in-place and
//! overlapping transforms. Heap buffers expose their storage to the adapter;
//! direct buffers do not and are only reachable through `get`/`put`.

pub(crate) mod adapter;


use core::fmt;
use core::ops::Range;
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use xform_api::{Error, Result};

/// Position/limit cursor over a region of shared byte storage
pub struct ByteBuffer {
    storage: Rc<RefCell<Vec<u8>>>,
    offset: usize,
    capacity: usize,
    position: usize,
    limit: usize,
    direct: bool,
}

impl ByteBuffer {
    /// Zero-filled heap buffer
    pub fn allocate(capacity: usize) -> Self {
        Self::from_storage(vec![0u8; capacity], false)
    }

    /// Zero-filled buffer whose storage is not exposed for direct access
    pub fn allocate_direct(capacity: usize) -> Self {
        Self::from_storage(vec![0u8; capacity], true)
    }

    /// Heap buffer over existing bytes, position 0 and limit at the end
    pub fn wrap(bytes: Vec<u8>) -> Self {
        Self::from_storage(bytes, false)
    }

    fn from_storage(bytes: Vec<u8>, direct: bool) -> Self {
        let capacity = bytes.len();
        Self {
            storage: Rc::new(RefCell::new(bytes)),
            offset: 0,
            capacity,
            position: 0,
            limit: capacity,
            direct,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn remaining(&self) -> usize {
        self.limit - self.position
    }

    pub fn has_remaining(&self) -> bool {
        self.position < self.limit
    }

    pub fn is_direct(&self) -> bool {
        self.direct
    }

    /// Whether the storage can be addressed directly
    pub fn has_array(&self) -> bool {
        !self.direct
    }

    /// Offset of this view's index 0 within the shared storage
    pub fn array_offset(&self) -> usize {
        self.offset
    }

    pub fn set_position(&mut self, position: usize) -> Result<()> {
        if position > self.limit {
            return Err(Error::invalid_parameter(
                "buffer position",
                format!("position {} exceeds limit {}", position, self.limit),
            ));
        }
        self.position = position;
        Ok(())
    }

    /// Set the limit, pulling the position back if it lies beyond it
    pub fn set_limit(&mut self, limit: usize) -> Result<()> {
        if limit > self.capacity {
            return Err(Error::invalid_parameter(
                "buffer limit",
                format!("limit {} exceeds capacity {}", limit, self.capacity),
            ));
        }
        self.limit = limit;
        if self.position > limit {
            self.position = limit;
        }
        Ok(())
    }

    /// Limit to the current position, position to zero
    pub fn flip(&mut self) {
        self.limit = self.position;
        self.position = 0;
    }

    pub fn clear(&mut self) {
        self.position = 0;
        self.limit = self.capacity;
    }

    pub fn rewind(&mut self) {
        self.position = 0;
    }

    /// View sharing storage, with the same position, limit and capacity
    pub fn duplicate(&self) -> Self {
        Self {
            storage: Rc::clone(&self.storage),
            offset: self.offset,
            capacity: self.capacity,
            position: self.position,
            limit: self.limit,
            direct: self.direct,
        }
    }

    /// View sharing storage that covers only this buffer's remaining bytes
    pub fn slice(&self) -> Self {
        let remaining = self.remaining();
        Self {
            storage: Rc::clone(&self.storage),
            offset: self.offset + self.position,
            capacity: remaining,
            position: 0,
            limit: remaining,
            direct: self.direct,
        }
    }

    /// Copy `bytes` in at the position and advance it
    pub fn put(&mut self, bytes: &[u8]) -> Result<()> {
        xform_api::validate::output_capacity(self.remaining(), bytes.len())?;
        let start = self.absolute(self.position);
        self.storage.borrow_mut()[start..start + bytes.len()].copy_from_slice(bytes);
        self.position += bytes.len();
        Ok(())
    }

    /// Fill `dst` from the position and advance it
    pub fn get(&mut self, dst: &mut [u8]) -> Result<()> {
        if dst.len() > self.remaining() {
            return Err(Error::invalid_parameter(
                "buffer read",
                format!("{} bytes requested, {} remaining", dst.len(), self.remaining()),
            ));
        }
        let start = self.absolute(self.position);
        dst.copy_from_slice(&self.storage.borrow()[start..start + dst.len()]);
        self.position += dst.len();
        Ok(())
    }

    /// Copy of the bytes between position and limit, without moving
    pub fn remaining_bytes(&self) -> Vec<u8> {
        self.storage.borrow()[self.remaining_region()].to_vec()
    }

    /// Copy of the bytes between 0 and the position, without moving
    pub fn written_bytes(&self) -> Vec<u8> {
        let start = self.absolute(0);
        self.storage.borrow()[start..start + self.position].to_vec()
    }

    fn absolute(&self, index: usize) -> usize {
        self.offset + index
    }

    /// Storage range between position and limit
    pub(crate) fn remaining_region(&self) -> Range<usize> {
        self.absolute(self.position)..self.absolute(self.limit)
    }

    /// Storage range of the next `len` bytes from the position
    pub(crate) fn region_from_position(&self, len: usize) -> Range<usize> {
        let start = self.absolute(self.position);
        start..start + len
    }

    pub(crate) fn shares_storage(&self, other: &ByteBuffer) -> bool {
        Rc::ptr_eq(&self.storage, &other.storage)
    }

    pub(crate) fn storage(&self) -> Ref<'_, Vec<u8>> {
        self.storage.borrow()
    }

    pub(crate) fn storage_mut(&self) -> RefMut<'_, Vec<u8>> {
        self.storage.borrow_mut()
    }

    pub(crate) fn advance(&mut self, n: usize) {
        self.position = (self.position + n).min(self.limit);
    }

    pub(crate) fn exhaust(&mut self) {
        self.position = self.limit;
    }
}

impl fmt::Debug for ByteBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteBuffer")
            .field("position", &self.position)
            .field("limit", &self.limit)
            .field("capacity", &self.capacity)
            .field("direct", &self.direct)
            .finish()
    }
}
