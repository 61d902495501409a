//! Growable input buffer for staging incoming request bytes.
//!
//! The buffer hands out writable spans and tracks how much of its
//! capacity is in use. Growth at least doubles the current capacity, so a
//! sequence of small reservations settles into amortized constant cost.
//! Allocation failure is reported as resource exhaustion instead of
//! aborting.

use crate::error::{CoreError, CoreResult};

/// A growable byte buffer with explicit reserve and advance steps.
#[derive(Debug, Default)]
pub struct InputBuf {
    bytes: Vec<u8>,
    used: usize,
}

impl InputBuf {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a buffer with initial capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
            used: 0,
        }
    }

    /// Returns the number of bytes committed so far.
    #[must_use]
    pub fn used(&self) -> usize {
        self.used
    }

    /// Returns the committed bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes[..self.used]
    }

    /// Returns the current capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }

    /// Makes room for `size` more bytes and returns the writable span.
    ///
    /// Committed bytes survive growth. The returned span is zeroed and
    /// exactly `size` bytes long; call [`InputBuf::advance`] after filling
    /// it to commit.
    ///
    /// # Errors
    ///
    /// Reports resource exhaustion when the allocator refuses the new
    /// capacity.
    pub fn reserve(&mut self, size: usize) -> CoreResult<&mut [u8]> {
        let needed = self.used + size;
        if needed > self.bytes.capacity() {
            // At least double so repeated small reserves stay cheap.
            let target = needed.max(self.bytes.capacity() * 2);
            let additional = target - self.bytes.len();
            self.bytes
                .try_reserve(additional)
                .map_err(|_| CoreError::ResourceExhausted { requested: size })?;
        }
        self.bytes.resize(needed, 0);
        Ok(&mut self.bytes[self.used..needed])
    }

    /// Commits `size` bytes of the most recent reservation.
    ///
    /// # Errors
    ///
    /// Reports an invalid operation when advancing past what was reserved.
    pub fn advance(&mut self, size: usize) -> CoreResult<()> {
        let committed = self.used + size;
        if committed > self.bytes.len() {
            return Err(CoreError::invalid_operation(format!(
                "advance of {size} byte(s) passes the reserved end"
            )));
        }
        self.used = committed;
        Ok(())
    }

    /// Discards committed bytes, keeping the allocation.
    pub fn reset(&mut self) {
        self.bytes.clear();
        self.used = 0;
    }
}
