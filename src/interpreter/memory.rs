use crate::error::{ErrorCode, Exception};
use crate::types::U256;

/// Linear byte-addressed memory of a call.
pub trait Memory {
    /// Copy of `length` bytes at `offset`, growing the memory to cover them.
    fn read(&mut self, offset: U256, length: U256) -> Result<Vec<u8>, Exception>;

    /// Write `value` at `offset`, growing the memory to cover it.
    fn write(&mut self, offset: U256, value: &[u8]) -> Result<(), Exception>;

    /// Number of addressable bytes; grows with every access and never shrinks.
    fn capacity(&self) -> u64;
}

/// Memory growing on demand up to a fixed maximum.
///
/// Zero-length accesses never grow the memory, whatever their offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicMemory {
    slice: Vec<u8>,
    max_capacity: u64,
}

impl DynamicMemory {
    /// Zeroed memory of `initial_capacity` bytes, capped at `max_capacity`.
    pub fn new(initial_capacity: u64, max_capacity: u64) -> Self {
        let initial = usize::try_from(initial_capacity.min(max_capacity)).unwrap_or_default();

        Self {
            slice: vec![0; initial],
            max_capacity,
        }
    }

    /// Largest capacity the memory may grow to.
    pub const fn max_capacity(&self) -> u64 {
        self.max_capacity
    }

    /// Grow to cover `[offset, offset + length)` and return it as a range.
    pub(crate) fn ensure(
        &mut self,
        offset: U256,
        length: U256,
    ) -> Result<(usize, usize), Exception> {
        if length.is_zero() {
            return Ok((0, 0));
        }

        let end = offset
            .checked_add(length)
            .filter(|end| *end <= U256::from(self.max_capacity))
            .ok_or_else(|| {
                Exception::with_context(
                    ErrorCode::MemoryOutOfBounds,
                    format_args!(
                        "access of {} bytes at {} exceeds the maximum of {} bytes",
                        length, offset, self.max_capacity
                    ),
                )
            })?;

        let (start, end) = (offset.as_usize(), end.as_usize());

        if end > self.slice.len() {
            self.slice.resize(end, 0);
        }

        Ok((start, end))
    }
}

impl Memory for DynamicMemory {
    fn read(&mut self, offset: U256, length: U256) -> Result<Vec<u8>, Exception> {
        let (start, end) = self.ensure(offset, length)?;

        Ok(self.slice[start..end].to_vec())
    }

    fn write(&mut self, offset: U256, value: &[u8]) -> Result<(), Exception> {
        let (start, end) = self.ensure(offset, U256::from(value.len()))?;

        self.slice[start..end].copy_from_slice(value);

        Ok(())
    }

    fn capacity(&self) -> u64 {
        self.slice.len() as u64
    }
}
