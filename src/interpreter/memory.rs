use std::ops::Range;

use crate::types::types::WORD_SIZE;

use super::errors::RuntimeError;

/// Address `0` is never handed out.
pub const NULL: i64 = 0;

/// Fill byte of freshly allocated storage.
const POISON: u8 = 0xAA;

/// Default cap on the bytes a run may hold at once: 64 MiB.
pub const DEFAULT_MEMORY_LIMIT: usize = 64 << 20;

/// Flat byte memory with stack-like allocation.
///
/// Words are little-endian `i64`. Allocations are rounded up to whole words
/// and released in bulk back to a [`Memory::mark`].
#[derive(Debug)]
pub struct Memory {
    bytes: Vec<u8>,
    limit: usize,
}

impl Default for Memory {
    fn default() -> Self {
        Memory::new()
    }
}

impl Memory {
    pub fn new() -> Self {
        Memory::with_limit(DEFAULT_MEMORY_LIMIT)
    }

    /// Memory that never grows past `limit` bytes, the reserved null word
    /// included.
    pub fn with_limit(limit: usize) -> Self {
        Memory {
            bytes: vec![0; WORD_SIZE as usize],
            limit,
        }
    }

    /// Reserves `size` bytes and returns their address.
    ///
    /// # Returns
    ///
    /// The address, or `OutOfMemory` if the rounded request would take the
    /// memory past its limit.
    pub fn allocate(&mut self, size: u64) -> Result<i64, RuntimeError> {
        let address = self.bytes.len();
        let out_of_memory = || RuntimeError::OutOfMemory {
            requested: size,
            limit: self.limit,
        };

        let end = size
            .div_ceil(WORD_SIZE)
            .max(1)
            .checked_mul(WORD_SIZE)
            .and_then(|bytes| usize::try_from(bytes).ok())
            .and_then(|bytes| address.checked_add(bytes))
            .filter(|end| *end <= self.limit)
            .ok_or_else(out_of_memory)?;

        self.bytes.resize(end, POISON);
        Ok(address as i64)
    }

    pub fn mark(&self) -> usize {
        self.bytes.len()
    }

    /// Frees everything allocated after `mark` was taken.
    pub fn release(&mut self, mark: usize) {
        self.bytes.truncate(mark.max(WORD_SIZE as usize));
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    fn range(&self, address: i64, size: u64) -> Result<Range<usize>, RuntimeError> {
        if address == NULL {
            return Err(RuntimeError::NullDereference);
        }

        let out_of_bounds = RuntimeError::OutOfBounds { address, size };
        let start = usize::try_from(address).map_err(|_| out_of_bounds.clone())?;
        let end = start
            .checked_add(size as usize)
            .ok_or_else(|| out_of_bounds.clone())?;

        if start < WORD_SIZE as usize || end > self.bytes.len() {
            return Err(out_of_bounds);
        }

        Ok(start..end)
    }

    pub fn read_word(&self, address: i64) -> Result<i64, RuntimeError> {
        let range = self.range(address, WORD_SIZE)?;
        let mut word = [0u8; WORD_SIZE as usize];
        word.copy_from_slice(&self.bytes[range]);
        Ok(i64::from_le_bytes(word))
    }

    pub fn write_word(&mut self, address: i64, value: i64) -> Result<(), RuntimeError> {
        let range = self.range(address, WORD_SIZE)?;
        self.bytes[range].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    /// Copies `size` bytes; the ranges may overlap.
    pub fn copy(&mut self, destination: i64, source: i64, size: u64) -> Result<(), RuntimeError> {
        if size == 0 {
            return Ok(());
        }

        let source = self.range(source, size)?;
        let destination = self.range(destination, size)?;
        self.bytes.copy_within(source, destination.start);
        Ok(())
    }
}
