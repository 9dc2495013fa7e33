//! Flat big-endian byte store with bounds- and alignment-checked accessors.

/// Bounds and alignment policy helpers.
pub mod access;

pub use access::{range_in_bounds, validate_access};

use crate::{MachineError, OpSize, Trap};

/// Default memory capacity (16 MiB, the full 24-bit address range).
pub const DEFAULT_MEMORY_BYTES: usize = 0x0100_0000;

/// Fixed-capacity byte-addressable memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Memory {
    bytes: Box<[u8]>,
}

impl Default for Memory {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_BYTES)
    }
}

impl Memory {
    /// Allocates a zeroed store of `capacity` bytes.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            bytes: vec![0; capacity].into_boxed_slice(),
        }
    }

    /// Capacity in bytes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    /// Read-only view of the whole store.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Zeroes the whole store.
    pub fn clear(&mut self) {
        self.bytes.fill(0);
    }

    /// Copies `data` into the store at `address`, optionally zeroing it first.
    ///
    /// # Errors
    ///
    /// Returns [`MachineError::LoadOutOfRange`] without touching the store
    /// when `address + data.len()` exceeds the capacity.
    pub fn load(&mut self, data: &[u8], address: u32, clear_first: bool) -> Result<(), MachineError> {
        if !range_in_bounds(address, data.len(), self.capacity()) {
            return Err(MachineError::LoadOutOfRange {
                address,
                len: data.len(),
                capacity: self.capacity(),
            });
        }
        if clear_first {
            self.clear();
        }
        let start = address as usize;
        self.bytes[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Returns a read-only view of `len` bytes starting at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`MachineError::RangeOutOfBounds`] when the range leaves the
    /// store.
    pub fn dump(&self, address: u32, len: usize) -> Result<&[u8], MachineError> {
        if !range_in_bounds(address, len, self.capacity()) {
            return Err(MachineError::RangeOutOfBounds { address, len });
        }
        let start = address as usize;
        Ok(&self.bytes[start..start + len])
    }

    /// Reads one byte.
    ///
    /// # Errors
    ///
    /// Returns [`Trap::AddressError`] when `address` is out of bounds.
    pub fn read_byte(&self, address: u32) -> Result<u8, Trap> {
        validate_access(address, OpSize::Byte, self.capacity())?;
        Ok(self.bytes[address as usize])
    }

    /// Writes one byte.
    ///
    /// # Errors
    ///
    /// Returns [`Trap::AddressError`] when `address` is out of bounds.
    pub fn write_byte(&mut self, address: u32, value: u8) -> Result<(), Trap> {
        validate_access(address, OpSize::Byte, self.capacity())?;
        self.bytes[address as usize] = value;
        Ok(())
    }

    /// Reads a big-endian word.
    ///
    /// # Errors
    ///
    /// Returns [`Trap::AddressError`] when `address` is odd or the word
    /// leaves the store.
    pub fn read_word(&self, address: u32) -> Result<u16, Trap> {
        validate_access(address, OpSize::Word, self.capacity())?;
        let at = address as usize;
        Ok(u16::from_be_bytes([self.bytes[at], self.bytes[at + 1]]))
    }

    /// Writes a big-endian word.
    ///
    /// # Errors
    ///
    /// Returns [`Trap::AddressError`] when `address` is odd or the word
    /// leaves the store.
    pub fn write_word(&mut self, address: u32, value: u16) -> Result<(), Trap> {
        validate_access(address, OpSize::Word, self.capacity())?;
        let at = address as usize;
        self.bytes[at..at + 2].copy_from_slice(&value.to_be_bytes());
        Ok(())
    }

    /// Reads a big-endian long word.
    ///
    /// # Errors
    ///
    /// Returns [`Trap::AddressError`] when `address` is odd or the long
    /// leaves the store.
    pub fn read_long(&self, address: u32) -> Result<u32, Trap> {
        validate_access(address, OpSize::Long, self.capacity())?;
        let at = address as usize;
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&self.bytes[at..at + 4]);
        Ok(u32::from_be_bytes(raw))
    }

    /// Writes a big-endian long word.
    ///
    /// # Errors
    ///
    /// Returns [`Trap::AddressError`] when `address` is odd or the long
    /// leaves the store.
    pub fn write_long(&mut self, address: u32, value: u32) -> Result<(), Trap> {
        validate_access(address, OpSize::Long, self.capacity())?;
        let at = address as usize;
        self.bytes[at..at + 4].copy_from_slice(&value.to_be_bytes());
        Ok(())
    }

    /// Reads an operand of `size`, zero-extended to 32 bits.
    ///
    /// # Errors
    ///
    /// Propagates the [`Trap::AddressError`] of the sized accessor.
    pub fn read_sized(&self, address: u32, size: OpSize) -> Result<u32, Trap> {
        match size {
            OpSize::Byte => self.read_byte(address).map(u32::from),
            OpSize::Word => self.read_word(address).map(u32::from),
            OpSize::Long => self.read_long(address),
        }
    }

    /// Writes the low `size` bits of `value`.
    ///
    /// # Errors
    ///
    /// Propagates the [`Trap::AddressError`] of the sized accessor.
    #[allow(clippy::cast_possible_truncation)]
    pub fn write_sized(&mut self, address: u32, size: OpSize, value: u32) -> Result<(), Trap> {
        match size {
            OpSize::Byte => self.write_byte(address, value as u8),
            OpSize::Word => self.write_word(address, value as u16),
            OpSize::Long => self.write_long(address, value),
        }
    }
}
