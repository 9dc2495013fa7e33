//! Bounds and alignment policy for data and instruction accesses.

use crate::{OpSize, Trap};

/// Validates one sized access against a store of `capacity` bytes.
///
/// Byte accesses only need to be in bounds. Word and long accesses also
/// need an even address, and the whole operand must fit in the store.
///
/// # Errors
///
/// Returns [`Trap::AddressError`] when the access is misaligned or falls
/// outside the store.
pub const fn validate_access(address: u32, size: OpSize, capacity: usize) -> Result<(), Trap> {
    if !matches!(size, OpSize::Byte) && address & 1 != 0 {
        return Err(Trap::AddressError);
    }
    if range_in_bounds(address, size.bytes() as usize, capacity) {
        Ok(())
    } else {
        Err(Trap::AddressError)
    }
}

/// Returns `true` when `address..address + len` lies inside the store.
#[must_use]
pub const fn range_in_bounds(address: u32, len: usize, capacity: usize) -> bool {
    let start = address as usize;
    match start.checked_add(len) {
        Some(end) => end <= capacity,
        None => false,
    }
}
