//! Platform constants and address arithmetic.

/// Size of the smallest page the platform can map.
pub const PAGE_SIZE: u64 = 4096;

/// Mask that clears the offset-in-page bits of an address.
pub const PAGE_MASK: u64 = !(PAGE_SIZE - 1);

crate::static_assert!(PAGE_SIZE.is_power_of_two(), "Page size must be a power of two");

/// Exclusive end of the 64-bit physical address space.
pub const ADDRESS_SPACE_END: u128 = 1 << 64;

pub const KIB: u64 = 1024;
pub const MIB: u64 = 1024 * KIB;

#[must_use]
#[inline]
/// Rounds `addr` down to a multiple of `align`.
///
/// `align` must be a power of two.
pub const fn align_down(addr: u64, align: u64) -> u64 {
    assert!(align.is_power_of_two());
    addr & !(align - 1)
}

#[must_use]
#[inline]
/// Rounds the exclusive end of a range up to a multiple of `align`.
///
/// Ends are 128-bit wide so that a range may finish at the very top of the address space.
/// `align` must be a power of two.
pub const fn align_up(end: u128, align: u64) -> u128 {
    assert!(align.is_power_of_two());
    let mask = align as u128 - 1;
    (end + mask) & !mask
}

#[must_use]
#[inline]
pub const fn is_aligned(addr: u64, align: u64) -> bool {
    assert!(align.is_power_of_two());
    addr & (align - 1) == 0
}
