//! Boot sources of the memory map.
//!
//! Nothing is validated here: zero-sized, duplicated or out-of-order descriptors are
//! absorbed later by the normalization passes.
use super::{Region, RegionKind, RegionTag, store::RegionStore};
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// A memory descriptor as reported by the firmware.
pub struct FirmwareDescriptor {
    base: u64,
    len: u64,
    /// Raw memory type, in multiboot numbering.
    kind: u32,
}

impl FirmwareDescriptor {
    #[must_use]
    #[inline]
    pub const fn new(base: u64, len: u64, kind: u32) -> Self {
        Self { base, len, kind }
    }

    #[must_use]
    #[inline]
    pub const fn base(&self) -> u64 {
        self.base
    }

    #[must_use]
    #[inline]
    pub const fn len(&self) -> u64 {
        self.len
    }

    #[must_use]
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    #[inline]
    pub fn kind(&self) -> RegionKind {
        RegionKind::from(self.kind)
    }
}

impl From<(u64, u64, u32)> for FirmwareDescriptor {
    fn from((base, len, kind): (u64, u64, u32)) -> Self {
        Self::new(base, len, kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Physical placement of the initial ramdisk.
pub struct RamdiskInfo {
    paddr: u64,
    size: u64,
}

impl RamdiskInfo {
    #[must_use]
    #[inline]
    pub const fn new(paddr: u64, size: u64) -> Self {
        Self { paddr, size }
    }

    #[must_use]
    #[inline]
    pub const fn paddr(&self) -> u64 {
        self.paddr
    }

    #[must_use]
    #[inline]
    pub const fn size(&self) -> u64 {
        self.size
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// A loadable segment of the running kernel image.
pub struct KernelSegment {
    paddr: u64,
    mem_size: u64,
}

impl KernelSegment {
    #[must_use]
    #[inline]
    pub const fn new(paddr: u64, mem_size: u64) -> Self {
        Self { paddr, mem_size }
    }

    #[must_use]
    #[inline]
    pub const fn paddr(&self) -> u64 {
        self.paddr
    }

    #[must_use]
    #[inline]
    pub const fn mem_size(&self) -> u64 {
        self.mem_size
    }
}

/// Reserves `[0, size)` so that the null page and real-mode structures are never handed out.
pub fn reserve_low_memory<const N: usize>(store: &mut RegionStore<N>, size: u64) -> Result<()> {
    if size == 0 {
        return Ok(());
    }
    store.push(Region::new(0, size, RegionKind::Reserved, RegionTag::LOW_MEMORY))
}

pub fn firmware_regions<const N: usize>(
    store: &mut RegionStore<N>,
    descriptors: impl IntoIterator<Item = FirmwareDescriptor>,
) -> Result<()> {
    for descriptor in descriptors {
        store.push(Region::new(
            descriptor.base(),
            descriptor.len(),
            descriptor.kind(),
            RegionTag::empty(),
        ))?;
    }
    Ok(())
}

/// Reserves the ramdisk, if there is one. A zero-sized ramdisk counts as absent.
pub fn ramdisk_region<const N: usize>(
    store: &mut RegionStore<N>,
    ramdisk: Option<RamdiskInfo>,
) -> Result<()> {
    match ramdisk {
        Some(ramdisk) if ramdisk.size() != 0 => store.push(Region::new(
            ramdisk.paddr(),
            ramdisk.size(),
            RegionKind::Reserved,
            RegionTag::RAMDISK,
        )),
        _ => Ok(()),
    }
}

pub fn kernel_regions<const N: usize>(
    store: &mut RegionStore<N>,
    segments: impl IntoIterator<Item = KernelSegment>,
) -> Result<()> {
    for segment in segments {
        store.push(Region::new(
            segment.paddr(),
            segment.mem_size(),
            RegionKind::Reserved,
            RegionTag::KERNEL,
        ))?;
    }
    Ok(())
}
