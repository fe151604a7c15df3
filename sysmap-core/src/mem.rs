//! Physical memory regions and the system memory map.
use crate::{
    arch::{KIB, MIB},
    error::Result,
};
use bitflags::bitflags;
use core::{
    cmp::Ordering,
    hash::{Hash, Hasher},
};
use num_enum::FromPrimitive;

pub mod export;
pub mod ingest;
mod normalize;
mod overlap;
pub mod store;

use ingest::{FirmwareDescriptor, KernelSegment, RamdiskInfo};
use store::RegionStore;

/// Default capacity of the region store.
pub const MAX_REGIONS: usize = 512;

/// Size of the reservation kept at physical address 0.
pub const LOW_MEMORY_SIZE: u64 = 64 * KIB;

/// A physical memory region.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Region {
    /// The physical start address of the region.
    base: u64,
    /// The size of the region in bytes.
    len: u64,
    /// The classification of the region.
    kind: RegionKind,
    /// Provenance of the region.
    tag: RegionTag,
}

impl Region {
    #[must_use]
    #[inline]
    pub const fn new(base: u64, len: u64, kind: RegionKind, tag: RegionTag) -> Self {
        Self {
            base,
            len,
            kind,
            tag,
        }
    }

    #[must_use]
    /// Creates a region from its start and (exclusive) end.
    ///
    /// Panics if the bounds are reversed or do not fit in the address space.
    pub fn from_bounds(start: u128, end: u128, kind: RegionKind, tag: RegionTag) -> Self {
        let mut region = Self::new(0, 0, kind, tag);
        region.set_bounds(start, end);
        region
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
    /// The exclusive end of the region.
    ///
    /// A region may end at the top of the address space, which does not fit in 64 bits.
    pub fn end(&self) -> u128 {
        u128::from(self.base) + u128::from(self.len)
    }

    #[must_use]
    #[inline]
    pub const fn kind(&self) -> RegionKind {
        self.kind
    }

    #[must_use]
    #[inline]
    pub const fn tag(&self) -> RegionTag {
        self.tag
    }

    #[must_use]
    #[inline]
    pub const fn contains_addr(&self, addr: u64) -> bool {
        self.base <= addr && addr - self.base < self.len
    }

    #[must_use]
    #[inline]
    /// Returns true if both regions can be coalesced when they touch.
    pub fn is_mergeable_with(&self, other: &Self) -> bool {
        self.kind == other.kind && self.tag == other.tag
    }

    /// Moves the region to `[start, end)`.
    ///
    /// Panics if the bounds are reversed or do not fit in the address space.
    pub(crate) fn set_bounds(&mut self, start: u128, end: u128) {
        let (Ok(base), Some(Ok(len))) = (
            u64::try_from(start),
            end.checked_sub(start).map(u64::try_from),
        ) else {
            panic!("Invalid region bounds [{start:#x}, {end:#x})");
        };
        self.base = base;
        self.len = len;
    }
}

/// Classification of a memory region.
///
/// Values follow the multiboot memory map numbering. The numeric value is also the
/// priority of the kind: when two regions overlap, the greater one wins.
///
/// Kinds are compared by value, so `Other(1)` is the same kind as `Usable`.
#[derive(Debug, Copy, Clone, FromPrimitive)]
#[repr(u32)]
pub enum RegionKind {
    /// RAM that the kernel is free to allocate.
    Usable = 1,
    Reserved = 2,
    /// ACPI tables, usable once they have been parsed.
    AcpiReclaimable = 3,
    /// ACPI non-volatile storage, must be preserved across sleep states.
    AcpiNvs = 4,
    /// Defective RAM.
    BadMemory = 5,
    /// Any other value reported by the firmware.
    #[num_enum(catch_all)]
    Other(u32),
}

impl RegionKind {
    #[must_use]
    #[inline]
    pub const fn as_u32(self) -> u32 {
        match self {
            Self::Usable => 1,
            Self::Reserved => 2,
            Self::AcpiReclaimable => 3,
            Self::AcpiNvs => 4,
            Self::BadMemory => 5,
            Self::Other(value) => value,
        }
    }

    #[must_use]
    #[inline]
    pub const fn is_usable(self) -> bool {
        self.as_u32() == Self::Usable.as_u32()
    }
}

impl PartialEq for RegionKind {
    fn eq(&self, other: &Self) -> bool {
        self.as_u32() == other.as_u32()
    }
}

impl Eq for RegionKind {}

impl Hash for RegionKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_u32().hash(state);
    }
}

impl Ord for RegionKind {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_u32().cmp(&other.as_u32())
    }
}

impl PartialOrd for RegionKind {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

bitflags! {
    /// Provenance of a region, independent from its kind.
    ///
    /// Tags never take part in overlap priority, they only prevent
    /// merging regions of different origins.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RegionTag: u32 {
        const RAMDISK = 1;
        const KERNEL = 1 << 1;
        const LOW_MEMORY = 1 << 2;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Tunables of the memory map pipeline.
pub struct MemoryMapConfig {
    low_memory_size: u64,
}

impl Default for MemoryMapConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryMapConfig {
    #[must_use]
    #[inline]
    pub const fn new() -> Self {
        Self {
            low_memory_size: LOW_MEMORY_SIZE,
        }
    }

    #[must_use]
    #[inline]
    /// Sets the size of the reservation at address 0. `0` disables it.
    pub const fn with_low_memory_size(mut self, size: u64) -> Self {
        self.low_memory_size = size;
        self
    }

    #[must_use]
    #[inline]
    pub const fn low_memory_size(&self) -> u64 {
        self.low_memory_size
    }
}

#[derive(Debug, Clone)]
/// The normalized physical memory map.
///
/// Regions are sorted by base address, page aligned and pairwise disjoint.
/// The map is read-only once built.
pub struct SystemMemoryMap<const N: usize = MAX_REGIONS> {
    store: RegionStore<N>,
}

impl<const N: usize> SystemMemoryMap<N> {
    /// Builds the memory map from the boot sources.
    ///
    /// Regions are ingested in a fixed order: the low memory reservation,
    /// the firmware descriptors, the ramdisk and finally the kernel segments.
    pub fn build<F, K>(
        config: &MemoryMapConfig,
        firmware: F,
        ramdisk: Option<RamdiskInfo>,
        kernel_segments: K,
    ) -> Result<Self>
    where
        F: IntoIterator<Item = FirmwareDescriptor>,
        K: IntoIterator<Item = KernelSegment>,
    {
        let mut store = RegionStore::new();

        ingest::reserve_low_memory(&mut store, config.low_memory_size())?;
        ingest::firmware_regions(&mut store, firmware)?;
        ingest::ramdisk_region(&mut store, ramdisk)?;
        ingest::kernel_regions(&mut store, kernel_segments)?;

        Self::normalize(store)
    }

    /// Runs the normalization pipeline over arbitrary regions, keeping their tags.
    pub fn from_regions<I>(regions: I) -> Result<Self>
    where
        I: IntoIterator<Item = Region>,
    {
        let mut store = RegionStore::new();
        for region in regions {
            store.push(region)?;
        }
        Self::normalize(store)
    }

    fn normalize(mut store: RegionStore<N>) -> Result<Self> {
        store.align_to_page_boundary();
        store.sort_by_base();
        store.merge_adjacent();
        store.resolve_overlaps()?;
        store.sort_by_base();
        store.merge_adjacent();

        let map = Self { store };
        log::info!(
            "Memory map: {} regions, {} MiB usable",
            map.len(),
            map.usable_memory() / MIB
        );
        log::debug!("{map}");

        Ok(map)
    }

    #[must_use]
    #[inline]
    pub fn regions(&self) -> &[Region] {
        self.store.entries()
    }

    #[must_use]
    #[inline]
    pub const fn len(&self) -> usize {
        self.store.len()
    }

    #[must_use]
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Regions the frame allocator may hand out.
    pub fn usable_regions(&self) -> impl Iterator<Item = &Region> {
        self.regions().iter().filter(|r| r.kind().is_usable())
    }

    #[must_use]
    /// Total amount of usable memory, in bytes.
    pub fn usable_memory(&self) -> u64 {
        self.usable_regions().map(Region::len).sum()
    }

    #[must_use]
    /// Highest usable address, in MiB.
    pub fn memory_size_mib(&self) -> u64 {
        let top = self.usable_regions().map(Region::end).max().unwrap_or(0);
        // At most 2^44 MiB
        u64::try_from(top / u128::from(MIB)).unwrap_or(u64::MAX)
    }

    #[must_use]
    /// Returns the region covering `addr`, if any.
    pub fn region_containing(&self, addr: u64) -> Option<&Region> {
        let regions = self.regions();
        // Regions are sorted and disjoint: the candidate is the last one starting at or before `addr`
        let idx = regions.partition_point(|r| r.base() <= addr);
        idx.checked_sub(1)
            .map(|i| &regions[i])
            .filter(|r| r.contains_addr(addr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::ADDRESS_SPACE_END;

    #[test]
    fn test_kind_from_u32() {
        assert_eq!(RegionKind::from(1), RegionKind::Usable);
        assert_eq!(RegionKind::from(5), RegionKind::BadMemory);
        assert_eq!(RegionKind::from(0), RegionKind::Other(0));
        assert_eq!(RegionKind::from(0xF00D), RegionKind::Other(0xF00D));
        assert_eq!(RegionKind::from(0xF00D).as_u32(), 0xF00D);
    }

    #[test]
    fn test_kind_priority() {
        assert!(RegionKind::Usable < RegionKind::Reserved);
        assert!(RegionKind::Reserved < RegionKind::AcpiReclaimable);
        assert!(RegionKind::AcpiNvs < RegionKind::BadMemory);
        assert!(RegionKind::Other(0) < RegionKind::Usable);
        assert!(RegionKind::Other(7) > RegionKind::BadMemory);
    }

    #[test]
    fn test_kind_equality_follows_value() {
        assert_eq!(RegionKind::Other(1), RegionKind::Usable);
        assert_eq!(RegionKind::Other(5).cmp(&RegionKind::BadMemory), Ordering::Equal);
        assert_ne!(RegionKind::Other(6), RegionKind::BadMemory);
        assert!(RegionKind::Other(1).is_usable());

        let a = Region::new(0, 0x1000, RegionKind::Other(1), RegionTag::empty());
        let b = Region::new(0x1000, 0x1000, RegionKind::Usable, RegionTag::empty());
        assert!(a.is_mergeable_with(&b));
    }

    #[test]
    fn test_region_bounds() {
        let region = Region::from_bounds(0x1000, 0x3000, RegionKind::Usable, RegionTag::empty());
        assert_eq!(region.base(), 0x1000);
        assert_eq!(region.len(), 0x2000);
        assert_eq!(region.end(), 0x3000);
        assert!(region.contains_addr(0x2FFF));
        assert!(!region.contains_addr(0x3000));

        let top = Region::new(
            0xFFFF_FFFF_FFFF_F000,
            0x1000,
            RegionKind::Usable,
            RegionTag::empty(),
        );
        assert_eq!(top.end(), ADDRESS_SPACE_END);
        assert!(top.contains_addr(u64::MAX));

        let rebuilt = Region::from_bounds(
            0xFFFF_FFFF_FFFF_F000,
            ADDRESS_SPACE_END,
            top.kind(),
            top.tag(),
        );
        assert_eq!(rebuilt, top);
    }

    #[test]
    #[should_panic = "Invalid region bounds"]
    fn test_bounds_past_address_space() {
        let _ = Region::from_bounds(
            0,
            ADDRESS_SPACE_END + 0x1000,
            RegionKind::Usable,
            RegionTag::empty(),
        );
    }

    #[test]
    fn test_mergeable() {
        let a = Region::new(0, 0x1000, RegionKind::Reserved, RegionTag::KERNEL);
        let b = Region::new(0x1000, 0x1000, RegionKind::Reserved, RegionTag::KERNEL);
        let c = Region::new(0x1000, 0x1000, RegionKind::Reserved, RegionTag::RAMDISK);
        assert!(a.is_mergeable_with(&b));
        assert!(!a.is_mergeable_with(&c));
    }

    #[test]
    fn test_region_containing() {
        let map = SystemMemoryMap::<8>::from_regions([
            Region::new(0, 0x1000, RegionKind::Reserved, RegionTag::LOW_MEMORY),
            Region::new(0x1000, 0x9000, RegionKind::Usable, RegionTag::empty()),
            Region::new(0x20000, 0x1000, RegionKind::AcpiNvs, RegionTag::empty()),
        ])
        .unwrap();

        assert_eq!(map.region_containing(0).unwrap().tag(), RegionTag::LOW_MEMORY);
        assert_eq!(map.region_containing(0x9FFF).unwrap().kind(), RegionKind::Usable);
        assert!(map.region_containing(0xA000).is_none());
        assert_eq!(
            map.region_containing(0x20800).unwrap().kind(),
            RegionKind::AcpiNvs
        );
        assert!(map.region_containing(0x21000).is_none());
    }

    #[test]
    fn test_usable_accounting() {
        let map = SystemMemoryMap::<8>::from_regions([
            Region::new(0, 0x10_0000, RegionKind::Usable, RegionTag::empty()),
            Region::new(0x20_0000, 0x20_0000, RegionKind::Usable, RegionTag::empty()),
            Region::new(0x40_0000, 0x1000, RegionKind::Reserved, RegionTag::empty()),
        ])
        .unwrap();

        assert_eq!(map.usable_memory(), 0x30_0000);
        assert_eq!(map.memory_size_mib(), 4);
        assert_eq!(map.usable_regions().count(), 2);
    }
}
