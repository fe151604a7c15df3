//! Alignment, ordering and coalescing passes over the region store.
use super::store::RegionStore;
use crate::arch::{ADDRESS_SPACE_END, PAGE_MASK, PAGE_SIZE, align_down, align_up, is_aligned};

impl<const N: usize> RegionStore<N> {
    /// Widens every region to page boundaries.
    ///
    /// Firmware regions are page aligned most of the time, but this cannot be relied upon.
    /// Widening may create new overlaps and adjacencies, which are left to the later passes.
    /// An unaligned empty descriptor still reserves the page it points into,
    /// regions that remain empty once aligned are dropped.
    pub(crate) fn align_to_page_boundary(&mut self) {
        for region in self.entries_mut() {
            let start = align_down(region.base(), PAGE_SIZE);
            // Descriptors running past the address space are cut at its end
            let mut end = align_up(region.end(), PAGE_SIZE).min(ADDRESS_SPACE_END);
            if end - u128::from(start) > u128::from(u64::MAX) {
                // The whole address space: the length must fit in 64 bits
                end = u128::from(PAGE_MASK);
            }
            region.set_bounds(u128::from(start), end);

            debug_assert!(is_aligned(region.base(), PAGE_SIZE));
            debug_assert!(is_aligned(region.len(), PAGE_SIZE));
        }

        self.retain(|region| {
            if region.is_empty() {
                log::debug!("Dropping empty region at {:#x}", region.base());
            }
            !region.is_empty()
        });
    }

    /// Stable insertion sort by base address.
    ///
    /// The store is small and often nearly sorted already.
    pub(crate) fn sort_by_base(&mut self) {
        let regions = self.entries_mut();
        for i in 1..regions.len() {
            let mut j = i;
            while j > 0 && regions[j - 1].base() > regions[j].base() {
                regions.swap(j - 1, j);
                j -= 1;
            }
        }
    }

    /// Coalesces touching regions sharing the same kind and tag.
    ///
    /// Expects the store to be sorted by base address.
    pub(crate) fn merge_adjacent(&mut self) {
        let mut i = 0;
        while i + 1 < self.len() {
            let current = self[i];
            let next = self[i + 1];

            let touching = current.end() == u128::from(next.base());
            // A region spanning the whole address space cannot be represented
            let representable = next.end() - u128::from(current.base()) <= u128::from(u64::MAX);

            if current.is_mergeable_with(&next) && touching && representable {
                self[i].set_bounds(u128::from(current.base()), next.end());
                self.remove(i + 1);
                // Stay on the same index: the next region may be mergeable too
            } else {
                i += 1;
            }
        }
    }
}
