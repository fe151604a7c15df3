use super::{MAX_REGIONS, Region, RegionKind, RegionTag};
use crate::error::{MemoryMapError, Result};
use core::ops::{Index, IndexMut};

#[derive(Debug, Clone, Copy)]
/// An array-backed, fixed-capacity and ordered sequence of `Region`s.
///
/// The store never allocates: pushing into a full store fails and leaves it untouched.
pub struct RegionStore<const N: usize = MAX_REGIONS> {
    /// Array of regions
    regions: [Region; N],
    /// Number of regions that are currently in use
    used: usize,
}

impl<const N: usize> Index<usize> for RegionStore<N> {
    type Output = Region;

    fn index(&self, index: usize) -> &Self::Output {
        assert!(index < self.len(), "Index out of bounds");
        &self.regions[index]
    }
}

impl<const N: usize> IndexMut<usize> for RegionStore<N> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        assert!(index < self.len(), "Index out of bounds");
        &mut self.regions[index]
    }
}

impl<const N: usize> Default for RegionStore<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RegionStore<N> {
    const EMPTY: Region = Region::new(0, 0, RegionKind::Reserved, RegionTag::empty());

    #[must_use]
    #[inline]
    pub const fn new() -> Self {
        Self {
            regions: [Self::EMPTY; N],
            used: 0,
        }
    }

    #[must_use]
    #[inline]
    pub fn entries(&self) -> &[Region] {
        &self.regions[..self.used]
    }

    #[must_use]
    #[inline]
    pub(crate) fn entries_mut(&mut self) -> &mut [Region] {
        &mut self.regions[..self.used]
    }

    #[must_use]
    #[inline]
    pub const fn len(&self) -> usize {
        self.used
    }

    #[must_use]
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.used == 0
    }

    #[must_use]
    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Appends a region at the end of the store.
    pub fn push(&mut self, region: Region) -> Result<()> {
        if self.used >= N {
            log::warn!("Region store is full, cannot add {region:?}");
            return Err(MemoryMapError::CapacityExceeded { capacity: N });
        }

        self.regions[self.used] = region;
        self.used += 1;
        Ok(())
    }

    /// Removes the region at `index`, shifting the following ones to keep the order.
    pub fn remove(&mut self, index: usize) -> Region {
        assert!(index < self.len(), "Index out of bounds");

        let removed = self.regions[index];
        // The removed region is put at the end of the array like a bubble
        self.regions[index..self.used].rotate_left(1);
        // Note that self.used is not 0 because of the assert above
        self.used -= 1;

        removed
    }

    /// Keeps only the regions for which `keep` returns true, preserving their order.
    pub fn retain(&mut self, mut keep: impl FnMut(&Region) -> bool) {
        let mut kept = 0;
        for i in 0..self.used {
            if keep(&self.regions[i]) {
                self.regions[kept] = self.regions[i];
                kept += 1;
            }
        }
        self.used = kept;
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Region> {
        self.entries().iter()
    }
}

impl<'a, const N: usize> IntoIterator for &'a RegionStore<N> {
    type Item = &'a Region;
    type IntoIter = core::slice::Iter<'a, Region>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(base: u64, len: u64) -> Region {
        Region::new(base, len, RegionKind::Usable, RegionTag::empty())
    }

    #[test]
    fn test_push_and_index() {
        let mut store = RegionStore::<4>::new();
        assert!(store.is_empty());

        store.push(region(0, 0x1000)).unwrap();
        store.push(region(0x1000, 0x1000)).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store[1].base(), 0x1000);
        assert_eq!(store.capacity(), 4);
    }

    #[test]
    fn test_push_full() {
        let mut store = RegionStore::<2>::new();
        store.push(region(0, 0x1000)).unwrap();
        store.push(region(0x1000, 0x1000)).unwrap();

        let before = store;
        assert_eq!(
            store.push(region(0x2000, 0x1000)),
            Err(MemoryMapError::CapacityExceeded { capacity: 2 })
        );
        assert_eq!(store.len(), 2);
        assert_eq!(store.entries(), before.entries());
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut store = RegionStore::<4>::new();
        for i in 0..4 {
            store.push(region(i * 0x1000, 0x1000)).unwrap();
        }

        let removed = store.remove(1);
        assert_eq!(removed.base(), 0x1000);
        assert_eq!(store.len(), 3);
        assert_eq!(store[0].base(), 0);
        assert_eq!(store[1].base(), 0x2000);
        assert_eq!(store[2].base(), 0x3000);

        store.remove(2);
        assert_eq!(store.len(), 2);
        assert_eq!(store[1].base(), 0x2000);
    }

    #[test]
    fn test_retain() {
        let mut store = RegionStore::<4>::new();
        store.push(region(0, 0)).unwrap();
        store.push(region(0x1000, 0x1000)).unwrap();
        store.push(region(0x2000, 0)).unwrap();
        store.push(region(0x3000, 0x1000)).unwrap();

        store.retain(|r| !r.is_empty());
        assert_eq!(store.len(), 2);
        assert_eq!(store[0].base(), 0x1000);
        assert_eq!(store[1].base(), 0x3000);
    }

    #[test]
    #[should_panic = "Index out of bounds"]
    fn test_index_past_len() {
        let store = RegionStore::<4>::new();
        let _ = store[0];
    }
}
