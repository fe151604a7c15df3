//! Overlap resolution between memory regions.
//!
//! Every ordered pair of regions `(r1, r2)` is classified from the point of view of `r1`,
//! with `[s1, e1)` and `[s2, e2)` their bounds. Only pairs where `r2` starts inside `r1`
//! are acted upon: the mirrored situation is handled when the pair is visited the other way round.
//!
//! When two regions overlap, the stricter kind (the greater one) keeps the overlapped range
//! and the other region is shrunk, split or removed. Every mutation strictly reduces the total
//! length of the store, so repeating the scan until nothing changes terminates.
use super::{Region, store::RegionStore};
use crate::{
    arch::ADDRESS_SPACE_END,
    error::{MemoryMapError, Result},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Geometric relationship of `r2` relative to `r1`.
enum Overlap {
    /// `r2` starts before `r1`. The pair is resolved once the roles are swapped.
    Mirrored,
    /// `r2` starts at or after the end of `r1`.
    Disjoint,
    /// `r2` lies inside `r1`, boundaries included.
    ///
    /// ```text
    ///   s1                          e1
    ///   +---------------------------+
    ///   |         region 1          |
    ///   +---------------------------+
    ///          +-------------+
    ///          |  region 2   |
    ///          +-------------+
    ///          s2            e2
    /// ```
    Contained,
    /// `r2` starts inside `r1` and ends past it.
    ///
    /// ```text
    ///   s1                  e1
    ///   +-------------------+
    ///   |     region 1      |
    ///   +-------------------+
    ///          +-------------------+
    ///          |     region 2      |
    ///          +-------------------+
    ///          s2                  e2
    /// ```
    Straddling,
}

impl Overlap {
    /// Classifies `r2` relative to `r1`.
    ///
    /// Both regions must be non-empty and must end within the address space,
    /// which the alignment pass guarantees.
    fn classify(r1: &Region, r2: &Region) -> Result<Self> {
        let invalid = MemoryMapError::InvalidGeometry {
            first: *r1,
            second: *r2,
        };

        let out_of_range = |r: &Region| r.is_empty() || r.end() > ADDRESS_SPACE_END;
        if out_of_range(r1) || out_of_range(r2) {
            return Err(invalid);
        }
        let (s1, e1) = (u128::from(r1.base()), r1.end());
        let (s2, e2) = (u128::from(r2.base()), r2.end());

        Ok(if s2 < s1 {
            Self::Mirrored
        } else if s2 >= e1 {
            Self::Disjoint
        } else if e2 <= e1 {
            Self::Contained
        } else {
            Self::Straddling
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Effect of resolving a single pair on the store.
enum Resolution {
    Untouched,
    /// A region was resized in place, indices are still valid.
    Resized,
    /// A region was removed or added, indices must be recomputed.
    Restructured,
}

impl<const N: usize> RegionStore<N> {
    /// Removes every overlap from the store.
    ///
    /// All ordered pairs are scanned, restarting from the beginning after each removal
    /// or insertion, until a full pass leaves the store untouched.
    pub(crate) fn resolve_overlaps(&mut self) -> Result<()> {
        loop {
            let mut mutated = false;

            let mut i = 0;
            'outer: while i < self.len() {
                for j in 0..self.len() {
                    match self.resolve_pair(i, j)? {
                        Resolution::Untouched => {}
                        Resolution::Resized => mutated = true,
                        Resolution::Restructured => {
                            mutated = true;
                            i = 0;
                            continue 'outer;
                        }
                    }
                }
                i += 1;
            }

            if !mutated {
                return Ok(());
            }
        }
    }

    fn resolve_pair(&mut self, i: usize, j: usize) -> Result<Resolution> {
        if i == j {
            return Ok(Resolution::Untouched);
        }

        let r1 = self[i];
        let r2 = self[j];
        let (s1, e1) = (u128::from(r1.base()), r1.end());
        let (s2, e2) = (u128::from(r2.base()), r2.end());

        match Overlap::classify(&r1, &r2)? {
            Overlap::Mirrored | Overlap::Disjoint => Ok(Resolution::Untouched),

            Overlap::Contained if r1.kind() >= r2.kind() => {
                // Region 1 already covers region 2 with a kind at least as strict
                log::debug!("Discarding {r2:?}, covered by {r1:?}");
                self.remove(j);
                Ok(Resolution::Restructured)
            }
            Overlap::Contained => {
                // Region 2 is stricter: carve it out of region 1
                if s1 == s2 && e1 == e2 {
                    // Both leftovers are empty, region 2 replaces region 1
                    self[i] = r2;
                    self.remove(j);
                    Ok(Resolution::Restructured)
                } else if s1 == s2 {
                    self[i].set_bounds(e2, e1);
                    Ok(Resolution::Resized)
                } else if e1 == e2 {
                    self[i].set_bounds(s1, s2);
                    Ok(Resolution::Resized)
                } else {
                    // Append the upper part first so that a full store is left unchanged
                    self.push(Region::from_bounds(e2, e1, r1.kind(), r1.tag()))?;
                    self[i].set_bounds(s1, s2);
                    log::debug!("Split {r1:?} around {r2:?}");
                    Ok(Resolution::Restructured)
                }
            }

            Overlap::Straddling if r1.kind() >= r2.kind() => {
                // Region 1 keeps the overlapped range
                self[j].set_bounds(e1, e2);
                Ok(Resolution::Resized)
            }
            Overlap::Straddling => {
                if s1 == s2 {
                    // Region 1 is entirely swallowed
                    self[i] = r2;
                    self.remove(j);
                    Ok(Resolution::Restructured)
                } else {
                    self[i].set_bounds(s1, s2);
                    Ok(Resolution::Resized)
                }
            }
        }
    }
}
