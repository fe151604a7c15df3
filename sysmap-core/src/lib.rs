//! Boot-time construction of the system's physical memory map.
//!
//! The boot loader hands over an untrusted list of memory descriptors. This crate turns it,
//! together with the kernel image and ramdisk placement, into a sorted, page-aligned and
//! non-overlapping table of typed regions that the frame allocator can trust.
//!
//! ```rust
//! use sysmap_core::mem::{
//!     MemoryMapConfig, RegionKind, SystemMemoryMap,
//!     ingest::{FirmwareDescriptor, KernelSegment},
//! };
//!
//! let firmware = [FirmwareDescriptor::new(0, 0x10_0000, 1)];
//! let kernel = [KernelSegment::new(0x1_0000, 0x1000)];
//!
//! let map = SystemMemoryMap::<16>::build(
//!     &MemoryMapConfig::new().with_low_memory_size(0),
//!     firmware,
//!     None,
//!     kernel,
//! )
//! .unwrap();
//!
//! assert_eq!(map.len(), 3);
//! assert_eq!(map.regions()[1].kind(), RegionKind::Reserved);
//! ```
#![no_std]
#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::doc_markdown
)]

pub mod arch;
pub mod error;
pub mod mem;

pub use error::MemoryMapError;

#[macro_export]
macro_rules! static_assert {
    ($condition:expr $(, $($arg:tt)+)?) => {
        const _: () = assert!($condition $(, $($arg)+)?);
    };
}
