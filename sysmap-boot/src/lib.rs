//! Boot-side sources of the system memory map.
//!
//! The firmware memory map comes from UEFI, the kernel placement from the loadable
//! segments of the kernel ELF image.
#![no_std]
#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::missing_errors_doc)]

use sysmap_core::{
    MemoryMapError,
    mem::{MemoryMapConfig, SystemMemoryMap, ingest::RamdiskInfo},
};
use thiserror::Error;
use uefi::mem::memory_map::MemoryDescriptor;
use xmas_elf::ElfFile;

pub mod firmware;
pub mod kernel_elf;
pub mod logging;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BootMapError {
    #[error("Invalid kernel image: {0}")]
    InvalidKernelImage(&'static str),
    #[error(transparent)]
    MemoryMap(#[from] MemoryMapError),
}

/// Builds the system memory map from the UEFI memory map, the ramdisk and the kernel image.
///
/// Any error is fatal: the boot sequence cannot go on without a memory map.
pub fn build_system_memory_map<'a, const N: usize>(
    config: &MemoryMapConfig,
    memory_map: impl IntoIterator<Item = &'a MemoryDescriptor>,
    ramdisk: Option<RamdiskInfo>,
    kernel: &ElfFile,
) -> Result<SystemMemoryMap<N>, BootMapError> {
    kernel_elf::sanity_check(kernel)?;

    let map = SystemMemoryMap::build(
        config,
        firmware::descriptors(memory_map),
        ramdisk,
        kernel_elf::loadable_segments(kernel),
    )?;

    Ok(map)
}
