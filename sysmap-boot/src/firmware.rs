//! Translation of the UEFI memory map.
use sysmap_core::mem::ingest::FirmwareDescriptor;
use uefi::mem::memory_map::{MemoryDescriptor, MemoryType};

/// UEFI always describes memory in 4 KiB pages, whatever the platform page size.
const UEFI_PAGE_SIZE: u64 = 4096;

/// Memory types, in multiboot numbering.
pub mod multiboot {
    pub const AVAILABLE: u32 = 1;
    pub const RESERVED: u32 = 2;
    pub const ACPI_RECLAIMABLE: u32 = 3;
    pub const NVS: u32 = 4;
    pub const BADRAM: u32 = 5;
}

#[must_use]
/// Returns the multiboot memory type of a UEFI memory type, as seen once boot services are exited.
pub const fn memory_kind(ty: MemoryType) -> u32 {
    match ty {
        MemoryType::CONVENTIONAL
        | MemoryType::LOADER_CODE
        | MemoryType::BOOT_SERVICES_CODE
        | MemoryType::BOOT_SERVICES_DATA => multiboot::AVAILABLE,
        MemoryType::ACPI_RECLAIM => multiboot::ACPI_RECLAIMABLE,
        MemoryType::ACPI_NON_VOLATILE => multiboot::NVS,
        MemoryType::UNUSABLE => multiboot::BADRAM,
        // Loader data holds the boot information handed to the kernel,
        // runtime services must be left untouched by the operating system.
        _ => multiboot::RESERVED,
    }
}

#[must_use]
pub fn descriptor(memory_descriptor: &MemoryDescriptor) -> FirmwareDescriptor {
    FirmwareDescriptor::new(
        memory_descriptor.phys_start,
        memory_descriptor.page_count.saturating_mul(UEFI_PAGE_SIZE),
        memory_kind(memory_descriptor.ty),
    )
}

pub fn descriptors<'a>(
    memory_map: impl IntoIterator<Item = &'a MemoryDescriptor>,
) -> impl Iterator<Item = FirmwareDescriptor> {
    memory_map.into_iter().map(descriptor)
}
