//! Physical placement of the running kernel image.
use crate::BootMapError;
use sysmap_core::mem::ingest::KernelSegment;
use xmas_elf::{
    ElfFile, header,
    program::{self, Type},
};

/// Makes sure that the kernel ELF headers can be trusted.
pub fn sanity_check(kernel: &ElfFile) -> Result<(), BootMapError> {
    header::sanity_check(kernel).map_err(BootMapError::InvalidKernelImage)?;
    for program_header in kernel.program_iter() {
        program::sanity_check(program_header, kernel).map_err(BootMapError::InvalidKernelImage)?;
    }

    if kernel.header.pt1.class() != header::Class::SixtyFour {
        return Err(BootMapError::InvalidKernelImage("Kernel is not 64-bit"));
    }

    Ok(())
}

/// Physical extent of every `PT_LOAD` segment of the kernel.
///
/// Segments are reported with their in-memory size, so that `.bss` is reserved as well.
pub fn loadable_segments<'a>(kernel: &'a ElfFile<'a>) -> impl Iterator<Item = KernelSegment> + 'a {
    kernel
        .program_iter()
        .filter(|program_header| program_header.get_type() == Ok(Type::Load))
        .map(|program_header| {
            KernelSegment::new(program_header.physical_addr(), program_header.mem_size())
        })
}
