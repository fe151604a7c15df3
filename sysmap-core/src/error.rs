use crate::mem::Region;
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
/// A fatal error raised while building the memory map.
///
/// Neither variant is recoverable: the boot sequence cannot continue
/// without a trustworthy memory map.
pub enum MemoryMapError {
    #[error("Too many memory regions (limit: {capacity})")]
    CapacityExceeded { capacity: usize },
    #[error("Unhandled overlap between {first:?} and {second:?}")]
    InvalidGeometry { first: Region, second: Region },
}

pub type Result<T> = core::result::Result<T, MemoryMapError>;
