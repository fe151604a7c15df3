//! Human readable dump of the memory map.
use super::{Region, RegionTag, SystemMemoryMap};
use crate::arch::KIB;
use core::fmt;

const RULE: &str = "---------------------------------------------------------------";

impl RegionTag {
    #[must_use]
    /// Four-letter mnemonic used in the memory map dump.
    pub fn mnemonic(self) -> &'static str {
        if self == Self::RAMDISK {
            "RDSK"
        } else if self == Self::KERNEL {
            "KRNL"
        } else if self == Self::LOW_MEMORY {
            "LMRS"
        } else {
            "    "
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:#x} - {:#x} ({}, {}) [{} KB]",
            self.base(),
            self.end(),
            self.kind().as_u32(),
            self.tag().mnemonic(),
            self.len() / KIB
        )
    }
}

impl<const N: usize> fmt::Display for SystemMemoryMap<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "System's memory map")?;
        writeln!(f, "{RULE}")?;
        writeln!(f, "       START                 END        (T, Extr)")?;
        for region in self.regions() {
            writeln!(f, "{region}")?;
        }
        writeln!(f, "{RULE}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mem::RegionKind;
    use core::fmt::Write;

    /// Fixed-size `fmt::Write` sink.
    struct Buffer {
        bytes: [u8; 512],
        len: usize,
    }

    impl Buffer {
        const fn new() -> Self {
            Self {
                bytes: [0; 512],
                len: 0,
            }
        }

        fn as_str(&self) -> &str {
            core::str::from_utf8(&self.bytes[..self.len]).unwrap()
        }
    }

    impl Write for Buffer {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            let end = self.len + s.len();
            if end > self.bytes.len() {
                return Err(fmt::Error);
            }
            self.bytes[self.len..end].copy_from_slice(s.as_bytes());
            self.len = end;
            Ok(())
        }
    }

    #[test]
    fn test_mnemonics() {
        assert_eq!(RegionTag::RAMDISK.mnemonic(), "RDSK");
        assert_eq!(RegionTag::KERNEL.mnemonic(), "KRNL");
        assert_eq!(RegionTag::LOW_MEMORY.mnemonic(), "LMRS");
        assert_eq!(RegionTag::empty().mnemonic(), "    ");
    }

    #[test]
    fn test_region_line() {
        let region = Region::new(0x10_0000, 0x2000, RegionKind::Reserved, RegionTag::KERNEL);
        let mut buf = Buffer::new();
        write!(buf, "{region}").unwrap();
        assert_eq!(buf.as_str(), "0x100000 - 0x102000 (2, KRNL) [8 KB]");
    }

    #[test]
    fn test_map_dump() {
        let map = SystemMemoryMap::<4>::from_regions([
            Region::new(0x1000, 0x1000, RegionKind::Usable, RegionTag::empty()),
            Region::new(0, 0x1000, RegionKind::Reserved, RegionTag::LOW_MEMORY),
        ])
        .unwrap();

        let mut buf = Buffer::new();
        write!(buf, "{map}").unwrap();

        let mut lines = buf.as_str().lines();
        assert_eq!(lines.next(), Some("System's memory map"));
        assert_eq!(lines.next(), Some(RULE));
        assert!(lines.next().unwrap().contains("START"));
        assert_eq!(lines.next(), Some("0x0 - 0x1000 (2, LMRS) [4 KB]"));
        assert_eq!(lines.next(), Some("0x1000 - 0x2000 (1,     ) [4 KB]"));
        assert_eq!(lines.next(), Some(RULE));
        assert_eq!(lines.next(), None);
    }
}
