//! Hardware resource descriptors
//!
//! A device shell carries a list of named resources. Downstream drivers find
//! their register windows and interrupt lines by name, so the name of each
//! descriptor is part of the contract with that driver.

use bitflags::bitflags;
use core::fmt;

use crate::LookupError;

bitflags! {
    /// Resource type flags, numerically identical to the kernel's `IORESOURCE_*`
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ResourceFlags: u32 {
        /// Memory-mapped register window
        const MEM = 0x0000_0200;

        /// Interrupt line
        const IRQ = 0x0000_0400;
    }
}

/// Inclusive physical address range `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressRange {
    pub start: u64,
    pub end: u64,
}

impl AddressRange {
    /// Range of `size` bytes starting at `base`
    ///
    /// `size` must be non-zero. Address arithmetic is modulo 2^64, as for the
    /// kernel's unsigned resource bounds, so a window near the top of the
    /// address space wraps instead of failing.
    pub const fn from_base_size(base: u64, size: u64) -> Self {
        Self {
            start: base,
            end: base.wrapping_add(size.wrapping_sub(1)),
        }
    }

    /// Size in bytes
    pub const fn size(&self) -> u64 {
        self.end.wrapping_sub(self.start).wrapping_add(1)
    }

    /// Check whether `addr` falls inside the range
    pub const fn contains(&self, addr: u64) -> bool {
        addr.wrapping_sub(self.start) <= self.end.wrapping_sub(self.start)
    }
}

/// A resolved, non-negative interrupt line number
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IrqLine(pub u32);

impl IrqLine {
    /// Convert a kernel-style interrupt lookup result
    ///
    /// Lookups return the line number on success and a negative errno on
    /// failure; anything below zero is a failure.
    pub fn from_raw(raw: i32) -> Result<Self, LookupError> {
        u32::try_from(raw)
            .map(IrqLine)
            .map_err(|_| LookupError::from_errno(raw))
    }

    /// Get the line number
    pub fn number(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for IrqLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a resource descriptor describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// Memory-mapped register window
    Memory(AddressRange),

    /// Interrupt line
    Irq(IrqLine),
}

/// One named hardware resource attached to a device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resource {
    /// Name the downstream driver looks the resource up by
    pub name: &'static str,

    /// Resource payload
    pub kind: ResourceKind,
}

impl Resource {
    /// Create a memory-window descriptor
    pub const fn memory(name: &'static str, range: AddressRange) -> Self {
        Self {
            name,
            kind: ResourceKind::Memory(range),
        }
    }

    /// Create an interrupt-line descriptor
    pub const fn irq(name: &'static str, line: IrqLine) -> Self {
        Self {
            name,
            kind: ResourceKind::Irq(line),
        }
    }

    /// Resource type flags
    pub fn flags(&self) -> ResourceFlags {
        match self.kind {
            ResourceKind::Memory(_) => ResourceFlags::MEM,
            ResourceKind::Irq(_) => ResourceFlags::IRQ,
        }
    }

    /// First address, or the line number for interrupts
    pub fn start(&self) -> u64 {
        match self.kind {
            ResourceKind::Memory(range) => range.start,
            ResourceKind::Irq(line) => u64::from(line.0),
        }
    }

    /// Last address (inclusive), or the line number for interrupts
    pub fn end(&self) -> u64 {
        match self.kind {
            ResourceKind::Memory(range) => range.end,
            ResourceKind::Irq(line) => u64::from(line.0),
        }
    }

    /// Interrupt line, if this is an interrupt descriptor
    pub fn irq_line(&self) -> Option<IrqLine> {
        match self.kind {
            ResourceKind::Irq(line) => Some(line),
            ResourceKind::Memory(_) => None,
        }
    }
}

/// DMA mask covering the low `bits` address bits
pub const fn dma_bit_mask(bits: u32) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}
