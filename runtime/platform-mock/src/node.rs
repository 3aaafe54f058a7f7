//! Programmable board-description nodes

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use platform_bus::AddressRange;

/// Register base of the Mali-450 on Meson GXBB/GXL boards
pub const MESON_MALI_BASE: u64 = 0xd00c_0000;

/// Register window size of the Mali-450 on Meson GXBB/GXL boards
pub const MESON_MALI_SIZE: u64 = 0x4_0000;

/// Named interrupts of the Meson Mali node, in board-description order
pub const MESON_MALI_IRQS: [(&str, i32); 10] = [
    ("gp", 160),
    ("gpmmu", 161),
    ("pp", 162),
    ("pmu", 163),
    ("pp0", 164),
    ("ppmmu0", 165),
    ("pp1", 166),
    ("ppmmu1", 167),
    ("pp2", 168),
    ("ppmmu2", 169),
];

/// One board-description node
///
/// Interrupts are programmed with the raw value the lookup should return,
/// so a negative value models a line that exists but fails to map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockNode {
    pub compatible: String,
    pub clocks: Vec<String>,
    pub regs: Vec<AddressRange>,
    pub irqs: Vec<(String, i32)>,
}

impl MockNode {
    /// Create an empty node with the given compatible string
    pub fn new(compatible: &str) -> Self {
        Self {
            compatible: compatible.to_string(),
            clocks: Vec::new(),
            regs: Vec::new(),
            irqs: Vec::new(),
        }
    }

    /// Fully populated `amlogic,meson-gxbb-mali` node
    pub fn meson_gxbb() -> Self {
        Self::meson("amlogic,meson-gxbb-mali")
    }

    /// Fully populated `amlogic,meson-gxl-mali` node
    pub fn meson_gxl() -> Self {
        Self::meson("amlogic,meson-gxl-mali")
    }

    fn meson(compatible: &str) -> Self {
        let node = Self::new(compatible)
            .with_clock("bus")
            .with_clock("core")
            .with_reg(AddressRange::from_base_size(MESON_MALI_BASE, MESON_MALI_SIZE));

        MESON_MALI_IRQS
            .iter()
            .fold(node, |node, &(name, irq)| node.with_irq(name, irq))
    }

    /// Add a named clock
    pub fn with_clock(mut self, name: &str) -> Self {
        self.clocks.push(name.to_string());
        self
    }

    /// Append an address entry
    pub fn with_reg(mut self, range: AddressRange) -> Self {
        self.regs.push(range);
        self
    }

    /// Set a named interrupt, replacing any previous value for the name
    pub fn with_irq(mut self, name: &str, raw: i32) -> Self {
        match self.irqs.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = raw,
            None => self.irqs.push((name.to_string(), raw)),
        }
        self
    }

    /// Remove a named interrupt
    pub fn without_irq(mut self, name: &str) -> Self {
        self.irqs.retain(|(n, _)| n != name);
        self
    }

    /// Remove every address entry
    pub fn without_regs(mut self) -> Self {
        self.regs.clear();
        self
    }

    pub(crate) fn has_clock(&self, name: &str) -> bool {
        self.clocks.iter().any(|c| c == name)
    }

    pub(crate) fn irq(&self, name: &str) -> Option<i32> {
        self.irqs.iter().find(|(n, _)| n == name).map(|&(_, raw)| raw)
    }
}
