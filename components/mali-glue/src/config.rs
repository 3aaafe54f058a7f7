//! Board configuration
//!
//! Everything the glue needs to know about where the GPU lives on a board
//! family, and the interrupt roles the Mali-450 MP3 topology fixes.

use core::fmt;
use platform_bus::OfMatch;

#[cfg(not(any(feature = "board-gxbb", feature = "board-gxl")))]
compile_error!("No board selected. Enable 'board-gxbb' and/or 'board-gxl'.");

#[cfg(all(feature = "board-gxbb", feature = "board-gxl"))]
const MESON_MATCHES: &[OfMatch] = &[
    OfMatch::new("amlogic,meson-gxbb-mali"),
    OfMatch::new("amlogic,meson-gxl-mali"),
];

#[cfg(all(feature = "board-gxbb", not(feature = "board-gxl")))]
const MESON_MATCHES: &[OfMatch] = &[OfMatch::new("amlogic,meson-gxbb-mali")];

#[cfg(all(feature = "board-gxl", not(feature = "board-gxbb")))]
const MESON_MATCHES: &[OfMatch] = &[OfMatch::new("amlogic,meson-gxl-mali")];

/// Number of pixel-processing cores
pub const MAX_PP: usize = 3;

/// Lookup parameters fixed per board family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardConfig {
    /// Compatible strings the board node is matched against
    pub matches: &'static [OfMatch],

    /// Name the device shell is created and published under
    pub driver_name: &'static str,

    /// Instance id of the device shell
    pub instance_id: i32,

    /// Name of the GPU core clock in the board node
    pub clock_name: &'static str,

    /// Address entry holding the register base
    pub reg_index: usize,

    /// Width of the coherent DMA mask
    pub dma_mask_bits: u32,
}

impl BoardConfig {
    /// Amlogic Meson GXBB/GXL
    pub const MESON: Self = Self {
        matches: MESON_MATCHES,
        driver_name: "mali-utgard",
        instance_id: 0,
        clock_name: "core",
        reg_index: 0,
        dma_mask_bits: 32,
    };
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self::MESON
    }
}

/// Interrupt roles of a Mali-450 MP3 with PMU
///
/// Discriminants follow [`IrqRole::LOOKUP_ORDER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IrqRole {
    Gp = 0,
    GpMmu,
    PpBroadcast,
    Pmu,
    Pp0,
    PpMmu0,
    Pp1,
    PpMmu1,
    Pp2,
    PpMmu2,
}

impl IrqRole {
    /// Number of roles
    pub const COUNT: usize = 10;

    /// Order the roles are resolved in
    pub const LOOKUP_ORDER: [IrqRole; Self::COUNT] = [
        IrqRole::Gp,
        IrqRole::GpMmu,
        IrqRole::PpBroadcast,
        IrqRole::Pmu,
        IrqRole::Pp0,
        IrqRole::PpMmu0,
        IrqRole::Pp1,
        IrqRole::PpMmu1,
        IrqRole::Pp2,
        IrqRole::PpMmu2,
    ];

    /// Interrupt name in the board node
    pub const fn name(self) -> &'static str {
        match self {
            IrqRole::Gp => "gp",
            IrqRole::GpMmu => "gpmmu",
            IrqRole::PpBroadcast => "pp",
            IrqRole::Pmu => "pmu",
            IrqRole::Pp0 => "pp0",
            IrqRole::PpMmu0 => "ppmmu0",
            IrqRole::Pp1 => "pp1",
            IrqRole::PpMmu1 => "ppmmu1",
            IrqRole::Pp2 => "pp2",
            IrqRole::PpMmu2 => "ppmmu2",
        }
    }

    /// Pixel-processor role of core `core`
    pub const fn pp(core: usize) -> Option<IrqRole> {
        match core {
            0 => Some(IrqRole::Pp0),
            1 => Some(IrqRole::Pp1),
            2 => Some(IrqRole::Pp2),
            _ => None,
        }
    }

    /// Pixel-processor MMU role of core `core`
    pub const fn ppmmu(core: usize) -> Option<IrqRole> {
        match core {
            0 => Some(IrqRole::PpMmu0),
            1 => Some(IrqRole::PpMmu1),
            2 => Some(IrqRole::PpMmu2),
            _ => None,
        }
    }

    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for IrqRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
