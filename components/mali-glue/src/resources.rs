//! Resource Table Builder
//!
//! Lays out the resources of a Mali-450 MP3 the way the Mali driver expects
//! to find them: one memory window covering the whole register aperture,
//! then the nine interrupt lines of the geometry processor, the three pixel
//! processors with their MMUs, and the pixel-processor broadcast unit.
//!
//! The PMU interrupt is part of the resolved set but has no descriptor: the
//! MP3 layout gives the PMU a register block and nothing else.

use alloc::vec::Vec;
use platform_bus::{AddressRange, IrqLine, Resource};

use crate::config::{IrqRole, MAX_PP};
use crate::{Error, Result};

/// Size of the Mali-450 register aperture
pub const MALI450_APERTURE_SIZE: u64 = 0x4_0000;

/// Number of descriptors in a Mali-450 MP3 resource table
pub const MALI450_MP3_RESOURCES: usize = 10;

/// Name of the register-window descriptor
pub const RES_ADDRESS: &str = "address";

/// Descriptor names in table order
pub const MALI450_MP3_LAYOUT: [&str; MALI450_MP3_RESOURCES] = [
    RES_ADDRESS,
    "gp",
    "gpmmu",
    "pp0",
    "ppmmu0",
    "pp1",
    "ppmmu1",
    "pp2",
    "ppmmu2",
    "pp",
];

/// Interrupt roles in table order, after the register window
const IRQ_LAYOUT: [IrqRole; MALI450_MP3_RESOURCES - 1] = [
    IrqRole::Gp,
    IrqRole::GpMmu,
    IrqRole::Pp0,
    IrqRole::PpMmu0,
    IrqRole::Pp1,
    IrqRole::PpMmu1,
    IrqRole::Pp2,
    IrqRole::PpMmu2,
    IrqRole::PpBroadcast,
];

/// One resolved interrupt line per [`IrqRole`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IrqSet {
    lines: [IrqLine; IrqRole::COUNT],
}

impl IrqSet {
    /// Assemble a set from individually resolved lines
    pub fn new(
        gp: IrqLine,
        gpmmu: IrqLine,
        pp_broadcast: IrqLine,
        pmu: IrqLine,
        pp: [IrqLine; MAX_PP],
        ppmmu: [IrqLine; MAX_PP],
    ) -> Self {
        Self::from_lookup_order([
            gp, gpmmu, pp_broadcast, pmu, pp[0], ppmmu[0], pp[1], ppmmu[1], pp[2], ppmmu[2],
        ])
    }

    /// Assemble a set from lines listed in [`IrqRole::LOOKUP_ORDER`]
    pub fn from_lookup_order(lines: [IrqLine; IrqRole::COUNT]) -> Self {
        Self { lines }
    }

    /// Line resolved for `role`
    pub fn get(&self, role: IrqRole) -> IrqLine {
        self.lines[role.index()]
    }
}

/// An owned, ordered Mali-450 MP3 resource table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceTable {
    resources: Vec<Resource>,
}

impl ResourceTable {
    /// Descriptors in table order
    pub fn as_slice(&self) -> &[Resource] {
        &self.resources
    }

    /// Number of descriptors
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Check whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Iterate over descriptors in table order
    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.resources.iter()
    }

    /// Find a descriptor by name, as the Mali driver does
    pub fn by_name(&self, name: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.name == name)
    }

    /// Register window
    pub fn window(&self) -> Option<AddressRange> {
        match self.by_name(RES_ADDRESS)?.kind {
            platform_bus::ResourceKind::Memory(range) => Some(range),
            platform_bus::ResourceKind::Irq(_) => None,
        }
    }

    /// Interrupt line of `role`, if the layout carries one
    pub fn irq(&self, role: IrqRole) -> Option<IrqLine> {
        self.by_name(role.name())?.irq_line()
    }
}

/// Build the Mali-450 MP3 resource table
///
/// # Arguments
/// * `base_address` - Physical base of the GPU register aperture
/// * `irqs` - Resolved interrupt lines; not re-validated here
///
/// # Returns
/// Exactly [`MALI450_MP3_RESOURCES`] descriptors in [`MALI450_MP3_LAYOUT`] order
///
/// # Errors
/// Returns [`Error::AllocationFailure`] if the table cannot be allocated
pub fn build_resources(base_address: u64, irqs: &IrqSet) -> Result<ResourceTable> {
    let mut resources = reserve_table(MALI450_MP3_RESOURCES)?;

    resources.push(Resource::memory(
        RES_ADDRESS,
        AddressRange::from_base_size(base_address, MALI450_APERTURE_SIZE),
    ));
    resources.extend(
        IRQ_LAYOUT
            .iter()
            .map(|&role| Resource::irq(role.name(), irqs.get(role))),
    );

    Ok(ResourceTable { resources })
}

/// Allocate room for `len` descriptors up front
fn reserve_table(len: usize) -> Result<Vec<Resource>> {
    let mut resources = Vec::new();
    resources
        .try_reserve_exact(len)
        .map_err(|_| Error::AllocationFailure {
            what: "resource table",
        })?;
    Ok(resources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform_bus::{ResourceFlags, ResourceKind};

    fn sample_irqs() -> IrqSet {
        IrqSet::new(
            IrqLine(160),
            IrqLine(161),
            IrqLine(162),
            IrqLine(163),
            [IrqLine(164), IrqLine(166), IrqLine(168)],
            [IrqLine(165), IrqLine(167), IrqLine(169)],
        )
    }

    #[test]
    fn test_table_order() {
        let table = build_resources(0xd00c_0000, &sample_irqs()).unwrap();

        assert_eq!(table.len(), MALI450_MP3_RESOURCES);
        let names: std::vec::Vec<_> = table.iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            ["address", "gp", "gpmmu", "pp0", "ppmmu0", "pp1", "ppmmu1", "pp2", "ppmmu2", "pp"]
        );
    }

    #[test]
    fn test_register_window() {
        let table = build_resources(0xd00c_0000, &sample_irqs()).unwrap();

        let first = &table.as_slice()[0];
        assert_eq!(first.flags(), ResourceFlags::MEM);
        assert_eq!(first.start(), 0xd00c_0000);
        assert_eq!(first.end(), 0xd00f_ffff);
        assert_eq!(table.window().map(|w| w.size()), Some(MALI450_APERTURE_SIZE));
    }

    #[test]
    fn test_interrupt_lines() {
        let table = build_resources(0, &sample_irqs()).unwrap();

        assert!(table.iter().skip(1).all(|r| r.flags() == ResourceFlags::IRQ));
        assert_eq!(table.irq(IrqRole::Gp), Some(IrqLine(160)));
        assert_eq!(table.irq(IrqRole::PpBroadcast), Some(IrqLine(162)));
        assert_eq!(table.irq(IrqRole::Pp1), Some(IrqLine(166)));
        assert_eq!(table.irq(IrqRole::PpMmu2), Some(IrqLine(169)));
    }

    #[test]
    fn test_pmu_has_no_descriptor() {
        let table = build_resources(0, &sample_irqs()).unwrap();

        assert!(table.by_name("pmu").is_none());
        assert_eq!(table.irq(IrqRole::Pmu), None);
    }

    #[test]
    fn test_lookup_order_constructor() {
        let ordered = IrqSet::from_lookup_order([
            IrqLine(160),
            IrqLine(161),
            IrqLine(162),
            IrqLine(163),
            IrqLine(164),
            IrqLine(165),
            IrqLine(166),
            IrqLine(167),
            IrqLine(168),
            IrqLine(169),
        ]);
        assert_eq!(ordered, sample_irqs());
        assert_eq!(ordered.get(IrqRole::Pmu), IrqLine(163));
    }

    #[test]
    fn test_window_follows_base_address() {
        let table = build_resources(0xc113_0000, &sample_irqs()).unwrap();

        match table.as_slice()[0].kind {
            ResourceKind::Memory(range) => {
                assert_eq!(range.start, 0xc113_0000);
                assert_eq!(range.size(), MALI450_APERTURE_SIZE);
            }
            ResourceKind::Irq(_) => panic!("first descriptor must be the register window"),
        }
    }

    #[test]
    fn test_window_at_top_of_address_space() {
        let irqs = IrqSet::from_lookup_order([IrqLine(1); IrqRole::COUNT]);
        let table = build_resources(0xFFFF_FFFF_FFFF_0000, &irqs).unwrap();

        assert_eq!(table.len(), MALI450_MP3_RESOURCES);
        let window = table.window().unwrap();
        assert_eq!(window.start, 0xFFFF_FFFF_FFFF_0000);
        assert_eq!(window.size(), MALI450_APERTURE_SIZE);
        assert!(table.iter().skip(1).all(|r| r.irq_line() == Some(IrqLine(1))));
    }

    #[test]
    fn test_reserve_failure_maps_to_allocation_failure() {
        assert_eq!(
            reserve_table(usize::MAX),
            Err(Error::AllocationFailure {
                what: "resource table"
            })
        );
        assert!(reserve_table(MALI450_MP3_RESOURCES).unwrap().capacity() >= MALI450_MP3_RESOURCES);
    }
}
