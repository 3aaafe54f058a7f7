//! Board-description lookup service
//!
//! The board description is treated as an opaque lookup service: nodes are
//! found by compatible string and queried for their address ranges and
//! named interrupts. Parsing the description format is not our concern.

use crate::{AddressRange, IrqLine, LookupError, NodeRef};

/// One entry of a compatible-string match table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OfMatch {
    /// Compatible string, e.g. `"amlogic,meson-gxbb-mali"`
    pub compatible: &'static str,
}

impl OfMatch {
    pub const fn new(compatible: &'static str) -> Self {
        Self { compatible }
    }

    /// Check a node's compatible string against this entry
    pub fn matches(&self, compatible: &str) -> bool {
        self.compatible == compatible
    }
}

/// Board-description lookups
pub trait BoardDescription {
    /// Find the first node matching any entry of `matches`
    ///
    /// # Returns
    /// A node reference the caller owns and must hand back with
    /// [`put_node`](Self::put_node), or `None` if no node matches.
    fn find_matching_node(&mut self, matches: &[OfMatch]) -> Option<NodeRef>;

    /// Drop a node reference
    fn put_node(&mut self, node: NodeRef);

    /// Translate the node's `index`th address entry into a physical range
    ///
    /// # Errors
    /// Returns error if the entry is missing or cannot be translated
    fn address_to_resource(&mut self, node: NodeRef, index: usize)
        -> Result<AddressRange, LookupError>;

    /// Resolve a named interrupt of the node
    ///
    /// # Errors
    /// Returns error if the name is unknown or the line cannot be mapped
    fn irq_by_name(&mut self, node: NodeRef, name: &str) -> Result<IrqLine, LookupError>;
}
