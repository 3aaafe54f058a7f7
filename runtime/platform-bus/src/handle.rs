//! Opaque handles issued by the platform services
//!
//! A handle is only a token. The service that issued it keeps the object
//! alive until the holder gives the handle back through the matching
//! release call (`put_node`, `clk_put`, `put_shell`).

use core::fmt;

/// Reference to a board-description node
///
/// Obtained from [`BoardDescription::find_matching_node`](crate::BoardDescription::find_matching_node),
/// which takes a reference the caller must drop with `put_node`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef(pub u32);

/// Ownership of one gateable clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClockHandle(pub u32);

/// A device shell: allocated, configurable, not yet visible in the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShellId(pub u32);

/// A device published in the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceHandle {
    shell: ShellId,
}

impl DeviceHandle {
    /// Create the handle for a shell that has just been published
    pub fn new(shell: ShellId) -> Self {
        Self { shell }
    }

    /// The shell this device was published from
    pub fn shell(&self) -> ShellId {
        self.shell
    }
}

impl fmt::Display for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "device#{}", self.shell.0)
    }
}

/// Bus a device shell is affiliated with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusType {
    /// Non-discoverable, board-described devices
    Platform,
}

/// Identity, addressing and bus metadata bound onto a fresh shell
///
/// Binding is plain field assignment on the registry side and cannot fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShellBinding {
    /// Device name as it will appear in the registry
    pub name: &'static str,

    /// Board node the device is described by
    pub of_node: NodeRef,

    /// Coherent DMA addressing capability
    pub coherent_dma_mask: u64,

    /// Bus affiliation
    pub bus: BusType,
}
