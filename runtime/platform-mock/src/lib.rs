//! MOCK platform services for host-side testing
//!
//! # WARNING: This is NOT a kernel!
//!
//! [`MockPlatform`] implements every `platform-bus` service in memory so
//! glue drivers can be exercised on the host. It keeps books on everything
//! it hands out:
//!
//! - live node references, clocks, enabled clocks and device shells
//! - releases of things that were never held (double releases)
//! - an ordered [`Event`] journal of every acquisition and release
//!
//! Each fallible service call has a matching [`Fault`] that forces it to
//! fail, which is how the unwind paths of a glue driver are driven.
//!
//! Lookups are journaled when attempted; acquisitions and releases only when
//! they take effect.

#![no_std]

#[cfg(test)]
#[macro_use]
extern crate std;

extern crate alloc;

mod node;

pub use node::{MockNode, MESON_MALI_BASE, MESON_MALI_IRQS, MESON_MALI_SIZE};

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use platform_bus::{
    errno, AddressRange, BoardDescription, ClockController, ClockHandle, DeviceHandle,
    DeviceRegistry, IrqLine, LookupError, NodeRef, OfMatch, RegistryError, Resource,
    ShellBinding, ShellId,
};

/// A service call forced to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// `alloc_shell` returns `None`
    ShellAlloc,
    /// `clk_get_by_name` reports a deferred provider
    ClockGet,
    /// `address_to_resource` reports an invalid index
    AddressLookup,
    /// `irq_by_name` fails for this interrupt name
    Irq(&'static str),
    /// `add_resources` runs out of memory
    AddResources,
    /// `add_data` runs out of memory
    AddData,
    /// `prepare_enable` fails with an I/O error
    ClockEnable,
    /// `publish` reports the device as busy
    Publish,
}

/// One entry of the service journal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    NodeGet(NodeRef),
    NodePut(NodeRef),
    ShellAlloc(ShellId),
    ShellBind(ShellId),
    ShellPut(ShellId),
    ClockGet(ClockHandle),
    ClockPut(ClockHandle),
    ClockDefaults(NodeRef),
    ClockEnable(ClockHandle),
    ClockDisable(ClockHandle),
    AddressLookup(usize),
    IrqLookup(String),
    ResourcesAdded(ShellId, usize),
    DataAdded(ShellId, usize),
    DmaConfigured(ShellId),
    RuntimePmEnabled(ShellId),
    Published(ShellId),
}

impl Event {
    /// Check whether this event gives something back
    pub fn is_release(&self) -> bool {
        matches!(
            self,
            Event::NodePut(_) | Event::ShellPut(_) | Event::ClockPut(_) | Event::ClockDisable(_)
        )
    }
}

/// A device shell as the registry sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockShell {
    pub id: ShellId,
    pub driver_name: String,
    pub instance: i32,
    pub binding: Option<ShellBinding>,
    pub resources: Vec<Resource>,
    pub data: Vec<u8>,
    pub dma_configured: bool,
    pub runtime_pm: bool,
    pub published: bool,
}

/// In-memory board description, clock framework and device registry
#[derive(Debug, Default)]
pub struct MockPlatform {
    nodes: Vec<MockNode>,
    node_refs: BTreeMap<NodeRef, u32>,
    clocks: BTreeSet<ClockHandle>,
    enabled: BTreeSet<ClockHandle>,
    next_clock: u32,
    shells: BTreeMap<ShellId, MockShell>,
    next_shell: u32,
    faults: Vec<Fault>,
    journal: Vec<Event>,
    double_releases: usize,
    clock_puts: usize,
}

impl MockPlatform {
    /// Create a platform with an empty board description
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node to the board description
    pub fn with_node(mut self, node: MockNode) -> Self {
        self.nodes.push(node);
        self
    }

    /// Force a service call to fail
    pub fn with_fault(mut self, fault: Fault) -> Self {
        self.inject(fault);
        self
    }

    /// Force a service call to fail from now on
    pub fn inject(&mut self, fault: Fault) {
        if !self.faults.contains(&fault) {
            self.faults.push(fault);
        }
    }

    /// Remove every injected fault
    pub fn clear_faults(&mut self) {
        self.faults.clear();
    }

    fn faulted(&self, fault: Fault) -> bool {
        let hit = self.faults.contains(&fault);
        if hit {
            log::trace!("mock: injected fault {:?}", fault);
        }
        hit
    }

    fn node(&self, node: NodeRef) -> Option<&MockNode> {
        let index = usize::try_from(node.0).ok()?.checked_sub(1)?;
        self.nodes.get(index)
    }

    fn double_release(&mut self, what: &str) {
        log::warn!("mock: release of {} that is not held", what);
        self.double_releases += 1;
    }

    /// Ordered journal of service calls
    pub fn journal(&self) -> &[Event] {
        &self.journal
    }

    /// Release events only, in the order they happened
    pub fn releases(&self) -> Vec<Event> {
        self.journal.iter().filter(|e| e.is_release()).cloned().collect()
    }

    /// Interrupt names looked up, in order
    pub fn irq_lookups(&self) -> Vec<&str> {
        self.journal
            .iter()
            .filter_map(|e| match e {
                Event::IrqLookup(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Outstanding node references
    pub fn live_nodes(&self) -> u32 {
        self.node_refs.values().sum()
    }

    /// Clocks acquired and not yet released
    pub fn live_clocks(&self) -> usize {
        self.clocks.len()
    }

    /// Clocks currently enabled
    pub fn enabled_clocks(&self) -> usize {
        self.enabled.len()
    }

    /// Shells allocated and not released, published or not
    pub fn live_shells(&self) -> usize {
        self.shells.len()
    }

    /// Releases of handles that were not held
    pub fn double_releases(&self) -> usize {
        self.double_releases
    }

    /// Successful clock releases
    pub fn clock_puts(&self) -> usize {
        self.clock_puts
    }

    /// Look up a shell by id
    pub fn shell(&self, shell: ShellId) -> Option<&MockShell> {
        self.shells.get(&shell)
    }

    /// Devices visible in the registry
    pub fn published(&self) -> Vec<&MockShell> {
        self.shells.values().filter(|s| s.published).collect()
    }

    /// Check that nothing is held and nothing was released twice
    pub fn is_quiescent(&self) -> bool {
        self.live_nodes() == 0
            && self.live_clocks() == 0
            && self.enabled_clocks() == 0
            && self.live_shells() == 0
            && self.double_releases == 0
    }
}

impl BoardDescription for MockPlatform {
    fn find_matching_node(&mut self, matches: &[OfMatch]) -> Option<NodeRef> {
        let index = self
            .nodes
            .iter()
            .position(|n| matches.iter().any(|m| m.matches(&n.compatible)))?;
        let node = NodeRef(u32::try_from(index + 1).ok()?);

        *self.node_refs.entry(node).or_insert(0) += 1;
        self.journal.push(Event::NodeGet(node));
        Some(node)
    }

    fn put_node(&mut self, node: NodeRef) {
        match self.node_refs.get_mut(&node) {
            Some(count) => {
                *count -= 1;
                if *count == 0 {
                    self.node_refs.remove(&node);
                }
                self.journal.push(Event::NodePut(node));
            }
            None => self.double_release("node reference"),
        }
    }

    fn address_to_resource(
        &mut self,
        node: NodeRef,
        index: usize,
    ) -> Result<AddressRange, LookupError> {
        self.journal.push(Event::AddressLookup(index));
        if self.faulted(Fault::AddressLookup) {
            return Err(LookupError::InvalidIndex { index });
        }

        let node = self.node(node).ok_or(LookupError::NotFound)?;
        node.regs
            .get(index)
            .copied()
            .ok_or(LookupError::InvalidIndex { index })
    }

    fn irq_by_name(&mut self, node: NodeRef, name: &str) -> Result<IrqLine, LookupError> {
        self.journal.push(Event::IrqLookup(name.to_string()));
        if self.faults.iter().any(|f| matches!(f, Fault::Irq(n) if *n == name)) {
            log::trace!("mock: injected fault on interrupt '{}'", name);
            return Err(LookupError::Errno(-errno::ENXIO));
        }

        let raw = self
            .node(node)
            .and_then(|n| n.irq(name))
            .ok_or(LookupError::NotFound)?;
        IrqLine::from_raw(raw)
    }
}

impl ClockController for MockPlatform {
    fn clk_get_by_name(&mut self, node: NodeRef, name: &str) -> Result<ClockHandle, LookupError> {
        if self.faulted(Fault::ClockGet) {
            return Err(LookupError::Deferred);
        }

        let known = self.node(node).is_some_and(|n| n.has_clock(name));
        if !known {
            return Err(LookupError::NotFound);
        }

        self.next_clock += 1;
        let clock = ClockHandle(self.next_clock);
        self.clocks.insert(clock);
        self.journal.push(Event::ClockGet(clock));
        Ok(clock)
    }

    fn clk_put(&mut self, clock: ClockHandle) {
        if self.clocks.remove(&clock) {
            self.clock_puts += 1;
            self.journal.push(Event::ClockPut(clock));
        } else {
            self.double_release("clock");
        }
    }

    fn set_defaults(&mut self, node: NodeRef) {
        self.journal.push(Event::ClockDefaults(node));
    }

    fn prepare_enable(&mut self, clock: ClockHandle) -> Result<(), LookupError> {
        if self.faulted(Fault::ClockEnable) {
            return Err(LookupError::Errno(-errno::EIO));
        }
        if !self.clocks.contains(&clock) {
            return Err(LookupError::Errno(-errno::EINVAL));
        }

        self.enabled.insert(clock);
        self.journal.push(Event::ClockEnable(clock));
        Ok(())
    }

    fn disable_unprepare(&mut self, clock: ClockHandle) {
        if self.enabled.remove(&clock) {
            self.journal.push(Event::ClockDisable(clock));
        } else {
            self.double_release("clock enable");
        }
    }
}

impl DeviceRegistry for MockPlatform {
    fn alloc_shell(&mut self, name: &str, id: i32) -> Option<ShellId> {
        if self.faulted(Fault::ShellAlloc) {
            return None;
        }

        self.next_shell += 1;
        let shell = ShellId(self.next_shell);
        self.shells.insert(
            shell,
            MockShell {
                id: shell,
                driver_name: name.to_string(),
                instance: id,
                binding: None,
                resources: Vec::new(),
                data: Vec::new(),
                dma_configured: false,
                runtime_pm: false,
                published: false,
            },
        );
        self.journal.push(Event::ShellAlloc(shell));
        Some(shell)
    }

    fn put_shell(&mut self, shell: ShellId) {
        match self.shells.get(&shell) {
            Some(s) if !s.published => {
                self.shells.remove(&shell);
                self.journal.push(Event::ShellPut(shell));
            }
            _ => self.double_release("device shell"),
        }
    }

    fn bind(&mut self, shell: ShellId, binding: ShellBinding) {
        if let Some(s) = self.shells.get_mut(&shell) {
            s.binding = Some(binding);
            self.journal.push(Event::ShellBind(shell));
        }
    }

    fn add_resources(
        &mut self,
        shell: ShellId,
        resources: &[Resource],
    ) -> Result<(), RegistryError> {
        if self.faulted(Fault::AddResources) {
            return Err(RegistryError::OutOfMemory);
        }

        let s = self.shells.get_mut(&shell).ok_or(RegistryError::Invalid)?;
        s.resources.extend_from_slice(resources);
        self.journal.push(Event::ResourcesAdded(shell, resources.len()));
        Ok(())
    }

    fn add_data(&mut self, shell: ShellId, data: &[u8]) -> Result<(), RegistryError> {
        if self.faulted(Fault::AddData) {
            return Err(RegistryError::OutOfMemory);
        }

        let s = self.shells.get_mut(&shell).ok_or(RegistryError::Invalid)?;
        s.data = data.to_vec();
        self.journal.push(Event::DataAdded(shell, data.len()));
        Ok(())
    }

    fn configure_dma(&mut self, shell: ShellId, _node: NodeRef) {
        if let Some(s) = self.shells.get_mut(&shell) {
            s.dma_configured = true;
            self.journal.push(Event::DmaConfigured(shell));
        }
    }

    fn enable_runtime_pm(&mut self, shell: ShellId) {
        if let Some(s) = self.shells.get_mut(&shell) {
            s.runtime_pm = true;
            self.journal.push(Event::RuntimePmEnabled(shell));
        }
    }

    fn publish(&mut self, shell: ShellId) -> Result<DeviceHandle, RegistryError> {
        if self.faulted(Fault::Publish) {
            return Err(RegistryError::Busy);
        }

        let s = self.shells.get(&shell).ok_or(RegistryError::Invalid)?;
        let taken = self.shells.values().any(|other| {
            other.published && other.driver_name == s.driver_name && other.instance == s.instance
        });
        if taken {
            log::warn!("mock: {}.{} is already published", s.driver_name, s.instance);
            return Err(RegistryError::Busy);
        }

        let s = self.shells.get_mut(&shell).ok_or(RegistryError::Invalid)?;
        s.published = true;
        self.journal.push(Event::Published(shell));
        Ok(DeviceHandle::new(shell))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MATCHES: &[OfMatch] = &[OfMatch::new("amlogic,meson-gxbb-mali")];

    #[test]
    fn test_find_and_put_node() {
        let mut platform = MockPlatform::new().with_node(MockNode::meson_gxbb());

        let node = platform.find_matching_node(MATCHES).unwrap();
        assert_eq!(platform.live_nodes(), 1);

        platform.put_node(node);
        assert_eq!(platform.live_nodes(), 0);
        assert!(platform.is_quiescent());
    }

    #[test]
    fn test_no_matching_node() {
        let mut platform = MockPlatform::new().with_node(MockNode::new("arm,mali-400"));

        assert!(platform.find_matching_node(MATCHES).is_none());
        assert!(platform.journal().is_empty());
    }

    #[test]
    fn test_double_put_node_is_counted() {
        let mut platform = MockPlatform::new().with_node(MockNode::meson_gxbb());
        let node = platform.find_matching_node(MATCHES).unwrap();

        platform.put_node(node);
        platform.put_node(node);
        assert_eq!(platform.double_releases(), 1);
        assert!(!platform.is_quiescent());
    }

    #[test]
    fn test_clock_lifecycle() {
        let mut platform = MockPlatform::new().with_node(MockNode::meson_gxbb());
        let node = platform.find_matching_node(MATCHES).unwrap();

        let clock = platform.clk_get_by_name(node, "core").unwrap();
        assert_eq!(platform.live_clocks(), 1);

        platform.prepare_enable(clock).unwrap();
        assert_eq!(platform.enabled_clocks(), 1);

        platform.disable_unprepare(clock);
        platform.clk_put(clock);
        platform.clk_put(clock);

        assert_eq!(platform.live_clocks(), 0);
        assert_eq!(platform.clock_puts(), 1);
        assert_eq!(platform.double_releases(), 1);
    }

    #[test]
    fn test_unknown_clock() {
        let mut platform = MockPlatform::new().with_node(MockNode::meson_gxbb());
        let node = platform.find_matching_node(MATCHES).unwrap();

        let result = platform.clk_get_by_name(node, "gpu");
        assert_eq!(result, Err(LookupError::NotFound));
        assert_eq!(platform.live_clocks(), 0);
    }

    #[test]
    fn test_irq_lookup() {
        let node = MockNode::meson_gxbb().with_irq("pp2", -517);
        let mut platform = MockPlatform::new().with_node(node);
        let node = platform.find_matching_node(MATCHES).unwrap();

        assert_eq!(platform.irq_by_name(node, "gp"), Ok(IrqLine(160)));
        assert_eq!(platform.irq_by_name(node, "pp2"), Err(LookupError::Deferred));
        assert_eq!(platform.irq_by_name(node, "nope"), Err(LookupError::NotFound));
        assert_eq!(platform.irq_lookups(), vec!["gp", "pp2", "nope"]);
    }

    #[test]
    fn test_injected_faults() {
        let mut platform = MockPlatform::new()
            .with_node(MockNode::meson_gxbb())
            .with_fault(Fault::ClockGet)
            .with_fault(Fault::Irq("pmu"))
            .with_fault(Fault::ShellAlloc);
        let node = platform.find_matching_node(MATCHES).unwrap();

        assert_eq!(platform.clk_get_by_name(node, "core"), Err(LookupError::Deferred));
        assert_eq!(platform.irq_by_name(node, "pmu"), Err(LookupError::Errno(-6)));
        assert_eq!(platform.irq_by_name(node, "pp"), Ok(IrqLine(162)));
        assert!(platform.alloc_shell("mali-utgard", 0).is_none());

        platform.clear_faults();
        assert!(platform.alloc_shell("mali-utgard", 0).is_some());
    }

    #[test]
    fn test_shell_publish() {
        let mut platform = MockPlatform::new();
        let shell = platform.alloc_shell("mali-utgard", 0).unwrap();

        platform
            .add_resources(shell, &[Resource::irq("gp", IrqLine(1))])
            .unwrap();
        platform.add_data(shell, &[1, 2, 3]).unwrap();
        let device = platform.publish(shell).unwrap();

        assert_eq!(device.shell(), shell);
        assert_eq!(platform.published().len(), 1);
        assert_eq!(platform.publish(shell), Err(RegistryError::Busy));

        // Published shells belong to the registry
        platform.put_shell(shell);
        assert_eq!(platform.double_releases(), 1);
        assert_eq!(platform.live_shells(), 1);
    }

    #[test]
    fn test_publish_rejects_duplicate_name_and_instance() {
        let mut platform = MockPlatform::new();
        let first = platform.alloc_shell("mali-utgard", 0).unwrap();
        platform.publish(first).unwrap();

        let second = platform.alloc_shell("mali-utgard", 0).unwrap();
        assert_eq!(platform.publish(second), Err(RegistryError::Busy));
        assert!(!platform.shell(second).unwrap().published);

        let other_instance = platform.alloc_shell("mali-utgard", 1).unwrap();
        assert!(platform.publish(other_instance).is_ok());

        platform.put_shell(second);
        assert_eq!(platform.published().len(), 2);
        assert_eq!(platform.double_releases(), 0);
    }

    #[test]
    fn test_release_journal_order() {
        let mut platform = MockPlatform::new().with_node(MockNode::meson_gxl());
        let node = platform
            .find_matching_node(&[OfMatch::new("amlogic,meson-gxl-mali")])
            .unwrap();
        let shell = platform.alloc_shell("mali-utgard", 0).unwrap();
        let clock = platform.clk_get_by_name(node, "core").unwrap();

        platform.clk_put(clock);
        platform.put_shell(shell);
        platform.put_node(node);

        assert_eq!(
            platform.releases(),
            vec![Event::ClockPut(clock), Event::ShellPut(shell), Event::NodePut(node)]
        );
        assert!(platform.is_quiescent());
    }
}
