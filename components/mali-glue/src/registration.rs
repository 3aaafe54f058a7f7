//! Registration Coordinator
//!
//! Brings the Mali platform device up in a fixed sequence of steps. Every
//! step that acquires something arms an undo action on an [`UnwindLadder`];
//! the first failing step stops the sequence, and the ladder releases
//! everything acquired so far in reverse order before the error is returned.
//!
//! ```text
//! find node -> alloc shell -> bind -> get clock -> resolve address
//!   -> resolve interrupts -> build table -> attach table -> attach data
//!   -> dma / clock defaults / enable clock -> runtime pm -> publish
//! ```
//!
//! On success the board-node reference is dropped, the clock handle is kept
//! in the coordinator's clock slot, and the registry owns the device.

use platform_bus::{
    dma_bit_mask, BusType, ClockHandle, DeviceHandle, IrqLine, NodeRef, Platform, ShellBinding,
    ShellId,
};

use crate::config::{BoardConfig, IrqRole};
use crate::device_data::GpuDeviceData;
use crate::resources::{build_resources, IrqSet};
use crate::unwind::UnwindLadder;
use crate::{Error, Result};

/// Lifecycle of the retained clock handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockSlot {
    /// No registration attempted yet
    Uninitialized,
    /// Registration succeeded; the clock is held until unregistration
    Holding(ClockHandle),
    /// Unregistered, or the last registration attempt failed
    Released,
}

/// What a successful bring-up leaves behind
struct Registered {
    node: NodeRef,
    clock: ClockHandle,
    device: DeviceHandle,
}

/// Mali platform glue for one board
///
/// Owns the host services it drives and the single clock slot. The module
/// lifecycle constructs one instance and calls [`register`](Self::register)
/// and [`unregister`](Self::unregister) from its entry and exit points.
pub struct MaliGlue<P: Platform> {
    platform: P,
    config: BoardConfig,
    slot: ClockSlot,
    device: Option<DeviceHandle>,
}

impl<P: Platform> MaliGlue<P> {
    /// Create the glue for the Meson board family
    pub fn new(platform: P) -> Self {
        Self::with_config(platform, BoardConfig::MESON)
    }

    /// Create the glue with custom lookup parameters
    pub fn with_config(platform: P, config: BoardConfig) -> Self {
        Self {
            platform,
            config,
            slot: ClockSlot::Uninitialized,
            device: None,
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    pub fn into_platform(self) -> P {
        self.platform
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    /// Current state of the clock slot
    pub fn state(&self) -> ClockSlot {
        self.slot
    }

    /// Clock retained by a successful registration
    pub fn clock(&self) -> Option<ClockHandle> {
        match self.slot {
            ClockSlot::Holding(clock) => Some(clock),
            _ => None,
        }
    }

    /// Device published by a successful registration
    pub fn device(&self) -> Option<DeviceHandle> {
        self.device
    }

    /// Create, describe and publish the Mali platform device
    ///
    /// # Returns
    /// `Ok(())` once the device is visible in the registry and the core
    /// clock is held
    ///
    /// # Errors
    /// Returns the error of the first failing step, after every resource
    /// the attempt acquired has been released. Returns
    /// [`Error::AlreadyRegistered`] without touching any service if a
    /// previous registration has not been undone.
    pub fn register(&mut self) -> Result<()> {
        if let ClockSlot::Holding(_) = self.slot {
            let err = Error::AlreadyRegistered;
            log::error!("{}", err);
            return Err(err);
        }

        let mut ladder = UnwindLadder::new();
        match self.bring_up(&mut ladder) {
            Ok(Registered {
                node,
                clock,
                device,
            }) => {
                ladder.dismiss();
                self.platform.put_node(node);
                self.slot = ClockSlot::Holding(clock);
                self.device = Some(device);
                log::info!("Amlogic Mali glue initialized");
                Ok(())
            }
            Err(err) => {
                log::error!("{}", err);
                ladder.unwind(&mut self.platform);
                self.slot = ClockSlot::Released;
                Err(err)
            }
        }
    }

    /// Release the clock retained by [`register`](Self::register)
    ///
    /// The published device is left to the registry. Calling this without a
    /// successful registration, or a second time, does nothing.
    pub fn unregister(&mut self) -> Result<()> {
        if let ClockSlot::Holding(clock) = self.slot {
            log::debug!("releasing core clock {:?}", clock);
            self.platform.clk_put(clock);
            self.slot = ClockSlot::Released;
            self.device = None;
        }
        Ok(())
    }

    fn bring_up<'a>(&mut self, ladder: &mut UnwindLadder<'a, P>) -> Result<Registered>
    where
        P: 'a,
    {
        let config = self.config;

        let node = self
            .platform
            .find_matching_node(config.matches)
            .ok_or(Error::NotFound)?;
        ladder.push("put board node", move |p: &mut P| p.put_node(node));

        let shell = self
            .platform
            .alloc_shell(config.driver_name, config.instance_id)
            .ok_or(Error::AllocationFailure {
                what: "device shell",
            })?;
        ladder.push("put device shell", move |p: &mut P| p.put_shell(shell));

        self.platform.bind(
            shell,
            ShellBinding {
                name: config.driver_name,
                of_node: node,
                coherent_dma_mask: dma_bit_mask(config.dma_mask_bits),
                bus: BusType::Platform,
            },
        );

        let clock = self
            .platform
            .clk_get_by_name(node, config.clock_name)
            .map_err(|source| Error::ClockUnavailable { source })?;
        ladder.push("put core clock", move |p: &mut P| p.clk_put(clock));

        let window = self
            .platform
            .address_to_resource(node, config.reg_index)
            .map_err(|source| Error::AddressResolutionFailure { source })?;

        let irqs = self.resolve_irqs(node)?;

        self.attach(shell, window.start, &irqs)?;

        self.platform.configure_dma(shell, node);
        self.platform.set_defaults(node);
        match self.platform.prepare_enable(clock) {
            Ok(()) => ladder.push("disable core clock", move |p: &mut P| {
                p.disable_unprepare(clock)
            }),
            Err(e) => log::warn!("Couldn't enable our module clock: {}", e),
        }

        self.platform.enable_runtime_pm(shell);

        let device = self.platform.publish(shell).map_err(Error::PublishFailure)?;

        Ok(Registered {
            node,
            clock,
            device,
        })
    }

    /// Resolve every interrupt role, stopping at the first failure
    fn resolve_irqs(&mut self, node: NodeRef) -> Result<IrqSet> {
        let mut lines = [IrqLine(0); IrqRole::COUNT];
        for (line, role) in lines.iter_mut().zip(IrqRole::LOOKUP_ORDER) {
            *line = self
                .platform
                .irq_by_name(node, role.name())
                .map_err(|source| Error::InterruptResolutionFailure { role, source })?;
        }
        Ok(IrqSet::from_lookup_order(lines))
    }

    /// Build the resource table and copy it and the platform data into the shell
    fn attach(&mut self, shell: ShellId, base_address: u64, irqs: &IrqSet) -> Result<()> {
        let table = build_resources(base_address, irqs)?;
        self.platform
            .add_resources(shell, table.as_slice())
            .map_err(Error::ResourceAttachFailure)?;
        drop(table);

        self.platform
            .add_data(shell, &GpuDeviceData::MESON.to_bytes())
            .map_err(Error::ConfigAttachFailure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform_bus::{LookupError, RegistryError};
    use platform_mock::{Event, Fault, MockNode, MockPlatform};

    fn glue(platform: MockPlatform) -> MaliGlue<MockPlatform> {
        let _ = env_logger::builder().is_test(true).try_init();
        MaliGlue::new(platform)
    }

    #[test]
    fn test_register_success() {
        let mut glue = glue(MockPlatform::new().with_node(MockNode::meson_gxbb()));

        glue.register().unwrap();

        assert!(matches!(glue.state(), ClockSlot::Holding(_)));
        assert!(glue.device().is_some());
        assert_eq!(glue.platform().live_nodes(), 0);
        assert_eq!(glue.platform().live_clocks(), 1);
        assert_eq!(glue.platform().published().len(), 1);
    }

    #[test]
    fn test_register_without_node() {
        let mut glue = glue(MockPlatform::new());

        assert_eq!(glue.register(), Err(Error::NotFound));
        assert_eq!(glue.state(), ClockSlot::Released);
        assert!(glue.platform().journal().is_empty());
    }

    #[test]
    fn test_clock_failure_unwinds_shell_and_node() {
        let mut glue = glue(
            MockPlatform::new()
                .with_node(MockNode::meson_gxbb())
                .with_fault(Fault::ClockGet),
        );

        assert_eq!(
            glue.register(),
            Err(Error::ClockUnavailable {
                source: LookupError::Deferred
            })
        );
        let platform = glue.platform();
        assert!(platform.is_quiescent());
        assert!(matches!(
            platform.releases().as_slice(),
            [Event::ShellPut(_), Event::NodePut(_)]
        ));
    }

    #[test]
    fn test_interrupt_failure_names_role() {
        let mut glue = glue(
            MockPlatform::new().with_node(MockNode::meson_gxbb().without_irq("pmu")),
        );

        assert_eq!(
            glue.register(),
            Err(Error::InterruptResolutionFailure {
                role: IrqRole::Pmu,
                source: LookupError::NotFound,
            })
        );
        assert_eq!(glue.platform().irq_lookups(), vec!["gp", "gpmmu", "pp", "pmu"]);
        assert!(glue.platform().is_quiescent());
    }

    #[test]
    fn test_publish_failure_disables_then_puts_clock() {
        let mut glue = glue(
            MockPlatform::new()
                .with_node(MockNode::meson_gxbb())
                .with_fault(Fault::Publish),
        );

        assert_eq!(
            glue.register(),
            Err(Error::PublishFailure(RegistryError::Busy))
        );
        let platform = glue.platform();
        assert!(platform.is_quiescent());
        assert!(matches!(
            platform.releases().as_slice(),
            [
                Event::ClockDisable(_),
                Event::ClockPut(_),
                Event::ShellPut(_),
                Event::NodePut(_)
            ]
        ));
    }

    #[test]
    fn test_register_twice_is_rejected() {
        let mut glue = glue(MockPlatform::new().with_node(MockNode::meson_gxbb()));
        glue.register().unwrap();
        let journal_len = glue.platform().journal().len();

        assert_eq!(glue.register(), Err(Error::AlreadyRegistered));
        assert_eq!(glue.platform().journal().len(), journal_len);
        assert_eq!(glue.platform().published().len(), 1);
    }

    #[test]
    fn test_unregister_releases_clock_once() {
        let mut glue = glue(MockPlatform::new().with_node(MockNode::meson_gxbb()));
        glue.register().unwrap();

        glue.unregister().unwrap();
        glue.unregister().unwrap();

        assert_eq!(glue.state(), ClockSlot::Released);
        assert_eq!(glue.device(), None);
        assert_eq!(glue.platform().clock_puts(), 1);
        assert_eq!(glue.platform().double_releases(), 0);
    }

    #[test]
    fn test_unregister_before_register() {
        let mut glue = glue(MockPlatform::new());

        glue.unregister().unwrap();
        assert_eq!(glue.state(), ClockSlot::Uninitialized);
        assert!(glue.platform().journal().is_empty());
    }
}
