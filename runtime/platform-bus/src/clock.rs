//! Clock framework service

use crate::{ClockHandle, LookupError, NodeRef};

/// Clock acquisition and gating
pub trait ClockController {
    /// Acquire the clock the node names `name`
    ///
    /// # Returns
    /// A clock handle the caller owns and must hand back with
    /// [`clk_put`](Self::clk_put).
    ///
    /// # Errors
    /// Returns error if the node names no such clock or its provider is not
    /// ready
    fn clk_get_by_name(&mut self, node: NodeRef, name: &str) -> Result<ClockHandle, LookupError>;

    /// Release an acquired clock
    fn clk_put(&mut self, clock: ClockHandle);

    /// Apply the node's assigned clock parents and rates
    fn set_defaults(&mut self, node: NodeRef);

    /// Prepare and ungate a clock
    ///
    /// # Errors
    /// Returns error if the clock could not be enabled
    fn prepare_enable(&mut self, clock: ClockHandle) -> Result<(), LookupError>;

    /// Gate and unprepare a clock enabled with [`prepare_enable`](Self::prepare_enable)
    fn disable_unprepare(&mut self, clock: ClockHandle);
}
