//! Meson Mali Glue - Platform device registration for the Mali-450 MP3
//!
//! # Purpose
//! The Mali driver does not probe the Amlogic Meson GPU from the board
//! description itself. This glue finds the GPU's board node, builds the
//! resource table the driver expects (one register window plus the
//! interrupt lines of every core), attaches the board's fixed platform
//! data, switches on the core clock and publishes the result as a platform
//! device named `mali-utgard`.
//!
//! # Integration Points
//! - Depends on: `platform-bus` services (board description, clocks, registry)
//! - Provides to: the module lifecycle, through [`MaliGlue::register`] and
//!   [`MaliGlue::unregister`]
//! - Hands to the Mali driver: a [`ResourceTable`] and a [`GpuDeviceData`] blob
//!
//! # Architecture
//! Registration is a fixed sequence of steps. Each acquisition arms an undo
//! action on an [`UnwindLadder`]; a failing step unwinds the ladder so the
//! attempt leaves nothing behind. The core clock handle is the only state
//! that outlives a successful registration and lives in the coordinator's
//! [`ClockSlot`].
//!
//! # Testing Strategy
//! - Unit tests: table layout, platform data encoding, ladder ordering
//! - Integration tests: full registration against `platform-mock`, including
//!   a fault-injection sweep over every fallible step

#![no_std]

#[cfg(test)]
#[macro_use]
extern crate std;

extern crate alloc;

pub mod config;
pub mod device_data;
mod error;
pub mod registration;
pub mod resources;
pub mod unwind;

pub use config::{BoardConfig, IrqRole, MAX_PP};
pub use device_data::GpuDeviceData;
pub use error::{Error, Result};
pub use registration::{ClockSlot, MaliGlue};
pub use resources::{
    build_resources, IrqSet, ResourceTable, MALI450_APERTURE_SIZE, MALI450_MP3_LAYOUT,
    MALI450_MP3_RESOURCES,
};
pub use unwind::UnwindLadder;
