//! Platform Bus - Collaborator seams for board glue drivers
//!
//! # Purpose
//! Board glue code turns a hardware-description node into a live platform
//! device. It never owns the services it talks to: the board-description
//! lookup, the clock framework and the device registry all belong to the
//! surrounding kernel. This crate describes those services as traits so the
//! glue can be written once and driven either by the real kernel or by the
//! in-memory mock.
//!
//! # Integration Points
//! - Depends on: `core` only
//! - Provides to: `meson-mali-glue`, `platform-mock`
//! - Handles: [`NodeRef`], [`ClockHandle`], [`ShellId`], [`DeviceHandle`]
//!
//! # Architecture
//! Handles are plain tokens, the same way capability slots are plain
//! numbers: the service that issued a handle owns the object behind it, and
//! the holder is responsible for giving it back exactly once.
//!
//! # Testing Strategy
//! - Unit tests: resource descriptors, error to errno mapping
//! - Integration tests: exercised through `platform-mock`

#![no_std]

#[cfg(test)]
#[macro_use]
extern crate std;

pub mod board;
pub mod clock;
pub mod errno;
pub mod handle;
pub mod registry;
pub mod resource;

pub use board::{BoardDescription, OfMatch};
pub use clock::ClockController;
pub use handle::{BusType, ClockHandle, DeviceHandle, NodeRef, ShellBinding, ShellId};
pub use registry::DeviceRegistry;
pub use resource::{dma_bit_mask, AddressRange, IrqLine, Resource, ResourceFlags, ResourceKind};

use thiserror::Error;

/// Errors reported by board-description and clock lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("No such entry in the board node")]
    NotFound,

    #[error("Provider not ready yet (probe deferred)")]
    Deferred,

    #[error("Index {index} out of range")]
    InvalidIndex { index: usize },

    #[error("Lookup failed with errno {0}")]
    Errno(i32),
}

impl LookupError {
    /// Classify a negative kernel return code
    pub fn from_errno(code: i32) -> Self {
        match code.wrapping_neg() {
            errno::ENOENT => Self::NotFound,
            errno::EPROBE_DEFER => Self::Deferred,
            _ => Self::Errno(code),
        }
    }

    /// Negative errno the kernel would have handed back for this failure
    pub fn to_errno(&self) -> i32 {
        match self {
            Self::NotFound => -errno::ENOENT,
            Self::Deferred => -errno::EPROBE_DEFER,
            Self::InvalidIndex { .. } => -errno::EINVAL,
            Self::Errno(code) => *code,
        }
    }
}

/// Errors reported by the device registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Out of memory")]
    OutOfMemory,

    #[error("Device or name already in use")]
    Busy,

    #[error("Invalid device shell")]
    Invalid,

    #[error("Registry failed with errno {0}")]
    Errno(i32),
}

impl RegistryError {
    /// Negative errno the kernel would have handed back for this failure
    pub fn to_errno(&self) -> i32 {
        match self {
            Self::OutOfMemory => -errno::ENOMEM,
            Self::Busy => -errno::EBUSY,
            Self::Invalid => -errno::EINVAL,
            Self::Errno(code) => *code,
        }
    }
}

/// Everything a platform glue driver needs from its host
///
/// Blanket-implemented for any type providing all three services, so the
/// kernel binding and the mock only implement the individual traits.
pub trait Platform: BoardDescription + ClockController + DeviceRegistry {}

impl<T> Platform for T where T: BoardDescription + ClockController + DeviceRegistry {}
