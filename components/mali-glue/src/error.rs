//! Registration errors

use platform_bus::{errno, LookupError, RegistryError};
use thiserror::Error;

use crate::config::IrqRole;

/// Why a registration attempt failed
///
/// Every variant is terminal: by the time the caller sees it, everything the
/// attempt acquired has been released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    #[error("Couldn't find the mali node")]
    NotFound,

    #[error("Couldn't allocate {what}")]
    AllocationFailure { what: &'static str },

    #[error("Couldn't retrieve our module clock: {source}")]
    ClockUnavailable { source: LookupError },

    #[error("Couldn't retrieve our base address: {source}")]
    AddressResolutionFailure { source: LookupError },

    #[error("Couldn't get '{role}' interrupt: {source}")]
    InterruptResolutionFailure { role: IrqRole, source: LookupError },

    #[error("Couldn't add our resources: {0}")]
    ResourceAttachFailure(#[source] RegistryError),

    #[error("Couldn't add platform data: {0}")]
    ConfigAttachFailure(#[source] RegistryError),

    #[error("Couldn't add our device: {0}")]
    PublishFailure(#[source] RegistryError),

    #[error("Mali platform device already registered")]
    AlreadyRegistered,
}

impl Error {
    /// Negative errno reported to the module loader
    pub fn to_errno(&self) -> i32 {
        match self {
            Error::NotFound => -errno::ENODEV,
            Error::AllocationFailure { .. } => -errno::EINVAL,
            Error::ClockUnavailable { source }
            | Error::AddressResolutionFailure { source }
            | Error::InterruptResolutionFailure { source, .. } => source.to_errno(),
            Error::ResourceAttachFailure(e)
            | Error::ConfigAttachFailure(e)
            | Error::PublishFailure(e) => e.to_errno(),
            Error::AlreadyRegistered => -errno::EBUSY,
        }
    }
}

pub type Result<T> = core::result::Result<T, Error>;
