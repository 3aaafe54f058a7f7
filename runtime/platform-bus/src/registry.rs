//! Device registry service
//!
//! A device starts life as a shell: allocated, not visible. The caller fills
//! in binding metadata, resources and platform data, then publishes it. The
//! registry copies resources and data when they are attached, so the caller
//! keeps ownership of whatever it passed in.

use crate::{DeviceHandle, NodeRef, RegistryError, Resource, ShellBinding, ShellId};

/// Platform device registry
pub trait DeviceRegistry {
    /// Allocate an unbound device shell
    ///
    /// # Arguments
    /// * `name` - Driver name the shell is created for
    /// * `id` - Instance id
    ///
    /// # Returns
    /// A shell the caller owns until it is published, or `None` if no memory
    /// is available
    fn alloc_shell(&mut self, name: &str, id: i32) -> Option<ShellId>;

    /// Release an unpublished shell and everything attached to it
    fn put_shell(&mut self, shell: ShellId);

    /// Bind identity, board node, DMA capability and bus onto the shell
    fn bind(&mut self, shell: ShellId, binding: ShellBinding);

    /// Copy `resources` into the shell
    ///
    /// # Errors
    /// Returns error if the copy cannot be allocated
    fn add_resources(&mut self, shell: ShellId, resources: &[Resource]) -> Result<(), RegistryError>;

    /// Copy an opaque platform-data blob into the shell
    ///
    /// # Errors
    /// Returns error if the copy cannot be allocated
    fn add_data(&mut self, shell: ShellId, data: &[u8]) -> Result<(), RegistryError>;

    /// Derive DMA configuration for the shell from its board node
    fn configure_dma(&mut self, shell: ShellId, node: NodeRef);

    /// Turn on runtime power management for the shell
    fn enable_runtime_pm(&mut self, shell: ShellId);

    /// Make the shell visible as a live device
    ///
    /// On success the registry owns the shell; on failure the caller still
    /// owns it and must release it with [`put_shell`](Self::put_shell).
    ///
    /// # Errors
    /// Returns error if the registry rejects the device
    fn publish(&mut self, shell: ShellId) -> Result<DeviceHandle, RegistryError>;
}
