//! Binary semaphores with resource retention.

use std::{any::Any, fmt::Debug};

use ash::{prelude::VkResult, vk};

use crate::{Device, HasDevice, utils::AsVkHandle};

/// A binary Vulkan semaphore.
///
/// Besides wrapping the raw handle, a `Semaphore` can [`retain`](Self::retain)
/// arbitrary resources. The waits that gate a submission and the command
/// buffer it signals for must stay alive until the GPU is done with them;
/// parking them on the signal semaphore ties their lifetime to whoever ends
/// up owning the semaphore.
pub struct Semaphore {
    device: Device,
    handle: vk::Semaphore,
    retained: Vec<Box<dyn Any + Send>>,
}

impl Semaphore {
    /// Creates a new, unsignalled binary semaphore.
    pub fn new_binary(device: Device) -> VkResult<Self> {
        let handle =
            unsafe { device.create_semaphore(&vk::SemaphoreCreateInfo::default(), None) }?;
        Ok(Self {
            device,
            handle,
            retained: Vec::new(),
        })
    }

    /// Keeps `resource` alive for as long as this semaphore.
    pub fn retain(&mut self, resource: impl Any + Send) {
        self.retained.push(Box::new(resource));
    }
}

impl HasDevice for Semaphore {
    fn device(&self) -> &Device {
        &self.device
    }
}

impl AsVkHandle for Semaphore {
    type Handle = vk::Semaphore;

    fn vk_handle(&self) -> Self::Handle {
        self.handle
    }
}

impl Debug for Semaphore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Semaphore")
            .field("handle", &self.handle)
            .field("retained", &self.retained.len())
            .finish()
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_semaphore(self.handle, None);
        }
    }
}
