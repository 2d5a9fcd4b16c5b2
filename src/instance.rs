//! Vulkan instance creation.

use std::{fmt::Debug, ops::Deref, sync::Arc};

use ash::{prelude::VkResult, vk};

/// A Vulkan instance wrapper, reference-counted for cheap sharing.
///
/// The instance is the connection to the Vulkan loader. It stays alive for as
/// long as any [`Device`](crate::Device) created from it.
#[derive(Clone)]
pub struct Instance(Arc<InstanceInner>);

struct InstanceInner {
    #[allow(dead_code)]
    entry: ash::Entry,
    instance: ash::Instance,
}

impl Instance {
    /// Loads the Vulkan library and creates an instance targeting Vulkan 1.3.
    ///
    /// Returns [`vk::Result::ERROR_INITIALIZATION_FAILED`] if the Vulkan
    /// loader cannot be found on the system.
    pub fn new() -> VkResult<Self> {
        let entry = unsafe { ash::Entry::load() }.map_err(|err| {
            tracing::error!(?err, "failed to load the Vulkan library");
            vk::Result::ERROR_INITIALIZATION_FAILED
        })?;
        let application_info = vk::ApplicationInfo {
            api_version: vk::API_VERSION_1_3,
            ..Default::default()
        };
        let create_info = vk::InstanceCreateInfo::default().application_info(&application_info);
        let instance = unsafe { entry.create_instance(&create_info, None) }?;
        Ok(Self(Arc::new(InstanceInner { entry, instance })))
    }
}

impl Deref for Instance {
    type Target = ash::Instance;

    fn deref(&self) -> &Self::Target {
        &self.0.instance
    }
}

impl Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Instance")
            .field(&self.0.instance.handle())
            .finish()
    }
}

impl Drop for InstanceInner {
    fn drop(&mut self) {
        tracing::info!(instance = ?self.instance.handle(), "drop instance");
        unsafe {
            self.instance.destroy_instance(None);
        }
    }
}
