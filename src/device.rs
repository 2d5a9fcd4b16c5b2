//! Logical device creation and management.
//!
//! # Overview
//!
//! A Vulkan logical device represents a connection to the driver of a
//! physical GPU with a specific configuration of features and queues. This
//! module provides:
//!
//! - [`Device`]: The main device handle, reference-counted for cheap sharing
//! - [`HasDevice`]: Trait for types associated with a device
//!
//! For simple use cases, [`Device::create_system_default`] creates a device
//! with sensible defaults:
//!
//! ```no_run
//! # use scoria::Device;
//! let (device, queue) = Device::create_system_default().unwrap();
//! ```
//!
//! The device is created with Vulkan 1.3 and the `synchronization2` feature
//! enabled; all submissions and barriers in this crate go through the
//! synchronization2 entry points.

use std::{fmt::Debug, ops::Deref, sync::Arc};

use ash::{prelude::VkResult, vk};

use crate::{Instance, Queue, utils::AsVkHandle};

/// A trait for types created from a Vulkan device.
pub trait HasDevice {
    /// Returns a reference to the Vulkan device.
    fn device(&self) -> &Device;

    /// Returns a reference to the Vulkan [`Instance`].
    fn instance(&self) -> &Instance {
        self.device().instance()
    }
}

/// A Vulkan logical device wrapper.
///
/// Reference-counted using [`Arc`] for cheap shared access. Dereferences to
/// [`ash::Device`] for direct access to device-level commands.
#[derive(Clone)]
pub struct Device(Arc<DeviceInner>);

impl PartialEq for Device {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for Device {}
impl Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Device")
            .field(&self.0.device.handle())
            .finish()
    }
}

struct DeviceInner {
    instance: Instance,
    physical_device: vk::PhysicalDevice,
    device: ash::Device,
    queue_family_index: u32,
}

impl Device {
    /// Creates a logical device on the given physical device with a single
    /// queue from `queue_family_index`.
    ///
    /// The device is created with the Vulkan 1.3 `synchronization2` feature,
    /// which this crate requires for submission and barriers.
    pub fn new(
        instance: Instance,
        physical_device: vk::PhysicalDevice,
        queue_family_index: u32,
    ) -> VkResult<Self> {
        let queue_priorities = [1.0f32];
        let queue_create_info = vk::DeviceQueueCreateInfo::default()
            .queue_family_index(queue_family_index)
            .queue_priorities(&queue_priorities);
        let mut vulkan13_features = vk::PhysicalDeviceVulkan13Features {
            synchronization2: vk::TRUE,
            ..Default::default()
        };
        let create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(std::slice::from_ref(&queue_create_info))
            .push_next(&mut vulkan13_features);
        let device =
            unsafe { instance.create_device(physical_device, &create_info, None) }?;
        Ok(Self(Arc::new(DeviceInner {
            instance,
            physical_device,
            device,
            queue_family_index,
        })))
    }

    /// Creates a system default device with basic configuration.
    ///
    /// This is a convenience method that creates an [`Instance`], selects the
    /// first physical device with a graphics-capable queue family, and
    /// creates a logical device with a single queue from that family.
    ///
    /// # Errors
    ///
    /// Returns a Vulkan error if no Vulkan loader is present, no compatible
    /// physical device is found, or device creation fails.
    pub fn create_system_default() -> VkResult<(Self, Queue)> {
        let instance = Instance::new()?;
        let physical_devices = unsafe { instance.enumerate_physical_devices() }?;
        let (physical_device, queue_family_index) = physical_devices
            .into_iter()
            .find_map(|physical_device| {
                let families = unsafe {
                    instance.get_physical_device_queue_family_properties(physical_device)
                };
                families
                    .iter()
                    .position(|family| family.queue_flags.contains(vk::QueueFlags::GRAPHICS))
                    .map(|index| (physical_device, index as u32))
            })
            .ok_or(vk::Result::ERROR_INCOMPATIBLE_DRIVER)?;
        let device = Self::new(instance, physical_device, queue_family_index)?;
        let queue = device.get_queue()?;
        Ok((device, queue))
    }

    /// Returns a reference to the Vulkan [`Instance`].
    pub fn instance(&self) -> &Instance {
        &self.0.instance
    }

    /// Returns the physical device this logical device was created on.
    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.0.physical_device
    }

    /// Returns the queue family index the device's queue was created from.
    pub fn queue_family_index(&self) -> u32 {
        self.0.queue_family_index
    }

    /// Obtains a new handle to the device's queue.
    ///
    /// Each call returns an independent handle with its own transient command
    /// pool. Clone an existing [`Queue`] to share one handle; independent
    /// handles to the same underlying queue must not submit concurrently.
    pub fn get_queue(&self) -> VkResult<Queue> {
        let raw_queue =
            unsafe { self.0.device.get_device_queue(self.0.queue_family_index, 0) };
        Queue::from_raw(self.clone(), raw_queue, self.0.queue_family_index)
    }

    /// Blocks until all queues of this device are idle.
    pub fn wait_idle(&self) -> VkResult<()> {
        unsafe { self.0.device.device_wait_idle() }
    }
}

impl Deref for Device {
    type Target = ash::Device;

    fn deref(&self) -> &Self::Target {
        &self.0.device
    }
}

impl AsVkHandle for Device {
    type Handle = vk::Device;

    fn vk_handle(&self) -> Self::Handle {
        self.0.device.handle()
    }
}

impl Drop for DeviceInner {
    fn drop(&mut self) {
        tracing::info!(device = ?self.device.handle(), "drop device");
        // Safety: queues and pools retain an Arc to the device, so none of
        // them can outlive this point.
        unsafe {
            self.device.destroy_device(None);
        }
    }
}
