use ash::vk;

/// A trait for types wrapping a raw Vulkan handle.
pub trait AsVkHandle {
    type Handle: vk::Handle + Copy;
    fn vk_handle(&self) -> Self::Handle;
}
