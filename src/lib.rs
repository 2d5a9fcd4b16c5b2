//! Synchronization strategy injection for Vulkan command submission.
//!
//! # Overview
//!
//! GPU operations need to synchronize with their surroundings, but only the
//! caller knows what those surroundings are. This crate's [`SyncHandle`]
//! inverts the responsibility: the caller picks a strategy (none, wait-idle,
//! semaphores, or pipeline barriers) and passes the handle into the
//! operation, which records its work and barriers through it and finalizes
//! with [`SyncHandle::submit_and_sync`].
//!
//! ```no_run
//! use scoria::prelude::*;
//!
//! # fn main() -> ash::prelude::VkResult<()> {
//! let (device, queue) = Device::create_system_default()?;
//!
//! let mut sync = SyncHandle::wait_idle().on_queue(queue);
//! let command_buffer = sync.get_or_create_command_buffer()?;
//! command_buffer.global_memory_barrier(GlobalBarrier::after_operation(
//!     vk::PipelineStageFlags2::COPY,
//!     Some(WriteAccess::new(vk::AccessFlags2::TRANSFER_WRITE)),
//! ));
//! sync.submit_and_sync()?;
//! # Ok(())
//! # }
//! ```

pub mod access;
pub mod command;
mod device;
pub mod frame;
mod instance;
pub mod queue;
mod semaphore;
pub mod sync;
pub mod utils;

pub use device::{Device, HasDevice};
pub use instance::Instance;
pub use queue::Queue;
pub use semaphore::Semaphore;

pub use ash;

pub mod prelude {
    pub use crate::access::{Access, GlobalBarrier, ReadAccess, WriteAccess};
    pub use crate::command::{CommandBuffer, CommandBufferState};
    pub use crate::frame::FrameContext;
    pub use crate::sync::{AfterBarrier, BeforeBarrier, HandlerKind, SyncHandle, SyncType};
    pub use crate::utils::AsVkHandle;
    pub use crate::{Device, HasDevice, Instance, Queue, Semaphore};
    pub use ash::{self, vk};
}
