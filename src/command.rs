//! Single-use command buffers.
//!
//! # Overview
//!
//! A [`CommandBuffer`] wraps a primary Vulkan command buffer allocated from
//! its queue's transient pool and begun with `ONE_TIME_SUBMIT`. It moves
//! through three states:
//!
//! ```text
//! Recording -> Executable -> Submitted
//! ```
//!
//! Recording starts immediately on allocation
//! ([`Queue::create_single_use_command_buffer`](crate::Queue::create_single_use_command_buffer)),
//! [`end`](CommandBuffer::end) finishes it, and
//! [`Queue::submit`](crate::Queue::submit) marks it `Submitted`.
//!
//! The buffer is freed back to its pool on drop. Dropping a `Submitted`
//! buffer is the normal retirement path; the holder (a lifetime handler, a
//! signal [`Semaphore`](crate::Semaphore), or a
//! [`FrameContext`](crate::frame::FrameContext) bucket) is responsible for
//! only dropping it once the submission is known to have completed.

use ash::{prelude::VkResult, vk};

use crate::{Device, HasDevice, Queue, access::GlobalBarrier, utils::AsVkHandle};

/// Lifecycle state of a [`CommandBuffer`].
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CommandBufferState {
    /// Currently being recorded with commands.
    Recording,
    /// Recording finished, ready for submission to a queue.
    Executable,
    /// Submitted to a queue.
    Submitted,
}

/// A single-use Vulkan command buffer bound to the queue it was allocated
/// from.
pub struct CommandBuffer {
    queue: Queue,
    buffer: vk::CommandBuffer,
    state: CommandBufferState,
}

impl AsVkHandle for CommandBuffer {
    type Handle = vk::CommandBuffer;

    fn vk_handle(&self) -> Self::Handle {
        self.buffer
    }
}

impl HasDevice for CommandBuffer {
    fn device(&self) -> &Device {
        self.queue.device()
    }
}

impl CommandBuffer {
    pub(crate) fn from_raw(queue: Queue, buffer: vk::CommandBuffer) -> Self {
        Self {
            queue,
            buffer,
            state: CommandBufferState::Recording,
        }
    }

    /// Returns the current state of the command buffer.
    pub fn state(&self) -> CommandBufferState {
        self.state
    }

    /// Returns the queue this command buffer was allocated from.
    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    /// Records a global memory barrier via `vkCmdPipelineBarrier2`.
    ///
    /// # Panics
    ///
    /// Panics if the command buffer is no longer in the `Recording` state.
    pub fn global_memory_barrier(&mut self, barrier: GlobalBarrier) {
        assert_eq!(
            self.state,
            CommandBufferState::Recording,
            "Barriers can only be recorded into a command buffer that is still recording!"
        );
        let _guard = self.queue.lock();
        unsafe {
            self.device().cmd_pipeline_barrier2(
                self.buffer,
                &vk::DependencyInfo::default().memory_barriers(&[vk::MemoryBarrier2 {
                    src_stage_mask: barrier.src.stage,
                    src_access_mask: barrier.src.access,
                    dst_stage_mask: barrier.dst.stage,
                    dst_access_mask: barrier.dst.access,
                    ..Default::default()
                }]),
            );
        }
    }

    /// Finishes recording, transitioning to the `Executable` state.
    ///
    /// Calling `end` on an already executable buffer is a no-op.
    pub fn end(&mut self) -> VkResult<()> {
        match self.state {
            CommandBufferState::Recording => {
                let _guard = self.queue.lock();
                unsafe {
                    self.device().end_command_buffer(self.buffer)?;
                }
                self.state = CommandBufferState::Executable;
                Ok(())
            }
            CommandBufferState::Executable => Ok(()),
            CommandBufferState::Submitted => {
                panic!("The command buffer has already been submitted!")
            }
        }
    }

    pub(crate) fn mark_submitted(&mut self) {
        self.state = CommandBufferState::Submitted;
    }
}

impl Drop for CommandBuffer {
    fn drop(&mut self) {
        match self.state {
            // Normal retirement through a lifetime handler.
            CommandBufferState::Submitted => {}
            _ => {
                tracing::debug!(
                    command_buffer = ?self.buffer,
                    "dropping a command buffer that was never submitted"
                );
            }
        }
        let _guard = self.queue.lock();
        unsafe {
            self.device()
                .free_command_buffers(self.queue.pool(), &[self.buffer]);
        }
    }
}
