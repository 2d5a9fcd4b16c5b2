//! Vulkan queue management.
//!
//! This module provides the [`Queue`] type for submitting command buffers to
//! the GPU.
//!
//! # Overview
//!
//! Queues schedule command buffers for GPU execution. Submissions to a queue
//! are guaranteed to **start** in order, but may **finish** out of order
//! depending on workload and GPU scheduling. Cross-submission ordering is the
//! job of a [`SyncHandle`](crate::sync::SyncHandle)'s strategy.
//!
//! Each `Queue` handle owns a transient command pool for the single-use
//! command buffers handed out by
//! [`create_single_use_command_buffer`](Queue::create_single_use_command_buffer).

use std::{
    fmt::Debug,
    sync::{Arc, Mutex, MutexGuard},
};

use ash::{prelude::VkResult, vk};
use smallvec::SmallVec;

use crate::{
    Device, HasDevice, Semaphore,
    command::{CommandBuffer, CommandBufferState},
    utils::AsVkHandle,
};

/// A Vulkan command queue for scheduling GPU work.
///
/// Reference-counted; clones share the same underlying queue, command pool
/// and submission lock. Equality is handle identity, so a cloned `Queue`
/// compares equal to its original while two handles obtained separately from
/// [`Device::get_queue`] do not.
#[derive(Clone)]
pub struct Queue(Arc<QueueInner>);

struct QueueInner {
    device: Device,
    handle: vk::Queue,
    family_index: u32,
    /// Transient pool backing single-use command buffers.
    pool: vk::CommandPool,
    /// Guards the queue and the pool. Both require external synchronization.
    lock: Mutex<()>,
}

impl PartialEq for Queue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for Queue {}

impl Debug for Queue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Queue")
            .field("handle", &self.0.handle)
            .field("family_index", &self.0.family_index)
            .finish()
    }
}

impl HasDevice for Queue {
    fn device(&self) -> &Device {
        &self.0.device
    }
}

impl AsVkHandle for Queue {
    type Handle = vk::Queue;
    fn vk_handle(&self) -> Self::Handle {
        self.0.handle
    }
}

impl Queue {
    /// Returns the queue family index.
    pub fn family_index(&self) -> u32 {
        self.0.family_index
    }

    pub(crate) fn from_raw(
        device: Device,
        queue: vk::Queue,
        family_index: u32,
    ) -> VkResult<Self> {
        let pool = unsafe {
            device.create_command_pool(
                &vk::CommandPoolCreateInfo {
                    flags: vk::CommandPoolCreateFlags::TRANSIENT,
                    queue_family_index: family_index,
                    ..Default::default()
                },
                None,
            )?
        };
        Ok(Self(Arc::new(QueueInner {
            device,
            handle: queue,
            family_index,
            pool,
            lock: Mutex::new(()),
        })))
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, ()> {
        self.0.lock.lock().unwrap()
    }

    pub(crate) fn pool(&self) -> vk::CommandPool {
        self.0.pool
    }

    /// Allocates a single-use command buffer from this queue's transient pool
    /// and begins recording with `ONE_TIME_SUBMIT`.
    pub fn create_single_use_command_buffer(&self) -> VkResult<CommandBuffer> {
        let _guard = self.lock();
        unsafe {
            let buffer = self
                .0
                .device
                .allocate_command_buffers(&vk::CommandBufferAllocateInfo {
                    command_pool: self.0.pool,
                    level: vk::CommandBufferLevel::PRIMARY,
                    command_buffer_count: 1,
                    ..Default::default()
                })?[0];
            self.0.device.begin_command_buffer(
                buffer,
                &vk::CommandBufferBeginInfo {
                    flags: vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT,
                    ..Default::default()
                },
            )?;
            Ok(CommandBuffer::from_raw(self.clone(), buffer))
        }
    }

    /// Submits at most one command buffer together with the given semaphore
    /// dependencies.
    ///
    /// The command buffer, if any, must be in the `Executable` state
    /// (recording finished) and transitions to `Submitted` on success.
    /// `wait_before` semaphores gate the whole submission; `signal_after` is
    /// signalled once the submission completes.
    pub fn submit(
        &self,
        mut command_buffer: Option<&mut CommandBuffer>,
        wait_before: &[Semaphore],
        signal_after: Option<&Semaphore>,
    ) -> VkResult<()> {
        if let Some(cb) = command_buffer.as_deref() {
            assert_eq!(
                cb.state(),
                CommandBufferState::Executable,
                "The command buffer must finish recording first!"
            );
        }
        let command_buffer_infos: SmallVec<[vk::CommandBufferSubmitInfo; 1]> = command_buffer
            .iter()
            .map(|cb| vk::CommandBufferSubmitInfo {
                command_buffer: cb.vk_handle(),
                ..Default::default()
            })
            .collect();
        let wait_semaphore_infos: SmallVec<[vk::SemaphoreSubmitInfo; 4]> = wait_before
            .iter()
            .map(|semaphore| vk::SemaphoreSubmitInfo {
                semaphore: semaphore.vk_handle(),
                stage_mask: vk::PipelineStageFlags2::ALL_COMMANDS,
                ..Default::default()
            })
            .collect();
        let signal_semaphore_infos: SmallVec<[vk::SemaphoreSubmitInfo; 1]> = signal_after
            .iter()
            .map(|semaphore| vk::SemaphoreSubmitInfo {
                semaphore: semaphore.vk_handle(),
                stage_mask: vk::PipelineStageFlags2::ALL_COMMANDS,
                ..Default::default()
            })
            .collect();
        let submit = vk::SubmitInfo2::default()
            .command_buffer_infos(&command_buffer_infos)
            .wait_semaphore_infos(&wait_semaphore_infos)
            .signal_semaphore_infos(&signal_semaphore_infos);
        let _guard = self.lock();
        unsafe {
            self.0
                .device
                .queue_submit2(self.0.handle, &[submit], vk::Fence::null())?;
        }
        if let Some(cb) = command_buffer.as_deref_mut() {
            cb.mark_submitted();
        }
        Ok(())
    }

    /// Blocks until all submissions on this queue have completed.
    pub fn wait_idle(&self) -> VkResult<()> {
        let _guard = self.lock();
        unsafe { self.0.device.queue_wait_idle(self.0.handle) }
    }
}

impl Drop for QueueInner {
    fn drop(&mut self) {
        tracing::debug!(queue = ?self.handle, "drop queue");
        unsafe {
            self.device.destroy_command_pool(self.pool, None);
        }
    }
}
