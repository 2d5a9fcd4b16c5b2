//! Synchronization strategy injection for command submission.
//!
//! # Overview
//!
//! Many GPU operations (uploads, mipmap generation, layout transitions,
//! acceleration structure builds) need to synchronize with whatever comes
//! before and after them, but only the caller knows what that is. A
//! [`SyncHandle`] lets the caller inject the strategy into the operation:
//!
//! - [`SyncHandle::not_required`]: the caller promises that no
//!   synchronization is needed. Requesting a command buffer through such a
//!   handle is a contract violation and panics.
//! - [`SyncHandle::wait_idle`]: coarse and inefficient, but simple. The
//!   operation's command buffer is submitted and the queue is drained with
//!   `vkQueueWaitIdle`.
//! - [`SyncHandle::with_semaphores`]: the submission signals a freshly
//!   created binary [`Semaphore`], optionally waiting on caller-provided
//!   semaphores first. The signal semaphore (carrying ownership of the
//!   command buffer and the waited semaphores) is handed to a caller-supplied
//!   lifetime handler exactly once.
//! - [`SyncHandle::with_barriers`]: the operation records pipeline barriers
//!   before and after its commands, all into one command buffer. After
//!   submission the command buffer is handed to a caller-supplied lifetime
//!   handler which must keep it alive until execution completes.
//! - [`SyncHandle::auxiliary_with_barriers`]: barrier-based synchronization
//!   for an operation subordinate to a master handle. The subordinate's
//!   command buffer is delegated to the master and retired through the
//!   master's lifetime handling when the master is finalized.
//!
//! The operation itself only ever calls
//! [`get_or_create_command_buffer`](SyncHandle::get_or_create_command_buffer),
//! [`establish_barrier_before_the_operation`](SyncHandle::establish_barrier_before_the_operation),
//! [`establish_barrier_after_the_operation`](SyncHandle::establish_barrier_after_the_operation)
//! and finally [`submit_and_sync`](SyncHandle::submit_and_sync); the
//! strategy decides what those calls do.
//!
//! # Queue binding
//!
//! The queue used for submission and synchronization is resolved when it is
//! first needed: an explicit [`on_queue`](SyncHandle::on_queue) binding
//! always wins over a [`set_queue_hint`](SyncHandle::set_queue_hint)
//! recommendation, and having neither is a contract violation.

use std::sync::{Arc, Mutex};

use ash::{prelude::VkResult, vk};

use crate::{
    HasDevice,
    access::{GlobalBarrier, ReadAccess, WriteAccess},
    command::CommandBuffer,
    frame::FrameContext,
    queue::Queue,
    semaphore::Semaphore,
};

/// The fundamental synchronization approach configured in a [`SyncHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncType {
    NotRequired,
    WaitIdle,
    ViaSemaphore,
    ViaBarrier,
}

/// Distinguishes the built-in conservative barrier handlers from
/// caller-supplied ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    /// One of the conservative [`GlobalBarrier`] constructors.
    Default,
    /// A caller-supplied callback.
    Custom,
}

/// Callback recording the barrier at the beginning of an operation.
pub type BeforeBarrierFn =
    Box<dyn FnOnce(&mut CommandBuffer, vk::PipelineStageFlags2, Option<ReadAccess>) + Send>;

/// Callback recording the barrier at the end of an operation.
pub type AfterBarrierFn =
    Box<dyn FnOnce(&mut CommandBuffer, vk::PipelineStageFlags2, Option<WriteAccess>) + Send>;

/// The caller's choice of handler for the barrier recorded before an
/// operation.
///
/// The before-barrier is generally considered optional, so `None` is the
/// usual choice.
pub enum BeforeBarrier {
    /// Record no barrier before the operation.
    None,
    /// Record [`GlobalBarrier::before_operation`].
    Default,
    /// Record a caller-supplied barrier.
    Custom(BeforeBarrierFn),
}

impl BeforeBarrier {
    pub fn custom(
        f: impl FnOnce(&mut CommandBuffer, vk::PipelineStageFlags2, Option<ReadAccess>)
            + Send
            + 'static,
    ) -> Self {
        Self::Custom(Box::new(f))
    }
}

/// The caller's choice of handler for the barrier recorded after an
/// operation.
///
/// The after-barrier is generally considered necessary, so `Default` is the
/// usual choice.
pub enum AfterBarrier {
    /// Record no barrier after the operation.
    None,
    /// Record [`GlobalBarrier::after_operation`].
    Default,
    /// Record a caller-supplied barrier.
    Custom(AfterBarrierFn),
}

impl AfterBarrier {
    pub fn custom(
        f: impl FnOnce(&mut CommandBuffer, vk::PipelineStageFlags2, Option<WriteAccess>)
            + Send
            + 'static,
    ) -> Self {
        Self::Custom(Box::new(f))
    }
}

/// Receives ownership of the signal semaphore after a semaphore-based
/// finalization.
pub type SemaphoreLifetimeHandler = Box<dyn FnOnce(Semaphore) + Send>;

/// Receives ownership of submitted command buffers after a barrier-based
/// finalization. Called once for the handle's own buffer and once per
/// delegated subordinate buffer.
pub type CommandBufferLifetimeHandler = Box<dyn FnMut(CommandBuffer) + Send>;

enum Strategy {
    NotRequired,
    WaitIdle,
    Semaphore {
        lifetime_handler: SemaphoreLifetimeHandler,
        wait_before: Vec<Semaphore>,
    },
    Barrier {
        before: BeforeBarrier,
        after: AfterBarrier,
    },
}

/// Where the handle's command buffer comes from, and where it goes after
/// submission.
enum CommandBufferSource<'buf> {
    /// No buffer provided; one is lazily allocated on demand and dropped
    /// after the strategy no longer needs it.
    Empty,
    /// Lazily allocated buffers are owned by the handle and retired through
    /// this handler after submission.
    Owning(CommandBufferLifetimeHandler),
    /// The operation records into a buffer owned by someone else; the owner
    /// submits it and manages its lifetime.
    Borrowed(&'buf mut CommandBuffer),
    /// Submitted buffers are pushed to a master handle and retired through
    /// the master's lifetime handling.
    Delegated(DelegateSink),
}

/// Collects command buffers of auxiliary handles until their master is
/// finalized.
#[derive(Clone)]
struct DelegateSink(Arc<Mutex<SinkState>>);

struct SinkState {
    closed: bool,
    buffers: Vec<CommandBuffer>,
}

impl DelegateSink {
    fn new() -> Self {
        Self(Arc::new(Mutex::new(SinkState {
            closed: false,
            buffers: Vec::new(),
        })))
    }

    fn assert_open(&self) {
        let closed = self.0.lock().unwrap().closed;
        assert!(
            !closed,
            "auxiliary sync handles must be finalized before their master"
        );
    }

    fn push(&self, command_buffer: CommandBuffer) {
        self.assert_open();
        self.0.lock().unwrap().buffers.push(command_buffer);
    }

    fn close(&self) -> Vec<CommandBuffer> {
        let mut state = self.0.lock().unwrap();
        state.closed = true;
        std::mem::take(&mut state.buffers)
    }
}

fn dispose(source: &mut CommandBufferSource<'_>, command_buffer: CommandBuffer) {
    match source {
        CommandBufferSource::Owning(handler) => handler(command_buffer),
        CommandBufferSource::Delegated(sink) => sink.push(command_buffer),
        CommandBufferSource::Empty => drop(command_buffer),
        CommandBufferSource::Borrowed(_) => {
            tracing::warn!(
                "no lifetime handler available for a subordinate command buffer; dropping it"
            );
            drop(command_buffer);
        }
    }
}

/// A synchronization strategy handle.
///
/// Construct one with a factory, optionally bind a queue, pass it into an
/// operation, and finalize it with
/// [`submit_and_sync`](Self::submit_and_sync). See the [module
/// documentation](self) for the available strategies.
///
/// The lifetime parameter is only relevant for
/// [`with_barriers_on_existing_command_buffer`](Self::with_barriers_on_existing_command_buffer);
/// every other factory returns a `SyncHandle<'static>`.
pub struct SyncHandle<'buf> {
    strategy: Strategy,
    source: CommandBufferSource<'buf>,
    command_buffer: Option<CommandBuffer>,
    queue: Option<Queue>,
    queue_recommendation: Option<Queue>,
    subordinates: Option<DelegateSink>,
}

impl SyncHandle<'static> {
    fn from_strategy(strategy: Strategy) -> Self {
        Self {
            strategy,
            source: CommandBufferSource::Empty,
            command_buffer: None,
            queue: None,
            queue_recommendation: None,
            subordinates: None,
        }
    }

    /// Indicates that no synchronization is required.
    ///
    /// If the promise turns out to be wrong, i.e. the operation requests a
    /// command buffer anyway, there will be a panic.
    pub fn not_required() -> Self {
        Self::from_strategy(Strategy::NotRequired)
    }

    /// Establishes very coarse synchronization by waiting for the queue to
    /// become idle after the operation's submission.
    pub fn wait_idle() -> Self {
        Self::from_strategy(Strategy::WaitIdle)
    }

    /// Establishes semaphore-based synchronization with a custom semaphore
    /// lifetime handler.
    ///
    /// `signalled_after_operation` receives the semaphore that is signalled
    /// once the operation completes on the GPU, exactly once, during
    /// [`submit_and_sync`](Self::submit_and_sync). `wait_before_operation`
    /// are waited on, unmodified, before the operation executes; their
    /// ownership moves onto the signal semaphore.
    pub fn with_semaphores(
        signalled_after_operation: impl FnOnce(Semaphore) + Send + 'static,
        wait_before_operation: Vec<Semaphore>,
    ) -> Self {
        Self::from_strategy(Strategy::Semaphore {
            lifetime_handler: Box::new(signalled_after_operation),
            wait_before: wait_before_operation,
        })
    }

    /// Establishes semaphore-based synchronization with the semaphore's
    /// lifetime handled by the given frame context.
    pub fn with_semaphores_on_current_frame(
        frames: &FrameContext,
        wait_before_operation: Vec<Semaphore>,
    ) -> Self {
        let frames = frames.clone();
        Self::with_semaphores(
            move |semaphore| frames.handle_lifetime_of(semaphore),
            wait_before_operation,
        )
    }

    /// Establishes barrier-based synchronization with a custom command
    /// buffer lifetime handler.
    ///
    /// `command_buffer_lifetime_handler` receives the submitted command
    /// buffer during [`submit_and_sync`](Self::submit_and_sync) and must keep
    /// it alive until execution on the GPU has finished. It also receives the
    /// command buffers of any [auxiliary](Self::auxiliary_with_barriers)
    /// handles created against this one.
    pub fn with_barriers(
        command_buffer_lifetime_handler: impl FnMut(CommandBuffer) + Send + 'static,
        establish_barrier_before: BeforeBarrier,
        establish_barrier_after: AfterBarrier,
    ) -> Self {
        let mut handle = Self::from_strategy(Strategy::Barrier {
            before: establish_barrier_before,
            after: establish_barrier_after,
        });
        handle.source =
            CommandBufferSource::Owning(Box::new(command_buffer_lifetime_handler));
        handle
    }

    /// Establishes barrier-based synchronization with the command buffer's
    /// lifetime handled by the given frame context.
    pub fn with_barriers_on_current_frame(
        frames: &FrameContext,
        establish_barrier_before: BeforeBarrier,
        establish_barrier_after: AfterBarrier,
    ) -> Self {
        let frames = frames.clone();
        Self::with_barriers(
            move |command_buffer| frames.handle_lifetime_of(command_buffer),
            establish_barrier_before,
            establish_barrier_after,
        )
    }

    /// Establishes barrier-based synchronization for an operation which is
    /// subordinate to a master handle.
    ///
    /// The subordinate's command buffer is delegated to `master` at
    /// finalization and retired through the master's lifetime handling when
    /// the master itself is finalized. Auxiliary handles must therefore be
    /// finalized before their master. The subordinate inherits the master's
    /// queue preference as a hint.
    pub fn auxiliary_with_barriers(
        master: &mut SyncHandle<'_>,
        establish_barrier_before: BeforeBarrier,
        establish_barrier_after: AfterBarrier,
    ) -> Self {
        let sink = master
            .subordinates
            .get_or_insert_with(DelegateSink::new)
            .clone();
        let mut handle = Self::from_strategy(Strategy::Barrier {
            before: establish_barrier_before,
            after: establish_barrier_after,
        });
        handle.source = CommandBufferSource::Delegated(sink);
        handle.queue_recommendation = master
            .queue
            .clone()
            .or_else(|| master.queue_recommendation.clone());
        handle
    }
}

impl<'buf> SyncHandle<'buf> {
    /// Establishes barrier-based synchronization recording into a command
    /// buffer owned by someone else.
    ///
    /// The owner is responsible for submitting the buffer and managing its
    /// lifetime; [`submit_and_sync`](Self::submit_and_sync) submits nothing
    /// for such a handle.
    pub fn with_barriers_on_existing_command_buffer(
        command_buffer: &'buf mut CommandBuffer,
        establish_barrier_before: BeforeBarrier,
        establish_barrier_after: AfterBarrier,
    ) -> SyncHandle<'buf> {
        SyncHandle {
            strategy: Strategy::Barrier {
                before: establish_barrier_before,
                after: establish_barrier_after,
            },
            source: CommandBufferSource::Borrowed(command_buffer),
            command_buffer: None,
            queue: None,
            queue_recommendation: None,
            subordinates: None,
        }
    }

    /// Sets the queue where the command is submitted AND where the
    /// synchronization happens. Overrides any queue hint.
    pub fn on_queue(mut self, queue: Queue) -> Self {
        self.queue = Some(queue);
        self
    }

    /// Records a fallback queue recommendation.
    ///
    /// The hint is used only if no explicit [`on_queue`](Self::on_queue)
    /// binding exists. Operations typically set a hint for the queue they
    /// would prefer, leaving the final say to the caller.
    pub fn set_queue_hint(&mut self, queue: Queue) {
        self.queue_recommendation = Some(queue);
    }

    /// The queue which the command and the synchronization will be submitted
    /// to.
    ///
    /// # Panics
    ///
    /// Panics if neither an explicit binding nor a hint was configured.
    pub fn queue_to_use(&self) -> Queue {
        self.queue
            .clone()
            .or_else(|| self.queue_recommendation.clone())
            .expect(
                "no queue configured; call on_queue() or set_queue_hint() before using this sync handle",
            )
    }

    /// Determines the fundamental sync approach configured in this handle.
    pub fn sync_type(&self) -> SyncType {
        match self.strategy {
            Strategy::NotRequired => SyncType::NotRequired,
            Strategy::WaitIdle => SyncType::WaitIdle,
            Strategy::Semaphore { .. } => SyncType::ViaSemaphore,
            Strategy::Barrier { .. } => SyncType::ViaBarrier,
        }
    }

    /// The kind of before-barrier handler still pending, if any.
    pub fn before_barrier_kind(&self) -> Option<HandlerKind> {
        match &self.strategy {
            Strategy::Barrier { before, .. } => match before {
                BeforeBarrier::None => None,
                BeforeBarrier::Default => Some(HandlerKind::Default),
                BeforeBarrier::Custom(_) => Some(HandlerKind::Custom),
            },
            _ => None,
        }
    }

    /// The kind of after-barrier handler still pending, if any.
    pub fn after_barrier_kind(&self) -> Option<HandlerKind> {
        match &self.strategy {
            Strategy::Barrier { after, .. } => match after {
                AfterBarrier::None => None,
                AfterBarrier::Default => Some(HandlerKind::Default),
                AfterBarrier::Custom(_) => Some(HandlerKind::Custom),
            },
            _ => None,
        }
    }

    /// Gets the command buffer provided by the owner, or lazily creates a
    /// single-use command buffer on [`queue_to_use`](Self::queue_to_use) and
    /// stores it within the handle.
    ///
    /// # Panics
    ///
    /// Panics if this handle was created with
    /// [`not_required`](Self::not_required); such a handle promised that no
    /// work would be recorded.
    pub fn get_or_create_command_buffer(&mut self) -> VkResult<&mut CommandBuffer> {
        assert!(
            !matches!(self.strategy, Strategy::NotRequired),
            "this handle promised that no synchronization is required, but a command buffer was requested"
        );
        if !matches!(self.source, CommandBufferSource::Borrowed(_))
            && self.command_buffer.is_none()
        {
            let queue = self.queue_to_use();
            self.command_buffer = Some(queue.create_single_use_command_buffer()?);
        }
        match &mut self.source {
            CommandBufferSource::Borrowed(command_buffer) => Ok(&mut **command_buffer),
            _ => Ok(self
                .command_buffer
                .as_mut()
                .expect("command buffer was just created")),
        }
    }

    /// Records the barrier which syncs the operation with whatever came
    /// before it.
    ///
    /// Meaningful only for barrier-based handles; every other strategy
    /// ignores the call. The configured handler is consumed, so the barrier
    /// is recorded at most once.
    pub fn establish_barrier_before_the_operation(
        &mut self,
        destination_stage: vk::PipelineStageFlags2,
        destination_access: Option<ReadAccess>,
    ) -> VkResult<()> {
        let handler = match &mut self.strategy {
            Strategy::Barrier { before, .. } => {
                std::mem::replace(before, BeforeBarrier::None)
            }
            _ => return Ok(()),
        };
        match handler {
            BeforeBarrier::None => Ok(()),
            BeforeBarrier::Default => {
                let command_buffer = self.get_or_create_command_buffer()?;
                command_buffer.global_memory_barrier(GlobalBarrier::before_operation(
                    destination_stage,
                    destination_access,
                ));
                Ok(())
            }
            BeforeBarrier::Custom(callback) => {
                let command_buffer = self.get_or_create_command_buffer()?;
                callback(command_buffer, destination_stage, destination_access);
                Ok(())
            }
        }
    }

    /// Records the barrier which syncs the operation with whatever comes
    /// after it.
    ///
    /// Meaningful only for barrier-based handles; every other strategy
    /// ignores the call. The configured handler is consumed, so the barrier
    /// is recorded at most once.
    pub fn establish_barrier_after_the_operation(
        &mut self,
        source_stage: vk::PipelineStageFlags2,
        source_access: Option<WriteAccess>,
    ) -> VkResult<()> {
        let handler = match &mut self.strategy {
            Strategy::Barrier { after, .. } => std::mem::replace(after, AfterBarrier::None),
            _ => return Ok(()),
        };
        match handler {
            AfterBarrier::None => Ok(()),
            AfterBarrier::Default => {
                let command_buffer = self.get_or_create_command_buffer()?;
                command_buffer.global_memory_barrier(GlobalBarrier::after_operation(
                    source_stage,
                    source_access,
                ));
                Ok(())
            }
            AfterBarrier::Custom(callback) => {
                let command_buffer = self.get_or_create_command_buffer()?;
                callback(command_buffer, source_stage, source_access);
                Ok(())
            }
        }
    }

    fn drain_subordinates(&mut self) -> Vec<CommandBuffer> {
        self.subordinates
            .take()
            .map(|sink| sink.close())
            .unwrap_or_default()
    }

    /// Submits the command buffer and engages the configured synchronization
    /// strategy.
    ///
    /// Whichever strategy has been configured for this handle is executed
    /// here: waiting idle, signalling and handing off a semaphore, or handing
    /// off the barrier-synchronized command buffer. Command buffers delegated
    /// by auxiliary handles are retired along the same path. Ownership of the
    /// command buffer only moves to its lifetime handler after the submission
    /// succeeded; on error the buffer is dropped and the error propagates.
    pub fn submit_and_sync(mut self) -> VkResult<()> {
        let strategy = std::mem::replace(&mut self.strategy, Strategy::NotRequired);
        match strategy {
            Strategy::NotRequired => {
                assert!(
                    self.command_buffer.is_none(),
                    "this handle promised that no synchronization is required, but a command buffer was recorded"
                );
                // A no-sync handle has no way to keep delegated buffers alive
                // until the GPU is done with them.
                assert!(
                    self.drain_subordinates().is_empty(),
                    "this handle promised that no synchronization is required, but auxiliary handles delegated command buffers to it"
                );
                Ok(())
            }
            Strategy::WaitIdle => {
                let queue = self.queue_to_use();
                if let Some(mut command_buffer) = self.command_buffer.take() {
                    command_buffer.end()?;
                    queue.submit(Some(&mut command_buffer), &[], None)?;
                    queue.wait_idle()?;
                    dispose(&mut self.source, command_buffer);
                } else {
                    queue.wait_idle()?;
                }
                for command_buffer in self.drain_subordinates() {
                    dispose(&mut self.source, command_buffer);
                }
                Ok(())
            }
            Strategy::Semaphore {
                lifetime_handler,
                wait_before,
            } => {
                let queue = self.queue_to_use();
                let mut signal = Semaphore::new_binary(queue.device().clone())?;
                if let Some(command_buffer) = self.command_buffer.as_mut() {
                    command_buffer.end()?;
                }
                queue.submit(self.command_buffer.as_mut(), &wait_before, Some(&signal))?;
                if let Some(command_buffer) = self.command_buffer.take() {
                    signal.retain(command_buffer);
                }
                for waited in wait_before {
                    signal.retain(waited);
                }
                for command_buffer in self.drain_subordinates() {
                    signal.retain(command_buffer);
                }
                lifetime_handler(signal);
                Ok(())
            }
            Strategy::Barrier { .. } => {
                // Checked before submission; a violation must leave nothing
                // in flight.
                if let CommandBufferSource::Delegated(sink) = &self.source {
                    sink.assert_open();
                }
                if let Some(mut command_buffer) = self.command_buffer.take() {
                    command_buffer.end()?;
                    let queue = self.queue_to_use();
                    queue.submit(Some(&mut command_buffer), &[], None)?;
                    dispose(&mut self.source, command_buffer);
                }
                for command_buffer in self.drain_subordinates() {
                    dispose(&mut self.source, command_buffer);
                }
                Ok(())
            }
        }
    }
}

impl Drop for SyncHandle<'_> {
    fn drop(&mut self) {
        if self.command_buffer.is_some() {
            tracing::warn!(
                "sync handle dropped without submit_and_sync(); its command buffer will never be submitted"
            );
        }
        if let Some(sink) = self.subordinates.take() {
            let buffers = sink.close();
            if !buffers.is_empty() {
                tracing::warn!(
                    count = buffers.len(),
                    "sync handle dropped with pending subordinate command buffers"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factories_report_their_sync_type() {
        assert_eq!(SyncHandle::not_required().sync_type(), SyncType::NotRequired);
        assert_eq!(SyncHandle::wait_idle().sync_type(), SyncType::WaitIdle);
        assert_eq!(
            SyncHandle::with_semaphores(|_| {}, Vec::new()).sync_type(),
            SyncType::ViaSemaphore
        );
        let mut master =
            SyncHandle::with_barriers(|_| {}, BeforeBarrier::None, AfterBarrier::Default);
        assert_eq!(master.sync_type(), SyncType::ViaBarrier);
        let auxiliary = SyncHandle::auxiliary_with_barriers(
            &mut master,
            BeforeBarrier::custom(|_, _, _| {}),
            AfterBarrier::custom(|_, _, _| {}),
        );
        assert_eq!(auxiliary.sync_type(), SyncType::ViaBarrier);
    }

    #[test]
    fn barrier_handler_kinds_are_observable() {
        let handle =
            SyncHandle::with_barriers(|_| {}, BeforeBarrier::None, AfterBarrier::Default);
        assert_eq!(handle.before_barrier_kind(), None);
        assert_eq!(handle.after_barrier_kind(), Some(HandlerKind::Default));

        let handle = SyncHandle::with_barriers(
            |_| {},
            BeforeBarrier::custom(|_, _, _| {}),
            AfterBarrier::custom(|_, _, _| {}),
        );
        assert_eq!(handle.before_barrier_kind(), Some(HandlerKind::Custom));
        assert_eq!(handle.after_barrier_kind(), Some(HandlerKind::Custom));

        assert_eq!(SyncHandle::wait_idle().after_barrier_kind(), None);
    }

    #[test]
    #[should_panic(expected = "no synchronization is required")]
    fn not_required_cannot_provide_a_command_buffer() {
        let mut handle = SyncHandle::not_required();
        let _ = handle.get_or_create_command_buffer();
    }

    #[test]
    #[should_panic(expected = "no queue configured")]
    fn queue_resolution_requires_a_binding_or_hint() {
        SyncHandle::wait_idle().queue_to_use();
    }

    #[test]
    fn not_required_finalization_is_a_noop() {
        // No queue is bound; finalization must not try to resolve one.
        SyncHandle::not_required().submit_and_sync().unwrap();
    }

    #[test]
    fn establish_barrier_ignores_non_barrier_strategies() {
        // No queue is configured, so any attempt to create a command buffer
        // would panic. The calls must be no-ops instead.
        let mut handle = SyncHandle::wait_idle();
        handle
            .establish_barrier_before_the_operation(
                vk::PipelineStageFlags2::COMPUTE_SHADER,
                None,
            )
            .unwrap();
        handle
            .establish_barrier_after_the_operation(
                vk::PipelineStageFlags2::COMPUTE_SHADER,
                None,
            )
            .unwrap();
    }

    #[test]
    fn skipped_before_barrier_does_not_allocate_a_command_buffer() {
        let mut handle =
            SyncHandle::with_barriers(|_| {}, BeforeBarrier::None, AfterBarrier::Default);
        handle
            .establish_barrier_before_the_operation(
                vk::PipelineStageFlags2::COMPUTE_SHADER,
                None,
            )
            .unwrap();
    }

    #[test]
    fn handles_move_without_losing_configuration() {
        let handle = SyncHandle::with_semaphores(|_| {}, Vec::new());
        let moved = Box::new(handle);
        assert_eq!(moved.sync_type(), SyncType::ViaSemaphore);
    }
}
