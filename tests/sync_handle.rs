//! End-to-end tests for the synchronization strategies.
//!
//! These need a working Vulkan 1.3 driver. When device creation fails (e.g.
//! in CI without a GPU) each test logs a note and passes vacuously.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use scoria::prelude::*;

fn test_device() -> Option<(Device, Queue)> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    match Device::create_system_default() {
        Ok(pair) => Some(pair),
        Err(err) => {
            eprintln!("skipping: no usable Vulkan device ({err})");
            None
        }
    }
}

#[test]
fn explicit_queue_binding_overrides_the_hint() {
    let Some((device, _queue)) = test_device() else {
        return;
    };
    let hinted = device.get_queue().unwrap();
    let bound = device.get_queue().unwrap();
    assert_ne!(hinted, bound);

    let mut sync = SyncHandle::wait_idle();
    sync.set_queue_hint(hinted.clone());
    assert_eq!(sync.queue_to_use(), hinted);

    let sync = sync.on_queue(bound.clone());
    assert_eq!(sync.queue_to_use(), bound);
}

#[test]
fn wait_idle_submits_and_drains_the_queue() {
    let Some((_device, queue)) = test_device() else {
        return;
    };
    let mut sync = SyncHandle::wait_idle().on_queue(queue);
    let command_buffer = sync.get_or_create_command_buffer().unwrap();
    command_buffer.global_memory_barrier(GlobalBarrier::after_operation(
        vk::PipelineStageFlags2::COPY,
        Some(WriteAccess::new(vk::AccessFlags2::TRANSFER_WRITE)),
    ));
    // When this returns, the GPU has finished the submission.
    sync.submit_and_sync().unwrap();
}

#[test]
fn semaphores_chain_two_submissions() {
    let Some((device, queue)) = test_device() else {
        return;
    };

    let handoff: Arc<Mutex<Option<Semaphore>>> = Arc::new(Mutex::new(None));
    let calls = Arc::new(AtomicUsize::new(0));

    let handoff_writer = handoff.clone();
    let calls_writer = calls.clone();
    let mut first = SyncHandle::with_semaphores(
        move |semaphore| {
            calls_writer.fetch_add(1, Ordering::SeqCst);
            *handoff_writer.lock().unwrap() = Some(semaphore);
        },
        Vec::new(),
    )
    .on_queue(queue.clone());
    first.get_or_create_command_buffer().unwrap();
    first.submit_and_sync().unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let signalled = handoff.lock().unwrap().take().unwrap();

    // The second submission waits on the first one's signal. Its own signal
    // semaphore takes over the lifetime of everything involved.
    let retired: Arc<Mutex<Option<Semaphore>>> = Arc::new(Mutex::new(None));
    let retired_writer = retired.clone();
    let mut second = SyncHandle::with_semaphores(
        move |semaphore| {
            *retired_writer.lock().unwrap() = Some(semaphore);
        },
        vec![signalled],
    )
    .on_queue(queue);
    second.get_or_create_command_buffer().unwrap();
    second.submit_and_sync().unwrap();

    device.wait_idle().unwrap();
    drop(retired.lock().unwrap().take());
}

#[test]
fn barriers_hand_the_command_buffer_to_the_lifetime_handler() {
    let Some((device, queue)) = test_device() else {
        return;
    };

    let collected: Arc<Mutex<Vec<CommandBuffer>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = collected.clone();
    let mut sync = SyncHandle::with_barriers(
        move |command_buffer| sink.lock().unwrap().push(command_buffer),
        BeforeBarrier::Default,
        AfterBarrier::Default,
    )
    .on_queue(queue);

    sync.establish_barrier_before_the_operation(
        vk::PipelineStageFlags2::COPY,
        Some(ReadAccess::new(vk::AccessFlags2::TRANSFER_READ)),
    )
    .unwrap();
    sync.establish_barrier_after_the_operation(
        vk::PipelineStageFlags2::COPY,
        Some(WriteAccess::new(vk::AccessFlags2::TRANSFER_WRITE)),
    )
    .unwrap();
    sync.submit_and_sync().unwrap();

    device.wait_idle().unwrap();
    let mut collected = collected.lock().unwrap();
    assert_eq!(collected.len(), 1);
    assert_eq!(collected[0].state(), CommandBufferState::Submitted);
    collected.clear();
}

#[test]
fn auxiliary_buffers_retire_through_the_master() {
    let Some((device, queue)) = test_device() else {
        return;
    };

    let collected: Arc<Mutex<Vec<CommandBuffer>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = collected.clone();
    let mut master = SyncHandle::with_barriers(
        move |command_buffer| sink.lock().unwrap().push(command_buffer),
        BeforeBarrier::None,
        AfterBarrier::Default,
    )
    .on_queue(queue.clone());

    let mut auxiliary = SyncHandle::auxiliary_with_barriers(
        &mut master,
        BeforeBarrier::None,
        AfterBarrier::custom(|command_buffer, stage, access| {
            command_buffer.global_memory_barrier(GlobalBarrier::after_operation(
                stage,
                access,
            ));
        }),
    );
    assert_eq!(auxiliary.queue_to_use(), queue);

    // Subordinate operation first, then the master.
    auxiliary.get_or_create_command_buffer().unwrap();
    auxiliary
        .establish_barrier_after_the_operation(
            vk::PipelineStageFlags2::COPY,
            Some(WriteAccess::new(vk::AccessFlags2::TRANSFER_WRITE)),
        )
        .unwrap();
    auxiliary.submit_and_sync().unwrap();

    master.get_or_create_command_buffer().unwrap();
    master
        .establish_barrier_after_the_operation(
            vk::PipelineStageFlags2::COPY,
            Some(WriteAccess::new(vk::AccessFlags2::TRANSFER_WRITE)),
        )
        .unwrap();
    master.submit_and_sync().unwrap();

    device.wait_idle().unwrap();
    let mut collected = collected.lock().unwrap();
    assert_eq!(collected.len(), 2);
    collected.clear();
}

#[test]
fn auxiliary_finalized_after_its_master_panics() {
    let Some((_device, queue)) = test_device() else {
        return;
    };

    let mut master =
        SyncHandle::with_barriers(|_| {}, BeforeBarrier::None, AfterBarrier::None)
            .on_queue(queue.clone());
    let mut auxiliary = SyncHandle::auxiliary_with_barriers(
        &mut master,
        BeforeBarrier::None,
        AfterBarrier::Default,
    );
    auxiliary.get_or_create_command_buffer().unwrap();
    auxiliary
        .establish_barrier_after_the_operation(
            vk::PipelineStageFlags2::COPY,
            Some(WriteAccess::new(vk::AccessFlags2::TRANSFER_WRITE)),
        )
        .unwrap();

    // Finalizing the master closes the delegation; the straggler must fail
    // before submitting anything.
    master.submit_and_sync().unwrap();
    let panic = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
        auxiliary.submit_and_sync().unwrap();
    }))
    .unwrap_err();
    let message = panic.downcast_ref::<&str>().copied().unwrap_or_default();
    assert!(
        message.contains("finalized before their master"),
        "unexpected panic message: {message}"
    );
    queue.wait_idle().unwrap();
}

#[test]
fn no_sync_masters_reject_delegated_buffers() {
    let Some((_device, queue)) = test_device() else {
        return;
    };

    let mut master = SyncHandle::not_required();
    let mut auxiliary = SyncHandle::auxiliary_with_barriers(
        &mut master,
        BeforeBarrier::None,
        AfterBarrier::Default,
    )
    .on_queue(queue.clone());
    auxiliary.get_or_create_command_buffer().unwrap();
    auxiliary
        .establish_barrier_after_the_operation(
            vk::PipelineStageFlags2::COPY,
            Some(WriteAccess::new(vk::AccessFlags2::TRANSFER_WRITE)),
        )
        .unwrap();
    auxiliary.submit_and_sync().unwrap();
    queue.wait_idle().unwrap();

    // A no-sync master cannot keep the delegated buffer alive.
    let panic = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
        master.submit_and_sync().unwrap();
    }))
    .unwrap_err();
    let message = panic.downcast_ref::<&str>().copied().unwrap_or_default();
    assert!(
        message.contains("auxiliary handles delegated command buffers"),
        "unexpected panic message: {message}"
    );
}

#[test]
fn frame_context_retires_signal_semaphores() {
    let Some((device, queue)) = test_device() else {
        return;
    };
    let frames = FrameContext::new(2);

    let handoff: Arc<Mutex<Option<Semaphore>>> = Arc::new(Mutex::new(None));
    let handoff_writer = handoff.clone();
    let mut first = SyncHandle::with_semaphores(
        move |semaphore| {
            *handoff_writer.lock().unwrap() = Some(semaphore);
        },
        Vec::new(),
    )
    .on_queue(queue.clone());
    first.get_or_create_command_buffer().unwrap();
    first.submit_and_sync().unwrap();
    let mut signalled = handoff.lock().unwrap().take().unwrap();

    // The marker rides on the wait semaphore, whose ownership moves onto the
    // signal semaphore, which in turn is parked in the current frame's
    // bucket.
    let marker = Arc::new(());
    signalled.retain(marker.clone());

    let mut second =
        SyncHandle::with_semaphores_on_current_frame(&frames, vec![signalled])
            .on_queue(queue);
    second.get_or_create_command_buffer().unwrap();
    second.submit_and_sync().unwrap();
    assert_eq!(Arc::strong_count(&marker), 2);

    device.wait_idle().unwrap();
    frames.next_frame();
    assert_eq!(Arc::strong_count(&marker), 2);
    frames.next_frame();
    assert_eq!(Arc::strong_count(&marker), 1);
}

#[test]
fn borrowed_command_buffers_are_left_to_their_owner() {
    let Some((device, queue)) = test_device() else {
        return;
    };

    let mut owned = queue.create_single_use_command_buffer().unwrap();
    assert_eq!(owned.queue(), &queue);
    {
        let mut sync = SyncHandle::with_barriers_on_existing_command_buffer(
            &mut owned,
            BeforeBarrier::Default,
            AfterBarrier::Default,
        );
        sync.establish_barrier_before_the_operation(vk::PipelineStageFlags2::COPY, None)
            .unwrap();
        sync.establish_barrier_after_the_operation(
            vk::PipelineStageFlags2::COPY,
            Some(WriteAccess::new(vk::AccessFlags2::TRANSFER_WRITE)),
        )
        .unwrap();
        // Finalization submits nothing; the buffer stays with its owner.
        sync.submit_and_sync().unwrap();
    }
    assert_eq!(owned.state(), CommandBufferState::Recording);

    owned.end().unwrap();
    queue.submit(Some(&mut owned), &[], None).unwrap();
    queue.wait_idle().unwrap();
    drop(owned);
    drop(device);
}

#[test]
fn frame_context_retires_gpu_resources() {
    let Some((device, queue)) = test_device() else {
        return;
    };

    let frames = FrameContext::new(2);
    let mut sync = SyncHandle::with_barriers_on_current_frame(
        &frames,
        BeforeBarrier::None,
        AfterBarrier::Default,
    )
    .on_queue(queue);
    sync.get_or_create_command_buffer().unwrap();
    sync.establish_barrier_after_the_operation(
        vk::PipelineStageFlags2::COPY,
        Some(WriteAccess::new(vk::AccessFlags2::TRANSFER_WRITE)),
    )
    .unwrap();
    sync.submit_and_sync().unwrap();

    // Standing in for the per-frame fence waits of a real render loop.
    device.wait_idle().unwrap();
    frames.next_frame();
    frames.next_frame();
}
