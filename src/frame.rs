//! Frames-in-flight resource retirement.
//!
//! # Overview
//!
//! With N frames in flight, beginning frame `f` implies that all GPU work
//! submitted during frame `f - N` has completed. [`FrameContext`] exploits
//! this: resources handed to [`handle_lifetime_of`](FrameContext::handle_lifetime_of)
//! are parked in the current frame's bucket and dropped once
//! [`next_frame`](FrameContext::next_frame) has advanced far enough past it.
//!
//! The `*_on_current_frame` factories on
//! [`SyncHandle`](crate::sync::SyncHandle) use this to retire signal
//! semaphores and command buffers without a custom lifetime handler.

use std::{
    any::Any,
    collections::VecDeque,
    sync::{Arc, Mutex},
};

/// A clonable ring of per-frame retirement buckets.
#[derive(Clone)]
pub struct FrameContext {
    shared: Arc<Mutex<FrameRing>>,
    frames_in_flight: u64,
}

struct FrameRing {
    current: u64,
    /// Buckets of retired resources, keyed by the frame they were retired in.
    pending: VecDeque<(u64, Vec<Box<dyn Any + Send>>)>,
}

impl FrameContext {
    /// Creates a frame context for the given number of frames in flight.
    ///
    /// # Panics
    ///
    /// Panics if `frames_in_flight` is zero.
    pub fn new(frames_in_flight: u64) -> Self {
        assert!(frames_in_flight > 0, "at least one frame must be in flight");
        Self {
            shared: Arc::new(Mutex::new(FrameRing {
                current: 0,
                pending: VecDeque::new(),
            })),
            frames_in_flight,
        }
    }

    /// Returns the current frame number.
    pub fn current_frame(&self) -> u64 {
        self.shared.lock().unwrap().current
    }

    /// Retires `resource` into the current frame's bucket.
    ///
    /// The resource is dropped once this frame is known to have completed on
    /// the GPU, i.e. `frames_in_flight` calls to [`next_frame`](Self::next_frame)
    /// later.
    pub fn handle_lifetime_of(&self, resource: impl Any + Send + 'static) {
        let mut ring = self.shared.lock().unwrap();
        let current = ring.current;
        match ring.pending.back_mut() {
            Some((frame, bucket)) if *frame == current => bucket.push(Box::new(resource)),
            _ => ring.pending.push_back((current, vec![Box::new(resource)])),
        }
    }

    /// Begins the next frame and drops the buckets of every frame that is now
    /// known to have completed.
    ///
    /// The caller asserts, typically by having waited on its frame fence,
    /// that GPU work from `frames_in_flight` frames ago has finished.
    pub fn next_frame(&self) {
        let expired = {
            let mut ring = self.shared.lock().unwrap();
            ring.current += 1;
            let current = ring.current;
            let mut expired = Vec::new();
            while let Some((frame, _)) = ring.pending.front() {
                if frame + self.frames_in_flight <= current {
                    expired.push(ring.pending.pop_front().unwrap());
                } else {
                    break;
                }
            }
            expired
        };
        // Dropped outside the lock so retired destructors may touch this
        // context again.
        drop(expired);
    }
}
