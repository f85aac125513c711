//! # Task System Core Traits
//!
//! This module defines the fundamental building blocks of the task system,
//! which provides a framework for executing work asynchronously across multiple threads.
//!
//! ## Core Components
//! - `Task`: Represents a unit of work that can be executed asynchronously
//! - `TaskResult`: Represents the result of a completed task
//! - `CancellationToken`: Shared flag checked before a queued task starts
//!
//! ## Task Lifecycle
//! 1. A `Task` is created and scheduled via `TaskManager::publish_task()`
//! 2. The task's `process()` method is called on a worker thread, or its
//!    `cancelled()` method if the batch it belongs to was cancelled first
//! 3. The task returns a boxed `TaskResult`
//! 4. The result's `handle_result()` is called on the owning thread with the world
//! 5. The result can spawn new tasks
//!
//! ## Thread Safety
//! - `Task` must be `Send` to be transferred between threads
//! - `TaskResult` must be `Send` to be transferred back to the owning thread
//! - Tasks never touch the world; only results do, on the owning thread

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::engine_state::voxels::world::World;

/// A trait representing a unit of work that can be executed asynchronously.
///
/// Tasks are the primary mechanism for offloading work from the owning thread to
/// background workers. They should own all the data they need.
pub trait Task: Send {
    /// Processes the task and returns a result.
    ///
    /// This method runs on a background thread.
    fn process(&self) -> Box<dyn TaskResult>;

    /// The result delivered instead of `process()` when the task was cancelled
    /// before it started. Defaults to a result that does nothing.
    fn cancelled(&self) -> Box<dyn TaskResult> {
        Box::new(NoopTaskResult)
    }
}

/// A trait representing the result of processing a `Task`.
///
/// Task results are applied on the owning thread and may mutate the world or
/// spawn follow-up tasks.
pub trait TaskResult: Send {
    /// Applies the result on the owning thread.
    ///
    /// # Returns
    /// Follow-up tasks to schedule (can be empty).
    fn handle_result(self: Box<Self>, world: &mut World) -> Vec<Box<dyn Task>>;
}

/// A result with no effect.
pub struct NoopTaskResult;

impl TaskResult for NoopTaskResult {
    fn handle_result(self: Box<Self>, _world: &mut World) -> Vec<Box<dyn Task>> {
        Vec::new()
    }
}

/// Cooperative cancellation flag shared between the manager and its workers.
///
/// Workers check it only between jobs, never while one is running.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
