//! # Task Management System
//!
//! This module provides a task management system for executing background work
//! (chunk generation, cache reads and writes) on a pool of worker threads while
//! the world stays owned by a single thread.
//!
//! ## Architecture Overview
//!
//! The task management system consists of several key components:
//! - `TaskManager`: Central coordinator for task distribution and worker management
//! - `Task`: A unit of work that can be executed asynchronously
//! - `TaskResult`: The result of a completed task, applied to the world on the owning thread
//! - `TaskChannel`: Communication channel between the owning thread and one worker thread
//!
//! ## Task Lifecycle
//! 1. Tasks are created and published via `TaskManager::publish_task()`
//! 2. The manager distributes tasks to available worker channels using round-robin;
//!    tasks that find every worker busy wait in a bounded FIFO queue
//! 3. Workers process tasks and return results
//! 4. Results are applied on the owning thread in `process_completed_tasks()`
//! 5. Results can spawn new tasks
//!
//! ## Cancellation
//! Every dispatched task carries the manager's current [`CancellationToken`].
//! `cancel_pending()` trips the token, turns every queued task into its
//! `cancelled()` result, and starts a fresh token for later work. Workers check
//! the token before starting a task; a task already running finishes normally.

pub mod task;

use std::collections::VecDeque;
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use task::{CancellationToken, Task, TaskResult};
use web_time::{Duration, Instant};

use crate::engine_state::voxels::world::World;
use crate::error::{EngineError, EngineResult};

/// A task paired with the token of the batch it was published in.
struct Job {
    task: Box<dyn Task>,
    token: CancellationToken,
}

/// A communication channel between the owning thread and a worker thread.
///
/// # Fields
/// - `task_sender`: Sends jobs from the owning thread to the worker
/// - `result_receiver`: Receives task results from the worker
/// - `num_tasks_in_flight`: Tracks number of tasks currently being processed
/// - `worker`: Handle to the worker thread, joined on drop
pub struct TaskChannel {
    task_sender: Option<Sender<Job>>,
    result_receiver: Receiver<Box<dyn TaskResult>>,
    num_tasks_in_flight: usize,
    worker: Option<JoinHandle<()>>,
}

/// Manages a pool of worker threads and coordinates task execution.
///
/// # Fields
/// - `channels`: Set of active worker channels
/// - `queued_tasks`: Tasks waiting for an available worker
/// - `queue_capacity`: Maximum length of `queued_tasks`
/// - `current_channel`: Index for round-robin scheduling
/// - `token`: Cancellation token handed to newly dispatched tasks
pub struct TaskManager {
    channels: Vec<TaskChannel>,
    queued_tasks: VecDeque<Box<dyn Task>>,
    queue_capacity: usize,
    current_channel: usize,
    token: CancellationToken,
}

/// Maximum number of tasks that can be in flight per worker channel.
///
/// This is set to 1 so that, with a single worker, tasks complete in the order
/// they were published.
pub const MAX_TASKS_IN_FLIGHT: usize = 1;

impl TaskManager {
    /// Creates a new `TaskManager` with the specified number of worker threads.
    ///
    /// # Arguments
    /// * `num_workers` - Number of worker threads to create
    /// * `queue_capacity` - How many tasks may wait for a worker before
    ///   `publish_task` refuses new ones
    ///
    /// # Errors
    /// `Io` if a worker thread cannot be spawned.
    pub fn new(num_workers: usize, queue_capacity: usize) -> EngineResult<Self> {
        log::info!(
            "Starting {} task worker(s), available parallelism: {:?}",
            num_workers,
            thread::available_parallelism()
        );

        let mut channels = Vec::with_capacity(num_workers);
        for index in 0..num_workers {
            let (task_tx, task_rx) = channel::<Job>();
            let (result_tx, result_rx) = channel::<Box<dyn TaskResult>>();

            let task_closure = move || {
                while let Ok(job) = task_rx.recv() {
                    let result = if job.token.is_cancelled() {
                        job.task.cancelled()
                    } else {
                        job.task.process()
                    };
                    if result_tx.send(result).is_err() {
                        break;
                    }
                }
            };

            let worker = thread::Builder::new()
                .name(format!("task-worker-{}", index))
                .spawn(task_closure)?;

            channels.push(TaskChannel {
                task_sender: Some(task_tx),
                result_receiver: result_rx,
                num_tasks_in_flight: 0,
                worker: Some(worker),
            });
        }

        Ok(TaskManager {
            channels,
            queued_tasks: VecDeque::new(),
            queue_capacity,
            current_channel: 0,
            token: CancellationToken::new(),
        })
    }

    /// Attempts to send a task to a specific worker channel.
    ///
    /// A failed send marks the channel as disconnected so it is not picked again.
    ///
    /// # Returns
    /// - `Ok(())` if the task was successfully sent to the worker
    /// - `Err(task)` if the send failed (the worker is gone)
    fn try_send_task(&mut self, task: Box<dyn Task>, channel_idx: usize) -> Result<(), Box<dyn Task>> {
        let job = Job {
            task,
            token: self.token.clone(),
        };
        let channel = &mut self.channels[channel_idx];
        let Some(sender) = channel.task_sender.as_ref() else {
            return Err(job.task);
        };
        match sender.send(job) {
            Ok(_) => {
                channel.num_tasks_in_flight += 1;
                Ok(())
            }
            Err(error) => {
                log::error!("Task worker {} is disconnected", channel_idx);
                channel.task_sender = None;
                Err(error.0.task)
            }
        }
    }

    /// Finds an available worker channel, round-robin from the last one used.
    ///
    /// # Returns
    /// `None` if every live channel already has `MAX_TASKS_IN_FLIGHT` tasks.
    fn find_available_channel(&self) -> Option<usize> {
        let count = self.channels.len();
        (0..count)
            .map(|step| (self.current_channel + step) % count)
            .find(|&index| {
                let channel = &self.channels[index];
                channel.task_sender.is_some() && channel.num_tasks_in_flight < MAX_TASKS_IN_FLIGHT
            })
    }

    /// Publishes a new task for execution.
    ///
    /// The task is dispatched immediately if a worker is free and nothing is
    /// queued ahead of it; otherwise it joins the back of the queue.
    ///
    /// # Returns
    /// - `Ok(true)` if the task was dispatched to a worker
    /// - `Ok(false)` if the task was queued
    ///
    /// # Errors
    /// - `TaskQueueFull` if the queue is at capacity; the task is dropped
    /// - `WorkerDisconnected` if no worker is left; the task is dropped
    pub fn publish_task(&mut self, task: Box<dyn Task>) -> EngineResult<bool> {
        self.try_publish_task(task).map_err(|(error, _)| error)
    }

    /// Same as [`publish_task`](Self::publish_task), but hands a refused task
    /// back to the caller along with the reason.
    pub fn try_publish_task(&mut self, mut task: Box<dyn Task>) -> Result<bool, (EngineError, Box<dyn Task>)> {
        if self.live_worker_count() == 0 {
            return Err((EngineError::WorkerDisconnected, task));
        }

        if self.queued_tasks.is_empty() {
            while let Some(channel_idx) = self.find_available_channel() {
                match self.try_send_task(task, channel_idx) {
                    Ok(()) => {
                        self.current_channel = (channel_idx + 1) % self.channels.len();
                        return Ok(true);
                    }
                    Err(rejected) => task = rejected,
                }
            }
            if self.live_worker_count() == 0 {
                return Err((EngineError::WorkerDisconnected, task));
            }
        }

        if self.queued_tasks.len() >= self.queue_capacity {
            return Err((
                EngineError::TaskQueueFull {
                    capacity: self.queue_capacity,
                },
                task,
            ));
        }
        self.queued_tasks.push_back(task);
        Ok(false)
    }

    /// Dispatches queued tasks, oldest first, until the queue is empty or all
    /// workers are busy.
    pub fn process_queued_tasks(&mut self) {
        while !self.queued_tasks.is_empty() {
            let Some(channel_idx) = self.find_available_channel() else {
                break;
            };
            let Some(task) = self.queued_tasks.pop_front() else {
                break;
            };
            match self.try_send_task(task, channel_idx) {
                Ok(()) => self.current_channel = (channel_idx + 1) % self.channels.len(),
                Err(task) => self.queued_tasks.push_front(task),
            }
        }
    }

    /// Applies all completed task results to `world`, publishes their
    /// follow-up tasks, then refills idle workers from the queue.
    ///
    /// # Returns
    /// The number of results applied.
    pub fn process_completed_tasks(&mut self, world: &mut World) -> usize {
        let mut tasks_to_queue = Vec::new();
        let mut applied = 0;
        for (index, channel) in self.channels.iter_mut().enumerate() {
            loop {
                match channel.result_receiver.try_recv() {
                    Ok(result) => {
                        channel.num_tasks_in_flight = channel.num_tasks_in_flight.saturating_sub(1);
                        tasks_to_queue.extend(result.handle_result(world));
                        applied += 1;
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        if channel.num_tasks_in_flight > 0 {
                            log::error!(
                                "Task worker {} stopped with {} task(s) in flight",
                                index,
                                channel.num_tasks_in_flight
                            );
                            channel.num_tasks_in_flight = 0;
                        }
                        channel.task_sender = None;
                        break;
                    }
                }
            }
        }

        for task in tasks_to_queue {
            if let Err(error) = self.publish_task(task) {
                log::warn!("Dropping follow-up task: {}", error);
            }
        }
        self.process_queued_tasks();
        applied
    }

    /// Cancels everything not yet started.
    ///
    /// Queued tasks are turned into their `cancelled()` results and applied
    /// to `world` immediately. Tasks already handed to a worker are skipped by
    /// it (unless already running) and their cancelled results arrive through
    /// `process_completed_tasks()`. Tasks published afterwards run normally.
    pub fn cancel_pending(&mut self, world: &mut World) {
        self.token.cancel();
        let cancelled = self.queued_tasks.len();
        while let Some(task) = self.queued_tasks.pop_front() {
            task.cancelled().handle_result(world);
        }
        self.token = CancellationToken::new();
        log::debug!("Cancelled {} queued task(s)", cancelled);
    }

    /// Applies results until no task is queued or in flight, or `timeout` passes.
    ///
    /// # Returns
    /// `true` if the manager became idle.
    pub fn wait_until_idle(&mut self, world: &mut World, timeout: Duration) -> bool {
        let start = Instant::now();
        loop {
            self.process_completed_tasks(world);
            if self.is_idle() {
                return true;
            }
            if start.elapsed() >= timeout {
                return false;
            }
            thread::sleep(Duration::from_millis(1));
        }
    }

    pub fn worker_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of workers that have not been seen to stop.
    pub fn live_worker_count(&self) -> usize {
        self.channels
            .iter()
            .filter(|channel| channel.task_sender.is_some())
            .count()
    }

    pub fn queued_count(&self) -> usize {
        self.queued_tasks.len()
    }

    pub fn in_flight_count(&self) -> usize {
        self.channels
            .iter()
            .map(|channel| channel.num_tasks_in_flight)
            .sum()
    }

    /// Returns `true` if `publish_task` would accept another task right now.
    pub fn has_capacity(&self) -> bool {
        if self.live_worker_count() == 0 {
            return false;
        }
        self.queued_tasks.len() < self.queue_capacity
            || (self.queued_tasks.is_empty() && self.find_available_channel().is_some())
    }

    pub fn is_idle(&self) -> bool {
        self.queued_tasks.is_empty() && self.in_flight_count() == 0
    }
}

impl Drop for TaskManager {
    fn drop(&mut self) {
        for channel in &mut self.channels {
            channel.task_sender = None;
        }
        for channel in &mut self.channels {
            if let Some(worker) = channel.worker.take() {
                if worker.join().is_err() {
                    log::error!("Task worker panicked");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        mpsc, Arc, Mutex,
    };

    use super::*;
    use crate::config::WorldConfig;
    use crate::engine_state::voxels::chunk::{
        chunk_cache::NoChunkCache, chunk_generation::EmptyGenerator,
    };

    fn world() -> World {
        World::new(WorldConfig::default(), Arc::new(EmptyGenerator), Arc::new(NoChunkCache))
    }

    /// Records its id into `log` when processed (`+id`) or cancelled (`-id`).
    struct RecordingTask {
        id: i32,
        log: Arc<Mutex<Vec<i32>>>,
        gate: Option<Arc<Mutex<mpsc::Receiver<()>>>>,
        started: Option<mpsc::Sender<()>>,
    }

    struct RecordingResult {
        entry: i32,
        log: Arc<Mutex<Vec<i32>>>,
    }

    impl TaskResult for RecordingResult {
        fn handle_result(self: Box<Self>, _world: &mut World) -> Vec<Box<dyn Task>> {
            self.log.lock().expect("log lock").push(self.entry);
            Vec::new()
        }
    }

    impl Task for RecordingTask {
        fn process(&self) -> Box<dyn TaskResult> {
            if let Some(started) = &self.started {
                let _ = started.send(());
            }
            if let Some(gate) = &self.gate {
                let _ = gate.lock().expect("gate lock").recv();
            }
            Box::new(RecordingResult {
                entry: self.id,
                log: self.log.clone(),
            })
        }

        fn cancelled(&self) -> Box<dyn TaskResult> {
            Box::new(RecordingResult {
                entry: -self.id,
                log: self.log.clone(),
            })
        }
    }

    fn recording(id: i32, log: &Arc<Mutex<Vec<i32>>>) -> Box<dyn Task> {
        Box::new(RecordingTask {
            id,
            log: log.clone(),
            gate: None,
            started: None,
        })
    }

    #[test]
    fn test_single_worker_preserves_fifo_order() {
        let mut manager = TaskManager::new(1, 16).expect("spawn");
        let mut world = world();
        let log = Arc::new(Mutex::new(Vec::new()));

        for id in 1..=5 {
            manager.publish_task(recording(id, &log)).expect("publish");
        }
        assert!(manager.wait_until_idle(&mut world, Duration::from_secs(5)));
        assert_eq!(*log.lock().expect("log lock"), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_full_queue_is_rejected() {
        let mut manager = TaskManager::new(1, 1).expect("spawn");
        let mut world = world();
        let log = Arc::new(Mutex::new(Vec::new()));
        let (open, gate) = mpsc::channel();
        let gate = Arc::new(Mutex::new(gate));

        let blocking = Box::new(RecordingTask {
            id: 1,
            log: log.clone(),
            gate: Some(gate),
            started: None,
        });
        assert!(manager.publish_task(blocking).expect("dispatched"));
        assert!(!manager.publish_task(recording(2, &log)).expect("queued"));
        assert!(matches!(
            manager.publish_task(recording(3, &log)),
            Err(EngineError::TaskQueueFull { capacity: 1 })
        ));

        open.send(()).expect("open gate");
        assert!(manager.wait_until_idle(&mut world, Duration::from_secs(5)));
        assert_eq!(*log.lock().expect("log lock"), vec![1, 2]);
    }

    #[test]
    fn test_cancel_pending_skips_unstarted_tasks() {
        let mut manager = TaskManager::new(1, 8).expect("spawn");
        let mut world = world();
        let log = Arc::new(Mutex::new(Vec::new()));
        let (open, gate) = mpsc::channel();
        let gate = Arc::new(Mutex::new(gate));
        let (started_tx, started_rx) = mpsc::channel();

        manager
            .publish_task(Box::new(RecordingTask {
                id: 1,
                log: log.clone(),
                gate: Some(gate),
                started: Some(started_tx),
            }))
            .expect("publish");
        manager.publish_task(recording(2, &log)).expect("publish");
        manager.publish_task(recording(3, &log)).expect("publish");

        // Task 1 is running on the worker before anything is cancelled.
        started_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("task 1 started");
        manager.cancel_pending(&mut world);
        assert_eq!(manager.queued_count(), 0);
        assert_eq!(*log.lock().expect("log lock"), vec![-2, -3]);

        open.send(()).expect("open gate");
        manager.publish_task(recording(4, &log)).expect("publish");
        assert!(manager.wait_until_idle(&mut world, Duration::from_secs(5)));
        assert_eq!(*log.lock().expect("log lock"), vec![-2, -3, 1, 4]);
    }

    #[test]
    fn test_cancel_pending_before_start_reports_cancelled() {
        let mut manager = TaskManager::new(1, 8).expect("spawn");
        let mut world = world();
        let log = Arc::new(Mutex::new(Vec::new()));
        let (open, gate) = mpsc::channel();
        let gate = Arc::new(Mutex::new(gate));
        let (started_tx, started_rx) = mpsc::channel();

        manager
            .publish_task(Box::new(RecordingTask {
                id: 1,
                log: log.clone(),
                gate: Some(gate),
                started: Some(started_tx),
            }))
            .expect("publish");
        started_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("task 1 started");
        manager.publish_task(recording(2, &log)).expect("publish");

        // Task 2 waits in the queue behind the running task.
        manager.cancel_pending(&mut world);
        open.send(()).expect("open gate");
        assert!(manager.wait_until_idle(&mut world, Duration::from_secs(5)));
        assert_eq!(*log.lock().expect("log lock"), vec![-2, 1]);
    }

    struct PanickingTask;

    impl Task for PanickingTask {
        fn process(&self) -> Box<dyn TaskResult> {
            panic!("task worker failure");
        }
    }

    /// Applies results until `count` workers are left or a few seconds pass.
    fn wait_for_live_workers(manager: &mut TaskManager, world: &mut World, count: usize) {
        let start = Instant::now();
        while manager.live_worker_count() > count && start.elapsed() < Duration::from_secs(5) {
            manager.process_completed_tasks(world);
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(manager.live_worker_count(), count);
    }

    #[test]
    fn test_stopped_worker_is_skipped() {
        let mut manager = TaskManager::new(2, 8).expect("spawn");
        let mut world = world();
        let log = Arc::new(Mutex::new(Vec::new()));

        assert!(manager.publish_task(Box::new(PanickingTask)).expect("dispatched"));
        wait_for_live_workers(&mut manager, &mut world, 1);
        assert_eq!(manager.in_flight_count(), 0);
        assert!(manager.has_capacity());

        for id in 1..=4 {
            manager.publish_task(recording(id, &log)).expect("publish");
        }
        assert!(manager.wait_until_idle(&mut world, Duration::from_secs(5)));
        assert_eq!(*log.lock().expect("log lock"), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_refused_task_is_handed_back_without_workers() {
        let mut manager = TaskManager::new(1, 8).expect("spawn");
        let mut world = world();
        let log = Arc::new(Mutex::new(Vec::new()));

        manager.publish_task(Box::new(PanickingTask)).expect("dispatched");
        wait_for_live_workers(&mut manager, &mut world, 0);
        assert!(!manager.has_capacity());
        assert!(matches!(
            manager.publish_task(recording(1, &log)),
            Err(EngineError::WorkerDisconnected)
        ));

        let (error, task) = match manager.try_publish_task(recording(2, &log)) {
            Err(refused) => refused,
            Ok(_) => panic!("no worker should accept the task"),
        };
        assert!(matches!(error, EngineError::WorkerDisconnected));
        task.cancelled().handle_result(&mut world);
        assert_eq!(*log.lock().expect("log lock"), vec![-2]);
        assert_eq!(manager.queued_count(), 0);
    }

    struct SpawningTask {
        remaining: usize,
        counter: Arc<AtomicUsize>,
    }

    struct SpawningResult {
        remaining: usize,
        counter: Arc<AtomicUsize>,
    }

    impl Task for SpawningTask {
        fn process(&self) -> Box<dyn TaskResult> {
            self.counter.fetch_add(1, Ordering::SeqCst);
            Box::new(SpawningResult {
                remaining: self.remaining,
                counter: self.counter.clone(),
            })
        }
    }

    impl TaskResult for SpawningResult {
        fn handle_result(self: Box<Self>, _world: &mut World) -> Vec<Box<dyn Task>> {
            if self.remaining == 0 {
                return Vec::new();
            }
            vec![Box::new(SpawningTask {
                remaining: self.remaining - 1,
                counter: self.counter.clone(),
            })]
        }
    }

    #[test]
    fn test_follow_up_tasks_are_published() {
        let mut manager = TaskManager::new(2, 8).expect("spawn");
        let mut world = world();
        let counter = Arc::new(AtomicUsize::new(0));
        manager
            .publish_task(Box::new(SpawningTask {
                remaining: 3,
                counter: counter.clone(),
            }))
            .expect("publish");
        assert!(manager.wait_until_idle(&mut world, Duration::from_secs(5)));
        assert_eq!(counter.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_drop_joins_idle_workers() {
        let manager = TaskManager::new(3, 4).expect("spawn");
        assert_eq!(manager.worker_count(), 3);
        assert!(manager.is_idle());
        drop(manager);
    }
}
