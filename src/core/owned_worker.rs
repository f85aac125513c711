//! # Owned Worker
//!
//! A dedicated thread that owns a value outright and applies closures to it
//! one at a time, in submission order. Other threads never see the value; they
//! talk to it through request/response pairs over a channel. This is how a
//! subsystem with no internal locking, such as a [`World`], can be driven from
//! several threads.
//!
//! [`World`]: crate::engine_state::voxels::world::World

use std::sync::mpsc::{channel, Sender};
use std::thread::{self, JoinHandle};

use crate::error::{EngineError, EngineResult};

type Job<T> = Box<dyn FnOnce(&mut T) + Send>;

/// Handle to a thread that owns a `T`.
///
/// Dropping the handle closes the queue; jobs already submitted still run
/// before the thread exits and is joined.
pub struct OwnedWorker<T: Send + 'static> {
    sender: Option<Sender<Job<T>>>,
    worker: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> OwnedWorker<T> {
    /// Moves `value` onto a new named thread.
    ///
    /// # Errors
    /// `Io` if the thread cannot be spawned.
    pub fn spawn(name: &str, mut value: T) -> EngineResult<Self> {
        let (sender, receiver) = channel::<Job<T>>();
        let worker = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                while let Ok(job) = receiver.recv() {
                    job(&mut value);
                }
            })?;

        Ok(OwnedWorker {
            sender: Some(sender),
            worker: Some(worker),
        })
    }

    /// Queues `job` without waiting for it to run.
    ///
    /// # Errors
    /// `WorkerDisconnected` if the owning thread has stopped.
    pub fn submit<F>(&self, job: F) -> EngineResult<()>
    where
        F: FnOnce(&mut T) + Send + 'static,
    {
        let sender = self.sender.as_ref().ok_or(EngineError::WorkerDisconnected)?;
        sender
            .send(Box::new(job))
            .map_err(|_| EngineError::WorkerDisconnected)
    }

    /// Runs `job` on the owning thread and blocks until its result is back.
    ///
    /// # Errors
    /// `WorkerDisconnected` if the owning thread has stopped, or stopped
    /// (panicked) while running `job`.
    pub fn call<F, R>(&self, job: F) -> EngineResult<R>
    where
        F: FnOnce(&mut T) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply_sender, reply_receiver) = channel();
        self.submit(move |value| {
            let _ = reply_sender.send(job(value));
        })?;
        reply_receiver
            .recv()
            .map_err(|_| EngineError::WorkerDisconnected)
    }
}

impl<T: Send + 'static> Drop for OwnedWorker<T> {
    fn drop(&mut self) {
        self.sender = None;
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("Owned worker thread panicked");
            }
        }
    }
}
