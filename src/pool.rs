//! Fixed-size worker pool
//!
//! Workers pull boxed jobs from one shared FIFO queue guarded by a mutex and
//! condition variable. [`WorkerPool::submit`] returns a [`TaskHandle`] that
//! yields the job's value, or a [`NetworkError::WorkerFault`] if the job
//! panicked.
//!
//! Shutdown sets a flag and wakes every worker. Workers keep draining the
//! queue and exit once it is empty; the pool then joins them. Jobs queued
//! before shutdown always run; later submissions are refused.

use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use crate::error::{NetworkError, Result};

type Job = Box<dyn FnOnce() + Send + 'static>;

struct PoolState {
    queue: VecDeque<Job>,
    terminate: bool,
}

struct PoolShared {
    state: Mutex<PoolState>,
    condvar: Condvar,
}

impl PoolShared {
    // Jobs run outside the lock and behind catch_unwind, so a poisoned
    // mutex still holds a consistent queue.
    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct WorkerPool {
    shared: Arc<PoolShared>,
    workers: Vec<JoinHandle<()>>,
}

/// Completion handle for one submitted job.
pub struct TaskHandle<T> {
    receiver: Receiver<thread::Result<T>>,
}

impl<T> TaskHandle<T> {
    /// Block until the job finishes.
    pub fn wait(self) -> Result<T> {
        match self.receiver.recv() {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(payload)) => Err(NetworkError::WorkerFault(panic_message(payload.as_ref()))),
            Err(_) => Err(NetworkError::WorkerFault(
                "job was dropped before it completed".to_string(),
            )),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "job panicked".to_string()
    }
}

impl WorkerPool {
    /// Spawn `size` worker threads.
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(NetworkError::invalid_config("worker pool needs at least one thread"));
        }
        let shared = Arc::new(PoolShared {
            state: Mutex::new(PoolState {
                queue: VecDeque::new(),
                terminate: false,
            }),
            condvar: Condvar::new(),
        });

        // On a spawn failure `pool` is dropped, which stops the threads already started.
        let mut pool = Self {
            shared,
            workers: Vec::with_capacity(size),
        };
        for id in 0..size {
            let shared = Arc::clone(&pool.shared);
            let handle = thread::Builder::new()
                .name(format!("mlp-worker-{}", id))
                .spawn(move || worker_loop(&shared))?;
            pool.workers.push(handle);
        }
        tracing::debug!(threads = size, "worker pool started");

        Ok(pool)
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Queue `job` and return a handle to its result.
    pub fn submit<F, T>(&self, job: F) -> Result<TaskHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (sender, receiver) = mpsc::channel();
        let wrapped: Job = Box::new(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(job));
            // The submitter may have dropped its handle; nothing to report then.
            let _ = sender.send(outcome);
        });

        {
            let mut state = self.shared.lock();
            if state.terminate {
                return Err(NetworkError::PoolShutdown);
            }
            state.queue.push_back(wrapped);
        }
        self.shared.condvar.notify_one();
        Ok(TaskHandle { receiver })
    }

    /// Stop accepting work, let workers drain the queue, and join them.
    pub fn shutdown(&mut self) {
        {
            let mut state = self.shared.lock();
            if state.terminate && self.workers.is_empty() {
                return;
            }
            state.terminate = true;
        }
        self.shared.condvar.notify_all();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                tracing::warn!("worker thread exited abnormally");
            }
        }
        tracing::debug!("worker pool stopped");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(shared: &PoolShared) {
    loop {
        let job = {
            let mut state = shared.lock();
            while state.queue.is_empty() && !state.terminate {
                state = shared
                    .condvar
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
            }
            match state.queue.pop_front() {
                Some(job) => job,
                None => return,
            }
        };
        job();
    }
}
