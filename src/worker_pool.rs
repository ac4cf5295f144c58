//! Fixed-size pool of worker threads fed from a closable job queue.

use std::collections::VecDeque;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;

use crate::error::SimError;
use crate::log_dev;

type Job = Box<dyn FnOnce() + Send + 'static>;

struct JobQueueState {
    jobs: VecDeque<Job>,
    closed: bool,
}

struct JobQueue {
    inner: Mutex<JobQueueState>,
    available: Condvar,
}

impl JobQueue {
    fn new() -> Self {
        Self {
            inner: Mutex::new(JobQueueState {
                jobs: VecDeque::new(),
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    fn push(&self, job: Job) -> Result<(), Job> {
        let mut guard = self.inner.lock().expect("job queue mutex poisoned");
        if guard.closed {
            return Err(job);
        }
        guard.jobs.push_back(job);
        self.available.notify_one();
        Ok(())
    }

    /// Block until a job is available, or the queue is closed and drained.
    fn pop_blocking_or_closed(&self) -> Option<Job> {
        let mut guard = self.inner.lock().expect("job queue mutex poisoned");
        loop {
            if let Some(job) = guard.jobs.pop_front() {
                return Some(job);
            }
            if guard.closed {
                return None;
            }
            guard = self.available.wait(guard).expect("job queue condvar wait failed");
        }
    }

    fn close(&self) {
        let mut guard = self.inner.lock().expect("job queue mutex poisoned");
        guard.closed = true;
        self.available.notify_all();
    }
}

/// What a worker does when a job panics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanicPolicy {
    /// Count it, keep the worker alive, and fail [`WorkerPool::join`].
    Report,
    /// Print to stderr and exit the process with this code. Roles of a run
    /// wait on each other's counts, so one dead role stalls the rest.
    ExitProcess(i32),
}

/// Runs submitted jobs on a fixed number of named threads.
///
/// Jobs queued before [`WorkerPool::join`] still run; `join` only stops
/// workers once the queue is empty.
pub struct WorkerPool {
    queue: Arc<JobQueue>,
    handles: Vec<thread::JoinHandle<()>>,
    panicked: Arc<AtomicUsize>,
}

impl WorkerPool {
    pub fn new(size: usize, policy: PanicPolicy) -> Result<Self, SimError> {
        Self::spawn_with(size, policy, |name, body| {
            thread::Builder::new().name(name).spawn(body)
        })
    }

    fn spawn_with<S>(size: usize, policy: PanicPolicy, mut spawn: S) -> Result<Self, SimError>
    where
        S: FnMut(String, Job) -> io::Result<thread::JoinHandle<()>>,
    {
        let queue = Arc::new(JobQueue::new());
        let panicked = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::with_capacity(size);
        for worker_id in 0..size {
            let worker_queue = Arc::clone(&queue);
            let panicked = Arc::clone(&panicked);
            let body: Job = Box::new(move || {
                while let Some(job) = worker_queue.pop_blocking_or_closed() {
                    if panic::catch_unwind(AssertUnwindSafe(job)).is_ok() {
                        continue;
                    }
                    match policy {
                        // Keep the worker alive so queued jobs still get a thread.
                        PanicPolicy::Report => {
                            panicked.fetch_add(1, Ordering::SeqCst);
                            log_dev!("[POOL] job panicked");
                        }
                        PanicPolicy::ExitProcess(code) => {
                            let current = thread::current();
                            let name = current.name().unwrap_or("unnamed");
                            eprintln!("run error: job panicked on {name}; aborting run");
                            std::process::exit(code);
                        }
                    }
                }
                log_dev!("[POOL] worker exiting");
            });
            match spawn(format!("worker-{worker_id}"), body) {
                Ok(handle) => handles.push(handle),
                Err(err) => {
                    // Release the workers already parked on the queue.
                    queue.close();
                    for handle in handles {
                        let _ = handle.join();
                    }
                    return Err(SimError::Spawn(err));
                }
            }
        }
        Ok(Self {
            queue,
            handles,
            panicked,
        })
    }

    #[cfg(test)]
    pub fn size(&self) -> usize {
        self.handles.len()
    }

    pub fn submit<F>(&self, job: F) -> Result<(), SimError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.queue
            .push(Box::new(job))
            .map_err(|_| SimError::PoolClosed)
    }

    /// Stop accepting jobs, let the queue drain, and wait for every worker.
    pub fn join(self) -> Result<(), SimError> {
        self.queue.close();
        let mut failed = 0usize;
        for handle in self.handles {
            if handle.join().is_err() {
                failed += 1;
            }
        }
        failed += self.panicked.load(Ordering::SeqCst);
        if failed > 0 {
            return Err(SimError::WorkerPanicked(failed));
        }
        Ok(())
    }
}
