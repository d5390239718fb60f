//! Bounded job pool.
//!
//! A fixed set of `rayon` worker threads plus a token channel acting as a
//! counting semaphore: `submit` blocks while every slot is taken, each job
//! returns its token when it finishes (however it finishes), and `join_all`
//! waits until all tokens are back. Failures are collected rather than
//! propagated so that sibling jobs always run to completion.

use crate::error::{Error, Result};
use crossbeam_channel::{Receiver, Sender, bounded};
use log::debug;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct ErrorSet {
    count: AtomicUsize,
    errors: Mutex<Vec<Error>>,
}

impl ErrorSet {
    fn push(&self, error: Error) {
        let mut errors = self.errors.lock().unwrap_or_else(|e| e.into_inner());
        errors.push(error);
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    fn take(&self) -> Vec<Error> {
        let mut errors = self.errors.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *errors)
    }
}

/// Returns its slot when dropped, on every exit path of a job.
struct Slot {
    tokens: Receiver<()>,
}

impl Drop for Slot {
    fn drop(&mut self) {
        let _ = self.tokens.recv();
    }
}

pub struct JobPool {
    workers: ThreadPool,
    capacity: usize,
    acquire: Sender<()>,
    release: Receiver<()>,
    errors: Arc<ErrorSet>,
}

impl JobPool {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::Config("job pool needs at least one slot".into()));
        }
        let workers = ThreadPoolBuilder::new()
            .num_threads(capacity)
            .thread_name(|i| format!("juliet-build-{}", i))
            .build()?;
        let (acquire, release) = bounded(capacity);
        Ok(Self {
            workers,
            capacity,
            acquire,
            release,
            errors: Arc::new(ErrorSet::default()),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Start `job` once a slot is free. Blocks while the pool is full.
    pub fn submit<F>(&self, job: F)
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        // Both ends live in `self`, so the channel cannot be disconnected here.
        let _ = self.acquire.send(());

        let slot = Slot {
            tokens: self.release.clone(),
        };
        let errors = Arc::clone(&self.errors);
        self.workers.spawn(move || {
            let _slot = slot;
            let outcome = match catch_unwind(AssertUnwindSafe(job)) {
                Ok(result) => result,
                Err(panic) => Err(Error::Panicked(panic_message(panic.as_ref()))),
            };
            if let Err(e) = outcome {
                debug!("job failed: {}", e);
                errors.push(e);
            }
        });
    }

    /// Whether any finished job has failed so far.
    pub fn has_errors(&self) -> bool {
        self.errors.count.load(Ordering::SeqCst) > 0
    }

    /// Wait for every submitted job, then report all collected failures.
    pub fn join_all(&self) -> Result<()> {
        // Holding every slot means nothing is running.
        for _ in 0..self.capacity {
            let _ = self.acquire.send(());
        }
        for _ in 0..self.capacity {
            let _ = self.release.recv();
        }

        let errors = self.errors.take();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Pool { errors })
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
