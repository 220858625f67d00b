//! # Primary Executor
//!
//! Host container APIs are not thread-safe: every container read or write must
//! be marshalled onto one specific thread.
//!
//! ```text
//!   Worker 1 ──┐
//!   Worker 2 ──┼──> [Job Channel] ──> [Primary Thread] ──> Host containers
//!   Worker N ──┘     (unbounded)        (single runner)
//! ```
//!
//! Hosts with their own main-thread scheduler implement [`PrimaryExecutor`]
//! on top of it. [`PrimaryThread`] is a standalone runner for hosts without
//! one, and [`InlineExecutor`] runs jobs in place for thread-safe hosts.

use crossbeam_channel::{unbounded, Sender};
use std::io;
use std::thread::{self, JoinHandle, ThreadId};

/// A unit of work for the primary thread.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Runs jobs on the host's primary thread.
pub trait PrimaryExecutor: Send + Sync + 'static {
    /// Queues a job. Returns false if the executor no longer accepts work.
    fn execute(&self, job: Job) -> bool;

    /// True when called from the primary thread itself.
    fn is_primary_thread(&self) -> bool;
}

/// Dedicated OS thread draining a job channel.
pub struct PrimaryThread {
    /// Job queue; dropped first on shutdown so the runner exits.
    sender: Option<Sender<Job>>,
    /// Identity of the runner thread.
    thread_id: ThreadId,
    /// Runner handle, joined on drop.
    handle: Option<JoinHandle<()>>,
}

impl PrimaryThread {
    /// Spawns the runner thread.
    pub fn spawn(name: impl Into<String>) -> io::Result<Self> {
        let (sender, receiver) = unbounded::<Job>();
        let handle = thread::Builder::new().name(name.into()).spawn(move || {
            while let Ok(job) = receiver.recv() {
                job();
            }
            tracing::debug!("primary thread stopped");
        })?;

        Ok(Self {
            sender: Some(sender),
            thread_id: handle.thread().id(),
            handle: Some(handle),
        })
    }
}

impl PrimaryExecutor for PrimaryThread {
    fn execute(&self, job: Job) -> bool {
        self.sender.as_ref().is_some_and(|sender| sender.send(job).is_ok())
    }

    fn is_primary_thread(&self) -> bool {
        thread::current().id() == self.thread_id
    }
}

impl Drop for PrimaryThread {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            if thread::current().id() != self.thread_id {
                let _ = handle.join();
            }
        }
    }
}

impl std::fmt::Debug for PrimaryThread {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrimaryThread")
            .field("thread_id", &self.thread_id)
            .field("running", &self.sender.is_some())
            .finish()
    }
}

/// Runs every job on the calling thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineExecutor;

impl PrimaryExecutor for InlineExecutor {
    fn execute(&self, job: Job) -> bool {
        job();
        true
    }

    fn is_primary_thread(&self) -> bool {
        true
    }
}
