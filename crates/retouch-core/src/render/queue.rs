//! Serial background worker.
//!
//! Jobs run one at a time, in submission order, on a dedicated named
//! thread. A job that panics is logged and the worker moves on to the next
//! one. Dropping the queue closes the channel and joins the thread after
//! the pending jobs have finished.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

type Job = Box<dyn FnOnce() + Send + 'static>;

pub struct SerialQueue {
    sender: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
}

impl SerialQueue {
    /// Spawn the worker thread.
    ///
    /// Panics if the OS refuses to create the thread.
    pub fn new(name: &str) -> Self {
        let (sender, receiver) = mpsc::channel::<Job>();
        let worker = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                for job in receiver {
                    if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                        log::warn!("render job panicked");
                    }
                }
            })
            .unwrap_or_else(|e| panic!("failed to spawn render worker {name}: {e}"));
        Self {
            sender: Some(sender),
            worker: Some(worker),
        }
    }

    /// Queue `job` behind every job submitted before it.
    pub fn dispatch(&self, job: impl FnOnce() + Send + 'static) {
        let Some(sender) = &self.sender else {
            return;
        };
        if sender.send(Box::new(job)).is_err() {
            log::warn!("render worker has stopped; job dropped");
        }
    }

    /// Queue `job` and block until it has run, returning its result.
    ///
    /// Panics if the job itself panicked. The queue stays usable.
    pub fn run_sync<T: Send + 'static>(&self, job: impl FnOnce() -> T + Send + 'static) -> T {
        let (tx, rx) = mpsc::channel();
        self.dispatch(move || {
            let _ = tx.send(job());
        });
        match rx.recv() {
            Ok(value) => value,
            Err(_) => panic!("render job did not complete"),
        }
    }
}

impl Drop for SerialQueue {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::warn!("render worker panicked");
            }
        }
    }
}

impl std::fmt::Debug for SerialQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = self.worker.as_ref().and_then(|w| w.thread().name().map(str::to_string));
        f.debug_struct("SerialQueue").field("worker", &name).finish()
    }
}
