//! Background-work dispatch for character datastores.
//!
//! Characters hand datastore writes to a [`TaskExecutor`] so production code
//! can run them on worker threads while ephemeral instances run them inline
//! on the calling thread and leave no background threads behind.

use std::sync::{Arc, Mutex};
use std::thread;
use tokio::sync::mpsc;
use tracing::warn;

pub type WorkItem = Box<dyn FnOnce() -> std::io::Result<()> + Send + 'static>;

/// How a submitted work item was handled.
#[derive(Debug)]
pub enum Dispatch {
    /// Handed to a background worker; the outcome is reported via logs.
    Deferred,
    /// Ran on the calling thread; the outcome is returned immediately.
    Completed(std::io::Result<()>),
}

impl Dispatch {
    pub fn is_deferred(&self) -> bool {
        matches!(self, Dispatch::Deferred)
    }
}

pub trait TaskExecutor: std::fmt::Debug + Send + Sync {
    fn submit(&self, work: WorkItem) -> Dispatch;
}

/// Default executor: a fixed set of worker threads draining a shared queue.
#[derive(Debug)]
pub struct ThreadPoolExecutor {
    sender: mpsc::UnboundedSender<WorkItem>,
}

impl ThreadPoolExecutor {
    pub const DEFAULT_WORKERS: usize = 4;

    pub fn new(workers: usize) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel::<WorkItem>();
        let receiver = Arc::new(Mutex::new(receiver));

        for index in 0..workers.max(1) {
            let receiver = receiver.clone();
            thread::Builder::new()
                .name(format!("datastore-{index}"))
                .spawn(move || loop {
                    // Hold the lock only while dequeueing so workers drain
                    // the queue concurrently.
                    let work = receiver.lock().unwrap().blocking_recv();
                    match work {
                        Some(work) => {
                            if let Err(err) = work() {
                                warn!("Datastore work item failed: {err}");
                            }
                        }
                        None => break,
                    }
                })
                .expect("worker thread spawn");
        }

        Self { sender }
    }
}

impl Default for ThreadPoolExecutor {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WORKERS)
    }
}

impl TaskExecutor for ThreadPoolExecutor {
    fn submit(&self, work: WorkItem) -> Dispatch {
        if self.sender.send(work).is_err() {
            warn!("Datastore worker pool is gone; dropping work item");
        }
        Dispatch::Deferred
    }
}

/// Ephemeral stand-in: runs every work item on the calling thread and hands
/// the result straight back.
#[derive(Debug, Clone, Copy)]
pub struct InlineExecutor;

impl TaskExecutor for InlineExecutor {
    fn submit(&self, work: WorkItem) -> Dispatch {
        Dispatch::Completed(work())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    #[test]
    fn inline_executor_runs_on_the_calling_thread() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();

        let dispatch = InlineExecutor.submit(Box::new(move || {
            flag.store(true, Ordering::SeqCst);
            Ok(())
        }));

        // No waiting: the item completed before submit returned.
        assert!(ran.load(Ordering::SeqCst));
        assert!(matches!(dispatch, Dispatch::Completed(Ok(()))));
    }

    #[test]
    fn inline_executor_returns_the_failure() {
        let dispatch = InlineExecutor.submit(Box::new(|| {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "boom"))
        }));
        assert!(matches!(dispatch, Dispatch::Completed(Err(_))));
    }

    #[test]
    fn thread_pool_defers_and_eventually_runs() {
        let (sender, receiver) = std::sync::mpsc::channel();
        let pool = ThreadPoolExecutor::new(2);

        let dispatch = pool.submit(Box::new(move || {
            sender.send(()).unwrap();
            Ok(())
        }));

        assert!(dispatch.is_deferred());
        receiver
            .recv_timeout(Duration::from_secs(5))
            .expect("work item should run on a worker thread");
    }
}
