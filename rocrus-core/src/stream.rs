//! In-order work queues.
//!
//! A [`Stream`] owns a worker thread that runs submitted jobs one after the
//! other. Kernel launches synchronise the handle's stream first, so they see
//! every asynchronous transfer submitted before them.

use crate::error::Error;
use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex};
use std::thread;

type Job = Box<dyn FnOnce() + Send + 'static>;

#[derive(Default)]
struct Progress {
    submitted: u64,
    completed: u64,
    failed: Option<String>,
}

struct Shared {
    progress: Mutex<Progress>,
    done: Condvar,
}

impl Shared {
    fn lock(&self) -> std::sync::MutexGuard<'_, Progress> {
        self.progress.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Ordered queue of device work.
pub struct Stream {
    sender: Mutex<Option<mpsc::Sender<Job>>>,
    shared: Arc<Shared>,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
}

impl std::fmt::Debug for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let p = self.shared.lock();
        f.debug_struct("Stream")
            .field("submitted", &p.submitted)
            .field("completed", &p.completed)
            .finish()
    }
}

impl Stream {
    pub fn new() -> Result<Self, Error> {
        let (tx, rx) = mpsc::channel::<Job>();
        let shared = Arc::new(Shared {
            progress: Mutex::new(Progress::default()),
            done: Condvar::new(),
        });
        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("rocrus-stream".into())
            .spawn(move || {
                for job in rx {
                    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(job));
                    let mut p = worker_shared.lock();
                    if outcome.is_err() && p.failed.is_none() {
                        p.failed = Some("stream job panicked".into());
                    }
                    p.completed += 1;
                    worker_shared.done.notify_all();
                }
            })
            .map_err(|e| Error::Internal(format!("cannot start stream worker: {e}")))?;
        Ok(Stream {
            sender: Mutex::new(Some(tx)),
            shared,
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Queues `job` behind all previously submitted work.
    pub fn submit<F>(&self, job: F) -> Result<(), Error>
    where
        F: FnOnce() + Send + 'static,
    {
        let sender = self.sender.lock().unwrap_or_else(|e| e.into_inner());
        let tx = sender
            .as_ref()
            .ok_or_else(|| Error::Internal("stream is shut down".into()))?;
        self.shared.lock().submitted += 1;
        tx.send(Box::new(job)).map_err(|_| {
            self.shared.lock().submitted -= 1;
            Error::Internal("stream worker exited".into())
        })
    }

    /// Blocks until every submitted job has run.
    ///
    /// A job that panicked is reported once as an internal error.
    pub fn synchronize(&self) -> Result<(), Error> {
        let mut p = self.shared.lock();
        while p.completed < p.submitted {
            p = self
                .shared
                .done
                .wait(p)
                .unwrap_or_else(|e| e.into_inner());
        }
        match p.failed.take() {
            Some(msg) => Err(Error::Internal(msg)),
            None => Ok(()),
        }
    }

    /// Whether all submitted work has completed.
    pub fn is_idle(&self) -> bool {
        let p = self.shared.lock();
        p.completed == p.submitted
    }
}

impl Drop for Stream {
    fn drop(&mut self) {
        if let Err(e) = self.synchronize() {
            tracing::warn!(error = %e, "stream dropped with failed work");
        }
        // Closing the channel ends the worker loop.
        self.sender
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(worker) = self.worker.lock().unwrap_or_else(|e| e.into_inner()).take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_jobs_run_in_order() {
        let stream = Stream::new().unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        for i in 0..50 {
            let log = Arc::clone(&log);
            stream.submit(move || log.lock().unwrap().push(i)).unwrap();
        }
        stream.synchronize().unwrap();
        assert_eq!(*log.lock().unwrap(), (0..50).collect::<Vec<_>>());
        assert!(stream.is_idle());
    }

    #[test]
    fn test_synchronize_reports_panics() {
        let stream = Stream::new().unwrap();
        stream.submit(|| panic!("boom")).unwrap();
        assert!(matches!(stream.synchronize(), Err(Error::Internal(_))));
        assert!(stream.synchronize().is_ok());
    }

    #[test]
    fn test_drop_waits_for_work() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let stream = Stream::new().unwrap();
            for _ in 0..10 {
                let c = Arc::clone(&counter);
                stream
                    .submit(move || {
                        c.fetch_add(1, Ordering::SeqCst);
                    })
                    .unwrap();
            }
        }
        assert_eq!(counter.load(Ordering::SeqCst), 10);
    }
}
