//! # UI Events
//!
//! Events posted from scan workers to the UI context. Workers post and
//! return immediately; the UI context drains the queue once per tick and
//! runs each handler to completion.

use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, unbounded};
use tracing::trace;

use crate::registry::JobId;
use crate::scanner::ScanSettings;

/// How a worker's scan call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerOutcome {
    /// The scanner returned normally.
    Completed,
    /// The scanner panicked; its results are not trustworthy.
    Panicked,
}

#[derive(Debug)]
pub enum UiEvent {
    /// Track `current` of `job` is about to be scanned.
    Progress { job: JobId, current: usize },
    /// The worker for `job` is done and hands its settings back.
    ScanFinished {
        job: JobId,
        settings: Box<ScanSettings>,
        outcome: WorkerOutcome,
    },
}

/// Consumer end, owned by the UI context.
#[derive(Debug)]
pub struct UiQueue {
    tx: Sender<UiEvent>,
    rx: Receiver<UiEvent>,
}

impl UiQueue {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    pub fn poster(&self) -> UiPoster {
        UiPoster {
            tx: self.tx.clone(),
        }
    }

    pub fn try_next(&self) -> Option<UiEvent> {
        self.rx.try_recv().ok()
    }

    pub fn next_timeout(&self, timeout: Duration) -> Option<UiEvent> {
        self.rx.recv_timeout(timeout).ok()
    }

    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

impl Default for UiQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Producer end handed to workers. Posting never blocks.
#[derive(Debug, Clone)]
pub struct UiPoster {
    tx: Sender<UiEvent>,
}

impl UiPoster {
    pub fn post(&self, event: UiEvent) {
        if let Err(err) = self.tx.send(event) {
            trace!("ui queue closed; dropping {:?}", err.into_inner());
        }
    }
}

/// Progress callback bound to one job.
#[derive(Debug, Clone)]
pub struct ProgressSink {
    job: JobId,
    poster: UiPoster,
}

impl ProgressSink {
    pub fn new(job: JobId, poster: UiPoster) -> Self {
        Self { job, poster }
    }

    pub fn progress(&self, current: usize) {
        self.poster.post(UiEvent::Progress {
            job: self.job,
            current,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::JobRegistry;

    #[test]
    fn events_from_one_producer_keep_order() {
        let queue = UiQueue::new();
        let mut registry = JobRegistry::new();
        let job = registry.allocate_id();
        let sink = ProgressSink::new(job, queue.poster());

        let handle = std::thread::spawn(move || {
            for i in 0..100 {
                sink.progress(i);
            }
        });
        handle.join().expect("producer");

        assert_eq!(queue.pending(), 100);
        let mut seen = Vec::new();
        while let Some(event) = queue.try_next() {
            match event {
                UiEvent::Progress { job: from, current } => {
                    assert_eq!(from, job);
                    seen.push(current);
                }
                other => panic!("unexpected event {other:?}"),
            }
        }
        assert_eq!(seen, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn empty_queue_times_out() {
        let queue = UiQueue::new();
        assert!(queue.try_next().is_none());
        assert!(queue.next_timeout(Duration::from_millis(5)).is_none());
    }
}
