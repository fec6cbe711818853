//! # Scan Worker
//!
//! The body of the detached thread that runs one job's blocking scan.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, error};

use crate::host::{BackgroundJobs, WorkerFn};
use crate::registry::JobId;
use crate::scanner::{RgScanner, ScanSettings};

use super::events::{UiEvent, UiPoster, WorkerOutcome};

/// Build the worker for `job`. The background job counter is decremented
/// before the completion event is posted, so the UI context never sees a
/// finished job still counted as running.
pub(super) fn scan_task(
    job: JobId,
    scanner: Arc<dyn RgScanner>,
    mut settings: ScanSettings,
    jobs: Arc<BackgroundJobs>,
    poster: UiPoster,
) -> WorkerFn {
    Box::new(move || {
        debug!(%job, tracks = settings.num_tracks(), "scan worker started");
        let scanned = panic::catch_unwind(AssertUnwindSafe(|| scanner.scan(&mut settings)));
        let outcome = match scanned {
            Ok(()) => WorkerOutcome::Completed,
            Err(_) => {
                error!(%job, "scanner panicked; discarding results");
                WorkerOutcome::Panicked
            }
        };
        jobs.decrement();
        debug!(%job, ?outcome, "scan worker exiting");
        poster.post(UiEvent::ScanFinished {
            job,
            settings: Box::new(settings),
            outcome,
        });
    })
}
