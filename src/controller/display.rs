use tracing::info;

use crate::progress::ProgressUpdate;
use crate::registry::JobId;

/// Where progress for a job is shown. Called on the UI context only.
pub trait ProgressDisplay {
    fn open(&self, job: JobId);
    fn update(&self, update: &ProgressUpdate);
    fn close(&self, job: JobId);
}

/// Shows progress as log lines.
#[derive(Debug, Default)]
pub struct LogDisplay;

impl ProgressDisplay for LogDisplay {
    fn open(&self, job: JobId) {
        info!(%job, "replaygain scan progress opened");
    }

    fn update(&self, update: &ProgressUpdate) {
        if update.status.is_empty() {
            info!(
                job = %update.job,
                "[{}/{}] {}",
                update.current,
                update.total,
                update.item
            );
        } else {
            info!(
                job = %update.job,
                "[{}/{}] {:.0}% {} | {}",
                update.current,
                update.total,
                update.fraction * 100.0,
                update.item,
                update.status
            );
        }
    }

    fn close(&self, job: JobId) {
        info!(%job, "replaygain scan progress closed");
    }
}

/// Ignores every update.
#[derive(Debug, Default)]
pub struct NullDisplay;

impl ProgressDisplay for NullDisplay {
    fn open(&self, _job: JobId) {}
    fn update(&self, _update: &ProgressUpdate) {}
    fn close(&self, _job: JobId) {}
}
