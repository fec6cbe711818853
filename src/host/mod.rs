//! # Host Module
//!
//! The narrow slice of the media player the scan controller depends on:
//! reference-counted tracks with metadata lookup, configuration, a clock,
//! detached worker threads and the process-wide background job counter.

pub mod clock;
pub mod playlist;

use std::fmt;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use tracing::warn;

use crate::config::Config;
use crate::scanner::{PluginRegistry, RgScanner};

pub use clock::{Clock, ManualClock, SystemClock};
pub use playlist::{META_ALBUM, META_TITLE, META_URI, MemoryPlaylist};

pub type TrackId = u64;

/// Work handed to a detached worker thread.
pub type WorkerFn = Box<dyn FnOnce() + Send + 'static>;

/// Track model owned by the host.
pub trait TrackStore: Send + Sync {
    fn acquire(&self, id: TrackId);
    fn release(&self, id: TrackId);
    /// Metadata lookup; implementations hold their read lock only for the
    /// duration of the call.
    fn find_meta(&self, id: TrackId, key: &str) -> Option<String>;
}

/// One acquired reference to a host track. Cloning acquires another
/// reference and dropping releases exactly one.
pub struct TrackRef {
    id: TrackId,
    store: Arc<dyn TrackStore>,
}

impl TrackRef {
    pub fn acquire(store: Arc<dyn TrackStore>, id: TrackId) -> Self {
        store.acquire(id);
        Self { id, store }
    }

    pub fn id(&self) -> TrackId {
        self.id
    }

    pub fn meta(&self, key: &str) -> Option<String> {
        self.store.find_meta(self.id, key)
    }
}

impl Clone for TrackRef {
    fn clone(&self) -> Self {
        Self::acquire(self.store.clone(), self.id)
    }
}

impl Drop for TrackRef {
    fn drop(&mut self) {
        self.store.release(self.id);
    }
}

impl fmt::Debug for TrackRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackRef").field("id", &self.id).finish()
    }
}

/// Process-wide count of work in flight, used to defer shutdown.
#[derive(Debug, Default)]
pub struct BackgroundJobs {
    active: AtomicUsize,
}

impl BackgroundJobs {
    pub fn increment(&self) {
        self.active.fetch_add(1, Ordering::SeqCst);
    }

    pub fn decrement(&self) {
        let result = self
            .active
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if result.is_err() {
            warn!("background job counter decremented below zero");
        }
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

/// Services the scan controller consumes from the host player.
pub trait Host: Send + Sync {
    fn conf_get_float(&self, key: &str, default: f32) -> f32;

    fn clock(&self) -> &dyn Clock;

    fn background_jobs(&self) -> Arc<BackgroundJobs>;

    fn plugin_for_id(&self, id: &str) -> Option<Arc<dyn RgScanner>>;

    /// Start `job` on its own thread and detach it immediately.
    fn spawn_worker(&self, name: &str, job: WorkerFn) -> io::Result<()> {
        thread::Builder::new()
            .name(name.to_string())
            .spawn(job)
            .map(|_| ())
    }
}

/// Host backed by a loaded [`Config`] and an explicit plugin registry.
pub struct AppHost {
    config: Config,
    clock: Arc<dyn Clock>,
    jobs: Arc<BackgroundJobs>,
    plugins: PluginRegistry,
}

impl AppHost {
    pub fn new(config: Config, plugins: PluginRegistry) -> Self {
        Self {
            config,
            clock: Arc::new(SystemClock::new()),
            jobs: Arc::new(BackgroundJobs::default()),
            plugins,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Host for AppHost {
    fn conf_get_float(&self, key: &str, default: f32) -> f32 {
        self.config.get_float(key, default)
    }

    fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    fn background_jobs(&self) -> Arc<BackgroundJobs> {
        self.jobs.clone()
    }

    fn plugin_for_id(&self, id: &str) -> Option<Arc<dyn RgScanner>> {
        self.plugins.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TARGET_DB_KEY;

    #[test]
    fn background_jobs_never_go_negative() {
        let jobs = BackgroundJobs::default();
        jobs.increment();
        jobs.decrement();
        jobs.decrement();
        assert_eq!(jobs.active(), 0);
    }

    #[test]
    fn app_host_reads_target_db() {
        let cfg = Config {
            target_db: 84.0,
            ..Config::default()
        };
        let host = AppHost::new(cfg, PluginRegistry::new());
        assert_eq!(host.conf_get_float(TARGET_DB_KEY, 89.0), 84.0);
        assert!(host.plugin_for_id("rg_scanner").is_none());
    }

    #[test]
    fn spawned_worker_runs_detached() {
        let host = AppHost::new(Config::default(), PluginRegistry::new());
        let (tx, rx) = crossbeam_channel::bounded(1);
        host.spawn_worker(
            "test-worker",
            Box::new(move || {
                let name = thread::current().name().map(str::to_string);
                let _ = tx.send(name);
            }),
        )
        .expect("spawn");
        let name = rx
            .recv_timeout(std::time::Duration::from_secs(5))
            .expect("worker ran");
        assert_eq!(name.as_deref(), Some("test-worker"));
    }
}
