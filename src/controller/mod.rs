//! # Controller Module
//!
//! Owns the lifecycle of ReplayGain scan jobs on the UI context:
//!
//! `Created -> Running -> {Finished | Aborted} -> Disposed`
//!
//! A [`ScanSession`] validates the scanner plugin, builds the job's settings,
//! registers it, and hands the blocking scan to a detached worker. Progress
//! and completion come back through the [`events::UiQueue`] and are handled
//! when the UI context calls [`ScanSession::tick`] or
//! [`ScanSession::wait_tick`]. Both terminal states converge on a single
//! disposal routine that releases the job's tracks and results.

pub mod display;
pub mod events;
mod worker;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use once_cell::unsync::OnceCell;
use thiserror::Error;
use tracing::{debug, error, info, trace, warn};

use crate::config::TARGET_DB_KEY;
use crate::host::{Host, META_URI, TrackRef};
use crate::progress::{self, format_duration};
use crate::registry::{JobId, JobRegistry};
use crate::report::{NoReport, ReportEntry, ResultsReporter, ScanReport};
use crate::scanner::{
    DEFAULT_LOUDNESS, SCANNER_PLUGIN_ID, ScanMode, ScanResult, ScanSettings, ScannerError,
    check_scanner,
};
use crate::titleformat::TitleFormat;

use display::ProgressDisplay;
use events::{ProgressSink, UiEvent, UiQueue, WorkerOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Created,
    Running,
    Finished,
    Aborted,
    Disposed,
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Scanner(#[from] ScannerError),
    #[error("no tracks selected")]
    EmptySelection,
    #[error("failed to allocate results for {0} tracks")]
    Allocation(usize),
    #[error("failed to start scan worker: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Terminal outcomes observed by a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub started: u64,
    pub finished: u64,
    pub aborted: u64,
}

/// UI-side state of one job. The worker owns the matching [`ScanSettings`]
/// until it posts them back.
struct ScanController {
    mode: ScanMode,
    ref_loudness: f32,
    tracks: Arc<[TrackRef]>,
    abort: Arc<AtomicBool>,
    samples_processed: Arc<AtomicU64>,
    start_time: Duration,
    state: JobState,
}

impl ScanController {
    fn transition(&mut self, job: JobId, next: JobState) {
        debug!(%job, from = ?self.state, to = ?next, "job state change");
        self.state = next;
    }
}

/// The UI context: every job, the registry and the event queue live here and
/// are only touched from the thread that owns the session.
pub struct ScanSession {
    host: Arc<dyn Host>,
    display: Box<dyn ProgressDisplay>,
    reporter: Box<dyn ResultsReporter>,
    registry: JobRegistry,
    controllers: HashMap<JobId, ScanController>,
    queue: UiQueue,
    title_template: String,
    title_format: OnceCell<TitleFormat>,
    worker_name: String,
    session_id: String,
    stats: SessionStats,
}

impl ScanSession {
    pub fn new(host: Arc<dyn Host>, display: Box<dyn ProgressDisplay>) -> Self {
        Self {
            host,
            display,
            reporter: Box::new(NoReport),
            registry: JobRegistry::new(),
            controllers: HashMap::new(),
            queue: UiQueue::new(),
            title_template: "%title%".to_string(),
            title_format: OnceCell::new(),
            worker_name: "rg-scan".to_string(),
            session_id: String::new(),
            stats: SessionStats::default(),
        }
    }

    pub fn with_reporter(mut self, reporter: Box<dyn ResultsReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_title_template(mut self, template: impl Into<String>) -> Self {
        self.title_template = template.into();
        self.title_format = OnceCell::new();
        self
    }

    pub fn with_worker_name(mut self, name: impl Into<String>) -> Self {
        self.worker_name = name.into();
        self
    }

    pub fn with_session_id(mut self, id: impl Into<String>) -> Self {
        self.session_id = id.into();
        self
    }

    /// Start scanning `tracks` in `mode`.
    ///
    /// Fails before any state exists when the scanner plugin is missing or
    /// speaks another major version, when the selection is empty, or when
    /// the results buffer cannot be allocated. A worker that cannot be
    /// started disposes the half-built job before returning.
    pub fn run_scanner(
        &mut self,
        mode: ScanMode,
        tracks: Vec<TrackRef>,
    ) -> Result<JobId, ControllerError> {
        let scanner = match check_scanner(self.host.plugin_for_id(SCANNER_PLUGIN_ID)) {
            Ok(scanner) => scanner,
            Err(err) => {
                warn!("{err}");
                return Err(err.into());
            }
        };
        if tracks.is_empty() {
            warn!("replaygain scan requested with no tracks");
            return Err(ControllerError::EmptySelection);
        }

        let count = tracks.len();
        let mut results: Vec<ScanResult> = Vec::new();
        if results.try_reserve_exact(count).is_err() {
            error!("cannot allocate replaygain results for {count} tracks");
            return Err(ControllerError::Allocation(count));
        }
        results.resize(count, ScanResult::default());

        self.title_format();

        let tracks: Arc<[TrackRef]> = tracks.into();
        let ref_loudness = self.host.conf_get_float(TARGET_DB_KEY, DEFAULT_LOUDNESS);
        let job = self.registry.allocate_id();
        let abort = Arc::new(AtomicBool::new(false));
        let samples_processed = Arc::new(AtomicU64::new(0));
        let settings = ScanSettings::new(
            mode,
            ref_loudness,
            tracks.clone(),
            results,
            abort.clone(),
            samples_processed.clone(),
            ProgressSink::new(job, self.queue.poster()),
        );

        self.controllers.insert(
            job,
            ScanController {
                mode,
                ref_loudness,
                tracks,
                abort,
                samples_processed,
                start_time: self.host.clock().now(),
                state: JobState::Created,
            },
        );
        self.display.open(job);
        self.show_progress(job, 0);
        self.registry.register(job);

        let jobs = self.host.background_jobs();
        jobs.increment();
        let task = worker::scan_task(job, scanner, settings, jobs.clone(), self.queue.poster());
        if let Err(err) = self.host.spawn_worker(&self.worker_name, task) {
            jobs.decrement();
            error!(%job, "failed to start replaygain worker: {err}");
            self.dispose(job);
            return Err(ControllerError::Spawn(err));
        }

        if let Some(ctl) = self.controllers.get_mut(&job) {
            ctl.transition(job, JobState::Running);
        }
        self.stats.started += 1;
        info!(%job, tracks = count, ?mode, ref_loudness, "replaygain scan started");
        Ok(job)
    }

    /// Ask a running job to stop after its current track. Returns false for
    /// jobs that are not live.
    pub fn abort(&self, job: JobId) -> bool {
        match self.controllers.get(&job) {
            Some(ctl) => {
                ctl.abort.store(true, Ordering::Relaxed);
                info!(%job, "replaygain scan abort requested");
                true
            }
            None => false,
        }
    }

    /// Abort every live job; returns how many were signalled.
    pub fn abort_all(&self) -> usize {
        self.registry.iter().filter(|&job| self.abort(job)).count()
    }

    /// Handle every event already queued without blocking.
    pub fn tick(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self.queue.try_next() {
            self.handle(event);
            handled += 1;
        }
        handled
    }

    /// Wait up to `timeout` for an event, then drain the queue.
    pub fn wait_tick(&mut self, timeout: Duration) -> usize {
        match self.queue.next_timeout(timeout) {
            Some(event) => {
                self.handle(event);
                1 + self.tick()
            }
            None => 0,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.registry.is_empty()
    }

    pub fn active_jobs(&self) -> usize {
        self.registry.len()
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    pub fn state(&self, job: JobId) -> Option<JobState> {
        self.controllers.get(&job).map(|ctl| ctl.state)
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    fn title_format(&self) -> &TitleFormat {
        self.title_format
            .get_or_init(|| TitleFormat::compile(&self.title_template))
    }

    fn handle(&mut self, event: UiEvent) {
        match event {
            UiEvent::Progress { job, current } => self.show_progress(job, current),
            UiEvent::ScanFinished {
                job,
                settings,
                outcome,
            } => self.complete(job, *settings, outcome),
        }
    }

    fn elapsed_seconds(&self, ctl: &ScanController) -> f64 {
        self.host
            .clock()
            .now()
            .saturating_sub(ctl.start_time)
            .as_secs_f64()
    }

    fn show_progress(&self, job: JobId, current: usize) {
        let Some(ctl) = self.controllers.get(&job) else {
            trace!(%job, "progress for a job that is gone");
            return;
        };
        let update = progress::report_progress(
            job,
            &ctl.tracks,
            current,
            ctl.samples_processed.load(Ordering::Relaxed),
            self.elapsed_seconds(ctl),
        );
        self.display.update(&update);
    }

    fn complete(&mut self, job: JobId, settings: ScanSettings, outcome: WorkerOutcome) {
        let Some(ctl) = self.controllers.get_mut(&job) else {
            warn!(%job, "completion for a job that is not registered");
            return;
        };
        let aborted = ctl.abort.load(Ordering::Relaxed) || outcome == WorkerOutcome::Panicked;
        if aborted {
            ctl.transition(job, JobState::Aborted);
            self.stats.aborted += 1;
            info!(%job, "replaygain scan aborted");
            drop(settings);
        } else {
            ctl.transition(job, JobState::Finished);
            self.stats.finished += 1;
            self.scan_finished(job, settings);
        }
        self.dispose(job);
    }

    fn scan_finished(&self, job: JobId, settings: ScanSettings) {
        let Some(ctl) = self.controllers.get(&job) else {
            return;
        };
        let elapsed_seconds = self.elapsed_seconds(ctl);
        let elapsed = format_duration(elapsed_seconds, true);
        info!(%job, elapsed = %elapsed, "replaygain scan finished");

        let title_format = self.title_format();
        let entries = settings
            .tracks()
            .iter()
            .zip(&settings.results)
            .map(|(track, result)| ReportEntry {
                title: title_format.format(track),
                uri: track.meta(META_URI).unwrap_or_default(),
                result: *result,
            })
            .collect();
        let report = ScanReport {
            session_id: self.session_id.clone(),
            job: job.get(),
            mode: ctl.mode,
            ref_loudness: ctl.ref_loudness,
            elapsed_seconds,
            elapsed,
            entries,
        };
        if let Err(err) = self.reporter.report(job, &report) {
            warn!(%job, "failed to report replaygain results: {err}");
        }
    }

    /// Release everything `job` holds and forget it. Safe to call for a job
    /// that is already gone.
    fn dispose(&mut self, job: JobId) -> bool {
        let Some(mut ctl) = self.controllers.remove(&job) else {
            return false;
        };
        if !self.registry.unregister(job) {
            warn!(%job, "disposed job was missing from the registry");
        }
        self.display.close(job);
        ctl.transition(job, JobState::Disposed);
        true
    }
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        let live = self.abort_all();
        if live > 0 {
            warn!("scan session dropped with {live} jobs still running");
        }
    }
}
