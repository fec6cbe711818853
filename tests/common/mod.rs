//! Shared harness for controller tests.
//!
//! Provides a scripted scanner, recording display and reporter, and a
//! session wired to an in-memory playlist and a manual clock.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, bounded};

use rgscan::ScanSession;
use rgscan::config::Config;
use rgscan::controller::display::ProgressDisplay;
use rgscan::host::{AppHost, ManualClock, MemoryPlaylist, TrackRef};
use rgscan::progress::ProgressUpdate;
use rgscan::registry::JobId;
use rgscan::report::{ReportError, ResultsReporter, ScanReport};
use rgscan::scanner::{
    PluginRegistry, PluginVersion, RgScanner, SCANNER_PLUGIN_ID, ScanSettings, ScanStatus,
};

// ============================================================================
// Scanner
// ============================================================================

/// Scanner that adds a fixed number of samples per track and reports
/// progress before each one. With a gate, it waits for a signal before
/// touching the first track.
pub struct ScriptedScanner {
    pub major: u32,
    pub samples_per_track: u64,
    pub panic_on_scan: bool,
    gate: Option<Receiver<()>>,
}

impl ScriptedScanner {
    pub fn new() -> Self {
        Self {
            major: 1,
            samples_per_track: 44_100,
            panic_on_scan: false,
            gate: None,
        }
    }

    pub fn with_major(mut self, major: u32) -> Self {
        self.major = major;
        self
    }

    pub fn panicking(mut self) -> Self {
        self.panic_on_scan = true;
        self
    }

    /// Gate the scan; each `send(())` releases one scan call.
    pub fn gated(mut self) -> (Self, Sender<()>) {
        let (tx, rx) = bounded(16);
        self.gate = Some(rx);
        (self, tx)
    }
}

impl RgScanner for ScriptedScanner {
    fn version(&self) -> PluginVersion {
        PluginVersion {
            major: self.major,
            minor: 0,
        }
    }

    fn scan(&self, settings: &mut ScanSettings) {
        if let Some(gate) = &self.gate {
            let _ = gate.recv_timeout(Duration::from_secs(10));
        }
        if self.panic_on_scan {
            panic!("scripted scanner failure");
        }
        for index in 0..settings.num_tracks() {
            if settings.is_aborted() {
                for result in &mut settings.results[index..] {
                    result.status = ScanStatus::Aborted;
                }
                return;
            }
            settings.add_samples(self.samples_per_track);
            settings.report_progress(index);
            let result = &mut settings.results[index];
            result.track_gain = -(index as f32);
            result.track_peak = 0.5;
            result.status = ScanStatus::Ok;
        }
    }
}

// ============================================================================
// Display and reporter
// ============================================================================

#[derive(Debug, Default)]
pub struct DisplayLog {
    pub opened: Vec<JobId>,
    pub closed: Vec<JobId>,
    pub updates: Vec<ProgressUpdate>,
}

#[derive(Clone, Default)]
pub struct RecordingDisplay(pub Arc<Mutex<DisplayLog>>);

impl RecordingDisplay {
    pub fn snapshot<T>(&self, f: impl FnOnce(&DisplayLog) -> T) -> T {
        f(&self.0.lock().expect("display log"))
    }
}

impl ProgressDisplay for RecordingDisplay {
    fn open(&self, job: JobId) {
        self.0.lock().expect("display log").opened.push(job);
    }

    fn update(&self, update: &ProgressUpdate) {
        self.0
            .lock()
            .expect("display log")
            .updates
            .push(update.clone());
    }

    fn close(&self, job: JobId) {
        self.0.lock().expect("display log").closed.push(job);
    }
}

#[derive(Clone, Default)]
pub struct RecordingReporter(pub Arc<Mutex<Vec<(JobId, ScanReport)>>>);

impl RecordingReporter {
    pub fn count(&self) -> usize {
        self.0.lock().expect("reports").len()
    }

    pub fn reports(&self) -> Vec<(JobId, ScanReport)> {
        self.0.lock().expect("reports").clone()
    }
}

impl ResultsReporter for RecordingReporter {
    fn report(&self, job: JobId, report: &ScanReport) -> Result<(), ReportError> {
        self.0.lock().expect("reports").push((job, report.clone()));
        Ok(())
    }
}

// ============================================================================
// Session harness
// ============================================================================

pub struct Harness {
    pub session: ScanSession,
    pub playlist: Arc<MemoryPlaylist>,
    pub host: Arc<AppHost>,
    pub clock: Arc<ManualClock>,
    pub display: RecordingDisplay,
    pub reporter: RecordingReporter,
}

impl Harness {
    pub fn new(scanner: Option<Arc<dyn RgScanner>>) -> Self {
        Self::with_config(scanner, Config::default())
    }

    pub fn with_config(scanner: Option<Arc<dyn RgScanner>>, config: Config) -> Self {
        let mut plugins = PluginRegistry::new();
        if let Some(scanner) = scanner {
            plugins.register(SCANNER_PLUGIN_ID, scanner);
        }
        let clock = Arc::new(ManualClock::new());
        let host = Arc::new(AppHost::new(config, plugins).with_clock(clock.clone()));
        let display = RecordingDisplay::default();
        let reporter = RecordingReporter::default();
        let session = ScanSession::new(host.clone(), Box::new(display.clone()))
            .with_reporter(Box::new(reporter.clone()))
            .with_session_id("test-session");
        Self {
            session,
            playlist: MemoryPlaylist::new(),
            host,
            clock,
            display,
            reporter,
        }
    }

    /// Add `count` tracks and return one reference to each.
    pub fn tracks(&self, count: usize) -> Vec<TrackRef> {
        (0..count)
            .map(|i| {
                let id = self.playlist.insert([
                    (":URI", format!("/music/album/{i:02}.wav")),
                    ("title", format!("Track {i}")),
                    ("album", "Album".to_string()),
                ]);
                self.playlist.track_ref(id).expect("track")
            })
            .collect()
    }

    /// Drive the UI loop until no jobs are live.
    pub fn run_until_idle(&mut self) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while !self.session.is_idle() {
            assert!(Instant::now() < deadline, "session did not become idle");
            self.session.wait_tick(Duration::from_millis(20));
        }
    }
}
