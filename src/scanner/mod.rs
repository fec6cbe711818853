//! Scanner plugin contract: modes, per-track results and the settings a
//! scan runs against.

pub mod pcm;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde::Serialize;
use thiserror::Error;

use crate::controller::events::ProgressSink;
use crate::host::TrackRef;

/// Plugin id the scanner registers under.
pub const SCANNER_PLUGIN_ID: &str = "rg_scanner";
/// Major interface version this controller speaks.
pub const SUPPORTED_MAJOR_VERSION: u32 = 1;
/// Target loudness used when configuration does not provide one.
pub const DEFAULT_LOUDNESS: f32 = 89.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    /// Every file gets its own gain.
    Track,
    /// The whole selection is one album.
    SingleAlbum,
    /// Albums are grouped by their album tag.
    AlbumsFromTags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluginVersion {
    pub major: u32,
    pub minor: u32,
}

impl fmt::Display for PluginVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    #[default]
    Pending,
    Ok,
    FileNotFound,
    InvalidFile,
    Aborted,
}

/// Per-track outcome written by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ScanResult {
    pub track_gain: f32,
    pub album_gain: f32,
    pub track_peak: f32,
    pub album_peak: f32,
    pub status: ScanStatus,
}

/// Everything one scan call needs. Built by the controller, handed to the
/// worker for the duration of the scan and returned on completion.
pub struct ScanSettings {
    pub mode: ScanMode,
    pub ref_loudness: f32,
    pub results: Vec<ScanResult>,
    tracks: Arc<[TrackRef]>,
    abort: Arc<AtomicBool>,
    samples_processed: Arc<AtomicU64>,
    progress: ProgressSink,
}

impl ScanSettings {
    pub(crate) fn new(
        mode: ScanMode,
        ref_loudness: f32,
        tracks: Arc<[TrackRef]>,
        results: Vec<ScanResult>,
        abort: Arc<AtomicBool>,
        samples_processed: Arc<AtomicU64>,
        progress: ProgressSink,
    ) -> Self {
        Self {
            mode,
            ref_loudness,
            results,
            tracks,
            abort,
            samples_processed,
            progress,
        }
    }

    pub fn tracks(&self) -> &[TrackRef] {
        &self.tracks
    }

    pub fn num_tracks(&self) -> usize {
        self.tracks.len()
    }

    /// Advisory abort signal; check it between tracks.
    pub fn is_aborted(&self) -> bool {
        self.abort.load(Ordering::Relaxed)
    }

    /// Add to the running count of 44.1 kHz-equivalent samples decoded.
    pub fn add_samples(&self, samples: u64) {
        self.samples_processed.fetch_add(samples, Ordering::Relaxed);
    }

    pub fn samples_processed(&self) -> u64 {
        self.samples_processed.load(Ordering::Relaxed)
    }

    /// Announce that track `current` is about to be scanned. Never blocks.
    pub fn report_progress(&self, current: usize) {
        self.progress.progress(current);
    }
}

impl fmt::Debug for ScanSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanSettings")
            .field("mode", &self.mode)
            .field("ref_loudness", &self.ref_loudness)
            .field("num_tracks", &self.tracks.len())
            .field("aborted", &self.is_aborted())
            .finish()
    }
}

/// Loudness scanner plugin.
pub trait RgScanner: Send + Sync {
    fn version(&self) -> PluginVersion;

    /// Blocking scan over `settings.tracks()`, filling `settings.results`.
    fn scan(&self, settings: &mut ScanSettings);
}

#[derive(Debug, Error)]
pub enum ScannerError {
    #[error("ReplayGain plugin is not found")]
    Missing,
    #[error("Invalid version of rg_scanner plugin: found {found}, need major {expected}")]
    Incompatible {
        found: PluginVersion,
        expected: u32,
    },
}

/// Accept a looked-up plugin only if it speaks our major version.
pub fn check_scanner(
    plugin: Option<Arc<dyn RgScanner>>,
) -> Result<Arc<dyn RgScanner>, ScannerError> {
    let plugin = plugin.ok_or(ScannerError::Missing)?;
    let found = plugin.version();
    if found.major != SUPPORTED_MAJOR_VERSION {
        return Err(ScannerError::Incompatible {
            found,
            expected: SUPPORTED_MAJOR_VERSION,
        });
    }
    Ok(plugin)
}

#[derive(Default, Clone)]
pub struct PluginRegistry {
    plugins: HashMap<String, Arc<dyn RgScanner>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: impl Into<String>, plugin: Arc<dyn RgScanner>) {
        self.plugins.insert(id.into(), plugin);
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn RgScanner>> {
        self.plugins.get(id).cloned()
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.plugins.keys()).finish()
    }
}
