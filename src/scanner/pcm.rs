//! Reference scanner for raw 16-bit PCM and simple WAVE files.
//!
//! Loudness is approximated from RMS level rather than a full equal-loudness
//! filter chain. Input is read as interleaved stereo little-endian samples at
//! 44.1 kHz; a RIFF/WAVE file is walked chunk by chunk to its `data` chunk.

use std::path::Path;

use tracing::{debug, warn};

use crate::host::{META_ALBUM, META_URI};

use super::{PluginVersion, RgScanner, SUPPORTED_MAJOR_VERSION, ScanMode, ScanSettings, ScanStatus};

const CHANNELS: usize = 2;
const FRAMES_PER_BLOCK: usize = 4096;
/// Maps RMS dBFS onto the SPL scale the target loudness is expressed in.
pub const PCM_SPL_OFFSET: f32 = 107.0;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Levels {
    peak: f32,
    sum_squares: f64,
    samples: u64,
}

impl Levels {
    fn merge(&mut self, other: &Levels) {
        self.peak = self.peak.max(other.peak);
        self.sum_squares += other.sum_squares;
        self.samples += other.samples;
    }

    fn gain(&self, ref_loudness: f32) -> f32 {
        if self.samples == 0 || self.sum_squares <= 0.0 {
            return 0.0;
        }
        let mean_square = self.sum_squares / self.samples as f64;
        let rms_dbfs = (10.0 * mean_square.log10()) as f32;
        ref_loudness - (rms_dbfs + PCM_SPL_OFFSET)
    }
}

#[derive(Debug, Default)]
pub struct PcmScanner;

impl PcmScanner {
    pub fn new() -> Self {
        Self
    }
}

impl RgScanner for PcmScanner {
    fn version(&self) -> PluginVersion {
        PluginVersion {
            major: SUPPORTED_MAJOR_VERSION,
            minor: 0,
        }
    }

    fn scan(&self, settings: &mut ScanSettings) {
        let count = settings.num_tracks();
        let mut levels: Vec<Option<Levels>> = vec![None; count];

        for index in 0..count {
            if settings.is_aborted() {
                debug!("scan aborted before track {index}");
                for result in &mut settings.results[index..] {
                    result.status = ScanStatus::Aborted;
                }
                return;
            }
            settings.report_progress(index);

            let uri = settings.tracks()[index].meta(META_URI);
            let outcome = match uri {
                Some(uri) => analyze_file(Path::new(&uri), settings),
                None => Err(ScanStatus::FileNotFound),
            };
            let result = &mut settings.results[index];
            match outcome {
                Ok(track) => {
                    result.track_gain = track.gain(settings.ref_loudness);
                    result.track_peak = track.peak;
                    result.status = ScanStatus::Ok;
                    levels[index] = Some(track);
                }
                Err(status) => {
                    result.status = status;
                }
            }
        }

        for group in album_groups(settings) {
            let mut album = Levels::default();
            for &index in &group {
                if let Some(track) = &levels[index] {
                    album.merge(track);
                }
            }
            let album_gain = album.gain(settings.ref_loudness);
            for &index in &group {
                let result = &mut settings.results[index];
                if result.status == ScanStatus::Ok {
                    result.album_gain = album_gain;
                    result.album_peak = album.peak;
                }
            }
        }
    }
}

/// Indices of tracks sharing an album gain, in first-seen order.
fn album_groups(settings: &ScanSettings) -> Vec<Vec<usize>> {
    let count = settings.num_tracks();
    match settings.mode {
        ScanMode::Track => (0..count).map(|i| vec![i]).collect(),
        ScanMode::SingleAlbum => vec![(0..count).collect()],
        ScanMode::AlbumsFromTags => {
            let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
            for (index, track) in settings.tracks().iter().enumerate() {
                let album = track.meta(META_ALBUM).unwrap_or_default();
                match groups.iter_mut().find(|(name, _)| *name == album) {
                    Some((_, members)) => members.push(index),
                    None => groups.push((album, vec![index])),
                }
            }
            groups.into_iter().map(|(_, members)| members).collect()
        }
    }
}

fn analyze_file(path: &Path, settings: &ScanSettings) -> Result<Levels, ScanStatus> {
    let bytes = std::fs::read(path).map_err(|err| {
        warn!("cannot read {}: {err}", path.display());
        ScanStatus::FileNotFound
    })?;
    let pcm = pcm_payload(&bytes).ok_or_else(|| {
        warn!("no PCM payload in {}", path.display());
        ScanStatus::InvalidFile
    })?;
    Ok(measure(pcm, |frames| settings.add_samples(frames)))
}

/// Sample bytes of a RIFF/WAVE file, or the whole buffer for raw PCM.
fn pcm_payload(bytes: &[u8]) -> Option<&[u8]> {
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE" {
        return wave_data_chunk(bytes);
    }
    (!bytes.is_empty()).then_some(bytes)
}

/// Walk the RIFF chunks after the form type until the `data` chunk. Chunk
/// bodies are padded to an even length. A truncated `data` chunk yields
/// whatever samples are present.
fn wave_data_chunk(bytes: &[u8]) -> Option<&[u8]> {
    let mut pos: usize = 12;
    while let Some(header) = pos.checked_add(8).and_then(|end| bytes.get(pos..end)) {
        let id = &header[0..4];
        let len = u32::from_le_bytes([header[4], header[5], header[6], header[7]]) as usize;
        let body = pos + 8;
        if id == b"data" {
            let end = body.saturating_add(len).min(bytes.len());
            let payload = &bytes[body..end];
            return (!payload.is_empty()).then_some(payload);
        }
        pos = body.checked_add(len)?.checked_add(len & 1)?;
    }
    None
}

/// Peak and energy of interleaved stereo samples. `on_frames` is told about
/// every block so progress reflects work inside long files.
fn measure(pcm: &[u8], mut on_frames: impl FnMut(u64)) -> Levels {
    let mut levels = Levels::default();
    let block_bytes = FRAMES_PER_BLOCK * CHANNELS * 2;
    for block in pcm.chunks(block_bytes) {
        let mut block_samples = 0u64;
        for sample in block.chunks_exact(2) {
            let value = i16::from_le_bytes([sample[0], sample[1]]) as f32 / 32768.0;
            levels.peak = levels.peak.max(value.abs());
            levels.sum_squares += f64::from(value) * f64::from(value);
            block_samples += 1;
        }
        levels.samples += block_samples;
        on_frames(block_samples / CHANNELS as u64);
    }
    levels
}
