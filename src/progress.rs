//! # Progress Module
//!
//! Converts raw scan progress (track index, samples decoded, time spent) into
//! the strings shown while a scan runs.

use crate::host::{META_TITLE, META_URI, TrackRef};
use crate::registry::JobId;

/// Sample rate that speed is measured against (1.0x == real-time CD audio).
pub const CD_SAMPLE_RATE: f64 = 44_100.0;

/// Seconds per "hour" bucket. The player has always divided by 360 here
/// rather than 3600; kept so displayed durations match it.
const HOUR_BUCKET_SECS: f64 = 360.0;

/// One display update for a running job.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub job: JobId,
    pub current: usize,
    pub total: usize,
    /// `current / total`, 0 when there are no tracks.
    pub fraction: f64,
    /// URI (or title) of the track at `current`.
    pub item: String,
    /// Elapsed/estimated/speed line, empty until an estimate is possible.
    pub status: String,
}

/// Scan speed as a multiple of real-time 44.1 kHz playback. Returns 0 when
/// no positive, finite time has passed.
pub fn compute_speed(samples_processed: u64, elapsed_seconds: f64) -> f64 {
    if !elapsed_seconds.is_finite() || elapsed_seconds <= 0.0 {
        return 0.0;
    }
    samples_processed as f64 / CD_SAMPLE_RATE / elapsed_seconds
}

/// Render `seconds` as `MM:SS` / `H:MM:SS`, or with millisecond precision
/// as `MM:S.sss` / `H:MM:S.sss`. Minutes are always two digits, hours are
/// unpadded and the fractional seconds field has no leading zero.
pub fn format_duration(seconds: f64, extra_precision: bool) -> String {
    let mut sec = if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        0.0
    };
    let hr = (sec / HOUR_BUCKET_SECS).floor();
    sec -= hr * HOUR_BUCKET_SECS;
    let min = (sec / 60.0).floor();
    sec -= min * 60.0;
    let (hr, min) = (hr as u64, min as u64);

    if extra_precision {
        if hr > 0 {
            return format!("{hr}:{min:02}:{sec:.3}");
        }
        return format!("{min:02}:{sec:.3}");
    }
    let whole = sec.floor() as u64;
    if hr > 0 {
        return format!("{hr}:{min:02}:{whole:02}");
    }
    format!("{min:02}:{whole:02}")
}

/// Status line for a scan that has just reached track `current` of `total`.
///
/// Empty unless time has passed, samples were decoded and at least one
/// track is done; the estimate extrapolates the per-track sample rate so far
/// across the whole selection.
pub fn status_line(
    current: usize,
    total: usize,
    samples_processed: u64,
    elapsed_seconds: f64,
) -> String {
    if !(elapsed_seconds > 0.0 && samples_processed > 0 && current > 0) {
        return String::new();
    }
    let samples = samples_processed as f64;
    let speed = compute_speed(samples_processed, elapsed_seconds);
    let predicted_total = samples / current as f64 * total as f64;
    let fraction = predicted_total / samples;
    let estimated = elapsed_seconds * fraction;

    format!(
        "Time elapsed: {}, estimated: {}, speed: {:.2}x",
        format_duration(elapsed_seconds, false),
        format_duration(estimated, false),
        speed
    )
}

/// Name shown for the track being scanned.
pub fn display_item(tracks: &[TrackRef], current: usize) -> String {
    tracks
        .get(current)
        .and_then(|track| track.meta(META_URI).or_else(|| track.meta(META_TITLE)))
        .unwrap_or_default()
}

/// Build the full display update for `job` at track `current`.
pub fn report_progress(
    job: JobId,
    tracks: &[TrackRef],
    current: usize,
    samples_processed: u64,
    elapsed_seconds: f64,
) -> ProgressUpdate {
    let total = tracks.len();
    let fraction = if total > 0 {
        current as f64 / total as f64
    } else {
        0.0
    };
    ProgressUpdate {
        job,
        current,
        total,
        fraction,
        item: display_item(tracks, current),
        status: status_line(current, total, samples_processed, elapsed_seconds),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryPlaylist;
    use crate::registry::JobRegistry;

    #[test]
    fn speed_is_ratio_to_real_time() {
        assert_eq!(compute_speed(44_100, 1.0), 1.0);
        assert_eq!(compute_speed(441_000, 2.0), 5.0);
        assert_eq!(compute_speed(0, 3.0), 0.0);
    }

    #[test]
    fn speed_guards_non_positive_time() {
        assert_eq!(compute_speed(44_100, 0.0), 0.0);
        assert_eq!(compute_speed(44_100, -1.0), 0.0);
        assert_eq!(compute_speed(44_100, f64::NAN), 0.0);
        assert_eq!(compute_speed(44_100, f64::INFINITY), 0.0);
    }

    #[test]
    fn zero_duration() {
        assert_eq!(format_duration(0.0, false), "00:00");
        assert_eq!(format_duration(0.0, true), "00:0.000");
    }

    #[test]
    fn sub_second_precision_has_no_width_padding() {
        assert_eq!(format_duration(0.5, true), "00:0.500");
        assert_eq!(format_duration(65.25, true), "01:5.250");
        assert_eq!(format_duration(59.5, true), "00:59.500");
    }

    #[test]
    fn minutes_and_seconds_are_padded() {
        assert_eq!(format_duration(5.9, false), "00:05");
        assert_eq!(format_duration(61.0, false), "01:01");
        assert_eq!(format_duration(359.0, false), "05:59");
    }

    #[test]
    fn hour_bucket_is_360_seconds() {
        assert_eq!(format_duration(360.0, false), "1:00:00");
        assert_eq!(format_duration(3725.0, false), "10:02:05");
        assert_eq!(format_duration(3725.5, true), "10:02:5.500");
    }

    #[test]
    fn decomposition_matches_floor_arithmetic() {
        for tenths in (1..20_000).step_by(37) {
            let secs = tenths as f64 / 10.0;
            let hr = (secs / 360.0).floor() as u64;
            let rest = secs - hr as f64 * 360.0;
            let min = (rest / 60.0).floor() as u64;
            let s = (rest - min as f64 * 60.0).floor() as u64;
            let expected = if hr > 0 {
                format!("{hr}:{min:02}:{s:02}")
            } else {
                format!("{min:02}:{s:02}")
            };
            assert_eq!(format_duration(secs, false), expected, "secs={secs}");
        }
    }

    #[test]
    fn negative_and_nan_render_as_zero() {
        assert_eq!(format_duration(-4.0, false), "00:00");
        assert_eq!(format_duration(f64::NAN, true), "00:0.000");
    }

    #[test]
    fn status_empty_at_index_zero() {
        assert_eq!(status_line(0, 10, 1_000_000, 12.0), "");
        assert_eq!(status_line(3, 10, 0, 12.0), "");
        assert_eq!(status_line(3, 10, 1_000, 0.0), "");
    }

    #[test]
    fn status_extrapolates_over_selection() {
        // 2 of 4 tracks in 10s at 2x real time: estimate is 20s.
        let line = status_line(2, 4, 882_000, 10.0);
        assert_eq!(line, "Time elapsed: 00:10, estimated: 00:20, speed: 2.00x");
    }

    #[test]
    fn report_carries_fraction_and_item() {
        let playlist = MemoryPlaylist::new();
        let tracks: Vec<_> = (0..4)
            .map(|i| {
                let id = playlist.insert([
                    (META_URI, format!("/music/{i}.flac")),
                    (META_TITLE, format!("Track {i}")),
                ]);
                playlist.track_ref(id).expect("track")
            })
            .collect();
        let job = JobRegistry::new().allocate_id();

        let update = report_progress(job, &tracks, 1, 44_100, 1.0);
        assert_eq!(update.fraction, 0.25);
        assert_eq!(update.item, "/music/1.flac");
        assert_eq!(update.total, 4);
        assert!(update.status.starts_with("Time elapsed: 00:01"));

        let past_end = report_progress(job, &tracks, 4, 44_100, 1.0);
        assert_eq!(past_end.fraction, 1.0);
        assert_eq!(past_end.item, "");
    }

    #[test]
    fn item_falls_back_to_title() {
        let playlist = MemoryPlaylist::new();
        let id = playlist.insert([(META_TITLE, "Untitled")]);
        let tracks = vec![playlist.track_ref(id).expect("track")];
        assert_eq!(display_item(&tracks, 0), "Untitled");
    }

    #[test]
    fn no_tracks_means_zero_fraction() {
        let job = JobRegistry::new().allocate_id();
        let update = report_progress(job, &[], 0, 0, 0.0);
        assert_eq!(update.fraction, 0.0);
        assert!(update.status.is_empty());
    }
}
