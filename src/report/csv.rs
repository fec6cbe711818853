use std::cell::RefCell;
use std::io::Write;

use serde::Serialize;

use crate::registry::JobId;
use crate::scanner::ScanStatus;

use super::{ReportError, ResultsReporter, ScanReport};

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    session_id: &'a str,
    job: u64,
    title: &'a str,
    uri: &'a str,
    track_gain: f32,
    track_peak: f32,
    album_gain: f32,
    album_peak: f32,
    status: ScanStatus,
}

/// One CSV row per track; the header is written with the first report.
pub struct CsvReporter {
    writer: RefCell<::csv::Writer<Box<dyn Write>>>,
}

impl CsvReporter {
    pub fn new(out: Box<dyn Write>) -> Self {
        Self {
            writer: RefCell::new(::csv::Writer::from_writer(out)),
        }
    }
}

impl ResultsReporter for CsvReporter {
    fn report(&self, _job: JobId, report: &ScanReport) -> Result<(), ReportError> {
        let mut writer = self.writer.borrow_mut();
        for entry in &report.entries {
            writer.serialize(CsvRow {
                session_id: &report.session_id,
                job: report.job,
                title: &entry.title,
                uri: &entry.uri,
                track_gain: entry.result.track_gain,
                track_peak: entry.result.track_peak,
                album_gain: entry.result.album_gain,
                album_peak: entry.result.album_peak,
                status: entry.result.status,
            })?;
        }
        writer.flush()?;
        Ok(())
    }
}
