//! # Report Module
//!
//! Consumers for the results of a finished scan. Aborted scans never reach
//! a reporter.

pub mod csv;
pub mod json;

use std::cell::RefCell;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::registry::JobId;
use crate::scanner::{ScanMode, ScanResult, ScanStatus};

#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub title: String,
    pub uri: String,
    #[serde(flatten)]
    pub result: ScanResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub session_id: String,
    pub job: u64,
    pub mode: ScanMode,
    pub ref_loudness: f32,
    pub elapsed_seconds: f64,
    pub elapsed: String,
    pub entries: Vec<ReportEntry>,
}

impl ScanReport {
    pub fn ok_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.result.status == ScanStatus::Ok)
            .count()
    }
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] ::csv::Error),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Receives the results of scans that finished without being aborted.
pub trait ResultsReporter {
    fn report(&self, job: JobId, report: &ScanReport) -> Result<(), ReportError>;
}

/// Discards results.
#[derive(Debug, Default)]
pub struct NoReport;

impl ResultsReporter for NoReport {
    fn report(&self, _job: JobId, _report: &ScanReport) -> Result<(), ReportError> {
        Ok(())
    }
}

/// Plain text table, one row per track.
pub struct TableReporter {
    out: RefCell<Box<dyn Write>>,
}

impl TableReporter {
    pub fn new(out: Box<dyn Write>) -> Self {
        Self {
            out: RefCell::new(out),
        }
    }
}

impl ResultsReporter for TableReporter {
    fn report(&self, _job: JobId, report: &ScanReport) -> Result<(), ReportError> {
        let mut out = self.out.borrow_mut();
        writeln!(
            out,
            "{:<40} {:>10} {:>10} {:>10} {:>10}  {}",
            "Name", "Track dB", "Track pk", "Album dB", "Album pk", "Status"
        )?;
        for entry in &report.entries {
            let r = &entry.result;
            let name = if entry.title.is_empty() {
                &entry.uri
            } else {
                &entry.title
            };
            writeln!(
                out,
                "{:<40} {:>10.2} {:>10.6} {:>10.2} {:>10.6}  {:?}",
                name, r.track_gain, r.track_peak, r.album_gain, r.album_peak, r.status
            )?;
        }
        writeln!(
            out,
            "{} of {} tracks scanned in {} (target {:.1} dB)",
            report.ok_count(),
            report.entries.len(),
            report.elapsed,
            report.ref_loudness
        )?;
        out.flush()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Table,
    Json,
    Csv,
}

pub fn format_from_cli(format: crate::cli::OutputFormat) -> ReportFormat {
    match format {
        crate::cli::OutputFormat::Table => ReportFormat::Table,
        crate::cli::OutputFormat::Json => ReportFormat::Json,
        crate::cli::OutputFormat::Csv => ReportFormat::Csv,
    }
}

/// Build a reporter writing to `path`, or to stdout when no path is given.
pub fn build_reporter(
    format: ReportFormat,
    path: Option<&Path>,
) -> Result<Box<dyn ResultsReporter>, ReportError> {
    let out: Box<dyn Write> = match path {
        Some(p) => Box::new(BufWriter::new(File::create(p)?)),
        None => Box::new(io::stdout()),
    };
    Ok(match format {
        ReportFormat::Table => Box::new(TableReporter::new(out)),
        ReportFormat::Json => Box::new(json::JsonReporter::new(out)),
        ReportFormat::Csv => Box::new(csv::CsvReporter::new(out)),
    })
}
