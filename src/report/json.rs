use std::cell::RefCell;
use std::io::Write;

use crate::registry::JobId;

use super::{ReportError, ResultsReporter, ScanReport};

/// One JSON document per finished scan, newline separated.
pub struct JsonReporter {
    out: RefCell<Box<dyn Write>>,
}

impl JsonReporter {
    pub fn new(out: Box<dyn Write>) -> Self {
        Self {
            out: RefCell::new(out),
        }
    }
}

impl ResultsReporter for JsonReporter {
    fn report(&self, _job: JobId, report: &ScanReport) -> Result<(), ReportError> {
        let mut out = self.out.borrow_mut();
        serde_json::to_writer(&mut *out, report)?;
        out.write_all(b"\n")?;
        out.flush()?;
        Ok(())
    }
}
