//! Event input from JSON Lines.
//!
//! One [`EventRecord`] per line. Blank lines are ignored; lines that do not
//! parse (bad JSON, invalid UTF-8, out-of-range crossings) are logged and
//! skipped so a single bad record does not stop a job.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use pf_common::{EventRecord, Result};
use tracing::warn;

use crate::logging::event_names;

/// Iterator over the events of a JSONL stream.
///
/// Yields `Err` only for read failures.
pub struct JsonlEventReader<R> {
    reader: R,
    line_no: usize,
    malformed: usize,
    buf: Vec<u8>,
}

impl<R: BufRead> JsonlEventReader<R> {
    pub fn new(reader: R) -> Self {
        JsonlEventReader {
            reader,
            line_no: 0,
            malformed: 0,
            buf: Vec::new(),
        }
    }

    /// Lines skipped because they were not valid events.
    pub fn malformed(&self) -> usize {
        self.malformed
    }

    pub fn lines_read(&self) -> usize {
        self.line_no
    }
}

impl JsonlEventReader<Box<dyn BufRead>> {
    /// Open a file, or stdin for `-`.
    pub fn open(path: &Path) -> Result<Self> {
        let reader: Box<dyn BufRead> = if path.as_os_str() == "-" {
            Box::new(BufReader::new(io::stdin()))
        } else {
            Box::new(BufReader::new(File::open(path)?))
        };
        Ok(Self::new(reader))
    }
}

impl<R: BufRead> Iterator for JsonlEventReader<R> {
    type Item = Result<EventRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(e.into())),
            }
            self.line_no += 1;

            let line = self.buf.trim_ascii();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_slice::<EventRecord>(line) {
                Ok(event) => return Some(Ok(event)),
                Err(e) => {
                    self.malformed += 1;
                    warn!(
                        target: event_names::INPUT_MALFORMED,
                        line = self.line_no,
                        error = %e,
                        "skipping malformed event line"
                    );
                }
            }
        }
    }
}
