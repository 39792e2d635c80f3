//! Fuzz target for the JSONL event path.
//!
//! Every line the reader accepts goes through a monitoring job with the
//! default configuration. Malformed lines are skipped; nothing may panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pf_config::MonitorConfig;
use pf_core::job::MonitoringJob;
use pf_core::source::JsonlEventReader;

fuzz_target!(|data: &[u8]| {
    let Ok(mut job) = MonitoringJob::initialize(&MonitorConfig::default()) else {
        return;
    };
    let reader = JsonlEventReader::new(std::io::Cursor::new(data));
    for event in reader.flatten() {
        let _ = job.on_event(&event);
    }
    let _ = job.finalize();
});
