use std::io::Write;
use std::sync::{Arc, Condvar, Mutex};

use chrono::Local;

use crate::error::SourceError;
use crate::scan::ScanSession;
use crate::scan_worker::spawn_source_thread;
use crate::source::PayloadSource;
use crate::verdict::Verdict;

/// Text rendering of the banner: `[SAFE] ✅ ССЫЛКА БЕЗОПАСНА`.
pub fn banner_line(verdict: &Verdict) -> String {
    format!("[{}] {}", verdict.kind, verdict.label)
}

/// Runs `source` without a window, writing one timestamped banner line to
/// `out` per verdict change. Returns when the source ends.
pub fn run_headless(
    source: Box<dyn PayloadSource>,
    out: &mut dyn Write,
) -> Result<(), SourceError> {
    let run_state = Arc::new((Mutex::new(true), Condvar::new()));
    let events = spawn_source_thread(source, run_state)?;
    let mut session = ScanSession::default();

    for event in events {
        if session.absorb(event) {
            if let Some(verdict) = session.scan.verdict() {
                writeln!(
                    out,
                    "{} {}",
                    Local::now().format("%H:%M:%S"),
                    banner_line(verdict)
                )?;
            }
        }
    }
    out.flush()?;
    Ok(())
}
