use crate::source::{PayloadSource, SourceEvent};
use crate::{SharedStateFlag, ScanTool};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;

/// Runs `source` on its own thread and returns the receiving end of its
/// event stream. The thread clears `run_state` when the source ends so the
/// UI can tell the worker is gone.
pub fn spawn_source_thread(
    mut source: Box<dyn PayloadSource>,
    run_state: SharedStateFlag,
) -> std::io::Result<Receiver<SourceEvent>> {
    let (tx, rx) = mpsc::channel();
    let name = source.name();

    thread::Builder::new()
        .name(format!("scan-worker-{}", name))
        .spawn(move || {
            log::info!("Scan worker for {} source starting.", name);
            let mut disconnected = false;
            let result = source.subscribe(&run_state, &mut |event| {
                if disconnected {
                    return;
                }
                if tx.send(event).is_err() {
                    log::warn!("UI side of the event channel is gone; stopping worker.");
                    disconnected = true;
                    set_running(&run_state, false);
                }
            });

            match result {
                Ok(()) => log::info!("{} source finished.", name),
                Err(e) => log::error!("{} source failed: {}", name, e),
            }
            set_running(&run_state, false);
            log::info!("Scan worker exiting.");
        })?;

    Ok(rx)
}

/// Sets the run flag and wakes anything waiting on it.
pub fn set_running(run_state: &SharedStateFlag, running: bool) {
    let &(ref lock, ref cvar) = &**run_state;
    match lock.lock() {
        Ok(mut guard) => *guard = running,
        Err(_) => log::error!("Thread state mutex poisoned!"),
    }
    cvar.notify_all();
}

impl ScanTool {
    pub(crate) fn spawn_worker(&mut self) -> bool {
        log::info!("Attempting to spawn scan worker thread...");

        let source = match crate::source::build_source(&self.config.data) {
            Ok(source) => source,
            Err(e) => {
                log::error!("Cannot start {} source: {}", self.config.data.source, e);
                return false;
            }
        };

        // Fresh flag per worker, so a lingering old worker clearing its own
        // flag on exit can't stop this one.
        self.thread_state = Arc::new((Mutex::new(true), Condvar::new()));
        match spawn_source_thread(source, self.thread_state.clone()) {
            Ok(rx) => {
                self.events = Some(rx);
                log::info!("Scan worker thread spawned.");
                true
            }
            Err(e) => {
                log::error!("Failed to spawn scan worker thread: {}", e);
                set_running(&self.thread_state, false);
                false
            }
        }
    }

    pub(crate) fn stop_worker(&mut self) {
        log::info!("Signaling scan worker to stop.");
        set_running(&self.thread_state, false);
        // Dropping the receiver also stops a worker blocked on a send.
        self.events = None;
    }
}
