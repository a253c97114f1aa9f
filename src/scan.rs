use crate::decode::Frame;
use crate::source::SourceEvent;
use crate::verdict::{classify, Verdict};

// Inputs to the scan state machine
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ScanEvent {
    Payload(String), // Decoded QR text delivered by the source
    Reset,           // Screen torn down and recreated
}

/// Last scanned payload plus its verdict. Both are `None` until the first scan.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct ScanState {
    last_scanned: Option<String>,
    verdict: Option<Verdict>,
}

impl ScanState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_scanned(&self) -> Option<&str> {
        self.last_scanned.as_deref()
    }

    pub fn verdict(&self) -> Option<&Verdict> {
        self.verdict.as_ref()
    }

    /// Applies an event in place. Returns `true` when the visible state changed.
    ///
    /// A payload equal to the previous one is ignored, so a code that stays in
    /// frame across many captures only gets classified once.
    pub fn apply(&mut self, event: ScanEvent) -> bool {
        match event {
            ScanEvent::Payload(payload) => {
                if self.last_scanned.as_deref() == Some(payload.as_str()) {
                    log::trace!("Ignoring repeated payload");
                    return false;
                }
                let verdict = classify(&payload);
                log::info!("Scanned payload classified as {}", verdict.kind);
                self.last_scanned = Some(payload);
                self.verdict = Some(verdict);
                true
            }
            ScanEvent::Reset => {
                let changed = self.last_scanned.is_some();
                *self = Self::default();
                changed
            }
        }
    }

    /// Pure form of [`ScanState::apply`].
    pub fn reduce(mut self, event: ScanEvent) -> Self {
        self.apply(event);
        self
    }
}

/// Scan state plus the most recent frame, fed straight from a source.
#[derive(Default, Debug)]
pub struct ScanSession {
    pub scan: ScanState,
    pub latest_frame: Option<Frame>,
    pub frame_dirty: bool, // New frame not yet uploaded to the UI
}

impl ScanSession {
    /// Forgets the verdict and the last frame, as on a fresh scan screen.
    pub fn reset(&mut self) {
        self.scan.apply(ScanEvent::Reset);
        self.latest_frame = None;
        self.frame_dirty = false;
    }

    /// Routes one source event. Returns `true` when the verdict changed.
    pub fn absorb(&mut self, event: SourceEvent) -> bool {
        match event {
            SourceEvent::Frame(frame) => {
                self.latest_frame = Some(frame);
                self.frame_dirty = true;
                false
            }
            SourceEvent::Payload(payload) => self.scan.apply(ScanEvent::Payload(payload)),
        }
    }
}
