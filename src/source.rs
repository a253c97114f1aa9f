use std::collections::HashMap;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread;
use std::time::{Duration, SystemTime};

use crate::config::{ConfigData, SourceKind};
use crate::decode::{decode_frame, load_frame, primary_payload, Frame};
use crate::error::SourceError;
use crate::SharedStateFlag;

const FRAME_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "gif"];

// Something a source reports back to the scanner
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum SourceEvent {
    Frame(Frame),    // Latest captured image, for the live feed
    Payload(String), // Decoded QR text, never empty
}

/// A producer of capture events. `subscribe` blocks, calling `on_event` for
/// every frame/payload, until the stream ends or `run` is cleared.
pub trait PayloadSource: Send {
    fn name(&self) -> &'static str;

    fn subscribe(
        &mut self,
        run: &SharedStateFlag,
        on_event: &mut dyn FnMut(SourceEvent),
    ) -> Result<(), SourceError>;
}

/// Reads the run flag. A poisoned lock counts as "stop".
pub fn is_running(run: &SharedStateFlag) -> bool {
    let &(ref lock, _) = &**run;
    match lock.lock() {
        Ok(guard) => *guard,
        Err(_) => {
            log::error!("Run state mutex poisoned!");
            false
        }
    }
}

/// Sleeps for up to `timeout`, waking early when the flag is cleared.
/// Returns whether the source should keep running.
pub fn pause(run: &SharedStateFlag, timeout: Duration) -> bool {
    let &(ref lock, ref cvar) = &**run;
    let guard = match lock.lock() {
        Ok(guard) => guard,
        Err(_) => return false,
    };
    match cvar.wait_timeout_while(guard, timeout, |running| *running) {
        Ok((guard, _)) => *guard,
        Err(_) => false,
    }
}

/// Builds the source selected in the configuration.
pub fn build_source(config: &ConfigData) -> Result<Box<dyn PayloadSource>, SourceError> {
    let poll = Duration::from_millis(config.poll_interval_ms);
    match config.source {
        SourceKind::Camera => camera_source(config.camera_index, poll),
        SourceKind::Frames => Ok(Box::new(FrameDirSource::new(
            config.resolve_frames_dir(),
            poll,
        ))),
        SourceKind::Stdin => Ok(Box::new(LineSource::stdin(poll))),
        SourceKind::Demo => Ok(Box::new(ScriptedSource::demo(poll * 5))),
    }
}

#[cfg(feature = "camera")]
fn camera_source(index: u32, poll: Duration) -> Result<Box<dyn PayloadSource>, SourceError> {
    Ok(Box::new(camera::CameraSource::new(index, poll)))
}

#[cfg(not(feature = "camera"))]
fn camera_source(_index: u32, _poll: Duration) -> Result<Box<dyn PayloadSource>, SourceError> {
    Err(SourceError::Unavailable("camera"))
}

// --- Frames directory ---

// Size and modification time of a frame file when it was last attempted
type FrameStamp = (u64, Option<SystemTime>);

/// Watches a directory for image files, decoding each new file in file-name
/// order. A file is attempted again only once its size or mtime changes, so a
/// frame still being written is picked up when complete while a broken one
/// isn't retried every poll.
pub struct FrameDirSource {
    dir: PathBuf,
    poll_interval: Duration,
    attempted: HashMap<PathBuf, FrameStamp>,
}

impl FrameDirSource {
    pub fn new(dir: PathBuf, poll_interval: Duration) -> Self {
        Self {
            dir,
            poll_interval,
            attempted: HashMap::new(),
        }
    }

    fn is_frame_file(path: &Path) -> bool {
        path.is_file()
            && path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
    }

    fn stamp(path: &Path) -> Option<FrameStamp> {
        let meta = std::fs::metadata(path).ok()?;
        Some((meta.len(), meta.modified().ok()))
    }

    /// Processes every new or changed frame. Returns how many were attempted.
    pub fn poll_once(&mut self, on_event: &mut dyn FnMut(SourceEvent)) -> Result<usize, SourceError> {
        let mut pending: Vec<(PathBuf, FrameStamp)> = std::fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| Self::is_frame_file(path))
            .filter_map(|path| Self::stamp(&path).map(|stamp| (path, stamp)))
            .filter(|(path, stamp)| self.attempted.get(path) != Some(stamp))
            .collect();
        pending.sort();

        for (path, stamp) in &pending {
            self.attempted.insert(path.clone(), *stamp);
            let frame = match load_frame(path) {
                Ok(frame) => frame,
                Err(e) => {
                    log::warn!("Skipping frame until it changes: {}", e);
                    continue;
                }
            };
            let payload = primary_payload(decode_frame(&frame));
            log::debug!("{}: payload {:?}", path.display(), payload);
            on_event(SourceEvent::Frame(frame));
            if let Some(payload) = payload {
                on_event(SourceEvent::Payload(payload));
            }
        }
        Ok(pending.len())
    }
}

impl PayloadSource for FrameDirSource {
    fn name(&self) -> &'static str {
        "frames"
    }

    fn subscribe(
        &mut self,
        run: &SharedStateFlag,
        on_event: &mut dyn FnMut(SourceEvent),
    ) -> Result<(), SourceError> {
        if !self.dir.is_dir() {
            return Err(SourceError::MissingFramesDir(self.dir.clone()));
        }
        log::info!("Watching {} for frames", self.dir.display());

        while is_running(run) {
            self.poll_once(on_event)?;
            if !pause(run, self.poll_interval) {
                break;
            }
        }
        Ok(())
    }
}

// --- Line oriented input ---

const MIN_LINE_POLL: Duration = Duration::from_millis(10);

static STDIN_FEED: OnceLock<Arc<Mutex<LineFeed>>> = OnceLock::new();

/// Lines waiting to be scanned. `pending` holds a line taken by a source
/// that was stopped before it could report it.
pub struct LineFeed {
    rx: Receiver<String>,
    pending: Option<String>,
}

impl LineFeed {
    pub fn new(rx: Receiver<String>) -> Self {
        Self { rx, pending: None }
    }
}

// One reader thread for the whole process, shared by every stdin source
fn stdin_feed() -> Arc<Mutex<LineFeed>> {
    STDIN_FEED
        .get_or_init(|| {
            let (tx, rx) = mpsc::channel();
            let spawned = thread::Builder::new()
                .name("stdin-reader".to_string())
                .spawn(move || {
                    for line in std::io::stdin().lock().lines() {
                        match line {
                            Ok(line) => {
                                if tx.send(line).is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                log::error!("Error reading stdin: {}", e);
                                break;
                            }
                        }
                    }
                    log::info!("Stdin closed.");
                });
            if let Err(e) = spawned {
                log::error!("Failed to spawn stdin reader thread: {}", e);
            }
            Arc::new(Mutex::new(LineFeed::new(rx)))
        })
        .clone()
}

fn line_payload(line: &str) -> Option<String> {
    let payload = line.trim_end_matches(['\r', '\n']);
    if payload.trim().is_empty() {
        None
    } else {
        Some(payload.to_string())
    }
}

/// One payload per non-blank line. Hardware scanners in keyboard mode
/// produce exactly this. Stopping and restarting loses no lines: every
/// stdin source reads from the same feed.
pub struct LineSource {
    feed: Arc<Mutex<LineFeed>>,
    poll_interval: Duration,
}

impl LineSource {
    pub fn new(feed: Arc<Mutex<LineFeed>>, poll_interval: Duration) -> Self {
        Self {
            feed,
            poll_interval: poll_interval.max(MIN_LINE_POLL),
        }
    }

    pub fn stdin(poll_interval: Duration) -> Self {
        Self::new(stdin_feed(), poll_interval)
    }

    // Next line, or None on timeout. Err(()) once the feed is closed.
    fn next_line(&self) -> Result<Option<String>, ()> {
        let mut feed = match self.feed.lock() {
            Ok(feed) => feed,
            Err(_) => {
                log::error!("Line feed mutex poisoned!");
                return Err(());
            }
        };
        if let Some(line) = feed.pending.take() {
            return Ok(Some(line));
        }
        match feed.rx.recv_timeout(self.poll_interval) {
            Ok(line) => Ok(Some(line)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(()),
        }
    }
}

impl PayloadSource for LineSource {
    fn name(&self) -> &'static str {
        "stdin"
    }

    fn subscribe(
        &mut self,
        run: &SharedStateFlag,
        on_event: &mut dyn FnMut(SourceEvent),
    ) -> Result<(), SourceError> {
        while is_running(run) {
            let line = match self.next_line() {
                Ok(Some(line)) => line,
                Ok(None) => continue,
                Err(()) => {
                    log::info!("Input closed, line source finished.");
                    break;
                }
            };
            if !is_running(run) {
                // Stopped while waiting; leave the line for the next source
                if let Ok(mut feed) = self.feed.lock() {
                    feed.pending = Some(line);
                }
                break;
            }
            if let Some(payload) = line_payload(&line) {
                on_event(SourceEvent::Payload(payload));
            }
        }
        Ok(())
    }
}

// --- Scripted ---

/// Replays a fixed payload list. Used for demos and as the test double.
pub struct ScriptedSource {
    payloads: Vec<String>,
    interval: Duration,
}

impl ScriptedSource {
    pub fn new<I, S>(payloads: I, interval: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            payloads: payloads.into_iter().map(Into::into).collect(),
            interval,
        }
    }

    /// A short tour of every verdict. The repeated link shows the dedup gate.
    pub fn demo(interval: Duration) -> Self {
        Self::new(
            [
                "https://example.com",
                "https://example.com",
                "https://t.me/somechannel",
                "plain-text-value",
                "http://phishing.example/login",
            ],
            interval,
        )
    }
}

impl PayloadSource for ScriptedSource {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn subscribe(
        &mut self,
        run: &SharedStateFlag,
        on_event: &mut dyn FnMut(SourceEvent),
    ) -> Result<(), SourceError> {
        for payload in &self.payloads {
            if !is_running(run) {
                break;
            }
            on_event(SourceEvent::Payload(payload.clone()));
            if !self.interval.is_zero() && !pause(run, self.interval) {
                break;
            }
        }
        Ok(())
    }
}

#[cfg(feature = "camera")]
pub mod camera {
    use std::time::Duration;

    use nokhwa::pixel_format::RgbFormat;
    use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
    use nokhwa::Camera;

    use super::{is_running, pause, PayloadSource, SourceEvent};
    use crate::decode::{decode_frame, primary_payload, Frame};
    use crate::error::SourceError;
    use crate::SharedStateFlag;

    /// Live webcam capture. Every frame is forwarded and decoded.
    pub struct CameraSource {
        index: u32,
        frame_interval: Duration,
    }

    impl CameraSource {
        pub fn new(index: u32, frame_interval: Duration) -> Self {
            Self {
                index,
                frame_interval,
            }
        }
    }

    impl PayloadSource for CameraSource {
        fn name(&self) -> &'static str {
            "camera"
        }

        fn subscribe(
            &mut self,
            run: &SharedStateFlag,
            on_event: &mut dyn FnMut(SourceEvent),
        ) -> Result<(), SourceError> {
            let format =
                RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
            let mut camera = Camera::new(CameraIndex::Index(self.index), format)
                .map_err(|e| SourceError::Camera(e.to_string()))?;
            camera
                .open_stream()
                .map_err(|e| SourceError::Camera(e.to_string()))?;
            log::info!("Camera {} stream opened.", self.index);

            while is_running(run) {
                match camera.frame().and_then(|buffer| buffer.decode_image::<RgbFormat>()) {
                    Ok(image) => {
                        let (width, height) = (image.width() as usize, image.height() as usize);
                        if let Some(frame) = Frame::from_rgb(width, height, &image.into_raw()) {
                            let payload = primary_payload(decode_frame(&frame));
                            on_event(SourceEvent::Frame(frame));
                            if let Some(payload) = payload {
                                on_event(SourceEvent::Payload(payload));
                            }
                        }
                    }
                    Err(e) => log::warn!("Failed to capture frame: {}", e),
                }
                if !pause(run, self.frame_interval) {
                    break;
                }
            }

            if let Err(e) = camera.stop_stream() {
                log::warn!("Error stopping camera stream: {}", e);
            }
            Ok(())
        }
    }
}
