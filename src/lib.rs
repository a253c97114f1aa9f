// Export modules for testing
pub mod about;
pub mod app;
pub mod config;
pub mod decode;
pub mod error;
pub mod headless;
pub mod permission;
pub mod scan;
pub mod scan_worker;
pub mod source;
pub mod state;
pub mod ui;
pub mod verdict;

// Re-export main types
pub use crate::config::{ConfigData, SourceKind};
pub use crate::error::SourceError;
pub use crate::scan::{ScanEvent, ScanSession, ScanState};
pub use crate::source::{PayloadSource, SourceEvent};
pub use crate::state::State;
pub use crate::verdict::{classify, Verdict, VerdictKind};

// Constants
pub const PROGRAM_TITLE: &str = "QR Guard - Link Scanner";
pub const INITIAL_WIDTH: f32 = 480.0;
pub const INITIAL_HEIGHT: f32 = 640.0;

// Type alias for the worker run flag
use std::path::PathBuf;
use std::sync::mpsc::Receiver;
pub use std::sync::{Arc, Condvar, Mutex};
pub type SharedStateFlag = Arc<(Mutex<bool>, Condvar)>;

use clap::Parser;
use eframe::egui;
pub use fast_config::Config;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Render without a camera: placeholder feed, no source is started
    #[arg(long, default_value_t = false)]
    pub preview: bool,

    /// Print verdicts to stdout instead of opening a window
    #[arg(long, default_value_t = false, conflicts_with = "preview")]
    pub headless: bool,

    /// Where payloads come from (overrides the saved config)
    #[arg(short, long, value_enum)]
    pub source: Option<SourceKind>,

    /// Directory watched by the frames source
    #[arg(long)]
    pub frames_dir: Option<PathBuf>,

    #[arg(long)]
    pub camera_index: Option<u32>,

    /// Capture poll interval in milliseconds
    #[arg(long)]
    pub poll_ms: Option<u64>,
}

impl Args {
    /// Every run that may open a capture source asks for camera access
    /// first, windowed or headless.
    pub fn requests_camera(&self) -> bool {
        !self.preview
    }

    /// Copies the flags that were given onto the loaded config.
    pub fn apply_to(&self, config: &mut ConfigData) {
        if let Some(source) = self.source {
            config.source = source;
        }
        if let Some(dir) = &self.frames_dir {
            config.frames_dir = Some(dir.clone());
        }
        if let Some(index) = self.camera_index {
            config.camera_index = index;
        }
        if let Some(ms) = self.poll_ms {
            config.poll_interval_ms = ms;
        }
    }
}

// The main application struct
pub struct ScanTool {
    // State
    pub state: State,
    pub thread_state: SharedStateFlag, // Is the worker thread running?
    pub preview: bool,                 // Non-interactive rendering, no camera

    // Scan data, owned by the UI thread
    pub session: ScanSession,
    pub events: Option<Receiver<SourceEvent>>,
    pub frame_texture: Option<egui::TextureHandle>,

    // Configuration
    pub config: Config<ConfigData>,
}

// Implementations for ScanTool
impl ScanTool {
    pub fn new(config: Config<ConfigData>, preview: bool) -> Self {
        Self {
            state: State::Initialising,
            thread_state: Arc::new((Mutex::new(false), Condvar::new())),
            preview,
            session: ScanSession::default(),
            events: None,
            frame_texture: None,
            config,
        }
    }

    // Get the current thread status
    pub fn get_thread_status(&self) -> bool {
        source::is_running(&self.thread_state)
    }

    /// Drains pending source events into the session. Returns `true` if
    /// anything arrived.
    pub fn drain_events(&mut self) -> bool {
        let Some(rx) = &self.events else {
            return false;
        };

        let mut received = false;
        let mut closed = false;
        loop {
            match rx.try_recv() {
                Ok(event) => {
                    received = true;
                    self.session.absorb(event);
                }
                Err(std::sync::mpsc::TryRecvError::Empty) => break,
                Err(std::sync::mpsc::TryRecvError::Disconnected) => {
                    closed = true;
                    break;
                }
            }
        }
        if closed {
            log::info!("Source event channel closed.");
            self.events = None;
        }
        received
    }
}

/// Opens (or creates) the JSON config file.
pub fn open_config() -> Result<Config<ConfigData>, String> {
    let path = config::config_path().to_string_lossy().into_owned();
    Config::new(&path, ConfigData::default())
        .map_err(|e| format!("Error creating config file at {}: {}", path, e))
}
