use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 200;
const FRAMES_SUBDIR: &str = "qr_guard";

// Where decoded payloads come from
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
pub enum SourceKind {
    Camera, // Live webcam (needs the `camera` feature)
    Frames, // Image files dropped into a directory
    Stdin,  // One payload per input line
    Demo,   // Built-in scripted payloads
}

impl Default for SourceKind {
    fn default() -> Self {
        if cfg!(feature = "camera") {
            SourceKind::Camera
        } else {
            SourceKind::Frames
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            SourceKind::Camera => write!(f, "Camera"),
            SourceKind::Frames => write!(f, "Frames"),
            SourceKind::Stdin => write!(f, "Stdin"),
            SourceKind::Demo => write!(f, "Demo"),
        }
    }
}

// Configuration data saved to JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigData {
    #[serde(default)]
    pub source: SourceKind,
    #[serde(default)] // None means "use the default frames directory"
    pub frames_dir: Option<PathBuf>,
    #[serde(default)]
    pub camera_index: u32,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

impl Default for ConfigData {
    fn default() -> Self {
        Self {
            source: SourceKind::default(),
            frames_dir: None,
            camera_index: 0,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl ConfigData {
    /// Configured frames directory, or `<pictures>/qr_guard` when unset.
    pub fn resolve_frames_dir(&self) -> PathBuf {
        if let Some(dir) = &self.frames_dir {
            return dir.clone();
        }
        dirs::picture_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(FRAMES_SUBDIR)
    }
}

/// Location of the persisted configuration file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".")) // Fallback to current dir
        .join("qr_guard.json")
}
