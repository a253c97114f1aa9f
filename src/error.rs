use std::path::PathBuf;

use thiserror::Error;

/// Failures a payload source can hit while capturing.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to load frame {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("frames directory not found: {}", .0.display())]
    MissingFramesDir(PathBuf),

    #[error("camera error: {0}")]
    Camera(String),

    #[error("{0} source is not available in this build")]
    Unavailable(&'static str),
}
