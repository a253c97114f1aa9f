use std::path::Path;

use image::DynamicImage;
use rqrr::PreparedImage;

use crate::error::SourceError;

/// A captured frame as tightly packed RGBA8 pixels.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Frame {
    pub width: usize,
    pub height: usize,
    pub rgba: Vec<u8>,
}

impl Frame {
    /// Wraps raw RGBA bytes. Returns `None` if the buffer size doesn't match.
    pub fn from_rgba(width: usize, height: usize, rgba: Vec<u8>) -> Option<Self> {
        if rgba.len() != width * height * 4 {
            log::warn!(
                "RGBA buffer of {} bytes does not match {}x{} frame",
                rgba.len(),
                width,
                height
            );
            return None;
        }
        Some(Self { width, height, rgba })
    }

    /// Converts raw RGB bytes (as delivered by most camera backends).
    pub fn from_rgb(width: usize, height: usize, rgb: &[u8]) -> Option<Self> {
        if rgb.len() != width * height * 3 {
            log::warn!(
                "RGB buffer of {} bytes does not match {}x{} frame",
                rgb.len(),
                width,
                height
            );
            return None;
        }
        let mut rgba = Vec::with_capacity(width * height * 4);
        for px in rgb.chunks_exact(3) {
            rgba.extend_from_slice(&[px[0], px[1], px[2], 0xFF]);
        }
        Some(Self { width, height, rgba })
    }

    pub fn from_image(image: &DynamicImage) -> Self {
        let rgba = image.to_rgba8();
        Self {
            width: rgba.width() as usize,
            height: rgba.height() as usize,
            rgba: rgba.into_raw(),
        }
    }

    /// Integer BT.601 luma of the pixel at (x, y).
    pub fn luma_at(&self, x: usize, y: usize) -> u8 {
        let i = (y * self.width + x) * 4;
        let (r, g, b) = (
            self.rgba[i] as u32,
            self.rgba[i + 1] as u32,
            self.rgba[i + 2] as u32,
        );
        ((r * 299 + g * 587 + b * 114) / 1000) as u8
    }
}

pub fn load_frame(path: &Path) -> Result<Frame, SourceError> {
    let image = image::open(path).map_err(|source| SourceError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Frame::from_image(&image))
}

/// Finds every QR code in the frame and returns the decoded texts.
/// Codes that fail to decode, or decode to an empty string, are skipped.
pub fn decode_frame(frame: &Frame) -> Vec<String> {
    if frame.width == 0 || frame.height == 0 {
        return vec![];
    }

    let mut prepared =
        PreparedImage::prepare_from_greyscale(frame.width, frame.height, |x, y| {
            frame.luma_at(x, y)
        });

    let mut payloads = Vec::new();
    for grid in prepared.detect_grids() {
        match grid.decode() {
            Ok((_meta, content)) if !content.is_empty() => payloads.push(content),
            Ok(_) => log::debug!("Skipping QR code with empty content."),
            Err(e) => log::debug!("QR grid found but failed to decode: {:?}", e),
        }
    }
    log::trace!(
        "Decoded {} payload(s) from {}x{} frame",
        payloads.len(),
        frame.width,
        frame.height
    );
    payloads
}

/// Picks the one payload a frame reports. With several codes in view the
/// smallest text wins, so detection order jitter between otherwise identical
/// frames can't alternate payloads past the dedup gate.
pub fn primary_payload(payloads: Vec<String>) -> Option<String> {
    payloads.into_iter().min()
}
