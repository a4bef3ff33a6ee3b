//! Photo decoding and JPEG re-encoding.
//!
//! # Responsibility
//! - Decode picked image bytes in any supported format.
//! - Re-encode them as the JPEG payload the image store keeps.
//!
//! # Invariants
//! - Output is always RGB JPEG at `JPEG_QUALITY`.
//! - Empty or undecodable input is an error, never a blank image.

use image::codecs::jpeg::JpegEncoder;
use image::ColorType;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::{Path, PathBuf};

/// JPEG quality used for stored contact photos (0.8 of max).
pub const JPEG_QUALITY: u8 = 80;

pub type PhotoResult<T> = Result<T, PhotoError>;

#[derive(Debug)]
pub enum PhotoError {
    /// Picked file could not be read.
    Io { path: PathBuf, source: io::Error },
    /// Bytes are not an image format we can decode.
    Decode(image::ImageError),
    Encode(image::ImageError),
    /// The photo source produced nothing, e.g. the picker was dismissed.
    Empty,
}

impl Display for PhotoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read photo `{}`: {source}", path.display())
            }
            Self::Decode(err) => write!(f, "failed to decode photo: {err}"),
            Self::Encode(err) => write!(f, "failed to encode photo as jpeg: {err}"),
            Self::Empty => write!(f, "photo source returned no data"),
        }
    }
}

impl Error for PhotoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Decode(err) | Self::Encode(err) => Some(err),
            Self::Empty => None,
        }
    }
}

/// Decodes picked image bytes and re-encodes them as JPEG.
///
/// Alpha is dropped; JPEG has no transparency.
pub fn prepare_jpeg(raw: &[u8]) -> PhotoResult<Vec<u8>> {
    if raw.is_empty() {
        return Err(PhotoError::Empty);
    }

    let decoded = image::load_from_memory(raw).map_err(PhotoError::Decode)?;
    let rgb = decoded.to_rgb8();

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY)
        .encode(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)
        .map_err(PhotoError::Encode)?;
    Ok(jpeg)
}

/// Reads a photo picked through the file browser.
pub fn read_photo_file(path: impl AsRef<Path>) -> PhotoResult<Vec<u8>> {
    let path = path.as_ref();
    std::fs::read(path).map_err(|source| PhotoError::Io {
        path: path.to_path_buf(),
        source,
    })
}
