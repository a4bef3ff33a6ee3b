//! Photo acquisition pipeline for the contact forms.
//!
//! # Responsibility
//! - Turn picked image bytes into the JPEG payload the image store keeps.
//! - Order asynchronous photo loads so only the latest pick wins.
//!
//! # Invariants
//! - Stored photos are always JPEG at `JPEG_QUALITY`.
//! - A load issued for an outdated selection never replaces the preview.

mod codec;
mod selection;

pub use codec::{prepare_jpeg, read_photo_file, PhotoError, PhotoResult, JPEG_QUALITY};
pub use selection::{PendingSelection, PhotoSelection, SelectionToken};
