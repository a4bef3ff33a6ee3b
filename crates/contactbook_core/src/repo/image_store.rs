//! Contact photo storage on the local filesystem.
//!
//! # Responsibility
//! - Write photo bytes under a name derived from the owning contact id.
//! - Resolve stored paths for rendering, falling back to the placeholder.
//! - Delete photos whose contact is gone or whose photo was replaced.
//!
//! # Invariants
//! - One contact owns at most one file: `<root>/<contact_id>.jpg`.
//! - `delete` never touches files outside the store root.

use crate::model::contact::ContactId;
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::{Path, PathBuf};

const IMAGE_EXTENSION: &str = "jpg";

pub type ImageResult<T> = Result<T, ImageStoreError>;

#[derive(Debug)]
pub enum ImageStoreError {
    Io { path: PathBuf, source: io::Error },
    /// Refused to delete a path not owned by this store.
    OutsideStore(PathBuf),
    NonUtf8Path(PathBuf),
}

impl Display for ImageStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "image io failed for `{}`: {source}", path.display())
            }
            Self::OutsideStore(path) => {
                write!(f, "path `{}` is outside the image store", path.display())
            }
            Self::NonUtf8Path(path) => write!(f, "image path `{}` is not UTF-8", path.display()),
        }
    }
}

impl Error for ImageStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::OutsideStore(_) | Self::NonUtf8Path(_) => None,
        }
    }
}

/// Storage contract for contact photos.
pub trait ImageStore {
    /// Writes `jpeg` for `owner`, overwriting an earlier photo of the same
    /// contact, and returns the stored location.
    fn save(&self, jpeg: &[u8], owner: ContactId) -> ImageResult<String>;
    /// Deletes a stored photo. Deleting a missing file succeeds.
    fn delete(&self, path: &str) -> ImageResult<()>;
    /// Returns the path when it still points at an existing file.
    ///
    /// `None` tells the caller to render the placeholder.
    fn resolve(&self, path: Option<&str>) -> Option<PathBuf> {
        let path = PathBuf::from(path?);
        path.is_file().then_some(path)
    }
}

impl<I: ImageStore + ?Sized> ImageStore for &I {
    fn save(&self, jpeg: &[u8], owner: ContactId) -> ImageResult<String> {
        (**self).save(jpeg, owner)
    }

    fn delete(&self, path: &str) -> ImageResult<()> {
        (**self).delete(path)
    }

    fn resolve(&self, path: Option<&str>) -> Option<PathBuf> {
        (**self).resolve(path)
    }
}

/// Image store rooted at an app-private directory.
#[derive(Debug, Clone)]
pub struct FsImageStore {
    root: PathBuf,
}

impl FsImageStore {
    /// The directory is created lazily on first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location the photo of `owner` is written to.
    pub fn path_for(&self, owner: ContactId) -> PathBuf {
        self.root.join(format!("{owner}.{IMAGE_EXTENSION}"))
    }

    fn owns(&self, path: &Path) -> bool {
        path.parent() == Some(self.root.as_path())
            && path.extension().and_then(|ext| ext.to_str()) == Some(IMAGE_EXTENSION)
    }
}

impl ImageStore for FsImageStore {
    fn save(&self, jpeg: &[u8], owner: ContactId) -> ImageResult<String> {
        std::fs::create_dir_all(&self.root).map_err(|source| ImageStoreError::Io {
            path: self.root.clone(),
            source,
        })?;

        let path = self.path_for(owner);
        std::fs::write(&path, jpeg).map_err(|source| ImageStoreError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(
            "event=image_save module=image_store status=ok contact_id={} bytes={}",
            owner,
            jpeg.len()
        );

        path.to_str()
            .map(str::to_string)
            .ok_or(ImageStoreError::NonUtf8Path(path))
    }

    fn delete(&self, path: &str) -> ImageResult<()> {
        let path = PathBuf::from(path);
        if !self.owns(&path) {
            return Err(ImageStoreError::OutsideStore(path));
        }

        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!("event=image_delete module=image_store status=ok");
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                warn!("event=image_delete module=image_store status=skip error_code=not_found");
                Ok(())
            }
            Err(source) => Err(ImageStoreError::Io { path, source }),
        }
    }
}
