pub mod desktop;

use std::future::Future;

use anyhow::Result;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::{data::ImageRef, error::ReadError};

/// Result of a permission prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    Denied,
}

/// How the camera or picker should hand the image back
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaptureOptions {
    /// Let the user crop to `aspect_ratio` before returning
    pub editable: bool,
    /// Width to height, e.g. `(4, 3)`
    pub aspect_ratio: (u32, u32),
    /// Compression quality, `1.0` keeps maximum quality
    pub quality: f32,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            editable: true,
            aspect_ratio: (4, 3),
            quality: 1.0,
        }
    }
}

/// Camera / media library permission prompt
pub trait PermissionService {
    fn request_access(&self) -> impl Future<Output = Access>;
}

/// Native camera. `Ok(None)` means the user dismissed it.
pub trait CameraService {
    fn capture(&self, options: &CaptureOptions) -> impl Future<Output = Result<Option<ImageRef>>>;
}

/// Native photo library picker. `Ok(None)` means the user dismissed it.
pub trait LibraryPicker {
    fn pick(&self, options: &CaptureOptions) -> impl Future<Output = Result<Option<ImageRef>>>;
}

/// Reads the bytes behind an image reference
pub trait ImageReader {
    fn read_as_base64(&self, image: &ImageRef) -> impl Future<Output = Result<String, ReadError>>;
}

/// Everything the screen needs from the device
pub trait MediaDevice: PermissionService + CameraService + LibraryPicker + ImageReader {}

impl<T: PermissionService + CameraService + LibraryPicker + ImageReader> MediaDevice for T {}

/// Filesystem backed reader. Inline references are returned without touching disk.
#[derive(Debug, Clone, Default)]
pub struct FsImageReader;

impl ImageReader for FsImageReader {
    async fn read_as_base64(&self, image: &ImageRef) -> Result<String, ReadError> {
        match image {
            ImageRef::DataUrl(url) => Ok(url.payload().to_string()),
            ImageRef::File(path) => {
                let bytes = tokio::fs::read(path).await.map_err(|source| ReadError::Io {
                    path: path.clone(),
                    source,
                })?;
                Ok(STANDARD.encode(bytes))
            }
        }
    }
}
