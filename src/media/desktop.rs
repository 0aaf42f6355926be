use std::{io::IsTerminal, path::PathBuf};

use anyhow::{Context, Result};
use image::{codecs::jpeg::JpegEncoder, DynamicImage};
use tokio::io::AsyncReadExt;

use crate::{
    data::{DataUrl, ImageRef},
    error::ReadError,
    utils,
};

use super::{
    Access, CameraService, CaptureOptions, FsImageReader, ImageReader, LibraryPicker,
    PermissionService,
};

/// Where the desktop device gets its image from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Library pick of a single file
    File(PathBuf),
    /// Camera frame piped in on stdin
    Stdin,
}

/// Media collaborators for a desktop session.
///
/// There is no real camera or library browser: the "library" is the file the
/// user named and the "camera" is whatever encoded frame arrives on stdin.
#[derive(Debug, Clone)]
pub struct DesktopDevice {
    source: Source,
    reader: FsImageReader,
}

impl DesktopDevice {
    pub fn new(source: Source) -> Self {
        Self {
            source,
            reader: FsImageReader,
        }
    }

}

impl PermissionService for DesktopDevice {
    async fn request_access(&self) -> Access {
        let granted = match &self.source {
            Source::File(path) => tokio::fs::metadata(path)
                .await
                .map(|meta| meta.is_file())
                .unwrap_or(false),
            // nothing is piped in
            Source::Stdin => !std::io::stdin().is_terminal(),
        };
        log::debug!("access to {:?}: {}", self.source, granted);
        if granted {
            Access::Granted
        } else {
            Access::Denied
        }
    }
}

impl CameraService for DesktopDevice {
    async fn capture(&self, options: &CaptureOptions) -> Result<Option<ImageRef>> {
        if self.source != Source::Stdin {
            log::warn!("no camera frame available, capture dismissed");
            return Ok(None);
        }
        let mut bytes = Vec::new();
        tokio::io::stdin()
            .read_to_end(&mut bytes)
            .await
            .context("Failed to read camera frame from stdin")?;
        frame_to_image(bytes, options).await
    }
}

/// Turn a captured frame into the photo, editing it only when asked to
async fn frame_to_image(
    bytes: Vec<u8>,
    options: &CaptureOptions,
) -> Result<Option<ImageRef>> {
    if bytes.is_empty() {
        return Ok(None);
    }
    if !options.editable {
        let format = image::guess_format(&bytes).context("Unrecognized camera frame")?;
        return Ok(Some(ImageRef::DataUrl(DataUrl::from_bytes(
            format.to_mime_type(),
            bytes,
        ))));
    }
    let options = *options;
    let image = tokio::task::spawn_blocking(move || edit(&bytes, &options)).await??;
    Ok(Some(image))
}

impl LibraryPicker for DesktopDevice {
    async fn pick(&self, options: &CaptureOptions) -> Result<Option<ImageRef>> {
        let Source::File(path) = &self.source else {
            log::warn!("no library file configured, picker dismissed");
            return Ok(None);
        };
        if !options.editable {
            return Ok(Some(ImageRef::File(path.clone())));
        }
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let options = *options;
        let image = tokio::task::spawn_blocking(move || edit(&bytes, &options)).await??;
        Ok(Some(image))
    }
}

impl ImageReader for DesktopDevice {
    async fn read_as_base64(&self, image: &ImageRef) -> Result<String, ReadError> {
        self.reader.read_as_base64(image).await
    }
}

/// Crop to the aspect ratio and re-encode as JPEG at the requested quality
fn edit(bytes: &[u8], options: &CaptureOptions) -> Result<ImageRef> {
    let img = image::load_from_memory(bytes).context("Failed to decode picked image")?;
    let (x, y, width, height) = crop_rect(img.width(), img.height(), options.aspect_ratio);
    let cropped = img.crop_imm(x, y, width, height);

    let mut encoded = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut encoded, utils::jpeg_quality(options.quality));
    DynamicImage::ImageRgb8(cropped.to_rgb8())
        .write_with_encoder(encoder)
        .context("Failed to encode edited image")?;

    Ok(ImageRef::DataUrl(DataUrl::from_bytes("image/jpeg", encoded)))
}

/// Largest centered rectangle with the given aspect ratio, as `(x, y, w, h)`
pub(crate) fn crop_rect(width: u32, height: u32, aspect: (u32, u32)) -> (u32, u32, u32, u32) {
    let (aw, ah) = (u64::from(aspect.0), u64::from(aspect.1));
    if aw == 0 || ah == 0 || width == 0 || height == 0 {
        return (0, 0, width, height);
    }
    let (w, h) = (u64::from(width), u64::from(height));
    if w * ah > h * aw {
        let new_w = (h * aw / ah).max(1);
        (((w - new_w) / 2) as u32, 0, new_w as u32, height)
    } else {
        let new_h = (w * ah / aw).max(1);
        (0, ((h - new_h) / 2) as u32, width, new_h as u32)
    }
}
