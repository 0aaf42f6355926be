use std::{fmt, path::PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::{ReadError, ResponseError};

const DATA_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64,";
const IMAGE_PREFIX: &str = "image/";
const OCTET_STREAM: &str = "application/octet-stream";

/// Handle to image bytes shown on the screen. Not necessarily loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    /// Image on the local filesystem
    File(PathBuf),
    /// Image carried inline as a base64 data url
    DataUrl(DataUrl),
}

impl ImageRef {
    /// Turn a recolor response into a displayable reference.
    ///
    /// A declared `image/*` content type is trusted as is. Without one, or
    /// with a generic binary type, the format is sniffed from the bytes.
    pub fn from_response<B: AsRef<[u8]>>(
        content_type: Option<&str>,
        body: B,
    ) -> Result<Self, ResponseError> {
        let body = body.as_ref();
        if body.is_empty() {
            return Err(ResponseError::Empty);
        }
        let declared = content_type
            .and_then(|value| value.split(';').next())
            .map(|mime| mime.trim().to_ascii_lowercase())
            .filter(|mime| !mime.is_empty());
        let mime = match declared.as_deref() {
            Some(mime) if mime.starts_with(IMAGE_PREFIX) => mime.to_string(),
            None | Some(OCTET_STREAM) => image::guess_format(body)?.to_mime_type().to_string(),
            Some(other) => return Err(ResponseError::NotAnImage(other.to_string())),
        };
        Ok(ImageRef::DataUrl(DataUrl::from_bytes(&mime, body)))
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageRef::File(path) => write!(f, "file://{}", path.display()),
            ImageRef::DataUrl(url) => fmt::Display::fmt(url, f),
        }
    }
}

/// `data:<mime>;base64,<payload>`
#[derive(Clone, PartialEq, Eq)]
pub struct DataUrl {
    mime: String,
    payload: String,
}

impl DataUrl {
    pub fn from_bytes<B: AsRef<[u8]>>(mime: &str, bytes: B) -> Self {
        Self {
            mime: mime.to_string(),
            payload: STANDARD.encode(bytes.as_ref()),
        }
    }

    /// Wrap an already encoded payload
    pub fn from_base64(mime: &str, payload: String) -> Self {
        Self {
            mime: mime.to_string(),
            payload,
        }
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ReadError> {
        Ok(STANDARD.decode(&self.payload)?)
    }
}

impl fmt::Display for DataUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}{}", DATA_PREFIX, self.mime, BASE64_MARKER, self.payload)
    }
}

// payloads are large; keep debug output readable
impl fmt::Debug for DataUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataUrl")
            .field("mime", &self.mime)
            .field("payload_len", &self.payload.len())
            .finish()
    }
}
