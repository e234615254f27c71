//! Image metadata probing without a full decode.

use std::path::Path;

use lightweight_mmap::handles::ReadOnlyFileHandle;
use lightweight_mmap::mmap::ReadOnlyMmap;
use tracing::trace;

use crate::codecs::WebpBackend;
use crate::format::{self, HEADER_LEN};
use crate::scale::Size;
use crate::WebpError;

#[cfg(feature = "libwebp")]
use crate::codecs::LibWebp;

/// Header-level facts about a WebP image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WebpInfo {
    pub width: u32,
    pub height: u32,
    pub has_alpha: bool,
    pub has_animation: bool,
}

impl WebpInfo {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Probe `data` with an explicit backend.
///
/// Sniffs the container first; a non-WebP buffer is [`WebpError::InvalidHeader`].
pub fn webp_info_with<B: WebpBackend>(backend: &B, data: &[u8]) -> Result<WebpInfo, WebpError> {
    if !format::is_webp(data) {
        return Err(WebpError::InvalidHeader);
    }
    let f = backend.features(data)?;
    Ok(WebpInfo {
        width: f.width,
        height: f.height,
        has_alpha: f.has_alpha,
        has_animation: f.has_animation,
    })
}

/// Probe `data` with libwebp.
#[cfg(feature = "libwebp")]
pub fn webp_info(data: &[u8]) -> Result<WebpInfo, WebpError> {
    webp_info_with(&LibWebp, data)
}

/// Image dimensions, or `None` if `data` is not a readable WebP.
#[cfg(feature = "libwebp")]
pub fn webp_size(data: &[u8]) -> Option<Size> {
    webp_info(data).ok().map(|info| info.size())
}

/// Image dimensions of the file at `path`, or `None` if it is unreadable or
/// not WebP.
#[cfg(feature = "libwebp")]
pub fn webp_size_at(path: impl AsRef<Path>) -> Option<Size> {
    webp_size_at_with(&LibWebp, path.as_ref())
}

/// [`webp_size_at`] with an explicit backend.
pub fn webp_size_at_with<B: WebpBackend>(backend: &B, path: &Path) -> Option<Size> {
    trace!(path = %path.display(), "probing file size");
    let handle = ReadOnlyFileHandle::open(path).ok()?;
    let size = handle.size().ok()? as usize;
    if size < HEADER_LEN {
        return None;
    }
    let mapping = ReadOnlyMmap::new(&handle, 0, size).ok()?;
    webp_info_with(backend, mapping.as_slice())
        .ok()
        .map(|info| info.size())
}
