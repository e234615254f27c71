//! Normalization into the canonical layout.
//!
//! Bitmaps the codec cannot import directly are re-rendered into a fresh
//! 8-bit, big-endian, alpha-last buffer: premultiplied RGBA when the source
//! carries alpha, RGBX otherwise. The source is only ever borrowed.

mod surface;

pub use surface::{
    CANONICAL_BPP, DrawSurface, RenderError, Renderer, SoftwareRenderer, SoftwareSurface,
    SurfaceSpec,
};

use alloc::vec::Vec;

use tracing::{debug, warn};

use crate::WebpError;
use crate::pixel::{BufferFormat, PixelFormat, RawImageBuffer};

/// Pixels owned by a normalization call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NormalizedPixels {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Premultiplied RGBA if set, RGBX otherwise.
    pub has_alpha: bool,
}

impl NormalizedPixels {
    pub fn bytes_per_row(&self) -> usize {
        self.width as usize * CANONICAL_BPP
    }

    pub fn format(&self) -> BufferFormat {
        if self.has_alpha {
            BufferFormat::rgba8_premultiplied()
        } else {
            BufferFormat::rgbx8()
        }
    }

    pub fn pixel_format(&self) -> PixelFormat {
        if self.has_alpha {
            PixelFormat::Rgba
        } else {
            PixelFormat::Rgbx
        }
    }

    /// Borrow these pixels as an image buffer.
    pub fn as_buffer(&self) -> RawImageBuffer<'_> {
        RawImageBuffer::new(
            &self.data,
            self.width,
            self.height,
            self.bytes_per_row(),
            self.format(),
        )
    }
}

/// Normalize with the built-in [`SoftwareRenderer`].
pub fn normalize(source: &RawImageBuffer<'_>) -> Result<NormalizedPixels, WebpError> {
    normalize_with(&SoftwareRenderer, source)
}

/// Normalize through a host renderer.
///
/// Any surface failure is reported as [`WebpError::InvalidPictureData`]. The
/// surface is dropped, and its memory released, on every path.
pub fn normalize_with<R: Renderer>(
    renderer: &R,
    source: &RawImageBuffer<'_>,
) -> Result<NormalizedPixels, WebpError> {
    let has_alpha = source.format.alpha.has_alpha();
    let spec = SurfaceSpec {
        width: source.width,
        height: source.height,
        has_alpha,
    };
    debug!(
        width = spec.width,
        height = spec.height,
        has_alpha,
        format = ?source.format,
        "normalizing bitmap"
    );

    let rendered = renderer.create_surface(spec).and_then(|mut surface| {
        surface.draw(source)?;
        Ok(surface.into_pixels())
    });

    match rendered {
        Ok(data) if data.len() == spec.bytes_per_row() * spec.height as usize => {
            Ok(NormalizedPixels {
                data,
                width: spec.width,
                height: spec.height,
                has_alpha,
            })
        }
        Ok(data) => {
            warn!(len = data.len(), "surface returned a buffer of the wrong size");
            Err(WebpError::InvalidPictureData)
        }
        Err(e) => {
            warn!(error = %e, "normalization failed");
            Err(WebpError::InvalidPictureData)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::{AlphaConvention, ByteOrder};
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn digest(bytes: &[u8]) -> u64 {
        let mut h = DefaultHasher::new();
        bytes.hash(&mut h);
        h.finish()
    }

    #[test]
    fn source_is_unchanged() {
        let data: Vec<u8> = (0..=255u8).cycle().take(8 * 8 * 4).collect();
        let before = digest(&data);
        let src = RawImageBuffer::packed(&data, 8, 8, BufferFormat::rgba8());
        let out = normalize(&src).unwrap();
        assert_eq!(digest(&data), before);
        assert!(out.has_alpha);
        assert_eq!(out.data.len(), 8 * 8 * 4);
    }

    #[test]
    fn opaque_sources_become_rgbx() {
        let data = [7u8, 8, 9];
        let src = RawImageBuffer::packed(&data, 1, 1, BufferFormat::rgb8());
        let out = normalize(&src).unwrap();
        assert!(!out.has_alpha);
        assert_eq!(out.pixel_format(), PixelFormat::Rgbx);
        assert_eq!(out.data, [7, 8, 9, 255]);
        assert_eq!(out.as_buffer().pixel_format(), Some(PixelFormat::Rgbx));
    }

    #[test]
    fn gray_alpha_replicates() {
        let data = [200u8, 255];
        let format = BufferFormat::packed(8, 1, AlphaConvention::StraightLast, ByteOrder::Big);
        let src = RawImageBuffer::packed(&data, 1, 1, format);
        let out = normalize(&src).unwrap();
        assert_eq!(out.data, [200, 200, 200, 255]);
        assert_eq!(out.pixel_format(), PixelFormat::Rgba);
    }

    #[test]
    fn failures_map_to_invalid_picture_data() {
        let data = [0u8; 2];
        let src = RawImageBuffer::packed(&data, 0, 0, BufferFormat::rgb8());
        assert!(matches!(normalize(&src), Err(WebpError::InvalidPictureData)));

        let format = BufferFormat::packed(8, 2, AlphaConvention::None, ByteOrder::Big);
        let src = RawImageBuffer::packed(&data, 1, 1, format);
        assert!(matches!(normalize(&src), Err(WebpError::InvalidPictureData)));
    }

    struct FailingRenderer;

    impl Renderer for FailingRenderer {
        type Surface = SoftwareSurface;

        fn create_surface(&self, _: SurfaceSpec) -> Result<SoftwareSurface, RenderError> {
            Err(RenderError::Allocation(0))
        }
    }

    #[test]
    fn host_renderer_failure() {
        let data = [0u8; 3];
        let src = RawImageBuffer::packed(&data, 1, 1, BufferFormat::rgb8());
        assert!(matches!(
            normalize_with(&FailingRenderer, &src),
            Err(WebpError::InvalidPictureData)
        ));
    }
}
