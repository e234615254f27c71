//! WebP encoding.

use alloc::vec::Vec;
use core::ops::Deref;

use tracing::{debug, trace, warn};

use crate::bitmap::Bitmap;
use crate::codecs::{WebpBackend, import_layout};
use crate::config::{EncodeMode, EncoderConfig, Preset};
use crate::convert::{Renderer, normalize_with};
use crate::{Limits, WebpError};

#[cfg(feature = "libwebp")]
use crate::{codecs::LibWebp, convert::SoftwareRenderer};

/// Encoded WebP bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WebpData(Vec<u8>);

impl WebpData {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

impl Deref for WebpData {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for WebpData {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<WebpData> for Vec<u8> {
    fn from(data: WebpData) -> Self {
        data.0
    }
}

/// WebP encode request builder.
///
/// # Example
///
/// ```no_run
/// use webpbridge::{EncodeRequest, Preset};
/// use imgref::ImgVec;
/// use rgb::RGBA8;
///
/// let pixels = ImgVec::new(vec![RGBA8::new(0, 0, 0, 255); 100 * 100], 100, 100);
/// let webp = EncodeRequest::lossy(Preset::Photo, 85.0).encode(&pixels)?;
/// # Ok::<(), webpbridge::WebpError>(())
/// ```
#[derive(Clone, Debug)]
pub struct EncodeRequest<'a> {
    config: EncoderConfig,
    limits: Option<&'a Limits>,
}

/// Lossy, default preset, quality 100.
impl Default for EncodeRequest<'_> {
    fn default() -> Self {
        Self::new(EncoderConfig::default())
    }
}

impl<'a> EncodeRequest<'a> {
    pub fn new(config: EncoderConfig) -> Self {
        Self {
            config,
            limits: None,
        }
    }

    /// Lossy encoding with a content preset and quality (0-100).
    pub fn lossy(preset: Preset, quality: f32) -> Self {
        Self::new(EncoderConfig::lossy(preset, quality))
    }

    /// Lossless encoding at an effort level (0-9).
    pub fn lossless(level: u8) -> Self {
        Self::new(EncoderConfig::lossless(level))
    }

    pub fn with_threads(mut self, threads: bool) -> Self {
        self.config.threads = threads;
        self
    }

    /// Speed/quality trade-off, 0 (fast) to 6 (slow).
    pub fn with_method(mut self, method: u8) -> Self {
        self.config.method = Some(method);
        self
    }

    pub fn with_filter_strength(mut self, strength: u8) -> Self {
        self.config.filter_strength = Some(strength);
        self
    }

    /// Keep RGB values under fully transparent pixels.
    pub fn with_exact(mut self, exact: bool) -> Self {
        self.config.exact = exact;
        self
    }

    pub fn with_limits(mut self, limits: &'a Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Encode with libwebp, normalizing in software if needed.
    #[cfg(feature = "libwebp")]
    pub fn encode<B: Bitmap + ?Sized>(&self, bitmap: &B) -> Result<WebpData, WebpError> {
        self.encode_with(&LibWebp, &SoftwareRenderer, bitmap)
    }

    /// Encode with an explicit backend and renderer.
    ///
    /// The bitmap is imported directly when its layout has an import
    /// primitive. Otherwise, or if the codec rejects it, it is normalized
    /// through `renderer` and imported again.
    pub fn encode_with<W, R, B>(
        &self,
        backend: &W,
        renderer: &R,
        bitmap: &B,
    ) -> Result<WebpData, WebpError>
    where
        W: WebpBackend,
        R: Renderer,
        B: Bitmap + ?Sized,
    {
        let source = bitmap.as_raw();
        trace!(
            width = source.width,
            height = source.height,
            format = ?source.format,
            mode = ?self.config.mode,
            "encode"
        );

        self.config.validate()?;
        if source.width == 0 || source.height == 0 {
            return Err(WebpError::BadDimension);
        }
        if let Some(limits) = self.limits {
            limits.check_dimensions(source.width, source.height)?;
        }

        let native = backend.configure(&self.config)?;
        let mut picture = backend.new_picture(source.width, source.height)?;

        let direct = import_layout(&source);
        let imported = direct.is_some_and(|layout| backend.import(&mut picture, layout, &source));
        if imported {
            debug!(layout = ?direct, "imported directly");
        } else {
            warn!(
                layout = ?direct,
                format = ?source.format,
                "direct import unavailable, normalizing"
            );
            let normalized = normalize_with(renderer, &source)?;
            let layout = normalized.pixel_format();
            if !backend.import(&mut picture, layout, &normalized.as_buffer()) {
                return Err(WebpError::InvalidPictureData);
            }
            debug!(?layout, "imported normalized pixels");
        }

        let bytes = backend.encode(&native, &mut picture)?;
        debug!(
            len = bytes.len(),
            lossless = matches!(self.config.mode, EncodeMode::Lossless { .. }),
            "encoded"
        );
        Ok(WebpData(bytes))
    }
}
