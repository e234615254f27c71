//! WebP decoding.
//!
//! A decode walks a fixed sequence of stages (see [`DecodeStage`]). Any stage
//! may fail; the failure is returned as-is and nothing partial escapes.

use std::path::Path;

use lightweight_mmap::handles::ReadOnlyFileHandle;
use lightweight_mmap::mmap::ReadOnlyMmap;
use tracing::{debug, trace, warn};

use crate::bitmap::BitmapFromPixels;
use crate::codecs::WebpBackend;
use crate::config::DecoderConfig;
use crate::format::{self, HEADER_LEN};
use crate::pixel::{AlphaConvention, BufferFormat, ByteOrder};
use crate::scale::{ScalingMode, Size, TargetSize};
use crate::{Limits, WebpError};

#[cfg(feature = "libwebp")]
use crate::{bitmap::OwnedBitmap, codecs::LibWebp};

/// Progress of a decode, reported in logs when a decode fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeStage {
    Init,
    HeaderChecked,
    FeaturesProbed,
    Configured,
    ScalePlanned,
    Decoded,
    Wrapped,
    Done,
}

/// WebP decode request builder.
///
/// # Example
///
/// ```no_run
/// use webpbridge::{DecodeRequest, ScalingMode};
///
/// let data: &[u8] = &[]; // your WebP bytes
/// let bitmap = DecodeRequest::new(data)
///     .with_width(64.0)
///     .with_scaling(ScalingMode::AspectFit)
///     .decode()?;
/// # Ok::<(), webpbridge::WebpError>(())
/// ```
#[derive(Clone, Copy, Debug)]
pub struct DecodeRequest<'a> {
    data: &'a [u8],
    target: TargetSize,
    mode: ScalingMode,
    display_scale: f64,
    threads: bool,
    limits: Option<&'a Limits>,
}

impl Default for DecodeRequest<'_> {
    fn default() -> Self {
        Self::new(&[])
    }
}

impl<'a> DecodeRequest<'a> {
    /// Decode `data` at its original size, with codec threads enabled.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            target: TargetSize::default(),
            mode: ScalingMode::default(),
            display_scale: 1.0,
            threads: true,
            limits: None,
        }
    }

    /// Request an output width in points (see [`with_display_scale`](Self::with_display_scale)).
    pub fn with_width(mut self, width: f64) -> Self {
        self.target.width = Some(width);
        self
    }

    /// Request an output height in points.
    pub fn with_height(mut self, height: f64) -> Self {
        self.target.height = Some(height);
        self
    }

    pub fn with_size(self, width: f64, height: f64) -> Self {
        self.with_width(width).with_height(height)
    }

    /// How the requested box constrains the output. Defaults to
    /// [`ScalingMode::AspectFit`].
    pub fn with_scaling(mut self, mode: ScalingMode) -> Self {
        self.mode = mode;
        self
    }

    /// Pixels per point; requested dimensions are multiplied by it.
    pub fn with_display_scale(mut self, scale: f64) -> Self {
        self.display_scale = scale;
        self
    }

    pub fn with_threads(mut self, threads: bool) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_limits(mut self, limits: &'a Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// Same options over different bytes.
    pub fn with_data<'b>(self, data: &'b [u8]) -> DecodeRequest<'b>
    where
        'a: 'b,
    {
        DecodeRequest {
            data,
            target: self.target,
            mode: self.mode,
            display_scale: self.display_scale,
            threads: self.threads,
            limits: self.limits,
        }
    }

    /// Decode with libwebp into an [`OwnedBitmap`].
    #[cfg(feature = "libwebp")]
    pub fn decode(&self) -> Result<OwnedBitmap, WebpError> {
        self.decode_with(&LibWebp)
    }

    /// Decode with libwebp into a host bitmap type.
    #[cfg(feature = "libwebp")]
    pub fn decode_into<T: BitmapFromPixels>(&self) -> Result<T, WebpError> {
        self.decode_with(&LibWebp)
    }

    /// Decode with an explicit backend.
    pub fn decode_with<B, T>(&self, backend: &B) -> Result<T, WebpError>
    where
        B: WebpBackend,
        T: BitmapFromPixels,
    {
        let mut stage = DecodeStage::Init;
        let result = self.run(backend, &mut stage);
        match &result {
            Ok(_) => trace!(?stage, "decode finished"),
            Err(e) => debug!(?stage, error = %e, "decode failed"),
        }
        result
    }

    /// Map the file at `path` read-only and decode it with these options.
    pub fn decode_file_with<B, T>(&self, backend: &B, path: &Path) -> Result<T, WebpError>
    where
        B: WebpBackend,
        T: BitmapFromPixels,
    {
        trace!(path = %path.display(), "mapping file");
        let handle = ReadOnlyFileHandle::open(path)?;
        let size = handle.size()? as usize;
        if let Some(limits) = self.limits {
            limits.check_input(size)?;
        }
        // Empty mappings are an error on some platforms; short files are
        // never WebP anyway.
        if size < HEADER_LEN {
            return Err(WebpError::InvalidHeader);
        }
        let mapping = ReadOnlyMmap::new(&handle, 0, size)?;
        self.with_data(mapping.as_slice()).decode_with(backend)
    }

    fn validate(&self) -> Result<(), WebpError> {
        self.target.validate()?;
        if !self.display_scale.is_finite() || self.display_scale <= 0.0 {
            return Err(WebpError::InvalidRequest(alloc::format!(
                "display scale {} must be finite and positive",
                self.display_scale
            )));
        }
        Ok(())
    }

    fn run<B, T>(&self, backend: &B, stage: &mut DecodeStage) -> Result<T, WebpError>
    where
        B: WebpBackend,
        T: BitmapFromPixels,
    {
        trace!(len = self.data.len(), target = ?self.target, mode = ?self.mode, "decode");
        self.validate()?;
        let limits = self.limits;
        if let Some(limits) = limits {
            limits.check_input(self.data.len())?;
        }

        if !format::is_webp(self.data) {
            return Err(WebpError::InvalidHeader);
        }
        *stage = DecodeStage::HeaderChecked;

        let features = backend.features(self.data)?;
        debug!(
            width = features.width,
            height = features.height,
            has_alpha = features.has_alpha,
            has_animation = features.has_animation,
            "read bitstream features"
        );
        if let Some(limits) = limits {
            limits.check_dimensions(features.width, features.height)?;
        }
        *stage = DecodeStage::FeaturesProbed;

        let mut config = DecoderConfig::default().with_threads(self.threads);
        *stage = DecodeStage::Configured;

        let original = features.size();
        if self.target.is_requested() {
            let planned = self
                .target
                .scaled(self.display_scale)
                .plan(original, self.mode);
            debug!(?original, ?planned, mode = ?self.mode, "planned scaled decode");
            config = config.with_scaled_size(planned);
            *stage = DecodeStage::ScalePlanned;
        }

        let Size { width, height } = config.output_size(original);
        if width == 0 || height == 0 {
            return Err(WebpError::ZeroAreaOutput { width, height });
        }
        if let Some(limits) = limits {
            limits.check_output(width, height)?;
        }

        let decoded = backend.decode(self.data, &features, &config)?;
        *stage = DecodeStage::Decoded;

        // The tag follows the bitstream features, not what the caller expects.
        let alpha = if features.has_alpha {
            AlphaConvention::PremultipliedLast
        } else {
            AlphaConvention::SkipLast
        };
        let format = BufferFormat::packed(8, 3, alpha, ByteOrder::Big);
        let bitmap = T::from_pixels(
            decoded.data,
            decoded.width,
            decoded.height,
            decoded.bytes_per_row,
            format,
        )
        .map_err(|e| {
            warn!(error = %e, "decoded pixels could not be wrapped");
            WebpError::ImageRenderFailed
        })?;
        *stage = DecodeStage::Wrapped;

        *stage = DecodeStage::Done;
        Ok(bitmap)
    }
}

/// Decode the WebP file at `path` with libwebp at its original size.
#[cfg(feature = "libwebp")]
pub fn decode_file(path: impl AsRef<Path>) -> Result<OwnedBitmap, WebpError> {
    DecodeRequest::default().decode_file_with(&LibWebp, path.as_ref())
}
