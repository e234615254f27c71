//! Codec configuration built once per encode or decode call.
//!
//! [`EncoderConfig`] and [`DecoderConfig`] carry everything a backend needs
//! to set up the codec. They are plain values: built at call entry, handed
//! to the backend, and dropped when the call returns.

use alloc::format;

use crate::WebpError;
use crate::scale::Size;

/// Content presets tuning the lossy encoder.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Preset {
    #[default]
    Default,
    /// Digital picture, like portrait or inner shot.
    Picture,
    /// Outdoor photograph, with natural lighting.
    Photo,
    /// Hand or line drawing, with high-contrast details.
    Drawing,
    /// Small-sized colorful images.
    Icon,
    /// Text-like content.
    Text,
}

/// Lossy with a preset and quality, or lossless with an effort level.
///
/// The two are mutually exclusive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EncodeMode {
    Lossy {
        preset: Preset,
        /// 0 (smallest) to 100 (best).
        quality: f32,
    },
    Lossless {
        /// 0 (fastest) to 9 (smallest).
        level: u8,
    },
}

impl Default for EncodeMode {
    fn default() -> Self {
        Self::Lossy {
            preset: Preset::Default,
            quality: 100.0,
        }
    }
}

/// Encoder settings.
#[derive(Clone, Copy, Debug, PartialEq)]
#[non_exhaustive]
pub struct EncoderConfig {
    pub mode: EncodeMode,
    /// Let the codec use worker threads.
    pub threads: bool,
    /// Speed/quality trade-off, 0 (fast) to 6 (slow). `None` keeps the
    /// preset's value.
    pub method: Option<u8>,
    /// Deblocking filter strength, 0 (off) to 100. Lossy only.
    pub filter_strength: Option<u8>,
    /// Preserve RGB values under fully transparent pixels.
    pub exact: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self::new(EncodeMode::default())
    }
}

impl EncoderConfig {
    pub fn new(mode: EncodeMode) -> Self {
        Self {
            mode,
            threads: true,
            method: None,
            filter_strength: None,
            exact: false,
        }
    }

    pub fn lossy(preset: Preset, quality: f32) -> Self {
        Self::new(EncodeMode::Lossy { preset, quality })
    }

    pub fn lossless(level: u8) -> Self {
        Self::new(EncodeMode::Lossless { level })
    }

    pub fn with_threads(mut self, threads: bool) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_method(mut self, method: u8) -> Self {
        self.method = Some(method);
        self
    }

    pub fn with_filter_strength(mut self, strength: u8) -> Self {
        self.filter_strength = Some(strength);
        self
    }

    pub fn with_exact(mut self, exact: bool) -> Self {
        self.exact = exact;
        self
    }

    pub fn is_lossless(&self) -> bool {
        matches!(self.mode, EncodeMode::Lossless { .. })
    }

    /// Range checks done before the codec sees the config.
    pub fn validate(&self) -> Result<(), WebpError> {
        match self.mode {
            EncodeMode::Lossy { quality, .. } if !(0.0..=100.0).contains(&quality) => {
                return Err(invalid(format!("quality {quality} is outside 0..=100")));
            }
            EncodeMode::Lossless { level } if level > 9 => {
                return Err(invalid(format!("lossless level {level} is outside 0..=9")));
            }
            _ => {}
        }
        if let Some(method) = self.method
            && method > 6
        {
            return Err(invalid(format!("method {method} is outside 0..=6")));
        }
        if let Some(strength) = self.filter_strength
            && strength > 100
        {
            return Err(invalid(format!(
                "filter strength {strength} is outside 0..=100"
            )));
        }
        Ok(())
    }
}

fn invalid(reason: alloc::string::String) -> WebpError {
    tracing::debug!(%reason, "rejecting encoder config");
    WebpError::InvalidConfiguration
}

/// Decoder settings.
///
/// Output is always premultiplied RGBA. Filtering is bypassed and fancy
/// upsampling disabled: predictable output pixels are preferred over the
/// last bit of fidelity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct DecoderConfig {
    pub bypass_filtering: bool,
    pub no_fancy_upsampling: bool,
    pub threads: bool,
    /// Scaled output dimensions, if a resize was requested.
    pub scaled_size: Option<Size>,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            bypass_filtering: true,
            no_fancy_upsampling: true,
            threads: true,
            scaled_size: None,
        }
    }
}

impl DecoderConfig {
    pub fn with_threads(mut self, threads: bool) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_scaled_size(mut self, size: Size) -> Self {
        self.scaled_size = Some(size);
        self
    }

    /// Dimensions of the decoded output for an image of `original` size.
    pub fn output_size(&self, original: Size) -> Size {
        self.scaled_size.unwrap_or(original)
    }
}
