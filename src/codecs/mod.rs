//! Codec backends.
//!
//! [`WebpBackend`] is the boundary between the adapter and the codec
//! library. The adapter owns sniffing, classification, normalization, scale
//! planning and error mapping; a backend only runs the primitives and
//! reports raw status codes.

#[cfg(feature = "libwebp")]
pub mod libwebp;

use alloc::vec::Vec;

use crate::WebpError;
use crate::config::{DecoderConfig, EncoderConfig};
use crate::pixel::{PixelFormat, RawImageBuffer};
use crate::scale::Size;
use crate::status::{DecodeStatus, EncodeStatus};

#[cfg(feature = "libwebp")]
pub use libwebp::LibWebp;

/// Bitstream features read from the headers, without decoding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Features {
    pub width: u32,
    pub height: u32,
    pub has_alpha: bool,
    pub has_animation: bool,
}

impl Features {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Pixels produced by a backend decode: premultiplied RGBA8, alpha last.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedPixels {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub bytes_per_row: usize,
}

/// The codec primitives the adapter drives.
///
/// `Config` and `Picture` are codec-native resources; dropping them must
/// release whatever the codec allocated for them.
pub trait WebpBackend {
    type Config;
    type Picture;

    /// Probe width, height, alpha and animation flags.
    fn features(&self, data: &[u8]) -> Result<Features, DecodeStatus>;

    /// Decode into premultiplied RGBA, scaled to `config.scaled_size` if set.
    ///
    /// Codec status codes surface through `From<DecodeStatus>`; failing to
    /// set up the decoder itself is `InitConfigFailed`.
    fn decode(
        &self,
        data: &[u8],
        features: &Features,
        config: &DecoderConfig,
    ) -> Result<DecodedPixels, WebpError>;

    /// Build and validate a codec-native encoder config.
    fn configure(&self, config: &EncoderConfig) -> Result<Self::Config, WebpError>;

    /// Create a picture descriptor of the given size.
    fn new_picture(&self, width: u32, height: u32) -> Result<Self::Picture, WebpError>;

    /// Import pixels through the primitive keyed by `layout`.
    ///
    /// Returns `false` if the layout has no primitive or the codec rejected
    /// the data.
    fn import(
        &self,
        picture: &mut Self::Picture,
        layout: PixelFormat,
        pixels: &RawImageBuffer<'_>,
    ) -> bool;

    /// Encode the picture into a growable memory sink.
    fn encode(
        &self,
        config: &Self::Config,
        picture: &mut Self::Picture,
    ) -> Result<Vec<u8>, EncodeStatus>;
}

impl<B: WebpBackend + ?Sized> WebpBackend for &B {
    type Config = B::Config;
    type Picture = B::Picture;

    fn features(&self, data: &[u8]) -> Result<Features, DecodeStatus> {
        (**self).features(data)
    }

    fn decode(
        &self,
        data: &[u8],
        features: &Features,
        config: &DecoderConfig,
    ) -> Result<DecodedPixels, WebpError> {
        (**self).decode(data, features, config)
    }

    fn configure(&self, config: &EncoderConfig) -> Result<Self::Config, WebpError> {
        (**self).configure(config)
    }

    fn new_picture(&self, width: u32, height: u32) -> Result<Self::Picture, WebpError> {
        (**self).new_picture(width, height)
    }

    fn import(
        &self,
        picture: &mut Self::Picture,
        layout: PixelFormat,
        pixels: &RawImageBuffer<'_>,
    ) -> bool {
        (**self).import(picture, layout, pixels)
    }

    fn encode(
        &self,
        config: &Self::Config,
        picture: &mut Self::Picture,
    ) -> Result<Vec<u8>, EncodeStatus> {
        (**self).encode(config, picture)
    }
}

/// Layouts with a direct import primitive.
pub const IMPORTABLE: [PixelFormat; 6] = [
    PixelFormat::Rgb,
    PixelFormat::Bgr,
    PixelFormat::Rgba,
    PixelFormat::Bgra,
    PixelFormat::Rgbx,
    PixelFormat::Bgrx,
];

/// The direct-import layout for `pixels`, if one exists.
///
/// Requires 8 bits per component and a pixel size matching the layout
/// exactly (24 bits for RGB/BGR, 32 for the four-slot layouts).
pub fn import_layout(pixels: &RawImageBuffer<'_>) -> Option<PixelFormat> {
    let layout = pixels.pixel_format()?;
    if !IMPORTABLE.contains(&layout) || pixels.format.bits_per_component != 8 {
        return None;
    }
    let expected_bits = layout.bytes_per_pixel() * 8;
    (usize::from(pixels.format.bits_per_pixel) == expected_bits).then_some(layout)
}
