//! Pixel layout description and classification.
//!
//! A bitmap's memory layout is described by closed enums rather than bitmask
//! flags, so that [`classify`] is a pure match over a finite domain.

use crate::WebpError;

/// Where the alpha (or padding) slot of a pixel lives, and what it means.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum AlphaConvention {
    /// No alpha slot at all.
    #[default]
    None,
    /// A leading slot that is present in memory but ignored (XRGB).
    SkipFirst,
    /// A trailing slot that is present in memory but ignored (RGBX).
    SkipLast,
    /// Leading alpha, color already multiplied by alpha.
    PremultipliedFirst,
    /// Trailing alpha, color already multiplied by alpha.
    PremultipliedLast,
    /// Leading straight (unassociated) alpha.
    StraightFirst,
    /// Trailing straight (unassociated) alpha.
    StraightLast,
}

impl AlphaConvention {
    /// Whether the alpha slot carries meaningful data.
    pub fn has_alpha(self) -> bool {
        !matches!(self, Self::None | Self::SkipFirst | Self::SkipLast)
    }

    /// Whether an alpha or padding slot precedes the color components.
    pub fn is_first(self) -> bool {
        matches!(
            self,
            Self::PremultipliedFirst | Self::StraightFirst | Self::SkipFirst
        )
    }

    /// Whether an alpha or padding slot follows the color components.
    pub fn is_last(self) -> bool {
        matches!(
            self,
            Self::PremultipliedLast | Self::StraightLast | Self::SkipLast
        )
    }

    /// Whether the pixel reserves a slot for alpha (used or skipped).
    pub fn has_slot(self) -> bool {
        self != Self::None
    }

    /// Whether color components are premultiplied by alpha.
    pub fn is_premultiplied(self) -> bool {
        matches!(self, Self::PremultipliedFirst | Self::PremultipliedLast)
    }
}

/// Byte order of a packed pixel.
///
/// For 8-bit components, `Little` reverses the packed pixel word in memory
/// (little-endian ARGB is stored B, G, R, A). For 16-bit components it is
/// the endianness of each component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ByteOrder {
    #[default]
    Big,
    Little,
}

/// Canonical memory layouts, named in memory order.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Grayscale,
    GrayscaleAlpha,
    Rgb,
    Bgr,
    Argb,
    Abgr,
    Rgba,
    Bgra,
    /// RGB followed by an ignored byte.
    Rgbx,
    /// BGR followed by an ignored byte.
    Bgrx,
}

impl PixelFormat {
    /// Number of slots per pixel, including a skipped alpha slot.
    pub fn channels(self) -> usize {
        match self {
            Self::Grayscale => 1,
            Self::GrayscaleAlpha => 2,
            Self::Rgb | Self::Bgr => 3,
            Self::Argb | Self::Abgr | Self::Rgba | Self::Bgra | Self::Rgbx | Self::Bgrx => 4,
        }
    }

    /// Bytes per pixel at 8 bits per component.
    pub fn bytes_per_pixel(self) -> usize {
        self.channels()
    }

    /// Whether the alpha slot is meaningful.
    ///
    /// `Argb` and `Abgr` may also describe a skipped slot; they report `true`
    /// because the classifier does not distinguish the two for those orders.
    pub fn has_alpha(self) -> bool {
        matches!(
            self,
            Self::GrayscaleAlpha | Self::Argb | Self::Abgr | Self::Rgba | Self::Bgra
        )
    }
}

/// Determine the canonical layout for a combination of color component
/// count, alpha convention and byte order.
///
/// Returns `None` when the layout is unrecognized: any component count other
/// than 1 or 3 is unrecognized.
///
/// Branch order matters: a skipped alpha slot must still resolve to an
/// alpha-slotted layout (`Rgbx`/`Bgrx`), because import primitives are keyed
/// by memory layout rather than by whether alpha is meaningful.
pub fn classify(
    color_components: u8,
    alpha: AlphaConvention,
    byte_order: ByteOrder,
) -> Option<PixelFormat> {
    let has_alpha = alpha.has_alpha();

    if color_components == 1 {
        return Some(if has_alpha {
            PixelFormat::GrayscaleAlpha
        } else {
            PixelFormat::Grayscale
        });
    }
    if color_components != 3 {
        return None;
    }

    let little = byte_order == ByteOrder::Little;
    let alpha_first = alpha.is_first();
    let alpha_last = alpha.is_last();

    if alpha_first && little {
        Some(if has_alpha {
            PixelFormat::Bgra
        } else {
            PixelFormat::Bgrx
        })
    } else if alpha_first {
        Some(PixelFormat::Argb)
    } else if alpha_last && little {
        Some(PixelFormat::Abgr)
    } else if alpha_last {
        Some(if has_alpha {
            PixelFormat::Rgba
        } else {
            PixelFormat::Rgbx
        })
    } else if !has_alpha {
        Some(if little {
            PixelFormat::Bgr
        } else {
            PixelFormat::Rgb
        })
    } else {
        None
    }
}

/// Memory layout of a bitmap's pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferFormat {
    pub bits_per_component: u8,
    pub bits_per_pixel: u8,
    /// Color components, excluding alpha: 1 (gray) or 3 (RGB).
    pub color_components: u8,
    pub alpha: AlphaConvention,
    pub byte_order: ByteOrder,
}

impl BufferFormat {
    /// Build a tightly packed format (no padding bits inside a pixel).
    pub const fn packed(
        bits_per_component: u8,
        color_components: u8,
        alpha: AlphaConvention,
        byte_order: ByteOrder,
    ) -> Self {
        let alpha_slot = if matches!(alpha, AlphaConvention::None) { 0 } else { 1 };
        let slots = color_components.saturating_add(alpha_slot);
        // Saturates for layouts wider than 255 bits, which no reader accepts.
        Self {
            bits_per_component,
            bits_per_pixel: bits_per_component.saturating_mul(slots),
            color_components,
            alpha,
            byte_order,
        }
    }

    /// 8-bit RGB.
    pub const fn rgb8() -> Self {
        Self::packed(8, 3, AlphaConvention::None, ByteOrder::Big)
    }

    /// 8-bit RGBA with straight alpha.
    pub const fn rgba8() -> Self {
        Self::packed(8, 3, AlphaConvention::StraightLast, ByteOrder::Big)
    }

    /// 8-bit RGBA with premultiplied alpha.
    pub const fn rgba8_premultiplied() -> Self {
        Self::packed(8, 3, AlphaConvention::PremultipliedLast, ByteOrder::Big)
    }

    /// 8-bit RGB followed by an ignored byte.
    pub const fn rgbx8() -> Self {
        Self::packed(8, 3, AlphaConvention::SkipLast, ByteOrder::Big)
    }

    /// 8-bit BGRA (little-endian ARGB) with premultiplied alpha, the usual
    /// native layout of desktop compositors.
    pub const fn bgra8_premultiplied() -> Self {
        Self::packed(8, 3, AlphaConvention::PremultipliedFirst, ByteOrder::Little)
    }

    /// 8-bit grayscale.
    pub const fn gray8() -> Self {
        Self::packed(8, 1, AlphaConvention::None, ByteOrder::Big)
    }

    /// Number of slots per pixel, including an alpha or padding slot.
    pub fn slots(&self) -> usize {
        self.color_components as usize + usize::from(self.alpha.has_slot())
    }

    /// Bytes per pixel, rounded up.
    pub fn bytes_per_pixel(&self) -> usize {
        (self.bits_per_pixel as usize).div_ceil(8)
    }

    /// Canonical layout of this format, ignoring bit depth.
    pub fn pixel_format(&self) -> Option<PixelFormat> {
        classify(self.color_components, self.alpha, self.byte_order)
    }
}

/// Borrowed view of a bitmap's pixel memory.
///
/// The view never owns or frees the memory it describes.
#[derive(Clone, Copy, Debug)]
pub struct RawImageBuffer<'a> {
    data: &'a [u8],
    pub width: u32,
    pub height: u32,
    pub bytes_per_row: usize,
    pub format: BufferFormat,
}

impl<'a> RawImageBuffer<'a> {
    /// Describe `data` as a `width`x`height` image with the given stride.
    ///
    /// Nothing is validated here; see [`validate`](Self::validate).
    pub fn new(
        data: &'a [u8],
        width: u32,
        height: u32,
        bytes_per_row: usize,
        format: BufferFormat,
    ) -> Self {
        Self {
            data,
            width,
            height,
            bytes_per_row,
            format,
        }
    }

    /// Describe tightly packed rows (`bytes_per_row = width * bytes_per_pixel`).
    pub fn packed(data: &'a [u8], width: u32, height: u32, format: BufferFormat) -> Self {
        let bytes_per_row = width as usize * format.bytes_per_pixel();
        Self::new(data, width, height, bytes_per_row, format)
    }

    /// The raw pixel bytes, including any row padding.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Canonical layout of these pixels, or `None` if unrecognized.
    pub fn pixel_format(&self) -> Option<PixelFormat> {
        self.format.pixel_format()
    }

    /// Bytes needed to hold every row: the last row need not be padded.
    pub fn required_len(&self) -> Option<usize> {
        let row = (self.width as usize).checked_mul(self.format.bytes_per_pixel())?;
        if self.height == 0 {
            return Some(0);
        }
        self.bytes_per_row
            .checked_mul(self.height as usize - 1)?
            .checked_add(row)
    }

    /// Check dimensions, stride and buffer length for consistency.
    pub fn validate(&self) -> Result<(), WebpError> {
        if self.width == 0 || self.height == 0 {
            return Err(WebpError::BadDimension);
        }
        let bpp = self.format.bytes_per_pixel();
        let min_stride = (self.width as usize)
            .checked_mul(bpp)
            .ok_or(WebpError::BadDimension)?;
        if self.bytes_per_row < min_stride {
            return Err(WebpError::InvalidPictureData);
        }
        let needed = self.required_len().ok_or(WebpError::BadDimension)?;
        if self.data.len() < needed {
            return Err(WebpError::InvalidPictureData);
        }
        Ok(())
    }

    /// Iterate over rows, each trimmed to `width * bytes_per_pixel` bytes.
    ///
    /// Call [`validate`](Self::validate) first; rows past the end of a short
    /// buffer are skipped.
    pub fn rows(&self) -> impl Iterator<Item = &'a [u8]> + 'a {
        let row_len = self.width as usize * self.format.bytes_per_pixel();
        let stride = self.bytes_per_row.max(1);
        let data = self.data;
        (0..self.height as usize).filter_map(move |y| {
            let start = y.checked_mul(stride)?;
            data.get(start..start.checked_add(row_len)?)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    use AlphaConvention as A;
    use ByteOrder as B;
    use PixelFormat as P;

    #[test]
    fn oversized_layouts_saturate_and_are_rejected() {
        let wide = BufferFormat::packed(64, 3, A::StraightLast, B::Big);
        assert_eq!(wide.bits_per_pixel, u8::MAX);
        let wide = BufferFormat::packed(16, u8::MAX, A::SkipFirst, B::Little);
        assert_eq!(wide.bits_per_pixel, u8::MAX);

        let data = [0u8; 64];
        let format = BufferFormat::packed(64, 3, A::StraightLast, B::Big);
        let src = RawImageBuffer::packed(&data, 1, 1, format);
        assert_eq!(src.pixel_format(), Some(P::Rgba));
        assert!(crate::convert::normalize(&src).is_err());
    }

    #[rstest]
    #[case(1, A::None, B::Big, Some(P::Grayscale))]
    #[case(1, A::SkipLast, B::Little, Some(P::Grayscale))]
    #[case(1, A::StraightLast, B::Big, Some(P::GrayscaleAlpha))]
    #[case(1, A::PremultipliedFirst, B::Little, Some(P::GrayscaleAlpha))]
    #[case(3, A::None, B::Big, Some(P::Rgb))]
    #[case(3, A::None, B::Little, Some(P::Bgr))]
    #[case(3, A::PremultipliedFirst, B::Little, Some(P::Bgra))]
    #[case(3, A::StraightFirst, B::Little, Some(P::Bgra))]
    #[case(3, A::SkipFirst, B::Little, Some(P::Bgrx))]
    #[case(3, A::PremultipliedFirst, B::Big, Some(P::Argb))]
    #[case(3, A::SkipFirst, B::Big, Some(P::Argb))]
    #[case(3, A::StraightLast, B::Little, Some(P::Abgr))]
    #[case(3, A::SkipLast, B::Little, Some(P::Abgr))]
    #[case(3, A::PremultipliedLast, B::Big, Some(P::Rgba))]
    #[case(3, A::StraightLast, B::Big, Some(P::Rgba))]
    #[case(3, A::SkipLast, B::Big, Some(P::Rgbx))]
    #[case(0, A::None, B::Big, None)]
    #[case(2, A::StraightLast, B::Big, None)]
    #[case(4, A::None, B::Big, None)]
    fn classify_table(
        #[case] components: u8,
        #[case] alpha: AlphaConvention,
        #[case] order: ByteOrder,
        #[case] expected: Option<PixelFormat>,
    ) {
        assert_eq!(classify(components, alpha, order), expected);
    }

    #[test]
    fn classify_is_total() {
        let alphas = [
            A::None,
            A::SkipFirst,
            A::SkipLast,
            A::PremultipliedFirst,
            A::PremultipliedLast,
            A::StraightFirst,
            A::StraightLast,
        ];
        for components in 0..=u8::MAX {
            for alpha in alphas {
                for order in [B::Big, B::Little] {
                    let format = classify(components, alpha, order);
                    if !matches!(components, 1 | 3) {
                        assert_eq!(format, None);
                    }
                }
            }
        }
    }

    #[test]
    fn opaque_png_layout_is_rgbx() {
        // Decoders commonly hand out opaque images as RGB + skipped byte.
        assert_eq!(BufferFormat::rgbx8().pixel_format(), Some(P::Rgbx));
    }

    #[test]
    fn packed_formats() {
        assert_eq!(BufferFormat::rgb8().bits_per_pixel, 24);
        assert_eq!(BufferFormat::rgba8().bits_per_pixel, 32);
        assert_eq!(BufferFormat::gray8().bits_per_pixel, 8);
        assert_eq!(
            BufferFormat::packed(16, 3, A::StraightLast, B::Little).bytes_per_pixel(),
            8
        );
    }

    #[test]
    fn validate_rejects_short_buffers() {
        let data = [0u8; 11];
        let buf = RawImageBuffer::packed(&data, 2, 2, BufferFormat::rgb8());
        assert!(matches!(buf.validate(), Err(WebpError::InvalidPictureData)));
        let data = [0u8; 12];
        let buf = RawImageBuffer::packed(&data, 2, 2, BufferFormat::rgb8());
        assert!(buf.validate().is_ok());
    }

    #[test]
    fn validate_rejects_small_stride_and_zero_size() {
        let data = [0u8; 64];
        let buf = RawImageBuffer::new(&data, 4, 2, 8, BufferFormat::rgb8());
        assert!(matches!(buf.validate(), Err(WebpError::InvalidPictureData)));
        let buf = RawImageBuffer::new(&data, 0, 2, 8, BufferFormat::rgb8());
        assert!(matches!(buf.validate(), Err(WebpError::BadDimension)));
    }

    #[test]
    fn last_row_needs_no_padding() {
        // stride 8, 2 rows of 2 RGB pixels: 8 + 6 bytes
        let data = [0u8; 14];
        let buf = RawImageBuffer::new(&data, 2, 2, 8, BufferFormat::rgb8());
        assert_eq!(buf.required_len(), Some(14));
        assert!(buf.validate().is_ok());
        let rows: Vec<_> = buf.rows().collect();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.len() == 6));
    }
}
