//! Host bitmap capability.
//!
//! The adapter never names a concrete host image type. Anything that can
//! expose its pixel memory implements [`Bitmap`]; anything that can be built
//! from decoded pixels implements [`BitmapFromPixels`].

use alloc::vec::Vec;
use core::fmt;

use imgref::{ImgRef, ImgVec};
use rgb::{ComponentBytes, FromSlice, RGB8, RGBA8};

use crate::pixel::{AlphaConvention, BufferFormat, PixelFormat, RawImageBuffer};

/// Read access to a bitmap's pixel memory.
pub trait Bitmap {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn bytes_per_row(&self) -> usize;
    fn buffer_format(&self) -> BufferFormat;
    fn raw_bytes(&self) -> &[u8];

    /// Borrow the pixels as an image buffer.
    fn as_raw(&self) -> RawImageBuffer<'_> {
        RawImageBuffer::new(
            self.raw_bytes(),
            self.width(),
            self.height(),
            self.bytes_per_row(),
            self.buffer_format(),
        )
    }

    fn pixel_format(&self) -> Option<PixelFormat> {
        self.buffer_format().pixel_format()
    }
}

/// Construction of a host bitmap from a decoded pixel buffer.
///
/// The implementation takes ownership of `pixels` and is responsible for
/// releasing it.
pub trait BitmapFromPixels: Sized {
    type Error: fmt::Display;

    fn from_pixels(
        pixels: Vec<u8>,
        width: u32,
        height: u32,
        bytes_per_row: usize,
        format: BufferFormat,
    ) -> Result<Self, Self::Error>;
}

/// A bitmap owned by this crate: tightly packed 8-bit RGBA or RGBX,
/// big-endian, alpha last.
#[derive(Clone, PartialEq, Eq)]
pub struct OwnedBitmap {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    alpha: AlphaConvention,
}

impl OwnedBitmap {
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// Alpha tag: `PremultipliedLast` for images with alpha, `SkipLast`
    /// otherwise.
    pub fn alpha(&self) -> AlphaConvention {
        self.alpha
    }

    pub fn has_alpha(&self) -> bool {
        self.alpha.has_alpha()
    }

    /// Borrow as a typed image without copying. For opaque images the
    /// alpha component holds whatever the codec wrote into the padding.
    pub fn as_imgref(&self) -> ImgRef<'_, RGBA8> {
        ImgRef::new(
            self.pixels.as_rgba(),
            self.width as usize,
            self.height as usize,
        )
    }

    /// Copy into a typed image. Padding bytes of opaque images read as
    /// alpha 255.
    pub fn to_imgvec(&self) -> ImgVec<RGBA8> {
        let opaque = !self.has_alpha();
        let buf = self
            .pixels
            .chunks_exact(4)
            .map(|p| RGBA8::new(p[0], p[1], p[2], if opaque { 255 } else { p[3] }))
            .collect();
        ImgVec::new(buf, self.width as usize, self.height as usize)
    }
}

impl fmt::Debug for OwnedBitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnedBitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("alpha", &self.alpha)
            .field("len", &self.pixels.len())
            .finish()
    }
}

impl Bitmap for OwnedBitmap {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn bytes_per_row(&self) -> usize {
        self.width as usize * 4
    }

    fn buffer_format(&self) -> BufferFormat {
        BufferFormat::packed(8, 3, self.alpha, crate::pixel::ByteOrder::Big)
    }

    fn raw_bytes(&self) -> &[u8] {
        &self.pixels
    }
}

/// Why pixels could not become an [`OwnedBitmap`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OwnedBitmapError {
    #[error("unsupported layout {0:?}; expected 8-bit RGBA or RGBX")]
    Layout(BufferFormat),

    #[error("stride {stride} is not width * 4 for width {width}")]
    Stride { stride: usize, width: u32 },

    #[error("buffer holds {len} bytes, expected {expected}")]
    Length { len: usize, expected: usize },
}

impl BitmapFromPixels for OwnedBitmap {
    type Error = OwnedBitmapError;

    fn from_pixels(
        pixels: Vec<u8>,
        width: u32,
        height: u32,
        bytes_per_row: usize,
        format: BufferFormat,
    ) -> Result<Self, OwnedBitmapError> {
        if !matches!(
            format.pixel_format(),
            Some(PixelFormat::Rgba | PixelFormat::Rgbx)
        ) || format.bits_per_component != 8
            || format.bits_per_pixel != 32
        {
            return Err(OwnedBitmapError::Layout(format));
        }
        if bytes_per_row != width as usize * 4 {
            return Err(OwnedBitmapError::Stride {
                stride: bytes_per_row,
                width,
            });
        }
        let expected = bytes_per_row * height as usize;
        if pixels.len() != expected {
            return Err(OwnedBitmapError::Length {
                len: pixels.len(),
                expected,
            });
        }
        Ok(Self {
            pixels,
            width,
            height,
            alpha: format.alpha,
        })
    }
}

impl Bitmap for ImgRef<'_, RGB8> {
    fn width(&self) -> u32 {
        imgref::Img::width(self) as u32
    }

    fn height(&self) -> u32 {
        imgref::Img::height(self) as u32
    }

    fn bytes_per_row(&self) -> usize {
        self.stride() * 3
    }

    fn buffer_format(&self) -> BufferFormat {
        BufferFormat::rgb8()
    }

    fn raw_bytes(&self) -> &[u8] {
        self.buf().as_bytes()
    }
}

/// Straight-alpha RGBA.
impl Bitmap for ImgRef<'_, RGBA8> {
    fn width(&self) -> u32 {
        imgref::Img::width(self) as u32
    }

    fn height(&self) -> u32 {
        imgref::Img::height(self) as u32
    }

    fn bytes_per_row(&self) -> usize {
        self.stride() * 4
    }

    fn buffer_format(&self) -> BufferFormat {
        BufferFormat::rgba8()
    }

    fn raw_bytes(&self) -> &[u8] {
        self.buf().as_bytes()
    }
}

impl Bitmap for ImgVec<RGBA8> {
    fn width(&self) -> u32 {
        imgref::Img::width(self) as u32
    }

    fn height(&self) -> u32 {
        imgref::Img::height(self) as u32
    }

    fn bytes_per_row(&self) -> usize {
        self.stride() * 4
    }

    fn buffer_format(&self) -> BufferFormat {
        BufferFormat::rgba8()
    }

    fn raw_bytes(&self) -> &[u8] {
        self.buf().as_bytes()
    }
}

impl Bitmap for ImgVec<RGB8> {
    fn width(&self) -> u32 {
        imgref::Img::width(self) as u32
    }

    fn height(&self) -> u32 {
        imgref::Img::height(self) as u32
    }

    fn bytes_per_row(&self) -> usize {
        self.stride() * 3
    }

    fn buffer_format(&self) -> BufferFormat {
        BufferFormat::rgb8()
    }

    fn raw_bytes(&self) -> &[u8] {
        self.buf().as_bytes()
    }
}

/// A caller-described bitmap over borrowed memory.
impl Bitmap for RawImageBuffer<'_> {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn bytes_per_row(&self) -> usize {
        self.bytes_per_row
    }

    fn buffer_format(&self) -> BufferFormat {
        self.format
    }

    fn raw_bytes(&self) -> &[u8] {
        self.data()
    }
}
