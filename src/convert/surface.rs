//! Software rendering surface.
//!
//! Draws any supported [`RawImageBuffer`] into the canonical layout: 8-bit
//! components, big-endian, alpha last, premultiplied RGBA or RGBX with an
//! opaque padding byte.

use alloc::vec::Vec;

use tracing::trace;

use crate::pixel::{AlphaConvention, ByteOrder, RawImageBuffer};

/// Bytes per pixel of the canonical layout.
pub const CANONICAL_BPP: usize = 4;

/// Parameters for a new drawing surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceSpec {
    pub width: u32,
    pub height: u32,
    /// Premultiplied RGBA if set, RGBX otherwise.
    pub has_alpha: bool,
}

impl SurfaceSpec {
    /// Row stride of the surface's backing buffer.
    pub fn bytes_per_row(&self) -> usize {
        self.width as usize * CANONICAL_BPP
    }
}

/// Why a surface could not be created or drawn into.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum RenderError {
    #[error("surface dimensions {width}x{height} are empty")]
    ZeroDimensions { width: u32, height: u32 },

    #[error("surface of {0} bytes could not be allocated")]
    Allocation(usize),

    #[error("{bits} bits per component is not drawable")]
    UnsupportedDepth { bits: u8 },

    #[error("{0} color components is not drawable")]
    UnsupportedComponents(u8),

    #[error("{bits_per_pixel} bits per pixel cannot hold {slots} slots")]
    InconsistentPixelSize { bits_per_pixel: u8, slots: usize },

    #[error("source stride or length does not cover its dimensions")]
    ShortSource,

    #[error("source is {src_width}x{src_height}, surface is {width}x{height}")]
    SizeMismatch {
        src_width: u32,
        src_height: u32,
        width: u32,
        height: u32,
    },
}

/// Host capability that creates drawing surfaces.
pub trait Renderer {
    type Surface: DrawSurface;

    /// Allocate a surface. The surface and its memory are released when it
    /// is dropped.
    fn create_surface(&self, spec: SurfaceSpec) -> Result<Self::Surface, RenderError>;
}

/// A scoped pixel buffer plus drawing context in the canonical layout.
pub trait DrawSurface {
    fn spec(&self) -> SurfaceSpec;

    /// Draw `source` over the whole surface.
    fn draw(&mut self, source: &RawImageBuffer<'_>) -> Result<(), RenderError>;

    /// Take the rendered bytes (`height` rows of `width * 4`).
    fn into_pixels(self) -> Vec<u8>;
}

/// Built-in CPU renderer.
#[derive(Clone, Copy, Debug, Default)]
pub struct SoftwareRenderer;

impl Renderer for SoftwareRenderer {
    type Surface = SoftwareSurface;

    fn create_surface(&self, spec: SurfaceSpec) -> Result<SoftwareSurface, RenderError> {
        if spec.width == 0 || spec.height == 0 {
            return Err(RenderError::ZeroDimensions {
                width: spec.width,
                height: spec.height,
            });
        }
        let len = spec
            .bytes_per_row()
            .checked_mul(spec.height as usize)
            .ok_or(RenderError::Allocation(usize::MAX))?;
        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(len)
            .map_err(|_| RenderError::Allocation(len))?;
        pixels.resize(len, 0);
        trace!(width = spec.width, height = spec.height, len, "allocated surface");
        Ok(SoftwareSurface { spec, pixels })
    }
}

/// Surface produced by [`SoftwareRenderer`].
#[derive(Debug)]
pub struct SoftwareSurface {
    spec: SurfaceSpec,
    pixels: Vec<u8>,
}

impl DrawSurface for SoftwareSurface {
    fn spec(&self) -> SurfaceSpec {
        self.spec
    }

    fn draw(&mut self, source: &RawImageBuffer<'_>) -> Result<(), RenderError> {
        if source.width != self.spec.width || source.height != self.spec.height {
            return Err(RenderError::SizeMismatch {
                src_width: source.width,
                src_height: source.height,
                width: self.spec.width,
                height: self.spec.height,
            });
        }
        let reader = SampleReader::new(source)?;
        if source.validate().is_err() {
            return Err(RenderError::ShortSource);
        }

        let out_row = self.spec.bytes_per_row();
        let mut rows = 0usize;
        for (src, dst) in source.rows().zip(self.pixels.chunks_exact_mut(out_row)) {
            for (px, out) in src
                .chunks_exact(reader.bytes_per_pixel)
                .zip(dst.chunks_exact_mut(CANONICAL_BPP))
            {
                out.copy_from_slice(&reader.read(px));
            }
            rows += 1;
        }
        if rows != self.spec.height as usize {
            return Err(RenderError::ShortSource);
        }
        Ok(())
    }

    fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }
}

/// Decodes one source pixel into premultiplied RGBA8.
struct SampleReader {
    bytes_per_pixel: usize,
    bytes_per_component: usize,
    color_components: usize,
    alpha: AlphaConvention,
    order: ByteOrder,
}

impl SampleReader {
    fn new(source: &RawImageBuffer<'_>) -> Result<Self, RenderError> {
        let f = source.format;
        let bytes_per_component = match f.bits_per_component {
            8 => 1,
            16 => 2,
            bits => return Err(RenderError::UnsupportedDepth { bits }),
        };
        if !matches!(f.color_components, 1 | 3) {
            return Err(RenderError::UnsupportedComponents(f.color_components));
        }
        let slots = f.slots();
        if f.bits_per_pixel % 8 != 0
            || (f.bits_per_pixel as usize) < slots * usize::from(f.bits_per_component)
        {
            return Err(RenderError::InconsistentPixelSize {
                bits_per_pixel: f.bits_per_pixel,
                slots,
            });
        }
        Ok(Self {
            bytes_per_pixel: f.bytes_per_pixel(),
            bytes_per_component,
            color_components: f.color_components as usize,
            alpha: f.alpha,
            order: f.byte_order,
        })
    }

    /// Read slot `i` in logical (big-endian) order, scaled to 8 bits.
    fn slot(&self, px: &[u8], i: usize) -> u8 {
        if self.bytes_per_component == 1 {
            // Little-endian reverses the whole packed word.
            let at = match self.order {
                ByteOrder::Big => i,
                ByteOrder::Little => self.bytes_per_pixel - 1 - i,
            };
            px[at]
        } else {
            let at = i * 2;
            let v = match self.order {
                ByteOrder::Big => u16::from_be_bytes([px[at], px[at + 1]]),
                ByteOrder::Little => u16::from_le_bytes([px[at], px[at + 1]]),
            };
            ((u32::from(v) * 255 + 32767) / 65535) as u8
        }
    }

    fn read(&self, px: &[u8]) -> [u8; 4] {
        let color_start = usize::from(self.alpha.is_first());
        let alpha_slot = if self.alpha.is_first() {
            Some(0)
        } else if self.alpha.is_last() {
            Some(self.color_components)
        } else {
            None
        };

        let alpha = match alpha_slot {
            Some(i) if self.alpha.has_alpha() => self.slot(px, i),
            _ => 255,
        };

        let (r, g, b) = if self.color_components == 1 {
            let v = self.slot(px, color_start);
            (v, v, v)
        } else {
            (
                self.slot(px, color_start),
                self.slot(px, color_start + 1),
                self.slot(px, color_start + 2),
            )
        };

        if self.alpha.has_alpha() && !self.alpha.is_premultiplied() {
            [premultiply(r, alpha), premultiply(g, alpha), premultiply(b, alpha), alpha]
        } else {
            [r, g, b, alpha]
        }
    }
}

fn premultiply(c: u8, a: u8) -> u8 {
    ((u32::from(c) * u32::from(a) + 127) / 255) as u8
}
