//! libwebp backend via `libwebp-sys`.
//!
//! All FFI lives here. Every codec allocation is owned by a guard whose
//! `Drop` releases it, so early returns cannot leak.
#![allow(unsafe_code)]

use alloc::vec::Vec;
use core::ffi::c_int;

use libwebp_sys as sys;
use tracing::{debug, trace};

use super::{DecodedPixels, Features, WebpBackend};
use crate::WebpError;
use crate::config::{DecoderConfig, EncodeMode, EncoderConfig, Preset};
use crate::pixel::{PixelFormat, RawImageBuffer};
use crate::status::{DecodeStatus, EncodeStatus};

/// The bundled libwebp.
#[derive(Clone, Copy, Debug, Default)]
pub struct LibWebp;

/// A validated `WebPConfig`.
pub struct LibWebpConfig(sys::WebPConfig);

impl LibWebpConfig {
    pub fn is_lossless(&self) -> bool {
        self.0.lossless != 0
    }

    pub fn quality(&self) -> f32 {
        self.0.quality
    }

    pub fn method(&self) -> i32 {
        self.0.method
    }
}

/// An initialized `WebPPicture`, freed on drop.
pub struct LibWebpPicture(sys::WebPPicture);

impl LibWebpPicture {
    pub fn width(&self) -> u32 {
        self.0.width as u32
    }

    pub fn height(&self) -> u32 {
        self.0.height as u32
    }
}

impl Drop for LibWebpPicture {
    fn drop(&mut self) {
        // SAFETY: the picture was initialized by WebPPictureInit; freeing an
        // unallocated picture is a no-op.
        unsafe { sys::WebPPictureFree(&mut self.0) };
    }
}

/// Memory sink for `WebPEncode`, cleared on drop.
struct MemoryWriter(sys::WebPMemoryWriter);

impl MemoryWriter {
    fn new() -> Self {
        // SAFETY: WebPMemoryWriter is plain data; Init sets every field.
        let mut writer: sys::WebPMemoryWriter = unsafe { core::mem::zeroed() };
        unsafe { sys::WebPMemoryWriterInit(&mut writer) };
        Self(writer)
    }

    fn to_vec(&self) -> Vec<u8> {
        if self.0.mem.is_null() || self.0.size == 0 {
            return Vec::new();
        }
        // SAFETY: `mem` holds `size` bytes written by the encoder.
        unsafe { core::slice::from_raw_parts(self.0.mem, self.0.size) }.to_vec()
    }
}

impl Drop for MemoryWriter {
    fn drop(&mut self) {
        // SAFETY: initialized by WebPMemoryWriterInit.
        unsafe { sys::WebPMemoryWriterClear(&mut self.0) };
    }
}

/// Decoder config whose output buffer is released on drop.
struct DecoderGuard(sys::WebPDecoderConfig);

impl Drop for DecoderGuard {
    fn drop(&mut self) {
        // SAFETY: initialized by WebPInitDecoderConfig. With external memory
        // this only resets bookkeeping; the Vec still owns the pixels.
        unsafe { sys::WebPFreeDecBuffer(&mut self.0.output) };
    }
}

fn native_preset(preset: Preset) -> sys::WebPPreset {
    match preset {
        Preset::Default => sys::WebPPreset::WEBP_PRESET_DEFAULT,
        Preset::Picture => sys::WebPPreset::WEBP_PRESET_PICTURE,
        Preset::Photo => sys::WebPPreset::WEBP_PRESET_PHOTO,
        Preset::Drawing => sys::WebPPreset::WEBP_PRESET_DRAWING,
        Preset::Icon => sys::WebPPreset::WEBP_PRESET_ICON,
        Preset::Text => sys::WebPPreset::WEBP_PRESET_TEXT,
    }
}

/// `WebPConfigInit` and `WebPConfigPreset` are header inlines over this
/// entry point. Returns 0 on ABI mismatch or bad quality.
fn init_config(config: &mut sys::WebPConfig, preset: sys::WebPPreset, quality: f32) -> c_int {
    // SAFETY: `config` is a valid, writable WebPConfig.
    unsafe {
        sys::WebPConfigInitInternal(
            config,
            preset,
            quality,
            sys::WEBP_ENCODER_ABI_VERSION as c_int,
        )
    }
}

fn to_c_int(v: usize) -> Option<c_int> {
    c_int::try_from(v).ok()
}

impl WebpBackend for LibWebp {
    type Config = LibWebpConfig;
    type Picture = LibWebpPicture;

    fn features(&self, data: &[u8]) -> Result<Features, DecodeStatus> {
        // SAFETY: plain data, fully written by WebPGetFeatures on success.
        let mut f: sys::WebPBitstreamFeatures = unsafe { core::mem::zeroed() };
        let status = unsafe { sys::WebPGetFeatures(data.as_ptr(), data.len(), &mut f) };
        let status = DecodeStatus(status as u32);
        if !status.is_ok() {
            return Err(status);
        }
        Ok(Features {
            width: f.width.max(0) as u32,
            height: f.height.max(0) as u32,
            has_alpha: f.has_alpha != 0,
            has_animation: f.has_animation != 0,
        })
    }

    fn decode(
        &self,
        data: &[u8],
        features: &Features,
        config: &DecoderConfig,
    ) -> Result<DecodedPixels, WebpError> {
        let size = config.output_size(features.size());
        let bytes_per_row = size.width as usize * 4;
        let len = bytes_per_row
            .checked_mul(size.height as usize)
            .ok_or(WebpError::InvalidParam)?;
        let (Some(c_width), Some(c_height), Some(c_stride)) = (
            to_c_int(size.width as usize),
            to_c_int(size.height as usize),
            to_c_int(bytes_per_row),
        ) else {
            return Err(WebpError::InvalidParam);
        };

        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(len)
            .map_err(|_| WebpError::OutOfMemory)?;
        pixels.resize(len, 0u8);

        // SAFETY: zeroed then initialized by WebPInitDecoderConfig.
        let mut guard = DecoderGuard(unsafe { core::mem::zeroed() });
        if !unsafe { sys::WebPInitDecoderConfig(&mut guard.0) } {
            return Err(WebpError::InitConfigFailed);
        }

        let options = &mut guard.0.options;
        options.bypass_filtering = c_int::from(config.bypass_filtering);
        options.no_fancy_upsampling = c_int::from(config.no_fancy_upsampling);
        options.use_threads = c_int::from(config.threads);
        if config.scaled_size.is_some() {
            options.use_scaling = 1;
            options.scaled_width = c_width;
            options.scaled_height = c_height;
        }

        let output = &mut guard.0.output;
        output.colorspace = sys::WEBP_CSP_MODE::MODE_rgbA;
        output.is_external_memory = 1;
        // The RGBA arm of the union, selected by colorspace.
        output.u.RGBA = sys::WebPRGBABuffer {
            rgba: pixels.as_mut_ptr(),
            stride: c_stride,
            size: len,
        };

        trace!(width = size.width, height = size.height, "WebPDecode");
        // SAFETY: `data` outlives the call; the output points into `pixels`,
        // which is large enough for the configured size and stride.
        let status = unsafe { sys::WebPDecode(data.as_ptr(), data.len(), &mut guard.0) };
        DecodeStatus(status as u32).check()?;

        Ok(DecodedPixels {
            data: pixels,
            width: size.width,
            height: size.height,
            bytes_per_row,
        })
    }

    fn configure(&self, config: &EncoderConfig) -> Result<LibWebpConfig, WebpError> {
        // SAFETY: plain data, initialized by WebPConfigInitInternal below.
        let mut native: sys::WebPConfig = unsafe { core::mem::zeroed() };
        if init_config(&mut native, sys::WebPPreset::WEBP_PRESET_DEFAULT, 75.0) == 0 {
            return Err(WebpError::InitConfigFailed);
        }

        match config.mode {
            EncodeMode::Lossy { preset, quality } => {
                if init_config(&mut native, native_preset(preset), quality) == 0 {
                    return Err(WebpError::ConfigPresetFailed);
                }
            }
            EncodeMode::Lossless { level } => {
                if unsafe { sys::WebPConfigLosslessPreset(&mut native, c_int::from(level)) } == 0 {
                    return Err(WebpError::InitConfigFailed);
                }
            }
        }

        native.thread_level = c_int::from(config.threads);
        native.exact = c_int::from(config.exact);
        if let Some(method) = config.method {
            native.method = c_int::from(method);
        }
        if let Some(strength) = config.filter_strength {
            native.filter_strength = c_int::from(strength);
        }

        if unsafe { sys::WebPValidateConfig(&native) } == 0 {
            return Err(WebpError::InvalidConfiguration);
        }
        debug!(
            lossless = native.lossless,
            quality = native.quality,
            method = native.method,
            "configured libwebp encoder"
        );
        Ok(LibWebpConfig(native))
    }

    fn new_picture(&self, width: u32, height: u32) -> Result<LibWebpPicture, WebpError> {
        if width == 0 || height == 0 {
            return Err(WebpError::BadDimension);
        }
        let (Some(w), Some(h)) = (to_c_int(width as usize), to_c_int(height as usize)) else {
            return Err(WebpError::BadDimension);
        };
        // SAFETY: zeroed then initialized by WebPPictureInit.
        let mut picture = LibWebpPicture(unsafe { core::mem::zeroed() });
        if !unsafe { sys::WebPPictureInit(&mut picture.0) } {
            return Err(WebpError::InitPictureFailed);
        }
        picture.0.use_argb = 1;
        picture.0.width = w;
        picture.0.height = h;
        Ok(picture)
    }

    fn import(
        &self,
        picture: &mut LibWebpPicture,
        layout: PixelFormat,
        pixels: &RawImageBuffer<'_>,
    ) -> bool {
        if pixels.validate().is_err()
            || pixels.width != picture.width()
            || pixels.height != picture.height()
            || pixels.format.bits_per_component != 8
            || pixels.format.bytes_per_pixel() != layout.bytes_per_pixel()
        {
            return false;
        }
        let Some(stride) = to_c_int(pixels.bytes_per_row) else {
            return false;
        };

        let pic = &mut picture.0;
        let ptr = pixels.data().as_ptr();
        // SAFETY: validate() guarantees `height` rows of `stride` bytes (the
        // last one at least `width * bpp`), and bpp matches the primitive.
        let ok = unsafe {
            match layout {
                PixelFormat::Rgb => sys::WebPPictureImportRGB(pic, ptr, stride),
                PixelFormat::Bgr => sys::WebPPictureImportBGR(pic, ptr, stride),
                PixelFormat::Rgba => sys::WebPPictureImportRGBA(pic, ptr, stride),
                PixelFormat::Bgra => sys::WebPPictureImportBGRA(pic, ptr, stride),
                PixelFormat::Rgbx => sys::WebPPictureImportRGBX(pic, ptr, stride),
                PixelFormat::Bgrx => sys::WebPPictureImportBGRX(pic, ptr, stride),
                _ => return false,
            }
        };
        ok != 0
    }

    fn encode(
        &self,
        config: &LibWebpConfig,
        picture: &mut LibWebpPicture,
    ) -> Result<Vec<u8>, EncodeStatus> {
        let mut writer = MemoryWriter::new();
        picture.0.writer = Some(sys::WebPMemoryWrite);
        picture.0.custom_ptr = (&mut writer.0 as *mut sys::WebPMemoryWriter).cast();

        // SAFETY: the writer outlives the call and the picture holds pixels.
        let ok = unsafe { sys::WebPEncode(&config.0, &mut picture.0) };

        picture.0.writer = None;
        picture.0.custom_ptr = core::ptr::null_mut();

        if ok == 0 {
            return Err(EncodeStatus(picture.0.error_code as u32));
        }
        Ok(writer.to_vec())
    }
}
