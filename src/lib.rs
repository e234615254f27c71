//! # webpbridge
//!
//! WebP encode and decode for in-memory bitmaps of arbitrary layout.
//!
//! The crate decides whether a bitmap can go straight to the codec's import
//! primitives or must first be normalized into 8-bit RGBA/RGBX, plans exact
//! output sizes for scaled decodes, and maps codec status codes onto
//! [`WebpError`]. Compression itself is done by libwebp (`libwebp` feature,
//! on by default) or any other [`WebpBackend`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use webpbridge::{DecodeRequest, EncodeRequest, Preset, ScalingMode, is_webp};
//!
//! let data: &[u8] = &[]; // your WebP bytes
//! assert!(is_webp(data));
//!
//! // Decode, fitting inside 128x128
//! let bitmap = DecodeRequest::new(data)
//!     .with_size(128.0, 128.0)
//!     .with_scaling(ScalingMode::AspectFit)
//!     .decode()?;
//!
//! // Re-encode
//! let webp = EncodeRequest::lossy(Preset::Picture, 80.0).encode(&bitmap)?;
//! # Ok::<(), webpbridge::WebpError>(())
//! ```

#![deny(unsafe_code)]

extern crate alloc;

pub mod bitmap;
pub mod cache;
pub mod codecs;
pub mod config;
pub mod convert;
mod decode;
mod encode;
mod error;
pub mod format;
mod info;
mod limits;
pub mod pixel;
pub mod scale;
pub mod status;

pub use bitmap::{Bitmap, BitmapFromPixels, OwnedBitmap, OwnedBitmapError};
pub use cache::{BitmapCache, CacheKey, NamedLoader};
pub use codecs::{DecodedPixels, Features, WebpBackend};
pub use config::{DecoderConfig, EncodeMode, EncoderConfig, Preset};
pub use convert::{NormalizedPixels, Renderer, SoftwareRenderer, normalize, normalize_with};
pub use decode::{DecodeRequest, DecodeStage};
pub use encode::{EncodeRequest, WebpData};
pub use error::WebpError;
pub use format::{is_webp, is_webp_file, is_webp_location};
pub use info::{WebpInfo, webp_info_with, webp_size_at_with};
pub use limits::Limits;
pub use pixel::{AlphaConvention, BufferFormat, ByteOrder, PixelFormat, RawImageBuffer, classify};
pub use scale::{ScalingMode, Size, TargetSize, plan};

#[cfg(feature = "libwebp")]
pub use codecs::LibWebp;
#[cfg(feature = "libwebp")]
pub use decode::decode_file;
#[cfg(feature = "libwebp")]
pub use info::{webp_info, webp_size, webp_size_at};

// Re-export the typed pixel crates used in the public API.
pub use imgref;
pub use rgb;
