//! Unified error type for WebP encode and decode.
//!
//! Codec status codes (see [`crate::status`]) map 1:1 onto the first two
//! groups of variants. The remaining variants are raised by the adapter
//! itself, before or after the codec runs.

use alloc::string::String;

/// Errors from WebP decoding, encoding and bitmap conversion.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum WebpError {
    // Shared by decode and encode status codes.
    #[error("codec ran out of memory")]
    OutOfMemory,

    #[error("operation aborted by the codec")]
    UserAbort,

    // Decode status codes.
    #[error("invalid parameter passed to the decoder")]
    InvalidParam,

    #[error("corrupt or invalid WebP bitstream")]
    BitstreamError,

    #[error("bitstream uses an unsupported feature")]
    UnsupportedFeature,

    #[error("decoding suspended before completion")]
    Suspended,

    #[error("not enough data to decode the image")]
    NotEnoughData,

    // Encode status codes.
    #[error("encoder ran out of memory while flushing the bitstream")]
    BitstreamOutOfMemory,

    #[error("encoder received a null parameter")]
    NullParameter,

    #[error("invalid encoder configuration")]
    InvalidConfiguration,

    #[error("picture has invalid dimensions")]
    BadDimension,

    #[error("first partition exceeds 512k")]
    Partition0Overflow,

    #[error("partition exceeds 16M")]
    PartitionOverflow,

    #[error("error while writing encoded bytes")]
    BadWrite,

    #[error("encoded file exceeds 4G")]
    FileTooBig,

    #[error("codec returned unknown status code {0}")]
    UnknownStatus(u32),

    // Adapter errors.
    #[error("data is not a RIFF/WEBP container")]
    InvalidHeader,

    #[error("failed to initialize codec configuration")]
    InitConfigFailed,

    #[error("failed to initialize picture descriptor")]
    InitPictureFailed,

    #[error("failed to apply encoder preset")]
    ConfigPresetFailed,

    #[error("pixel data could not be imported, directly or after normalization")]
    InvalidPictureData,

    #[error("decoded pixels could not be wrapped into a bitmap")]
    ImageRenderFailed,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("planned output size {width}x{height} has zero area")]
    ZeroAreaOutput { width: u32, height: u32 },

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<lightweight_mmap::handles::HandleOpenError> for WebpError {
    fn from(e: lightweight_mmap::handles::HandleOpenError) -> Self {
        WebpError::Io(std::io::Error::other(alloc::format!("{e}")))
    }
}

impl From<lightweight_mmap::mmap::MmapError> for WebpError {
    fn from(e: lightweight_mmap::mmap::MmapError) -> Self {
        WebpError::Io(std::io::Error::other(alloc::format!("{e}")))
    }
}
