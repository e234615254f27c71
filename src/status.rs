//! Numeric status codes reported by the codec, and their mapping onto
//! [`WebpError`].
//!
//! The decoder reports `VP8StatusCode` values, the encoder reports
//! `WebPEncodingError` values. Both are small closed sets today, but a newer
//! libwebp may add codes, so unknown values map to a fallback kind instead of
//! failing.

use crate::WebpError;

/// Status code returned by the decoder's feature query and decode primitives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DecodeStatus(pub u32);

impl DecodeStatus {
    pub const OK: Self = Self(0);
    pub const OUT_OF_MEMORY: Self = Self(1);
    pub const INVALID_PARAM: Self = Self(2);
    pub const BITSTREAM_ERROR: Self = Self(3);
    pub const UNSUPPORTED_FEATURE: Self = Self(4);
    pub const SUSPENDED: Self = Self(5);
    pub const USER_ABORT: Self = Self(6);
    pub const NOT_ENOUGH_DATA: Self = Self(7);

    /// Whether the codec reported success.
    pub fn is_ok(self) -> bool {
        self == Self::OK
    }

    /// Map this status to a result. `OK` becomes `Ok(())`.
    pub fn check(self) -> Result<(), WebpError> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(self.into())
        }
    }
}

impl From<DecodeStatus> for WebpError {
    fn from(status: DecodeStatus) -> Self {
        match status {
            DecodeStatus::OUT_OF_MEMORY => WebpError::OutOfMemory,
            DecodeStatus::INVALID_PARAM => WebpError::InvalidParam,
            DecodeStatus::BITSTREAM_ERROR => WebpError::BitstreamError,
            DecodeStatus::UNSUPPORTED_FEATURE => WebpError::UnsupportedFeature,
            DecodeStatus::SUSPENDED => WebpError::Suspended,
            DecodeStatus::USER_ABORT => WebpError::UserAbort,
            DecodeStatus::NOT_ENOUGH_DATA => WebpError::NotEnoughData,
            // OK is not an error; reaching here means a caller mapped it anyway.
            DecodeStatus(code) => WebpError::UnknownStatus(code),
        }
    }
}

/// Error code stored in the picture descriptor after a failed encode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EncodeStatus(pub u32);

impl EncodeStatus {
    pub const OK: Self = Self(0);
    pub const OUT_OF_MEMORY: Self = Self(1);
    pub const BITSTREAM_OUT_OF_MEMORY: Self = Self(2);
    pub const NULL_PARAMETER: Self = Self(3);
    pub const INVALID_CONFIGURATION: Self = Self(4);
    pub const BAD_DIMENSION: Self = Self(5);
    pub const PARTITION0_OVERFLOW: Self = Self(6);
    pub const PARTITION_OVERFLOW: Self = Self(7);
    pub const BAD_WRITE: Self = Self(8);
    pub const FILE_TOO_BIG: Self = Self(9);
    pub const USER_ABORT: Self = Self(10);

    /// Whether the codec reported success.
    pub fn is_ok(self) -> bool {
        self == Self::OK
    }
}

impl From<EncodeStatus> for WebpError {
    fn from(status: EncodeStatus) -> Self {
        match status {
            EncodeStatus::OUT_OF_MEMORY => WebpError::OutOfMemory,
            EncodeStatus::BITSTREAM_OUT_OF_MEMORY => WebpError::BitstreamOutOfMemory,
            EncodeStatus::NULL_PARAMETER => WebpError::NullParameter,
            EncodeStatus::INVALID_CONFIGURATION => WebpError::InvalidConfiguration,
            EncodeStatus::BAD_DIMENSION => WebpError::BadDimension,
            EncodeStatus::PARTITION0_OVERFLOW => WebpError::Partition0Overflow,
            EncodeStatus::PARTITION_OVERFLOW => WebpError::PartitionOverflow,
            EncodeStatus::BAD_WRITE => WebpError::BadWrite,
            EncodeStatus::FILE_TOO_BIG => WebpError::FileTooBig,
            EncodeStatus::USER_ABORT => WebpError::UserAbort,
            // The encoder failed without a usable code: a generic render failure.
            EncodeStatus(_) => WebpError::ImageRenderFailed,
        }
    }
}
