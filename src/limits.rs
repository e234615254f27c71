//! Resource limits checked before any pixel allocation.

use alloc::format;

use crate::WebpError;

/// Resource limits for decode and encode.
///
/// All limits are optional; the default imposes none.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Limits {
    /// Maximum image width in pixels.
    pub max_width: Option<u32>,
    /// Maximum image height in pixels.
    pub max_height: Option<u32>,
    /// Maximum total pixels (width × height).
    pub max_pixels: Option<u64>,
    /// Maximum size of a single pixel buffer, in bytes.
    pub max_memory_bytes: Option<u64>,
    /// Maximum size of encoded input, in bytes.
    pub max_input_bytes: Option<u64>,
}

impl Limits {
    /// No restrictions.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_max_width(mut self, width: u32) -> Self {
        self.max_width = Some(width);
        self
    }

    pub fn with_max_height(mut self, height: u32) -> Self {
        self.max_height = Some(height);
        self
    }

    pub fn with_max_pixels(mut self, pixels: u64) -> Self {
        self.max_pixels = Some(pixels);
        self
    }

    pub fn with_max_memory(mut self, bytes: u64) -> Self {
        self.max_memory_bytes = Some(bytes);
        self
    }

    pub fn with_max_input_bytes(mut self, bytes: u64) -> Self {
        self.max_input_bytes = Some(bytes);
        self
    }

    /// Check dimensions against the width, height and pixel-count limits.
    pub fn check_dimensions(&self, width: u32, height: u32) -> Result<(), WebpError> {
        if let Some(max) = self.max_width
            && width > max
        {
            return Err(WebpError::LimitExceeded(format!(
                "width {width} exceeds limit {max}"
            )));
        }
        if let Some(max) = self.max_height
            && height > max
        {
            return Err(WebpError::LimitExceeded(format!(
                "height {height} exceeds limit {max}"
            )));
        }
        if let Some(max) = self.max_pixels {
            let pixels = u64::from(width) * u64::from(height);
            if pixels > max {
                return Err(WebpError::LimitExceeded(format!(
                    "pixel count {pixels} exceeds limit {max}"
                )));
            }
        }
        Ok(())
    }

    /// Check a pixel buffer allocation of `bytes`.
    pub fn check_memory(&self, bytes: u64) -> Result<(), WebpError> {
        match self.max_memory_bytes {
            Some(max) if bytes > max => Err(WebpError::LimitExceeded(format!(
                "allocation of {bytes} bytes exceeds limit {max}"
            ))),
            _ => Ok(()),
        }
    }

    /// Check the length of encoded input.
    pub fn check_input(&self, len: usize) -> Result<(), WebpError> {
        match self.max_input_bytes {
            Some(max) if len as u64 > max => Err(WebpError::LimitExceeded(format!(
                "input of {len} bytes exceeds limit {max}"
            ))),
            _ => Ok(()),
        }
    }

    /// Check dimensions plus the RGBA output buffer they imply.
    pub(crate) fn check_output(&self, width: u32, height: u32) -> Result<(), WebpError> {
        self.check_dimensions(width, height)?;
        self.check_memory(u64::from(width) * u64::from(height) * 4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_none() {
        let limits = Limits::none();
        assert!(limits.check_dimensions(u32::MAX, u32::MAX).is_ok());
        assert!(limits.check_memory(u64::MAX).is_ok());
        assert!(limits.check_input(usize::MAX).is_ok());
    }

    #[test]
    fn limits_dimensions() {
        let limits = Limits::none()
            .with_max_width(1000)
            .with_max_height(1000)
            .with_max_pixels(500_000);

        assert!(limits.check_dimensions(1000, 1000).is_err()); // 1M pixels > 500k
        assert!(limits.check_dimensions(500, 500).is_ok());
        assert!(matches!(
            limits.check_dimensions(2000, 100),
            Err(WebpError::LimitExceeded(_))
        ));
    }

    #[test]
    fn output_check_counts_four_bytes_per_pixel() {
        let limits = Limits::none().with_max_memory(400);
        assert!(limits.check_output(10, 10).is_ok());
        assert!(limits.check_output(10, 11).is_err());
    }

    #[test]
    fn input_limit() {
        let limits = Limits::none().with_max_input_bytes(16);
        assert!(limits.check_input(16).is_ok());
        assert!(limits.check_input(17).is_err());
    }
}
