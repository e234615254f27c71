//! Output size planning for resized decodes.
//!
//! Planning happens in `f64` and truncates toward zero only once, at the end,
//! so an aspect-fit result never exceeds the requested box.

use alloc::format;

use crate::WebpError;

/// Integer image dimensions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Number of pixels, widened to avoid overflow.
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

impl From<(u32, u32)> for Size {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// How a requested box constrains the output size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ScalingMode {
    /// Preserve aspect ratio and fit entirely inside the box. Never upscales.
    #[default]
    AspectFit,
    /// Preserve aspect ratio and cover the box. Cropping is left to the caller.
    AspectFill,
    /// Use the requested width and height as given.
    Scale,
}

/// Compute the output size for `original` under a requested box.
///
/// With both requests absent the original size is returned unchanged. An
/// absent axis takes the original's value (and `0` for the fill box).
/// Zero and degenerate results are not special-cased here.
pub fn plan(
    original: Size,
    requested_width: Option<f64>,
    requested_height: Option<f64>,
    mode: ScalingMode,
) -> Size {
    if requested_width.is_none() && requested_height.is_none() {
        return original;
    }

    let ow = f64::from(original.width);
    let oh = f64::from(original.height);
    let tw = requested_width.unwrap_or(ow);
    let th = requested_height.unwrap_or(oh);

    let (w, h) = match mode {
        ScalingMode::AspectFit => {
            let scale = (tw / ow).min(th / oh).min(1.0);
            (ow * scale, oh * scale)
        }
        ScalingMode::AspectFill => {
            let fill_w = ow.min(requested_width.unwrap_or(0.0));
            let fill_h = oh.min(requested_height.unwrap_or(0.0));
            let scale = (fill_w / ow).max(fill_h / oh);
            (ow * scale, oh * scale)
        }
        ScalingMode::Scale => (tw, th),
    };

    Size::new(truncate(w), truncate(h))
}

/// Truncate toward zero, saturating. NaN becomes 0.
fn truncate(v: f64) -> u32 {
    v as u32
}

/// Caller-facing size request, validated before it reaches [`plan`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TargetSize {
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl TargetSize {
    pub fn new(width: Option<f64>, height: Option<f64>) -> Self {
        Self { width, height }
    }

    /// Whether any dimension was requested.
    pub fn is_requested(&self) -> bool {
        self.width.is_some() || self.height.is_some()
    }

    /// Reject non-finite or negative requests, and a zero request on one
    /// axis when the other axis is unset.
    pub fn validate(&self) -> Result<(), WebpError> {
        for (axis, value) in [("width", self.width), ("height", self.height)] {
            if let Some(v) = value
                && (!v.is_finite() || v < 0.0)
            {
                return Err(WebpError::InvalidRequest(format!(
                    "requested {axis} {v} must be finite and non-negative"
                )));
            }
        }
        match (self.width, self.height) {
            (Some(w), None) if w == 0.0 => Err(WebpError::InvalidRequest(
                "requested width is zero and height is unset".into(),
            )),
            (None, Some(h)) if h == 0.0 => Err(WebpError::InvalidRequest(
                "requested height is zero and width is unset".into(),
            )),
            _ => Ok(()),
        }
    }

    /// Multiply each requested dimension by a display scale factor.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            width: self.width.map(|w| w * factor),
            height: self.height.map(|h| h * factor),
        }
    }

    /// Plan the output size for `original`.
    pub fn plan(&self, original: Size, mode: ScalingMode) -> Size {
        plan(original, self.width, self.height, mode)
    }
}
